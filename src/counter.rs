use crate::error::CanonicalizationError;

const DEFAULT_HNDQ_CALL_LIMIT: usize = 4000;

/// Bounds the number of calls to the hash n-degree quads algorithm, whose
/// permutation search is worst-case factorial in the size of a group of
/// hash-sharing blank nodes. Datasets engineered to explode the search fail
/// with [`CanonicalizationError::HndqCallLimitExceeded`] instead of running
/// indefinitely.
#[derive(Debug)]
pub(crate) struct HndqCallCounter {
    calls: usize,
    limit: usize,
}

impl HndqCallCounter {
    pub(crate) fn new(limit: Option<usize>) -> HndqCallCounter {
        HndqCallCounter {
            calls: 0,
            limit: limit.unwrap_or(DEFAULT_HNDQ_CALL_LIMIT),
        }
    }

    pub(crate) fn add(&mut self) -> Result<(), CanonicalizationError> {
        self.calls += 1;
        if self.calls > self.limit {
            Err(CanonicalizationError::HndqCallLimitExceeded(self.limit))
        } else {
            Ok(())
        }
    }

    pub(crate) fn sum(&self) -> usize {
        self.calls
    }
}
