use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    #[error("unrecognized output format: {0}")]
    UnknownFormat(String),
    #[error("blank node label {0} collides with the canonical namespace _:c14n")]
    CanonicalPrefixCollision(String),
    #[error("invalid N-Quads at line {line}: {message}")]
    NQuadsParse { line: usize, message: String },
    #[error("blank node {0} does not appear in any quad of the dataset")]
    MissingBlankNode(String),
    #[error("no canonical identifier was issued for blank node {0}")]
    MissingCanonicalIdentifier(String),
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
    #[error("the number of calls to the hash n-degree quads algorithm exceeded the limit of {0}")]
    HndqCallLimitExceeded(usize),
    #[error("base16 encoding of a message digest failed")]
    Base16Encoding(base16ct::Error),
}
