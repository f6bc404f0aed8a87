//! The URDNA2015 canonicalization algorithm: canonicalization state,
//! identifier issuer, first-degree and N-degree quad hashes, and the
//! driver that assigns canonical blank node identifiers.

use crate::counter::HndqCallCounter;
use crate::error::CanonicalizationError;
use crate::nquads::SerializeNQuads;
use crate::rdf::{BlankNode, Dataset, Graph, Object, Quad, Subject};
use base16ct::lower::encode_str;
use itertools::Itertools;
use sha2::{Digest, Sha256};
use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// Prefix of every identifier appearing in canonical output.
pub(crate) const CANONICAL_IDENTIFIER_PREFIX: &str = "_:c14n";

/// Prefix of the temporary identifiers issued during the N-degree search.
const TEMPORARY_IDENTIFIER_PREFIX: &str = "_:b";

/// Per-label bookkeeping: the quads mentioning the label, as indices into
/// the state's quad list, and the memoized first-degree hash.
#[derive(Debug)]
struct BlankNodeInfo {
    quads: Vec<usize>,
    hash: OnceCell<String>,
}

#[derive(Debug)]
pub(crate) struct CanonicalizationState {
    /// The flattened input dataset. The single owner of every quad; all
    /// per-label bookkeeping refers into it by index.
    quads: Vec<Quad>,

    /// A map that relates a blank node identifier to the quads in which it
    /// appears in the input dataset.
    blank_node_info: HashMap<String, BlankNodeInfo>,

    /// Blank node identifiers in order of first appearance.
    blank_node_order: Vec<String>,

    /// The identifier issuer whose labels appear in the final output.
    canonical_issuer: IdentifierIssuer,
}

impl CanonicalizationState {
    fn new(quads: Vec<Quad>) -> Result<CanonicalizationState, CanonicalizationError> {
        let mut blank_node_info = HashMap::<String, BlankNodeInfo>::new();
        let mut blank_node_order = Vec::<String>::new();

        for (index, quad) in quads.iter().enumerate() {
            if let Subject::BlankNode(n) = &quad.subject {
                register(&mut blank_node_info, &mut blank_node_order, n.as_str(), index);
            }
            if let Object::BlankNode(n) = &quad.object {
                register(&mut blank_node_info, &mut blank_node_order, n.as_str(), index);
            }
            if let Graph::BlankNode(n) = &quad.graph {
                register(&mut blank_node_info, &mut blank_node_order, n.as_str(), index);
            }
        }

        // Labels inside the canonical namespace may only appear when every
        // label is inside it (a previously canonicalized dataset); mixing
        // them with fresh labels would let the rewrite emit duplicates.
        let is_canonical = |label: &str| label.starts_with(CANONICAL_IDENTIFIER_PREFIX);
        let any_canonical = blank_node_order.iter().any(|l| is_canonical(l));
        let all_canonical = blank_node_order.iter().all(|l| is_canonical(l));
        if any_canonical && !all_canonical {
            if let Some(offending) = blank_node_order.iter().find(|l| is_canonical(l.as_str())) {
                return Err(CanonicalizationError::CanonicalPrefixCollision(
                    offending.clone(),
                ));
            }
        }

        Ok(CanonicalizationState {
            quads,
            blank_node_info,
            blank_node_order,
            canonical_issuer: IdentifierIssuer::new(CANONICAL_IDENTIFIER_PREFIX),
        })
    }

    fn info(&self, identifier: &str) -> Result<&BlankNodeInfo, CanonicalizationError> {
        self.blank_node_info
            .get(identifier)
            .ok_or_else(|| CanonicalizationError::MissingBlankNode(identifier.to_string()))
    }
}

fn register(
    blank_node_info: &mut HashMap<String, BlankNodeInfo>,
    blank_node_order: &mut Vec<String>,
    label: &str,
    index: usize,
) {
    blank_node_info
        .entry(label.to_string())
        .or_insert_with(|| {
            blank_node_order.push(label.to_string());
            BlankNodeInfo {
                quads: Vec::new(),
                hash: OnceCell::new(),
            }
        })
        .quads
        .push(index);
}

/// A deterministic label generator that remembers prior assignments and
/// their order of issuance.
#[derive(PartialEq, Eq, Clone, Debug)]
pub(crate) struct IdentifierIssuer {
    prefix: String,
    counter: usize,
    issued: HashMap<String, String>,
    issued_order: Vec<String>,
}

impl IdentifierIssuer {
    pub(crate) fn new(prefix: &str) -> IdentifierIssuer {
        IdentifierIssuer {
            prefix: prefix.to_string(),
            counter: 0,
            issued: HashMap::new(),
            issued_order: Vec::new(),
        }
    }

    /// Returns the identifier previously issued for `existing`, or forms
    /// prefix + counter, records the assignment and returns it.
    pub(crate) fn issue(&mut self, existing: &str) -> String {
        if let Some(issued) = self.issued.get(existing) {
            return issued.clone();
        }
        let issued = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        self.issued.insert(existing.to_string(), issued.clone());
        self.issued_order.push(existing.to_string());
        issued
    }

    pub(crate) fn get(&self, existing: &str) -> Option<&str> {
        self.issued.get(existing).map(String::as_str)
    }

    pub(crate) fn has(&self, existing: &str) -> bool {
        self.issued.contains_key(existing)
    }

    /// The existing identifiers in the order they were assigned.
    pub(crate) fn issued_order(&self) -> &[String] {
        &self.issued_order
    }

    pub(crate) fn issued_count(&self) -> usize {
        self.counter
    }

    fn into_mapping(self) -> HashMap<String, String> {
        self.issued
    }
}

/// SHA-256 of the input as a lowercase hexadecimal string.
fn hash(data: impl AsRef<[u8]>) -> Result<String, CanonicalizationError> {
    const HASH_LEN: usize = 32;

    let digest = Sha256::digest(data);
    let mut buf = [0u8; HASH_LEN * 2];
    match encode_str(&digest, &mut buf) {
        Ok(hex) => Ok(hex.to_string()),
        Err(e) => Err(CanonicalizationError::Base16Encoding(e)),
    }
}

/// Hashes a blank node from the quads it appears in, with its own label
/// collapsed to `_:a` and every other blank node label to `_:z`. The result
/// is invariant under any relabeling of the blank node namespace while
/// still distinguishing structural position.
fn hash_first_degree_quads(
    state: &CanonicalizationState,
    reference: &str,
) -> Result<String, CanonicalizationError> {
    let info = state.info(reference)?;
    if let Some(cached) = info.hash.get() {
        return Ok(cached.clone());
    }

    fn replacement(node: &BlankNode, reference: &str) -> BlankNode {
        if node.as_str() == reference {
            BlankNode::new("_:a")
        } else {
            BlankNode::new("_:z")
        }
    }

    let mut nquads: Vec<String> = info
        .quads
        .iter()
        .map(|&index| {
            let quad = &state.quads[index];
            let subject = match &quad.subject {
                Subject::BlankNode(n) => Subject::BlankNode(replacement(n, reference)),
                s => s.clone(),
            };
            let object = match &quad.object {
                Object::BlankNode(n) => Object::BlankNode(replacement(n, reference)),
                o => o.clone(),
            };
            let graph = match &quad.graph {
                Graph::BlankNode(n) => Graph::BlankNode(replacement(n, reference)),
                g => g.clone(),
            };
            Quad::new(subject, quad.predicate.clone(), object, graph).serialize()
        })
        .collect();

    nquads.sort();
    let digest = hash(nquads.concat())?;
    let _ = info.hash.set(digest.clone());
    Ok(digest)
}

/// The position of a related blank node within a quad.
enum Position {
    Subject,
    Object,
    Graph,
}

impl Position {
    fn as_str(&self) -> &str {
        match self {
            Position::Subject => "s",
            Position::Object => "o",
            Position::Graph => "g",
        }
    }
}

/// Hashes a blank node component of a quad by its position, the quad's
/// predicate and the best-available identifier for it: the canonical
/// identifier if one was issued, else the identifier issued by `issuer`,
/// else its first-degree hash.
fn hash_related_blank_node(
    state: &CanonicalizationState,
    related: &str,
    quad: &Quad,
    issuer: &IdentifierIssuer,
    position: Position,
) -> Result<String, CanonicalizationError> {
    let input = match position {
        Position::Graph => position.as_str().to_string(),
        _ => format!("{}<{}>", position.as_str(), quad.predicate.as_str()),
    };

    let identifier = match state.canonical_issuer.get(related) {
        Some(id) => id.to_string(),
        None => match issuer.get(related) {
            Some(id) => id.to_string(),
            None => hash_first_degree_quads(state, related)?,
        },
    };

    hash(format!("{}{}", input, identifier))
}

struct HashNDegreeQuadsResult {
    hash: String,
    issuer: IdentifierIssuer,
}

/// Disambiguates a blank node whose first-degree hash is shared by walking
/// the quads of related blank nodes, scoring every permutation of each
/// related-hash group and keeping the lexicographically smallest path.
fn hash_n_degree_quads(
    state: &CanonicalizationState,
    identifier: &str,
    path_identifier_issuer: &IdentifierIssuer,
    counter: &mut HndqCallCounter,
) -> Result<HashNDegreeQuadsResult, CanonicalizationError> {
    counter.add()?;
    trace!(identifier, "hash n-degree quads");

    let mut issuer = path_identifier_issuer.clone();

    // Relates the hash of every blank node sharing a quad with `identifier`
    // to the labels hashing to it, in ascending hash order.
    let mut hash_to_related = BTreeMap::<String, Vec<String>>::new();
    for &index in &state.info(identifier)?.quads {
        let quad = &state.quads[index];
        if let Subject::BlankNode(n) = &quad.subject {
            if n.as_str() != identifier {
                let related_hash =
                    hash_related_blank_node(state, n.as_str(), quad, &issuer, Position::Subject)?;
                hash_to_related
                    .entry(related_hash)
                    .or_default()
                    .push(n.as_str().to_string());
            }
        }
        if let Object::BlankNode(n) = &quad.object {
            if n.as_str() != identifier {
                let related_hash =
                    hash_related_blank_node(state, n.as_str(), quad, &issuer, Position::Object)?;
                hash_to_related
                    .entry(related_hash)
                    .or_default()
                    .push(n.as_str().to_string());
            }
        }
        if let Graph::BlankNode(n) = &quad.graph {
            if n.as_str() != identifier {
                let related_hash =
                    hash_related_blank_node(state, n.as_str(), quad, &issuer, Position::Graph)?;
                hash_to_related
                    .entry(related_hash)
                    .or_default()
                    .push(n.as_str().to_string());
            }
        }
    }

    let mut data_to_hash = String::new();

    for (related_hash, blank_node_list) in &hash_to_related {
        data_to_hash.push_str(related_hash);

        let mut chosen_path = String::new();
        let mut chosen_issuer: Option<IdentifierIssuer> = None;

        'permutations: for permutation in blank_node_list
            .iter()
            .permutations(blank_node_list.len())
        {
            let mut issuer_copy = issuer.clone();
            let mut path = String::new();
            let mut recursion_list = Vec::<&String>::new();

            for related in permutation {
                match state.canonical_issuer.get(related.as_str()) {
                    Some(canonical_identifier) => path.push_str(canonical_identifier),
                    None => {
                        if !issuer_copy.has(related.as_str()) {
                            recursion_list.push(related);
                        }
                        path.push_str(&issuer_copy.issue(related.as_str()));
                    }
                }
                // A permutation can only lose once its path is at least as
                // long as the chosen one and strictly greater.
                if !chosen_path.is_empty()
                    && path.len() >= chosen_path.len()
                    && path.as_str() > chosen_path.as_str()
                {
                    continue 'permutations;
                }
            }

            for related in recursion_list {
                let result = hash_n_degree_quads(state, related.as_str(), &issuer_copy, counter)?;
                path.push_str(&issuer_copy.issue(related.as_str()));
                path.push('<');
                path.push_str(&result.hash);
                path.push('>');
                issuer_copy = result.issuer;
                if !chosen_path.is_empty()
                    && path.len() >= chosen_path.len()
                    && path.as_str() > chosen_path.as_str()
                {
                    continue 'permutations;
                }
            }

            if chosen_path.is_empty() || path < chosen_path {
                chosen_path = path;
                chosen_issuer = Some(issuer_copy);
            }
        }

        data_to_hash.push_str(&chosen_path);
        issuer = chosen_issuer.ok_or(CanonicalizationError::Internal(
            "no permutation produced a chosen path",
        ))?;
    }

    Ok(HashNDegreeQuadsResult {
        hash: hash(data_to_hash)?,
        issuer,
    })
}

/// Assigns a canonical identifier to every blank node in the dataset and
/// returns the resulting map from existing to canonical identifiers.
pub(crate) fn canonicalize_core(
    input_dataset: &Dataset,
    hndq_call_limit: Option<usize>,
) -> Result<HashMap<String, String>, CanonicalizationError> {
    let quads = input_dataset.to_quads();
    let mut state = CanonicalizationState::new(quads)?;
    let mut counter = HndqCallCounter::new(hndq_call_limit);
    debug!(
        quads = state.quads.len(),
        blank_nodes = state.blank_node_order.len(),
        "indexed input dataset"
    );

    let mut non_normalized: Vec<String> = state.blank_node_order.clone();
    let mut hash_to_blank_nodes = BTreeMap::<String, Vec<String>>::new();

    // Issue canonical identifiers for every blank node whose first-degree
    // hash is unique, repeating until a pass issues nothing: removing a
    // node can make another node's hash unique in the next pass.
    let mut simple = true;
    while simple {
        simple = false;
        hash_to_blank_nodes.clear();
        for identifier in &non_normalized {
            let first_degree_hash = hash_first_degree_quads(&state, identifier)?;
            hash_to_blank_nodes
                .entry(first_degree_hash)
                .or_default()
                .push(identifier.clone());
        }
        let unique: Vec<(String, String)> = hash_to_blank_nodes
            .iter()
            .filter(|(_, identifiers)| identifiers.len() == 1)
            .map(|(first_degree_hash, identifiers)| {
                (first_degree_hash.clone(), identifiers[0].clone())
            })
            .collect();
        for (first_degree_hash, identifier) in unique {
            state.canonical_issuer.issue(&identifier);
            hash_to_blank_nodes.remove(&first_degree_hash);
            non_normalized.retain(|candidate| candidate != &identifier);
            simple = true;
        }
    }
    debug!(
        issued = state.canonical_issuer.issued_count(),
        shared = non_normalized.len(),
        "first-degree assignment finished"
    );

    // Break the surviving groups of hash-sharing blank nodes with the
    // N-degree hash, in ascending first-degree hash order.
    for (first_degree_hash, identifier_list) in &hash_to_blank_nodes {
        debug!(
            hash = %first_degree_hash,
            group = identifier_list.len(),
            "resolving shared first-degree hash"
        );
        let mut hash_path_list = Vec::<HashNDegreeQuadsResult>::new();
        for identifier in identifier_list {
            if state.canonical_issuer.has(identifier) {
                continue;
            }
            let mut temporary_issuer = IdentifierIssuer::new(TEMPORARY_IDENTIFIER_PREFIX);
            temporary_issuer.issue(identifier);
            hash_path_list.push(hash_n_degree_quads(
                &state,
                identifier,
                &temporary_issuer,
                &mut counter,
            )?);
        }
        hash_path_list.sort_by(|a, b| a.hash.cmp(&b.hash));
        for result in hash_path_list {
            for existing_identifier in result.issuer.issued_order() {
                state.canonical_issuer.issue(existing_identifier);
            }
        }
    }
    debug!(
        issued = state.canonical_issuer.issued_count(),
        hndq_calls = counter.sum(),
        "canonical assignment finished"
    );

    Ok(state.canonical_issuer.into_mapping())
}
