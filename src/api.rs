use crate::canon::{canonicalize_core, CANONICAL_IDENTIFIER_PREFIX};
use crate::error::CanonicalizationError;
use crate::nquads;
use crate::rdf::{BlankNode, Dataset, Graph, Object, Quad, Subject};
use std::collections::HashMap;

/// The only output format [`normalize`] recognizes besides the parsed
/// dataset form.
pub const APPLICATION_N_QUADS: &str = "application/n-quads";

/// Options accepted by [`normalize`] and the `_with` entry points.
#[derive(Debug, Clone, Default)]
pub struct CanonicalizationOptions {
    /// Requested output format. `None` returns a parsed dataset;
    /// [`APPLICATION_N_QUADS`] returns the serialized text; anything else
    /// fails with [`CanonicalizationError::UnknownFormat`].
    pub format: Option<String>,
    /// Upper bound on calls to the hash n-degree quads algorithm.
    pub hndq_call_limit: Option<usize>,
}

/// Result of [`normalize`]: either the canonical N-Quads text or the same
/// text parsed back into dataset form, depending on the requested format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    NQuads(String),
    Dataset(Dataset),
}

/// Canonicalizes the dataset and returns the result in the requested form.
///
/// # Examples
///
/// ```
/// use rdf_normalize::{normalize, parse, CanonicalizationOptions, Normalized, APPLICATION_N_QUADS};
///
/// let input = parse(
///     "_:a <http://ex/link> _:b .\n\
///      _:b <http://ex/link> _:a .\n",
/// )
/// .unwrap();
/// let options = CanonicalizationOptions {
///     format: Some(APPLICATION_N_QUADS.to_string()),
///     ..Default::default()
/// };
///
/// let normalized = normalize(&input, &options).unwrap();
///
/// assert_eq!(
///     normalized,
///     Normalized::NQuads(
///         "_:c14n0 <http://ex/link> _:c14n1 .\n\
///          _:c14n1 <http://ex/link> _:c14n0 .\n"
///             .to_string()
///     )
/// );
/// ```
pub fn normalize(
    input_dataset: &Dataset,
    options: &CanonicalizationOptions,
) -> Result<Normalized, CanonicalizationError> {
    match options.format.as_deref() {
        None | Some(APPLICATION_N_QUADS) => {}
        Some(other) => return Err(CanonicalizationError::UnknownFormat(other.to_string())),
    }
    let text = canonicalize_with(input_dataset, options)?;
    match options.format {
        Some(_) => Ok(Normalized::NQuads(text)),
        None => Ok(Normalized::Dataset(nquads::parse(&text)?)),
    }
}

/// Returns the serialized canonical form of the dataset, where any blank
/// nodes are assigned deterministic identifiers.
///
/// # Examples
///
/// ```
/// use rdf_normalize::{canonicalize, parse};
///
/// let input = parse(
///     "<http://example.com/#p> <http://example.com/#q> _:e0 .\n\
///      <http://example.com/#p> <http://example.com/#r> _:e1 .\n\
///      _:e0 <http://example.com/#s> <http://example.com/#u> .\n\
///      _:e1 <http://example.com/#t> <http://example.com/#u> .\n",
/// )
/// .unwrap();
///
/// let canonicalized = canonicalize(&input).unwrap();
///
/// assert_eq!(
///     canonicalized,
///     "<http://example.com/#p> <http://example.com/#q> _:c14n0 .\n\
///      <http://example.com/#p> <http://example.com/#r> _:c14n1 .\n\
///      _:c14n0 <http://example.com/#s> <http://example.com/#u> .\n\
///      _:c14n1 <http://example.com/#t> <http://example.com/#u> .\n"
/// );
/// ```
pub fn canonicalize(input_dataset: &Dataset) -> Result<String, CanonicalizationError> {
    canonicalize_with(input_dataset, &CanonicalizationOptions::default())
}

/// [`canonicalize`] with explicit options.
pub fn canonicalize_with(
    input_dataset: &Dataset,
    options: &CanonicalizationOptions,
) -> Result<String, CanonicalizationError> {
    let issued_identifiers_map = issue_with(input_dataset, options)?;
    let relabeled_dataset = relabel(input_dataset, &issued_identifiers_map)?;
    Ok(nquads::serialize(&relabeled_dataset))
}

/// Assigns deterministic identifiers to any blank nodes in the dataset and
/// returns the assignment as a map from existing to canonical identifiers.
///
/// # Examples
///
/// ```
/// use rdf_normalize::{issue, parse};
/// use std::collections::HashMap;
///
/// let input = parse(
///     "<http://example.com/#p> <http://example.com/#q> _:e0 .\n\
///      <http://example.com/#p> <http://example.com/#r> _:e1 .\n\
///      _:e0 <http://example.com/#s> <http://example.com/#u> .\n\
///      _:e1 <http://example.com/#t> <http://example.com/#u> .\n",
/// )
/// .unwrap();
///
/// let issued_identifiers_map = issue(&input).unwrap();
///
/// assert_eq!(
///     issued_identifiers_map,
///     HashMap::from([
///         ("_:e0".to_string(), "_:c14n0".to_string()),
///         ("_:e1".to_string(), "_:c14n1".to_string()),
///     ])
/// );
/// ```
pub fn issue(input_dataset: &Dataset) -> Result<HashMap<String, String>, CanonicalizationError> {
    issue_with(input_dataset, &CanonicalizationOptions::default())
}

/// [`issue`] with explicit options.
pub fn issue_with(
    input_dataset: &Dataset,
    options: &CanonicalizationOptions,
) -> Result<HashMap<String, String>, CanonicalizationError> {
    canonicalize_core(input_dataset, options.hndq_call_limit)
}

/// Re-labels blank node identifiers in the dataset according to an issued
/// identifiers map. A label already inside the canonical namespace that the
/// map does not cover is left untouched.
///
/// # Examples
///
/// ```
/// use rdf_normalize::{parse, relabel, serialize};
/// use std::collections::HashMap;
///
/// let input = parse("_:x <http://example.org/p> \"v\" .\n").unwrap();
/// let issued_identifiers_map =
///     HashMap::from([("_:x".to_string(), "_:c14n0".to_string())]);
///
/// let relabeled = relabel(&input, &issued_identifiers_map).unwrap();
///
/// assert_eq!(
///     serialize(&relabeled),
///     "_:c14n0 <http://example.org/p> \"v\" .\n"
/// );
/// ```
pub fn relabel(
    input_dataset: &Dataset,
    issued_identifiers_map: &HashMap<String, String>,
) -> Result<Dataset, CanonicalizationError> {
    input_dataset
        .to_quads()
        .into_iter()
        .map(|quad| relabel_quad(quad, issued_identifiers_map))
        .collect()
}

fn relabel_quad(
    quad: Quad,
    issued_identifiers_map: &HashMap<String, String>,
) -> Result<Quad, CanonicalizationError> {
    let subject = match quad.subject {
        Subject::BlankNode(n) => Subject::BlankNode(relabel_blank_node(n, issued_identifiers_map)?),
        s => s,
    };
    let object = match quad.object {
        Object::BlankNode(n) => Object::BlankNode(relabel_blank_node(n, issued_identifiers_map)?),
        o => o,
    };
    let graph = match quad.graph {
        Graph::BlankNode(n) => Graph::BlankNode(relabel_blank_node(n, issued_identifiers_map)?),
        g => g,
    };
    Ok(Quad::new(subject, quad.predicate, object, graph))
}

fn relabel_blank_node(
    node: BlankNode,
    issued_identifiers_map: &HashMap<String, String>,
) -> Result<BlankNode, CanonicalizationError> {
    match issued_identifiers_map.get(node.as_str()) {
        Some(canonical_identifier) => Ok(BlankNode::new(canonical_identifier.clone())),
        None if node.as_str().starts_with(CANONICAL_IDENTIFIER_PREFIX) => Ok(node),
        None => Err(CanonicalizationError::MissingCanonicalIdentifier(
            node.as_str().to_string(),
        )),
    }
}
