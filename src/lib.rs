//! URDNA2015 RDF dataset canonicalization.
//!
//! Deterministically rewrites the blank node labels of an RDF dataset into
//! the `_:c14n` namespace so that any two isomorphic datasets serialize to
//! byte-identical N-Quads.

mod api;
mod canon;
mod counter;
mod error;
mod nquads;
mod rdf;

pub use api::{
    canonicalize, canonicalize_with, issue, issue_with, normalize, relabel,
    CanonicalizationOptions, Normalized, APPLICATION_N_QUADS,
};
pub use error::CanonicalizationError;
pub use nquads::{parse, serialize, SerializeNQuads};
pub use rdf::{
    BlankNode, Dataset, Graph, Literal, NamedNode, Object, Quad, Subject, Triple,
    DEFAULT_GRAPH_KEY,
};

#[cfg(test)]
mod tests {
    use crate::{
        canonicalize, normalize, parse, BlankNode, CanonicalizationError, CanonicalizationOptions,
        Dataset, Literal, NamedNode, Normalized, Object, Subject, Triple, APPLICATION_N_QUADS,
    };
    use tracing_subscriber::fmt;

    fn init(level: tracing::Level) {
        let log_format = fmt::format()
            .with_level(false)
            .with_target(false)
            .without_time()
            .compact();
        let _ = fmt()
            .with_max_level(level)
            .event_format(log_format)
            .try_init();
    }

    fn nquads_options() -> CanonicalizationOptions {
        CanonicalizationOptions {
            format: Some(APPLICATION_N_QUADS.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn canonicalize_unique_hash_example() {
        let input_dataset = parse(
            r#"<http://example.com/#p> <http://example.com/#q> _:e0 .
<http://example.com/#p> <http://example.com/#r> _:e1 .
_:e0 <http://example.com/#s> <http://example.com/#u> .
_:e1 <http://example.com/#t> <http://example.com/#u> .
"#,
        )
        .unwrap();

        let expected_output = r#"<http://example.com/#p> <http://example.com/#q> _:c14n0 .
<http://example.com/#p> <http://example.com/#r> _:c14n1 .
_:c14n0 <http://example.com/#s> <http://example.com/#u> .
_:c14n1 <http://example.com/#t> <http://example.com/#u> .
"#;
        assert_eq!(canonicalize(&input_dataset).unwrap(), expected_output);
    }

    #[test]
    fn canonicalize_shared_hash_example() {
        //init(tracing::Level::DEBUG);

        let input_dataset = parse(
            r#"<http://example.com/#p> <http://example.com/#q> _:e0 .
<http://example.com/#p> <http://example.com/#q> _:e1 .
_:e0 <http://example.com/#p> _:e2 .
_:e1 <http://example.com/#p> _:e3 .
_:e2 <http://example.com/#r> _:e3 .
"#,
        )
        .unwrap();

        let expected_output = r#"<http://example.com/#p> <http://example.com/#q> _:c14n2 .
<http://example.com/#p> <http://example.com/#q> _:c14n3 .
_:c14n0 <http://example.com/#r> _:c14n1 .
_:c14n2 <http://example.com/#p> _:c14n1 .
_:c14n3 <http://example.com/#p> _:c14n0 .
"#;
        assert_eq!(canonicalize(&input_dataset).unwrap(), expected_output);
    }

    #[test]
    fn canonicalize_duplicated_paths_example() {
        let input_dataset = parse(
            r#"_:e0 <http://example.org/vocab#p1> _:e1 .
_:e1 <http://example.org/vocab#p2> "Foo" .
_:e2 <http://example.org/vocab#p1> _:e3 .
_:e3 <http://example.org/vocab#p2> "Foo" .
"#,
        )
        .unwrap();

        let expected_output = r#"_:c14n0 <http://example.org/vocab#p1> _:c14n1 .
_:c14n1 <http://example.org/vocab#p2> "Foo" .
_:c14n2 <http://example.org/vocab#p1> _:c14n3 .
_:c14n3 <http://example.org/vocab#p2> "Foo" .
"#;
        assert_eq!(canonicalize(&input_dataset).unwrap(), expected_output);
    }

    #[test]
    fn empty_dataset_canonicalizes_to_the_empty_string() {
        let input_dataset = parse("").unwrap();
        assert_eq!(canonicalize(&input_dataset).unwrap(), "");
        assert_eq!(
            normalize(&input_dataset, &CanonicalizationOptions::default()).unwrap(),
            Normalized::Dataset(Dataset::new())
        );
    }

    #[test]
    fn single_blank_node_subject_receives_the_first_label() {
        let input_dataset = parse("_:x <http://example/p> \"v\" .\n").unwrap();
        assert_eq!(
            canonicalize(&input_dataset).unwrap(),
            "_:c14n0 <http://example/p> \"v\" .\n"
        );
    }

    #[test]
    fn isomorphic_datasets_share_their_canonical_form() {
        let a = parse("_:a <http://ex/p> _:b .\n_:b <http://ex/q> \"1\" .\n").unwrap();
        let b = parse("_:foo <http://ex/p> _:bar .\n_:bar <http://ex/q> \"1\" .\n").unwrap();

        let canonical_a = canonicalize(&a).unwrap();
        let canonical_b = canonicalize(&b).unwrap();
        assert_eq!(canonical_a, canonical_b);
        assert_eq!(canonical_a.lines().count(), 2);
        assert!(canonical_a.contains("_:c14n0"));
        assert!(canonical_a.contains("_:c14n1"));
    }

    #[test]
    fn mutually_linked_pair_is_broken_deterministically() {
        let input_dataset =
            parse("_:a <http://ex/link> _:b .\n_:b <http://ex/link> _:a .\n").unwrap();
        let swapped = parse("_:b <http://ex/link> _:a .\n_:a <http://ex/link> _:b .\n").unwrap();

        let expected_output = "_:c14n0 <http://ex/link> _:c14n1 .\n\
                               _:c14n1 <http://ex/link> _:c14n0 .\n";
        assert_eq!(canonicalize(&input_dataset).unwrap(), expected_output);
        assert_eq!(canonicalize(&swapped).unwrap(), expected_output);
    }

    #[test]
    fn blank_graph_names_are_canonicalized() {
        let mut input_dataset = Dataset::new();
        input_dataset.insert(
            Some("_:g1"),
            Triple::new(
                Subject::BlankNode(BlankNode::new("_:s")),
                NamedNode::new("http://ex/p"),
                Object::Literal(Literal::simple("x")),
            ),
        );

        let canonicalized = canonicalize(&input_dataset).unwrap();
        assert_eq!(canonicalized.lines().count(), 1);
        assert!(canonicalized.contains("_:c14n0"));
        assert!(canonicalized.contains("_:c14n1"));

        let reparsed = parse(&canonicalized).unwrap();
        assert_eq!(canonicalize(&reparsed).unwrap(), canonicalized);
    }

    #[test]
    fn unsupported_formats_are_rejected_before_emission() {
        let input_dataset = parse("_:x <http://example/p> \"v\" .\n").unwrap();
        let options = CanonicalizationOptions {
            format: Some("text/turtle".to_string()),
            ..Default::default()
        };
        assert_eq!(
            normalize(&input_dataset, &options),
            Err(CanonicalizationError::UnknownFormat(
                "text/turtle".to_string()
            ))
        );
    }

    #[test]
    fn normalize_returns_nquads_text_when_requested() {
        let input_dataset = parse("_:x <http://example/p> \"v\" .\n").unwrap();
        assert_eq!(
            normalize(&input_dataset, &nquads_options()).unwrap(),
            Normalized::NQuads("_:c14n0 <http://example/p> \"v\" .\n".to_string())
        );
    }

    #[test]
    fn normalize_returns_a_dataset_by_default() {
        let input_dataset = parse("_:x <http://example/p> \"v\" .\n").unwrap();
        let normalized = normalize(&input_dataset, &CanonicalizationOptions::default()).unwrap();
        assert_eq!(
            normalized,
            Normalized::Dataset(parse("_:c14n0 <http://example/p> \"v\" .\n").unwrap())
        );
    }

    fn shared_hash_input() -> &'static str {
        r#"<http://example.com/#p> <http://example.com/#q> _:e0 .
<http://example.com/#p> <http://example.com/#q> _:e1 .
_:e0 <http://example.com/#p> _:e2 .
_:e1 <http://example.com/#p> _:e3 .
_:e2 <http://example.com/#r> _:e3 .
"#
    }

    #[test]
    fn quad_order_does_not_affect_the_output() {
        let forward = parse(shared_hash_input()).unwrap();
        let mut reversed_lines: Vec<&str> = shared_hash_input().lines().collect();
        reversed_lines.reverse();
        let reversed = parse(&(reversed_lines.join("\n") + "\n")).unwrap();

        assert_eq!(
            canonicalize(&forward).unwrap(),
            canonicalize(&reversed).unwrap()
        );
    }

    #[test]
    fn blank_node_labels_do_not_affect_the_output() {
        let original = parse(shared_hash_input()).unwrap();
        let relabeled_text = shared_hash_input()
            .replace("_:e0", "_:zebra")
            .replace("_:e1", "_:q")
            .replace("_:e2", "_:onion")
            .replace("_:e3", "_:x9");
        let relabeled = parse(&relabeled_text).unwrap();

        assert_eq!(
            canonicalize(&original).unwrap(),
            canonicalize(&relabeled).unwrap()
        );
    }

    #[test]
    fn renormalizing_the_output_is_a_fixed_point() {
        let input_dataset = parse(shared_hash_input()).unwrap();
        let canonicalized = canonicalize(&input_dataset).unwrap();

        let reparsed = parse(&canonicalized).unwrap();
        assert_eq!(canonicalize(&reparsed).unwrap(), canonicalized);
    }

    #[test]
    fn canonical_labels_are_dense_and_sorted() {
        let input_dataset = parse(shared_hash_input()).unwrap();
        let canonicalized = canonicalize(&input_dataset).unwrap();

        for expected in ["_:c14n0", "_:c14n1", "_:c14n2", "_:c14n3"] {
            assert!(canonicalized.contains(expected), "missing {}", expected);
        }
        assert!(!canonicalized.contains("_:c14n4"));

        let mut lines: Vec<&str> = canonicalized.lines().collect();
        let already_sorted = lines.clone();
        lines.sort();
        assert_eq!(lines, already_sorted);
    }

    #[test]
    fn symmetric_cycles_are_stable_under_relabeling() {
        let cycle = "_:a <http://ex/next> _:b .\n\
                     _:b <http://ex/next> _:c .\n\
                     _:c <http://ex/next> _:a .\n";
        let rotated = "_:c <http://ex/next> _:a .\n\
                       _:a <http://ex/next> _:b .\n\
                       _:b <http://ex/next> _:c .\n";
        let renamed = cycle
            .replace("_:a", "_:n1")
            .replace("_:b", "_:n2")
            .replace("_:c", "_:n3");

        let canonicalized = canonicalize(&parse(cycle).unwrap()).unwrap();
        assert_eq!(
            canonicalize(&parse(rotated).unwrap()).unwrap(),
            canonicalized
        );
        assert_eq!(
            canonicalize(&parse(&renamed).unwrap()).unwrap(),
            canonicalized
        );
        assert_eq!(canonicalized.lines().count(), 3);
        for line in canonicalized.lines() {
            assert!(line.starts_with("_:c14n"));
        }
    }

    #[test]
    fn pathological_groups_hit_the_call_limit() {
        let input_dataset = parse(
            "_:a <http://ex/next> _:b .\n\
             _:b <http://ex/next> _:c .\n\
             _:c <http://ex/next> _:a .\n",
        )
        .unwrap();
        let options = CanonicalizationOptions {
            format: Some(APPLICATION_N_QUADS.to_string()),
            hndq_call_limit: Some(1),
        };
        assert_eq!(
            normalize(&input_dataset, &options),
            Err(CanonicalizationError::HndqCallLimitExceeded(1))
        );
    }

    #[test]
    fn mixed_canonical_labels_are_rejected() {
        let input_dataset = parse("_:c14n0 <http://ex/p> _:x .\n").unwrap();
        assert_eq!(
            canonicalize(&input_dataset),
            Err(CanonicalizationError::CanonicalPrefixCollision(
                "_:c14n0".to_string()
            ))
        );
    }
}
