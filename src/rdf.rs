//! RDF terms, quads and the graph-keyed dataset consumed by the
//! canonicalization algorithm.

use std::collections::BTreeMap;

/// Key under which the default graph is stored in a [`Dataset`].
pub const DEFAULT_GRAPH_KEY: &str = "@default";

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// An IRI term (example: `http://example.org/resource`).
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct NamedNode {
    value: String,
}

impl NamedNode {
    pub fn new(value: impl Into<String>) -> NamedNode {
        NamedNode {
            value: value.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// A blank node. The label is stored verbatim and by convention begins
/// with `_:` (example: `_:b0`).
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct BlankNode {
    value: String,
}

impl BlankNode {
    pub fn new(label: impl Into<String>) -> BlankNode {
        BlankNode {
            value: label.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// A literal term. A plain string literal carries neither language nor
/// datatype; a language-tagged literal carries only its tag.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct Literal {
    value: String,
    language: Option<String>,
    datatype: Option<NamedNode>,
}

impl Literal {
    /// A string literal with the implicit `xsd:string` datatype.
    pub fn simple(value: impl Into<String>) -> Literal {
        Literal {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    /// A typed literal. An explicit `xsd:string` datatype is normalized
    /// away so that `"v"` and `"v"^^xsd:string` compare and serialize
    /// identically.
    pub fn typed(value: impl Into<String>, datatype: NamedNode) -> Literal {
        let datatype = if datatype.as_str() == XSD_STRING {
            None
        } else {
            Some(datatype)
        };
        Literal {
            value: value.into(),
            language: None,
            datatype,
        }
    }

    pub fn language_tagged(value: impl Into<String>, language: impl Into<String>) -> Literal {
        Literal {
            value: value.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn datatype(&self) -> Option<&NamedNode> {
        self.datatype.as_ref()
    }
}

/// The subject of a quad: an IRI or a blank node.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum Subject {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
}

/// The object of a quad: an IRI, a blank node or a literal.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum Object {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
}

/// The graph component of a quad: the default graph, an IRI or a blank
/// node.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub enum Graph {
    DefaultGraph,
    NamedNode(NamedNode),
    BlankNode(BlankNode),
}

impl Graph {
    /// Interprets a dataset graph key: the sentinel key names the default
    /// graph, a key beginning with `_:` a blank node, anything else an IRI.
    pub fn from_name(name: &str) -> Graph {
        if name == DEFAULT_GRAPH_KEY {
            Graph::DefaultGraph
        } else if name.starts_with("_:") {
            Graph::BlankNode(BlankNode::new(name))
        } else {
            Graph::NamedNode(NamedNode::new(name))
        }
    }

    /// The dataset key this graph component is stored under.
    pub fn name(&self) -> &str {
        match self {
            Graph::DefaultGraph => DEFAULT_GRAPH_KEY,
            Graph::NamedNode(n) => n.as_str(),
            Graph::BlankNode(n) => n.as_str(),
        }
    }
}

/// A triple within a single graph. Predicates are always IRIs.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct Triple {
    pub subject: Subject,
    pub predicate: NamedNode,
    pub object: Object,
}

impl Triple {
    pub fn new(subject: Subject, predicate: NamedNode, object: Object) -> Triple {
        Triple {
            subject,
            predicate,
            object,
        }
    }
}

/// A triple together with the graph it belongs to.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct Quad {
    pub subject: Subject,
    pub predicate: NamedNode,
    pub object: Object,
    pub graph: Graph,
}

impl Quad {
    pub fn new(subject: Subject, predicate: NamedNode, object: Object, graph: Graph) -> Quad {
        Quad {
            subject,
            predicate,
            object,
            graph,
        }
    }
}

/// An RDF dataset: a map from graph name (or [`DEFAULT_GRAPH_KEY`]) to an
/// ordered sequence of triples.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Dataset {
    graphs: BTreeMap<String, Vec<Triple>>,
}

impl Dataset {
    pub fn new() -> Dataset {
        Dataset::default()
    }

    /// Appends a triple to the named graph, or to the default graph when
    /// `graph_name` is `None`.
    pub fn insert(&mut self, graph_name: Option<&str>, triple: Triple) {
        let key = graph_name.unwrap_or(DEFAULT_GRAPH_KEY).to_string();
        self.graphs.entry(key).or_default().push(triple);
    }

    /// Appends a quad, routing its triple into the graph named by the quad's
    /// graph component.
    pub fn insert_quad(&mut self, quad: Quad) {
        let key = quad.graph.name().to_string();
        self.graphs
            .entry(key)
            .or_default()
            .push(Triple::new(quad.subject, quad.predicate, quad.object));
    }

    /// Total number of triples across all graphs.
    pub fn len(&self) -> usize {
        self.graphs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.values().all(Vec::is_empty)
    }

    pub fn graph_names(&self) -> impl Iterator<Item = &str> {
        self.graphs.keys().map(String::as_str)
    }

    pub fn triples(&self, graph_name: &str) -> Option<&[Triple]> {
        self.graphs.get(graph_name).map(Vec::as_slice)
    }

    /// Flattens the dataset into a list of quads, attaching each graph name
    /// as a graph component per [`Graph::from_name`].
    pub fn to_quads(&self) -> Vec<Quad> {
        let mut quads = Vec::with_capacity(self.len());
        for (name, triples) in &self.graphs {
            let graph = Graph::from_name(name);
            for triple in triples {
                quads.push(Quad::new(
                    triple.subject.clone(),
                    triple.predicate.clone(),
                    triple.object.clone(),
                    graph.clone(),
                ));
            }
        }
        quads
    }
}

impl FromIterator<Quad> for Dataset {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Dataset {
        let mut dataset = Dataset::new();
        for quad in iter {
            dataset.insert_quad(quad);
        }
        dataset
    }
}
