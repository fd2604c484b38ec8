//! RDF/JSON encoding of graphs
//!
//! Change-sets leave the process as RDF/JSON documents:
//!
//! ```json
//! { "http://s": { "http://p": [ { "type": "literal", "value": "v" } ] } }
//! ```
//!
//! Subject and predicate order follows the graph's stored order.

use crate::error::GraphError;
use crate::graph::{Graph, Triple};
use crate::term::{Iri, Literal, Term};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

type Document = IndexMap<String, IndexMap<String, Vec<ObjectNode>>>;

#[derive(Debug, Serialize, Deserialize)]
struct ObjectNode {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lang: Option<String>,
}

impl From<&Term> for ObjectNode {
    fn from(term: &Term) -> Self {
        match term {
            Term::Iri(iri) => Self {
                kind: "uri".into(),
                value: iri.as_str().into(),
                datatype: None,
                lang: None,
            },
            Term::Blank(label) => Self {
                kind: "bnode".into(),
                value: format!("_:{label}"),
                datatype: None,
                lang: None,
            },
            Term::Literal(lit) => Self {
                kind: "literal".into(),
                value: lit.lexical().into(),
                datatype: lit.datatype().map(|d| d.as_str().into()),
                lang: lit.language().map(Into::into),
            },
        }
    }
}

impl TryFrom<ObjectNode> for Term {
    type Error = GraphError;

    fn try_from(node: ObjectNode) -> Result<Self, Self::Error> {
        match node.kind.as_str() {
            "uri" => Ok(Term::Iri(Iri::new(&node.value)?)),
            "bnode" => Ok(node_term(&node.value)?),
            "literal" => Ok(Term::Literal(match (node.lang, node.datatype) {
                (Some(lang), _) => Literal::with_language(&node.value, lang),
                (None, Some(dt)) => Literal::typed(&node.value, Iri::new(dt)?),
                (None, None) => Literal::plain(&node.value),
            })),
            other => Err(GraphError::UnsupportedObjectType(other.to_string())),
        }
    }
}

fn node_term(text: &str) -> Result<Term, GraphError> {
    match text.strip_prefix("_:") {
        Some(label) => Ok(Term::blank(label)),
        None => Ok(Term::Iri(Iri::new(text)?)),
    }
}

fn subject_key(term: &Term) -> String {
    match term {
        Term::Blank(label) => format!("_:{label}"),
        Term::Iri(iri) => iri.as_str().to_string(),
        // Literal subjects are not representable; keep their lexical form
        Term::Literal(lit) => lit.lexical().to_string(),
    }
}

fn to_document(graph: &Graph) -> Document {
    let mut doc = Document::new();
    for triple in graph {
        doc.entry(subject_key(&triple.subject))
            .or_default()
            .entry(triple.predicate.as_str().to_string())
            .or_default()
            .push(ObjectNode::from(&triple.object));
    }
    doc
}

/// Encode a graph as compact RDF/JSON
///
/// # Errors
/// Returns [`GraphError::Json`] if serialization fails
pub fn to_string(graph: &Graph) -> Result<String, GraphError> {
    Ok(serde_json::to_string(&to_document(graph))?)
}

/// Encode a graph as indented RDF/JSON
///
/// # Errors
/// Returns [`GraphError::Json`] if serialization fails
pub fn to_string_pretty(graph: &Graph) -> Result<String, GraphError> {
    Ok(serde_json::to_string_pretty(&to_document(graph))?)
}

/// Decode an RDF/JSON document
///
/// # Errors
/// Returns an error on malformed JSON, invalid IRIs or unknown object types
pub fn from_str(text: &str) -> Result<Graph, GraphError> {
    let doc: Document = serde_json::from_str(text)?;
    let mut graph = Graph::new();
    for (subject, predicates) in doc {
        let subject = node_term(&subject)?;
        for (predicate, objects) in predicates {
            let predicate = Iri::new(&predicate)?;
            for object in objects {
                graph.insert(Triple::new(subject.clone(), &predicate, Term::try_from(object)?));
            }
        }
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab;
    use proptest::prelude::*;

    #[test]
    fn change_set_survives_round_trip() {
        let pot = Iri::new("urn:temp:uuid:pot:1").unwrap();
        let mut g = Graph::new();
        g.add(&pot, &vocab::RDF_TYPE, &*vocab::POT);
        g.add(&pot, &vocab::HAS_POT_NUMBER, Literal::string("7"));
        g.add(&pot, &vocab::RDFS_LABEL, Literal::with_language("Pot", "en"));
        g.add(Term::blank("b0"), &vocab::RDFS_COMMENT, Literal::plain("anon"));

        let text = to_string(&g).unwrap();
        let back = from_str(&text).unwrap();
        assert_eq!(back, g);
    }

    fn subject() -> impl Strategy<Value = Term> {
        prop_oneof![
            "[a-z0-9]{1,8}".prop_map(|s| Term::Iri(Iri::new(format!("http://example.org/s/{s}")).unwrap())),
            "[a-z][a-z0-9]{0,5}".prop_map(Term::blank),
        ]
    }

    fn object() -> impl Strategy<Value = Term> {
        prop_oneof![
            subject(),
            "\\PC{0,20}".prop_map(|s| Term::Literal(Literal::plain(s))),
            "\\PC{0,20}".prop_map(|s| Term::Literal(Literal::string(s))),
            ("\\PC{0,20}", "[a-z]{2}").prop_map(|(s, lang)| Term::Literal(Literal::with_language(s, lang))),
        ]
    }

    fn triple() -> impl Strategy<Value = Triple> {
        (subject(), "[a-z]{1,6}", object()).prop_map(|(s, p, o)| {
            let predicate = Iri::new(format!("http://example.org/p/{p}")).unwrap();
            Triple::new(s, &predicate, o)
        })
    }

    proptest! {
        #[test]
        fn any_graph_survives_round_trip(triples in prop::collection::vec(triple(), 0..24)) {
            let graph: Graph = triples.into_iter().collect();
            let back = from_str(&to_string(&graph).unwrap()).unwrap();
            prop_assert_eq!(back.len(), graph.len());
            prop_assert_eq!(back, graph);
        }
    }

    #[test]
    fn rejects_unknown_object_type() {
        let text = r#"{"http://s/x":{"http://p/y":[{"type":"triple","value":"z"}]}}"#;
        assert!(matches!(
            from_str(text),
            Err(GraphError::UnsupportedObjectType(t)) if t == "triple"
        ));
    }

    #[test]
    fn rejects_invalid_predicate() {
        let text = r#"{"http://s/x":{"not an iri":[{"type":"literal","value":"z"}]}}"#;
        assert!(matches!(from_str(text), Err(GraphError::InvalidIri { .. })));
    }
}
