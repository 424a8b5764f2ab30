//! Dotted field path resolution over an [`AlertPayload`].

use super::{string_map_json, AlertPayload, Scalar, ANNOTATIONS, LABELS};
use std::collections::BTreeMap;

/// A position reached while walking a field path.
#[derive(Clone, Copy)]
enum Node<'a> {
    Root,
    Map(&'a BTreeMap<String, String>),
    Scalar(&'a Scalar),
    Text(&'a str),
}

impl<'a> Node<'a> {
    /// Step into `key`. Only the root and the label/annotation maps are records;
    /// stepping into anything else fails.
    fn child(&self, payload: &'a AlertPayload, key: &str) -> Option<Node<'a>> {
        match *self {
            Node::Root => match key {
                LABELS => Some(Node::Map(&payload.labels)),
                ANNOTATIONS => Some(Node::Map(&payload.annotations)),
                _ => payload.fields.get(key).map(Node::Scalar),
            },
            Node::Map(map) => map.get(key).map(|v| Node::Text(v.as_str())),
            Node::Scalar(_) | Node::Text(_) => None,
        }
    }

    fn render(&self, payload: &AlertPayload) -> String {
        match *self {
            Node::Root => payload.to_json().to_string(),
            Node::Map(map) => string_map_json(map).to_string(),
            Node::Scalar(s) => s.to_string(),
            Node::Text(t) => t.to_string(),
        }
    }
}

/// Resolve a dotted field path against an alert payload.
///
/// - `""` or `"."` yields the whole payload as canonical JSON.
/// - A pre-flattened key equal to `path` wins over traversal.
/// - Otherwise `path` is walked segment by segment from the top level, through
///   `labels.*` and `annotations.*`.
///
/// Returns `None` when a segment is missing or an intermediate segment is not
/// a record. No partial result is ever returned.
pub fn resolve(payload: &AlertPayload, path: &str) -> Option<String> {
    if path.is_empty() || path == "." {
        return Some(Node::Root.render(payload));
    }

    if let Some(value) = payload.flattened.get(path) {
        return Some(value.to_string());
    }

    let mut node = Node::Root;
    for segment in path.split('.') {
        node = node.child(payload, segment)?;
    }
    Some(node.render(payload))
}
