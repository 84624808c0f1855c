//! Decoders for the BusTime XML message shapes.
//!
//! Every shape is read with the same idiom: an element's children are folded into a
//! flat tag → text record. A child without text maps to `""`, never to a missing key,
//! and unknown tags are carried along rather than rejected.

mod buses;
mod predictions;
mod route_points;

pub use buses::{decode_bus_list, decode_buses_for_route, is_valid_bus};
pub use predictions::decode_stop_predictions;
pub use route_points::{decode_route_points, validate_route_points};

use roxmltree::{Document, Node};

use crate::error::DecodeError;
use crate::model::Attributes;

/// Parses raw feed bytes into a document tree.
fn parse_document(text: &str) -> Result<Document<'_>, DecodeError> {
    Ok(Document::parse(text)?)
}

fn as_text(xml: &[u8]) -> Result<&str, DecodeError> {
    Ok(std::str::from_utf8(xml)?)
}

fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(Node::is_element)
}

/// True when the element carries no child elements (text and comments don't count).
fn is_leaf(node: Node<'_, '_>) -> bool {
    !node.children().any(|n| n.is_element())
}

fn tag<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Text preceding the element's first child element. Comments and processing
/// instructions in between are skipped, so `<lat><!-- c -->40.7</lat>` reads `40.7`.
fn text_of(node: Node<'_, '_>) -> String {
    node.children()
        .take_while(|n| !n.is_element())
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    element_children(node).find(|n| n.has_tag_name(name))
}

/// Text of the first direct child named `name`, or `""` when absent or empty.
fn child_text(node: Node<'_, '_>, name: &str) -> String {
    child_element(node, name).map(text_of).unwrap_or_default()
}

/// Folds direct children into a record; the first occurrence of a tag wins.
fn fold_children(node: Node<'_, '_>) -> Attributes {
    fold(element_children(node))
}

/// Folds every descendant element (not `node` itself) into a record, depth first;
/// the first occurrence of a tag wins.
fn fold_descendants(node: Node<'_, '_>) -> Attributes {
    fold(node.descendants().skip(1).filter(Node::is_element))
}

fn fold<'a, 'input: 'a>(nodes: impl Iterator<Item = Node<'a, 'input>>) -> Attributes {
    let mut fields = Attributes::new();
    for node in nodes {
        fields
            .entry(tag(node).to_string())
            .or_insert_with(|| text_of(node));
    }
    fields
}
