//! `getBusesForRouteAll` and `getBusesForRoute` documents: a list of `<bus>` records.

use roxmltree::Node;
use tracing::debug;

use super::{as_text, element_children, fold_children, fold_descendants, parse_document};
use crate::error::DecodeError;
use crate::model::{Attributes, Bus};

const BUS: &str = "bus";

/// Decodes a bus list, folding every nested tag of each `<bus>` into its record.
///
/// Buses failing [`is_valid_bus`] are dropped.
pub fn decode_bus_list(xml: &[u8]) -> Result<Vec<Bus>, DecodeError> {
    decode_buses(xml, fold_descendants)
}

/// Decodes a single-route bus list, reading only the direct children of each `<bus>`.
///
/// Buses failing [`is_valid_bus`] are dropped.
pub fn decode_buses_for_route(xml: &[u8]) -> Result<Vec<Bus>, DecodeError> {
    decode_buses(xml, fold_children)
}

/// Accepts a bus only if its route id and run id are both all decimal digits.
///
/// The feed emits placeholder vehicles with ids such as `"12A"` or `"N/A"`.
pub fn is_valid_bus(bus: &Bus) -> bool {
    is_all_digits(&bus.rt) && is_all_digits(&bus.run)
}

fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn decode_buses(
    xml: &[u8],
    fold: fn(Node<'_, '_>) -> Attributes,
) -> Result<Vec<Bus>, DecodeError> {
    let doc = parse_document(as_text(xml)?)?;

    let decoded: Vec<Bus> = element_children(doc.root_element())
        .filter(|n| n.has_tag_name(BUS))
        .map(|n| Bus::from_fields(fold(n)))
        .collect();
    let total = decoded.len();

    let buses: Vec<Bus> = decoded
        .into_iter()
        .filter(|bus| {
            let keep = is_valid_bus(bus);
            if !keep {
                debug!(bus_id = %bus.id, rt = %bus.rt, run = %bus.run, "Dropping placeholder bus");
            }
            keep
        })
        .collect();

    debug!(total, kept = buses.len(), "Decoded bus list");
    Ok(buses)
}
