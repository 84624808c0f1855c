//! Route geometry and flat feed records produced by the decoders.
//!
//! Vendor tags the decoders know about land in named fields; every other tag is
//! preserved verbatim in an `attributes` map so new feed fields survive a decode.

use serde::Serialize;
use std::collections::BTreeMap;

/// Tag/value pairs for vendor fields without a named home.
pub type Attributes = BTreeMap<String, String>;

/// A transit line and its directional paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Route {
    pub id: String,
    pub attributes: Attributes,
    pub paths: Vec<Path>,
}

impl Route {
    /// Consumes the route, handing its paths to a downstream join.
    pub fn into_paths(self) -> Vec<Path> {
        self.paths
    }

    pub fn stop_count(&self) -> usize {
        self.paths.iter().map(|p| p.stops.len()).sum()
    }
}

/// One direction of travel for a route.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Path {
    pub id: String,
    /// Direction code, e.g. the headsign destination the crowding data is keyed by.
    pub d: String,
    /// Human-readable direction description.
    pub dd: String,
    pub attributes: Attributes,
    /// Stops in travel order.
    pub stops: Vec<Stop>,
}

impl Path {
    /// Projects the stops into the columns needed to join observation data.
    pub fn stop_listing(&self) -> Vec<StopListingRow> {
        self.stops
            .iter()
            .map(|stop| StopListingRow {
                d: stop.d.clone(),
                stop_id: stop.id.clone(),
                stop_name: stop.name.clone(),
            })
            .collect()
    }
}

/// A waypoint marked as a passenger stop.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Direction code of the owning path.
    pub d: String,
    /// Zero-based position within the path.
    pub index: usize,
    /// Feet from the previous stop; `None` for the first stop of a path.
    pub distance_to_prev_ft: Option<f64>,
}

/// Row of [`Path::stop_listing`]. Field names double as CSV headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopListingRow {
    pub d: String,
    pub stop_id: String,
    pub stop_name: String,
}

/// A vehicle position record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bus {
    /// Vehicle id.
    pub id: String,
    /// Route id.
    pub rt: String,
    /// Run (block) id.
    pub run: String,
    /// Final stop / destination sign.
    pub fs: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Bus {
    pub(crate) fn from_fields(mut fields: Attributes) -> Self {
        Self {
            id: fields.remove("id").unwrap_or_default(),
            rt: fields.remove("rt").unwrap_or_default(),
            run: fields.remove("run").unwrap_or_default(),
            fs: fields.remove("fs").unwrap_or_default(),
            attributes: fields,
        }
    }
}

/// An arrival prediction at a single stop.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StopPrediction {
    pub stop_id: String,
    pub stop_name: String,
    /// Minutes to arrival, numeric token only.
    pub pt: String,
    /// Route number.
    pub rn: String,
    /// Final destination.
    pub fd: String,
    /// Vehicle id.
    pub v: String,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl StopPrediction {
    pub(crate) fn from_fields(mut fields: Attributes) -> Self {
        Self {
            stop_id: String::new(),
            stop_name: String::new(),
            pt: fields.remove("pt").unwrap_or_default(),
            rn: fields.remove("rn").unwrap_or_default(),
            fd: fields.remove("fd").unwrap_or_default(),
            v: fields.remove("v").unwrap_or_default(),
            attributes: fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str, name: &str, index: usize) -> Stop {
        Stop {
            id: id.to_string(),
            name: name.to_string(),
            d: "New York".to_string(),
            index,
            ..Default::default()
        }
    }

    #[test]
    fn test_stop_listing_preserves_order() {
        let path = Path {
            d: "New York".to_string(),
            stops: vec![stop("20496", "Central Ave", 0), stop("20497", "Palisade Ave", 1)],
            ..Default::default()
        };

        let listing = path.stop_listing();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].stop_id, "20496");
        assert_eq!(listing[1].stop_name, "Palisade Ave");
        assert!(listing.iter().all(|row| row.d == "New York"));
        // projection does not consume or alter the path
        assert_eq!(path.stops.len(), 2);
    }

    #[test]
    fn test_empty_path_has_empty_listing() {
        assert!(Path::default().stop_listing().is_empty());
    }

    #[test]
    fn test_bus_from_fields_moves_known_tags() {
        let mut fields = Attributes::new();
        fields.insert("rt".to_string(), "119".to_string());
        fields.insert("run".to_string(), "412".to_string());
        fields.insert("lat".to_string(), "40.73".to_string());

        let bus = Bus::from_fields(fields);
        assert_eq!(bus.rt, "119");
        assert_eq!(bus.run, "412");
        assert_eq!(bus.id, "");
        assert_eq!(bus.attributes.get("lat").map(String::as_str), Some("40.73"));
        assert!(!bus.attributes.contains_key("rt"));
    }

    #[test]
    fn test_route_stop_count() {
        let route = Route {
            paths: vec![
                Path {
                    stops: vec![stop("1", "a", 0)],
                    ..Default::default()
                },
                Path::default(),
            ],
            ..Default::default()
        };
        assert_eq!(route.stop_count(), 1);
        assert_eq!(route.into_paths().len(), 2);
    }
}
