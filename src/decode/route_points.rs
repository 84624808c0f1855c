//! `getRoutePoints` documents: a route, its directional paths, and their points.
//!
//! ```xml
//! <route>
//!   <id>119</id>
//!   <pas>
//!     <pa>
//!       <id>1151</id><d>New York</d><dd>NEW YORK</dd>
//!       <pt><lat>40.73</lat><lon>-74.03</lon><bs><id>20496</id><st>Central Ave</st></bs></pt>
//!       <pt><lat>40.74</lat><lon>-74.03</lon></pt>
//!     </pa>
//!   </pas>
//! </route>
//! ```

use roxmltree::Node;
use tracing::debug;

use super::{
    as_text, child_element, child_text, element_children, is_leaf, parse_document, tag, text_of,
};
use crate::error::DecodeError;
use crate::geo::distance_feet;
use crate::model::{Path, Route, Stop};

const PATH_CONTAINER: &str = "pas";
const PATH: &str = "pa";
const POINT: &str = "pt";
/// Sub-element whose presence promotes a point to a passenger stop.
const STOP_MARKER: &str = "bs";

/// Decodes a route-points document.
///
/// The document root is the route, so the result holds exactly one [`Route`]. Points
/// without a stop marker are dropped. A stop with a missing or non-numeric coordinate
/// fails the whole decode.
pub fn decode_route_points(xml: &[u8]) -> Result<Vec<Route>, DecodeError> {
    let doc = parse_document(as_text(xml)?)?;
    let mut route = Route::default();

    for child in element_children(doc.root_element()) {
        if is_leaf(child) {
            match tag(child) {
                "id" => route.id = text_of(child),
                other => {
                    route.attributes.insert(other.to_string(), text_of(child));
                }
            }
        } else if child.has_tag_name(PATH_CONTAINER) {
            for pa in element_children(child).filter(|n| n.has_tag_name(PATH)) {
                route.paths.push(decode_path(pa)?);
            }
        }
    }

    debug!(
        route_id = %route.id,
        paths = route.paths.len(),
        stops = route.stop_count(),
        "Decoded route points"
    );
    Ok(vec![route])
}

/// Reports whether the document describes at least one path.
///
/// The feed answers unknown route ids with a well-formed but path-less document.
pub fn validate_route_points(xml: &[u8]) -> Result<bool, DecodeError> {
    let doc = parse_document(as_text(xml)?)?;
    Ok(child_element(doc.root_element(), PATH_CONTAINER)
        .is_some_and(|pas| element_children(pas).any(|n| n.has_tag_name(PATH))))
}

/// Running state while walking one path's points.
#[derive(Default)]
struct StopFold {
    stops: Vec<Stop>,
}

impl StopFold {
    fn push(&mut self, mut stop: Stop) {
        stop.index = self.stops.len();
        // intermediate shape points are not accumulated
        stop.distance_to_prev_ft = self
            .stops
            .last()
            .map(|prev| distance_feet(prev.lat, prev.lon, stop.lat, stop.lon));
        self.stops.push(stop);
    }
}

fn decode_path(pa: Node<'_, '_>) -> Result<Path, DecodeError> {
    let mut path = Path::default();
    let mut fold = StopFold::default();

    for child in element_children(pa) {
        if is_leaf(child) {
            match tag(child) {
                "id" => path.id = text_of(child),
                "d" => path.d = text_of(child),
                "dd" => path.dd = text_of(child),
                other => {
                    path.attributes.insert(other.to_string(), text_of(child));
                }
            }
        } else if child.has_tag_name(POINT) {
            if let Some(stop) = decode_stop(child)? {
                fold.push(stop);
            }
        }
    }

    path.stops = fold.stops;
    for stop in &mut path.stops {
        stop.d = path.d.clone();
    }
    Ok(path)
}

fn decode_stop(pt: Node<'_, '_>) -> Result<Option<Stop>, DecodeError> {
    let Some(marker) = child_element(pt, STOP_MARKER) else {
        return Ok(None);
    };

    let id = child_text(marker, "id");
    let lat = coordinate(pt, "lat", &id)?;
    let lon = coordinate(pt, "lon", &id)?;

    Ok(Some(Stop {
        name: child_text(marker, "st"),
        id,
        lat,
        lon,
        ..Default::default()
    }))
}

fn coordinate(pt: Node<'_, '_>, field: &'static str, stop_id: &str) -> Result<f64, DecodeError> {
    let value = child_text(pt, field);
    match value.trim().parse::<f64>() {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(DecodeError::Coordinate {
            stop_id: stop_id.to_string(),
            field,
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_DIRECTIONS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<route>
  <id>119</id>
  <rtclr>#0000ff</rtclr>
  <pas>
    <pa>
      <id>1151</id>
      <d>New York</d>
      <dd>NEW YORK</dd>
      <pt><lat>40.7357</lat><lon>-74.0311</lon><bs><id>20496</id><st>Central Ave at Hutton St</st></bs></pt>
      <pt><lat>40.7361</lat><lon>-74.0311</lon></pt>
      <pt><lat>40.7366</lat><lon>-74.0311</lon><bs><id>20497</id><st>Central Ave at Bowers St</st></bs></pt>
      <pt><lat>40.7589</lat><lon>-73.9851</lon><bs><id>3511</id><st>Port Authority Bus Terminal</st></bs></pt>
    </pa>
    <pa>
      <id>1152</id>
      <d>Jersey City</d>
      <dd>JERSEY CITY</dd>
      <pt><lat>40.7589</lat><lon>-73.9851</lon><bs><id>3511</id><st>Port Authority Bus Terminal</st></bs></pt>
      <pt><lat>40.7357</lat><lon>-74.0311</lon><bs><id>20496</id><st>Central Ave at Hutton St</st></bs></pt>
    </pa>
  </pas>
</route>"#;

    fn decode_one(xml: &str) -> Route {
        let mut routes = decode_route_points(xml.as_bytes()).unwrap();
        assert_eq!(routes.len(), 1);
        routes.remove(0)
    }

    #[test]
    fn test_route_identity_and_attributes() {
        let route = decode_one(TWO_DIRECTIONS);
        assert_eq!(route.id, "119");
        assert_eq!(route.attributes.get("rtclr").map(String::as_str), Some("#0000ff"));
        assert!(!route.attributes.contains_key("id"));
        assert!(!route.attributes.contains_key("pas"));
    }

    #[test]
    fn test_two_directions_stay_independent() {
        let route = decode_one(TWO_DIRECTIONS);
        assert_eq!(route.paths.len(), 2);

        let (north, south) = (&route.paths[0], &route.paths[1]);
        assert_eq!(
            (north.id.as_str(), north.d.as_str(), north.dd.as_str()),
            ("1151", "New York", "NEW YORK")
        );
        assert_eq!(
            (south.id.as_str(), south.d.as_str(), south.dd.as_str()),
            ("1152", "Jersey City", "JERSEY CITY")
        );
        assert_eq!(north.stops.len(), 3);
        assert_eq!(south.stops.len(), 2);

        // the second path starts fresh: no distance carried over from the first
        assert_eq!(south.stops[0].index, 0);
        assert_eq!(south.stops[0].distance_to_prev_ft, None);
        assert!(south.stops.iter().all(|s| s.d == "Jersey City"));
    }

    #[test]
    fn test_indices_and_distances() {
        let route = decode_one(TWO_DIRECTIONS);
        let stops = &route.paths[0].stops;

        let indices: Vec<_> = stops.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(stops.iter().filter(|s| s.distance_to_prev_ft.is_some()).count(), 2);
        assert!(stops[0].distance_to_prev_ft.is_none());
    }

    #[test]
    fn test_shape_points_are_skipped() {
        let route = decode_one(TWO_DIRECTIONS);
        let stops = &route.paths[0].stops;

        assert!(stops.iter().all(|s| s.lat != 40.7361));
        // measured straight from stop 20496 to stop 20497
        let expected = distance_feet(40.7357, -74.0311, 40.7366, -74.0311);
        assert_eq!(stops[1].distance_to_prev_ft, Some(expected));
        assert_eq!(stops[1].id, "20497");
        assert_eq!(stops[1].name, "Central Ave at Bowers St");
    }

    #[test]
    fn test_stop_listing_matches_stops() {
        let route = decode_one(TWO_DIRECTIONS);
        let listing = route.paths[0].stop_listing();
        let ids: Vec<_> = listing.iter().map(|r| r.stop_id.as_str()).collect();
        assert_eq!(ids, vec!["20496", "20497", "3511"]);
        assert_eq!(listing[2].stop_name, "Port Authority Bus Terminal");
    }

    #[test]
    fn test_path_without_stops() {
        let route = decode_one(
            "<route><id>1</id><pas><pa><id>7</id><d>X</d><pt><lat>1</lat><lon>2</lon></pt></pa></pas></route>",
        );
        assert_eq!(route.paths.len(), 1);
        assert!(route.paths[0].stops.is_empty());
        assert!(route.paths[0].stop_listing().is_empty());
    }

    #[test]
    fn test_marker_without_fields_defaults_to_empty() {
        let route = decode_one(
            "<route><pas><pa><pt><lat>1.5</lat><lon>2.5</lon><bs/></pt></pa></pas></route>",
        );
        let stop = &route.paths[0].stops[0];
        assert_eq!(stop.id, "");
        assert_eq!(stop.name, "");
        assert_eq!((stop.lat, stop.lon), (1.5, 2.5));
        assert_eq!(route.id, "");
    }

    #[test]
    fn test_unknown_path_tags_become_attributes() {
        let route = decode_one("<route><pas><pa><id>1</id><ln>5120.3</ln></pa></pas></route>");
        let path = &route.paths[0];
        assert_eq!(path.attributes.get("ln").map(String::as_str), Some("5120.3"));
        assert!(!path.attributes.contains_key("id"));
    }

    #[test]
    fn test_missing_latitude_fails() {
        let result = decode_route_points(
            b"<route><pas><pa><pt><lon>2</lon><bs><id>9</id></bs></pt></pa></pas></route>",
        );
        assert!(matches!(
            result,
            Err(DecodeError::Coordinate { field: "lat", ref stop_id, .. }) if stop_id == "9"
        ));
    }

    #[test]
    fn test_non_numeric_longitude_fails() {
        let result = decode_route_points(
            b"<route><pas><pa><pt><lat>1</lat><lon>west</lon><bs/></pt></pa></pas></route>",
        );
        assert!(matches!(result, Err(DecodeError::Coordinate { field: "lon", .. })));
    }

    #[test]
    fn test_commented_coordinates_still_parse() {
        let route = decode_one(
            "<route><pas><pa><pt><lat><!-- moved 2019 -->40.5</lat><lon>-74.1</lon><bs><id>7</id></bs></pt></pa></pas></route>",
        );
        let stop = &route.paths[0].stops[0];
        assert_eq!((stop.lat, stop.lon), (40.5, -74.1));
    }

    #[test]
    fn test_paths_from_every_container_are_kept() {
        let route = decode_one(
            "<route><pas><pa><id>1</id></pa></pas><pas><pa><id>2</id></pa></pas></route>",
        );
        let ids: Vec<_> = route.paths.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[test]
    fn test_coordinates_on_shape_points_are_not_required() {
        let route = decode_one("<route><pas><pa><pt><lat>bad</lat></pt></pa></pas></route>");
        assert!(route.paths[0].stops.is_empty());
    }

    #[test]
    fn test_truncated_document_fails() {
        let truncated = &TWO_DIRECTIONS[..TWO_DIRECTIONS.len() / 2];
        assert!(matches!(
            decode_route_points(truncated.as_bytes()),
            Err(DecodeError::Xml(_))
        ));
    }

    #[test]
    fn test_validate_route_points() {
        assert!(validate_route_points(TWO_DIRECTIONS.as_bytes()).unwrap());
        assert!(!validate_route_points(b"<route><id>999</id><pas/></route>").unwrap());
        assert!(!validate_route_points(b"<route><id>999</id></route>").unwrap());
    }
}
