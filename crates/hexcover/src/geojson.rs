//! # GeoJSON geometry wire types
//!
//! Geometries arrive as loosely typed JSON: a `type` string and a
//! `coordinates` tree whose nesting depends on that string. This module keeps
//! both as close to the wire as possible so that a geometry can be echoed back
//! unchanged, and leaves all shape validation to the normalizer.
//!
//! - [`GeometryKind`] - the declared geometry type (an open set on the wire)
//! - [`Coordinates`] - tagged-union coordinate tree

use serde::{Deserialize, Serialize};

/// A single GeoJSON geometry object.
///
/// Missing fields decode to their empty values: an empty kind (which is never
/// a recognized kind) and a `null` coordinate tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default)]
    pub kind: GeometryKind,
    #[serde(default)]
    pub coordinates: Coordinates,
}

impl Geometry {
    pub fn new(kind: GeometryKind, coordinates: Coordinates) -> Self {
        Self { kind, coordinates }
    }
}

/// The declared `type` of a [`Geometry`].
///
/// Kinds without a conversion strategy are kept verbatim in
/// [`GeometryKind::Other`] so they serialize back exactly as received.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GeometryKind {
    Point,
    Polygon,
    MultiPolygon,
    Other(String),
}

impl GeometryKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Point => "Point",
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
            Self::Other(kind) => kind,
        }
    }
}

impl Default for GeometryKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for GeometryKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "Point" => Self::Point,
            "Polygon" => Self::Polygon,
            "MultiPolygon" => Self::MultiPolygon,
            _ => Self::Other(kind),
        }
    }
}

impl From<GeometryKind> for String {
    fn from(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::Other(kind) => kind,
            known => known.as_str().to_owned(),
        }
    }
}

impl core::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A GeoJSON coordinate tree.
///
/// Numbers and arrays are decoded structurally; anything else (strings,
/// objects, booleans, `null`) lands in [`Coordinates::Other`] so decoding never
/// fails on shape alone. Numbers keep their JSON representation, so `8` is
/// written back as `8` and not `8.0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinates {
    Number(serde_json::Number),
    Array(Vec<Coordinates>),
    Other(serde_json::Value),
}

impl Coordinates {
    pub fn as_array(&self) -> Option<&[Coordinates]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => value.as_f64(),
            _ => None,
        }
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::Other(serde_json::Value::Null)
    }
}

/// Non-finite values have no JSON representation and become `null`.
impl From<f64> for Coordinates {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value).map_or_else(Self::default, Self::Number)
    }
}

impl From<i64> for Coordinates {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl<T: Into<Coordinates>> From<Vec<T>> for Coordinates {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_known_and_unknown_kinds() {
        let point: Geometry =
            serde_json::from_value(json!({"type": "Point", "coordinates": [8.54, 47.37]})).unwrap();
        assert_eq!(point.kind, GeometryKind::Point);
        assert_eq!(point.coordinates, Coordinates::from(vec![8.54, 47.37]));

        let line: Geometry =
            serde_json::from_value(json!({"type": "LineString", "coordinates": [[0, 0], [1, 1]]}))
                .unwrap();
        assert_eq!(line.kind, GeometryKind::Other("LineString".into()));
    }

    #[test]
    fn missing_fields_decode_to_empty_values() {
        let geometry: Geometry = serde_json::from_value(json!({})).unwrap();
        assert_eq!(geometry.kind, GeometryKind::Other(String::new()));
        assert_eq!(geometry.coordinates, Coordinates::Other(serde_json::Value::Null));
    }

    #[test]
    fn integer_coordinates_decode_as_numbers() {
        let coords: Coordinates = serde_json::from_value(json!([8, 47])).unwrap();
        assert_eq!(coords.as_array().unwrap()[0].as_f64(), Some(8.0));
    }

    #[test]
    fn non_numeric_leaves_are_kept_not_rejected() {
        let coords: Coordinates = serde_json::from_value(json!([["a", 1.0], null])).unwrap();
        let items = coords.as_array().unwrap();
        let pair = items[0].as_array().unwrap();
        assert_eq!(pair[0], Coordinates::Other(json!("a")));
        assert_eq!(pair[1].as_f64(), Some(1.0));
        assert_eq!(items[1], Coordinates::Other(serde_json::Value::Null));
    }

    #[test]
    fn geometry_echoes_back_unchanged() {
        let raw = json!({"type": "Hexagon", "coordinates": [[1.5, 2.5], {"x": 1}]});
        let geometry: Geometry = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&geometry).unwrap(), raw);
    }

    #[test]
    fn integer_coordinates_echo_as_integers() {
        let raw = r#"{"type":"Point","coordinates":[8,47]}"#;
        let geometry: Geometry = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&geometry).unwrap(), raw);

        let raw = json!({
            "type": "Polygon",
            "coordinates": [[[8, 47], [9.5, 47], [9_007_199_254_740_993_u64, -3]]]
        });
        let geometry: Geometry = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&geometry).unwrap(), raw);
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(Coordinates::from(f64::NAN), Coordinates::default());
        assert_eq!(Coordinates::from(8_i64).as_f64(), Some(8.0));
    }
}
