//! # Geometry normalization
//!
//! Converts the loosely typed [`Coordinates`] tree of a GeoJSON geometry into
//! strongly typed latitude-first shapes. GeoJSON positions are
//! `[longitude, latitude]`; everything produced here is `(lat, lng)`.
//!
//! Shapes are validated structurally only. Whether holes lie inside the
//! boundary, or whether a loop has enough points to enclose an area, is left to
//! the indexing library.

use crate::{Coordinates, Error, Geometry, GeometryKind, Result};
use core::fmt;

/// A position in degrees, latitude first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Ordered boundary points, implicitly closed.
pub type GeoLoop = Vec<LatLng>;

/// An outer boundary plus zero or more holes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoPolygon {
    pub boundary: GeoLoop,
    pub holes: Vec<GeoLoop>,
}

#[derive(Clone, Copy)]
enum Ring {
    Outer,
    Hole,
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outer => f.write_str("outer ring"),
            Self::Hole => f.write_str("hole ring"),
        }
    }
}

/// Builds a [`GeoPolygon`] from a geometry whose kind must be `Polygon`.
///
/// # Errors
///
/// - [`Error::UnsupportedGeometry`] if the geometry is not a Polygon.
/// - [`Error::MalformedCoordinates`] if the rings are not nested correctly.
/// - [`Error::NonNumericCoordinate`] if a position holds non-numbers.
pub fn to_geo_polygon(geometry: &Geometry) -> Result<GeoPolygon> {
    if geometry.kind != GeometryKind::Polygon {
        return Err(Error::UnsupportedGeometry {
            kind: geometry.kind.to_string(),
        });
    }
    polygon_from_rings(&geometry.coordinates)
}

/// Builds a [`GeoPolygon`] from a Polygon's `coordinates` block: the first
/// ring is the boundary, every following ring is a hole, in order.
pub fn polygon_from_rings(coordinates: &Coordinates) -> Result<GeoPolygon> {
    let Some((outer, holes)) = coordinates
        .as_array()
        .and_then(<[Coordinates]>::split_first)
    else {
        return Err(Error::MalformedCoordinates {
            context: "expected a non-empty array of rings".to_owned(),
        });
    };

    let boundary = geo_loop(outer, Ring::Outer)?;
    let holes = holes
        .iter()
        .map(|ring| geo_loop(ring, Ring::Hole))
        .collect::<Result<Vec<_>>>()?;

    Ok(GeoPolygon { boundary, holes })
}

fn geo_loop(ring: &Coordinates, role: Ring) -> Result<GeoLoop> {
    let positions = ring
        .as_array()
        .ok_or_else(|| Error::MalformedCoordinates {
            context: format!("invalid {role} coords"),
        })?;

    positions
        .iter()
        .map(|position| match position.as_array() {
            Some([lng, lat]) => match (lng.as_f64(), lat.as_f64()) {
                (Some(lng), Some(lat)) => Ok(LatLng { lat, lng }),
                _ => Err(Error::NonNumericCoordinate),
            },
            _ => Err(Error::MalformedCoordinates {
                context: format!("invalid point in {role}"),
            }),
        })
        .collect()
}

/// Reads a Point's `[lng, lat]` position.
///
/// A trailing altitude is tolerated, as GeoJSON allows it.
pub fn point_from_position(coordinates: &Coordinates) -> Result<LatLng> {
    let position = coordinates
        .as_array()
        .ok_or_else(|| Error::MalformedPoint {
            reason: "expected a [lng, lat] array".to_owned(),
        })?;

    match position {
        [lng, lat, ..] => match (lng.as_f64(), lat.as_f64()) {
            (Some(lng), Some(lat)) => Ok(LatLng { lat, lng }),
            _ => Err(Error::MalformedPoint {
                reason: "longitude and latitude must be numbers".to_owned(),
            }),
        },
        _ => Err(Error::MalformedPoint {
            reason: format!("expected 2 values, got {}", position.len()),
        }),
    }
}
