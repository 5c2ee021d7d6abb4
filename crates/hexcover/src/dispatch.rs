//! # Geometry dispatch
//!
//! Selects a conversion strategy from a geometry's declared kind:
//!
//! - `Point` - one cell, the one containing the position.
//! - `Polygon` - normalized into a [`GeoPolygon`](crate::GeoPolygon) and
//!   filled.
//! - `MultiPolygon` - each member block converted as an independent Polygon,
//!   results concatenated in member order. Cells shared by members appear once
//!   per member.
//! - anything else - governed by [`UnknownKindPolicy`].

use crate::{
    CellIndexer, Error, Geometry, GeometryKind, Result, point_from_position, polygon_from_rings,
};
use h3o::{CellIndex, Resolution};

/// What to do with geometry kinds that have no conversion strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownKindPolicy {
    /// Produce an empty cell set and carry on.
    #[default]
    Ignore,
    /// Fail with [`Error::UnsupportedGeometry`].
    Reject,
}

/// Converts one geometry into its cell set at `resolution`.
///
/// # Errors
///
/// Propagates normalization and indexing errors. A MultiPolygon whose
/// coordinates are not an array of polygon blocks fails with
/// [`Error::MalformedMultiPolygon`].
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "trace", skip_all, fields(kind = %geometry.kind))
)]
pub fn geometry_to_cells<I>(
    indexer: &I,
    geometry: &Geometry,
    resolution: Resolution,
    unknown: UnknownKindPolicy,
) -> Result<Vec<CellIndex>>
where
    I: CellIndexer + ?Sized,
{
    match &geometry.kind {
        GeometryKind::Point => {
            let point = point_from_position(&geometry.coordinates)?;
            Ok(vec![indexer.point_to_cell(point, resolution)?])
        }
        GeometryKind::Polygon => {
            let polygon = polygon_from_rings(&geometry.coordinates)?;
            indexer.polygon_to_cells(&polygon, resolution)
        }
        GeometryKind::MultiPolygon => {
            let members = geometry
                .coordinates
                .as_array()
                .ok_or(Error::MalformedMultiPolygon)?;

            let mut cells = Vec::new();
            for member in members {
                let polygon = polygon_from_rings(member)?;
                cells.extend(indexer.polygon_to_cells(&polygon, resolution)?);
            }
            Ok(cells)
        }
        GeometryKind::Other(kind) => match unknown {
            UnknownKindPolicy::Ignore => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Skipping geometry of unsupported type {kind:?}");
                Ok(Vec::new())
            }
            UnknownKindPolicy::Reject => Err(Error::UnsupportedGeometry { kind: kind.clone() }),
        },
    }
}
