//! # Hexagonal grid indexing
//!
//! The grid math itself lives in the [`h3o`] crate. This module defines the
//! narrow capability set the converter needs from it, [`CellIndexer`], and the
//! production implementation, [`H3Indexer`].

use crate::{Error, GeoLoop, GeoPolygon, LatLng, Result};
use h3o::{
    CellIndex, Resolution,
    geom::{ContainmentMode, TilerBuilder},
};

/// The indexing capabilities required by the dispatcher and compactor.
///
/// Implementations must be safe to share between worker tasks.
pub trait CellIndexer: Send + Sync {
    /// Returns the cell containing `point` at `resolution`.
    fn point_to_cell(&self, point: LatLng, resolution: Resolution) -> Result<CellIndex>;

    /// Returns the cells covering `polygon` at `resolution`, holes excluded.
    fn polygon_to_cells(&self, polygon: &GeoPolygon, resolution: Resolution)
    -> Result<Vec<CellIndex>>;

    /// Replaces complete groups of sibling cells with their parent,
    /// recursively.
    fn compact_cells(&self, cells: Vec<CellIndex>) -> Result<Vec<CellIndex>>;
}

/// Which cells a polygon is considered to cover.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Containment {
    /// Cells whose center lies inside the polygon.
    #[default]
    ContainsCentroid,
    /// Cells entirely inside the polygon.
    ContainsBoundary,
    /// Cells that touch the polygon at all.
    IntersectsBoundary,
    /// Like [`Containment::IntersectsBoundary`], but also covers polygons
    /// smaller than a single cell.
    Covers,
}

impl From<Containment> for ContainmentMode {
    fn from(value: Containment) -> Self {
        match value {
            Containment::ContainsCentroid => Self::ContainsCentroid,
            Containment::ContainsBoundary => Self::ContainsBoundary,
            Containment::IntersectsBoundary => Self::IntersectsBoundary,
            Containment::Covers => Self::Covers,
        }
    }
}

/// [`CellIndexer`] backed by `h3o`.
#[derive(Clone, Copy, Debug, Default)]
pub struct H3Indexer {
    containment: Containment,
}

impl H3Indexer {
    pub const fn new(containment: Containment) -> Self {
        Self { containment }
    }

    pub const fn containment(&self) -> Containment {
        self.containment
    }
}

impl CellIndexer for H3Indexer {
    fn point_to_cell(&self, point: LatLng, resolution: Resolution) -> Result<CellIndex> {
        let ll = h3o::LatLng::new(point.lat, point.lng).map_err(|e| Error::MalformedPoint {
            reason: e.to_string(),
        })?;
        Ok(ll.to_cell(resolution))
    }

    fn polygon_to_cells(
        &self,
        polygon: &GeoPolygon,
        resolution: Resolution,
    ) -> Result<Vec<CellIndex>> {
        let mut tiler = TilerBuilder::new(resolution)
            .containment_mode(self.containment.into())
            .build();
        tiler
            .add(to_geo(polygon))
            .map_err(|e| Error::InvalidGeometry {
                reason: e.to_string(),
            })?;
        Ok(tiler.into_coverage().collect())
    }

    fn compact_cells(&self, mut cells: Vec<CellIndex>) -> Result<Vec<CellIndex>> {
        // Compaction needs a duplicate-free set at a single resolution. Mixed
        // input (e.g. an already compacted set) is expanded to its finest
        // resolution first.
        if let Some(finest) = cells.iter().map(|cell| cell.resolution()).max() {
            if cells.iter().any(|cell| cell.resolution() != finest) {
                cells = cells
                    .into_iter()
                    .flat_map(|cell| cell.children(finest))
                    .collect();
            }
        }
        cells.sort_unstable();
        cells.dedup();

        CellIndex::compact(&mut cells).map_err(|e| Error::Compaction {
            reason: e.to_string(),
        })?;
        Ok(cells)
    }
}

fn to_geo(polygon: &GeoPolygon) -> geo::Polygon<f64> {
    geo::Polygon::new(
        to_line_string(&polygon.boundary),
        polygon.holes.iter().map(to_line_string).collect(),
    )
}

fn to_line_string(ring: &GeoLoop) -> geo::LineString<f64> {
    ring.iter()
        .map(|ll| geo::Coord {
            x: ll.lng,
            y: ll.lat,
        })
        .collect()
}

/// Serde helpers that write cells in their canonical hexadecimal string form.
///
/// ```ignore
/// #[serde(with = "hexcover::cell_strings")]
/// cells: Vec<CellIndex>,
/// ```
pub mod cell_strings {
    use h3o::CellIndex;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(cells: &[CellIndex], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(cells.iter().map(ToString::to_string))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<CellIndex>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|raw| raw.parse::<CellIndex>().map_err(de::Error::custom))
            .collect()
    }
}
