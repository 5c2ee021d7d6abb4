use crate::{CellIndexer, Result};
use h3o::CellIndex;

/// Compacts one geometry's cell set.
///
/// Empty sets are returned as-is: there is nothing to compact, which is worth
/// a warning but not an error.
pub fn compact<I>(indexer: &I, cells: Vec<CellIndex>) -> Result<Vec<CellIndex>>
where
    I: CellIndexer + ?Sized,
{
    if cells.is_empty() {
        #[cfg(feature = "tracing")]
        tracing::warn!("No h3 indices to compact");
        return Ok(cells);
    }
    indexer.compact_cells(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeoPolygon, H3Indexer, LatLng};
    use h3o::Resolution;

    #[test]
    fn empty_sets_are_skipped() {
        assert_eq!(compact(&H3Indexer::default(), Vec::new()), Ok(Vec::new()));
    }

    #[test]
    fn compacted_set_is_never_larger() {
        let indexer = H3Indexer::default();
        let polygon = GeoPolygon {
            boundary: vec![
                LatLng::new(47.3, 8.5),
                LatLng::new(47.3, 8.6),
                LatLng::new(47.4, 8.6),
                LatLng::new(47.4, 8.5),
            ],
            holes: vec![],
        };
        let cells = indexer.polygon_to_cells(&polygon, Resolution::Nine).unwrap();
        let compacted = compact(&indexer, cells.clone()).unwrap();
        assert!(!compacted.is_empty());
        assert!(compacted.len() <= cells.len());
        assert!(
            compacted
                .iter()
                .all(|cell| cell.resolution() <= Resolution::Nine)
        );
    }
}
