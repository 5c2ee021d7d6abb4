//! # Batch orchestration
//!
//! Request and response contracts for converting a batch of geometries, and
//! the sequential orchestrator that ties dispatch and compaction together.
//!
//! The orchestrator is all-or-nothing: the first geometry that fails to
//! convert aborts the batch, and no partial results are returned.

use crate::{CellIndexer, Error, Geometry, Result, UnknownKindPolicy, compact, geometry_to_cells};
use h3o::{CellIndex, Resolution};
use serde::{Deserialize, Deserializer, Serialize};

/// A batch conversion request as received on the wire.
///
/// Absent and `null` fields both take their empty value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub geometries: Vec<Geometry>,
    /// Target resolution. Absent and `0` are both treated as "not provided".
    #[serde(default)]
    pub resolution: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub compact: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> core::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// The cells produced for one input geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryCells {
    /// The input geometry, echoed back unchanged.
    pub geometry: Geometry,
    #[serde(with = "crate::cell_strings")]
    pub h3_indices: Vec<CellIndex>,
}

/// One [`GeometryCells`] per input geometry, in input order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexResponse {
    pub result: Vec<GeometryCells>,
}

/// Validated settings that apply to every geometry of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConversionOptions {
    pub resolution: Resolution,
    pub compact: bool,
    pub unknown_kinds: UnknownKindPolicy,
}

impl ConversionOptions {
    /// Validates the request-level settings of `request`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingResolution`] if the resolution is absent or `0`.
    /// - [`Error::InvalidResolution`] if it is outside the grid's range.
    pub fn from_request(request: &IndexRequest, unknown_kinds: UnknownKindPolicy) -> Result<Self> {
        Ok(Self {
            resolution: validate_resolution(request.resolution)?,
            compact: request.compact,
            unknown_kinds,
        })
    }
}

/// Turns a raw resolution into a grid [`Resolution`].
///
/// `0` is the grid's coarsest level, but on the wire it cannot be told apart
/// from an omitted field, so it is rejected as missing.
pub fn validate_resolution(raw: Option<i64>) -> Result<Resolution> {
    match raw {
        None | Some(0) => Err(Error::MissingResolution),
        Some(value) => u8::try_from(value)
            .ok()
            .and_then(|res| Resolution::try_from(res).ok())
            .ok_or(Error::InvalidResolution { value }),
    }
}

/// Converts a single geometry, compacting the result if requested.
pub fn convert_geometry<I>(
    indexer: &I,
    geometry: &Geometry,
    options: &ConversionOptions,
) -> Result<Vec<CellIndex>>
where
    I: CellIndexer + ?Sized,
{
    let cells = geometry_to_cells(indexer, geometry, options.resolution, options.unknown_kinds)?;
    if options.compact {
        compact(indexer, cells)
    } else {
        Ok(cells)
    }
}

/// Converts every geometry in input order, then compacts each result if
/// requested.
///
/// # Errors
///
/// Returns the first conversion or compaction error; earlier successful
/// conversions are discarded.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip_all, fields(geometries = geometries.len()))
)]
pub fn index_batch<I>(
    indexer: &I,
    geometries: Vec<Geometry>,
    options: &ConversionOptions,
) -> Result<IndexResponse>
where
    I: CellIndexer + ?Sized,
{
    let mut result = Vec::with_capacity(geometries.len());
    for geometry in geometries {
        let h3_indices =
            geometry_to_cells(indexer, &geometry, options.resolution, options.unknown_kinds)?;
        result.push(GeometryCells {
            geometry,
            h3_indices,
        });
    }

    if options.compact {
        for entry in &mut result {
            let cells = core::mem::take(&mut entry.h3_indices);
            entry.h3_indices = compact(indexer, cells)?;
        }
    }

    Ok(IndexResponse { result })
}
