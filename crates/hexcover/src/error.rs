//! Error types for geometry-to-cell conversion.
//!
//! Every failure that can occur while turning a batch of GeoJSON geometries
//! into cell sets is a variant of [`Error`]. A single error aborts the whole
//! batch; callers use [`Error::is_client_error`] to decide whether the caller
//! sent something unusable or the conversion itself broke down.

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Unified error type for batch conversion.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The request carried no resolution. A resolution of `0` is reported the
    /// same way because it cannot be told apart from an absent field.
    #[error("No resolution provided")]
    MissingResolution,

    /// The resolution is outside the range supported by the grid.
    #[error("Invalid resolution {value}: must be between 1 and 15")]
    InvalidResolution { value: i64 },

    /// A geometry kind the converter has no strategy for.
    #[error("unsupported GeoJSON type: {kind}")]
    UnsupportedGeometry { kind: String },

    /// Polygon coordinates are not nested as `[ring, ...]` of `[lng, lat]`
    /// pairs.
    #[error("invalid GeoJSON coordinates: {context}")]
    MalformedCoordinates { context: String },

    /// A ring position holds something other than two numbers.
    #[error("invalid point coords")]
    NonNumericCoordinate,

    /// MultiPolygon coordinates are not an array of polygon blocks.
    #[error("Invalid MultiPolygon coordinates format")]
    MalformedMultiPolygon,

    /// Point coordinates are not a `[lng, lat]` position.
    #[error("Invalid Point coordinates: {reason}")]
    MalformedPoint { reason: String },

    /// The indexing library refused the polygon.
    #[error("Error while creating geopolygon: {reason}")]
    InvalidGeometry { reason: String },

    /// The indexing library failed to compact a cell set.
    #[error("Error while compacting cells: {reason}")]
    Compaction { reason: String },
}

impl Error {
    /// Returns `true` when the error was caused by request content the caller
    /// must fix, `false` when the conversion failed internally.
    ///
    /// Polygon normalization failures count as conversion failures, while a
    /// MultiPolygon whose outer structure is wrong is rejected as bad input.
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::MissingResolution
            | Self::InvalidResolution { .. }
            | Self::UnsupportedGeometry { .. }
            | Self::MalformedMultiPolygon
            | Self::MalformedPoint { .. } => true,
            Self::MalformedCoordinates { .. }
            | Self::NonNumericCoordinate
            | Self::InvalidGeometry { .. }
            | Self::Compaction { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_input_and_conversion_failures() {
        assert!(Error::MissingResolution.is_client_error());
        assert!(Error::InvalidResolution { value: 16 }.is_client_error());
        assert!(Error::MalformedMultiPolygon.is_client_error());
        assert!(
            Error::MalformedPoint {
                reason: "x".into()
            }
            .is_client_error()
        );

        assert!(!Error::NonNumericCoordinate.is_client_error());
        assert!(
            !Error::MalformedCoordinates {
                context: "invalid outer ring coords".into()
            }
            .is_client_error()
        );
        assert!(
            !Error::InvalidGeometry {
                reason: "x".into()
            }
            .is_client_error()
        );
    }

    #[test]
    fn messages_are_short_and_readable() {
        assert_eq!(Error::MissingResolution.to_string(), "No resolution provided");
        assert_eq!(
            Error::UnsupportedGeometry {
                kind: "LineString".into()
            }
            .to_string(),
            "unsupported GeoJSON type: LineString"
        );
    }
}
