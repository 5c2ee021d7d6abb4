//! Error types for the indexing service.
//!
//! [`ServiceError`] wraps conversion failures from [`hexcover::Error`] together
//! with the failures that only exist once requests travel through a worker
//! pool. It implements [`IntoResponse`] so handlers can return it directly;
//! every error is reported as a short plain-text message.
//!
//! ## Status codes
//! - `400`: malformed JSON, missing/invalid resolution, oversized batches,
//!   structurally invalid MultiPolygon or Point coordinates.
//! - `500`: Polygon conversion failures, internal channel failures and
//!   panicked conversion tasks.
//! - `503`: requests arriving while the service shuts down.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub type Result<T> = core::result::Result<T, ServiceError>;

#[derive(Clone, Debug, thiserror::Error)]
pub enum ServiceError {
    /// The body could not be decoded into a request.
    #[error("Invalid JSON format")]
    InvalidJson,

    /// The request was well-formed but exceeds a configured limit.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Converting one of the geometries failed.
    #[error(transparent)]
    Conversion(#[from] hexcover::Error),

    /// Internal channel send/receive failure between tasks.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// A blocking conversion task panicked or was aborted.
    #[error("Conversion task failed: {context}")]
    TaskFailed { context: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,
}

impl ServiceError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson | Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Conversion(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Conversion(_) | Self::ChannelError { .. } | Self::TaskFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::ServiceShutdown => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_conversion_errors_by_origin() {
        assert_eq!(
            ServiceError::from(hexcover::Error::MissingResolution).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::from(hexcover::Error::MalformedMultiPolygon).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::from(hexcover::Error::NonNumericCoordinate).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::ServiceShutdown.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn conversion_messages_pass_through() {
        let err = ServiceError::from(hexcover::Error::MissingResolution);
        assert_eq!(err.to_string(), "No resolution provided");
    }
}
