//! Request service for batch geometry indexing.
//!
//! This module defines [`IndexService`], the transport-independent entry point
//! of the server. It validates incoming [`IndexRequest`]s, decides between
//! inline and pooled conversion, and records request telemetry.
//!
//! ## Responsibilities
//!
//! - Spawn and own the background worker pool.
//! - Validate resolution and batch size before any conversion work.
//! - Convert small batches inline and fan larger batches out via
//!   [`convert_batch`].
//! - Track in-flight requests and coordinate graceful shutdown.

use crate::server::{
    config::ServerConfig,
    coordinator::convert_batch,
    error::{Result, ServiceError},
    pool::manager::WorkerPool,
    telemetry::{
        decrement_requests_inflight, increment_cells_generated, increment_request_errors,
        increment_requests, increment_requests_inflight, record_geometries_per_request,
        record_request_duration,
    },
};
use hexcover::{
    CellIndexer, ConversionOptions, H3Indexer, IndexRequest, IndexResponse, index_batch,
};
use portable_atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task;

/// Converts batches of GeoJSON geometries into H3 cell sets.
///
/// Cloning is cheap; all clones share the same worker pool.
#[derive(Clone)]
pub struct IndexService {
    config: ServerConfig,
    indexer: Arc<dyn CellIndexer>,
    worker_pool: Arc<WorkerPool>,
    inflight: Arc<AtomicUsize>,
}

impl IndexService {
    /// Creates a new `IndexService` and spawns its pool of background worker
    /// tasks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: ServerConfig) -> Self {
        let indexer = Arc::new(H3Indexer::new(config.containment));
        Self::with_indexer(config, indexer)
    }

    /// Creates an `IndexService` backed by a custom indexing backend.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_indexer(config: ServerConfig, indexer: Arc<dyn CellIndexer>) -> Self {
        let worker_pool = WorkerPool::spawn(
            Arc::clone(&indexer),
            config.num_workers,
            config.worker_queue_depth,
            config.shutdown_timeout,
        );

        Self {
            config,
            indexer,
            worker_pool: Arc::new(worker_pool),
            inflight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns `true` while the service accepts requests.
    pub fn is_serving(&self) -> bool {
        !self.worker_pool.is_shutting_down()
    }

    /// Number of requests currently being converted.
    pub fn requests_inflight(&self) -> usize {
        self.inflight.load(Ordering::Acquire)
    }

    /// Handles one batch request.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::ServiceShutdown`] once shutdown has begun.
    /// - [`ServiceError::InvalidRequest`] if the batch exceeds
    ///   `max_geometries`.
    /// - [`ServiceError::Conversion`] for resolution errors and the first
    ///   geometry that fails to convert.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            skip_all,
            fields(
                geometries = request.geometries.len(),
                resolution = ?request.resolution,
                compact = request.compact
            )
        )
    )]
    pub async fn create_index(&self, request: IndexRequest) -> Result<IndexResponse> {
        let start = std::time::Instant::now();

        if !self.is_serving() {
            increment_request_errors();
            return Err(ServiceError::ServiceShutdown);
        }

        let options = match self.validate(&request) {
            Ok(options) => options,
            Err(e) => {
                increment_request_errors();
                #[cfg(feature = "tracing")]
                tracing::error!("Rejected request: {e}");
                return Err(e);
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Creating h3 cells for {} geometries with resolution {}. Compacting: {}",
            request.geometries.len(),
            options.resolution,
            options.compact
        );

        increment_requests();
        record_geometries_per_request(request.geometries.len() as f64);
        self.inflight.fetch_add(1, Ordering::AcqRel);
        increment_requests_inflight();

        let result = if request.geometries.len() < self.config.min_parallel_batch {
            let indexer = Arc::clone(&self.indexer);
            let geometries = request.geometries;
            task::spawn_blocking(move || index_batch(indexer.as_ref(), geometries, &options))
                .await
                .map_err(|e| ServiceError::TaskFailed {
                    context: e.to_string(),
                })
                .and_then(|response| response.map_err(Into::into))
        } else {
            convert_batch(request.geometries, &self.worker_pool, options).await
        };

        self.inflight.fetch_sub(1, Ordering::AcqRel);
        decrement_requests_inflight();

        match &result {
            Ok(response) => {
                let cells: usize = response.result.iter().map(|r| r.h3_indices.len()).sum();
                increment_cells_generated(cells as u64);
                record_request_duration(start.elapsed().as_secs_f64() * 1000.0);
            }
            Err(_e) => {
                increment_request_errors();
                #[cfg(feature = "tracing")]
                tracing::error!("Error while creating h3 cells: {_e}");
            }
        }

        result
    }

    fn validate(&self, request: &IndexRequest) -> Result<ConversionOptions> {
        let options = ConversionOptions::from_request(request, self.config.unknown_kinds)?;

        if request.geometries.len() > self.config.max_geometries {
            return Err(ServiceError::InvalidRequest {
                reason: format!(
                    "{} geometries exceed the maximum allowed ({})",
                    request.geometries.len(),
                    self.config.max_geometries
                ),
            });
        }

        Ok(options)
    }

    /// Initiates a graceful shutdown of the worker pool.
    ///
    /// New requests are refused immediately; the call returns once every
    /// worker has acknowledged (or timed out).
    pub async fn shutdown(&self) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Shutting down worker pool ({} requests in flight)",
            self.requests_inflight()
        );
        self.worker_pool.shutdown().await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use core::time::Duration;
    use hexcover::{
        Containment, GeoPolygon, Geometry, LatLng, UnknownKindPolicy,
        h3o::{CellIndex, Resolution},
    };
    use serde_json::json;

    /// Indexer that spends `delay` of wall-clock time on every lookup, standing
    /// in for a large polygon fill.
    pub(crate) struct SlowIndexer {
        delay: Duration,
        inner: H3Indexer,
    }

    impl SlowIndexer {
        pub(crate) fn new(delay: Duration) -> Self {
            Self {
                delay,
                inner: H3Indexer::default(),
            }
        }
    }

    impl CellIndexer for SlowIndexer {
        fn point_to_cell(
            &self,
            point: LatLng,
            resolution: Resolution,
        ) -> hexcover::Result<CellIndex> {
            std::thread::sleep(self.delay);
            self.inner.point_to_cell(point, resolution)
        }

        fn polygon_to_cells(
            &self,
            polygon: &GeoPolygon,
            resolution: Resolution,
        ) -> hexcover::Result<Vec<CellIndex>> {
            std::thread::sleep(self.delay);
            self.inner.polygon_to_cells(polygon, resolution)
        }

        fn compact_cells(&self, cells: Vec<CellIndex>) -> hexcover::Result<Vec<CellIndex>> {
            self.inner.compact_cells(cells)
        }
    }

    pub(crate) fn test_config() -> ServerConfig {
        ServerConfig {
            server_addr: "127.0.0.1:0".to_owned(),
            num_workers: 2,
            worker_queue_depth: 4,
            min_parallel_batch: 2,
            max_geometries: 10,
            max_body_bytes: 1024 * 1024,
            unknown_kinds: UnknownKindPolicy::Ignore,
            containment: Containment::ContainsCentroid,
            shutdown_timeout: Duration::from_secs(1),
        }
    }

    fn request(raw: serde_json::Value) -> IndexRequest {
        serde_json::from_value(raw).unwrap()
    }

    fn points(n: usize) -> Vec<Geometry> {
        (0..n)
            .map(|i| {
                serde_json::from_value(json!({
                    "type": "Point",
                    "coordinates": [8.5 + i as f64 * 0.01, 47.3]
                }))
                .unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn inline_and_pooled_paths_agree() {
        let service = IndexService::new(test_config());
        let single = service
            .create_index(IndexRequest {
                geometries: points(1),
                resolution: Some(9),
                compact: false,
            })
            .await
            .unwrap();
        let pooled = service
            .create_index(IndexRequest {
                geometries: points(5),
                resolution: Some(9),
                compact: false,
            })
            .await
            .unwrap();

        assert_eq!(single.result.len(), 1);
        assert_eq!(pooled.result.len(), 5);
        assert_eq!(single.result[0], pooled.result[0]);
        assert_eq!(service.requests_inflight(), 0);
    }

    #[tokio::test]
    async fn inline_conversion_leaves_the_runtime_free() {
        let service = IndexService::with_indexer(
            test_config(),
            Arc::new(SlowIndexer::new(Duration::from_millis(300))),
        );
        let converting = tokio::spawn({
            let service = service.clone();
            async move {
                service
                    .create_index(IndexRequest {
                        geometries: points(1),
                        resolution: Some(9),
                        compact: false,
                    })
                    .await
            }
        });

        // On the single-threaded test runtime this timer only fires on time if
        // the conversion is not running on the runtime thread.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!converting.is_finished());
        assert_eq!(service.requests_inflight(), 1);

        let response = converting.await.unwrap().unwrap();
        assert_eq!(response.result[0].h3_indices.len(), 1);
    }

    #[tokio::test]
    async fn rejects_missing_resolution_before_converting() {
        let service = IndexService::new(test_config());
        let err = service
            .create_index(request(json!({
                "geometries": [{"type": "Polygon", "coordinates": "bad"}]
            })))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Conversion(hexcover::Error::MissingResolution)
        ));
    }

    #[tokio::test]
    async fn rejects_oversized_batches() {
        let service = IndexService::new(test_config());
        let err = service
            .create_index(IndexRequest {
                geometries: points(11),
                resolution: Some(9),
                compact: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn strict_mode_rejects_unknown_kinds() {
        let mut config = test_config();
        config.unknown_kinds = UnknownKindPolicy::Reject;
        let service = IndexService::new(config);
        let err = service
            .create_index(request(json!({
                "geometries": [{"type": "LineString", "coordinates": [[0, 0], [1, 1]]}],
                "resolution": 9
            })))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Conversion(hexcover::Error::UnsupportedGeometry { .. })
        ));
    }

    #[tokio::test]
    async fn refuses_requests_after_shutdown() {
        let service = IndexService::new(test_config());
        service.shutdown().await.unwrap();
        assert!(!service.is_serving());

        let err = service
            .create_index(IndexRequest {
                geometries: points(1),
                resolution: Some(9),
                compact: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ServiceShutdown));
    }
}
