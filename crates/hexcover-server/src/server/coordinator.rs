use crate::server::{
    error::{Result, ServiceError},
    pool::{manager::WorkerPool, request::WorkRequest},
};
use hexcover::{ConversionOptions, Geometry, GeometryCells, IndexResponse};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Spreads a batch of geometries across the worker pool and reassembles the
/// results in input order.
///
/// Every geometry is dispatched before any reply is awaited, so workers make
/// progress while the coordinator waits on earlier geometries. Replies are
/// then consumed strictly in input order.
///
/// # Behavior
///
/// - The first failing geometry (in input order) aborts the batch: the batch
///   token is cancelled so queued geometries are skipped, and that geometry's
///   error is returned. No partial results are produced.
/// - Dispatch failures (shutdown, closed worker channel) abort the batch the
///   same way.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip_all, fields(geometries = geometries.len()))
)]
pub async fn convert_batch(
    geometries: Vec<Geometry>,
    worker_pool: &WorkerPool,
    options: ConversionOptions,
) -> Result<IndexResponse> {
    let batch = Arc::new(geometries);
    let cancelled = CancellationToken::new();
    let mut replies = Vec::with_capacity(batch.len());

    for index in 0..batch.len() {
        let (response, reply) = oneshot::channel();
        let request = WorkRequest::Convert {
            batch: Arc::clone(&batch),
            index,
            options,
            cancelled: cancelled.clone(),
            response,
        };
        if let Err(e) = worker_pool.send_to_next_worker(request).await {
            cancelled.cancel();
            return Err(e);
        }
        replies.push(reply);
    }

    let mut cells = Vec::with_capacity(replies.len());
    for (_index, reply) in replies.into_iter().enumerate() {
        match reply.await {
            Ok(Ok(h3_indices)) => cells.push(h3_indices),
            Ok(Err(e)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Geometry {_index} failed to convert: {e}");
                cancelled.cancel();
                return Err(e.into());
            }
            Err(_) => {
                cancelled.cancel();
                return Err(ServiceError::ChannelError {
                    context: format!("Worker dropped geometry {_index}"),
                });
            }
        }
    }

    let geometries = Arc::unwrap_or_clone(batch);
    let result = geometries
        .into_iter()
        .zip(cells)
        .map(|(geometry, h3_indices)| GeometryCells {
            geometry,
            h3_indices,
        })
        .collect();

    Ok(IndexResponse { result })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::time::Duration;
    use hexcover::{H3Indexer, UnknownKindPolicy, h3o::Resolution, index_batch};
    use serde_json::json;

    fn options(compact: bool) -> ConversionOptions {
        ConversionOptions {
            resolution: Resolution::Eight,
            compact,
            unknown_kinds: UnknownKindPolicy::Ignore,
        }
    }

    fn pool(num_workers: usize) -> WorkerPool {
        WorkerPool::spawn(
            Arc::new(H3Indexer::default()),
            num_workers,
            2,
            Duration::from_secs(1),
        )
    }

    fn mixed_batch() -> Vec<Geometry> {
        serde_json::from_value(json!([
            {"type": "Point", "coordinates": [8.54, 47.37]},
            {
                "type": "Polygon",
                "coordinates": [[[8.5, 47.3], [8.6, 47.3], [8.6, 47.4], [8.5, 47.4]]]
            },
            {"type": "Feature", "coordinates": null},
            {"type": "MultiPolygon", "coordinates": [
                [[[8.5, 47.3], [8.6, 47.3], [8.6, 47.4]]],
                [[[9.5, 46.3], [9.6, 46.3], [9.6, 46.4]]]
            ]},
            {"type": "Point", "coordinates": [-122.41, 37.77]}
        ]))
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn matches_sequential_orchestrator() {
        let pool = pool(3);
        for compact in [false, true] {
            let parallel = convert_batch(mixed_batch(), &pool, options(compact))
                .await
                .unwrap();
            let sequential =
                index_batch(&H3Indexer::default(), mixed_batch(), &options(compact)).unwrap();
            assert_eq!(parallel, sequential);
        }
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_result() {
        let response = convert_batch(Vec::new(), &pool(2), options(false))
            .await
            .unwrap();
        assert!(response.result.is_empty());
    }

    #[tokio::test]
    async fn first_failure_aborts_batch() {
        let geometries: Vec<Geometry> = serde_json::from_value(json!([
            {"type": "Point", "coordinates": [8.54, 47.37]},
            {"type": "MultiPolygon", "coordinates": {"not": "an array"}},
            {"type": "Polygon", "coordinates": [[[8.5, "x"]]]}
        ]))
        .unwrap();

        let err = convert_batch(geometries, &pool(2), options(false))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Conversion(hexcover::Error::MalformedMultiPolygon)
        ));
    }

    #[tokio::test]
    async fn fails_once_pool_is_shut_down() {
        let pool = pool(1);
        pool.shutdown().await.unwrap();
        let err = convert_batch(mixed_batch(), &pool, options(false))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ServiceShutdown));
    }
}
