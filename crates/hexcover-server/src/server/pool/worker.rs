use super::request::WorkRequest;
use hexcover::{CellIndexer, convert_geometry};
use std::sync::Arc;
use tokio::{sync::mpsc, task};

/// Worker task responsible for processing [`WorkRequest`] messages.
///
/// The worker listens on its own MPSC channel and converts one geometry at a
/// time until a shutdown signal is received or the channel closes. Conversion
/// itself runs on Tokio's blocking thread pool so that polygon fills never
/// stall the async runtime threads.
///
/// # Arguments
///
/// - `_worker_id`: Unique numeric identifier for this worker (used for
///   logs/tracing).
/// - `rx`: Receiver through which [`WorkRequest`]s are received.
/// - `indexer`: The indexing backend shared by all workers.
#[allow(clippy::used_underscore_binding)]
pub async fn worker_loop<I>(
    _worker_id: usize,
    mut rx: mpsc::Receiver<WorkRequest>,
    indexer: Arc<I>,
)
where
    I: CellIndexer + ?Sized + 'static,
{
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started");

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Convert {
                batch,
                index,
                options,
                cancelled,
                response,
            } => {
                if cancelled.is_cancelled() || response.is_closed() {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(
                        "Worker {_worker_id} skipping geometry {index} of cancelled batch"
                    );
                    continue;
                }

                let indexer = Arc::clone(&indexer);
                // The batch is released before replying so the coordinator can
                // reclaim it without copying.
                let conversion = task::spawn_blocking(move || {
                    convert_geometry(indexer.as_ref(), &batch[index], &options)
                });

                let cells = match conversion.await {
                    Ok(cells) => cells,
                    Err(_e) => {
                        #[cfg(feature = "tracing")]
                        tracing::error!("Worker {_worker_id} lost geometry {index}: {_e}");
                        // Dropping `response` reports the failure to the coordinator.
                        continue;
                    }
                };

                if response.send(cells).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Worker {_worker_id} failed to deliver geometry {index}");
                }
            }
            WorkRequest::Shutdown { response } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {_worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {_worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} stopped");
}
