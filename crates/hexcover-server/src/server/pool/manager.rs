//! Asynchronous worker pool for parallel geometry conversion.
//!
//! This module defines the [`WorkerPool`] struct, which manages a set of
//! asynchronous workers responsible for processing [`WorkRequest`]s. It
//! distributes work using round-robin scheduling and supports coordinated
//! shutdown via a shared [`CancellationToken`].
//!
//! Each worker listens on its own bounded [`mpsc::Receiver`] and executes tasks
//! independently. This model allows parallelism without contention or locking.

use super::{request::WorkRequest, worker::worker_loop};
use crate::server::error::{Result, ServiceError};
use core::time::Duration;
use hexcover::CellIndexer;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};
use tokio_util::sync::CancellationToken;

/// A cooperative pool of asynchronous workers that process [`WorkRequest`]s.
///
/// Workers receive requests over bounded MPSC channels. Work is distributed in
/// round-robin fashion and the pool supports graceful, cancellable shutdown.
pub struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    next_worker: AtomicUsize,
    shutdown_token: CancellationToken,
    shutdown_timeout: Duration,
}

impl WorkerPool {
    /// Constructs a new [`WorkerPool`] from initialized worker channels and a
    /// shared cancellation token.
    pub const fn new(
        workers: Vec<mpsc::Sender<WorkRequest>>,
        shutdown_token: CancellationToken,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            workers,
            next_worker: AtomicUsize::new(0),
            shutdown_token,
            shutdown_timeout,
        }
    }

    /// Spawns `num_workers` worker tasks sharing `indexer`, each with a queue
    /// of `queue_depth` pending requests.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<I>(
        indexer: Arc<I>,
        num_workers: usize,
        queue_depth: usize,
        shutdown_timeout: Duration,
    ) -> Self
    where
        I: CellIndexer + ?Sized + 'static,
    {
        let mut workers = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            let (tx, rx) = mpsc::channel(queue_depth);
            workers.push(tx);
            tokio::spawn(worker_loop(worker_id, rx, Arc::clone(&indexer)));
        }
        Self::new(workers, CancellationToken::new(), shutdown_timeout)
    }

    /// Returns the number of workers in the pool.
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Returns `true` once [`WorkerPool::shutdown`] has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// Returns the index of the next worker to receive work (round-robin).
    ///
    /// Uses a relaxed atomic increment to minimize contention.
    pub fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    /// Sends a [`WorkRequest`] to the next worker in the pool, waiting for
    /// queue capacity if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The service is shutting down (`shutdown_token` was cancelled).
    /// - The worker's channel is closed.
    pub async fn send_to_next_worker(&self, request: WorkRequest) -> Result<()> {
        if self.shutdown_token.is_cancelled() {
            return Err(ServiceError::ServiceShutdown);
        }

        let worker_idx = self.next_worker_index();
        let worker = &self.workers[worker_idx];

        match worker.send(request).await {
            Ok(()) => Ok(()),
            Err(_) => Err(ServiceError::ChannelError {
                context: format!("Worker {worker_idx} channel closed"),
            }),
        }
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// - Cancels the shared [`CancellationToken`] to refuse new work.
    /// - Sends a [`WorkRequest::Shutdown`] to each worker.
    /// - Waits (up to `shutdown_timeout` per worker) for acknowledgements.
    pub async fn shutdown(&self) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new work");
        self.shutdown_token.cancel();

        #[cfg(feature = "tracing")]
        tracing::debug!("Notifying all workers to shut down");
        let mut shutdown_handles = Vec::with_capacity(self.workers.len());

        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            if let Err(_e) = worker.send(WorkRequest::Shutdown { response: tx }).await {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to send shutdown to worker {i}: {_e}");
            } else {
                shutdown_handles.push((i, rx));
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Waiting for up to {:?} per worker for shutdown acknowledgements",
            self.shutdown_timeout
        );

        let wait = self.shutdown_timeout;
        let timeout_futures = shutdown_handles.into_iter().map(|(_i, rx)| async move {
            match timeout(wait, rx).await {
                Ok(Ok(())) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("Worker {_i} shutdown acknowledged");
                }
                Ok(Err(_e)) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {_i} returned error: {_e}");
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Worker {_i} shutdown timed out");
                }
            }
        });

        futures::future::join_all(timeout_futures).await;

        #[cfg(feature = "tracing")]
        tracing::info!("Worker pool shutdown complete");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexcover::{
        ConversionOptions, Coordinates, Geometry, GeometryKind, H3Indexer, UnknownKindPolicy,
        h3o::Resolution,
    };

    fn options() -> ConversionOptions {
        ConversionOptions {
            resolution: Resolution::Nine,
            compact: false,
            unknown_kinds: UnknownKindPolicy::Ignore,
        }
    }

    fn point_batch() -> Arc<Vec<Geometry>> {
        Arc::new(vec![Geometry::new(
            GeometryKind::Point,
            Coordinates::from(vec![8.54, 47.37]),
        )])
    }

    #[tokio::test]
    async fn round_robins_across_workers() {
        let pool = WorkerPool::spawn(
            Arc::new(H3Indexer::default()),
            3,
            1,
            Duration::from_secs(1),
        );
        assert_eq!(pool.num_workers(), 3);
        let picked: Vec<_> = (0..6).map(|_| pool.next_worker_index()).collect();
        assert_eq!(picked, vec![0, 1, 2, 0, 1, 2]);
    }

    #[tokio::test]
    async fn converts_and_replies() {
        let pool = WorkerPool::spawn(
            Arc::new(H3Indexer::default()),
            2,
            4,
            Duration::from_secs(1),
        );
        let (tx, rx) = oneshot::channel();
        pool.send_to_next_worker(WorkRequest::Convert {
            batch: point_batch(),
            index: 0,
            options: options(),
            cancelled: CancellationToken::new(),
            response: tx,
        })
        .await
        .unwrap();

        let cells = rx.await.unwrap().unwrap();
        assert_eq!(cells.len(), 1);
    }

    #[tokio::test]
    async fn workers_convert_off_the_runtime_threads() {
        use crate::server::service::tests::SlowIndexer;

        let pool = WorkerPool::spawn(
            Arc::new(SlowIndexer::new(Duration::from_millis(300))),
            1,
            4,
            Duration::from_secs(1),
        );
        let (tx, mut rx) = oneshot::channel();
        pool.send_to_next_worker(WorkRequest::Convert {
            batch: point_batch(),
            index: 0,
            options: options(),
            cancelled: CancellationToken::new(),
            response: tx,
        })
        .await
        .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());

        let cells = rx.await.unwrap().unwrap();
        assert_eq!(cells.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_batches_are_skipped() {
        let pool = WorkerPool::spawn(
            Arc::new(H3Indexer::default()),
            1,
            4,
            Duration::from_secs(1),
        );
        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let (tx, rx) = oneshot::channel();
        pool.send_to_next_worker(WorkRequest::Convert {
            batch: point_batch(),
            index: 0,
            options: options(),
            cancelled,
            response: tx,
        })
        .await
        .unwrap();

        // The worker drops the reply channel without answering.
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn refuses_work_after_shutdown() {
        let pool = WorkerPool::spawn(
            Arc::new(H3Indexer::default()),
            2,
            1,
            Duration::from_secs(1),
        );
        pool.shutdown().await.unwrap();
        assert!(pool.is_shutting_down());

        let (tx, _rx) = oneshot::channel();
        let err = pool
            .send_to_next_worker(WorkRequest::Convert {
                batch: point_batch(),
                index: 0,
                options: options(),
                cancelled: CancellationToken::new(),
                response: tx,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ServiceShutdown));
    }
}
