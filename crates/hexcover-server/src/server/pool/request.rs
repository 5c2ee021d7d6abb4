//! Internal message types used for coordinating work across worker tasks.
//!
//! [`WorkRequest`] is the command protocol used by the
//! [`WorkerPool`](super::manager::WorkerPool) to hand work to individual
//! worker tasks. Messages travel over bounded MPSC channels; results come back
//! over a one-shot channel per geometry.

use hexcover::{ConversionOptions, Geometry, h3o::CellIndex};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// A message sent from the worker pool to an individual worker task.
#[derive(Debug)]
pub enum WorkRequest {
    /// Convert `batch[index]` and reply on `response`.
    ///
    /// - `batch`: The request's geometries, shared by every work item of the
    ///   batch.
    /// - `cancelled`: Set once the batch has failed; queued items of a
    ///   cancelled batch are dropped without being converted.
    Convert {
        batch: Arc<Vec<Geometry>>,
        index: usize,
        options: ConversionOptions,
        cancelled: CancellationToken,
        response: oneshot::Sender<hexcover::Result<Vec<CellIndex>>>,
    },

    /// Request the worker to shut down gracefully and acknowledge on
    /// `response`.
    Shutdown { response: oneshot::Sender<()> },
}
