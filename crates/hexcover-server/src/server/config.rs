use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::time::Duration;
use hexcover::{Containment, UnknownKindPolicy};

/// Runtime configuration for the `hexcover-server` binary.
///
/// These settings control the listen address, the size of the conversion
/// worker pool, request limits, and how geometries are interpreted. All values
/// are parsed from CLI arguments or environment variables (a `.env` file is
/// honored), with defaults suitable for production.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hexcover-server",
    version,
    about = "An HTTP service that converts GeoJSON geometries into H3 cell sets"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:5005"))]
    pub server_addr: String,

    /// Number of worker tasks converting geometries concurrently.
    ///
    /// Geometries of a single request are spread across workers round-robin
    /// and reassembled in input order.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = num_cpus::get())]
    pub num_workers: usize,

    /// Capacity of each worker's queue of pending geometries.
    ///
    /// When a worker's queue is full, dispatch waits for it to drain.
    ///
    /// Environment variable: `WORKER_QUEUE_DEPTH`
    #[arg(long, env = "WORKER_QUEUE_DEPTH", default_value_t = 64)]
    pub worker_queue_depth: usize,

    /// Batches with fewer geometries than this are converted inline instead of
    /// being spread across the worker pool.
    ///
    /// Environment variable: `MIN_PARALLEL_BATCH`
    #[arg(long, env = "MIN_PARALLEL_BATCH", default_value_t = 2)]
    pub min_parallel_batch: usize,

    /// Maximum number of geometries accepted in a single request.
    ///
    /// Environment variable: `MAX_GEOMETRIES`
    #[arg(long, env = "MAX_GEOMETRIES", default_value_t = 100_000)]
    pub max_geometries: usize,

    /// Maximum accepted request body size, in bytes.
    ///
    /// Environment variable: `MAX_BODY_BYTES`
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 64 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Reject geometries of unsupported types instead of returning an empty
    /// cell set for them.
    ///
    /// Environment variable: `STRICT_GEOMETRY_KINDS`
    #[arg(long, env = "STRICT_GEOMETRY_KINDS", default_value_t = false)]
    pub strict_geometry_kinds: bool,

    /// Which cells count as covering a polygon.
    ///
    /// Environment variable: `CONTAINMENT`
    #[arg(long, env = "CONTAINMENT", value_enum, default_value_t = ContainmentArg::Centroid)]
    pub containment: ContainmentArg,

    /// Seconds to wait for each worker to acknowledge shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 5)]
    pub shutdown_timeout: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainmentArg {
    /// Cells whose center lies inside the polygon.
    Centroid,
    /// Cells entirely inside the polygon.
    Boundary,
    /// Cells that intersect the polygon.
    Intersects,
    /// Cells that intersect the polygon, even when it is smaller than a cell.
    Covers,
}

impl From<ContainmentArg> for Containment {
    fn from(value: ContainmentArg) -> Self {
        match value {
            ContainmentArg::Centroid => Self::ContainsCentroid,
            ContainmentArg::Boundary => Self::ContainsBoundary,
            ContainmentArg::Intersects => Self::IntersectsBoundary,
            ContainmentArg::Covers => Self::Covers,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub num_workers: usize,
    pub worker_queue_depth: usize,
    pub min_parallel_batch: usize,
    pub max_geometries: usize,
    pub max_body_bytes: usize,
    pub unknown_kinds: UnknownKindPolicy,
    pub containment: Containment,
    pub shutdown_timeout: Duration,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.worker_queue_depth == 0 {
            bail!("WORKER_QUEUE_DEPTH must be greater than 0");
        }

        if args.max_body_bytes == 0 {
            bail!("MAX_BODY_BYTES must be greater than 0");
        }

        let unknown_kinds = if args.strict_geometry_kinds {
            UnknownKindPolicy::Reject
        } else {
            UnknownKindPolicy::Ignore
        };

        Ok(Self {
            server_addr: args.server_addr,
            num_workers: args.num_workers,
            worker_queue_depth: args.worker_queue_depth,
            min_parallel_batch: args.min_parallel_batch,
            max_geometries: args.max_geometries,
            max_body_bytes: args.max_body_bytes,
            unknown_kinds,
            containment: args.containment.into(),
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
        })
    }
}
