//! Errors surfaced at the boundary of a generation request.
//!
//! Individual samples cannot fail; everything here is detected before any
//! work-item runs (or, for queued batches, before the batch is accepted).

use std::fmt;

use glam::IVec2;
use strata_coords::GridError;
use thiserror::Error;

/// Which level of the sample → chunk → cluster hierarchy an index addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexAxis {
    Cluster,
    ChunkInCluster,
    Sample,
}

impl fmt::Display for IndexAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cluster => f.write_str("cluster"),
            Self::ChunkInCluster => f.write_str("chunk-in-cluster"),
            Self::Sample => f.write_str("sample"),
        }
    }
}

/// Errors returned by the generators and the batch dispatcher.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A batch with no clusters or chunks was submitted.
    #[error("batch contains no entries")]
    EmptyBatch,

    /// An index exceeds the configured range of its axis.
    #[error("{axis} index {index} out of range (valid: 0..{len})")]
    OutOfRange {
        axis: IndexAxis,
        index: usize,
        len: usize,
    },

    /// A chunk or cluster coordinate lies beyond the configured world bounds.
    #[error("chunk coordinate {coord} exceeds the world limit of ±{limit}")]
    CoordOutOfRange { coord: String, limit: i32 },

    /// The caller-provided output buffer does not fit the batch exactly.
    #[error("output buffer holds {actual} elements but the batch needs {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// The same cluster was requested twice in one batch.
    #[error("cluster {0} appears more than once in the batch")]
    DuplicateCluster(IVec2),

    /// A chunk origin has a NaN or infinite component.
    #[error("chunk origin {0} is not finite")]
    NonFiniteOrigin(String),

    /// The grid tunables are unusable.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// The background queue cannot accept another batch.
    #[error("generation queue is full ({0} batches in flight)")]
    QueueFull(u64),

    /// The background worker threads have exited and accept no more batches.
    #[error("generation workers have stopped")]
    WorkersStopped,

    /// The worker thread pool could not be created.
    #[error("failed to start worker threads: {0}")]
    ThreadPool(String),
}
