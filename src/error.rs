//! Error and result types.

use thiserror::Error;

/// Errors returned when building an [`Octree`](crate::Octree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OctreeError {
    /// The requested depth lies outside `1..=7`.
    #[error("invalid octree depth: {depth} (expected 1..=7)")]
    InvalidDepth {
        /// The rejected depth.
        depth: usize,
    },
}

/// Crate-wide result alias.
pub type Result<T, E = OctreeError> = std::result::Result<T, E>;
