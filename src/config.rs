//! Construction-time configuration.

use crate::error::{OctreeError, Result};
use crate::octree::{MAX_DEPTH, MIN_DEPTH};

/// Configuration for an [`Octree`](crate::Octree).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of levels, `1..=7`. A tree of depth `d` has `8^(d-1)` leaf
    /// buckets and `d - 1` layers of region counts.
    pub depth: usize,
    /// Scan the 26 buckets around the query's own bucket before falling back
    /// to a scan of the whole tree.
    pub neighbor_search: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            depth: 5,
            neighbor_search: true,
        }
    }
}

impl Config {
    /// Default configuration with the given depth.
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    /// Enable or disable the neighborhood step of
    /// [`Octree::find_closest`](crate::Octree::find_closest).
    pub fn with_neighbor_search(mut self, enabled: bool) -> Self {
        self.neighbor_search = enabled;
        self
    }

    /// Check that the configuration describes a tree that can be built.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DEPTH..=MAX_DEPTH).contains(&self.depth) {
            return Err(OctreeError::InvalidDepth { depth: self.depth });
        }
        Ok(())
    }
}
