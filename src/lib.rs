//! # rgb-octree
//!
//! A fixed-depth octree over 8-bit RGB colors, for counting how often each
//! color occurs and finding the stored color closest to a query.
//!
//! Colors are addressed by their 24-bit Morton key (see [`morton`]). The top
//! bits of the key pick the region a color falls in at every level of the
//! tree, so insertion and lookup never walk pointers.
//!
//! ## Example
//!
//! ```rust
//! use rgb_octree::{Octree, Rgb};
//!
//! let mut tree = Octree::new(5)?;
//! tree.insert((0xFF, 0x00, 0x00));
//! tree.insert((0x00, 0xFF, 0x00));
//! tree.insert((0xFF, 0x00, 0x00));
//!
//! let closest = tree.find_closest((0xE0, 0x10, 0x00));
//! assert_eq!(closest.color, Rgb::new(0xFF, 0x00, 0x00));
//! assert_eq!(closest.count, 2);
//! assert_eq!(tree.total_count(), 3);
//! # Ok::<(), rgb_octree::OctreeError>(())
//! ```
//!
//! The tree is a plain owned value with no interior mutability; share it
//! across threads behind a lock of your choosing.

#![warn(clippy::all)]

mod config;
mod error;
pub mod morton;
mod octree;
mod rgb;

pub use config::Config;
pub use error::{OctreeError, Result};
pub use octree::{BlockBounds, Iter, Observation, Octree, MAX_DEPTH, MIN_DEPTH};
pub use rgb::Rgb;

#[cfg(test)]
mod proptests;
