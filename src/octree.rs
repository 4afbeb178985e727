//! Fixed-depth octree over Morton-keyed colors.
//!
//! The tree never stores interior nodes. A tree of depth `d` keeps `d - 1`
//! flat arrays of region counts (layer `i` has `8^(i+1)` cells, addressed by
//! the top `3*(i+1)` bits of a key) and `8^(d-1)` leaf buckets holding the
//! distinct colors seen in each region together with their counts.

use log::{debug, trace};
use smallvec::SmallVec;

use crate::config::Config;
use crate::error::Result;
use crate::morton::{self, KEY_BITS};
use crate::rgb::Rgb;

/// Smallest supported depth: a single bucket and no count layers.
pub const MIN_DEPTH: usize = 1;
/// Largest supported depth: 3 * (7 - 1) = 18 of the 24 key bits address a
/// bucket, giving 8x8x8-color leaf regions.
pub const MAX_DEPTH: usize = 7;

/// Observations stored inline per bucket before spilling to the heap.
const BUCKET_INLINE: usize = 2;

type Bucket = SmallVec<[Observation; BUCKET_INLINE]>;

// =============================================================================
// Observation and block geometry
// =============================================================================

/// A distinct color stored in the tree and how many times it was inserted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Observation {
    /// The observed color.
    pub color: Rgb,
    /// Number of insertions of exactly this color.
    pub count: u64,
}

impl Observation {
    /// Returned by [`Octree::find_closest`] when the tree holds nothing.
    pub const EMPTY: Observation = Observation {
        color: Rgb::BLACK,
        count: 0,
    };

    /// Whether this is the empty-tree sentinel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Inclusive, axis-aligned box of colors, `min..=max` on every channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockBounds {
    /// Lowest corner (inside the box).
    pub min: Rgb,
    /// Highest corner (inside the box).
    pub max: Rgb,
}

impl BlockBounds {
    /// Whether `color` lies inside the box.
    pub fn contains(&self, color: Rgb) -> bool {
        (self.min.r..=self.max.r).contains(&color.r)
            && (self.min.g..=self.max.g).contains(&color.g)
            && (self.min.b..=self.max.b).contains(&color.b)
    }

    /// Number of colors inside the box.
    pub fn volume(&self) -> u64 {
        let side = |lo: u8, hi: u8| (hi as u64 + 1).saturating_sub(lo as u64);
        side(self.min.r, self.max.r) * side(self.min.g, self.max.g) * side(self.min.b, self.max.b)
    }

    /// Smallest squared distance from `color` to any of the six faces.
    ///
    /// `color` is expected to lie inside the box; a face it lies beyond
    /// counts as distance 0.
    pub fn min_face_dist2(&self, color: Rgb) -> u32 {
        [
            color.r.saturating_sub(self.min.r),
            color.g.saturating_sub(self.min.g),
            color.b.saturating_sub(self.min.b),
            self.max.r.saturating_sub(color.r),
            self.max.g.saturating_sub(color.g),
            self.max.b.saturating_sub(color.b),
        ]
        .into_iter()
        .map(|d| d as u32 * d as u32)
        .min()
        .unwrap_or(0)
    }

    /// Like [`min_face_dist2`](Self::min_face_dist2), but skipping faces that
    /// sit on the edge of the color space, since nothing can lie beyond them.
    /// `None` when the box spans the whole space.
    fn escape_dist2(&self, color: Rgb) -> Option<u32> {
        let axes = [
            (self.min.r, self.max.r, color.r),
            (self.min.g, self.max.g, color.g),
            (self.min.b, self.max.b, color.b),
        ];
        let mut best: Option<u32> = None;
        for (lo, hi, v) in axes {
            if lo > 0 {
                let d = v.saturating_sub(lo) as u32;
                best = Some(best.map_or(d * d, |b| b.min(d * d)));
            }
            if hi < u8::MAX {
                let d = hi.saturating_sub(v) as u32;
                best = Some(best.map_or(d * d, |b| b.min(d * d)));
            }
        }
        best
    }
}

/// The up-to-3x3x3 block of bucket cells around one bucket, clamped to the
/// grid. Coordinates are per-axis cell numbers, not colors.
struct Neighborhood {
    center: [u8; 3],
    lo: [u8; 3],
    hi: [u8; 3],
}

impl Neighborhood {
    /// Every cell in the block, center included, in r-major order.
    fn cells(&self) -> impl Iterator<Item = [u8; 3]> {
        let [lr, lg, lb] = self.lo;
        let [hr, hg, hb] = self.hi;
        (lr..=hr).flat_map(move |r| (lg..=hg).flat_map(move |g| (lb..=hb).map(move |b| [r, g, b])))
    }

    /// Color-space box covered by the block, for cells `side` colors wide.
    fn bounds(&self, side: u32) -> BlockBounds {
        let corner = |cells: [u8; 3], offset: u32| {
            let [r, g, b] = cells.map(|c| ((c as u32 + offset) * side - offset) as u8);
            Rgb::new(r, g, b)
        };
        BlockBounds {
            min: corner(self.lo, 0),
            max: corner(self.hi, 1),
        }
    }
}

// =============================================================================
// Octree
// =============================================================================

/// A fixed-depth octree counting color observations.
///
/// Features:
/// - Per-region occurrence counts at every level
/// - Distinct colors kept per leaf bucket, in insertion order
/// - Nearest-color lookup pruned by leaf-region geometry
///
/// ```rust
/// use rgb_octree::{Octree, Rgb};
///
/// let mut tree = Octree::new(3).unwrap();
/// tree.insert((0x40, 0x00, 0x00));
/// tree.insert((0x00, 0x00, 0x00));
///
/// let closest = tree.find_closest((0x39, 0x00, 0x00));
/// assert_eq!(closest.color, Rgb::new(0x40, 0x00, 0x00));
/// assert_eq!(closest.count, 1);
/// ```
#[derive(Clone)]
pub struct Octree {
    depth: usize,
    neighbor_search: bool,
    /// Sum of all insertions.
    total: u64,
    /// Number of distinct colors across all buckets.
    distinct: usize,
    /// `layers[i]` has `8^(i+1)` region counts.
    layers: Vec<Box<[u64]>>,
    /// `8^(depth-1)` buckets, indexed by the top `3*(depth-1)` key bits.
    buckets: Vec<Bucket>,
}

impl Octree {
    /// Create an empty tree of the given depth, which must be in
    /// [`MIN_DEPTH`]`..=`[`MAX_DEPTH`].
    pub fn new(depth: usize) -> Result<Self> {
        Self::with_config(Config::new(depth))
    }

    /// Create an empty tree from a [`Config`].
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let depth = config.depth;

        let mut layers = Vec::with_capacity(depth - 1);
        let mut size = 1usize;
        for _ in 1..depth {
            size *= 8;
            layers.push(vec![0u64; size].into_boxed_slice());
        }
        let buckets = vec![Bucket::new(); size];
        debug!("created octree: depth={depth}, layers={}, buckets={size}", layers.len());

        Ok(Self {
            depth,
            neighbor_search: config.neighbor_search,
            total: 0,
            distinct: 0,
            layers,
            buckets,
        })
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Total number of insertions.
    #[inline]
    pub fn total_count(&self) -> u64 {
        self.total
    }

    /// Number of distinct colors stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.distinct
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distinct == 0
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of region-count layers (`depth - 1`).
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Region counts of layer `i`, coarsest first.
    pub fn layer(&self, i: usize) -> Option<&[u64]> {
        self.layers.get(i).map(|counts| &counts[..])
    }

    /// Observations of one bucket, in insertion order.
    pub fn bucket(&self, index: usize) -> Option<&[Observation]> {
        self.buckets.get(index).map(|bucket| bucket.as_slice())
    }

    #[inline]
    fn bucket_shift(&self) -> u32 {
        KEY_BITS - 3 * (self.depth as u32 - 1)
    }

    #[inline]
    fn layer_shift(layer: usize) -> u32 {
        KEY_BITS - 3 * (layer as u32 + 1)
    }

    /// Index of the bucket whose region contains `color`.
    #[inline]
    pub fn bucket_index(&self, color: impl Into<Rgb>) -> usize {
        (color.into().key() >> self.bucket_shift()) as usize
    }

    /// Count of insertions falling in the layer-`layer` region that contains
    /// `color`, or `None` if the layer does not exist.
    pub fn region_count(&self, layer: usize, color: impl Into<Rgb>) -> Option<u64> {
        let key = color.into().key();
        self.layers
            .get(layer)
            .map(|counts| counts[(key >> Self::layer_shift(layer)) as usize])
    }

    /// Record one observation of `color`.
    pub fn insert(&mut self, color: impl Into<Rgb>) {
        let color = color.into();
        let key = color.key();
        self.total += 1;

        for (i, counts) in self.layers.iter_mut().enumerate() {
            counts[(key >> Self::layer_shift(i)) as usize] += 1;
        }

        let index = (key >> self.bucket_shift()) as usize;
        let bucket = &mut self.buckets[index];
        match bucket.iter_mut().find(|o| o.color == color) {
            Some(existing) => existing.count += 1,
            None => {
                bucket.push(Observation { color, count: 1 });
                self.distinct += 1;
            }
        }
    }

    /// The stored observation of exactly `color`, if any.
    pub fn get(&self, color: impl Into<Rgb>) -> Option<&Observation> {
        let color = color.into();
        self.buckets[self.bucket_index(color)]
            .iter()
            .find(|o| o.color == color)
    }

    /// Color box covered by a bucket. Indices past
    /// [`bucket_count`](Self::bucket_count) wrap around.
    pub fn block_bounds(&self, bucket_index: usize) -> BlockBounds {
        let index = bucket_index & (self.buckets.len() - 1);
        let min = Rgb::from_key((index as u32) << self.bucket_shift());
        let stride = u8::MAX >> (self.depth - 1);
        BlockBounds {
            min,
            max: min.saturating_add(stride),
        }
    }

    fn neighborhood(&self, bucket_index: usize) -> Neighborhood {
        let last = ((1u32 << (self.depth - 1)) - 1) as u8;
        let index = bucket_index & (self.buckets.len() - 1);
        // A bucket index is the Morton key of its cell coordinates.
        let (r, g, b) = morton::decode(index as u32);
        let center = [r, g, b];
        Neighborhood {
            center,
            lo: center.map(|c| c.saturating_sub(1)),
            hi: center.map(|c| c.saturating_add(1).min(last)),
        }
    }

    /// Buckets sharing a face, edge or corner with `bucket_index`: 26 in the
    /// interior of the grid, fewer along its edges, none at depth 1.
    pub fn neighbor_blocks(&self, bucket_index: usize) -> Vec<usize> {
        let hood = self.neighborhood(bucket_index);
        hood.cells()
            .filter(|&cell| cell != hood.center)
            .map(|[r, g, b]| morton::encode(r, g, b) as usize)
            .collect()
    }

    /// The stored color closest to `color` by squared Euclidean distance.
    ///
    /// Ties go to the observation met first in bucket order, then insertion
    /// order. Returns [`Observation::EMPTY`] when the tree is empty.
    pub fn find_closest(&self, color: impl Into<Rgb>) -> Observation {
        let color = color.into();
        let home = self.bucket_index(color);
        let bucket = &self.buckets[home];

        if let Some(exact) = bucket.iter().find(|o| o.color == color) {
            return *exact;
        }

        if let Some((best, best_dist2)) = closest_in(bucket, color) {
            // Anything outside the home block is farther than its nearest face.
            if best_dist2 <= self.block_bounds(home).min_face_dist2(color) {
                return best;
            }
        }

        if self.neighbor_search {
            if let Some(best) = self.closest_in_neighborhood(color, home) {
                return best;
            }
        }

        trace!("find_closest({color}): scanning all {} observations", self.distinct);
        closest_in(self.iter(), color).map_or(Observation::EMPTY, |(best, _)| best)
    }

    /// Search the 3x3x3 block of buckets around `home`. Returns `None` unless
    /// the answer provably cannot lie outside it.
    fn closest_in_neighborhood(&self, color: Rgb, home: usize) -> Option<Observation> {
        let hood = self.neighborhood(home);
        let mut blocks: SmallVec<[usize; 27]> = hood
            .cells()
            .map(|[r, g, b]| morton::encode(r, g, b) as usize)
            .collect();
        // Visit in bucket order so ties resolve as in a full scan.
        blocks.sort_unstable();

        let candidates = blocks.iter().flat_map(|&i| self.buckets[i].iter());
        let Some((best, best_dist2)) = closest_in(candidates, color) else {
            trace!("find_closest({color}): neighborhood of bucket {home} is empty");
            return None;
        };

        let side = 1u32 << (KEY_BITS / 3 - (self.depth as u32 - 1));
        match hood.bounds(side).escape_dist2(color) {
            Some(escape) if best_dist2 > escape => {
                trace!("find_closest({color}): neighborhood inconclusive ({best_dist2} > {escape})");
                None
            }
            _ => Some(best),
        }
    }

    /// All observations, in bucket order and then insertion order.
    pub fn iter(&self) -> Iter<'_> {
        let empty: &[Observation] = &[];
        Iter {
            buckets: self.buckets.iter(),
            current: empty.iter(),
        }
    }

    /// Approximate heap and inline bytes held by the tree.
    pub fn memory_usage(&self) -> usize {
        let layers: usize = self.layers.iter().map(|l| l.len() * 8).sum();
        let spilled: usize = self
            .buckets
            .iter()
            .filter(|b| b.spilled())
            .map(|b| b.capacity() * std::mem::size_of::<Observation>())
            .sum();
        std::mem::size_of::<Self>()
            + self.layers.capacity() * std::mem::size_of::<Box<[u64]>>()
            + layers
            + self.buckets.capacity() * std::mem::size_of::<Bucket>()
            + spilled
    }

    pub fn shrink_to_fit(&mut self) {
        for bucket in &mut self.buckets {
            bucket.shrink_to_fit();
        }
    }
}

/// Closest observation to `color`, keeping the first on ties.
fn closest_in<'a>(
    observations: impl IntoIterator<Item = &'a Observation>,
    color: Rgb,
) -> Option<(Observation, u32)> {
    let mut best: Option<(Observation, u32)> = None;
    for o in observations {
        let dist2 = o.color.dist2(color);
        if best.map_or(true, |(_, d)| dist2 < d) {
            best = Some((*o, dist2));
        }
    }
    best
}

impl<C: Into<Rgb>> Extend<C> for Octree {
    fn extend<I: IntoIterator<Item = C>>(&mut self, iter: I) {
        for color in iter {
            self.insert(color);
        }
    }
}

impl std::fmt::Debug for Octree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Octree")
            .field("depth", &self.depth)
            .field("total_count", &self.total)
            .field("observations", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

/// Iterator over every [`Observation`] of an [`Octree`].
pub struct Iter<'a> {
    buckets: std::slice::Iter<'a, Bucket>,
    current: std::slice::Iter<'a, Observation>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Observation;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(o) = self.current.next() {
                return Some(o);
            }
            self.current = self.buckets.next()?.iter();
        }
    }
}

impl<'a> IntoIterator for &'a Octree {
    type Item = &'a Observation;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
