use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;

fn validate_octree(t: &Octree) {
    let depth = t.depth();
    assert_eq!(t.layer_count(), depth - 1);
    assert_eq!(t.bucket_count(), 1 << (3 * (depth - 1)));

    for i in 0..t.layer_count() {
        let layer = t.layer(i).unwrap();
        let sum: u64 = layer.iter().sum();
        assert_eq!(sum, t.total_count(), "layer {i} must sum to the total");

        // Each cell is the sum of its eight children one layer down.
        if let Some(children) = t.layer(i + 1) {
            for (cell, &count) in layer.iter().enumerate() {
                let below: u64 = children[cell * 8..cell * 8 + 8].iter().sum();
                assert_eq!(count, below, "layer {i} cell {cell}");
            }
        }
    }

    let mut distinct = 0usize;
    let mut stored = 0u64;
    for i in 0..t.bucket_count() {
        let bucket = t.bucket(i).unwrap();
        let bucket_sum: u64 = bucket.iter().map(|o| o.count).sum();
        if depth > 1 {
            let last = t.layer(depth - 2).unwrap();
            assert_eq!(bucket_sum, last[i], "bucket {i} must match its region count");
        }

        let bounds = t.block_bounds(i);
        for (j, o) in bucket.iter().enumerate() {
            assert!(o.count > 0, "stored observation with zero count");
            assert_eq!(t.bucket_index(o.color), i, "{} filed in wrong bucket", o.color);
            assert!(bounds.contains(o.color));
            assert!(
                bucket[..j].iter().all(|p| p.color != o.color),
                "duplicate {} in bucket {i}",
                o.color
            );
        }
        distinct += bucket.len();
        stored += bucket_sum;
    }

    assert_eq!(distinct, t.len(), "distinct count must match Octree::len");
    assert_eq!(stored, t.total_count(), "stored counts must sum to the total");
    assert_eq!(t.iter().count(), t.len());
}

/// Insertion-ordered list of distinct colors with their counts.
#[derive(Default)]
struct Model {
    entries: Vec<(Rgb, u64)>,
    total: u64,
}

impl Model {
    fn insert(&mut self, color: Rgb) {
        self.total += 1;
        match self.entries.iter_mut().find(|(c, _)| *c == color) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((color, 1)),
        }
    }

    /// Nearest by distance, then bucket, then insertion order.
    fn closest(&self, t: &Octree, query: Rgb) -> Observation {
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(pos, (c, _))| (c.dist2(query), t.bucket_index(*c), *pos))
            .map_or(Observation::EMPTY, |(_, &(color, count))| Observation { color, count })
    }
}

fn color_strategy() -> impl Strategy<Value = Rgb> {
    prop_oneof![
        any::<(u8, u8, u8)>(),
        // Dense cluster so repeats and same-bucket neighbors are common.
        (0u8..8, 0u8..8, 0u8..8),
        // Straddles the r = 0x40 block edge.
        (0x38u8..0x48, 0u8..4, 0u8..4),
        // Corners of the color space.
        prop::sample::select(vec![(0u8, 0u8, 0u8), (0xFF, 0xFF, 0xFF), (0xFF, 0, 0), (0, 0xFF, 0xFF)]),
    ]
    .prop_map(Rgb::from)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 3)]
    Insert(#[proptest(strategy = "color_strategy()")] Rgb),
    FindClosest(#[proptest(strategy = "color_strategy()")] Rgb),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=300)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(depth in 1usize..=6, neighbor_search in any::<bool>(), ops in ops_strategy()) {
        let config = Config::new(depth).with_neighbor_search(neighbor_search);
        let mut t = Octree::with_config(config).unwrap();
        let mut m = Model::default();

        for op in ops {
            match op {
                Op::Insert(color) => {
                    t.insert(color);
                    m.insert(color);
                }
                Op::FindClosest(query) => {
                    prop_assert_eq!(t.find_closest(query), m.closest(&t, query));
                }
            }
            prop_assert_eq!(t.total_count(), m.total);
            prop_assert_eq!(t.len(), m.entries.len());
        }

        validate_octree(&t);
        for &(color, count) in &m.entries {
            prop_assert_eq!(t.get(color).copied(), Some(Observation { color, count }));
            prop_assert_eq!(t.find_closest(color), Observation { color, count });
        }
    }

    #[test]
    fn prop_codec_roundtrip(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
        let key = morton::encode(r, g, b);
        prop_assert!(key <= morton::MAX_KEY);
        prop_assert_eq!(morton::decode(key), (r, g, b));
    }

    #[test]
    fn prop_bucket_contains_its_colors(depth in 1usize..=7, color in color_strategy()) {
        let t = Octree::new(depth).unwrap();
        let index = t.bucket_index(color);
        prop_assert!(index < t.bucket_count());
        let bounds = t.block_bounds(index);
        prop_assert!(bounds.contains(color));
        for n in t.neighbor_blocks(index) {
            prop_assert!(n < t.bucket_count());
            prop_assert!(!t.block_bounds(n).contains(color));
        }
    }
}

#[test]
fn exhaustive_insert_order_small_set() {
    let colors = [
        Rgb::new(0x00, 0x00, 0x00),
        Rgb::new(0x3F, 0x00, 0x00),
        Rgb::new(0x40, 0x00, 0x00),
        Rgb::new(0x00, 0x00, 0x01),
        Rgb::new(0xFF, 0xFF, 0xFF),
    ];
    let queries = [
        Rgb::new(0x39, 0x00, 0x00),
        Rgb::new(0x20, 0x00, 0x00),
        Rgb::new(0x80, 0x80, 0x80),
        Rgb::new(0x00, 0x00, 0x00),
    ];

    for_each_permutation(&colors, |perm| {
        for depth in MIN_DEPTH..=5 {
            let mut t = Octree::new(depth).unwrap();
            let mut m = Model::default();
            for &c in &perm {
                t.insert(c);
                m.insert(c);
            }
            validate_octree(&t);
            for &q in &queries {
                assert_eq!(t.find_closest(q), m.closest(&t, q), "depth {depth}, order {perm:?}, query {q}");
            }
        }
    });
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}
