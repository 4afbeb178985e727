//! Count colors of a synthetic gradient, then map samples to the closest
//! palette entry.

use rgb_octree::{Config, Octree, Rgb};

fn main() -> Result<(), rgb_octree::OctreeError> {
    example_counting()?;
    example_palette_lookup()?;
    Ok(())
}

fn example_counting() -> Result<(), rgb_octree::OctreeError> {
    println!("=== Counting ===\n");

    let mut tree = Octree::new(4)?;
    for x in 0..=255u8 {
        tree.insert((x, 255 - x, x / 2));
        tree.insert((x & 0xF0, 0x80, 0x80));
    }

    println!("Insertions:      {}", tree.total_count());
    println!("Distinct colors: {}", tree.len());
    for (i, count) in tree.layer(0).unwrap_or(&[]).iter().enumerate() {
        let bounds = tree.block_bounds(i * tree.bucket_count() / 8);
        println!("  octant {i} (from {}): {count}", bounds.min);
    }
    println!("Memory: {} bytes\n", tree.memory_usage());
    Ok(())
}

fn example_palette_lookup() -> Result<(), rgb_octree::OctreeError> {
    println!("=== Palette lookup ===\n");

    let palette = [
        Rgb::new(0x00, 0x00, 0x00),
        Rgb::new(0xFF, 0xFF, 0xFF),
        Rgb::new(0xFF, 0x00, 0x00),
        Rgb::new(0x00, 0xFF, 0x00),
        Rgb::new(0x00, 0x00, 0xFF),
        Rgb::new(0x80, 0x80, 0x80),
    ];
    let mut tree = Octree::with_config(Config::new(3))?;
    tree.extend(palette);

    for sample in [
        Rgb::new(0x39, 0x00, 0x00),
        Rgb::new(0xE0, 0x20, 0x10),
        Rgb::new(0x70, 0x90, 0x88),
        Rgb::new(0x10, 0x10, 0xC0),
    ] {
        let closest = tree.find_closest(sample);
        println!("{sample} -> {} (distance^2 {})", closest.color, closest.color.dist2(sample));
    }
    Ok(())
}
