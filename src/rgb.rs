//! The 3-channel, 8-bit color triple.

use crate::morton;

/// An 8-bit-per-channel color triple.
///
/// No channel is special except through the key layout: in a Morton key, `r`
/// holds the most significant bit of every 3-bit group and `b` the least.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Black, also the color of the empty-tree sentinel.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    /// Create a color from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The 24-bit Morton key of this color.
    #[inline]
    pub fn key(self) -> u32 {
        morton::encode(self.r, self.g, self.b)
    }

    /// The color whose Morton key is `key`. Bits above bit 23 are ignored.
    #[inline]
    pub fn from_key(key: u32) -> Self {
        let (r, g, b) = morton::decode(key);
        Self { r, g, b }
    }

    /// Squared Euclidean distance between two colors.
    #[inline]
    pub fn dist2(self, other: Rgb) -> u32 {
        let dr = self.r.abs_diff(other.r) as u32;
        let dg = self.g.abs_diff(other.g) as u32;
        let db = self.b.abs_diff(other.b) as u32;
        dr * dr + dg * dg + db * db
    }

    /// Channel-wise addition, saturating at 255.
    #[inline]
    pub(crate) fn saturating_add(self, n: u8) -> Self {
        Self {
            r: self.r.saturating_add(n),
            g: self.g.saturating_add(n),
            b: self.b.saturating_add(n),
        }
    }
}

impl From<(u8, u8, u8)> for Rgb {
    #[inline]
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    #[inline]
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    #[inline]
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
