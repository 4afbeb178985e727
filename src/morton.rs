//! Morton (Z-order) keys for 8-bit color triples.
//!
//! A key interleaves the bits of the three channels, most significant bit
//! first, so that bit `3*i` is bit `i` of `b`, bit `3*i + 1` is bit `i` of `g`
//! and bit `3*i + 2` is bit `i` of `r`:
//!
//! ```text
//!   bit: 23 22 21 20 19 18 ...  2  1  0
//!        r7 g7 b7 r6 g6 b6 ... r0 g0 b0
//! ```
//!
//! The top `3*n` bits of a key therefore name the octree cell at level `n`.

/// Number of significant bits in a key.
pub const KEY_BITS: u32 = 24;

/// Largest valid key.
pub const MAX_KEY: u32 = (1 << KEY_BITS) - 1;

/// Spreads one byte so that input bit `i` lands on output bit `3*i`.
static SPREAD3: [u32; 256] = spread3_table();

const fn spread3_bits(x: u8) -> u32 {
    let mut out = 0u32;
    let mut bit = 0u32;
    while bit < 8 {
        out |= ((x as u32 >> bit) & 1) << (3 * bit);
        bit += 1;
    }
    out
}

const fn spread3_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = spread3_bits(i as u8);
        i += 1;
    }
    table
}

/// `x` with its bits moved to every third position of a 24-bit word.
#[inline]
pub fn spread3(x: u8) -> u32 {
    SPREAD3[x as usize]
}

/// Interleave three channels into a 24-bit key.
#[inline]
pub fn encode(r: u8, g: u8, b: u8) -> u32 {
    spread3(b) | (spread3(g) << 1) | (spread3(r) << 2)
}

/// Inverse of [`encode`]. Bits above [`KEY_BITS`] are ignored.
#[inline]
pub fn decode(key: u32) -> (u8, u8, u8) {
    let (mut r, mut g, mut b) = (0u8, 0u8, 0u8);
    let mut key = key;
    for bit in 0..8 {
        b |= ((key & 1) as u8) << bit;
        g |= (((key >> 1) & 1) as u8) << bit;
        r |= (((key >> 2) & 1) as u8) << bit;
        key >>= 3;
    }
    (r, g, b)
}
