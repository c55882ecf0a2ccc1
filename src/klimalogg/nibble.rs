//! # Nibble Primitives
//!
//! KlimaLogg packs its fields at nibble granularity. A field may start on the
//! high or the low half of a byte, and multi-digit fields run on through the
//! following nibbles, crossing byte boundaries as needed.
//!
//! ```text
//! byte:    [ start     ] [ start + 1 ]
//! nibble:   High   Low    High   Low
//!           n0     n1     n2     n3      (start on High)
//!                  n0     n1     n2      (start on Low)
//! ```
//!
//! Nothing here checks bounds beyond normal slice indexing; callers are
//! expected to have validated the buffer length up front.

/// Largest nibble value that is a valid decimal digit.
pub const MAX_DIGIT: u8 = 9;

/// Nibble value marking a field outside the sensor's factory limits.
pub const OVERFLOW_NIBBLE: u8 = 0xF;

/// Which half of a byte a field starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nibble {
    /// Bits 4-7
    High,
    /// Bits 0-3
    Low,
}

/// Position of a single nibble inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NibblePos {
    /// Byte index
    pub byte: usize,
    /// Half of the byte
    pub half: Nibble,
}

impl NibblePos {
    /// Create a nibble position
    pub const fn new(byte: usize, half: Nibble) -> Self {
        Self { byte, half }
    }

    /// Position of the next nibble in stream order
    ///
    /// A high nibble is followed by the low nibble of the same byte; a low
    /// nibble by the high nibble of the next byte.
    pub const fn next(self) -> Self {
        match self.half {
            Nibble::High => Self::new(self.byte, Nibble::Low),
            Nibble::Low => Self::new(self.byte + 1, Nibble::High),
        }
    }

    /// Position `count` nibbles further on
    pub const fn advance(self, count: usize) -> Self {
        let index = self.index() + count;
        let half = if index % 2 == 0 { Nibble::High } else { Nibble::Low };
        Self::new(index / 2, half)
    }

    /// Absolute nibble index (two per byte, high first)
    const fn index(self) -> usize {
        match self.half {
            Nibble::High => self.byte * 2,
            Nibble::Low => self.byte * 2 + 1,
        }
    }
}

/// Read one nibble (0-15)
///
/// # Panics
///
/// Panics if `pos.byte` is outside `buf`.
pub fn digit(buf: &[u8], pos: NibblePos) -> u8 {
    let byte = buf[pos.byte];
    match pos.half {
        Nibble::High => byte >> 4,
        Nibble::Low => byte & 0x0F,
    }
}

/// Read a two-digit decimal value (`tens * 10 + units`)
///
/// The tens digit is the nibble at `pos`, the units digit the one after it.
/// Nibbles above 9 are not rejected here: `0xAB` reads as `10 * 10 + 11`.
///
/// # Panics
///
/// Panics if the second nibble falls outside `buf`.
pub fn two_digits(buf: &[u8], pos: NibblePos) -> u8 {
    digit(buf, pos) * 10 + digit(buf, pos.next())
}

/// Iterate over `len` consecutive nibbles starting at `pos`
pub fn window(buf: &[u8], pos: NibblePos, len: usize) -> impl Iterator<Item = u8> + '_ {
    (0..len).map(move |i| digit(buf, pos.advance(i)))
}

/// "Out of factory limits": any nibble in the window equals 15
pub fn is_overflow(buf: &[u8], pos: NibblePos, len: usize) -> bool {
    window(buf, pos, len).any(|n| n == OVERFLOW_NIBBLE)
}

/// "Not present": any nibble in the window is 10-14
///
/// 15 is excluded so this never overlaps with [`is_overflow`].
pub fn is_error(buf: &[u8], pos: NibblePos, len: usize) -> bool {
    window(buf, pos, len).any(|n| n > MAX_DIGIT && n != OVERFLOW_NIBBLE)
}

/// Every nibble in the window is a decimal digit
pub fn is_decimal(buf: &[u8], pos: NibblePos, len: usize) -> bool {
    window(buf, pos, len).all(|n| n <= MAX_DIGIT)
}
