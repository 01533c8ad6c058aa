use crate::{compute_parity, ParityMode, DATA_BITS};

/// Frame position of the start bit.
pub const START_INDEX: usize = 0;
/// Frame position of the parity bit, when the frame has one.
pub const PARITY_INDEX: usize = 1 + DATA_BITS;

/// Number of bits in a frame built with `parity`: 10 without, 11 with.
#[inline]
pub const fn frame_len(parity: ParityMode) -> usize {
    match parity {
        ParityMode::None => DATA_BITS + 2,
        ParityMode::Even | ParityMode::Odd => DATA_BITS + 3,
    }
}

/// One serial frame: `[start=0, d0..d7, parity?, stop=1]`.
///
/// Bits are packed LSB-first into `bits`, so bit `i` of the integer is the
/// `i`-th bit on the wire. This is also the layout the transmitter's shift
/// register starts from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Frame {
    bits: u16,
    len: u8,
    data: u8,
    parity: ParityMode,
}

impl Frame {
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Level of the `index`-th bit on the wire. Out-of-range indices read
    /// as the idle level.
    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        index >= self.len() || (self.bits >> index) & 1 != 0
    }

    /// Packed frame bits, LSB = first bit on the wire.
    #[inline]
    pub fn raw(&self) -> u16 {
        self.bits
    }

    #[inline]
    pub fn data(&self) -> u8 {
        self.data
    }

    #[inline]
    pub fn parity_mode(&self) -> ParityMode {
        self.parity
    }

    pub fn parity_bit(&self) -> Option<bool> {
        self.parity
            .is_enabled()
            .then(|| self.bit(PARITY_INDEX))
    }

    #[inline]
    pub fn stop_index(&self) -> usize {
        self.len() - 1
    }

    /// Frame bits as `0`/`1` values in wire order.
    pub fn levels(&self) -> Vec<u8> {
        (0..self.len()).map(|i| self.bit(i) as u8).collect()
    }
}

/// Assemble the frame for `byte` under `parity`.
pub fn build_frame(byte: u8, parity: ParityMode) -> Frame {
    // Start bit is 0, so bit 0 stays clear; data follows LSB first.
    let mut bits = (byte as u16) << 1;
    let mut next = 1 + DATA_BITS;
    if parity.is_enabled() {
        bits |= (compute_parity(byte, parity) as u16) << next;
        next += 1;
    }
    bits |= 1 << next;

    Frame {
        bits,
        len: frame_len(parity) as u8,
        data: byte,
        parity,
    }
}
