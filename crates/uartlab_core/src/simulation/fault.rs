/// A deliberate corruption of one frame bit on the wire.
///
/// Faults are keyed by frame position (0 = start bit, 1..=8 = data,
/// [`crate::PARITY_INDEX`] = parity, last = stop) and act only while the
/// transmitter drives that position.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LineFault {
    Flip(usize),
    ForceLow(usize),
    ForceHigh(usize),
}

impl LineFault {
    #[inline]
    pub fn bit_index(self) -> usize {
        match self {
            LineFault::Flip(i) | LineFault::ForceLow(i) | LineFault::ForceHigh(i) => i,
        }
    }

    /// Level on the wire when the transmitter drives `level` at `index`.
    pub(crate) fn apply(self, index: usize, level: bool) -> bool {
        if index != self.bit_index() {
            return level;
        }
        match self {
            LineFault::Flip(_) => !level,
            LineFault::ForceLow(_) => false,
            LineFault::ForceHigh(_) => true,
        }
    }
}
