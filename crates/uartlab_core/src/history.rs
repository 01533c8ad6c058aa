use std::collections::VecDeque;

use bitflags::bitflags;

bitflags! {
    /// Signal levels captured for one oversample tick.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct Signals: u8 {
        const TX_OUT = 1 << 0;
        const TX_BUSY = 1 << 1;
        const TX_DONE = 1 << 2;
        const TX_START = 1 << 3;
        /// The receiver took a mid-bit sample on this tick.
        const RX_SAMPLING = 1 << 4;
        /// Level of the receiver's most recent sample.
        const RX_DATA = 1 << 5;
        const RX_DONE = 1 << 6;
        const RX_ERROR = 1 << 7;
    }
}

/// Immutable snapshot of every displayed signal at one logical tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct WaveformEntry {
    pub tick: u64,
    pub signals: Signals,
}

impl WaveformEntry {
    #[inline]
    pub fn tx_out(&self) -> bool {
        self.signals.contains(Signals::TX_OUT)
    }

    #[inline]
    pub fn tx_busy(&self) -> bool {
        self.signals.contains(Signals::TX_BUSY)
    }

    #[inline]
    pub fn tx_done(&self) -> bool {
        self.signals.contains(Signals::TX_DONE)
    }

    #[inline]
    pub fn tx_start(&self) -> bool {
        self.signals.contains(Signals::TX_START)
    }

    #[inline]
    pub fn rx_sampling(&self) -> bool {
        self.signals.contains(Signals::RX_SAMPLING)
    }

    #[inline]
    pub fn rx_data(&self) -> bool {
        self.signals.contains(Signals::RX_DATA)
    }

    #[inline]
    pub fn rx_done(&self) -> bool {
        self.signals.contains(Signals::RX_DONE)
    }

    #[inline]
    pub fn rx_error(&self) -> bool {
        self.signals.contains(Signals::RX_ERROR)
    }
}

/// Fixed-capacity waveform history. Pushing onto a full buffer evicts the
/// oldest entry; iteration runs oldest to newest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct History {
    entries: VecDeque<WaveformEntry>,
    capacity: usize,
}

impl History {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: WaveformEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn latest(&self) -> Option<&WaveformEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &WaveformEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Raw signal bits, oldest first.
    pub fn signal_bits(&self) -> Vec<u8> {
        self.entries.iter().map(|e| e.signals.bits()).collect()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a WaveformEntry;
    type IntoIter = std::collections::vec_deque::Iter<'a, WaveformEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
