use bitflags::bitflags;

use crate::{check_parity, ParityMode, DATA_BITS, IDLE_LEVEL, MID_BIT, OVERSAMPLE};

/// Receiver states.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum RxState {
    #[default]
    Idle,
    Start,
    Data,
    Parity,
    Stop,
    Done,
}

impl RxState {
    /// Between a detected start edge and the stop-bit sample.
    #[inline]
    pub fn in_frame(self) -> bool {
        matches!(
            self,
            RxState::Start | RxState::Data | RxState::Parity | RxState::Stop
        )
    }
}

bitflags! {
    /// Errors detected while receiving the current frame.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct RxErrors: u8 {
        /// Stop bit sampled low.
        const FRAME = 0b01;
        /// Received parity bit disagrees with the data.
        const PARITY = 0b10;
    }
}

impl RxErrors {
    #[inline]
    pub fn frame_error(self) -> bool {
        self.contains(RxErrors::FRAME)
    }

    #[inline]
    pub fn parity_error(self) -> bool {
        self.contains(RxErrors::PARITY)
    }

    /// The combined `rx_error` line.
    #[inline]
    pub fn any(self) -> bool {
        !self.is_empty()
    }
}

/// What happened during one call to [`RxEngine::clock`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RxTick {
    /// Level taken at a mid-bit sample, if one occurred.
    pub sampled: Option<bool>,
    /// The start bit did not hold low until its centre.
    pub false_start: bool,
    /// The stop bit was sampled and the frame is complete.
    pub finished: bool,
}

/// 16x oversampling receiver.
///
/// In `Idle` the engine watches for a falling edge. From there
/// `oversample` counts receiver clock increments modulo 16 with the edge
/// at 0, so count 8 lands on the centre of every bit period. Each centre
/// sample drives one state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RxEngine {
    state: RxState,
    /// Reassembly buffer; bits enter at the top and move down, LSB first.
    shift: u8,
    bit_count: u8,
    oversample: u8,
    parity_acc: bool,
    received_parity: bool,
    errors: RxErrors,
    last_line: bool,
    last_sample: bool,
}

impl Default for RxEngine {
    fn default() -> Self {
        Self {
            state: RxState::Idle,
            shift: 0,
            bit_count: 0,
            oversample: 0,
            parity_acc: false,
            received_parity: false,
            errors: RxErrors::empty(),
            last_line: IDLE_LEVEL,
            last_sample: IDLE_LEVEL,
        }
    }
}

impl RxEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to `Idle` with an empty buffer and no errors.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn state(&self) -> RxState {
        self.state
    }

    #[inline]
    pub fn shift_register(&self) -> u8 {
        self.shift
    }

    #[inline]
    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    #[inline]
    pub fn oversample_count(&self) -> u8 {
        self.oversample
    }

    #[inline]
    pub fn parity_accumulator(&self) -> bool {
        self.parity_acc
    }

    #[inline]
    pub fn received_parity(&self) -> bool {
        self.received_parity
    }

    #[inline]
    pub fn errors(&self) -> RxErrors {
        self.errors
    }

    /// Most recent mid-bit sample.
    #[inline]
    pub fn last_sample(&self) -> bool {
        self.last_sample
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.state == RxState::Done
    }

    /// The received byte, once the stop bit has been sampled.
    pub fn byte(&self) -> Option<u8> {
        self.is_done().then_some(self.shift)
    }

    /// Run `advance` receiver clock increments against `line`.
    ///
    /// `advance` comes from the clock-drift model: 0 means the receiver
    /// missed this tick entirely, 2 means it ran an extra increment. A
    /// detected start edge consumes the whole call so the counter starts
    /// from exactly 0.
    pub fn clock(&mut self, line: bool, advance: u8, parity: ParityMode) -> RxTick {
        let mut tick = RxTick::default();
        if advance == 0 {
            return tick;
        }

        let falling = self.last_line && !line;
        self.last_line = line;

        match self.state {
            RxState::Idle => {
                if falling {
                    log::debug!("RX: Idle -> Start, falling edge");
                    self.begin_frame();
                }
            }
            RxState::Done => {}
            _ => {
                for _ in 0..advance {
                    self.oversample = (self.oversample + 1) % OVERSAMPLE;
                    if self.oversample == MID_BIT {
                        self.sample(line, parity, &mut tick);
                    }
                    if !self.state.in_frame() {
                        break;
                    }
                }
            }
        }
        tick
    }

    fn begin_frame(&mut self) {
        self.state = RxState::Start;
        self.shift = 0;
        self.bit_count = 0;
        self.oversample = 0;
        self.parity_acc = false;
        self.received_parity = false;
        self.errors = RxErrors::empty();
    }

    fn sample(&mut self, bit: bool, parity: ParityMode, tick: &mut RxTick) {
        log::trace!("RX: {:?} sample={}", self.state, bit as u8);
        tick.sampled = Some(bit);
        self.last_sample = bit;

        match self.state {
            RxState::Start => {
                if bit {
                    // Line went back high before the centre of the start bit:
                    // settling noise, not a frame.
                    log::debug!("RX: false start, back to Idle");
                    self.state = RxState::Idle;
                    self.oversample = 0;
                    tick.false_start = true;
                } else {
                    self.state = RxState::Data;
                    self.bit_count = 0;
                }
            }
            RxState::Data => {
                self.shift = (self.shift >> 1) | ((bit as u8) << 7);
                self.parity_acc ^= bit;
                self.bit_count += 1;
                if self.bit_count as usize == DATA_BITS {
                    self.state = if parity.is_enabled() {
                        RxState::Parity
                    } else {
                        RxState::Stop
                    };
                }
            }
            RxState::Parity => {
                self.received_parity = bit;
                self.state = RxState::Stop;
            }
            RxState::Stop => {
                if !bit {
                    self.errors |= RxErrors::FRAME;
                }
                if check_parity(self.parity_acc, self.received_parity, parity) {
                    self.errors |= RxErrors::PARITY;
                }
                self.state = RxState::Done;
                tick.finished = true;
            }
            RxState::Idle | RxState::Done => {}
        }
    }
}

#[cfg(test)]
mod tests;
