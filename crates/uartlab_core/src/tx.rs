use crate::{Frame, SimError, IDLE_LEVEL};

/// Transmitter states. Outputs depend on the state only (Moore machine).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum TxState {
    #[default]
    Idle,
    Start,
    Data,
    Stop,
    Done,
}

/// Bit-serial transmitter.
///
/// `start` loads a frame into the shift register; each `baud_tick` then
/// drops bit 0 and refills the top with the idle level, so the wire always
/// carries bit 0 of the register while a frame is in flight.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxEngine {
    state: TxState,
    shift: u16,
    /// Index of the frame bit currently on the wire.
    bit_count: u8,
    frame: Option<Frame>,
    /// Logical tick at which the stop bit finished.
    completed_at: Option<u64>,
    /// Baud ticks spent in `Done`.
    done_ticks: u32,
}

impl TxEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn state(&self) -> TxState {
        self.state
    }

    #[inline]
    pub fn shift_register(&self) -> u16 {
        self.shift
    }

    #[inline]
    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    #[inline]
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    #[inline]
    pub fn completed_at(&self) -> Option<u64> {
        self.completed_at
    }

    /// A frame is being shifted out.
    #[inline]
    pub fn is_busy(&self) -> bool {
        matches!(self.state, TxState::Start | TxState::Data | TxState::Stop)
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.state == TxState::Done
    }

    /// Frame position being driven, if any.
    #[inline]
    pub fn bit_index(&self) -> Option<usize> {
        self.is_busy().then_some(self.bit_count as usize)
    }

    /// Level the transmitter puts on the wire.
    #[inline]
    pub fn output(&self) -> bool {
        match self.state {
            TxState::Start | TxState::Data | TxState::Stop => self.shift & 1 != 0,
            TxState::Idle | TxState::Done => IDLE_LEVEL,
        }
    }

    /// Begin shifting `frame` out. Only accepted from `Idle`.
    pub fn start(&mut self, frame: Frame) -> Result<(), SimError> {
        if self.state != TxState::Idle {
            return Err(SimError::TransmitterBusy(self.state));
        }
        self.shift = frame.raw();
        self.bit_count = 0;
        self.frame = Some(frame);
        self.completed_at = None;
        self.done_ticks = 0;
        self.state = TxState::Start;
        log::debug!(
            "TX: Idle -> Start, frame {:?} ({} bits)",
            frame.levels(),
            frame.len()
        );
        Ok(())
    }

    /// Advance by one bit period.
    ///
    /// `now` is the logical tick recorded when the frame completes.
    /// `done_hold` is how many baud ticks `Done` lasts before the engine
    /// falls back to `Idle` (at least one).
    pub fn baud_tick(&mut self, now: u64, done_hold: u32) {
        let Some(frame) = self.frame else {
            return;
        };
        let last = frame.stop_index() as u8;

        match self.state {
            TxState::Idle => {}
            TxState::Start => {
                self.shift_out(frame.len());
                self.bit_count = 1;
                self.state = TxState::Data;
            }
            TxState::Data => {
                self.shift_out(frame.len());
                self.bit_count += 1;
                if self.bit_count == last {
                    self.state = TxState::Stop;
                }
            }
            TxState::Stop => {
                self.bit_count = frame.len() as u8;
                self.completed_at = Some(now);
                self.state = TxState::Done;
                log::debug!("TX: Stop -> Done at tick {now}");
            }
            TxState::Done => {
                self.done_ticks += 1;
                if self.done_ticks >= done_hold.max(1) {
                    log::debug!("TX: Done -> Idle after {} baud ticks", self.done_ticks);
                    self.reset();
                }
            }
        }
    }

    fn shift_out(&mut self, len: usize) {
        let pad = (IDLE_LEVEL as u16) << (len - 1);
        self.shift = (self.shift >> 1) | pad;
    }
}
