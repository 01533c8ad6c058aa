mod fault;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{
    build_frame, frame_len, ClockDrift, Frame, History, ParityMode, RxEngine, RxErrors, RxState,
    RxTick, SimConfig, SimError, Signals, TxEngine, TxState, WaveformEntry, IDLE_LEVEL,
    OVERSAMPLE,
};

pub use fault::LineFault;

/// Result of one completed reception.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Received {
    pub byte: u8,
    pub errors: RxErrors,
}

/// Everything a display polls once per animation frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub tick: u64,
    pub tx_state: TxState,
    pub rx_state: RxState,
    pub tx_shift_register: u16,
    pub rx_shift_register: u8,
    pub rx_bit_count: u8,
    pub rx_oversample_count: u8,
    pub wire_value: bool,
    pub rx_byte: Option<u8>,
    pub rx_errors: RxErrors,
    pub parity: ParityMode,
    pub drift_percent: f32,
    pub loaded_byte: u8,
}

/// One transmitter wired to one receiver.
///
/// Time only moves through [`Simulation::step_oversample`] and
/// [`Simulation::step_baud`]. Within a step the transmitter updates the
/// wire first and the receiver samples it afterwards, so TX leads RX by
/// less than one bit period.
pub struct Simulation {
    config: SimConfig,
    tx: TxEngine,
    rx: RxEngine,
    drift: ClockDrift,
    parity: ParityMode,
    byte: u8,
    wire: bool,
    /// Oversample ticks since the last reset.
    tick: u64,
    /// Oversample ticks into the current transmitter bit period.
    baud_phase: u8,
    faults: Vec<LineFault>,
    noise: f64,
    rng: StdRng,
    history: History,
    false_starts: u64,
    last_received: Option<Received>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::assemble(SimConfig::default(), ClockDrift::default())
    }
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        let drift = ClockDrift::new(config.drift_percent)?;
        validate_noise(config.noise)?;
        Ok(Self::assemble(config, drift))
    }

    fn assemble(config: SimConfig, drift: ClockDrift) -> Self {
        Self {
            tx: TxEngine::new(),
            rx: RxEngine::new(),
            drift,
            parity: config.parity,
            byte: 0,
            wire: IDLE_LEVEL,
            tick: 0,
            baud_phase: 0,
            faults: Vec::new(),
            noise: config.noise,
            rng: StdRng::seed_from_u64(config.seed),
            history: History::new(config.history_capacity),
            false_starts: 0,
            last_received: None,
            config,
        }
    }

    /// Both engines back to `Idle`, history and faults cleared, time and the
    /// noise generator rewound. Parity, drift, noise level and the loaded
    /// byte are kept.
    pub fn reset(&mut self) {
        self.tx.reset();
        self.rx.reset();
        self.drift.reset_accumulator();
        self.wire = IDLE_LEVEL;
        self.tick = 0;
        self.baud_phase = 0;
        self.faults.clear();
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.history.clear();
        self.false_starts = 0;
        self.last_received = None;
        log::debug!("simulation reset");
    }

    pub fn configure_parity(&mut self, mode: ParityMode) -> Result<(), SimError> {
        self.ensure_tx_idle()?;
        if self.rx.state().in_frame() {
            log::debug!("parity change rejected: RX {:?}", self.rx.state());
            return Err(SimError::ReceiverBusy(self.rx.state()));
        }
        self.parity = mode;
        Ok(())
    }

    pub fn set_clock_drift(&mut self, percent: f32) -> Result<(), SimError> {
        self.drift.set_percent(percent)
    }

    pub fn set_noise(&mut self, probability: f64) -> Result<(), SimError> {
        validate_noise(probability)?;
        self.noise = probability;
        Ok(())
    }

    pub fn load_byte(&mut self, byte: u8) -> Result<(), SimError> {
        self.ensure_tx_idle()?;
        self.byte = byte;
        Ok(())
    }

    /// Load a byte drawn from the seeded generator and return it.
    pub fn load_random_byte(&mut self) -> Result<u8, SimError> {
        self.ensure_tx_idle()?;
        let byte: u8 = self.rng.gen();
        self.byte = byte;
        Ok(byte)
    }

    /// Queue a fault for the next transmitted frame.
    pub fn inject_fault(&mut self, fault: LineFault) -> Result<(), SimError> {
        self.ensure_tx_idle()?;
        if fault.bit_index() >= frame_len(self.parity) {
            return Err(SimError::FaultOutOfRange(fault.bit_index()));
        }
        self.faults.push(fault);
        Ok(())
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Frame the loaded byte and put its start bit on the wire.
    ///
    /// Only accepted while the transmitter is `Idle`; a transmitter still
    /// lingering in `Done` rejects the request.
    pub fn start_transmit(&mut self) -> Result<(), SimError> {
        let frame = build_frame(self.byte, self.parity);
        if let Err(err) = self.tx.start(frame) {
            log::debug!("start rejected: {err}");
            return Err(err);
        }
        self.rx.reset();
        self.baud_phase = 0;
        self.wire = self.drive_wire();
        log::debug!(
            "start transmit: byte=0x{:02X} parity={:?} at tick {}",
            self.byte,
            self.parity,
            self.tick
        );
        Ok(())
    }

    /// Advance one oversample tick.
    pub fn step_oversample(&mut self) -> RxTick {
        self.tick += 1;

        if self.tx.state() != TxState::Idle {
            if self.baud_phase == OVERSAMPLE {
                self.baud_phase = 0;
                let was_done = self.tx.is_done();
                self.tx.baud_tick(self.tick, self.config.tx_done_hold);
                if self.tx.is_done() && !was_done {
                    self.faults.clear();
                }
            }
            self.baud_phase += 1;
        }
        self.wire = self.drive_wire();

        let mut line = self.wire;
        if self.noise > 0.0 && self.rng.gen_bool(self.noise) {
            line = !line;
        }

        let advance = self.drift.advance();
        let rx_tick = self.rx.clock(line, advance, self.parity);
        if rx_tick.false_start {
            self.false_starts += 1;
        }
        if rx_tick.finished {
            self.finish_frame();
        }

        self.record(&rx_tick);
        rx_tick
    }

    /// Advance one bit period (16 oversample ticks), returning early on the
    /// tick where the receiver finishes a frame or abandons a false start.
    /// Returns the number of oversample ticks run.
    pub fn step_baud(&mut self) -> u8 {
        for n in 1..=OVERSAMPLE {
            let t = self.step_oversample();
            if t.finished || t.false_start {
                return n;
            }
        }
        OVERSAMPLE
    }

    /// Step bit periods until the receiver reaches `Done`, giving up after
    /// `max_baud_ticks`.
    pub fn run_frame(&mut self, max_baud_ticks: usize) -> Option<Received> {
        for _ in 0..max_baud_ticks {
            self.step_baud();
            if self.rx.is_done() {
                return self.last_received;
            }
        }
        None
    }

    // --- snapshot accessors ---

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn tx_state(&self) -> TxState {
        self.tx.state()
    }

    #[inline]
    pub fn rx_state(&self) -> RxState {
        self.rx.state()
    }

    #[inline]
    pub fn tx_shift_register(&self) -> u16 {
        self.tx.shift_register()
    }

    #[inline]
    pub fn rx_shift_register(&self) -> u8 {
        self.rx.shift_register()
    }

    #[inline]
    pub fn wire_value(&self) -> bool {
        self.wire
    }

    /// Received byte while the receiver sits in `Done`.
    #[inline]
    pub fn rx_byte(&self) -> Option<u8> {
        self.rx.byte()
    }

    #[inline]
    pub fn rx_error_flags(&self) -> RxErrors {
        self.rx.errors()
    }

    #[inline]
    pub fn waveform_history(&self) -> &History {
        &self.history
    }

    #[inline]
    pub fn tx_bit_index(&self) -> Option<usize> {
        self.tx.bit_index()
    }

    #[inline]
    pub fn tx_completed_at(&self) -> Option<u64> {
        self.tx.completed_at()
    }

    #[inline]
    pub fn rx_bit_count(&self) -> u8 {
        self.rx.bit_count()
    }

    #[inline]
    pub fn rx_oversample_count(&self) -> u8 {
        self.rx.oversample_count()
    }

    /// Frame currently (or most recently) held by the transmitter.
    #[inline]
    pub fn frame(&self) -> Option<&Frame> {
        self.tx.frame()
    }

    #[inline]
    pub fn parity(&self) -> ParityMode {
        self.parity
    }

    #[inline]
    pub fn clock_drift(&self) -> &ClockDrift {
        &self.drift
    }

    #[inline]
    pub fn noise(&self) -> f64 {
        self.noise
    }

    #[inline]
    pub fn loaded_byte(&self) -> u8 {
        self.byte
    }

    #[inline]
    pub fn faults(&self) -> &[LineFault] {
        &self.faults
    }

    /// Start edges the receiver abandoned. Not counted as errors.
    #[inline]
    pub fn false_starts(&self) -> u64 {
        self.false_starts
    }

    /// Last completed reception; survives the receiver leaving `Done`.
    #[inline]
    pub fn last_received(&self) -> Option<Received> {
        self.last_received
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            tx_state: self.tx.state(),
            rx_state: self.rx.state(),
            tx_shift_register: self.tx.shift_register(),
            rx_shift_register: self.rx.shift_register(),
            rx_bit_count: self.rx.bit_count(),
            rx_oversample_count: self.rx.oversample_count(),
            wire_value: self.wire,
            rx_byte: self.rx.byte(),
            rx_errors: self.rx.errors(),
            parity: self.parity,
            drift_percent: self.drift.percent(),
            loaded_byte: self.byte,
        }
    }

    fn ensure_tx_idle(&self) -> Result<(), SimError> {
        if self.tx.is_busy() {
            log::debug!("rejected while TX {:?}", self.tx.state());
            return Err(SimError::TransmitterBusy(self.tx.state()));
        }
        Ok(())
    }

    /// Transmitter output with any queued faults applied.
    fn drive_wire(&self) -> bool {
        let level = self.tx.output();
        match self.tx.bit_index() {
            Some(index) => self
                .faults
                .iter()
                .fold(level, |level, fault| fault.apply(index, level)),
            None => level,
        }
    }

    fn finish_frame(&mut self) {
        let Some(byte) = self.rx.byte() else {
            return;
        };
        let errors = self.rx.errors();
        self.last_received = Some(Received { byte, errors });
        if errors.is_empty() {
            log::info!("RX: received 0x{byte:02X} at tick {}", self.tick);
        } else {
            log::warn!(
                "RX: received 0x{byte:02X} with errors (frame={}, parity={}) at tick {}",
                errors.frame_error(),
                errors.parity_error(),
                self.tick
            );
        }
    }

    fn record(&mut self, rx_tick: &RxTick) {
        let mut signals = Signals::empty();
        signals.set(Signals::TX_OUT, self.wire);
        signals.set(Signals::TX_BUSY, self.tx.is_busy());
        signals.set(Signals::TX_DONE, self.tx.is_done());
        signals.set(Signals::TX_START, self.tx.state() == TxState::Start);
        signals.set(Signals::RX_SAMPLING, rx_tick.sampled.is_some());
        signals.set(Signals::RX_DATA, self.rx.last_sample());
        signals.set(Signals::RX_DONE, self.rx.is_done());
        signals.set(Signals::RX_ERROR, self.rx.errors().any());
        self.history.push(WaveformEntry {
            tick: self.tick,
            signals,
        });
    }
}

fn validate_noise(probability: f64) -> Result<(), SimError> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(SimError::InvalidNoise(probability));
    }
    Ok(())
}
