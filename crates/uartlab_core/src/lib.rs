//! UART transceiver timing model.
//!
//! A transmitter shifts a framed byte onto a single wire one bit per baud
//! tick, and a receiver recovers it by sampling that wire at 16x
//! oversampling. Everything advances through explicit `step_*` calls on a
//! [`Simulation`]; nothing here reads wall-clock time.

pub mod config;
mod drift;
mod error;
mod frame;
mod history;
mod parity;
mod rx;
mod simulation;
mod tx;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::SimConfig;
pub use drift::{ClockDrift, MAX_DRIFT_PERCENT};
pub use error::SimError;
pub use frame::{build_frame, frame_len, Frame, PARITY_INDEX, START_INDEX};
pub use history::{History, Signals, WaveformEntry};
pub use parity::{check_parity, compute_parity, ParityMode};
pub use rx::{RxEngine, RxErrors, RxState, RxTick};
pub use simulation::{LineFault, Received, Simulation, Snapshot};
pub use tx::{TxEngine, TxState};

/// Receiver oversample ticks per bit period.
pub const OVERSAMPLE: u8 = 16;
/// Oversample count at which the receiver samples the line (centre of a bit).
pub const MID_BIT: u8 = 8;
/// Number of data bits carried by every frame.
pub const DATA_BITS: usize = 8;
/// Level of an undriven line. UART idles high (mark).
pub const IDLE_LEVEL: bool = true;
