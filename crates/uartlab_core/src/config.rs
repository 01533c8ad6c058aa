//! Simulation settings.

use typed_builder::TypedBuilder;

use crate::ParityMode;

/// Default number of oversample ticks kept in the waveform history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 512;
/// Default number of baud ticks the transmitter lingers in `Done`.
pub const DEFAULT_TX_DONE_HOLD: u32 = 2;

/// Initial configuration for a [`crate::Simulation`].
///
/// ```
/// use uartlab_core::{ParityMode, SimConfig};
///
/// let config = SimConfig::builder()
///     .parity(ParityMode::Even)
///     .drift_percent(-2.5)
///     .build();
/// assert_eq!(config.history_capacity, 512);
/// ```
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct SimConfig {
    #[builder(default)]
    pub parity: ParityMode,
    /// Receiver clock error relative to the transmitter, in percent.
    #[builder(default = 0.0)]
    pub drift_percent: f32,
    #[builder(default = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,
    #[builder(default = DEFAULT_TX_DONE_HOLD)]
    pub tx_done_hold: u32,
    /// Probability per oversample tick that the receiver sees the line
    /// inverted.
    #[builder(default = 0.0)]
    pub noise: f64,
    /// Seed for line noise and random bytes.
    #[builder(default = 0)]
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
