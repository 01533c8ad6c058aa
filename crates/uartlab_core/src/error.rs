use thiserror::Error;

use crate::{RxState, TxState, MAX_DRIFT_PERCENT};

/// Reasons an operation on the simulation was rejected.
///
/// A rejected operation never changes any state; callers that do not care
/// may simply drop the error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("transmitter is busy ({0:?})")]
    TransmitterBusy(TxState),
    #[error("receiver is mid-frame ({0:?})")]
    ReceiverBusy(RxState),
    #[error("clock drift {0}% is outside ±{max}%", max = MAX_DRIFT_PERCENT)]
    DriftOutOfRange(f32),
    #[error("noise probability {0} is outside [0, 1]")]
    InvalidNoise(f64),
    #[error("frame bit {0} does not exist")]
    FaultOutOfRange(usize),
    #[error("unknown parity mode '{0}'")]
    UnknownParity(String),
}
