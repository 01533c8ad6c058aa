use std::str::FromStr;

use crate::SimError;

/// Parity scheme appended after the data bits.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ParityMode {
    #[default]
    None,
    Even,
    Odd,
}

impl ParityMode {
    /// Whether frames built in this mode carry a parity bit.
    #[inline]
    pub fn is_enabled(self) -> bool {
        !matches!(self, ParityMode::None)
    }
}

impl FromStr for ParityMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "n" => Ok(Self::None),
            "even" | "e" => Ok(Self::Even),
            "odd" | "o" => Ok(Self::Odd),
            _ => Err(SimError::UnknownParity(s.to_string())),
        }
    }
}

/// Expected parity bit for eight data bits.
///
/// Even parity is the XOR of all bits, odd parity its complement. With
/// `ParityMode::None` there is no parity bit and this returns `false`.
pub fn compute_parity(data: u8, mode: ParityMode) -> bool {
    let odd_ones = data.count_ones() & 1 == 1;
    match mode {
        ParityMode::None => false,
        ParityMode::Even => odd_ones,
        ParityMode::Odd => !odd_ones,
    }
}

/// Returns `true` when `received` disagrees with the parity accumulated over
/// the data bits as they were sampled.
pub fn check_parity(accumulated: bool, received: bool, mode: ParityMode) -> bool {
    match mode {
        ParityMode::None => false,
        ParityMode::Even => received != accumulated,
        ParityMode::Odd => received == accumulated,
    }
}
