//! Clock mismatch between transmitter and receiver.
//!
//! Every oversample tick the configured percentage is added to a
//! fractional accumulator. Once the accumulator reaches a whole tick the
//! receiver clock runs one extra increment (advance 2); once it falls to
//! minus one tick the receiver misses an increment (advance 0). Otherwise
//! the receiver advances exactly once. Averaged over many ticks this makes
//! the receiver run `percent` faster (or slower) than the transmitter.
//!
//! The accumulator is kept in fixed point (1/100 of a percent of a tick)
//! so a given sequence of calls always produces the same advances.

use crate::SimError;

/// Largest drift magnitude accepted, in percent.
pub const MAX_DRIFT_PERCENT: f32 = 5.0;

/// One whole oversample tick in accumulator units.
const WHOLE_TICK: i32 = 10_000;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ClockDrift {
    percent: f32,
    /// Accumulator increment per tick, in `WHOLE_TICK` units.
    step: i32,
    acc: i32,
}

impl ClockDrift {
    pub fn new(percent: f32) -> Result<Self, SimError> {
        let mut drift = Self::default();
        drift.set_percent(percent)?;
        Ok(drift)
    }

    /// Change the drift. The accumulator carries over so a slider can be
    /// moved mid-run without a phase jump.
    pub fn set_percent(&mut self, percent: f32) -> Result<(), SimError> {
        if !percent.is_finite() || percent.abs() > MAX_DRIFT_PERCENT {
            return Err(SimError::DriftOutOfRange(percent));
        }
        self.percent = percent;
        self.step = (percent * 100.0).round() as i32;
        Ok(())
    }

    #[inline]
    pub fn percent(&self) -> f32 {
        self.percent
    }

    /// Sub-tick drift carried into the next step, in ticks (`(-1, 1)`).
    #[inline]
    pub fn accumulator(&self) -> f32 {
        self.acc as f32 / WHOLE_TICK as f32
    }

    pub fn reset_accumulator(&mut self) {
        self.acc = 0;
    }

    /// Number of receiver clock increments for this oversample tick.
    pub fn advance(&mut self) -> u8 {
        self.acc += self.step;
        if self.acc >= WHOLE_TICK {
            self.acc -= WHOLE_TICK;
            2
        } else if self.acc <= -WHOLE_TICK {
            self.acc += WHOLE_TICK;
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advances(drift: &mut ClockDrift, n: usize) -> Vec<u8> {
        (0..n).map(|_| drift.advance()).collect()
    }

    #[test]
    fn zero_drift_always_advances_once() {
        let mut drift = ClockDrift::new(0.0).unwrap();
        assert!(advances(&mut drift, 1000).iter().all(|&a| a == 1));
    }

    #[test]
    fn five_percent_fast_doubles_every_twentieth_tick() {
        let mut drift = ClockDrift::new(5.0).unwrap();
        let seq = advances(&mut drift, 100);
        for (i, a) in seq.iter().enumerate() {
            let expected = if (i + 1) % 20 == 0 { 2 } else { 1 };
            assert_eq!(*a, expected, "tick {}", i + 1);
        }
        let total: u32 = seq.iter().map(|&a| a as u32).sum();
        assert_eq!(total, 105);
    }

    #[test]
    fn five_percent_slow_skips_every_twentieth_tick() {
        let mut drift = ClockDrift::new(-5.0).unwrap();
        let seq = advances(&mut drift, 100);
        assert_eq!(seq.iter().filter(|&&a| a == 0).count(), 5);
        assert_eq!(seq[19], 0);
        let total: u32 = seq.iter().map(|&a| a as u32).sum();
        assert_eq!(total, 95);
    }

    #[test]
    fn long_run_average_matches_percentage() {
        let mut drift = ClockDrift::new(1.25).unwrap();
        let total: u32 = advances(&mut drift, 8000).iter().map(|&a| a as u32).sum();
        assert_eq!(total, 8100);
        assert!(drift.accumulator().abs() < 1.0);
    }

    #[test]
    fn rejects_out_of_range_drift() {
        let mut drift = ClockDrift::new(2.0).unwrap();
        assert_eq!(drift.set_percent(5.5), Err(SimError::DriftOutOfRange(5.5)));
        assert!(drift.set_percent(f32::NAN).is_err());
        assert_eq!(drift.percent(), 2.0);
        assert!(ClockDrift::new(-5.0).is_ok());
    }

    #[test]
    fn accumulator_survives_percent_change() {
        let mut drift = ClockDrift::new(4.0).unwrap();
        advances(&mut drift, 10);
        let before = drift.accumulator();
        drift.set_percent(-1.0).unwrap();
        assert_eq!(drift.accumulator(), before);
        drift.reset_accumulator();
        assert_eq!(drift.accumulator(), 0.0);
    }
}
