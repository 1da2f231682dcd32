//! Sampling rate control for recording and replay

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Supported sampling rates.
///
/// Every rate maps to exactly one positive frequency in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum SamplingRate {
    Hz1,
    Hz2,
    Hz5,
    Hz10,
    Hz15,
    Hz20,
    Hz24,
    Hz25,
    #[default]
    Hz30,
    Hz45,
    Hz50,
    Hz60,
}

impl SamplingRate {
    /// Fallback used for unknown or out-of-range requests.
    pub const DEFAULT: SamplingRate = SamplingRate::Hz30;

    /// All rates in ascending frequency order.
    pub const ALL: [SamplingRate; 12] = [
        SamplingRate::Hz1,
        SamplingRate::Hz2,
        SamplingRate::Hz5,
        SamplingRate::Hz10,
        SamplingRate::Hz15,
        SamplingRate::Hz20,
        SamplingRate::Hz24,
        SamplingRate::Hz25,
        SamplingRate::Hz30,
        SamplingRate::Hz45,
        SamplingRate::Hz50,
        SamplingRate::Hz60,
    ];

    /// Frequency in Hz.
    pub const fn to_hz(self) -> f64 {
        match self {
            SamplingRate::Hz1 => 1.0,
            SamplingRate::Hz2 => 2.0,
            SamplingRate::Hz5 => 5.0,
            SamplingRate::Hz10 => 10.0,
            SamplingRate::Hz15 => 15.0,
            SamplingRate::Hz20 => 20.0,
            SamplingRate::Hz24 => 24.0,
            SamplingRate::Hz25 => 25.0,
            SamplingRate::Hz30 => 30.0,
            SamplingRate::Hz45 => 45.0,
            SamplingRate::Hz50 => 50.0,
            SamplingRate::Hz60 => 60.0,
        }
    }

    /// Map an arbitrary frequency to a supported rate.
    ///
    /// Picks the smallest rate whose frequency is at least `hz` (ceiling match).
    /// Requests above the fastest rate, and non-finite requests, fall back to
    /// [`SamplingRate::DEFAULT`] rather than the maximum.
    pub fn from_hz(hz: f64) -> Self {
        if !hz.is_finite() {
            return Self::DEFAULT;
        }
        Self::ALL.into_iter().find(|rate| hz <= rate.to_hz()).unwrap_or(Self::DEFAULT)
    }

    /// Timer period for this rate.
    pub fn period(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.to_hz())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn every_rate_round_trips() {
        for rate in SamplingRate::ALL {
            assert_eq!(SamplingRate::from_hz(rate.to_hz()), rate);
        }
    }

    #[test]
    fn lowest_tiers_are_distinct() {
        assert_eq!(SamplingRate::from_hz(0.5), SamplingRate::Hz1);
        assert_eq!(SamplingRate::from_hz(1.0), SamplingRate::Hz1);
        assert_eq!(SamplingRate::from_hz(1.5), SamplingRate::Hz2);
        assert_eq!(SamplingRate::from_hz(2.0), SamplingRate::Hz2);
        assert_eq!(SamplingRate::from_hz(2.01), SamplingRate::Hz5);
    }

    #[test]
    fn out_of_range_falls_back_to_default() {
        assert_eq!(SamplingRate::from_hz(60.5), SamplingRate::Hz30);
        assert_eq!(SamplingRate::from_hz(999.0), SamplingRate::Hz30);
        assert_eq!(SamplingRate::from_hz(f64::NAN), SamplingRate::Hz30);
        assert_eq!(SamplingRate::from_hz(f64::INFINITY), SamplingRate::Hz30);
        assert_eq!(SamplingRate::from_hz(-3.0), SamplingRate::Hz1);
    }

    #[test]
    fn period_matches_frequency() {
        assert_eq!(SamplingRate::Hz20.period(), Duration::from_millis(50));
        assert_eq!(SamplingRate::Hz1.period(), Duration::from_secs(1));
    }

    proptest! {
        #[test]
        fn ceiling_match_never_undershoots(hz in 0.0f64..=60.0) {
            let rate = SamplingRate::from_hz(hz);
            prop_assert!(rate.to_hz() >= hz);

            // No slower rate would also satisfy the request
            let slower = SamplingRate::ALL.iter().filter(|r| r.to_hz() < rate.to_hz());
            for r in slower {
                prop_assert!(r.to_hz() < hz);
            }
        }
    }
}
