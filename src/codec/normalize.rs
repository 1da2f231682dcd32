//! Normalization between physical quantities and bounded wire values.
//!
//! Simulator positions travel as 32-bit floats in [-1, 1] (signed controls)
//! or [0, 1] (percentages). The domain model keeps physical units in `f64`.
//!
//! Out-of-range physical inputs are clamped, never rejected: simulator
//! telemetry may transiently exceed its nominal bounds. An empty or inverted
//! domain range is a configuration defect and is reported as
//! [`SimError::Configuration`](crate::SimError::Configuration).
//!
//! ## Precision
//!
//! A round trip `physical -> normalized -> physical` for a value inside the
//! domain reproduces it within [`DomainRange::precision_bound`]: one 32-bit
//! float epsilon scaled by the span, plus the `f64` rounding of the affine map.

use crate::{Result, SimError};

/// A closed physical domain `[min, max]` with `min < max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainRange {
    min: f64,
    max: f64,
}

/// Control surface travel in percent, negative for left/down.
pub const POSITION_PERCENT: DomainRange = DomainRange::new_const(-100.0, 100.0);

/// Percentages such as flap extension or canopy opening.
pub const PERCENT: DomainRange = DomainRange::new_const(0.0, 100.0);

impl DomainRange {
    /// Create a range, failing if `min >= max` or either bound is not finite.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) || min >= max {
            return Err(SimError::configuration(format!(
                "invalid domain range [{min}, {max}]: min must be finite and below max"
            )));
        }
        Ok(Self { min, max })
    }

    /// Compile-time constructor for built-in ranges.
    pub const fn new_const(min: f64, max: f64) -> Self {
        assert!(min < max, "domain range must be non-empty");
        Self { min, max }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Map into [-1, 1]. NaN maps to the centre of the range.
    pub fn to_signed(&self, value: f64) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        let clamped = value.clamp(self.min, self.max);
        (2.0 * (clamped - self.min) / self.span() - 1.0) as f32
    }

    /// Inverse of [`to_signed`](Self::to_signed); input is clamped to [-1, 1].
    pub fn from_signed(&self, normalized: f32) -> f64 {
        let n = if normalized.is_nan() { 0.0 } else { f64::from(normalized).clamp(-1.0, 1.0) };
        self.min + (n + 1.0) * self.span() / 2.0
    }

    /// Map into [0, 1]. NaN maps to the lower bound.
    pub fn to_unit(&self, value: f64) -> f32 {
        if value.is_nan() {
            return 0.0;
        }
        let clamped = value.clamp(self.min, self.max);
        ((clamped - self.min) / self.span()) as f32
    }

    /// Inverse of [`to_unit`](Self::to_unit); input is clamped to [0, 1].
    pub fn from_unit(&self, normalized: f32) -> f64 {
        let n = if normalized.is_nan() { 0.0 } else { f64::from(normalized).clamp(0.0, 1.0) };
        self.min + n * self.span()
    }

    /// Largest round-trip error for a value inside this range.
    pub fn precision_bound(&self) -> f64 {
        self.span() * f64::from(f32::EPSILON)
            + (self.min.abs() + self.max.abs()) * f64::EPSILON * 4.0
    }
}

/// Map a physical value into [-1, 1].
pub fn to_normalized(value: f64, domain_min: f64, domain_max: f64) -> Result<f32> {
    Ok(DomainRange::new(domain_min, domain_max)?.to_signed(value))
}

/// Map a normalized value in [-1, 1] back into `[domain_min, domain_max]`.
pub fn from_normalized(normalized: f32, domain_min: f64, domain_max: f64) -> Result<f64> {
    Ok(DomainRange::new(domain_min, domain_max)?.from_signed(normalized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_or_inverted_range_is_a_configuration_error() {
        assert!(to_normalized(1.0, 5.0, 5.0).is_err());
        assert!(to_normalized(1.0, 10.0, -10.0).is_err());
        assert!(from_normalized(0.0, f64::NAN, 1.0).is_err());
        assert!(DomainRange::new(f64::NEG_INFINITY, 0.0).is_err());
    }

    #[test]
    fn known_points_map_exactly() {
        assert_eq!(POSITION_PERCENT.to_signed(-100.0), -1.0);
        assert_eq!(POSITION_PERCENT.to_signed(0.0), 0.0);
        assert_eq!(POSITION_PERCENT.to_signed(100.0), 1.0);
        assert_eq!(PERCENT.to_unit(50.0), 0.5);
        assert_eq!(PERCENT.from_unit(1.0), 100.0);
        assert_eq!(POSITION_PERCENT.from_signed(-1.0), -100.0);
    }

    #[test]
    fn nan_inputs_do_not_leak_to_the_wire() {
        assert_eq!(POSITION_PERCENT.to_signed(f64::NAN), 0.0);
        assert_eq!(PERCENT.to_unit(f64::NAN), 0.0);
        assert_eq!(POSITION_PERCENT.from_signed(f32::NAN), 0.0);
    }

    #[test]
    fn wire_values_outside_unit_interval_are_clamped() {
        assert_eq!(POSITION_PERCENT.from_signed(1.5), 100.0);
        assert_eq!(POSITION_PERCENT.from_signed(-7.0), -100.0);
        assert_eq!(PERCENT.from_unit(-0.2), 0.0);
    }

    proptest! {
        #[test]
        fn signed_round_trip_within_bound(
            min in -1.0e6f64..1.0e6,
            span in 1.0e-3f64..1.0e6,
            t in 0.0f64..=1.0
        ) {
            let max = min + span;
            let range = DomainRange::new(min, max).unwrap();
            let value = (min + t * span).min(max);

            let back = from_normalized(to_normalized(value, min, max).unwrap(), min, max).unwrap();
            prop_assert!((back - value).abs() <= range.precision_bound(),
                "value {} came back as {} (bound {})", value, back, range.precision_bound());
        }

        #[test]
        fn unit_round_trip_within_bound(t in 0.0f64..=1.0) {
            let value = t * 100.0;
            let back = PERCENT.from_unit(PERCENT.to_unit(value));
            prop_assert!((back - value).abs() <= PERCENT.precision_bound());
        }

        #[test]
        fn out_of_range_inputs_clamp_to_bounds(
            min in -1.0e3f64..1.0e3,
            span in 1.0e-2f64..1.0e3,
            excess in 1.0e-6f64..1.0e6
        ) {
            let max = min + span;
            prop_assert_eq!(to_normalized(max + excess, min, max).unwrap(), 1.0);
            prop_assert_eq!(to_normalized(min - excess, min, max).unwrap(), -1.0);
        }

        #[test]
        fn normalized_output_stays_in_interval(value in any::<f64>()) {
            let n = POSITION_PERCENT.to_signed(value);
            prop_assert!((-1.0..=1.0).contains(&n));
            let u = PERCENT.to_unit(value);
            prop_assert!((0.0..=1.0).contains(&u));
        }
    }
}
