//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

use crate::constants::TICKS_PER_HOUR;

/// Ceil a f64 and clamp it to the u64 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn ceil_f64_to_u64(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(value.min(max).ceil()).unwrap_or(u64::MAX)
}

/// Round a f64 half away from zero and clamp it to the u32 range, returning 0 for NaN.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let max = f64::from(u32::MAX);
    cast::<f64, u32>(value.min(max).round()).unwrap_or(u32::MAX)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(f64::MAX)
}

/// Convert a collection length to f64.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

/// Elapsed simulated hours for an absolute tick counter.
#[must_use]
pub fn ticks_to_hours(tick: u32) -> f64 {
    f64::from(tick) / f64::from(TICKS_PER_HOUR)
}

/// Absolute tick counter for an elapsed time, truncated toward zero.
#[must_use]
pub fn hours_to_ticks(hours: f64) -> u32 {
    if !hours.is_finite() || hours <= 0.0 {
        return 0;
    }
    let ticks = (hours * f64::from(TICKS_PER_HOUR)).floor();
    cast::<f64, u32>(ticks.min(f64::from(u32::MAX))).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_rejects_non_finite_and_negative() {
        assert_eq!(ceil_f64_to_u64(1.2), 2);
        assert_eq!(ceil_f64_to_u64(3.0), 3);
        assert_eq!(ceil_f64_to_u64(f64::NAN), 0);
        assert_eq!(ceil_f64_to_u64(-4.5), 0);
    }

    #[test]
    fn rounding_goes_half_away_from_zero() {
        assert_eq!(round_f64_to_u32(0.5), 1);
        assert_eq!(round_f64_to_u32(49.4), 49);
        assert_eq!(round_f64_to_u32(f64::NAN), 0);
        assert_eq!(round_f64_to_u32(f64::from(u32::MAX) * 2.0), u32::MAX);
    }

    #[test]
    fn tick_hour_conversions() {
        assert!((ticks_to_hours(360) - 2.0).abs() < f64::EPSILON);
        assert_eq!(hours_to_ticks(1.5), 270);
        assert_eq!(hours_to_ticks(0.004), 0);
        assert_eq!(hours_to_ticks(-1.0), 0);
    }
}
