//! Numeric conversion helpers centralizing the lossy casts used by the
//! energy and reward math.

use num_traits::cast::cast;

/// Round a f64 and clamp it into the u32 range, returning 0 for NaN.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(0.0, f64::from(u32::MAX)).round();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Floor a f64 and clamp it into the u32 range, returning 0 for NaN.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(0.0, f64::from(u32::MAX)).floor();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Scale an unsigned amount by a multiplier, rounding to the nearest unit.
#[must_use]
pub fn scale_u32(amount: u32, multiplier: f64) -> u32 {
    round_f64_to_u32(f64::from(amount) * multiplier)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert a collection length to u32, saturating on overflow.
#[must_use]
pub fn len_to_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_clamps_to_unsigned_range() {
        assert_eq!(round_f64_to_u32(-4.0), 0);
        assert_eq!(round_f64_to_u32(f64::NAN), 0);
        assert_eq!(round_f64_to_u32(2.5), 3);
        assert_eq!(round_f64_to_u32(f64::from(u32::MAX) * 2.0), u32::MAX);
    }

    #[test]
    fn flooring_truncates_fractions() {
        assert_eq!(floor_f64_to_u32(2_400.999), 2_400);
        assert_eq!(floor_f64_to_u32(f64::NAN), 0);
    }

    #[test]
    fn scaling_and_lengths() {
        assert_eq!(scale_u32(100, 1.25), 125);
        assert_eq!(scale_u32(0, 9.0), 0);
        assert_eq!(len_to_u32(7), 7);
        assert!((i64_to_f64(-12) + 12.0).abs() < f64::EPSILON);
    }
}
