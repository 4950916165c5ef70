//! Physical unit definitions and conversions.
//!
//! Base units:
//! - Length: micrometre (µm)
//! - Time: microsecond (µs)
//! - Amount: molecule count
//! - Concentration: nanomolar (nM)

/// Microseconds in one second.
pub const MICROSECONDS_PER_SECOND: f64 = 1.0e6;
/// Microseconds in one minute.
pub const MICROSECONDS_PER_MINUTE: f64 = 60.0 * MICROSECONDS_PER_SECOND;

/// Scale applied to trafficking rates entered per minute.
pub const TRAFFICKING_RATE_SCALE: f64 = 6.0e-7;

/// Scale applied to kinetic rate constants entered per second.
pub const PER_SECOND_TO_PER_MICROSECOND: f64 = 1.0 / MICROSECONDS_PER_SECOND;

/// One molecule per µm³ expressed in nanomolar.
/// 1 / (6.022e23 mol⁻¹ × 1e-15 L) = 1.66e-9 M.
pub const MOLECULES_PER_CUBIC_MICRON_TO_NANOMOLAR: f64 = 1.661_129_75;

/// Convert a duration in microseconds to minutes.
#[inline]
pub fn us_to_minutes(us: f64) -> f64 {
    us / MICROSECONDS_PER_MINUTE
}

/// Convert a duration in minutes to microseconds.
#[inline]
pub fn minutes_to_us(minutes: f64) -> f64 {
    minutes * MICROSECONDS_PER_MINUTE
}

/// Convert a duration in seconds to microseconds.
#[inline]
pub fn seconds_to_us(seconds: f64) -> f64 {
    seconds * MICROSECONDS_PER_SECOND
}

/// Molecule count spread through `volume_um3` as a nanomolar concentration.
#[inline]
pub fn count_to_nanomolar(count: f64, volume_um3: f64) -> f64 {
    if volume_um3 <= 0.0 {
        return 0.0;
    }
    count / volume_um3 * MOLECULES_PER_CUBIC_MICRON_TO_NANOMOLAR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minute_round_trip() {
        assert_eq!(us_to_minutes(MICROSECONDS_PER_MINUTE), 1.0);
        assert_eq!(minutes_to_us(2.5), 1.5e8);
    }

    #[test]
    fn one_molecule_per_cubic_micron() {
        let nm = count_to_nanomolar(10.0, 10.0);
        assert!((nm - 1.66112975).abs() < 1e-12);
        assert_eq!(count_to_nanomolar(5.0, 0.0), 0.0);
    }
}
