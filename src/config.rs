// Centralized configuration for simulation parameters

use serde::{Deserialize, Serialize};

// ====================
// Clock
// ====================
/// Default tick length in microseconds (one second).
pub const DEFAULT_DT_US: f64 = 1.0e6;
/// Default number of ticks run by the headless runner.
pub const DEFAULT_STEPS: usize = 600;
/// Log a population/bond report every N ticks.
pub const DEFAULT_REPORT_INTERVAL: usize = 60;
/// Seed used when a scenario does not provide one.
pub const DEFAULT_SEED: u64 = 0x5EED;

// ====================
// Contact search
// ====================
/// Face centroids farther apart than this (µm) never exchange bonds.
/// Scenarios normally override it with their longest bond length.
pub const DEFAULT_CONTACT_RANGE: f64 = 2.0;

// ====================
// Bond hazard curve
// ====================
/// Asymptotic per-minute breakage probability of a stable bond.
pub const HAZARD_ASYMPTOTE: f64 = 0.05;
/// Ceiling on `asymptote × time_to_stable` before the asymptote is rescaled.
pub const HAZARD_ASYMPTOTE_AREA_LIMIT: f64 = 7.0;
/// Replacement area used when the ceiling is hit.
pub const HAZARD_ASYMPTOTE_AREA: f64 = 6.9;
/// Initial hazard level the early-life term is anchored to.
pub const HAZARD_INITIAL: f64 = 0.7;
/// Bonds with a stability target above this (minutes) skip the exp normalisation.
pub const HAZARD_LONG_TTS_MINUTES: f64 = 10.0;
/// Fraction of the stability target during which the early-life term applies.
pub const HAZARD_EARLY_FRACTION: f64 = 0.75;
/// Minimum age (minutes) before a bond can settle on the asymptote.
pub const HAZARD_MIN_SETTLE_MINUTES: f64 = 80.0;

// ====================
// Patch defaults
// ====================
/// Molecules consumed by one discrete bond when a coating does not say.
pub const DEFAULT_MOLECULES_PER_BOND: f64 = 10.0;

/// Runtime settings for one simulation instance.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SimConfig {
    /// Seed for the simulation's random stream
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Tick length in microseconds
    #[serde(default = "default_dt_us")]
    pub dt_us: f64,
    /// Number of ticks for the headless runner
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Face-centroid search radius for bond candidates (µm)
    #[serde(default = "default_contact_range")]
    pub contact_range: f64,
    /// Ticks between progress reports
    #[serde(default = "default_report_interval")]
    pub report_interval: usize,
    /// Run patch integration across bodies in parallel
    #[serde(default = "default_parallel_patches")]
    pub parallel_patches: bool,
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_dt_us() -> f64 {
    DEFAULT_DT_US
}

fn default_steps() -> usize {
    DEFAULT_STEPS
}

fn default_contact_range() -> f64 {
    DEFAULT_CONTACT_RANGE
}

fn default_report_interval() -> usize {
    DEFAULT_REPORT_INTERVAL
}

fn default_parallel_patches() -> bool {
    true
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            dt_us: DEFAULT_DT_US,
            steps: DEFAULT_STEPS,
            contact_range: DEFAULT_CONTACT_RANGE,
            report_interval: DEFAULT_REPORT_INTERVAL,
            parallel_patches: true,
        }
    }
}
