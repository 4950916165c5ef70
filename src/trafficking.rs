// trafficking.rs
// Secretion and internalization rates for one species on one surface patch

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::species::SpeciesId;
use crate::units::TRAFFICKING_RATE_SCALE;

/// Per-patch exchange rates in internal (per µs) units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraffickingRates {
    /// Molecules delivered to the surface per µs (qr)
    pub secretion: f64,
    /// Fractional uptake of unbound molecules per µs (kt)
    pub unbound_internalization: f64,
    /// Fractional uptake of bound molecules per µs (ke)
    pub bound_internalization: f64,
}

impl TraffickingRates {
    /// Build from rates entered per minute.
    pub fn from_per_minute(
        secretion: f64,
        unbound_internalization: f64,
        bound_internalization: f64,
    ) -> Self {
        Self {
            secretion: secretion * TRAFFICKING_RATE_SCALE,
            unbound_internalization: unbound_internalization * TRAFFICKING_RATE_SCALE,
            bound_internalization: bound_internalization * TRAFFICKING_RATE_SCALE,
        }
    }

    /// No trafficking configured; the patch falls back to half-life decay.
    pub const fn blank() -> Self {
        Self {
            secretion: 0.0,
            unbound_internalization: 0.0,
            bound_internalization: 0.0,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.secretion == 0.0
            && self.unbound_internalization == 0.0
            && self.bound_internalization == 0.0
    }
}

/// Rates a body assigns to its species, optionally overridden per face.
#[derive(Clone, Debug, Default)]
pub struct TraffickingTable {
    per_species: HashMap<SpeciesId, TraffickingRates>,
    per_face: HashMap<(SpeciesId, usize), TraffickingRates>,
}

impl TraffickingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rates for `species` on every face, or on one face when `face` is given.
    pub fn set(&mut self, species: SpeciesId, face: Option<usize>, rates: TraffickingRates) {
        match face {
            Some(face) => {
                self.per_face.insert((species, face), rates);
            }
            None => {
                self.per_species.insert(species, rates);
            }
        }
    }

    /// Face override first, then the species default, otherwise blank.
    pub fn rates(&self, species: SpeciesId, face: usize) -> TraffickingRates {
        self.per_face
            .get(&(species, face))
            .or_else(|| self.per_species.get(&species))
            .copied()
            .unwrap_or_else(TraffickingRates::blank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_minute_rates_are_scaled() {
        let r = TraffickingRates::from_per_minute(10.0, 0.5, 0.25);
        assert!((r.secretion - 6.0e-6).abs() < 1e-18);
        assert!((r.unbound_internalization - 3.0e-7).abs() < 1e-18);
        assert!((r.bound_internalization - 1.5e-7).abs() < 1e-18);
        assert!(!r.is_blank());
    }

    #[test]
    fn zero_triple_is_blank() {
        assert!(TraffickingRates::from_per_minute(0.0, 0.0, 0.0).is_blank());
        assert!(TraffickingRates::blank().is_blank());
        assert!(!TraffickingRates::from_per_minute(0.0, 0.0, 1.0).is_blank());
    }

    #[test]
    fn face_override_wins() {
        let mut table = TraffickingTable::new();
        let wide = TraffickingRates::from_per_minute(1.0, 0.0, 0.0);
        let narrow = TraffickingRates::from_per_minute(2.0, 0.0, 0.0);
        table.set(SpeciesId(0), None, wide);
        table.set(SpeciesId(0), Some(3), narrow);
        assert_eq!(table.rates(SpeciesId(0), 3), narrow);
        assert_eq!(table.rates(SpeciesId(0), 1), wide);
        assert!(table.rates(SpeciesId(1), 3).is_blank());
    }
}
