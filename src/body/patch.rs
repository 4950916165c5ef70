// body/patch.rs
// Per-face population ledger and the explicit integrator that advances it each tick

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use ultraviolet::DVec3;

use super::types::BodyId;
use crate::gradient::GradientRegistry;
use crate::species::{SpeciesId, SpeciesRegistry};
use crate::trafficking::TraffickingTable;
use crate::units::us_to_minutes;

type Slots<T> = SmallVec<[T; 4]>;

/// Bound/unbound molecule counts for every species coated on one face.
///
/// Slots are parallel arrays indexed by the value `protein_index` returns.
/// After `update`, each slot satisfies `0 <= unbound`, `0 <= bound` and
/// `unbound + bound <= capacity`; bond release may overshoot capacity
/// until the next update clamps it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfacePatch {
    /// Owning body (not an ownership link)
    pub body: BodyId,
    /// Face index on the owning body's mesh
    pub face: usize,
    species: Slots<SpeciesId>,
    unbound: Slots<f64>,
    bound: Slots<f64>,
    capacity: Slots<f64>,
    molecules_per_bond: Slots<f64>,
}

impl SurfacePatch {
    pub fn new(body: BodyId, face: usize) -> Self {
        Self {
            body,
            face,
            species: SmallVec::new(),
            unbound: SmallVec::new(),
            bound: SmallVec::new(),
            capacity: SmallVec::new(),
            molecules_per_bond: SmallVec::new(),
        }
    }

    /// Add `count` unbound molecules of `species`, creating the slot on first use.
    /// A later coating raises the capacity if it is larger and keeps the slot's
    /// molecules-per-bond.
    pub fn coat(&mut self, species: SpeciesId, count: f64, capacity: f64, molecules_per_bond: f64) -> usize {
        match self.protein_index(species) {
            Some(i) => {
                self.capacity[i] = self.capacity[i].max(capacity);
                self.unbound[i] = (self.unbound[i] + count.max(0.0))
                    .min((self.capacity[i] - self.bound[i]).max(0.0));
                i
            }
            None => {
                let capacity = capacity.max(0.0);
                self.species.push(species);
                self.unbound.push(count.max(0.0).min(capacity));
                self.bound.push(0.0);
                self.capacity.push(capacity);
                self.molecules_per_bond.push(molecules_per_bond.max(0.0));
                self.species.len() - 1
            }
        }
    }

    pub fn protein_index(&self, species: SpeciesId) -> Option<usize> {
        self.species.iter().position(|&s| s == species)
    }

    pub fn species(&self) -> &[SpeciesId] {
        &self.species
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn unbound(&self, species: SpeciesId) -> f64 {
        self.protein_index(species).map(|i| self.unbound[i]).unwrap_or(0.0)
    }

    pub fn bound(&self, species: SpeciesId) -> f64 {
        self.protein_index(species).map(|i| self.bound[i]).unwrap_or(0.0)
    }

    pub fn capacity(&self, species: SpeciesId) -> f64 {
        self.protein_index(species).map(|i| self.capacity[i]).unwrap_or(0.0)
    }

    pub fn molecules_per_bond(&self, species: SpeciesId) -> f64 {
        self.protein_index(species)
            .map(|i| self.molecules_per_bond[i])
            .unwrap_or(0.0)
    }

    pub fn total(&self, species: SpeciesId) -> f64 {
        self.unbound(species) + self.bound(species)
    }

    /// Overwrite a slot's counts. Used by scenario loading and tests.
    pub fn set_counts(&mut self, species: SpeciesId, unbound: f64, bound: f64) -> bool {
        match self.protein_index(species) {
            Some(i) => {
                self.unbound[i] = unbound;
                self.bound[i] = bound;
                true
            }
            None => false,
        }
    }

    /// Move `n` molecules from unbound to bound. Unknown species are ignored.
    pub fn make_bond(&mut self, species: SpeciesId, n: f64) -> bool {
        match self.protein_index(species) {
            Some(i) => {
                self.unbound[i] -= n;
                self.bound[i] += n;
                true
            }
            None => false,
        }
    }

    /// Move `n` molecules from bound back to unbound. Unknown species are ignored.
    pub fn remove_bond(&mut self, species: SpeciesId, n: f64) -> bool {
        match self.protein_index(species) {
            Some(i) => {
                self.bound[i] -= n;
                self.unbound[i] += n;
                true
            }
            None => false,
        }
    }

    /// Advance every slot by `dt_us` microseconds.
    ///
    /// Slots whose trafficking rates are blank only decay by half-life;
    /// the rest take one forward Euler step per ligand they can bind,
    /// using the ligand's bulk concentration at `world_position`.
    pub fn update(
        &mut self,
        now_us: f64,
        dt_us: f64,
        world_position: DVec3,
        trafficking: &TraffickingTable,
        species: &SpeciesRegistry,
        gradients: &GradientRegistry,
    ) {
        for i in 0..self.species.len() {
            let id = self.species[i];
            let rates = trafficking.rates(id, self.face);

            if rates.is_blank() {
                if let Some(half_life) = species.get(id).map(|s| s.half_life_minutes) {
                    if half_life > 0.0 {
                        self.unbound[i] *= 0.5f64.powf(us_to_minutes(dt_us) / half_life);
                    }
                }
                self.clamp_slot(i);
                continue;
            }

            let qr = rates.secretion;
            let kt = rates.unbound_internalization;
            let ke = rates.bound_internalization;
            let relations = species.ligands_of(id);

            if relations.is_empty() {
                let (u, b) = (self.unbound[i], self.bound[i]);
                self.unbound[i] = u + dt_us * (-kt * u + qr);
                self.bound[i] = b + dt_us * (-ke * b);
                self.clamp_slot(i);
                continue;
            }

            for relation in relations {
                let conc = gradients.concentration(relation.ligand, now_us, world_position);
                let (u, b) = (self.unbound[i], self.bound[i]);
                let binding = relation.kon * u * conc;
                let release = relation.koff * b;
                self.unbound[i] = u + dt_us * (-binding + release - kt * u + qr);
                self.bound[i] = b + dt_us * (binding - release - ke * b);
                self.clamp_slot(i);
            }
        }
    }

    fn clamp_slot(&mut self, i: usize) {
        self.unbound[i] = self.unbound[i].max(0.0);
        self.bound[i] = self.bound[i].clamp(0.0, self.capacity[i].max(0.0));
        let room = (self.capacity[i] - self.bound[i]).max(0.0);
        if self.unbound[i] > room {
            self.unbound[i] = room;
        }
    }
}
