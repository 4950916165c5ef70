// bond/registry.rs
// Owns every live bond; ages them each tick and reaps the broken ones

use serde::{Deserialize, Serialize};

use super::formation::BondIdAllocator;
use super::instance::{BondId, BondInstance};
use super::tether::TetherSink;
use crate::body::{patch_pair_mut, Body, PatchRef};
use crate::random::RandomSource;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BondRegistry {
    bonds: Vec<BondInstance>,
    ids: BondIdAllocator,
}

impl BondRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids_mut(&mut self) -> &mut BondIdAllocator {
        &mut self.ids
    }

    pub fn extend(&mut self, bonds: impl IntoIterator<Item = BondInstance>) {
        self.bonds.extend(bonds);
    }

    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.bonds.iter().filter(|b| b.is_active()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BondInstance> {
        self.bonds.iter()
    }

    pub fn get(&self, id: BondId) -> Option<&BondInstance> {
        self.bonds.iter().find(|b| b.id == id)
    }

    /// Bonds touching `patch` on either side.
    pub fn on_patch(&self, patch: PatchRef) -> impl Iterator<Item = &BondInstance> {
        self.bonds
            .iter()
            .filter(move |b| b.receptor == patch || b.ligand == patch)
    }

    /// Roll every active bond for breakage at the end of the tick. Returns how many broke.
    pub fn age(&mut self, now_us: f64, dt_us: f64, rng: &mut dyn RandomSource) -> usize {
        let mut broken = 0;
        for bond in self.bonds.iter_mut().filter(|b| b.is_active()) {
            if !bond.update(now_us, dt_us, rng) {
                broken += 1;
            }
        }
        broken
    }

    /// Release every inactive bond back into its patches and drop it. Returns how many were removed.
    pub fn reap(&mut self, now_us: f64, bodies: &mut [Body], tethers: &mut dyn TetherSink) -> usize {
        let before = self.bonds.len();
        self.bonds.retain_mut(|bond| {
            if bond.is_active() {
                return true;
            }
            release(bond, now_us, bodies, tethers);
            false
        });
        before - self.bonds.len()
    }

    /// Deactivate and release every bond, e.g. at shutdown. Returns how many were released.
    pub fn release_all(&mut self, now_us: f64, bodies: &mut [Body], tethers: &mut dyn TetherSink) -> usize {
        let count = self.bonds.len();
        for mut bond in self.bonds.drain(..) {
            release(&mut bond, now_us, bodies, tethers);
        }
        count
    }
}

fn release(bond: &mut BondInstance, now_us: f64, bodies: &mut [Body], tethers: &mut dyn TetherSink) {
    match patch_pair_mut(bodies, bond.receptor, bond.ligand) {
        Some((receptor, ligand)) => bond.destroy(now_us, receptor, ligand, tethers),
        None => {
            log::warn!(
                "bond {:?} lost its patches ({:?} / {:?}); dropping tether only",
                bond.id,
                bond.receptor,
                bond.ligand
            );
            bond.abandon(tethers);
        }
    }
}
