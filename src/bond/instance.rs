// bond/instance.rs
// A single discrete tether: reservation of molecules, aging, breakage hazard, release

use serde::{Deserialize, Serialize};

use super::tether::{TetherHandle, TetherSink};
use crate::body::{PatchRef, SurfacePatch};
use crate::config::{
    HAZARD_ASYMPTOTE, HAZARD_ASYMPTOTE_AREA, HAZARD_ASYMPTOTE_AREA_LIMIT, HAZARD_EARLY_FRACTION,
    HAZARD_INITIAL, HAZARD_LONG_TTS_MINUTES, HAZARD_MIN_SETTLE_MINUTES,
};
use crate::random::RandomSource;
use crate::species::SpeciesId;
use crate::units::us_to_minutes;

/// Registry-assigned bond identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BondId(pub u64);

/// Shape of the breakage hazard `a·e^(-t) + c` for a stability target in minutes.
///
/// A non-positive target means the bond is stable from birth (`a = 0`).
/// `a` is floored at zero so the early-life hazard never dips below `c`.
pub fn hazard_shape(target_time_to_stable: f64) -> (f64, f64) {
    let tts = target_time_to_stable;
    if !(tts > 0.0) {
        return (0.0, HAZARD_ASYMPTOTE);
    }
    let mut c = HAZARD_ASYMPTOTE;
    if c * tts >= HAZARD_ASYMPTOTE_AREA_LIMIT {
        c = HAZARD_ASYMPTOTE_AREA / tts;
    }
    let a = if tts > HAZARD_LONG_TTS_MINUTES {
        HAZARD_INITIAL - tts * c
    } else {
        let e = tts.exp();
        (HAZARD_INITIAL - tts * c) * e / (e - 1.0)
    };
    (a.max(0.0), c)
}

/// Discrete tether between a receptor patch and a ligand patch.
///
/// Lifecycle is `Active -> Inactive`; once inactive a bond never revives.
/// The owning registry calls [`BondInstance::destroy`] after deactivation to
/// hand the reserved molecules back and drop the physics constraint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BondInstance {
    pub id: BondId,
    pub receptor: PatchRef,
    pub receptor_species: SpeciesId,
    pub ligand: PatchRef,
    pub ligand_species: SpeciesId,
    pub created_at_us: f64,
    /// Minutes
    pub target_time_to_stable: f64,
    pub a_value: f64,
    pub c_value: f64,
    /// Molecules reserved on the receptor side
    pub receptor_molecules: f64,
    /// Molecules reserved on the ligand side
    pub ligand_molecules: f64,
    /// Receptor-to-ligand plane distance at creation, µm
    pub separation: f64,
    pub tether: TetherHandle,
    active: bool,
    released: bool,
}

impl BondInstance {
    /// Create an active bond and reserve each side's molecules-per-bond.
    #[allow(clippy::too_many_arguments)]
    pub fn form(
        id: BondId,
        receptor: PatchRef,
        receptor_species: SpeciesId,
        receptor_patch: &mut SurfacePatch,
        ligand: PatchRef,
        ligand_species: SpeciesId,
        ligand_patch: &mut SurfacePatch,
        created_at_us: f64,
        target_time_to_stable: f64,
        separation: f64,
        tether: TetherHandle,
    ) -> Self {
        let receptor_molecules = receptor_patch.molecules_per_bond(receptor_species);
        let ligand_molecules = ligand_patch.molecules_per_bond(ligand_species);
        receptor_patch.make_bond(receptor_species, receptor_molecules);
        ligand_patch.make_bond(ligand_species, ligand_molecules);
        let (a_value, c_value) = hazard_shape(target_time_to_stable);
        Self {
            id,
            receptor,
            receptor_species,
            ligand,
            ligand_species,
            created_at_us,
            target_time_to_stable,
            a_value,
            c_value,
            receptor_molecules,
            ligand_molecules,
            separation,
            tether,
            active: true,
            released: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Age in minutes at `now_us`; clock anomalies read as zero.
    pub fn lifetime_minutes(&self, now_us: f64) -> f64 {
        us_to_minutes((now_us - self.created_at_us).max(0.0))
    }

    /// Per-minute breakage probability at age `t` minutes.
    pub fn break_rate(&self, t: f64) -> f64 {
        let tts = self.target_time_to_stable;
        if t < HAZARD_EARLY_FRACTION * tts || t < HAZARD_MIN_SETTLE_MINUTES {
            self.a_value / t.exp() + self.c_value
        } else {
            self.c_value
        }
    }

    /// Age the bond by one tick and roll for breakage. Returns whether it is still active.
    pub fn update(&mut self, now_us: f64, dt_us: f64, rng: &mut dyn RandomSource) -> bool {
        if !self.active {
            return false;
        }
        let t = self.lifetime_minutes(now_us);
        let prob_to_break = self.break_rate(t) * us_to_minutes(dt_us.max(0.0));
        if rng.next_unit() <= prob_to_break {
            self.active = false;
            log::debug!(
                "bond {:?} broke at {:.2} min (p = {:.4})",
                self.id,
                t,
                prob_to_break
            );
        }
        self.active
    }

    /// Share of the reserved molecules handed back when released at `now_us`:
    /// all of them at birth, none once the stability target is reached.
    pub fn return_fraction(&self, now_us: f64) -> f64 {
        let tts = self.target_time_to_stable;
        if !(tts > 0.0) {
            return 0.0;
        }
        (1.0 - self.lifetime_minutes(now_us) / tts).clamp(0.0, 1.0)
    }

    /// Deactivate, return the unconsumed molecules to both patches and detach the tether.
    /// Releasing twice is a no-op.
    pub fn destroy(
        &mut self,
        now_us: f64,
        receptor_patch: &mut SurfacePatch,
        ligand_patch: &mut SurfacePatch,
        tethers: &mut dyn TetherSink,
    ) {
        if self.released {
            return;
        }
        self.active = false;
        self.released = true;
        let fraction = self.return_fraction(now_us);
        receptor_patch.remove_bond(self.receptor_species, fraction * self.receptor_molecules);
        ligand_patch.remove_bond(self.ligand_species, fraction * self.ligand_molecules);
        tethers.detach(self.tether);
    }

    /// Drop the tether without touching populations, for bonds whose patches are gone.
    pub fn abandon(&mut self, tethers: &mut dyn TetherSink) {
        if self.released {
            return;
        }
        self.active = false;
        self.released = true;
        tethers.detach(self.tether);
    }
}
