// bond/formation.rs
// Mass-action bond expectation and stochastic, geometrically placed tether creation

use serde::{Deserialize, Serialize};
use ultraviolet::DVec3;

use super::instance::{BondId, BondInstance};
use super::tether::{TetherAnchor, TetherSink};
use crate::body::{Body, PatchRef};
use crate::profile_scope;
use crate::random::RandomSource;
use crate::species::BindingRelation;
use crate::units::count_to_nanomolar;

/// Redraws allowed when the two barycentric draws coincide.
const MAX_BARYCENTRIC_REDRAWS: usize = 16;

/// Ligand concentration (nM) seen by a receptor face of `binding_area`.
///
/// Only the share `min(binding_area / ligand_area, 1)` of the ligand patch
/// is reachable; it is spread through the slab `binding_area × bond_length`.
pub fn ligand_concentration_nm(
    ligand_count: f64,
    ligand_area: f64,
    binding_area: f64,
    bond_length: f64,
) -> f64 {
    if !(ligand_area > 0.0) || !(binding_area > 0.0) || !(bond_length > 0.0) {
        return 0.0;
    }
    let reachable = (binding_area / ligand_area).min(1.0);
    count_to_nanomolar(ligand_count.max(0.0) * reachable, binding_area * bond_length)
}

/// Expected number of new bonds this tick from mass action.
pub fn expected_bonds(
    dt_us: f64,
    kon: f64,
    unbound_receptors: f64,
    ligand_nm: f64,
    molecules_per_bond: f64,
) -> f64 {
    if !(molecules_per_bond > 0.0) {
        return 0.0;
    }
    (dt_us * kon * unbound_receptors * ligand_nm / molecules_per_bond).max(0.0)
}

/// Uniform point on triangle `[a, b, c]` from two draws.
///
/// Equal draws are redrawn; pairs outside the triangle are reflected back in.
pub fn sample_triangle(tri: [DVec3; 3], rng: &mut dyn RandomSource) -> DVec3 {
    let mut r = rng.next_unit();
    let mut t = rng.next_unit();
    let mut redraws = 0;
    while r == t && redraws < MAX_BARYCENTRIC_REDRAWS {
        r = rng.next_unit();
        t = rng.next_unit();
        redraws += 1;
    }
    if r + t >= 1.0 {
        r = 1.0 - r;
        t = 1.0 - t;
    }
    let [a, b, c] = tri;
    a + (b - a) * r + (c - a) * t
}

/// Signed distance along `ray_normal` from `point` to the plane through
/// `plane_point` with normal `plane_normal`. `None` when the ray is parallel.
pub fn ray_plane_distance(
    point: DVec3,
    ray_normal: DVec3,
    plane_point: DVec3,
    plane_normal: DVec3,
) -> Option<f64> {
    let denom = plane_normal.dot(ray_normal);
    if denom == 0.0 {
        return None;
    }
    let w = point - plane_point;
    Some(-plane_normal.dot(w) / denom)
}

/// Hands out bond ids; owned by the bond registry.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BondIdAllocator {
    next: u64,
}

impl BondIdAllocator {
    pub fn next_id(&mut self) -> BondId {
        let id = BondId(self.next);
        self.next += 1;
        id
    }
}

/// Per-tick counters, reset by the orchestrator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FormationStats {
    pub calls: u64,
    /// Sum of the mass-action expectations seen this tick
    pub expected: f64,
    pub attempts: u64,
    pub formed: u64,
    pub out_of_range: u64,
    pub degenerate: u64,
    pub depleted: u64,
}

/// Turns mass-action expectations into placed bonds for receptor/ligand patch pairs.
#[derive(Clone, Debug, Default)]
pub struct BondFormationEngine {
    pub stats: FormationStats,
}

/// Everything the engine needs to know about one receptor/ligand face pair.
pub struct FormationSite<'a> {
    pub receptor_body: &'a mut Body,
    pub receptor_face: usize,
    pub ligand_body: &'a mut Body,
    pub ligand_face: usize,
    pub relation: &'a BindingRelation,
}

impl BondFormationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_stats(&mut self) {
        self.stats = FormationStats::default();
    }

    /// Attempt up to `floor(expected_bonds)` placements for one site this tick.
    ///
    /// Each attempt samples a point on the receptor face and accepts it when
    /// the ligand plane lies within `[0, bond_length]` along the receptor
    /// normal. Failed placements are not retried.
    pub fn form(
        &mut self,
        site: FormationSite<'_>,
        now_us: f64,
        dt_us: f64,
        rng: &mut dyn RandomSource,
        tethers: &mut dyn TetherSink,
        ids: &mut BondIdAllocator,
    ) -> Vec<BondInstance> {
        profile_scope!("bond_formation");
        self.stats.calls += 1;
        let FormationSite {
            receptor_body,
            receptor_face,
            ligand_body,
            ligand_face,
            relation,
        } = site;
        let mut formed = Vec::new();

        let (Some(n_r), Some(n_l)) = (
            receptor_body.segment_world_normal(receptor_face),
            ligand_body.segment_world_normal(ligand_face),
        ) else {
            self.stats.degenerate += 1;
            log::debug!(
                "skipping bond formation: face without a normal ({} #{} / {} #{})",
                receptor_body.name,
                receptor_face,
                ligand_body.name,
                ligand_face
            );
            return formed;
        };
        if n_l.dot(n_r) == 0.0 {
            self.stats.degenerate += 1;
            log::debug!(
                "skipping bond formation: {} #{} perpendicular to {} #{}",
                receptor_body.name,
                receptor_face,
                ligand_body.name,
                ligand_face
            );
            return formed;
        }

        let binding_area = receptor_body.segment_area(receptor_face);
        if binding_area == 0.0 {
            self.stats.degenerate += 1;
            log::debug!("skipping bond formation: {} #{} has zero area", receptor_body.name, receptor_face);
            return formed;
        }
        let ligand_area = ligand_body.segment_area(ligand_face);

        let (Some(receptor_tri), Some(ligand_tri)) = (
            receptor_body.world_coordinates(receptor_face),
            ligand_body.world_coordinates(ligand_face),
        ) else {
            return formed;
        };

        let (unbound_receptors, receptor_mpb) = match receptor_body.patch(receptor_face) {
            Some(p) if p.protein_index(relation.receptor).is_some() => (
                p.unbound(relation.receptor),
                p.molecules_per_bond(relation.receptor),
            ),
            _ => return formed,
        };
        let (unbound_ligands, ligand_mpb) = match ligand_body.patch(ligand_face) {
            Some(p) if p.protein_index(relation.ligand).is_some() => {
                (p.unbound(relation.ligand), p.molecules_per_bond(relation.ligand))
            }
            _ => return formed,
        };

        let ligand_nm =
            ligand_concentration_nm(unbound_ligands, ligand_area, binding_area, relation.bond_length);
        let max_bonds = expected_bonds(dt_us, relation.kon, unbound_receptors, ligand_nm, receptor_mpb);
        self.stats.expected += max_bonds;
        let attempts = max_bonds.floor() as usize;
        let receptor_ref = PatchRef {
            body: receptor_body.id,
            face: receptor_face,
        };
        let ligand_ref = PatchRef {
            body: ligand_body.id,
            face: ligand_face,
        };

        for _ in 0..attempts {
            let (Some(rp), Some(lp)) = (
                receptor_body.patch(receptor_face),
                ligand_body.patch(ligand_face),
            ) else {
                break;
            };
            if rp.unbound(relation.receptor) < receptor_mpb || lp.unbound(relation.ligand) < ligand_mpb {
                self.stats.depleted += 1;
                break;
            }

            self.stats.attempts += 1;
            let point = sample_triangle(receptor_tri, rng);
            let Some(s) = ray_plane_distance(point, n_r, ligand_tri[0], n_l) else {
                break;
            };
            if !(0.0..=relation.bond_length).contains(&s) {
                self.stats.out_of_range += 1;
                continue;
            }
            let projection = point + n_r * s;

            let tether = tethers.attach(
                TetherAnchor {
                    body: receptor_body.id,
                    position: receptor_body.to_local(point),
                    axis: receptor_body.direction_to_local(n_r),
                },
                TetherAnchor {
                    body: ligand_body.id,
                    position: ligand_body.to_local(projection),
                    axis: ligand_body.direction_to_local(-n_r),
                },
                s,
            );

            let (Some(receptor_patch), Some(ligand_patch)) = (
                receptor_body.patch_mut(receptor_face),
                ligand_body.patch_mut(ligand_face),
            ) else {
                tethers.detach(tether);
                break;
            };
            let bond = BondInstance::form(
                ids.next_id(),
                receptor_ref,
                relation.receptor,
                receptor_patch,
                ligand_ref,
                relation.ligand,
                ligand_patch,
                now_us,
                relation.target_time_to_stable,
                s,
                tether,
            );
            self.stats.formed += 1;
            formed.push(bond);
        }

        if !formed.is_empty() {
            log::debug!(
                "{} bonds {} #{} -> {} #{} (expected {:.3})",
                formed.len(),
                receptor_body.name,
                receptor_face,
                ligand_body.name,
                ligand_face,
                max_bonds
            );
        }
        formed
    }
}
