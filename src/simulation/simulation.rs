// simulation/simulation.rs
// Contains the Simulation struct and the per-tick loop (patch kinetics, contacts, bond formation, bond aging)

use rayon::prelude::*;
use ultraviolet::DIsometry3;

use crate::body::{two_bodies_mut, Body, BodyId, BodyKind, PatchRef, SurfaceMesh};
use crate::bond::{BondFormationEngine, BondRegistry, FormationSite, TetherLedger, TetherSink};
use crate::cell_list::{CellList, FaceContact};
use crate::config::SimConfig;
use crate::gradient::GradientRegistry;
use crate::profile_scope;
use crate::random::{RandomSource, SeededRandom};
use crate::species::{SpeciesId, SpeciesRegistry};

/// What one tick did to the bond population.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    pub frame: usize,
    /// Clock after the tick, µs
    pub time_us: f64,
    pub formed: usize,
    pub broken: usize,
    pub active: usize,
}

/// Owns every body, the species and gradient tables, the bond registry and
/// the random stream of one simulation run.
pub struct Simulation {
    pub frame: usize,
    /// Simulated time, µs
    pub time_us: f64,
    pub bodies: Vec<Body>,
    pub species: SpeciesRegistry,
    pub gradients: GradientRegistry,
    pub bonds: BondRegistry,
    pub formation: BondFormationEngine,
    pub cell_list: CellList,
    pub config: SimConfig,
    rng: Box<dyn RandomSource>,
    tethers: Box<dyn TetherSink>,
}

impl Simulation {
    pub fn new(config: SimConfig, species: SpeciesRegistry, gradients: GradientRegistry) -> Self {
        let rng = SeededRandom::new(config.seed);
        let cell_list = CellList::new(config.contact_range);
        Self {
            frame: 0,
            time_us: 0.0,
            bodies: Vec::new(),
            species,
            gradients,
            bonds: BondRegistry::new(),
            formation: BondFormationEngine::new(),
            cell_list,
            config,
            rng: Box::new(rng),
            tethers: Box::new(TetherLedger::new()),
        }
    }

    /// Replace the random stream, e.g. with a scripted one in tests.
    pub fn with_random(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    /// Route tether creation to a physics engine instead of the in-memory ledger.
    pub fn with_tether_sink(mut self, tethers: Box<dyn TetherSink>) -> Self {
        self.tethers = tethers;
        self
    }

    /// Insert a body; its id is its arena index.
    pub fn add_body(&mut self, name: impl Into<String>, kind: BodyKind, pose: DIsometry3, mesh: SurfaceMesh) -> BodyId {
        let id = BodyId(self.bodies.len() as u32);
        self.bodies.push(Body::new(id, name, kind, pose, mesh));
        id
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.0 as usize)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id.0 as usize)
    }

    pub fn body_by_name(&self, name: &str) -> Option<&Body> {
        self.bodies.iter().find(|b| b.name == name)
    }

    /// Unbound + bound `species` summed over every body.
    pub fn total_molecules(&self, species: SpeciesId) -> f64 {
        self.bodies.iter().map(|b| b.total_molecules(species)).sum()
    }

    /// Coated face pairs on different bodies within `contact_range`.
    pub fn find_contacts(&mut self) -> Vec<FaceContact> {
        profile_scope!("find_contacts");
        if (self.cell_list.cell_size - self.config.contact_range).abs() > f64::EPSILON {
            self.cell_list = CellList::new(self.config.contact_range);
        }
        self.cell_list.rebuild(&self.bodies);
        self.cell_list.contacts_within(self.config.contact_range)
    }

    /// Advance one tick of `dt_us`, finding contacts with the built-in cell list.
    pub fn step(&mut self, dt_us: f64) -> StepReport {
        profile_scope!("simulation_step");
        self.update_patches(dt_us);
        let contacts = self.find_contacts();
        self.finish_step(dt_us, &contacts)
    }

    /// Advance one tick using contacts supplied by an external collision pass.
    pub fn step_with_contacts(&mut self, dt_us: f64, contacts: &[FaceContact]) -> StepReport {
        profile_scope!("simulation_step");
        self.update_patches(dt_us);
        self.finish_step(dt_us, contacts)
    }

    fn update_patches(&mut self, dt_us: f64) {
        profile_scope!("patch_update");
        let now = self.time_us;
        let species = &self.species;
        let gradients = &self.gradients;
        if self.config.parallel_patches {
            self.bodies
                .par_iter_mut()
                .for_each(|body| body.update_patches(now, dt_us, species, gradients));
        } else {
            for body in &mut self.bodies {
                body.update_patches(now, dt_us, species, gradients);
            }
        }
    }

    fn finish_step(&mut self, dt_us: f64, contacts: &[FaceContact]) -> StepReport {
        self.formation.reset_stats();
        let formed = self.form_bonds(dt_us, contacts);

        let end = self.time_us + dt_us;
        let broken = {
            profile_scope!("bond_aging");
            self.bonds.age(end, dt_us, self.rng.as_mut());
            self.bonds.reap(end, &mut self.bodies, self.tethers.as_mut())
        };

        self.time_us = end;
        self.frame += 1;
        let report = StepReport {
            frame: self.frame,
            time_us: self.time_us,
            formed,
            broken,
            active: self.bonds.active_count(),
        };
        if formed > 0 || broken > 0 {
            log::debug!(
                "frame {}: +{} bonds, -{} bonds, {} active",
                report.frame,
                formed,
                broken,
                report.active
            );
        }
        report
    }

    /// Run formation for every structural relation over every contact, both ways round.
    fn form_bonds(&mut self, dt_us: f64, contacts: &[FaceContact]) -> usize {
        profile_scope!("form_bonds");
        let mut formed = 0;
        for contact in contacts {
            for (receptor, ligand) in [(contact.first, contact.second), (contact.second, contact.first)] {
                formed += self.form_between(receptor, ligand, dt_us);
            }
        }
        formed
    }

    fn form_between(&mut self, receptor: PatchRef, ligand: PatchRef, dt_us: f64) -> usize {
        let now = self.time_us;
        let Some((receptor_body, ligand_body)) =
            two_bodies_mut(&mut self.bodies, receptor.body.0 as usize, ligand.body.0 as usize)
        else {
            return 0;
        };
        let mut formed = 0;
        for relation in self.species.structural_relations() {
            let bonds = self.formation.form(
                FormationSite {
                    receptor_body: &mut *receptor_body,
                    receptor_face: receptor.face,
                    ligand_body: &mut *ligand_body,
                    ligand_face: ligand.face,
                    relation,
                },
                now,
                dt_us,
                self.rng.as_mut(),
                self.tethers.as_mut(),
                self.bonds.ids_mut(),
            );
            formed += bonds.len();
            self.bonds.extend(bonds);
        }
        formed
    }

    /// Release every bond, handing unconsumed molecules back. Called at shutdown.
    pub fn release_all_bonds(&mut self) -> usize {
        let released = self
            .bonds
            .release_all(self.time_us, &mut self.bodies, self.tethers.as_mut());
        if released > 0 {
            log::info!("released {} bonds at t = {:.1} s", released, self.time_us * 1e-6);
        }
        released
    }
}
