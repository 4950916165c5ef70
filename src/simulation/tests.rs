// simulation/tests.rs
// Whole-tick tests: two coated plates facing each other across a small gap

use super::simulation::Simulation;
use crate::body::{BodyId, BodyKind, PatchRef, SurfaceMesh};
use crate::bond::expected_bonds;
use crate::cell_list::FaceContact;
use crate::config::SimConfig;
use crate::gradient::{GradientField, GradientRegistry};
use crate::species::{BindingRelation, SpeciesId, SpeciesRegistry, SpeciesSpec};
use crate::units::{seconds_to_us, MOLECULES_PER_CUBIC_MICRON_TO_NANOMOLAR};
use std::f64::consts::PI;
use ultraviolet::{DIsometry3, DRotor3, DVec3};

struct Plates {
    sim: Simulation,
    receptor: SpeciesId,
    ligand: SpeciesId,
}

/// Unit square coated with receptor at z = 0 facing up, and a unit square
/// coated with ligand at z = `gap` facing down. Both halves of each square are coated.
fn plates(gap: f64, receptors_per_face: f64, ligands_per_face: f64, parallel: bool) -> Plates {
    let mut species = SpeciesRegistry::new();
    let receptor = species.register(SpeciesSpec::new("LFA1", f64::INFINITY)).unwrap();
    let ligand = species.register(SpeciesSpec::new("ICAM1", f64::INFINITY)).unwrap();
    species
        .add_relation(BindingRelation::new(receptor, ligand, 1e-3, 1e-4, true, 1.5, 30.0).unwrap())
        .unwrap();
    let mut gradients = GradientRegistry::new();
    gradients.insert(ligand, GradientField::Constant { concentration: 5.0 });

    let config = SimConfig {
        seed: 42,
        contact_range: 2.0,
        parallel_patches: parallel,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config, species, gradients);
    let cell = sim.add_body("cell", BodyKind::Cell, DIsometry3::identity(), SurfaceMesh::quad(1.0, 1.0));
    let wall = sim.add_body(
        "wall",
        BodyKind::Wall,
        DIsometry3::new(DVec3::new(0.0, 0.0, gap), DRotor3::from_rotation_yz(PI)),
        SurfaceMesh::quad(1.0, 1.0),
    );
    for face in 0..2 {
        sim.body_mut(cell).unwrap().coat(face, receptor, receptors_per_face, 1.0e6, 10.0);
        sim.body_mut(wall).unwrap().coat(face, ligand, ligands_per_face, 1.0e6, 10.0);
    }
    Plates { sim, receptor, ligand }
}

#[test]
fn one_second_tick_matches_mass_action_closed_form() {
    // Ligand count on a half-square face that reads as 5 nM in the 0.5 × 1.5 µm³ binding slab.
    let ligands = 5.0 * 0.5 * 1.5 / MOLECULES_PER_CUBIC_MICRON_TO_NANOMOLAR;
    let mut p = plates(1.0, 1000.0, ligands, true);
    let report = p.sim.step(seconds_to_us(1.0));

    let kon = p.sim.species.relation(p.receptor, p.ligand).unwrap().kon;
    let per_pair = expected_bonds(seconds_to_us(1.0), kon, 1000.0, 5.0, 10.0);
    assert!((per_pair - 0.5).abs() < 1e-12);

    // Two receptor faces, each in range of both ligand faces.
    assert!((p.sim.formation.stats.expected - 4.0 * per_pair).abs() < 1e-9);
    assert_eq!(report.formed, 0);
    assert_eq!(report.frame, 1);
    assert_eq!(report.time_us, seconds_to_us(1.0));
}

#[test]
fn bonds_form_across_the_gap_and_conserve_molecules() {
    let mut p = plates(1.0, 10_000.0, 10_000.0, true);
    let before_r = p.sim.total_molecules(p.receptor);
    let before_l = p.sim.total_molecules(p.ligand);

    let report = p.sim.step(seconds_to_us(1.0));
    assert!(report.formed > 0);
    assert_eq!(report.active, p.sim.bonds.len());
    assert_eq!(report.formed, report.broken + report.active);
    assert_eq!(p.sim.formation.stats.out_of_range, 0);
    for bond in p.sim.bonds.iter() {
        assert_eq!(bond.receptor.body, BodyId(0));
        assert_eq!(bond.ligand.body, BodyId(1));
        assert!((bond.separation - 1.0).abs() < 1e-9);
    }
    let bound: f64 = p.sim.bodies[0].patches.iter().map(|patch| patch.bound(p.receptor)).sum();
    assert!(bound > 0.0);

    for _ in 0..30 {
        p.sim.step(seconds_to_us(1.0));
        assert!((p.sim.total_molecules(p.receptor) - before_r).abs() < 1e-6);
        assert!((p.sim.total_molecules(p.ligand) - before_l).abs() < 1e-6);
    }

    let live = p.sim.bonds.len();
    assert_eq!(p.sim.release_all_bonds(), live);
    assert!(p.sim.bonds.is_empty());
    assert!((p.sim.total_molecules(p.receptor) - before_r).abs() < 1e-6);
}

#[test]
fn gap_beyond_bond_length_forms_nothing() {
    let mut p = plates(1.8, 10_000.0, 10_000.0, false);
    let report = p.sim.step(seconds_to_us(1.0));
    assert_eq!(report.formed, 0);
    assert!(p.sim.formation.stats.out_of_range > 0);
}

#[test]
fn distant_bodies_have_no_contacts() {
    let mut p = plates(5.0, 10_000.0, 10_000.0, true);
    assert!(p.sim.find_contacts().is_empty());
    let report = p.sim.step(seconds_to_us(1.0));
    assert_eq!(report.formed, 0);
    assert_eq!(p.sim.formation.stats.calls, 0);
}

#[test]
fn external_contacts_drive_formation() {
    let mut p = plates(1.0, 10_000.0, 10_000.0, true);
    let report = p.sim.step_with_contacts(seconds_to_us(1.0), &[]);
    assert_eq!(report.formed, 0);
    assert_eq!(p.sim.time_us, seconds_to_us(1.0));

    let contact = FaceContact {
        first: PatchRef { body: BodyId(1), face: 0 },
        second: PatchRef { body: BodyId(0), face: 0 },
        distance: 1.0,
    };
    let report = p.sim.step_with_contacts(seconds_to_us(1.0), &[contact]);
    assert!(report.formed > 0);
    for bond in p.sim.bonds.iter() {
        assert_eq!(bond.receptor, PatchRef { body: BodyId(0), face: 0 });
        assert_eq!(bond.ligand, PatchRef { body: BodyId(1), face: 0 });
    }
}

#[test]
fn same_seed_same_history() {
    let mut a = plates(1.0, 5_000.0, 5_000.0, true);
    let mut b = plates(1.0, 5_000.0, 5_000.0, false);
    for _ in 0..20 {
        assert_eq!(a.sim.step(seconds_to_us(1.0)), b.sim.step(seconds_to_us(1.0)));
    }
}
