// scenario.rs
// Builds a ready-to-run Simulation from a validated scenario description

use std::path::Path;

use crate::gradient::{DiffusionSource, GradientField, GradientRegistry, SampledGradient};
use crate::init_config::{GradientConfig, InitConfig};
use crate::error::ConfigError;
use crate::simulation::Simulation;
use crate::species::{BindingRelation, SpeciesRegistry, SpeciesSpec};
use crate::trafficking::TraffickingRates;

/// Load `path`, validate it and build the simulation it describes.
/// Sampled gradient tables resolve relative to the scenario's directory.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Simulation, ConfigError> {
    let path = path.as_ref();
    let init_config = InitConfig::load_from_file(path)?;
    log::info!("Loaded scenario from {}", path.display());
    build_simulation(&init_config, path.parent())
}

pub fn build_simulation(init_config: &InitConfig, base_dir: Option<&Path>) -> Result<Simulation, ConfigError> {
    init_config.validate()?;

    let mut species = SpeciesRegistry::new();
    for s in &init_config.species {
        species.register(SpeciesSpec {
            name: s.name.clone(),
            binds_surface: s.binds_surface,
            membrane_bound: s.membrane_bound,
            diffusible: s.diffusible,
            half_life_minutes: s.half_life_minutes,
            color: s.color,
        })?;
    }
    let lookup = |registry: &SpeciesRegistry, name: &str| {
        registry
            .find_by_name(name)
            .ok_or_else(|| ConfigError::UnknownSpecies(name.to_string()))
    };

    for r in &init_config.relations {
        let receptor = lookup(&species, &r.receptor)?;
        let ligand = lookup(&species, &r.ligand)?;
        species.add_relation(BindingRelation::new(
            receptor,
            ligand,
            r.kon,
            r.koff,
            r.structural,
            r.bond_length,
            r.time_to_stable,
        )?)?;
    }

    let mut gradients = GradientRegistry::new();
    for g in &init_config.gradients {
        let id = lookup(&species, g.species())?;
        let field = match g {
            GradientConfig::Constant { concentration, .. } => GradientField::Constant {
                concentration: *concentration,
            },
            GradientConfig::Sampled { path, .. } => {
                let resolved = match base_dir {
                    Some(dir) if path.is_relative() => dir.join(path),
                    _ => path.clone(),
                };
                GradientField::Sampled(SampledGradient::from_json_file(&resolved)?)
            }
            GradientConfig::Diffusion {
                origin,
                release_rate,
                diffusion_coefficient,
                ..
            } => {
                log::warn!(
                    "diffusion gradient for '{}' has no solver and reads as zero",
                    g.species()
                );
                GradientField::Diffusion(DiffusionSource {
                    origin: *origin,
                    release_rate: *release_rate,
                    diffusion_coefficient: *diffusion_coefficient,
                })
            }
        };
        gradients.insert(id, field);
    }

    let mut sim = Simulation::new(init_config.simulation.clone(), species, gradients);

    for b in &init_config.bodies {
        let mesh = b.shape.build_mesh()?;
        let face_count = mesh.face_count();
        let id = sim.add_body(b.name.clone(), b.kind, b.pose(), mesh);

        for coating in &b.coatings {
            let species_id = lookup(&sim.species, &coating.species)?;
            let faces: Vec<usize> = match &coating.faces {
                Some(faces) => faces.clone(),
                None => (0..face_count).collect(),
            };
            let body = sim
                .body_mut(id)
                .ok_or_else(|| ConfigError::UnknownBody(b.name.clone()))?;
            for face in faces {
                if !body.coat(face, species_id, coating.count, coating.capacity, coating.molecules_per_bond) {
                    return Err(ConfigError::invalid(
                        format!("bodies.{}.coatings", b.name),
                        format!("face {} does not exist", face),
                    ));
                }
            }
        }

        for t in &b.trafficking {
            let species_id = lookup(&sim.species, &t.species)?;
            let rates = TraffickingRates::from_per_minute(t.secretion, t.unbound_internalization, t.bound_internalization);
            sim.body_mut(id)
                .ok_or_else(|| ConfigError::UnknownBody(b.name.clone()))?
                .set_trafficking(species_id, t.face, rates);
        }

        log::info!(
            "Added {:?} '{}' with {} faces and {} coated patches",
            b.kind,
            b.name,
            face_count,
            sim.body(id).map(|body| body.patches.len()).unwrap_or(0)
        );
    }

    log::info!(
        "Scenario ready: {} species, {} bodies, {} gradient fields",
        sim.species.len(),
        sim.bodies.len(),
        init_config.gradients.len()
    );
    Ok(sim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::seconds_to_us;

    const SCENARIO: &str = r#"
[simulation]
seed = 11
contact_range = 2.0
parallel_patches = false

[[species]]
name = "LFA1"

[[species]]
name = "ICAM1"

[[relations]]
receptor = "LFA1"
ligand = "ICAM1"
kon = 1e-3
koff = 1e-4
structural = true
bond_length = 1.5
time_to_stable = 30.0

[[bodies]]
name = "cell"
kind = "cell"
shape = { type = "quad", width = 1.0, height = 1.0 }

[[bodies.coatings]]
species = "LFA1"
count = 10000.0
capacity = 100000.0

[[bodies]]
name = "wall"
kind = "wall"
position = [0.0, 0.0, 1.0]
rotation = [180.0, 0.0, 0.0]
shape = { type = "quad", width = 1.0, height = 1.0 }

[[bodies.coatings]]
species = "ICAM1"
count = 10000.0
capacity = 100000.0

[[bodies.trafficking]]
species = "ICAM1"
face = 1
secretion = 1.0

[[gradients]]
species = "ICAM1"
kind = "constant"
concentration = 5.0
"#;

    #[test]
    fn builds_bodies_patches_and_relations() {
        let config = InitConfig::from_toml_str(SCENARIO).unwrap();
        let sim = build_simulation(&config, None).unwrap();
        assert_eq!(sim.bodies.len(), 2);
        assert_eq!(sim.species.structural_relations().count(), 1);
        let cell = sim.body_by_name("cell").unwrap();
        assert_eq!(cell.patches.len(), 2);
        let lfa = sim.species.find_by_name("LFA1").unwrap();
        assert_eq!(cell.total_molecules(lfa), 20_000.0);

        let wall = sim.body_by_name("wall").unwrap();
        let icam = sim.species.find_by_name("ICAM1").unwrap();
        assert!(wall.trafficking(icam, 0).is_blank());
        assert!(!wall.trafficking(icam, 1).is_blank());
        assert!((wall.segment_world_normal(0).unwrap().z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn built_scenario_forms_bonds() {
        let config = InitConfig::from_toml_str(SCENARIO).unwrap();
        let mut sim = build_simulation(&config, None).unwrap();
        let report = sim.step(seconds_to_us(1.0));
        assert!(report.formed > 0);
    }

    #[test]
    fn missing_gradient_table_is_an_io_error() {
        let with_table = SCENARIO.replace(
            "kind = \"constant\"\nconcentration = 5.0",
            "kind = \"sampled\"\npath = \"no_such_table.json\"",
        );
        let config = InitConfig::from_toml_str(&with_table).unwrap();
        assert!(matches!(
            build_simulation(&config, Some(Path::new("/nonexistent"))),
            Err(ConfigError::Io(_))
        ));
    }
}
