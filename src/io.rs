use crate::profile_scope;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

use crate::body::{BodyId, SurfacePatch};
use crate::bond::BondRegistry;
use crate::config::SimConfig;
use crate::error::SnapshotError;
use crate::simulation::Simulation;

/// Patch populations, live bonds and the clock of one simulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub config: SimConfig,
    #[serde(default)]
    pub frame: usize,
    #[serde(default)]
    pub time_us: f64,
    pub bodies: Vec<BodySnapshot>,
    pub bonds: BondRegistry,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub name: String,
    pub position: [f64; 3],
    pub patches: Vec<SurfacePatch>,
}

impl SimulationSnapshot {
    pub fn from_simulation(sim: &Simulation) -> Self {
        Self {
            config: sim.config.clone(),
            frame: sim.frame,
            time_us: sim.time_us,
            bodies: sim
                .bodies
                .iter()
                .map(|b| {
                    let p = b.world_position();
                    BodySnapshot {
                        id: b.id,
                        name: b.name.clone(),
                        position: [p.x, p.y, p.z],
                        patches: b.patches.clone(),
                    }
                })
                .collect(),
            bonds: sim.bonds.clone(),
        }
    }

    /// Restore populations, bonds and the clock onto a simulation built from the same scenario.
    /// Tethers of restored bonds are not re-created in the physics engine.
    pub fn apply_to(self, sim: &mut Simulation) {
        sim.config = self.config;
        sim.frame = self.frame;
        sim.time_us = self.time_us;
        for saved in self.bodies {
            match sim.body_mut(saved.id) {
                Some(body) if body.name == saved.name => body.patches = saved.patches,
                _ => log::warn!("snapshot body {:?} '{}' has no match; skipped", saved.id, saved.name),
            }
        }
        sim.bonds = self.bonds;
    }
}

/// Write a snapshot as JSON, gzip-compressed when the path ends in `.gz`.
pub fn save_snapshot<P: AsRef<Path>>(path: P, sim: &Simulation) -> Result<(), SnapshotError> {
    profile_scope!("save_snapshot");
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let snapshot = SimulationSnapshot::from_simulation(sim);
    let use_gzip = path.extension().is_some_and(|e| e == "gz");
    // Write to a temporary file first to avoid truncation on crash/interruption
    let tmp_path = path.with_extension({
        let mut os = path.extension().map(|e| e.to_os_string()).unwrap_or_default();
        os.push(".tmp");
        os
    });
    {
        let file = std::fs::File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        if use_gzip {
            let mut encoder = GzEncoder::new(writer, Compression::fast());
            serde_json::to_writer(&mut encoder, &snapshot)?;
            let mut writer = encoder.finish()?;
            writer.flush()?;
        } else {
            serde_json::to_writer_pretty(&mut writer, &snapshot)?;
            writer.flush()?;
        }
    }
    std::fs::rename(&tmp_path, path)?;
    log::info!("Saved snapshot at frame {} to {}", sim.frame, path.display());
    Ok(())
}

/// Read a snapshot written by [`save_snapshot`]; gzip is detected from the content.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<SimulationSnapshot, SnapshotError> {
    profile_scope!("load_snapshot");
    let data = std::fs::read(path.as_ref())?;
    let snapshot = match maybe_decompress_gzip(&data)? {
        Some(decoded) => serde_json::from_slice(&decoded)?,
        None => serde_json::from_slice(&data)?,
    };
    Ok(snapshot)
}

fn maybe_decompress_gzip(data: &[u8]) -> std::io::Result<Option<Vec<u8>>> {
    if data.len() < 2 || data[0] != 0x1f || data[1] != 0x8b {
        return Ok(None);
    }

    let mut decoder = GzDecoder::new(Cursor::new(data));
    let mut decoded = Vec::new();
    decoder.read_to_end(&mut decoded)?;
    Ok(Some(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyKind, SurfaceMesh};
    use crate::gradient::GradientRegistry;
    use crate::species::{BindingRelation, SpeciesRegistry, SpeciesSpec};
    use crate::units::seconds_to_us;
    use std::f64::consts::PI;
    use ultraviolet::{DIsometry3, DRotor3, DVec3};

    fn bonded_sim() -> Simulation {
        let mut species = SpeciesRegistry::new();
        let r = species.register(SpeciesSpec::new("LFA1", f64::INFINITY)).unwrap();
        let l = species.register(SpeciesSpec::new("ICAM1", f64::INFINITY)).unwrap();
        species
            .add_relation(BindingRelation::new(r, l, 1e-3, 1e-4, true, 1.5, 30.0).unwrap())
            .unwrap();
        let mut sim = Simulation::new(SimConfig::default(), species, GradientRegistry::new());
        let cell = sim.add_body("cell", BodyKind::Cell, DIsometry3::identity(), SurfaceMesh::quad(1.0, 1.0));
        let wall = sim.add_body(
            "wall",
            BodyKind::Wall,
            DIsometry3::new(DVec3::new(0.0, 0.0, 1.0), DRotor3::from_rotation_yz(PI)),
            SurfaceMesh::quad(1.0, 1.0),
        );
        sim.body_mut(cell).unwrap().coat(0, r, 5000.0, 1.0e5, 10.0);
        sim.body_mut(wall).unwrap().coat(0, l, 5000.0, 1.0e5, 10.0);
        sim.step(seconds_to_us(1.0));
        sim
    }

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tether_sim_{}_{}", std::process::id(), name))
    }

    #[test]
    fn snapshot_restores_populations_and_bonds() {
        let sim = bonded_sim();
        assert!(!sim.bonds.is_empty());
        for name in ["plain.json", "packed.json.gz"] {
            let path = scratch(name);
            save_snapshot(&path, &sim).unwrap();
            let bytes = std::fs::read(&path).unwrap();
            assert_eq!(bytes.starts_with(&[0x1f, 0x8b]), name.ends_with(".gz"));

            let snapshot = load_snapshot(&path).unwrap();
            assert_eq!(snapshot.frame, 1);
            assert_eq!(snapshot.bonds.len(), sim.bonds.len());

            let mut fresh = bonded_sim();
            fresh.bodies[0].patches[0].set_counts(crate::species::SpeciesId(0), 0.0, 0.0);
            snapshot.apply_to(&mut fresh);
            assert_eq!(
                fresh.bodies[0].patches[0].unbound(crate::species::SpeciesId(0)),
                sim.bodies[0].patches[0].unbound(crate::species::SpeciesId(0))
            );
            std::fs::remove_file(&path).ok();
        }
    }

    #[test]
    fn garbage_is_a_format_error() {
        let path = scratch("garbage.json");
        std::fs::write(&path, b"not a snapshot").unwrap();
        assert!(matches!(load_snapshot(&path), Err(SnapshotError::Format(_))));
        std::fs::remove_file(&path).ok();
    }
}
