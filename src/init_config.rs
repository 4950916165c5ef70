// init_config.rs
// Handles loading, parsing and validating the scenario description from init_config.toml

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ultraviolet::{DIsometry3, DRotor3, DVec3};

use crate::body::{BodyKind, SurfaceMesh};
use crate::config::{SimConfig, DEFAULT_MOLECULES_PER_BOND};
use crate::error::ConfigError;

#[derive(Debug, Deserialize, Serialize)]
pub struct InitConfig {
    #[serde(default)]
    pub simulation: SimConfig,
    #[serde(default)]
    pub species: Vec<SpeciesConfig>,
    #[serde(default)]
    pub relations: Vec<RelationConfig>,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
    #[serde(default)]
    pub gradients: Vec<GradientConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SpeciesConfig {
    pub name: String,
    /// Minutes; omitted means free molecules never decay
    #[serde(default = "default_half_life")]
    pub half_life_minutes: f64,
    #[serde(default = "default_true")]
    pub binds_surface: bool,
    #[serde(default = "default_true")]
    pub membrane_bound: bool,
    #[serde(default)]
    pub diffusible: bool,
    #[serde(default = "default_color")]
    pub color: [u8; 4],
}

/// Receptor/ligand kinetics. Rates are given per second.
#[derive(Debug, Deserialize, Serialize)]
pub struct RelationConfig {
    pub receptor: String,
    pub ligand: String,
    pub kon: f64,
    pub koff: f64,
    #[serde(default)]
    pub structural: bool,
    /// µm
    #[serde(default)]
    pub bond_length: f64,
    /// Minutes
    #[serde(default)]
    pub time_to_stable: f64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BodyConfig {
    pub name: String,
    pub kind: BodyKind,
    #[serde(default)]
    pub position: [f64; 3],
    /// Rotation about X, then Y, then Z, in degrees
    #[serde(default)]
    pub rotation: [f64; 3],
    pub shape: ShapeConfig,
    #[serde(default)]
    pub coatings: Vec<CoatingConfig>,
    #[serde(default)]
    pub trafficking: Vec<TraffickingConfig>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeConfig {
    Quad { width: f64, height: f64 },
    Cube { side: f64 },
    Triangles { vertices: Vec<[f64; 3]>, faces: Vec<[usize; 3]> },
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CoatingConfig {
    pub species: String,
    /// Faces to coat; every face when omitted
    #[serde(default)]
    pub faces: Option<Vec<usize>>,
    pub count: f64,
    pub capacity: f64,
    #[serde(default = "default_molecules_per_bond")]
    pub molecules_per_bond: f64,
}

/// Trafficking rates entered per minute; `face` narrows them to one patch.
#[derive(Debug, Deserialize, Serialize)]
pub struct TraffickingConfig {
    pub species: String,
    #[serde(default)]
    pub face: Option<usize>,
    #[serde(default)]
    pub secretion: f64,
    #[serde(default)]
    pub unbound_internalization: f64,
    #[serde(default)]
    pub bound_internalization: f64,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradientConfig {
    Constant {
        species: String,
        /// nM
        concentration: f64,
    },
    Sampled {
        species: String,
        /// JSON table, relative paths resolve against the scenario file
        path: PathBuf,
    },
    Diffusion {
        species: String,
        origin: [f64; 3],
        release_rate: f64,
        diffusion_coefficient: f64,
    },
}

fn default_half_life() -> f64 {
    f64::INFINITY
}

fn default_true() -> bool {
    true
}

fn default_color() -> [u8; 4] {
    [255, 255, 255, 255]
}

fn default_molecules_per_bond() -> f64 {
    DEFAULT_MOLECULES_PER_BOND
}

impl ShapeConfig {
    pub fn build_mesh(&self) -> Result<SurfaceMesh, ConfigError> {
        match self {
            ShapeConfig::Quad { width, height } => {
                if !(*width > 0.0 && *height > 0.0) {
                    return Err(ConfigError::invalid("shape", "quad sides must be positive"));
                }
                Ok(SurfaceMesh::quad(*width, *height))
            }
            ShapeConfig::Cube { side } => {
                if !(*side > 0.0) {
                    return Err(ConfigError::invalid("shape", "cube side must be positive"));
                }
                Ok(SurfaceMesh::cube(*side))
            }
            ShapeConfig::Triangles { vertices, faces } => SurfaceMesh::from_triangles(
                vertices.iter().map(|&v| DVec3::from(v)).collect(),
                faces.clone(),
            ),
        }
    }
}

impl BodyConfig {
    pub fn pose(&self) -> DIsometry3 {
        let [rx, ry, rz] = self.rotation.map(f64::to_radians);
        let rotation =
            DRotor3::from_rotation_xy(rz) * DRotor3::from_rotation_xz(ry) * DRotor3::from_rotation_yz(rx);
        DIsometry3::new(DVec3::from(self.position), rotation)
    }
}

impl GradientConfig {
    pub fn species(&self) -> &str {
        match self {
            GradientConfig::Constant { species, .. }
            | GradientConfig::Sampled { species, .. }
            | GradientConfig::Diffusion { species, .. } => species,
        }
    }
}

impl InitConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_file("init_config.toml")
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: InitConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Check every cross-reference and numeric range before anything is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if !(sim.dt_us > 0.0) {
            return Err(ConfigError::invalid("simulation.dt_us", "must be positive"));
        }
        if !(sim.contact_range > 0.0) {
            return Err(ConfigError::invalid("simulation.contact_range", "must be positive"));
        }
        if sim.report_interval == 0 {
            return Err(ConfigError::invalid("simulation.report_interval", "must be at least 1"));
        }

        let mut names = HashSet::new();
        for species in &self.species {
            if species.name.trim().is_empty() {
                return Err(ConfigError::invalid("species.name", "must not be empty"));
            }
            if !names.insert(species.name.as_str()) {
                return Err(ConfigError::DuplicateSpecies(species.name.clone()));
            }
            if !(species.half_life_minutes > 0.0) {
                return Err(ConfigError::invalid(
                    format!("species.{}.half_life_minutes", species.name),
                    "must be positive",
                ));
            }
        }
        let known = |name: &str| -> Result<(), ConfigError> {
            if names.contains(name) {
                Ok(())
            } else {
                Err(ConfigError::UnknownSpecies(name.to_string()))
            }
        };

        for relation in &self.relations {
            known(&relation.receptor)?;
            known(&relation.ligand)?;
            let field = format!("relations.{}-{}", relation.receptor, relation.ligand);
            if !(relation.kon >= 0.0 && relation.koff >= 0.0) {
                return Err(ConfigError::invalid(field, "kon and koff must be non-negative"));
            }
            if relation.structural && !(relation.bond_length > 0.0) {
                return Err(ConfigError::invalid(field, "structural bonds need a positive bond_length"));
            }
            if relation.structural && !(relation.time_to_stable >= 0.0) {
                return Err(ConfigError::invalid(field, "time_to_stable must be zero or positive"));
            }
        }

        let mut body_names = HashSet::new();
        for body in &self.bodies {
            if !body_names.insert(body.name.as_str()) {
                return Err(ConfigError::invalid(
                    format!("bodies.{}", body.name),
                    "duplicate body name",
                ));
            }
            let mesh = body.shape.build_mesh()?;
            let faces = mesh.face_count();
            for coating in &body.coatings {
                known(&coating.species)?;
                let field = format!("bodies.{}.coatings.{}", body.name, coating.species);
                if !(coating.count >= 0.0 && coating.capacity >= 0.0) {
                    return Err(ConfigError::invalid(field, "count and capacity must be non-negative"));
                }
                if !(coating.molecules_per_bond > 0.0) {
                    return Err(ConfigError::invalid(field, "molecules_per_bond must be positive"));
                }
                if let Some(bad) = coating.faces.iter().flatten().find(|&&f| f >= faces) {
                    return Err(ConfigError::invalid(
                        field,
                        format!("face {} out of range ({} faces)", bad, faces),
                    ));
                }
            }
            for rates in &body.trafficking {
                known(&rates.species)?;
                let field = format!("bodies.{}.trafficking.{}", body.name, rates.species);
                if !(rates.secretion >= 0.0
                    && rates.unbound_internalization >= 0.0
                    && rates.bound_internalization >= 0.0)
                {
                    return Err(ConfigError::invalid(field, "rates must be non-negative"));
                }
                if rates.face.is_some_and(|f| f >= faces) {
                    return Err(ConfigError::invalid(field, "face out of range"));
                }
            }
        }

        for gradient in &self.gradients {
            known(gradient.species())?;
            if let GradientConfig::Constant { concentration, .. } = gradient {
                if !(*concentration >= 0.0) {
                    return Err(ConfigError::invalid(
                        format!("gradients.{}", gradient.species()),
                        "concentration must be non-negative",
                    ));
                }
            }
        }
        Ok(())
    }
}
