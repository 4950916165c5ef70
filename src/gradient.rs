// gradient.rs
// Ligand concentration fields sampled by surface patches each tick

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use ultraviolet::DVec3;

use crate::error::ConfigError;
use crate::species::SpeciesId;

/// Source of a bulk ligand concentration (nM) at a time and place.
#[derive(Clone, Debug)]
pub enum GradientField {
    /// Uniform, time-invariant concentration
    Constant { concentration: f64 },
    /// Table sampled over time and distance along an axis
    Sampled(SampledGradient),
    /// Diffusion from a point source; the PDE is not solved
    Diffusion(DiffusionSource),
}

impl GradientField {
    pub fn concentration(&self, _species: SpeciesId, time_us: f64, position: DVec3) -> f64 {
        let c = match self {
            GradientField::Constant { concentration } => *concentration,
            GradientField::Sampled(table) => table.sample(time_us, position),
            GradientField::Diffusion(source) => source.sample(time_us, position),
        };
        c.max(0.0)
    }
}

/// Concentrations on a regular (time × axial distance) grid.
///
/// `values[i][j]` is the concentration at `times_us[i]` and `distances[j]`
/// measured from `origin` along `axis`. Lookups are bilinear and clamp at
/// the table edges.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampledGradient {
    pub origin: [f64; 3],
    pub axis: [f64; 3],
    pub times_us: Vec<f64>,
    pub distances: Vec<f64>,
    pub values: Vec<Vec<f64>>,
}

impl SampledGradient {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let table: SampledGradient = serde_json::from_str(&content)?;
        table.validated()
    }

    /// Check the grid shape and normalise the axis.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.times_us.is_empty() || self.distances.is_empty() {
            return Err(ConfigError::invalid("gradient", "table axes must not be empty"));
        }
        if self.values.len() != self.times_us.len()
            || self.values.iter().any(|row| row.len() != self.distances.len())
        {
            return Err(ConfigError::invalid(
                "gradient.values",
                "expected one row per time with one value per distance",
            ));
        }
        if !is_ascending(&self.times_us) || !is_ascending(&self.distances) {
            return Err(ConfigError::invalid("gradient", "axes must be strictly ascending"));
        }
        let axis = DVec3::from(self.axis);
        let len = axis.mag();
        if !(len > 0.0) {
            return Err(ConfigError::invalid("gradient.axis", "axis must be non-zero"));
        }
        let unit = axis / len;
        self.axis = [unit.x, unit.y, unit.z];
        Ok(self)
    }

    /// Bilinear lookup; reads 0 for an empty or ragged table and for
    /// non-finite times or positions.
    pub fn sample(&self, time_us: f64, position: DVec3) -> f64 {
        let d = (position - DVec3::from(self.origin)).dot(DVec3::from(self.axis));
        let (Some((i0, i1, ti)), Some((j0, j1, tj))) = (bracket(&self.times_us, time_us), bracket(&self.distances, d))
        else {
            return 0.0;
        };
        let value = |i: usize, j: usize| self.values.get(i).and_then(|row| row.get(j)).copied();
        let (Some(a), Some(b), Some(c), Some(e)) = (value(i0, j0), value(i0, j1), value(i1, j0), value(i1, j1)) else {
            return 0.0;
        };
        let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;
        lerp(lerp(a, b, tj), lerp(c, e, tj), ti)
    }
}

fn is_ascending(xs: &[f64]) -> bool {
    xs.windows(2).all(|w| w[0] < w[1])
}

/// Indices bracketing `x` and the interpolation weight between them.
fn bracket(axis: &[f64], x: f64) -> Option<(usize, usize, f64)> {
    if !x.is_finite() {
        return None;
    }
    let last = axis.len().checked_sub(1)?;
    if x <= axis[0] {
        return Some((0, 0, 0.0));
    }
    if x >= axis[last] {
        return Some((last, last, 0.0));
    }
    let hi = axis.partition_point(|&v| v <= x).clamp(1, last);
    let lo = hi - 1;
    let t = (x - axis[lo]) / (axis[hi] - axis[lo]);
    Some((lo, hi, t))
}

/// Point source of a diffusing ligand.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiffusionSource {
    pub origin: [f64; 3],
    /// Release rate at the source, molecules per µs
    pub release_rate: f64,
    /// Diffusion coefficient, µm² per µs
    pub diffusion_coefficient: f64,
}

impl DiffusionSource {
    /// No solver exists for this field yet, so it reports no ligand.
    pub fn sample(&self, _time_us: f64, _position: DVec3) -> f64 {
        0.0
    }
}

/// Gradient field per ligand species. Species without a field read 0.
#[derive(Clone, Debug, Default)]
pub struct GradientRegistry {
    fields: HashMap<SpeciesId, GradientField>,
}

impl GradientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, species: SpeciesId, field: GradientField) {
        self.fields.insert(species, field);
    }

    pub fn get(&self, species: SpeciesId) -> Option<&GradientField> {
        self.fields.get(&species)
    }

    pub fn concentration(&self, species: SpeciesId, time_us: f64, position: DVec3) -> f64 {
        self.fields
            .get(&species)
            .map(|f| f.concentration(species, time_us, position))
            .unwrap_or(0.0)
    }
}
