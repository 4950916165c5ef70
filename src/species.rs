// species.rs
// Molecular species, their pairwise binding kinetics, and the registry that assigns ids

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::units::PER_SECOND_TO_PER_MICROSECOND;

/// Index of a species in its `SpeciesRegistry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesId(pub u32);

/// Kinetic parameters for one receptor–ligand pair.
///
/// `kon` and `koff` are stored per microsecond; use [`BindingRelation::new`]
/// to build one from per-second constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BindingRelation {
    pub receptor: SpeciesId,
    pub ligand: SpeciesId,
    /// Forward rate, nM⁻¹·µs⁻¹
    pub kon: f64,
    /// Reverse rate, µs⁻¹
    pub koff: f64,
    /// Whether the pair forms discrete mechanical tethers
    pub forms_structural_bond: bool,
    /// Maximum tether length, µm
    pub bond_length: f64,
    /// Age at which a tether reaches full stability, minutes
    pub target_time_to_stable: f64,
}

impl BindingRelation {
    pub fn new(
        receptor: SpeciesId,
        ligand: SpeciesId,
        kon_per_second: f64,
        koff_per_second: f64,
        forms_structural_bond: bool,
        bond_length: f64,
        target_time_to_stable: f64,
    ) -> Result<Self, ConfigError> {
        let valid = |k: f64| k.is_finite() && k >= 0.0;
        if !valid(kon_per_second) || !valid(koff_per_second) {
            return Err(ConfigError::invalid(
                "kon/koff",
                "rate constants must be finite and non-negative",
            ));
        }
        if forms_structural_bond {
            if !(bond_length > 0.0) {
                return Err(ConfigError::invalid(
                    "bond_length",
                    "structural bonds need a positive length",
                ));
            }
            if !(target_time_to_stable >= 0.0) {
                return Err(ConfigError::invalid(
                    "target_time_to_stable",
                    "must be zero or positive",
                ));
            }
        }
        Ok(Self {
            receptor,
            ligand,
            kon: kon_per_second * PER_SECOND_TO_PER_MICROSECOND,
            koff: koff_per_second * PER_SECOND_TO_PER_MICROSECOND,
            forms_structural_bond,
            bond_length,
            target_time_to_stable,
        })
    }

    /// True when `a`/`b` name this pair in either order.
    pub fn pairs(&self, a: SpeciesId, b: SpeciesId) -> bool {
        (self.receptor == a && self.ligand == b) || (self.receptor == b && self.ligand == a)
    }
}

/// Static description of one binding species.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MolecularSpecies {
    pub id: SpeciesId,
    pub name: String,
    pub binds_surface: bool,
    pub membrane_bound: bool,
    pub diffusible: bool,
    /// Half-life of free molecules, minutes
    pub half_life_minutes: f64,
    pub color: [u8; 4],
    /// Relations in which this species is the receptor
    pub relations: Vec<BindingRelation>,
}

impl MolecularSpecies {
    pub fn relation_with(&self, ligand: SpeciesId) -> Option<&BindingRelation> {
        self.relations.iter().find(|r| r.ligand == ligand)
    }
}

/// Builder-style description used when registering a species.
#[derive(Clone, Debug)]
pub struct SpeciesSpec {
    pub name: String,
    pub binds_surface: bool,
    pub membrane_bound: bool,
    pub diffusible: bool,
    pub half_life_minutes: f64,
    pub color: [u8; 4],
}

impl SpeciesSpec {
    pub fn new(name: impl Into<String>, half_life_minutes: f64) -> Self {
        Self {
            name: name.into(),
            binds_surface: true,
            membrane_bound: true,
            diffusible: false,
            half_life_minutes,
            color: [255, 255, 255, 255],
        }
    }
}

/// Arena of species; ids are dense indices handed out on insertion.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SpeciesRegistry {
    species: Vec<MolecularSpecies>,
}

impl SpeciesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: SpeciesSpec) -> Result<SpeciesId, ConfigError> {
        if self.find_by_name(&spec.name).is_some() {
            return Err(ConfigError::DuplicateSpecies(spec.name));
        }
        if !(spec.half_life_minutes > 0.0) {
            return Err(ConfigError::invalid(
                format!("{}.half_life_minutes", spec.name),
                "half-life must be positive",
            ));
        }
        let id = SpeciesId(self.species.len() as u32);
        self.species.push(MolecularSpecies {
            id,
            name: spec.name,
            binds_surface: spec.binds_surface,
            membrane_bound: spec.membrane_bound,
            diffusible: spec.diffusible,
            half_life_minutes: spec.half_life_minutes,
            color: spec.color,
            relations: Vec::new(),
        });
        Ok(id)
    }

    /// Attach a standalone pair relation to its receptor species.
    pub fn add_relation(&mut self, relation: BindingRelation) -> Result<(), ConfigError> {
        if self.get(relation.ligand).is_none() {
            return Err(ConfigError::UnknownSpecies(format!("#{}", relation.ligand.0)));
        }
        let receptor = self
            .species
            .get_mut(relation.receptor.0 as usize)
            .ok_or_else(|| ConfigError::UnknownSpecies(format!("#{}", relation.receptor.0)))?;
        if let Some(existing) = receptor
            .relations
            .iter_mut()
            .find(|r| r.ligand == relation.ligand)
        {
            *existing = relation;
        } else {
            receptor.relations.push(relation);
        }
        Ok(())
    }

    pub fn get(&self, id: SpeciesId) -> Option<&MolecularSpecies> {
        self.species.get(id.0 as usize)
    }

    pub fn find_by_name(&self, name: &str) -> Option<SpeciesId> {
        self.species.iter().find(|s| s.name == name).map(|s| s.id)
    }

    /// Relation with `receptor` as the receptor and `ligand` as the ligand.
    pub fn relation(&self, receptor: SpeciesId, ligand: SpeciesId) -> Option<&BindingRelation> {
        self.get(receptor)?.relation_with(ligand)
    }

    /// Ligands that `receptor` can bind, with their kinetics.
    pub fn ligands_of(&self, receptor: SpeciesId) -> &[BindingRelation] {
        self.get(receptor)
            .map(|s| s.relations.as_slice())
            .unwrap_or(&[])
    }

    /// Every relation that forms discrete tethers.
    pub fn structural_relations(&self) -> impl Iterator<Item = &BindingRelation> {
        self.species
            .iter()
            .flat_map(|s| s.relations.iter())
            .filter(|r| r.forms_structural_bond)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MolecularSpecies> {
        self.species.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (SpeciesRegistry, SpeciesId, SpeciesId) {
        let mut reg = SpeciesRegistry::new();
        let icam = reg.register(SpeciesSpec::new("ICAM1", 60.0)).unwrap();
        let lfa = reg.register(SpeciesSpec::new("LFA1", 45.0)).unwrap();
        (reg, icam, lfa)
    }

    #[test]
    fn ids_follow_insertion_order() {
        let (reg, icam, lfa) = registry();
        assert_eq!(icam, SpeciesId(0));
        assert_eq!(lfa, SpeciesId(1));
        assert_eq!(reg.find_by_name("LFA1"), Some(lfa));
        assert_eq!(reg.find_by_name("VCAM1"), None);
    }

    #[test]
    fn duplicate_names_rejected() {
        let (mut reg, _, _) = registry();
        let err = reg.register(SpeciesSpec::new("ICAM1", 10.0)).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSpecies(_)));
    }

    #[test]
    fn relation_rates_are_converted_to_microseconds() {
        let (mut reg, icam, lfa) = registry();
        let rel = BindingRelation::new(icam, lfa, 1e-3, 1e-4, true, 1.5, 30.0).unwrap();
        reg.add_relation(rel).unwrap();
        let stored = reg.relation(icam, lfa).unwrap();
        assert!((stored.kon - 1e-9).abs() < 1e-21);
        assert!((stored.koff - 1e-10).abs() < 1e-22);
        assert!(stored.pairs(lfa, icam));
        assert!(reg.relation(lfa, icam).is_none());
        assert_eq!(reg.structural_relations().count(), 1);
    }

    #[test]
    fn structural_relation_needs_length() {
        let (_, icam, lfa) = registry();
        assert!(BindingRelation::new(icam, lfa, 1.0, 1.0, true, 0.0, 5.0).is_err());
        assert!(BindingRelation::new(icam, lfa, 1.0, 1.0, true, 1.0, -1.0).is_err());
        assert!(BindingRelation::new(icam, lfa, 1.0, 1.0, false, 0.0, -1.0).is_ok());
    }

    #[test]
    fn rates_must_be_finite_and_non_negative() {
        let (_, icam, lfa) = registry();
        for (kon, koff) in [(f64::INFINITY, 1.0), (1.0, f64::INFINITY), (f64::NAN, 1.0), (1.0, -1e-3)] {
            assert!(BindingRelation::new(icam, lfa, kon, koff, true, 1.5, 30.0).is_err());
        }
        assert!(BindingRelation::new(icam, lfa, 0.0, 0.0, true, 1.5, 30.0).is_ok());
    }

    #[test]
    fn zero_half_life_rejected() {
        let mut reg = SpeciesRegistry::new();
        assert!(reg.register(SpeciesSpec::new("X", 0.0)).is_err());
    }
}
