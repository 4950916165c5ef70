// body/types.rs
// Rigid body carrying coated surface patches: pose, faces, and the owning-body queries

use serde::{Deserialize, Serialize};
use ultraviolet::{DIsometry3, DVec3};

use super::mesh::SurfaceMesh;
use super::patch::SurfacePatch;
use crate::gradient::GradientRegistry;
use crate::species::{SpeciesId, SpeciesRegistry};
use crate::trafficking::{TraffickingRates, TraffickingTable};

/// Index of a body in the simulation's body arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Free-moving cell
    Cell,
    /// Static vessel wall or substrate
    Wall,
}

/// One face of one body, naming the patch that lives there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatchRef {
    pub body: BodyId,
    pub face: usize,
}

/// A body whose pose is driven by the physics engine and whose faces carry patches.
#[derive(Clone, Debug)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    pub kind: BodyKind,
    /// Local-to-world transform, written by the physics engine each tick
    pub pose: DIsometry3,
    pub mesh: SurfaceMesh,
    pub patches: Vec<SurfacePatch>,
    pub trafficking: TraffickingTable,
}

impl Body {
    pub fn new(id: BodyId, name: impl Into<String>, kind: BodyKind, pose: DIsometry3, mesh: SurfaceMesh) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            pose,
            mesh,
            patches: Vec::new(),
            trafficking: TraffickingTable::new(),
        }
    }

    pub fn world_position(&self) -> DVec3 {
        self.pose.translation
    }

    pub fn to_world(&self, local: DVec3) -> DVec3 {
        self.pose.transform_vec(local)
    }

    pub fn to_local(&self, world: DVec3) -> DVec3 {
        self.pose.inversed().transform_vec(world)
    }

    /// Rotate a local direction into world space.
    pub fn direction_to_world(&self, mut local: DVec3) -> DVec3 {
        self.pose.rotation.rotate_vec(&mut local);
        local
    }

    /// Rotate a world direction into body-local space.
    pub fn direction_to_local(&self, mut world: DVec3) -> DVec3 {
        self.pose.rotation.reversed().rotate_vec(&mut world);
        world
    }

    pub fn segment_area(&self, face: usize) -> f64 {
        self.mesh.face_area(face)
    }

    /// World positions of the face's three vertices.
    pub fn world_coordinates(&self, face: usize) -> Option<[DVec3; 3]> {
        self.mesh
            .face_vertices(face)
            .map(|verts| verts.map(|v| self.to_world(v)))
    }

    pub fn segment_world_normal(&self, face: usize) -> Option<DVec3> {
        self.mesh.face_normal(face).map(|n| self.direction_to_world(n))
    }

    pub fn segment_world_centroid(&self, face: usize) -> Option<DVec3> {
        self.mesh.face_centroid(face).map(|c| self.to_world(c))
    }

    pub fn trafficking(&self, species: SpeciesId, face: usize) -> TraffickingRates {
        self.trafficking.rates(species, face)
    }

    pub fn set_trafficking(&mut self, species: SpeciesId, face: Option<usize>, rates: TraffickingRates) {
        self.trafficking.set(species, face, rates);
    }

    pub fn patch(&self, face: usize) -> Option<&SurfacePatch> {
        self.patches.iter().find(|p| p.face == face)
    }

    pub fn patch_mut(&mut self, face: usize) -> Option<&mut SurfacePatch> {
        self.patches.iter_mut().find(|p| p.face == face)
    }

    /// Coat `face` with `species`. Returns false if the face does not exist.
    pub fn coat(
        &mut self,
        face: usize,
        species: SpeciesId,
        count: f64,
        capacity: f64,
        molecules_per_bond: f64,
    ) -> bool {
        if face >= self.mesh.face_count() {
            return false;
        }
        let id = self.id;
        let patch = match self.patches.iter().position(|p| p.face == face) {
            Some(i) => &mut self.patches[i],
            None => {
                self.patches.push(SurfacePatch::new(id, face));
                let last = self.patches.len() - 1;
                &mut self.patches[last]
            }
        };
        patch.coat(species, count, capacity, molecules_per_bond);
        true
    }

    /// Sum of unbound + bound `species` over every patch.
    pub fn total_molecules(&self, species: SpeciesId) -> f64 {
        self.patches.iter().map(|p| p.total(species)).sum()
    }

    /// Advance every patch on this body by one tick.
    pub fn update_patches(
        &mut self,
        now_us: f64,
        dt_us: f64,
        species: &SpeciesRegistry,
        gradients: &GradientRegistry,
    ) {
        let position = self.world_position();
        let trafficking = &self.trafficking;
        for patch in &mut self.patches {
            patch.update(now_us, dt_us, position, trafficking, species, gradients);
        }
    }
}

/// Mutable access to two different bodies of the same slice.
pub fn two_bodies_mut(bodies: &mut [Body], first: usize, second: usize) -> Option<(&mut Body, &mut Body)> {
    if first == second || first >= bodies.len() || second >= bodies.len() {
        return None;
    }

    if first < second {
        let (left, right) = bodies.split_at_mut(second);
        Some((&mut left[first], &mut right[0]))
    } else {
        let (left, right) = bodies.split_at_mut(first);
        Some((&mut right[0], &mut left[second]))
    }
}

/// Mutable access to two distinct patches, addressed by body index and face.
pub fn patch_pair_mut(
    bodies: &mut [Body],
    first: PatchRef,
    second: PatchRef,
) -> Option<(&mut SurfacePatch, &mut SurfacePatch)> {
    if first == second {
        return None;
    }
    if first.body == second.body {
        let body = bodies.get_mut(first.body.0 as usize)?;
        let i = body.patches.iter().position(|p| p.face == first.face)?;
        let j = body.patches.iter().position(|p| p.face == second.face)?;
        return if i < j {
            let (left, right) = body.patches.split_at_mut(j);
            Some((&mut left[i], &mut right[0]))
        } else {
            let (left, right) = body.patches.split_at_mut(i);
            Some((&mut right[0], &mut left[j]))
        };
    }
    let (a, b) = two_bodies_mut(bodies, first.body.0 as usize, second.body.0 as usize)?;
    Some((a.patch_mut(first.face)?, b.patch_mut(second.face)?))
}
