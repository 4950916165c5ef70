// cell_list.rs
// Uniform 3-D grid over world face centroids for finding bond candidates between bodies

use std::collections::HashMap;

use ultraviolet::DVec3;

use crate::body::{Body, PatchRef};

/// Two coated faces on different bodies whose centroids are within range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceContact {
    pub first: PatchRef,
    pub second: PatchRef,
    pub distance: f64,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    patch: PatchRef,
    centroid: DVec3,
}

type CellKey = (i64, i64, i64);

pub struct CellList {
    pub cell_size: f64,
    entries: Vec<Entry>,
    cells: HashMap<CellKey, Vec<usize>>, // indices into `entries`
}

impl CellList {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(f64::EPSILON),
            entries: Vec::new(),
            cells: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-bin every coated face by its current world centroid.
    pub fn rebuild(&mut self, bodies: &[Body]) {
        self.entries.clear();
        self.cells.clear();
        for body in bodies {
            for patch in body.patches.iter().filter(|p| !p.is_empty()) {
                let Some(centroid) = body.segment_world_centroid(patch.face) else {
                    continue;
                };
                let key = self.coord(centroid);
                let idx = self.entries.len();
                self.entries.push(Entry {
                    patch: PatchRef {
                        body: body.id,
                        face: patch.face,
                    },
                    centroid,
                });
                self.cells.entry(key).or_default().push(idx);
            }
        }
    }

    fn coord(&self, pos: DVec3) -> CellKey {
        (
            (pos.x / self.cell_size).floor() as i64,
            (pos.y / self.cell_size).floor() as i64,
            (pos.z / self.cell_size).floor() as i64,
        )
    }

    /// Every unordered pair of faces on different bodies closer than `cutoff`,
    /// sorted by patch so the result does not depend on hash order.
    pub fn contacts_within(&self, cutoff: f64) -> Vec<FaceContact> {
        let range = (cutoff / self.cell_size).ceil() as i64;
        let cutoff_sq = cutoff * cutoff;
        let mut contacts = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let (cx, cy, cz) = self.coord(entry.centroid);
            for dz in -range..=range {
                for dy in -range..=range {
                    for dx in -range..=range {
                        let Some(cell) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                            continue;
                        };
                        for &j in cell {
                            if j <= i {
                                continue;
                            }
                            let other = &self.entries[j];
                            if other.patch.body == entry.patch.body {
                                continue;
                            }
                            let r2 = (other.centroid - entry.centroid).mag_sq();
                            if r2 < cutoff_sq {
                                contacts.push(FaceContact {
                                    first: entry.patch,
                                    second: other.patch,
                                    distance: r2.sqrt(),
                                });
                            }
                        }
                    }
                }
            }
        }
        contacts.sort_by(|a, b| (a.first, a.second).cmp(&(b.first, b.second)));
        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyId, BodyKind, SurfaceMesh};
    use crate::species::SpeciesId;
    use ultraviolet::{DIsometry3, DRotor3};

    fn plate(id: u32, z: f64) -> Body {
        let pose = DIsometry3::new(DVec3::new(0.0, 0.0, z), DRotor3::identity());
        let mut body = Body::new(BodyId(id), format!("plate{id}"), BodyKind::Cell, pose, SurfaceMesh::quad(1.0, 1.0));
        body.coat(0, SpeciesId(0), 10.0, 10.0, 1.0);
        body.coat(1, SpeciesId(0), 10.0, 10.0, 1.0);
        body
    }

    #[test]
    fn pairs_only_across_bodies_and_within_cutoff() {
        let bodies = vec![plate(0, 0.0), plate(1, 1.0), plate(2, 10.0)];
        let mut grid = CellList::new(2.0);
        grid.rebuild(&bodies);
        assert_eq!(grid.len(), 6);

        let contacts = grid.contacts_within(2.0);
        // 2 faces x 2 faces between the two near plates, nothing with the far one.
        assert_eq!(contacts.len(), 4);
        for c in &contacts {
            assert_ne!(c.first.body, c.second.body);
            assert!(c.first.body != BodyId(2) && c.second.body != BodyId(2));
            assert!(c.distance < 2.0);
        }
    }

    #[test]
    fn uncoated_faces_are_ignored() {
        let mut lonely = plate(0, 0.0);
        lonely.patches.clear();
        let bodies = vec![lonely, plate(1, 0.5)];
        let mut grid = CellList::new(1.0);
        grid.rebuild(&bodies);
        assert_eq!(grid.len(), 2);
        assert!(grid.contacts_within(5.0).is_empty());
    }

    #[test]
    fn small_cells_still_find_far_neighbours() {
        let bodies = vec![plate(0, 0.0), plate(1, 1.5)];
        let mut grid = CellList::new(0.25);
        grid.rebuild(&bodies);
        assert_eq!(grid.contacts_within(1.55).len(), 2);
    }
}
