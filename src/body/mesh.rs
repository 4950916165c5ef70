// body/mesh.rs
// Local-space triangle mesh describing a body's bindable surface faces

use ultraviolet::DVec3;

use crate::error::ConfigError;

/// Triangles in body-local coordinates. Faces wind counter-clockwise when
/// seen from outside, so `(b - a) × (c - a)` is the outward normal.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceMesh {
    pub vertices: Vec<DVec3>,
    pub faces: Vec<[usize; 3]>,
}

impl SurfaceMesh {
    pub fn from_triangles(vertices: Vec<DVec3>, faces: Vec<[usize; 3]>) -> Result<Self, ConfigError> {
        if faces.is_empty() {
            return Err(ConfigError::invalid("mesh.faces", "mesh needs at least one face"));
        }
        if let Some(bad) = faces.iter().flatten().find(|&&i| i >= vertices.len()) {
            return Err(ConfigError::invalid(
                "mesh.faces",
                format!("vertex index {} out of range ({} vertices)", bad, vertices.len()),
            ));
        }
        Ok(Self { vertices, faces })
    }

    /// Single triangle.
    pub fn triangle(a: DVec3, b: DVec3, c: DVec3) -> Self {
        Self {
            vertices: vec![a, b, c],
            faces: vec![[0, 1, 2]],
        }
    }

    /// Rectangle in the local XY plane, centred on the origin, facing +Z.
    /// Split into two triangles.
    pub fn quad(width: f64, height: f64) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self {
            vertices: vec![
                DVec3::new(-hw, -hh, 0.0),
                DVec3::new(hw, -hh, 0.0),
                DVec3::new(hw, hh, 0.0),
                DVec3::new(-hw, hh, 0.0),
            ],
            faces: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    /// Axis-aligned cube centred on the origin, twelve outward-facing triangles.
    pub fn cube(side: f64) -> Self {
        let h = side * 0.5;
        let vertices: Vec<DVec3> = (0..8)
            .map(|i| {
                let s = |bit: usize| if i & bit != 0 { h } else { -h };
                DVec3::new(s(1), s(2), s(4))
            })
            .collect();
        let mut faces = Vec::with_capacity(12);
        for axis in 0..3 {
            let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
            for side_bit in [0usize, 1] {
                let corner = |du: usize, dv: usize| (side_bit << axis) | (du << u) | (dv << v);
                let ring = [corner(0, 0), corner(1, 0), corner(1, 1), corner(0, 1)];
                for tri in [[ring[0], ring[1], ring[2]], [ring[0], ring[2], ring[3]]] {
                    faces.push(outward(&vertices, tri));
                }
            }
        }
        Self { vertices, faces }
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn face_vertices(&self, face: usize) -> Option<[DVec3; 3]> {
        let [a, b, c] = *self.faces.get(face)?;
        Some([self.vertices[a], self.vertices[b], self.vertices[c]])
    }

    pub fn face_area(&self, face: usize) -> f64 {
        self.face_vertices(face)
            .map(|[a, b, c]| 0.5 * (b - a).cross(c - a).mag())
            .unwrap_or(0.0)
    }

    /// Unit outward normal; `None` for a missing or zero-area face.
    pub fn face_normal(&self, face: usize) -> Option<DVec3> {
        let [a, b, c] = self.face_vertices(face)?;
        let n = (b - a).cross(c - a);
        let len = n.mag();
        if len > 0.0 {
            Some(n / len)
        } else {
            None
        }
    }

    pub fn face_centroid(&self, face: usize) -> Option<DVec3> {
        self.face_vertices(face).map(|[a, b, c]| (a + b + c) / 3.0)
    }

    pub fn total_area(&self) -> f64 {
        (0..self.faces.len()).map(|f| self.face_area(f)).sum()
    }
}

/// Reorder a triangle of a convex, origin-centred mesh so its normal points away from the origin.
fn outward(vertices: &[DVec3], tri: [usize; 3]) -> [usize; 3] {
    let [a, b, c] = tri.map(|i| vertices[i]);
    let normal = (b - a).cross(c - a);
    let centroid = (a + b + c) / 3.0;
    if normal.dot(centroid) < 0.0 {
        [tri[0], tri[2], tri[1]]
    } else {
        tri
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_faces_up_with_full_area() {
        let m = SurfaceMesh::quad(2.0, 3.0);
        assert_eq!(m.face_count(), 2);
        assert!((m.total_area() - 6.0).abs() < 1e-12);
        for f in 0..2 {
            let n = m.face_normal(f).unwrap();
            assert!((n - DVec3::unit_z()).mag() < 1e-12);
        }
    }

    #[test]
    fn cube_normals_point_outward() {
        let m = SurfaceMesh::cube(2.0);
        assert_eq!(m.face_count(), 12);
        assert!((m.total_area() - 24.0).abs() < 1e-9);
        for f in 0..m.face_count() {
            let n = m.face_normal(f).unwrap();
            let c = m.face_centroid(f).unwrap();
            assert!(n.dot(c) > 0.0, "face {f} points inward");
        }
    }

    #[test]
    fn degenerate_face_has_no_normal() {
        let m = SurfaceMesh::triangle(DVec3::zero(), DVec3::unit_x(), DVec3::unit_x() * 2.0);
        assert_eq!(m.face_area(0), 0.0);
        assert!(m.face_normal(0).is_none());
        assert!(m.face_vertices(1).is_none());
    }

    #[test]
    fn out_of_range_indices_rejected() {
        let err = SurfaceMesh::from_triangles(vec![DVec3::zero()], vec![[0, 1, 2]]);
        assert!(err.is_err());
    }
}
