use log::warn;
use tracing::info_span;

use crate::types::{Point, Value, Vector};

/// Computes the unit face normal of triangle `(v0, v1, v2)`.
///
/// The operand order `(v2 - v0) × (v1 - v0)` matches the winding emitted by the
/// triangulator; swapping it flips every normal inward.
///
/// Returns the zero vector if the triangle is degenerate.
#[inline]
pub fn face_normal(v0: &Point, v1: &Point, v2: &Point) -> Vector {
    (v2 - v0)
        .cross(&(v1 - v0))
        .try_normalize(0.0)
        .unwrap_or_else(Vector::zeros)
}

/// Computes one smooth normal per vertex.
///
/// Each vertex gets the plain average of the unit normals of the faces touching it.
/// The average is not re-normalised, so vertices on sharp features end up shorter
/// than unit length.
///
/// Vertices no triangle refers to get a zero normal.
pub fn smooth_normals(vertices: &[Point], indices: &[u32]) -> Vec<Vector> {
    let _span = info_span!("smooth_normals").entered();

    let mut sums = vec![Vector::zeros(); vertices.len()];
    let mut counts = vec![0_u32; vertices.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let normal = face_normal(&vertices[i0], &vertices[i1], &vertices[i2]);
        for i in [i0, i1, i2] {
            sums[i] += normal;
            counts[i] += 1;
        }
    }

    let mut orphans = 0;
    let normals = sums
        .into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            if count == 0 {
                orphans += 1;
                Vector::zeros()
            } else {
                sum / count as Value
            }
        })
        .collect();

    if orphans > 0 {
        warn!("{orphans} vertices are not referenced by any triangle, their normals are zero");
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: Value, y: Value, z: Value) -> Point {
        Point::new(x, y, z)
    }

    #[test]
    fn face_normal_uses_reversed_cross_order() {
        let n = face_normal(&p(0., 0., 0.), &p(1., 0., 0.), &p(0., 1., 0.));
        assert_eq!(n, Vector::new(0., 0., -1.));
    }

    #[test]
    fn face_normal_is_unit_length() {
        let n = face_normal(&p(0., 0., 0.), &p(0., 0., 5.), &p(3., 0., 0.));
        assert!((n.norm() - 1.).abs() < 1e-6);
        assert_eq!(n, Vector::new(0., -1., 0.));
    }

    #[test]
    fn degenerate_face_has_zero_normal() {
        let n = face_normal(&p(0., 0., 0.), &p(1., 1., 1.), &p(2., 2., 2.));
        assert_eq!(n, Vector::zeros());
    }

    #[test]
    fn shared_vertices_average_without_renormalising() {
        // Two faces folded 90° along the X axis.
        let vertices = vec![p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.), p(0., 0., 1.)];
        let indices = vec![0, 1, 2, 0, 3, 1];
        let normals = smooth_normals(&vertices, &indices);

        assert_eq!(normals.len(), 4);
        assert_eq!(normals[2], Vector::new(0., 0., -1.));
        assert_eq!(normals[3], Vector::new(0., -1., 0.));
        // Shared edge: mean of the two unit normals, length 1/√2.
        assert_eq!(normals[0], Vector::new(0., -0.5, -0.5));
        assert!((normals[1].norm() - 0.5_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn unreferenced_vertices_get_zero_normals() {
        let vertices = vec![p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.), p(7., 7., 7.)];
        let normals = smooth_normals(&vertices, &[0, 1, 2]);
        assert_eq!(normals[3], Vector::zeros());
    }

    #[test]
    fn empty_mesh_has_no_normals() {
        assert!(smooth_normals(&[], &[]).is_empty());
    }
}
