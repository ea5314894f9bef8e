use log::debug;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::info_span;

use crate::{
    interp::{find_t, interpolate_points},
    tables::{CUBE_CORNERS, TETRA_EDGES, TETRA_PATTERNS, TETRAHEDRA},
    types::{Point, Value},
    voxel_map::VoxelMap,
};

/// One cube corner as seen by the triangulator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerSample {
    pub position: Point,
    pub inside: bool,
    pub value: Value,
}

/// Gathers the 8 corners of cell `(x, y, z)` in [`CUBE_CORNERS`] order.
#[inline]
pub fn cell_corners(map: &VoxelMap, x: usize, y: usize, z: usize) -> [CornerSample; 8] {
    CUBE_CORNERS.map(|[sx, sy, sz]| {
        let cx = x + usize::from(sx > 0);
        let cy = y + usize::from(sy > 0);
        let cz = z + usize::from(sz > 0);
        CornerSample {
            position: map.position(cx, cy, cz),
            inside: map.is_inside(cx, cy, cz),
            value: map.get(cx, cy, cz),
        }
    })
}

/// Computes the 8-bit corner code of a cell.
///
/// ```text
/// corner index:  7  6  5  4  3  2  1  0
/// code bits:    [_][_][_][_][_][_][_][_]
///                                     ^-- corner 0 inside?
/// ```
#[inline]
pub fn corner_code(corners: &[CornerSample; 8]) -> u8 {
    corners
        .iter()
        .enumerate()
        .filter(|(_, c)| c.inside)
        .fold(0, |code, (i, _)| code | (1 << i))
}

/// Computes the 4-bit code of a tetrahedron (bit `j` = corner `j` inside).
#[inline]
pub fn tetra_code(corners: &[CornerSample; 4]) -> usize {
    corners
        .iter()
        .enumerate()
        .filter(|(_, c)| c.inside)
        .fold(0, |code, (i, _)| code | (1 << i))
}

/// Appends the triangles of one tetrahedron to `vertices`.
///
/// Vertices are pushed in triangle order; every three consecutive pushes form a
/// triangle whose winding comes straight from [`TETRA_PATTERNS`].
#[inline]
pub fn triangulate_tetrahedron(
    corners: &[CornerSample; 4],
    threshold: Value,
    vertices: &mut Vec<Point>,
) {
    let code = tetra_code(corners);
    if code == 0b0000 || code == 0b1111 {
        return;
    }

    vertices.extend(TETRA_PATTERNS[code].iter().map(|&edge| {
        let [i1, i2] = TETRA_EDGES[edge as usize];
        let (c1, c2) = (corners[i1], corners[i2]);
        let t = find_t(c1.value, c2.value, threshold);
        interpolate_points(c1.position, c2.position, t)
    }));
}

/// Appends the triangles of one cell to `vertices`.
///
/// Cells that are entirely inside or outside are rejected before the tetrahedral split.
#[inline]
pub fn triangulate_cell(corners: &[CornerSample; 8], threshold: Value, vertices: &mut Vec<Point>) {
    let code = corner_code(corners);
    if code == 0x00 || code == 0xFF {
        return;
    }

    for tetra in TETRAHEDRA {
        triangulate_tetrahedron(&tetra.map(|c| corners[c]), threshold, vertices);
    }
}

/// Runs Marching Tetrahedra over every cell of `map`.
///
/// Returns an unindexed vertex stream: every group of three is one triangle.
/// Neighbouring cells emit their own copies of shared vertices; welding happens later.
///
/// ```text
/// Per cell:
/// 1. cell_corners              →  8 positions, values and inside flags
/// 2. corner_code               →  reject 0x00 / 0xFF
/// 3. TETRAHEDRA (×6)           →  4 corners each
/// 4. tetra_code                →  reject 0b0000 / 0b1111
/// 5. TETRA_PATTERNS[code]      →  crossed edges, in triangle order
/// 6. find_t + interpolate      →  one vertex per edge
/// ```
///
/// Work is split into Z slabs on Rayon; slabs are concatenated in order so the stream
/// matches a sequential z, y, x sweep.
pub fn triangulate(map: &VoxelMap, threshold: Value) -> Vec<Point> {
    let _span = info_span!("triangulate").entered();

    let [size_x, size_y, size_z] = map.voxel_count();

    let per_z: Vec<Vec<Point>> = (0..size_z)
        .into_par_iter()
        .map(|z| {
            let mut local = Vec::new();
            for y in 0..size_y {
                for x in 0..size_x {
                    triangulate_cell(&cell_corners(map, x, y, z), threshold, &mut local);
                }
            }
            local
        })
        .collect();

    // Merge per-Z slabs into a single vertex stream
    let total: usize = per_z.iter().map(|v| v.len()).sum();
    let mut vertices = Vec::with_capacity(total);
    for mut slab in per_z {
        vertices.append(&mut slab);
    }

    debug!("triangulated {} raw vertices", vertices.len());
    vertices
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;
    use crate::types::Vector;

    /// A single cell spanning [-1, 1]³ with the given lattice values, indexed `[z][y][x]`.
    fn single_cell(values: [[[Value; 2]; 2]; 2]) -> VoxelMap {
        let values = Array3::from_shape_fn((2, 2, 2), |(z, y, x)| values[z][y][x]);
        VoxelMap::from_values(values, 0., Point::new(-1., -1., -1.), 2.)
    }

    fn constant_map(value: Value) -> VoxelMap {
        VoxelMap::from_values(Array3::from_elem((4, 4, 4), value), 0., Point::origin(), 1.)
    }

    #[test]
    fn uniform_cells_emit_nothing() {
        assert!(triangulate(&constant_map(1.), 0.).is_empty());
        assert!(triangulate(&constant_map(-1.), 0.).is_empty());
    }

    #[test]
    fn corner_code_sets_one_bit_per_inside_corner() {
        let mut values = [[[-1.; 2]; 2]; 2];
        values[1][1][1] = 1.; // corner 0 (+, +, +)
        values[0][0][0] = 1.; // corner 7 (-, -, -)
        let map = single_cell(values);
        assert_eq!(corner_code(&cell_corners(&map, 0, 0, 0)), 0b1000_0001);
    }

    #[test]
    fn cell_corners_match_sign_table() {
        let map = single_cell([[[0.; 2]; 2]; 2]);
        let corners = cell_corners(&map, 0, 0, 0);
        for (corner, signs) in corners.iter().zip(CUBE_CORNERS) {
            let expected = Point::new(signs[0] as Value, signs[1] as Value, signs[2] as Value);
            assert_eq!(corner.position, expected);
        }
    }

    #[test]
    fn single_inside_corner_is_capped_by_two_triangles() {
        let mut values = [[[-1.; 2]; 2]; 2];
        values[1][1][1] = 1.;
        let map = single_cell(values);
        let vertices = triangulate(&map, 0.);

        // Corner 0 belongs to tetrahedra 0 and 4, each contributing one triangle.
        assert_eq!(vertices.len(), 6);

        let inside = Point::new(1., 1., 1.);
        for v in &vertices {
            // Every vertex is the midpoint of an edge leaving the inside corner.
            let other = Point::from(v.coords * 2. - inside.coords);
            assert!(
                CUBE_CORNERS
                    .iter()
                    .any(|s| Point::new(s[0] as Value, s[1] as Value, s[2] as Value) == other),
                "{v:?} is not on an edge from the inside corner"
            );
        }

        for tri in vertices.chunks_exact(3) {
            let normal = (tri[2] - tri[0]).cross(&(tri[1] - tri[0]));
            let centroid = Point::from((tri[0].coords + tri[1].coords + tri[2].coords) / 3.);
            // Faces point away from the inside corner.
            assert!(normal.dot(&(inside - centroid)) < 0., "{tri:?}");
        }
    }

    #[test]
    fn interpolation_follows_field_values() {
        let mut values = [[[-1.; 2]; 2]; 2];
        values[1][1][1] = 3.;
        let map = single_cell(values);
        let vertices = triangulate(&map, 0.);
        // t = (0 - 3) / (-1 - 3) = 0.75 of the way from the inside corner.
        for v in &vertices {
            let from_inside = Point::new(1., 1., 1.) - v;
            let expected = Vector::repeat(2.) * 0.75;
            assert!(from_inside.iter().all(|&d| d == 0. || d == expected.x));
        }
    }

    #[test]
    fn emits_whole_triangles_across_a_plane() {
        let map = VoxelMap::from_values(
            Array3::from_shape_fn((5, 5, 5), |(z, _, _)| z as Value - 1.7),
            0.,
            Point::origin(),
            1.,
        );
        let vertices = triangulate(&map, 0.);
        assert!(!vertices.is_empty());
        assert_eq!(vertices.len() % 3, 0);
        for v in &vertices {
            assert!((v.z - 1.7).abs() < 1e-5, "{v:?}");
        }
    }
}
