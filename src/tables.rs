//! Lookup tables for Marching Tetrahedra.
//!
//! Corner layout of a cube, as signs around its center:
//!
//! ```text
//!       5----4         +Y
//!      /|   /|          |
//!     1----0 |          *-- +X
//!     | 7--|-6         /
//!     |/   |/        +Z
//!     3----2
//!
//!  0 = (+, +, +)    4 = (+, +, -)
//!  1 = (-, +, +)    5 = (-, +, -)
//!  2 = (+, -, +)    6 = (+, -, -)
//!  3 = (-, -, +)    7 = (-, -, -)
//! ```
//!
//! Corner `i` owns bit `i` of the cube's corner code.

/// Sign offsets of the 8 cube corners relative to the cube center.
///
/// A `+1` component reads lattice index `n + 1`, a `-1` component reads index `n`.
pub const CUBE_CORNERS: [[i8; 3]; 8] = [
    [ 1,  1,  1],
    [-1,  1,  1],
    [ 1, -1,  1],
    [-1, -1,  1],
    [ 1,  1, -1],
    [-1,  1, -1],
    [ 1, -1, -1],
    [-1, -1, -1],
];

/// The 6 tetrahedra a cube is split into, all sharing the 3–4 diagonal.
///
/// Each tetrahedron lists one face in a fixed winding followed by the apex.
/// The order is what makes [`TETRA_PATTERNS`] produce outward-facing triangles.
pub const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 4, 2, 3],
    [3, 7, 5, 4],
    [1, 5, 4, 3],
    [2, 6, 3, 4],
    [0, 3, 1, 4],
    [4, 7, 6, 3],
];

pub const EDGE_01: u8 = 0;
pub const EDGE_12: u8 = 1;
pub const EDGE_20: u8 = 2;
pub const EDGE_03: u8 = 3;
pub const EDGE_13: u8 = 4;
pub const EDGE_23: u8 = 5;

/// Tetrahedron corner pairs for each of the 6 edges.
pub const TETRA_EDGES: [[usize; 2]; 6] = [
    [0, 1],
    [1, 2],
    [2, 0],
    [0, 3],
    [1, 3],
    [2, 3],
];

/// Edge sequences for each 4-bit tetrahedron code (bit `j` = corner `j` inside).
///
/// Every group of three edges is one triangle.
pub const TETRA_PATTERNS: [&[u8]; 16] = [
    &[],                                                // 0000
    &[EDGE_01, EDGE_03, EDGE_20],                       // 0001
    &[EDGE_12, EDGE_13, EDGE_01],                       // 0010
    &[EDGE_12, EDGE_13, EDGE_03, EDGE_12, EDGE_03, EDGE_20], // 0011
    &[EDGE_12, EDGE_20, EDGE_23],                       // 0100
    &[EDGE_01, EDGE_03, EDGE_12, EDGE_12, EDGE_03, EDGE_23], // 0101
    &[EDGE_13, EDGE_01, EDGE_20, EDGE_13, EDGE_20, EDGE_23], // 0110
    &[EDGE_13, EDGE_03, EDGE_23],                       // 0111
    &[EDGE_13, EDGE_23, EDGE_03],                       // 1000
    &[EDGE_01, EDGE_13, EDGE_23, EDGE_01, EDGE_23, EDGE_20], // 1001
    &[EDGE_01, EDGE_12, EDGE_23, EDGE_01, EDGE_23, EDGE_03], // 1010
    &[EDGE_12, EDGE_23, EDGE_20],                       // 1011
    &[EDGE_13, EDGE_12, EDGE_20, EDGE_13, EDGE_20, EDGE_03], // 1100
    &[EDGE_01, EDGE_13, EDGE_12],                       // 1101
    &[EDGE_01, EDGE_20, EDGE_03],                       // 1110
    &[],                                                // 1111
];
