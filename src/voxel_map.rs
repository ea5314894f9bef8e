use ndarray::Array3;

use crate::types::{Point, Value, Vector};

/// A dense lattice of sampled field values over a box.
///
/// The lattice has `(count_x + 1) × (count_y + 1) × (count_z + 1)` points
/// and `count_x × count_y × count_z` cells.
///
/// Values are stored row-major as `[z, y, x]`, so the linear index of `(x, y, z)` is
/// `x + y * stride_y + z * stride_z`. Each point also caches whether its value is
/// above the threshold ("inside").
///
/// Positions are local to the box: lattice point `(0, 0, 0)` sits at
/// [`origin`](VoxelMap::origin) and neighbours are [`scale`](VoxelMap::scale) apart.
#[derive(Clone, Debug)]
pub struct VoxelMap {
    values: Array3<Value>,
    inside: Array3<bool>,
    origin: Point,
    scale: Value,
}

impl VoxelMap {
    /// Wraps already-sampled values, classifying each against `threshold`.
    ///
    /// `values` is indexed `[z, y, x]`.
    pub fn from_values(values: Array3<Value>, threshold: Value, origin: Point, scale: Value) -> Self {
        let inside = values.mapv(|v| v > threshold);
        Self {
            values,
            inside,
            origin,
            scale,
        }
    }

    /// Number of cells along each axis, `[x, y, z]`.
    pub fn voxel_count(&self) -> [usize; 3] {
        let [x, y, z] = self.lattice_size();
        [
            x.saturating_sub(1),
            y.saturating_sub(1),
            z.saturating_sub(1),
        ]
    }

    /// Number of lattice points along each axis, `[x, y, z]`.
    pub fn lattice_size(&self) -> [usize; 3] {
        let (z, y, x) = self.values.dim();
        [x, y, z]
    }

    /// Row-major linear index of lattice point `(x, y, z)`.
    pub fn linear_index(&self, x: usize, y: usize, z: usize) -> usize {
        let [size_x, size_y, _] = self.lattice_size();
        x + y * size_x + z * size_x * size_y
    }

    /// Local-space position of lattice point `(0, 0, 0)`.
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Spacing between neighbouring lattice points.
    pub fn scale(&self) -> Value {
        self.scale
    }

    /// Returns the field value at lattice point `(x, y, z)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Value {
        self.values[[z, y, x]]
    }

    /// Returns whether lattice point `(x, y, z)` is above the threshold.
    #[inline]
    pub fn is_inside(&self, x: usize, y: usize, z: usize) -> bool {
        self.inside[[z, y, x]]
    }

    /// Local-space position of lattice point `(x, y, z)`.
    #[inline]
    pub fn position(&self, x: usize, y: usize, z: usize) -> Point {
        lattice_point(self.origin, self.scale, x, y, z)
    }

    /// Raw values, indexed `[z, y, x]`.
    pub fn values(&self) -> &Array3<Value> {
        &self.values
    }
}

/// Position of lattice point `(x, y, z)` given the position of `(0, 0, 0)` and the spacing.
///
/// Every caller goes through here so that shared corners of neighbouring cells are
/// bit-identical.
#[inline]
pub fn lattice_point(origin: Point, scale: Value, x: usize, y: usize, z: usize) -> Point {
    origin + Vector::new(x as Value, y as Value, z as Value) * scale
}
