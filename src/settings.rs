use crate::{
    error::{Result, VoxeliserError},
    types::{Value, Vector},
};

/// How near-coincident vertices are found during welding.
///
/// Both strategies produce the same clusters; they differ only in how candidates are found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WeldStrategy {
    /// Scans every unassigned vertex for each cluster seed. `O(n²)`.
    Greedy,
    /// Buckets vertices into cubes the size of the merge distance and only scans the
    /// 27 buckets around each seed.
    #[default]
    SpatialHash,
}

/// Parameters for one run of the voxeliser pipeline.
///
/// ```rust,ignore
/// let settings = VoxeliserSettings::default()
///     .with_voxel_scale(0.25)
///     .with_size(Vector::repeat(24.0))
///     .with_merge_distance_factor(0.814);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct VoxeliserSettings {
    /// Iso-surface threshold. Values **above** it are "inside".
    pub threshold: Value,
    /// Lattice spacing, in world units.
    pub voxel_scale: Value,
    /// Weld distance as a multiple of [`voxel_scale`](VoxeliserSettings::voxel_scale).
    ///
    /// Factors above about `1.0` pull cluster centers far enough to fold some
    /// triangles over, which flips their normals. The default `1.414` favours fewer
    /// vertices over clean shading.
    pub merge_distance_factor: Value,
    /// Center of the sampled box in field space.
    pub offset: Vector,
    /// Extent of the sampled box.
    pub size: Vector,
    pub weld_strategy: WeldStrategy,
}

impl Default for VoxeliserSettings {
    fn default() -> Self {
        Self {
            threshold: 0.,
            voxel_scale: 0.0625,
            merge_distance_factor: 1.414,
            offset: Vector::zeros(),
            size: Vector::repeat(3.),
            weld_strategy: WeldStrategy::default(),
        }
    }
}

impl VoxeliserSettings {
    /// Sets the iso-surface threshold.
    pub fn with_threshold(mut self, threshold: Value) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the lattice spacing.
    pub fn with_voxel_scale(mut self, voxel_scale: Value) -> Self {
        self.voxel_scale = voxel_scale;
        self
    }

    /// Sets the weld distance factor.
    pub fn with_merge_distance_factor(mut self, factor: Value) -> Self {
        self.merge_distance_factor = factor;
        self
    }

    /// Sets the center of the sampled box.
    pub fn with_offset(mut self, offset: Vector) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the extent of the sampled box.
    pub fn with_size(mut self, size: Vector) -> Self {
        self.size = size;
        self
    }

    pub fn with_weld_strategy(mut self, strategy: WeldStrategy) -> Self {
        self.weld_strategy = strategy;
        self
    }

    /// Distance under which two vertices are welded together.
    pub fn merge_distance(&self) -> Value {
        self.voxel_scale * self.merge_distance_factor
    }

    /// Number of voxels along each axis: `ceil(size / voxel_scale)`.
    pub fn voxel_count(&self) -> [usize; 3] {
        let count = (self.size / self.voxel_scale).map(Value::ceil);
        [count.x as usize, count.y as usize, count.z as usize]
    }

    /// Checks the caller contract before any sampling happens.
    pub fn validate(&self) -> Result<()> {
        if self.threshold.is_nan() {
            return Err(VoxeliserError::InvalidThreshold(self.threshold));
        }
        if !self.voxel_scale.is_finite() || self.voxel_scale <= 0. {
            return Err(VoxeliserError::InvalidVoxelScale(self.voxel_scale));
        }
        if self.size.iter().any(|s| !s.is_finite() || *s <= 0.) {
            return Err(VoxeliserError::InvalidBoxSize([
                self.size.x,
                self.size.y,
                self.size.z,
            ]));
        }
        if !self.merge_distance_factor.is_finite() || self.merge_distance_factor <= 0. {
            return Err(VoxeliserError::InvalidMergeDistance(
                self.merge_distance_factor,
            ));
        }
        Ok(())
    }
}
