use log::debug;
use ndarray::{Array3, Zip};
use tracing::info_span;

use crate::{
    settings::VoxeliserSettings,
    types::{FieldFunction, Point, Value, Vector},
    voxel_map::{VoxelMap, lattice_point},
};

/// Evaluates `field` once per lattice point of the box described by `settings`.
///
/// The lattice has `ceil(size / voxel_scale) + 1` points per axis and is centered on
/// `settings.offset`. The resulting [`VoxelMap`] stores positions relative to that
/// offset, so the field sees `offset + local` while the mesh stays in local space.
///
/// ```text
///  local(n) = -count * scale / 2 - scale / 2 + n * scale
/// ```
///
/// Points are independent, so evaluation is spread over the Rayon pool.
pub fn sample_field(field: &FieldFunction<'_>, settings: &VoxeliserSettings) -> VoxelMap {
    let _span = info_span!("sample_field").entered();

    let [count_x, count_y, count_z] = settings.voxel_count();
    let scale = settings.voxel_scale;
    let half_range = Vector::new(count_x as Value, count_y as Value, count_z as Value) * scale / 2.;
    let origin = Point::from(-half_range - Vector::repeat(scale / 2.));
    let offset = settings.offset;

    let mut values = Array3::<Value>::zeros((count_z + 1, count_y + 1, count_x + 1));
    Zip::indexed(&mut values).par_for_each(|(z, y, x), value| {
        *value = field(lattice_point(origin, scale, x, y, z) + offset);
    });

    debug!(
        "sampled field on a {}x{}x{} lattice",
        count_x + 1,
        count_y + 1,
        count_z + 1
    );

    VoxelMap::from_values(values, settings.threshold, origin, scale)
}
