use bevy::platform::time::Instant;
use log::info;
use tracing::info_span;

use crate::{
    error::Result,
    mesh::GeneratedMesh,
    normals::smooth_normals,
    sampler::sample_field,
    settings::VoxeliserSettings,
    triangulate::triangulate,
    types::FieldFunction,
    weld::weld,
};

/// Runs the whole pipeline: sample, triangulate, weld, estimate normals, assemble.
///
/// ```text
/// field ──sample_field──▶ VoxelMap ──triangulate──▶ raw triangles
///       ──weld──▶ WeldedMesh ──smooth_normals──▶ normals ──assemble──▶ GeneratedMesh
/// ```
///
/// Each stage finishes before the next one starts. Vertex positions are relative to
/// `settings.offset`.
///
/// Returns an error only if `settings` break the caller contract. A field that never
/// crosses the threshold yields an empty mesh.
pub fn generate_mesh(
    field: &FieldFunction<'_>,
    settings: &VoxeliserSettings,
) -> Result<GeneratedMesh> {
    settings.validate()?;
    let _span = info_span!("generate_mesh").entered();

    let eval_timer = Instant::now();
    let voxel_map = sample_field(field, settings);
    let eval_time = eval_timer.elapsed();

    let gen_timer = Instant::now();
    let raw = triangulate(&voxel_map, settings.threshold);
    drop(voxel_map);
    let gen_time = gen_timer.elapsed();

    let clean_timer = Instant::now();
    let welded = weld(&raw, settings.merge_distance(), settings.weld_strategy);
    let normals = smooth_normals(&welded.vertices, &welded.indices);
    let clean_time = clean_timer.elapsed();

    let mesh = GeneratedMesh::assemble(welded, normals);

    info!(
        "generated mesh with {} verts and {} indices from {} raw verts",
        mesh.vertices.len(),
        mesh.indices.len(),
        raw.len()
    );
    info!(
        "eval: {:.4}s; gen: {:.4}s; clean: {:.4}s",
        eval_time.as_secs_f32(),
        gen_time.as_secs_f32(),
        clean_time.as_secs_f32()
    );

    Ok(mesh)
}
