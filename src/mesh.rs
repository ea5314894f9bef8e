use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
};

use crate::{types::Vector, weld::WeldedMesh};

/// Final output of the voxeliser pipeline, ready to hand to a renderer or collider.
///
/// Inserted on a [`Voxeliser`](crate::plugin::Voxeliser) entity once its async task
/// finishes, and consumed by the upload system. Systems ordered between
/// [`VoxeliserSet::Generate`](crate::plugin::VoxeliserSet::Generate) and
/// [`VoxeliserSet::Upload`](crate::plugin::VoxeliserSet::Upload) can read it to build
/// colliders.
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct GeneratedMesh {
    /// Welded vertex positions, local to the sampled box.
    pub vertices: Vec<[f32; 3]>,
    /// Three indices into `vertices` per triangle.
    pub indices: Vec<u32>,
    /// One smooth normal per vertex.
    pub normals: Vec<[f32; 3]>,
    /// One UV per vertex, always zero.
    pub uvs: Vec<[f32; 2]>,
}

impl GeneratedMesh {
    /// Bundles welded geometry and its normals, adding a zero-filled UV channel.
    pub fn assemble(welded: WeldedMesh, normals: Vec<Vector>) -> Self {
        debug_assert_eq!(welded.vertices.len(), normals.len());

        let uvs = vec![[0., 0.]; welded.vertices.len()];
        Self {
            vertices: welded.vertices.iter().map(|v| [v.x, v.y, v.z]).collect(),
            indices: welded.indices,
            normals: normals.iter().map(|n| [n.x, n.y, n.z]).collect(),
            uvs,
        }
    }

    /// Returns `true` if no triangle survived.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flattens the indexed triangles into a triangle soup, three positions per face.
    ///
    /// This is the layout concave collision shapes usually expect.
    pub fn collision_faces(&self) -> Vec<[f32; 3]> {
        self.indices
            .iter()
            .map(|&i| self.vertices[i as usize])
            .collect()
    }

    /// Builds a Bevy [`Mesh`], moving the buffers into it.
    pub fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD,
        );

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.vertices);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }

    /// Builds a Bevy [`Mesh`] from a copy of the buffers.
    pub fn to_mesh(&self) -> Mesh {
        self.clone().into_mesh()
    }
}
