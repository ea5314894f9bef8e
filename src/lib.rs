pub mod error;
pub mod interp;
pub mod mesh;
pub mod normals;
pub mod plugin;
pub mod sampler;
pub mod settings;
pub mod tables;
pub mod triangulate;
pub mod types;
pub mod voxel_map;
pub mod voxeliser;
pub mod weld;

pub use plugin::{Voxeliser, VoxeliserPlugin};
pub use settings::{VoxeliserSettings, WeldStrategy};
pub use voxeliser::generate_mesh;
