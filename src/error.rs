use derive_more::Display;

pub type Result<T> = core::result::Result<T, VoxeliserError>;

/// Precondition failures reported before the pipeline starts.
///
/// Once the settings are accepted the pipeline itself cannot fail: an empty
/// surface is an empty mesh, and non-finite field values flow into the output.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum VoxeliserError {
    #[display("voxel scale must be finite and positive, got {_0}")]
    InvalidVoxelScale(f32),
    #[display("box size must be finite and positive on every axis, got {_0:?}")]
    InvalidBoxSize([f32; 3]),
    #[display("merge distance factor must be finite and positive, got {_0}")]
    InvalidMergeDistance(f32),
    #[display("threshold must not be NaN")]
    InvalidThreshold(f32),
}

impl std::error::Error for VoxeliserError {}
