use std::sync::Arc;

use bevy::{
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};
use log::warn;

use crate::{
    error::Result,
    mesh::GeneratedMesh,
    settings::VoxeliserSettings,
    types::{FieldFunction, Point, Value},
    voxeliser::generate_mesh,
};

/// System sets for the voxeliser pipeline.
///
/// Use these to order your own systems relative to mesh generation:
///
/// ```rust,ignore
/// // Geometry is ready but not yet uploaded, so colliders can be built here:
/// app.add_systems(Update, build_collider.after(VoxeliserSet::Generate)
///                                       .before(VoxeliserSet::Upload));
/// ```
///
/// ```text
/// VoxeliserSet::Spawn   →  [async compute]  →  VoxeliserSet::Generate  →  [your systems]  →  VoxeliserSet::Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum VoxeliserSet {
    /// Spawns an async compute task for each queued voxeliser.
    Spawn,
    /// Polls async tasks and inserts [`GeneratedMesh`] on completion.
    Generate,
    /// Uploads [`GeneratedMesh`] data into a Bevy [`Mesh3d`] and removes [`GeneratedMesh`].
    Upload,
}

/// An implicit field to be turned into a mesh on this entity.
///
/// Mesh vertices are relative to [`VoxeliserSettings::offset`], so place the entity's
/// [`Transform`] at the offset to line the mesh up with the field.
///
/// Replacing or mutating the component regenerates the mesh.
///
/// ```rust,ignore
/// commands.spawn((
///     Voxeliser::new(|p: Point| 1.0 - p.coords.norm_squared())
///         .with_settings(VoxeliserSettings::default().with_voxel_scale(0.05)),
///     MeshMaterial3d(material),
/// ));
/// ```
#[derive(Component, Clone)]
#[require(Transform)]
pub struct Voxeliser {
    /// The implicit field. Shared with the async task without copying.
    pub field: Arc<FieldFunction<'static>>,
    pub settings: VoxeliserSettings,
}

impl Voxeliser {
    /// Creates a voxeliser for `field` with default settings.
    pub fn new<F>(field: F) -> Self
    where
        F: Fn(Point) -> Value + Send + Sync + 'static,
    {
        Self {
            field: Arc::new(field),
            settings: VoxeliserSettings::default(),
        }
    }

    /// Replaces the pipeline settings.
    pub fn with_settings(mut self, settings: VoxeliserSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs the pipeline on the calling thread.
    pub fn generate(&self) -> Result<GeneratedMesh> {
        generate_mesh(self.field.as_ref(), &self.settings)
    }
}

/// Marks a [`Voxeliser`] whose field or settings still need meshing.
///
/// Cleared by the upload step, or when generation fails.
#[derive(Component)]
pub struct QueuedVoxeliser;

/// The running `generate_mesh` call for a [`Voxeliser`].
///
/// Dropping it cancels the task, which is how a changed voxeliser discards stale work.
#[derive(Component)]
pub struct ComputeTask(Task<Result<GeneratedMesh>>);

/// Limits how much meshing the plugin starts each frame.
///
/// [`VoxeliserPlugin`] inserts it with the plugin's value. Lower it while many
/// voxelisers change at once, for example when regenerating a field of asteroids:
///
/// ```rust,ignore
/// fn regenerate_belt(mut config: ResMut<VoxeliserConfig>) {
///     config.max_tasks_per_frame = 1;
/// }
/// ```
#[derive(Resource)]
pub struct VoxeliserConfig {
    /// Maximum number of async mesh tasks spawned per frame.
    ///
    /// Sampling dominates the cost and already runs on the Rayon pool, so a few tasks at a
    /// time is usually enough. Default: `2`.
    pub max_tasks_per_frame: usize,
}

impl Default for VoxeliserConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: 2,
        }
    }
}

/// Bevy plugin that drives voxeliser mesh generation.
///
/// When the `auto_queue` feature is enabled, any [`Voxeliser`] added or changed is
/// automatically processed. Mesh generation runs on Bevy's `AsyncComputeTaskPool`
/// so the main thread is never blocked:
///
/// ```text
/// Voxeliser added or changed
///   → QueuedVoxeliser inserted      (queue_changed_voxelisers)
///   → ComputeTask spawned           (VoxeliserSet::Spawn)
///   → [async compute runs]
///   → GeneratedMesh inserted        (VoxeliserSet::Generate, once task completes)
///   → [your collider systems here]
///   → Mesh3d inserted               (VoxeliserSet::Upload)
///   → QueuedVoxeliser + GeneratedMesh removed
/// ```
pub struct VoxeliserPlugin {
    /// Initial value for [`VoxeliserConfig::max_tasks_per_frame`].
    pub max_tasks_per_frame: usize,
}

impl Default for VoxeliserPlugin {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: VoxeliserConfig::default().max_tasks_per_frame,
        }
    }
}

impl Plugin for VoxeliserPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(VoxeliserConfig {
            max_tasks_per_frame: self.max_tasks_per_frame,
        });

        #[cfg(feature = "auto_queue")]
        app.configure_sets(
            Update,
            (
                VoxeliserSet::Spawn,
                VoxeliserSet::Generate,
                VoxeliserSet::Upload,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                queue_changed_voxelisers.before(VoxeliserSet::Spawn),
                spawn_mesh_tasks.in_set(VoxeliserSet::Spawn),
                poll_mesh_tasks.in_set(VoxeliserSet::Generate),
                upload_mesh.in_set(VoxeliserSet::Upload),
            ),
        );
    }
}

/// Queues every added or changed [`Voxeliser`].
///
/// A task already running for the old field is dropped, which cancels it.
fn queue_changed_voxelisers(
    mut commands: Commands,
    query: Query<(Entity, Has<ComputeTask>), Changed<Voxeliser>>,
) {
    for (entity, running) in query.iter() {
        let mut entity = commands.entity(entity);
        if running {
            entity.remove::<ComputeTask>();
        }
        entity.remove::<GeneratedMesh>().insert(QueuedVoxeliser);
    }
}

/// Starts `generate_mesh` on the async pool for queued voxelisers, capped by
/// [`VoxeliserConfig::max_tasks_per_frame`].
fn spawn_mesh_tasks(
    mut commands: Commands,
    config: Res<VoxeliserConfig>,
    query: Query<
        (Entity, &Voxeliser),
        (
            With<QueuedVoxeliser>,
            Without<ComputeTask>,
            Without<GeneratedMesh>,
        ),
    >,
) {
    let task_pool = AsyncComputeTaskPool::get();

    for (entity, voxeliser) in query.iter().take(config.max_tasks_per_frame) {
        let field = Arc::clone(&voxeliser.field);
        let settings = voxeliser.settings.clone();

        let task = task_pool.spawn(async move { generate_mesh(field.as_ref(), &settings) });

        commands.entity(entity).insert(ComputeTask(task));
    }
}

/// Moves finished meshes out of their [`ComputeTask`] as [`GeneratedMesh`].
///
/// Tasks still running are left alone. Settings that fail validation end the task
/// with an error, which is logged before the entity leaves the queue.
fn poll_mesh_tasks(mut commands: Commands, mut query: Query<(Entity, &mut ComputeTask)>) {
    for (entity, mut compute_task) in query.iter_mut() {
        let Some(result) = block_on(future::poll_once(&mut compute_task.0)) else {
            continue;
        };

        let mut entity_commands = commands.entity(entity);
        entity_commands.remove::<ComputeTask>();
        match result {
            Ok(generated_mesh) => {
                entity_commands.insert(generated_mesh);
            }
            Err(error) => {
                warn!("voxeliser on {entity} failed: {error}");
                entity_commands.remove::<QueuedVoxeliser>();
            }
        }
    }
}

/// Uploads a [`GeneratedMesh`] into a Bevy [`Mesh3d`], then removes [`GeneratedMesh`] and [`QueuedVoxeliser`].
///
/// Any previous [`Mesh3d`] on the entity is replaced.
fn upload_mesh(
    mut commands: Commands,
    query: Query<(Entity, &GeneratedMesh), With<QueuedVoxeliser>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, generated) in query.iter() {
        commands
            .entity(entity)
            .insert(Mesh3d(meshes.add(generated.to_mesh())))
            .remove::<(GeneratedMesh, QueuedVoxeliser)>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vector;

    fn small_sphere() -> Voxeliser {
        Voxeliser::new(|p: Point| 1. - p.coords.norm_squared()).with_settings(
            VoxeliserSettings::default()
                .with_voxel_scale(0.25)
                .with_size(Vector::repeat(3.)),
        )
    }

    #[test]
    fn generate_runs_inline() {
        let mesh = small_sphere().generate().unwrap();
        assert!(!mesh.is_empty());
    }

    #[test]
    fn invalid_settings_surface_as_errors() {
        let mut voxeliser = small_sphere();
        voxeliser.settings.size = Vector::new(1., -1., 1.);
        assert!(voxeliser.generate().is_err());
    }

    #[test]
    fn changed_voxeliser_is_queued() {
        let mut app = App::new();
        app.add_systems(Update, queue_changed_voxelisers);

        let entity = app.world_mut().spawn(small_sphere()).id();
        app.update();
        assert!(app.world().entity(entity).contains::<QueuedVoxeliser>());

        app.world_mut().entity_mut(entity).remove::<QueuedVoxeliser>();
        app.update();
        assert!(!app.world().entity(entity).contains::<QueuedVoxeliser>());

        app.world_mut()
            .get_mut::<Voxeliser>(entity)
            .unwrap()
            .settings
            .threshold = 0.5;
        app.update();
        assert!(app.world().entity(entity).contains::<QueuedVoxeliser>());
    }
}
