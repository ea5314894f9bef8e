use bevy::prelude::*;
use bevy_infinite_grid::{InfiniteGridBundle, InfiniteGridPlugin, InfiniteGridSettings};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};
use bevy_voxeliser::{
    Voxeliser, VoxeliserPlugin, VoxeliserSettings,
    types::{Point, Value, Vector},
};
use noiz::prelude::*;

type RockNoise = Noise<
    LayeredNoise<
        Normed<f32>,
        Persistence,
        Octave<MixCellGradients<OrthoGrid, Smoothstep, QuickGradients>>,
    >,
>;

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            VoxeliserPlugin::default(),
            PanOrbitCameraPlugin,
            InfiniteGridPlugin,
        ))
        .add_systems(Startup, setup)
        .add_systems(Update, (reshape_on_space, debug))
        .run();
}

/// Ellipsoid body roughened by layered gradient noise.
fn asteroid(shape: Vector, seed: Vec3) -> Voxeliser {
    let mut noise = RockNoise::default();
    noise.set_frequency(0.05);

    let field = move |p: Point| -> Value {
        let body = p.x * p.x / shape.x + p.y * p.y / shape.y + p.z * p.z / shape.z;
        let rough: f32 = noise.sample_for(Vec3::new(p.x, p.y, p.z) + seed);
        80.0 - body + rough * 40.0
    };

    // Coarse lattice and a tighter weld than the defaults.
    Voxeliser::new(field).with_settings(
        VoxeliserSettings::default()
            .with_voxel_scale(1.0)
            .with_merge_distance_factor(0.814)
            .with_size(Vector::repeat(24.0)),
    )
}

fn setup(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    commands.spawn(InfiniteGridBundle {
        settings: InfiniteGridSettings {
            fadeout_distance: 200.0,
            ..Default::default()
        },
        ..Default::default()
    });

    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(20., 25., 20.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::FULL_DAYLIGHT,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    commands.spawn((
        asteroid(Vector::repeat(1.0).normalize(), Vec3::ZERO),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.45, 0.4, 0.35),
            perceptual_roughness: 0.9,
            ..Default::default()
        })),
        Transform::from_xyz(0., 14., 0.),
    ));
}

/// Press space to swap in a new shape. The plugin picks up the change and remeshes.
fn reshape_on_space(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut generation: Local<u32>,
    mut query: Query<&mut Voxeliser>,
) {
    if !keyboard.just_pressed(KeyCode::Space) {
        return;
    }
    *generation += 1;

    // Cheap deterministic spread over [0.35, 1.0) per axis.
    let g = *generation as f32;
    let axis = |k: f32| 0.35 + 0.65 * (g * k).sin().abs();
    let shape = Vector::new(axis(1.7), axis(2.3), axis(3.1)).normalize();
    let seed = Vec3::splat(g * 137.0);

    for mut voxeliser in query.iter_mut() {
        *voxeliser = asteroid(shape, seed);
    }
}

fn debug(mut gizmos: Gizmos, query: Query<(&GlobalTransform, &Voxeliser)>) {
    for (transform, voxeliser) in query.iter() {
        let size = voxeliser.settings.size;
        gizmos.cube(
            Transform::from_translation(transform.translation())
                .with_scale(Vec3::new(size.x, size.y, size.z)),
            Color::WHITE,
        );
    }
}
