//! The static room the crowd walks through.
//!
//! Furniture placement is plain data, shifted by [`SCENE_SHIFT_X`] and
//! [`SCENE_SHIFT_Z`] so the room lines up with the sensor coordinate
//! transform. `ScenePlugin` (behind the `render` feature) spawns it once at
//! startup.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use crate::styling::SurfaceStyle;
use crate::{SCENE_SHIFT_X, SCENE_SHIFT_Z};

/// Desk model, shared by the three tables.
pub const DESK_MODEL: &str = "desk.glb";
/// Monitor model placed on each desk.
pub const MONITOR_MODEL: &str = "monitor.glb";
/// Landscape wall screen.
pub const TV_LANDSCAPE_MODEL: &str = "tv-h.glb";
/// Portrait wall screen.
pub const TV_PORTRAIT_MODEL: &str = "tv-v.glb";

const TABLE_SCALE: f32 = 3.0;
const MONITOR_SCALE: f32 = 0.8;
const MONITOR_HEIGHT: f32 = 2.1;
const TV_SCALE: f32 = 1.0;
// Authored in radians, not degrees; kept as-is so the screens keep their pose.
const TV_YAW: f32 = 90.0;

/// Floor plane width (x) and depth (z).
pub const FLOOR_SIZE: (f32, f32) = (30.0, 20.0);
/// Backdrop box width, height, depth before rotation.
pub const BACKDROP_SIZE: Vec3 = Vec3::new(10.0, 7.0, 0.2);
/// Backdrop grey as sRGB bytes.
pub const BACKDROP_GREY: u8 = 0x80;
/// Backdrop opacity.
pub const BACKDROP_ALPHA: f32 = 0.5;
/// Ambient light intensity as authored for the scene.
pub const AMBIENT_INTENSITY: f32 = 10.0;

/// Position, rotation and scale of one static model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementDescriptor {
    /// Asset path of the glTF model.
    pub model: &'static str,
    /// World position.
    pub translation: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Uniform scale.
    pub scale: f32,
    /// Material look laid over the model.
    pub style: SurfaceStyle,
}

impl PlacementDescriptor {
    fn shifted(
        model: &'static str,
        offset: Vec3,
        yaw: f32,
        scale: f32,
        style: SurfaceStyle,
    ) -> Self {
        Self {
            model,
            translation: scene_shift() + offset,
            rotation: Quat::from_rotation_y(yaw),
            scale,
            style,
        }
    }
}

/// Offset applied to every piece of the room.
#[must_use]
pub const fn scene_shift() -> Vec3 {
    Vec3::new(SCENE_SHIFT_X, 0.0, SCENE_SHIFT_Z)
}

/// Every glTF model placed in the room: desks, monitors and both screens.
#[must_use]
pub fn furniture() -> Vec<PlacementDescriptor> {
    let desks = [
        (Vec3::new(0.0, 0.0, 0.0), 0.0),
        (Vec3::new(1.0, 0.0, 1.0), 0.0),
        (Vec3::new(0.0, 0.0, 2.0), FRAC_PI_2),
    ]
    .into_iter()
    .map(|(offset, yaw)| {
        PlacementDescriptor::shifted(DESK_MODEL, offset, yaw, TABLE_SCALE, SurfaceStyle::Furniture)
    });

    let monitors = [
        Vec3::new(0.0, MONITOR_HEIGHT, 0.0),
        Vec3::new(1.0, MONITOR_HEIGHT, 1.0),
        Vec3::new(0.0, MONITOR_HEIGHT, 2.0),
    ]
    .into_iter()
    .map(|offset| {
        PlacementDescriptor::shifted(
            MONITOR_MODEL,
            offset,
            FRAC_PI_2,
            MONITOR_SCALE,
            SurfaceStyle::Furniture,
        )
    });

    let screens = [
        PlacementDescriptor::shifted(
            TV_LANDSCAPE_MODEL,
            Vec3::new(6.0, 0.0, -12.0),
            TV_YAW,
            TV_SCALE,
            SurfaceStyle::Screen,
        ),
        PlacementDescriptor::shifted(
            TV_PORTRAIT_MODEL,
            Vec3::new(8.0, 0.0, -8.0),
            TV_YAW,
            TV_SCALE,
            SurfaceStyle::Screen,
        ),
    ];

    desks.chain(monitors).chain(screens).collect()
}

/// Centre of the floor plane.
#[must_use]
pub const fn floor_centre() -> Vec3 {
    scene_shift()
}

/// Centre and orientation of the translucent backdrop.
#[must_use]
pub fn backdrop_pose() -> (Vec3, Quat) {
    (
        scene_shift() + Vec3::new(9.0, 3.0, 0.0),
        Quat::from_rotation_y(FRAC_PI_2),
    )
}

#[cfg(feature = "render")]
pub use plugin::ScenePlugin;

#[cfg(feature = "render")]
mod plugin {
    use bevy::prelude::*;
    use log::debug;

    use crate::styling::StyledScene;

    use super::{
        backdrop_pose, floor_centre, furniture, AMBIENT_INTENSITY, BACKDROP_ALPHA,
        BACKDROP_GREY, BACKDROP_SIZE, FLOOR_SIZE,
    };

    // Bevy's ambient brightness is in cd/m²; this maps the authored
    // intensity onto a comparable exposure.
    const AMBIENT_BRIGHTNESS_PER_UNIT: f32 = 100.0;

    /// Spawns the room, its lighting and the backdrop at startup.
    #[derive(Debug, Default)]
    pub struct ScenePlugin;

    impl Plugin for ScenePlugin {
        fn build(&self, app: &mut App) {
            app.insert_resource(ClearColor(Color::BLACK))
                .insert_resource(AmbientLight {
                    color: Color::WHITE,
                    brightness: AMBIENT_INTENSITY * AMBIENT_BRIGHTNESS_PER_UNIT,
                    ..default()
                })
                .add_systems(Startup, spawn_scene_system);
        }
    }

    fn spawn_scene_system(
        mut commands: Commands,
        asset_server: Res<AssetServer>,
        mut meshes: ResMut<Assets<Mesh>>,
        mut materials: ResMut<Assets<StandardMaterial>>,
    ) {
        let (floor_x, floor_z) = FLOOR_SIZE;
        commands.spawn((
            Name::new("Floor"),
            Mesh3d(meshes.add(Plane3d::default().mesh().size(floor_x, floor_z))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::BLACK,
                perceptual_roughness: 0.1,
                metallic: 0.1,
                ..default()
            })),
            Transform::from_translation(floor_centre()),
        ));

        let (centre, rotation) = backdrop_pose();
        commands.spawn((
            Name::new("Backdrop"),
            Mesh3d(meshes.add(Cuboid::new(
                BACKDROP_SIZE.x,
                BACKDROP_SIZE.y,
                BACKDROP_SIZE.z,
            ))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgba_u8(
                    BACKDROP_GREY,
                    BACKDROP_GREY,
                    BACKDROP_GREY,
                    u8::MAX,
                )
                .with_alpha(BACKDROP_ALPHA),
                alpha_mode: AlphaMode::Blend,
                unlit: true,
                ..default()
            })),
            Transform::from_translation(centre).with_rotation(rotation),
        ));

        for placement in furniture() {
            debug!("placing {} at {}", placement.model, placement.translation);
            commands.spawn((
                Name::new(placement.model),
                SceneRoot(
                    asset_server.load(GltfAssetLabel::Scene(0).from_asset(placement.model)),
                ),
                StyledScene(placement.style),
                Transform::from_translation(placement.translation)
                    .with_rotation(placement.rotation)
                    .with_scale(Vec3::splat(placement.scale)),
            ));
        }
    }
}
