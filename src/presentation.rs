//! Camera setup, orbiting and keyboard panning for the viewer.
//!
//! The camera looks down on the room from above the desks and orbits a focus
//! point on the floor. Dragging with the left mouse button swings it around
//! the focus, the scroll wheel moves it closer or further away, and WASD or
//! the arrow keys slide camera and focus together across the floor relative
//! to the current heading. Swings ease out rather than stopping dead.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::{Component, Resource};
use glam::{Quat, Vec2, Vec3};

/// Where the viewer camera starts.
pub const CAMERA_START: Vec3 = Vec3::new(-10.0, 20.0, 20.0);
/// The point the camera orbits on startup.
pub const CAMERA_FOCUS: Vec3 = Vec3::new(-5.0, 0.0, 10.0);
/// Vertical field of view in degrees.
pub const CAMERA_FOV_DEGREES: f32 = 75.0;

// Keeps the camera off the floor and short of looking straight down.
const MIN_PITCH: f32 = 0.05;
const MAX_PITCH: f32 = FRAC_PI_2 - 0.05;
const SETTLED: f32 = 1e-5;

/// Runtime configuration for camera panning, orbiting and zoom.
///
/// The `max_delta_seconds` field clamps the frame time used for panning so a
/// hitch cannot fling the camera across the room.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct CameraSettings {
    /// Pan speed in world units per second.
    pub pan_speed: f32,
    /// Largest frame time used for a single pan step.
    pub max_delta_seconds: f32,
    /// Orbit angle per pixel of mouse drag, in radians.
    pub rotate_speed: f32,
    /// Distance factor per scroll line; below one, scrolling up moves closer.
    pub zoom_step: f32,
    /// Share of the outstanding orbit swing applied each frame.
    pub damping: f32,
    /// Closest the camera may get to its focus.
    pub min_distance: f32,
    /// Furthest the camera may get from its focus.
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            pan_speed: 10.0,
            max_delta_seconds: 0.1,
            rotate_speed: 0.005,
            zoom_step: 0.95,
            damping: 0.05,
            min_distance: 2.0,
            max_distance: 80.0,
        }
    }
}

/// Camera pose held as an offset from the point it orbits.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct OrbitRig {
    /// Point the camera looks at.
    pub focus: Vec3,
    offset: Vec3,
    /// Outstanding (yaw, pitch) swing still to be eased in.
    pending: Vec2,
}

impl OrbitRig {
    /// Rig for a camera at `eye` looking at `focus`.
    #[must_use]
    pub fn new(eye: Vec3, focus: Vec3) -> Self {
        Self {
            focus,
            offset: eye - focus,
            pending: Vec2::ZERO,
        }
    }

    /// Camera position.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        self.focus + self.offset
    }

    /// Distance from the camera to its focus.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.offset.length()
    }

    /// Heading around the vertical axis; zero looks along -Z.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.offset.x.atan2(self.offset.z)
    }

    /// Elevation above the floor plane, in radians.
    #[must_use]
    pub fn pitch(&self) -> f32 {
        let distance = self.distance();
        if distance <= f32::EPSILON {
            return 0.0;
        }
        (self.offset.y / distance).clamp(-1.0, 1.0).asin()
    }

    /// Queues a swing for a mouse drag of `drag` pixels.
    ///
    /// Dragging right swings the camera left around the focus; dragging down
    /// raises it.
    pub fn rotate(&mut self, drag: Vec2, settings: &CameraSettings) {
        self.pending += Vec2::new(-drag.x, drag.y) * settings.rotate_speed;
    }

    /// Moves towards the focus for positive `lines` of scroll, away for
    /// negative, within the configured distance range.
    pub fn zoom(&mut self, lines: f32, settings: &CameraSettings) {
        if lines.abs() < f32::EPSILON {
            return;
        }
        let distance = (self.distance() * settings.zoom_step.powf(lines))
            .clamp(settings.min_distance, settings.max_distance);
        self.offset = self.offset.normalize_or_zero() * distance;
    }

    /// Applies `damping` of the outstanding swing and keeps the rest for
    /// later frames.
    pub fn settle(&mut self, damping: f32) {
        if self.pending.length() < SETTLED {
            self.pending = Vec2::ZERO;
            return;
        }
        let distance = self.distance();
        if distance <= f32::EPSILON {
            return;
        }
        let step = self.pending * damping;
        self.pending *= 1.0 - damping;

        let yaw = self.yaw() + step.x;
        let pitch = (self.pitch() + step.y).clamp(MIN_PITCH, MAX_PITCH);
        self.offset = Vec3::new(
            pitch.cos() * yaw.sin(),
            pitch.sin(),
            pitch.cos() * yaw.cos(),
        ) * distance;
    }

    /// Whether no swing is left to ease in.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending == Vec2::ZERO
    }
}

/// Directional key states for camera panning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "This struct represents the pressed state of exactly four directional keys."
)]
pub struct PanInput {
    /// W or `ArrowUp`.
    pub up: bool,
    /// S or `ArrowDown`.
    pub down: bool,
    /// A or `ArrowLeft`.
    pub left: bool,
    /// D or `ArrowRight`.
    pub right: bool,
}

/// Computes a normalised screen-space pan direction from the key states.
///
/// Opposing keys cancel; diagonals are normalised.
///
/// ```
/// use crowd3d::presentation::{compute_pan_direction, PanInput};
///
/// let input = PanInput { up: true, right: true, ..Default::default() };
/// let diag = compute_pan_direction(input);
/// assert!((diag.length() - 1.0).abs() < 0.001);
/// ```
#[must_use]
pub fn compute_pan_direction(input: PanInput) -> Vec2 {
    const fn axis(neg: bool, pos: bool) -> f32 {
        match (neg, pos) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    let raw = Vec2::new(axis(input.left, input.right), axis(input.down, input.up));
    raw.normalize_or_zero()
}

/// World-space camera offset for one frame of panning.
///
/// Screen up moves along the camera's heading `yaw` (towards -Z at zero);
/// screen right moves to its right. The camera never changes height.
#[must_use]
pub fn pan_offset(direction: Vec2, yaw: f32, settings: &CameraSettings, delta_secs: f32) -> Vec3 {
    let clamped_max = settings.max_delta_seconds.max(f32::EPSILON);
    let step = direction * settings.pan_speed * delta_secs.min(clamped_max);
    Quat::from_rotation_y(yaw) * Vec3::new(step.x, 0.0, -step.y)
}

#[cfg(feature = "render")]
pub use plugin::{camera_orbit_system, camera_pan_system, CameraController, PresentationPlugin};

#[cfg(feature = "render")]
mod plugin {
    use bevy::core_pipeline::tonemapping::Tonemapping;
    use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
    use bevy::prelude::*;

    use super::{
        compute_pan_direction, pan_offset, CameraSettings, OrbitRig, PanInput, CAMERA_FOCUS,
        CAMERA_FOV_DEGREES, CAMERA_START,
    };

    // Pixel-precision scroll (touchpads) reported per notch of a wheel.
    const PIXELS_PER_LINE: f32 = 100.0;

    /// Marker component for the viewer camera.
    #[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
    #[reflect(Component, Default)]
    pub struct CameraController;

    /// Slides the camera focus over the floor from WASD or arrow keys.
    #[expect(
        clippy::needless_pass_by_value,
        reason = "Bevy systems require parameters by value, not by reference."
    )]
    pub fn camera_pan_system(
        keyboard: Res<ButtonInput<KeyCode>>,
        time: Res<Time>,
        settings: Res<CameraSettings>,
        mut rigs: Query<&mut OrbitRig, With<CameraController>>,
    ) {
        let Ok(mut rig) = rigs.single_mut() else {
            return;
        };

        let input = PanInput {
            up: keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp),
            down: keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown),
            left: keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft),
            right: keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight),
        };

        let direction = compute_pan_direction(input);
        if direction == Vec2::ZERO {
            return;
        }
        let yaw = rig.yaw();
        rig.focus += pan_offset(direction, yaw, &settings, time.delta_secs());
    }

    /// Swings and zooms the camera around its focus, then places it.
    #[expect(
        clippy::needless_pass_by_value,
        reason = "Bevy systems require parameters by value, not by reference."
    )]
    pub fn camera_orbit_system(
        buttons: Res<ButtonInput<MouseButton>>,
        motion: Res<AccumulatedMouseMotion>,
        scroll: Res<AccumulatedMouseScroll>,
        settings: Res<CameraSettings>,
        mut cameras: Query<(&mut Transform, &mut OrbitRig), With<CameraController>>,
    ) {
        let Ok((mut transform, mut rig)) = cameras.single_mut() else {
            return;
        };

        if buttons.pressed(MouseButton::Left) {
            rig.rotate(motion.delta, &settings);
        }
        let lines = match scroll.unit {
            MouseScrollUnit::Line => scroll.delta.y,
            MouseScrollUnit::Pixel => scroll.delta.y / PIXELS_PER_LINE,
        };
        rig.zoom(lines, &settings);
        rig.settle(settings.damping);

        let eye = rig.eye();
        if transform.translation != eye {
            *transform = Transform::from_translation(eye).looking_at(rig.focus, Vec3::Y);
        }
    }

    /// Spawns the perspective camera unless the host app already has one.
    fn camera_setup(mut commands: Commands, cameras: Query<&Camera3d>) {
        if !cameras.is_empty() {
            return;
        }
        commands.spawn((
            Camera3d::default(),
            Projection::Perspective(PerspectiveProjection {
                fov: CAMERA_FOV_DEGREES.to_radians(),
                ..default()
            }),
            Tonemapping::None,
            Transform::from_translation(CAMERA_START).looking_at(CAMERA_FOCUS, Vec3::Y),
            OrbitRig::new(CAMERA_START, CAMERA_FOCUS),
            CameraController,
            Name::new("ViewerCamera"),
        ));
    }

    /// Plugin owning the viewer camera.
    #[derive(Debug, Default)]
    pub struct PresentationPlugin;

    impl Plugin for PresentationPlugin {
        fn build(&self, app: &mut App) {
            app.register_type::<CameraController>();
            app.init_resource::<CameraSettings>();
            app.add_systems(Startup, camera_setup);
            app.add_systems(Update, (camera_pan_system, camera_orbit_system).chain());
        }
    }
}
