//! Avatar lifecycle core.
//!
//! [`AvatarRegistry`] owns the live avatar set and reconciles it against each
//! frame's [`Snapshot`](crate::snapshot::Snapshot): avatars are created the
//! first time their identifier appears, eased towards their target while it
//! stays listed, and removed the first frame it is missing. Drawing happens
//! behind the [`SceneBackend`] trait so the core runs without an engine.

mod backend;
mod registry;
mod variant;

pub use backend::{LoadTicket, ModelRequest, SceneBackend};
pub use registry::{AvatarEntry, AvatarPhase, AvatarRegistry, LoadOutcome, ReconcileReport};
pub use variant::AvatarVariant;

#[cfg(test)]
pub use backend::MockSceneBackend;

use bevy::prelude::Resource;

use crate::{ANIMATION_TIME_SCALE, ARRIVAL_EPSILON, STEP_FRACTION};

/// Tuning for avatar movement and animation playback.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct MotionSettings {
    /// Fraction of the remaining distance covered per frame.
    pub step_fraction: f32,
    /// Distance at which an avatar stops moving and turning.
    pub arrival_epsilon: f32,
    /// Playback speed multiplier for walk cycles.
    pub animation_time_scale: f32,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            step_fraction: STEP_FRACTION,
            arrival_epsilon: ARRIVAL_EPSILON,
            animation_time_scale: ANIMATION_TIME_SCALE,
        }
    }
}

#[cfg(test)]
mod tests;
