//! ECS components and events for avatar models.

use std::time::Duration;

use bevy::prelude::*;

use crate::avatar::{AvatarVariant, LoadTicket, ModelRequest};
use crate::snapshot::AvatarId;

/// Root entity of one avatar's model.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct AvatarModel {
    /// Tracked identifier the model represents.
    pub id: AvatarId,
    /// Model variant loaded for it.
    pub variant: AvatarVariant,
}

/// Marker added once the lifecycle core has accepted a loaded model.
///
/// Models without it are either still settling or orphaned and about to be
/// despawned; presentation systems only show attached models.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AvatarAttached;

/// Playback clock for an avatar's walk cycle.
///
/// Only advanced by the reconcile pass, so avatars that are still loading, or
/// whose identifier has vanished, never animate.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct AnimationDriver {
    playback_secs: f32,
}

impl AnimationDriver {
    /// Advances playback by `elapsed` scaled by `time_scale`.
    pub const fn advance(&mut self, elapsed: Duration, time_scale: f32) {
        self.playback_secs += elapsed.as_secs_f32() * time_scale;
    }

    /// Seconds of clip time played so far.
    #[must_use]
    pub const fn playback_secs(&self) -> f32 {
        self.playback_secs
    }
}

/// Triggered when the lifecycle core wants a model loaded.
///
/// A loader observes this, spawns the model entity once its asset is ready
/// (see [`avatar_model_components`]) and answers with [`AvatarModelReady`].
#[derive(Event, Debug, Clone, PartialEq)]
pub struct AvatarModelRequested(pub ModelRequest);

/// Triggered by a loader when a requested model entity exists.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarModelReady {
    /// Ticket from the originating [`AvatarModelRequested`].
    pub ticket: LoadTicket,
    /// Root entity of the spawned model.
    pub model: Entity,
}

/// Components every avatar model root carries, whichever loader spawned it.
#[must_use]
pub fn avatar_model_components(request: &ModelRequest) -> impl Bundle {
    (
        Name::new(format!("Avatar {}", request.id)),
        AvatarModel {
            id: request.id.clone(),
            variant: request.variant,
        },
        AnimationDriver::default(),
        Transform::from_translation(request.spawn_at)
            .with_scale(Vec3::splat(request.variant.scale())),
    )
}
