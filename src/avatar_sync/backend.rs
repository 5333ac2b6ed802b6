//! [`SceneBackend`] implementation over Bevy commands and queries.

use std::time::Duration;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use log::warn;

use crate::avatar::{ModelRequest, MotionSettings, SceneBackend};

use super::{AnimationDriver, AvatarAttached, AvatarModel, AvatarModelRequested};

type ModelQuery<'w, 's> = Query<
    'w,
    's,
    (&'static mut Transform, &'static mut AnimationDriver),
    With<AvatarModel>,
>;

/// Drives avatar model entities on behalf of the lifecycle core.
///
/// Renderable handles are the model root [`Entity`]. Loads are requested by
/// triggering [`AvatarModelRequested`]; whichever loader observes it answers
/// with [`AvatarModelReady`](super::AvatarModelReady).
#[derive(SystemParam)]
pub struct EcsSceneBackend<'w, 's> {
    commands: Commands<'w, 's>,
    models: ModelQuery<'w, 's>,
    motion: Res<'w, MotionSettings>,
}

/// Turns `transform` so the model's front (+Z, as authored in glTF) points
/// at `target`.
pub fn face_towards(transform: &mut Transform, target: Vec3) {
    let away = transform.translation - target;
    transform.look_to(away, Vec3::Y);
}

impl SceneBackend for EcsSceneBackend<'_, '_> {
    type Handle = Entity;

    fn request_model(&mut self, request: ModelRequest) {
        self.commands.trigger(AvatarModelRequested(request));
    }

    fn attach(&mut self, handle: &Entity, position: Vec3) {
        if let Ok((mut transform, _)) = self.models.get_mut(*handle) {
            transform.translation = position;
        }
        if let Ok(mut model) = self.commands.get_entity(*handle) {
            model.try_insert(AvatarAttached);
        } else {
            warn!("loaded avatar model {handle:?} vanished before attach");
        }
    }

    fn detach(&mut self, handle: Entity) {
        if let Ok(mut model) = self.commands.get_entity(handle) {
            model.despawn();
        }
    }

    fn place(&mut self, handle: &Entity, position: Vec3, facing: Vec3) {
        let Ok((mut transform, _)) = self.models.get_mut(*handle) else {
            warn!("avatar model {handle:?} missing; cannot move it");
            return;
        };
        transform.translation = position;
        face_towards(&mut transform, facing);
    }

    fn advance_animation(&mut self, handle: &Entity, elapsed: Duration) {
        if let Ok((_, mut driver)) = self.models.get_mut(*handle) {
            driver.advance(elapsed, self.motion.animation_time_scale);
        }
    }
}
