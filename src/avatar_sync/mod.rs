//! Synchronisation of the avatar lifecycle core with Bevy ECS.
//!
//! [`AvatarPlugin`] keeps an [`AvatarRoster`] resource, reconciles it against
//! [`LatestSnapshot`](crate::polling::LatestSnapshot) every frame, and maps the
//! core's scene operations onto model entities through [`EcsSceneBackend`].

mod backend;
mod components;
mod plugin;

pub use backend::{face_towards, EcsSceneBackend};
pub use components::{
    avatar_model_components, AnimationDriver, AvatarAttached, AvatarModel, AvatarModelReady,
    AvatarModelRequested,
};
pub use plugin::{reconcile_avatars_system, AvatarPlugin, AvatarRoster, CrowdSystems};
