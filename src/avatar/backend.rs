//! Boundary between the lifecycle core and whatever draws the avatars.

use std::time::Duration;

use glam::Vec3;

use crate::snapshot::AvatarId;

use super::AvatarVariant;

/// Identifies one asynchronous model load.
///
/// Tickets are never reused, so a completion can always be matched to the
/// request that started it, or recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub u64);

/// Request for the backend to start loading an avatar model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// Ticket to hand back on completion.
    pub ticket: LoadTicket,
    /// Avatar the model is for.
    pub id: AvatarId,
    /// Model to load.
    pub variant: AvatarVariant,
    /// Scene position the avatar had when it was first seen.
    pub spawn_at: Vec3,
}

/// Scene-graph capabilities the lifecycle core drives.
///
/// Implementations own the renderables; the core only holds their handles.
/// Loading is fire-and-forget: completion comes back through
/// [`AvatarRegistry::complete_load`](super::AvatarRegistry::complete_load).
#[cfg_attr(test, mockall::automock(type Handle = u32;))]
pub trait SceneBackend {
    /// Handle identifying a loaded renderable.
    type Handle;

    /// Starts loading a model. Must not block.
    fn request_model(&mut self, request: ModelRequest);

    /// Makes a freshly loaded renderable visible at `position`.
    fn attach(&mut self, handle: &Self::Handle, position: Vec3);

    /// Removes a renderable from the scene and releases it.
    fn detach(&mut self, handle: Self::Handle);

    /// Moves a renderable and turns it to face `facing`.
    fn place(&mut self, handle: &Self::Handle, position: Vec3, facing: Vec3);

    /// Advances the renderable's animation playback.
    fn advance_animation(&mut self, handle: &Self::Handle, elapsed: Duration);
}
