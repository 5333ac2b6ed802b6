//! The live avatar set and the per-frame reconciliation against a snapshot.

use std::time::Duration;

use glam::Vec3;
use hashbrown::HashMap;
use log::{debug, warn};
use rand::Rng;

use crate::snapshot::{AvatarId, Snapshot};

use super::{AvatarVariant, LoadTicket, ModelRequest, MotionSettings, SceneBackend};

/// Whether an avatar's renderable exists yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarPhase<H> {
    /// The model load is in flight.
    Pending {
        /// Ticket of the outstanding load.
        ticket: LoadTicket,
    },
    /// The renderable is attached to the scene.
    Ready {
        /// Backend handle of the renderable.
        handle: H,
    },
}

/// One live avatar.
#[derive(Debug, Clone)]
pub struct AvatarEntry<H> {
    phase: AvatarPhase<H>,
    variant: AvatarVariant,
    position: Vec3,
    target: Vec3,
}

impl<H> AvatarEntry<H> {
    /// Load state of the renderable.
    #[must_use]
    pub const fn phase(&self) -> &AvatarPhase<H> {
        &self.phase
    }

    /// Model variant rolled at creation.
    #[must_use]
    pub const fn variant(&self) -> AvatarVariant {
        self.variant
    }

    /// Current scene position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Position the avatar is easing towards.
    #[must_use]
    pub const fn target(&self) -> Vec3 {
        self.target
    }

    /// Whether the renderable has been attached.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.phase, AvatarPhase::Ready { .. })
    }

    /// Renderable handle once loaded.
    #[must_use]
    pub const fn handle(&self) -> Option<&H> {
        match &self.phase {
            AvatarPhase::Ready { handle } => Some(handle),
            AvatarPhase::Pending { .. } => None,
        }
    }
}

/// Summary of one reconciliation pass, mostly for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Identifiers seen for the first time; their loads were requested.
    pub created: Vec<AvatarId>,
    /// Ready avatars that stepped towards their target.
    pub moved: Vec<AvatarId>,
    /// Identifiers dropped because the snapshot no longer lists them.
    pub removed: Vec<AvatarId>,
    /// Number of animation drivers advanced.
    pub animated: usize,
    /// The snapshot was empty, so only idle animation ran.
    pub idle: bool,
}

/// Result of handing a finished model load back to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The renderable now belongs to this avatar.
    Attached(AvatarId),
    /// Nobody is waiting for the ticket any more; the renderable was detached.
    Orphaned,
}

/// Live avatars keyed by identifier.
///
/// `H` is the backend's renderable handle type.
#[derive(Debug)]
pub struct AvatarRegistry<H> {
    live: HashMap<AvatarId, AvatarEntry<H>>,
    /// In-flight loads; an id is here iff its entry is pending.
    pending: HashMap<LoadTicket, AvatarId>,
    next_ticket: u64,
}

impl<H> Default for AvatarRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> AvatarRegistry<H> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            live: HashMap::new(),
            pending: HashMap::new(),
            next_ticket: 0,
        }
    }

    /// Number of live avatars, loaded or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no avatars are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Looks up a live avatar.
    #[must_use]
    pub fn get(&self, id: &AvatarId) -> Option<&AvatarEntry<H>> {
        self.live.get(id)
    }

    /// Whether `id` is live.
    #[must_use]
    pub fn contains(&self, id: &AvatarId) -> bool {
        self.live.contains_key(id)
    }

    /// Identifiers of all live avatars, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &AvatarId> {
        self.live.keys()
    }

    /// Iterates live avatars, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&AvatarId, &AvatarEntry<H>)> {
        self.live.iter()
    }

    /// Number of model loads still outstanding for live avatars.
    #[must_use]
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    /// Aligns the live set with `snapshot` and advances every loaded avatar.
    ///
    /// An empty snapshot is treated as a data outage: avatars keep their
    /// idle animation but nothing is created, moved, or removed.
    pub fn reconcile<B, R>(
        &mut self,
        snapshot: &Snapshot,
        elapsed: Duration,
        motion: &MotionSettings,
        backend: &mut B,
        rng: &mut R,
    ) -> ReconcileReport
    where
        B: SceneBackend<Handle = H>,
        R: Rng + ?Sized,
    {
        let mut report = ReconcileReport::default();

        if snapshot.is_empty() {
            report.idle = true;
            for entry in self.live.values() {
                if let Some(handle) = entry.handle() {
                    backend.advance_animation(handle, elapsed);
                    report.animated += 1;
                }
            }
            return report;
        }

        for (id, fields) in snapshot.iter() {
            let target = fields.scene_position();

            let Some(entry) = self.live.get_mut(id) else {
                let variant = AvatarVariant::pick(rng);
                self.spawn(id.clone(), target, variant, backend);
                report.created.push(id.clone());
                continue;
            };

            entry.target = target;
            let AvatarPhase::Ready { handle } = &entry.phase else {
                continue;
            };

            if target.is_finite() {
                let direction = target - entry.position;
                if direction.length() > motion.arrival_epsilon {
                    entry.position += direction * motion.step_fraction;
                    backend.place(handle, entry.position, target);
                    report.moved.push(id.clone());
                }
            }
            backend.advance_animation(handle, elapsed);
            report.animated += 1;
        }

        let gone: Vec<AvatarId> = self
            .live
            .keys()
            .filter(|id| !snapshot.contains(id))
            .cloned()
            .collect();
        for id in gone {
            self.despawn(&id, backend);
            report.removed.push(id);
        }

        report
    }

    /// Hands a finished model load back to the registry.
    ///
    /// The renderable is attached only when `ticket` still belongs to a
    /// pending avatar. A load that outlived its avatar, or a second
    /// completion for the same ticket, is detached straight away so it
    /// cannot leak into the scene.
    pub fn complete_load<B>(&mut self, ticket: LoadTicket, handle: H, backend: &mut B) -> LoadOutcome
    where
        B: SceneBackend<Handle = H>,
    {
        let Some(id) = self.pending.remove(&ticket) else {
            debug!("discarding model for stale load {ticket:?}");
            backend.detach(handle);
            return LoadOutcome::Orphaned;
        };

        let Some(entry) = self.live.get_mut(&id) else {
            warn!("pending load {ticket:?} had no live avatar {id}");
            backend.detach(handle);
            return LoadOutcome::Orphaned;
        };

        backend.attach(&handle, entry.position);
        entry.phase = AvatarPhase::Ready { handle };
        debug!("avatar {id} attached at {}", entry.position);
        LoadOutcome::Attached(id)
    }

    fn spawn<B>(&mut self, id: AvatarId, target: Vec3, variant: AvatarVariant, backend: &mut B)
    where
        B: SceneBackend<Handle = H>,
    {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;

        // Unknown coordinates leave the avatar at the origin until a usable
        // target arrives.
        let spawn_at = if target.is_finite() { target } else { Vec3::ZERO };

        debug!("avatar {id} first seen; loading {variant:?} as {ticket:?}");
        self.pending.insert(ticket, id.clone());
        backend.request_model(ModelRequest {
            ticket,
            id: id.clone(),
            variant,
            spawn_at,
        });
        self.live.insert(
            id,
            AvatarEntry {
                phase: AvatarPhase::Pending { ticket },
                variant,
                position: spawn_at,
                target,
            },
        );
    }

    fn despawn<B>(&mut self, id: &AvatarId, backend: &mut B)
    where
        B: SceneBackend<Handle = H>,
    {
        let Some(entry) = self.live.remove(id) else {
            return;
        };
        match entry.phase {
            AvatarPhase::Ready { handle } => {
                debug!("avatar {id} left the snapshot; detaching");
                backend.detach(handle);
            }
            AvatarPhase::Pending { ticket } => {
                debug!("avatar {id} left the snapshot before {ticket:?} finished");
                self.pending.remove(&ticket);
            }
        }
    }
}
