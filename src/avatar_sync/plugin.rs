//! Bevy plugin wiring the avatar lifecycle into the schedule.

use bevy::prelude::*;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::avatar::{AvatarRegistry, LoadOutcome, MotionSettings, ReconcileReport};
use crate::polling::LatestSnapshot;

use super::{AvatarModelReady, EcsSceneBackend};

/// Ordering of the crowd systems inside `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrowdSystems {
    /// Fetch scheduling and snapshot hand-over.
    Receive,
    /// Avatar reconciliation against the latest snapshot.
    Reconcile,
}

/// Live avatar set plus the random source used for variant rolls.
#[derive(Resource, Debug)]
pub struct AvatarRoster {
    registry: AvatarRegistry<Entity>,
    rng: StdRng,
    last_report: ReconcileReport,
}

impl Default for AvatarRoster {
    fn default() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl AvatarRoster {
    /// Creates a roster with a deterministic variant roll.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            registry: AvatarRegistry::new(),
            rng,
            last_report: ReconcileReport::default(),
        }
    }

    /// The live avatars keyed by identifier.
    #[must_use]
    pub const fn registry(&self) -> &AvatarRegistry<Entity> {
        &self.registry
    }

    /// What the most recent reconcile pass did.
    #[must_use]
    pub const fn last_report(&self) -> &ReconcileReport {
        &self.last_report
    }
}

/// Reconciles the live avatars with [`LatestSnapshot`] once per frame.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems require parameters by value, not by reference."
)]
pub fn reconcile_avatars_system(
    time: Res<Time>,
    latest: Res<LatestSnapshot>,
    motion: Res<MotionSettings>,
    mut roster: ResMut<AvatarRoster>,
    mut backend: EcsSceneBackend,
) {
    let AvatarRoster {
        registry,
        rng,
        last_report,
    } = &mut *roster;

    let report = registry.reconcile(latest.snapshot(), time.delta(), &motion, &mut backend, rng);
    if !report.created.is_empty() || !report.removed.is_empty() {
        debug!(
            "reconciled: {} created, {} removed, {} live",
            report.created.len(),
            report.removed.len(),
            registry.len()
        );
    }
    *last_report = report;
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value."
)]
fn attach_loaded_avatar(
    event: On<AvatarModelReady>,
    mut roster: ResMut<AvatarRoster>,
    mut backend: EcsSceneBackend,
) {
    let AvatarModelReady { ticket, model } = *event.event();
    if let LoadOutcome::Attached(id) = roster.registry.complete_load(ticket, model, &mut backend) {
        debug!("avatar {id} is now drawn by {model:?}");
    }
}

/// Plugin owning the avatar lifecycle.
///
/// # Responsibilities
///
/// - Inserts [`AvatarRoster`], [`MotionSettings`] and [`LatestSnapshot`]
///   unless the app already provides them.
/// - Runs [`reconcile_avatars_system`] in [`CrowdSystems::Reconcile`], after
///   [`CrowdSystems::Receive`].
/// - Accepts finished model loads delivered as [`AvatarModelReady`].
///
/// Model loading itself is left to another plugin observing
/// [`AvatarModelRequested`](super::AvatarModelRequested).
#[derive(Debug, Default)]
pub struct AvatarPlugin;

impl Plugin for AvatarPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AvatarRoster>()
            .init_resource::<MotionSettings>()
            .init_resource::<LatestSnapshot>()
            .configure_sets(
                Update,
                (CrowdSystems::Receive, CrowdSystems::Reconcile).chain(),
            )
            .add_observer(attach_loaded_avatar)
            .add_systems(
                Update,
                reconcile_avatars_system.in_set(CrowdSystems::Reconcile),
            );
    }
}
