//! Unit tests for avatar reconciliation.

use std::collections::BTreeSet;
use std::time::Duration;

use approx::assert_relative_eq;
use glam::Vec3;
use mockall::predicate::{always, eq};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::{fixture, rstest};

use super::*;
use crate::snapshot::{AvatarId, FieldMap, Snapshot};

const FRAME: Duration = Duration::from_millis(16);

/// Backend double that records every call.
#[derive(Debug, Default)]
struct RecordingBackend {
    requests: Vec<ModelRequest>,
    attached: Vec<(u32, Vec3)>,
    detached: Vec<u32>,
    placed: Vec<(u32, Vec3, Vec3)>,
    animated: Vec<(u32, Duration)>,
}

impl SceneBackend for RecordingBackend {
    type Handle = u32;

    fn request_model(&mut self, request: ModelRequest) {
        self.requests.push(request);
    }

    fn attach(&mut self, handle: &u32, position: Vec3) {
        self.attached.push((*handle, position));
    }

    fn detach(&mut self, handle: u32) {
        self.detached.push(handle);
    }

    fn place(&mut self, handle: &u32, position: Vec3, facing: Vec3) {
        self.placed.push((*handle, position, facing));
    }

    fn advance_animation(&mut self, handle: &u32, elapsed: Duration) {
        self.animated.push((*handle, elapsed));
    }
}

#[fixture]
fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn sensor(x: f64, y: f64) -> FieldMap {
    [("x", x), ("y", y)].into_iter().collect()
}

/// Sensor reading that lands on scene position `(sx, 0, sz)`.
fn at_scene(sx: f64, sz: f64) -> FieldMap {
    sensor(sz * 40.0 - 700.0, sx * 40.0 + 700.0)
}

fn snapshot_of(entries: &[(&str, FieldMap)]) -> Snapshot {
    entries
        .iter()
        .map(|(id, fields)| (*id, fields.clone()))
        .collect()
}

fn live_ids(registry: &AvatarRegistry<u32>) -> BTreeSet<String> {
    registry.ids().map(|id| id.as_str().to_owned()).collect()
}

/// Reconciles `snapshot` and resolves every load it requested, handing out
/// handles from `next_handle`.
fn reconcile_and_load(
    registry: &mut AvatarRegistry<u32>,
    backend: &mut RecordingBackend,
    snapshot: &Snapshot,
    rng: &mut StdRng,
    next_handle: &mut u32,
) -> ReconcileReport {
    let before = backend.requests.len();
    let report = registry.reconcile(snapshot, FRAME, &MotionSettings::default(), backend, rng);
    let fresh: Vec<LoadTicket> = backend.requests.iter().skip(before).map(|r| r.ticket).collect();
    for ticket in fresh {
        registry.complete_load(ticket, *next_handle, backend);
        *next_handle += 1;
    }
    report
}

#[rstest]
fn first_sight_registers_one_pending_avatar(mut rng: StdRng) {
    let mut registry = AvatarRegistry::new();
    let mut backend = RecordingBackend::default();
    let snapshot = snapshot_of(&[("a", sensor(0.0, 0.0))]);

    let report = registry.reconcile(&snapshot, FRAME, &MotionSettings::default(), &mut backend, &mut rng);
    assert_eq!(report.created, vec![AvatarId::from("a")]);

    // A second frame before the load resolves must not request again.
    registry.reconcile(&snapshot, FRAME, &MotionSettings::default(), &mut backend, &mut rng);

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.pending_loads(), 1);
    assert_eq!(backend.requests.len(), 1);
    let request = backend.requests.first().expect("one request");
    assert_eq!(request.id, AvatarId::from("a"));
    assert_relative_eq!(request.spawn_at.x, -17.5);
    assert_relative_eq!(request.spawn_at.z, 17.5);
    assert!(backend.placed.is_empty(), "pending avatars are never placed");
    assert!(backend.animated.is_empty(), "pending avatars are never animated");
}

#[rstest]
fn load_completion_attaches_exactly_once(mut rng: StdRng) {
    let mut registry = AvatarRegistry::new();
    let mut seed = RecordingBackend::default();
    let snapshot = snapshot_of(&[("a", sensor(0.0, 0.0))]);
    registry.reconcile(&snapshot, FRAME, &MotionSettings::default(), &mut seed, &mut rng);
    let ticket = seed.requests.first().expect("load requested").ticket;

    let mut backend = MockSceneBackend::new();
    backend
        .expect_attach()
        .with(eq(7), eq(Vec3::new(-17.5, 0.0, 17.5)))
        .times(1)
        .return_const(());
    backend.expect_detach().with(eq(8)).times(1).return_const(());

    assert_eq!(
        registry.complete_load(ticket, 7, &mut backend),
        LoadOutcome::Attached(AvatarId::from("a"))
    );
    // A duplicate completion for the same ticket is discarded.
    assert_eq!(registry.complete_load(ticket, 8, &mut backend), LoadOutcome::Orphaned);

    let entry = registry.get(&AvatarId::from("a")).expect("avatar a");
    assert_eq!(entry.handle(), Some(&7));
    assert_eq!(registry.pending_loads(), 0);
}

#[rstest]
fn avatar_at_target_only_animates(mut rng: StdRng) {
    let mut registry = AvatarRegistry::new();
    let mut recorder = RecordingBackend::default();
    let mut handle = 1;
    let snapshot = snapshot_of(&[("a", at_scene(5.0, 5.0))]);
    reconcile_and_load(&mut registry, &mut recorder, &snapshot, &mut rng, &mut handle);

    let mut backend = MockSceneBackend::new();
    backend.expect_place().times(0);
    backend
        .expect_advance_animation()
        .with(eq(1), eq(FRAME))
        .times(1)
        .return_const(());

    let report = registry.reconcile(&snapshot, FRAME, &MotionSettings::default(), &mut backend, &mut rng);

    let entry = registry.get(&AvatarId::from("a")).expect("avatar a");
    assert!((entry.target() - entry.position()).length() <= ARRIVAL_EPSILON);
    assert_eq!(entry.position(), Vec3::new(5.0, 0.0, 5.0));
    assert!(report.moved.is_empty());
    assert_eq!(report.animated, 1);
}

#[rstest]
fn ready_avatar_steps_a_fixed_fraction_towards_target(mut rng: StdRng) {
    let mut registry = AvatarRegistry::new();
    let mut backend = RecordingBackend::default();
    let mut handle = 1;
    reconcile_and_load(
        &mut registry,
        &mut backend,
        &snapshot_of(&[("a", at_scene(0.0, 0.0))]),
        &mut rng,
        &mut handle,
    );

    let moved = snapshot_of(&[("a", at_scene(10.0, 0.0))]);
    let report = registry.reconcile(&moved, FRAME, &MotionSettings::default(), &mut backend, &mut rng);

    assert_eq!(report.moved, vec![AvatarId::from("a")]);
    let entry = registry.get(&AvatarId::from("a")).expect("avatar a");
    assert_relative_eq!(entry.position().x, 10.0 * STEP_FRACTION, epsilon = 1e-5);
    assert_relative_eq!(entry.position().z, 0.0, epsilon = 1e-5);
    let (placed_handle, _, facing) = *backend.placed.last().expect("avatar was placed");
    assert_eq!(placed_handle, 1);
    assert_relative_eq!(facing.x, 10.0, epsilon = 1e-4);
}

#[rstest]
fn step_ignores_frame_duration(mut rng: StdRng) {
    let motion = MotionSettings::default();
    let mut positions = Vec::new();
    for elapsed in [Duration::from_millis(1), Duration::from_millis(100)] {
        let mut registry = AvatarRegistry::new();
        let mut backend = RecordingBackend::default();
        let mut handle = 1;
        reconcile_and_load(
            &mut registry,
            &mut backend,
            &snapshot_of(&[("a", at_scene(0.0, 0.0))]),
            &mut rng,
            &mut handle,
        );
        registry.reconcile(
            &snapshot_of(&[("a", at_scene(4.0, 0.0))]),
            elapsed,
            &motion,
            &mut backend,
            &mut rng,
        );
        positions.push(registry.get(&AvatarId::from("a")).expect("avatar a").position());
    }
    assert_eq!(positions.first(), positions.last());
}

#[rstest]
fn repeated_snapshot_converges_then_stops(mut rng: StdRng) {
    let mut registry = AvatarRegistry::new();
    let mut backend = RecordingBackend::default();
    let mut handle = 1;
    reconcile_and_load(
        &mut registry,
        &mut backend,
        &snapshot_of(&[("a", at_scene(0.0, 0.0))]),
        &mut rng,
        &mut handle,
    );

    let target = snapshot_of(&[("a", at_scene(1.0, -1.0))]);
    let motion = MotionSettings::default();
    let mut frames = 0;
    while !registry
        .reconcile(&target, FRAME, &motion, &mut backend, &mut rng)
        .moved
        .is_empty()
    {
        frames += 1;
        assert!(frames < 10_000, "avatar never converged");
    }

    let settled = registry.get(&AvatarId::from("a")).expect("avatar a").position();
    let report = registry.reconcile(&target, FRAME, &motion, &mut backend, &mut rng);
    assert!(report.moved.is_empty());
    assert_eq!(registry.get(&AvatarId::from("a")).expect("avatar a").position(), settled);
}

#[rstest]
fn missing_identifier_is_removed_on_next_pass(mut rng: StdRng) {
    let mut registry = AvatarRegistry::new();
    let mut recorder = RecordingBackend::default();
    let mut handle = 3;
    reconcile_and_load(
        &mut registry,
        &mut recorder,
        &snapshot_of(&[("a", sensor(0.0, 0.0)), ("b", sensor(1.0, 1.0))]),
        &mut rng,
        &mut handle,
    );
    let a_handle = *registry
        .get(&AvatarId::from("a"))
        .and_then(AvatarEntry::handle)
        .expect("a loaded");

    let mut backend = MockSceneBackend::new();
    backend.expect_detach().with(eq(a_handle)).times(1).return_const(());
    backend.expect_place().with(always(), always(), always()).return_const(());
    backend.expect_advance_animation().return_const(());

    let report = registry.reconcile(
        &snapshot_of(&[("b", sensor(2.0, 2.0))]),
        FRAME,
        &MotionSettings::default(),
        &mut backend,
        &mut rng,
    );

    assert_eq!(report.removed, vec![AvatarId::from("a")]);
    assert!(!registry.contains(&AvatarId::from("a")));
    assert!(registry.contains(&AvatarId::from("b")));
}

#[rstest]
fn empty_snapshot_keeps_avatars_animating_in_place(mut rng: StdRng) {
    let mut registry = AvatarRegistry::new();
    let mut backend = RecordingBackend::default();
    let mut handle = 1;
    reconcile_and_load(
        &mut registry,
        &mut backend,
        &snapshot_of(&[("a", at_scene(0.0, 0.0))]),
        &mut rng,
        &mut handle,
    );
    // Leave "b" pending.
    registry.reconcile(
        &snapshot_of(&[("a", at_scene(3.0, 3.0)), ("b", at_scene(1.0, 1.0))]),
        FRAME,
        &MotionSettings::default(),
        &mut backend,
        &mut rng,
    );
    let position = registry.get(&AvatarId::from("a")).expect("a").position();
    backend.animated.clear();
    backend.placed.clear();

    let report = registry.reconcile(&Snapshot::new(), FRAME, &MotionSettings::default(), &mut backend, &mut rng);

    assert!(report.idle);
    assert_eq!(report.animated, 1);
    assert_eq!(backend.animated, vec![(1, FRAME)]);
    assert!(backend.placed.is_empty());
    assert!(backend.detached.is_empty());
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get(&AvatarId::from("a")).expect("a").position(), position);
}

#[rstest]
fn load_finishing_after_removal_is_discarded(mut rng: StdRng) {
    let mut registry = AvatarRegistry::new();
    let mut backend = RecordingBackend::default();
    registry.reconcile(
        &snapshot_of(&[("a", sensor(0.0, 0.0))]),
        FRAME,
        &MotionSettings::default(),
        &mut backend,
        &mut rng,
    );
    let ticket = backend.requests.first().expect("load requested").ticket;

    registry.reconcile(
        &snapshot_of(&[("b", sensor(0.0, 0.0))]),
        FRAME,
        &MotionSettings::default(),
        &mut backend,
        &mut rng,
    );
    assert!(!registry.contains(&AvatarId::from("a")));

    let outcome = registry.complete_load(ticket, 9, &mut backend);

    assert_eq!(outcome, LoadOutcome::Orphaned);
    assert_eq!(backend.detached, vec![9]);
    assert!(backend.attached.is_empty());
    assert!(!registry.contains(&AvatarId::from("a")));
}

#[rstest]
fn reappearing_identifier_gets_a_fresh_load(mut rng: StdRng) {
    let mut registry = AvatarRegistry::new();
    let mut backend = RecordingBackend::default();
    let snapshot = snapshot_of(&[("a", sensor(0.0, 0.0))]);
    let motion = MotionSettings::default();
    registry.reconcile(&snapshot, FRAME, &motion, &mut backend, &mut rng);
    registry.reconcile(&snapshot_of(&[("z", sensor(0.0, 0.0))]), FRAME, &motion, &mut backend, &mut rng);
    registry.reconcile(&snapshot, FRAME, &motion, &mut backend, &mut rng);

    let tickets: Vec<LoadTicket> = backend
        .requests
        .iter()
        .filter(|r| r.id == AvatarId::from("a"))
        .map(|r| r.ticket)
        .collect();
    assert_eq!(tickets.len(), 2);
    assert_ne!(tickets.first(), tickets.last());

    // Only the newest ticket may attach.
    let stale = *tickets.first().expect("first ticket");
    let fresh = *tickets.last().expect("second ticket");
    assert_eq!(registry.complete_load(stale, 1, &mut backend), LoadOutcome::Orphaned);
    assert_eq!(
        registry.complete_load(fresh, 2, &mut backend),
        LoadOutcome::Attached(AvatarId::from("a"))
    );
}

#[rstest]
fn unknown_coordinates_spawn_at_origin_and_hold(mut rng: StdRng) {
    let mut registry = AvatarRegistry::new();
    let mut backend = RecordingBackend::default();
    let mut handle = 1;
    let blind = snapshot_of(&[("a", [("x", f64::NAN)].into_iter().collect())]);
    reconcile_and_load(&mut registry, &mut backend, &blind, &mut rng, &mut handle);

    let request = backend.requests.first().expect("load requested");
    assert_eq!(request.spawn_at, Vec3::ZERO);

    let report = registry.reconcile(&blind, FRAME, &MotionSettings::default(), &mut backend, &mut rng);
    assert!(report.moved.is_empty());
    assert_eq!(report.animated, 1);
    assert_eq!(registry.get(&AvatarId::from("a")).expect("a").position(), Vec3::ZERO);
}

#[rstest]
#[case::grow(vec![vec!["a"], vec!["a", "b", "c"]])]
#[case::shrink(vec![vec!["a", "b", "c"], vec!["b"]])]
#[case::churn(vec![vec!["a", "b"], vec!["c"], vec!["a", "c", "d"], vec!["d"]])]
#[case::outage_in_between(vec![vec!["a", "b"], vec![], vec!["b"]])]
fn live_set_tracks_latest_non_empty_snapshot(mut rng: StdRng, #[case] frames: Vec<Vec<&str>>) {
    let mut registry = AvatarRegistry::new();
    let mut backend = RecordingBackend::default();
    let mut handle = 1;
    let mut expected = BTreeSet::new();

    for ids in frames {
        let snapshot: Snapshot = ids.iter().map(|id| (*id, sensor(0.0, 0.0))).collect();
        reconcile_and_load(&mut registry, &mut backend, &snapshot, &mut rng, &mut handle);
        if !ids.is_empty() {
            expected = ids.iter().map(|id| (*id).to_owned()).collect();
        }
        assert_eq!(live_ids(&registry), expected);
    }

    // Every detached handle was attached first, and at most once.
    let attached: BTreeSet<u32> = backend.attached.iter().map(|(h, _)| *h).collect();
    let detached: BTreeSet<u32> = backend.detached.iter().copied().collect();
    assert_eq!(detached.len(), backend.detached.len());
    assert!(detached.is_subset(&attached));
}
