//! glTF loading and walk-cycle playback for avatar models.
//!
//! Answers [`AvatarModelRequested`] by loading the variant's glTF file. Once
//! the asset is ready the model root is spawned hidden, its clips are gathered
//! into an [`AnimationGraph`], and [`AvatarModelReady`] is triggered. The
//! model becomes visible when the lifecycle core attaches it.
//!
//! Playback speed is pinned to zero; every frame the player is seeked to the
//! model's [`AnimationDriver`] so only avatars the reconcile pass advances
//! actually walk.

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use log::{debug, error};

use crate::avatar::ModelRequest;
use crate::styling::{StyledScene, SurfaceStyle};
use crate::avatar_sync::{
    avatar_model_components, AnimationDriver, AvatarAttached, AvatarModelReady,
    AvatarModelRequested, CrowdSystems,
};

/// Model loads waiting for their glTF asset.
#[derive(Resource, Debug, Default)]
pub struct PendingModelLoads(Vec<(ModelRequest, Handle<Gltf>)>);

impl PendingModelLoads {
    /// Number of loads still waiting.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is loading.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Animation graph built from a model's clips.
#[derive(Component, Debug, Clone)]
pub struct AvatarAnimation {
    graph: Handle<AnimationGraph>,
    walk: Option<AnimationNodeIndex>,
}

/// Links an [`AnimationPlayer`] inside a model's scene to the model root.
#[derive(Component, Debug, Clone, Copy)]
pub struct AnimatesAvatar(pub Entity);

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value."
)]
fn request_avatar_model(
    event: On<AvatarModelRequested>,
    asset_server: Res<AssetServer>,
    mut loads: ResMut<PendingModelLoads>,
) {
    let request = event.event().0.clone();
    let handle = asset_server.load::<Gltf>(request.variant.model_path());
    debug!(
        "loading {} for avatar {}",
        request.variant.model_path(),
        request.id
    );
    loads.0.push((request, handle));
}

/// Spawns models whose glTF finished loading and reports them ready.
///
/// A failed load is logged and dropped; its avatar stays pending.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems require parameters by value, not by reference."
)]
pub fn resolve_model_loads_system(
    mut commands: Commands,
    mut loads: ResMut<PendingModelLoads>,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
) {
    loads.0.retain(|(request, handle)| {
        if let Some(LoadState::Failed(err)) = asset_server.get_load_state(handle.id()) {
            error!(
                "cannot load {} for avatar {}: {err}",
                request.variant.model_path(),
                request.id
            );
            return false;
        }
        let Some(gltf) = gltfs.get(handle) else {
            return true;
        };
        let Some(scene) = gltf
            .default_scene
            .clone()
            .or_else(|| gltf.scenes.first().cloned())
        else {
            error!("{} has no scene to show", request.variant.model_path());
            return false;
        };

        let (graph, nodes) = AnimationGraph::from_clips(gltf.animations.iter().cloned());
        let animation = AvatarAnimation {
            graph: graphs.add(graph),
            walk: nodes.first().copied(),
        };
        let model = commands
            .spawn((
                avatar_model_components(request),
                SceneRoot(scene),
                StyledScene(SurfaceStyle::Avatar),
                Visibility::Hidden,
                animation,
            ))
            .id();
        commands.trigger(AvatarModelReady {
            ticket: request.ticket,
            model,
        });
        false
    });
}

/// Hooks scene animation players up to their model's walk cycle.
pub fn bind_animation_players_system(
    mut commands: Commands,
    mut players: Query<(Entity, &mut AnimationPlayer), Added<AnimationPlayer>>,
    parents: Query<&ChildOf>,
    models: Query<&AvatarAnimation>,
) {
    for (entity, mut player) in &mut players {
        let Some((root, animation)) = parents
            .iter_ancestors(entity)
            .find_map(|ancestor| models.get(ancestor).ok().map(|a| (ancestor, a)))
        else {
            continue;
        };
        let Some(walk) = animation.walk else {
            continue;
        };
        player.play(walk).repeat().set_speed(0.0);
        commands.entity(entity).insert((
            AnimationGraphHandle(animation.graph.clone()),
            AnimatesAvatar(root),
        ));
    }
}

/// Seeks every bound player to its model's driver time.
pub fn seek_animation_players_system(
    mut players: Query<(&AnimatesAvatar, &mut AnimationPlayer)>,
    models: Query<(&AnimationDriver, &AvatarAnimation)>,
) {
    for (AnimatesAvatar(root), mut player) in &mut players {
        let Ok((driver, animation)) = models.get(*root) else {
            continue;
        };
        let Some(walk) = animation.walk else {
            continue;
        };
        if let Some(active) = player.animation_mut(walk) {
            active.seek_to(driver.playback_secs());
        }
    }
}

/// Shows models once the lifecycle core has attached them.
pub fn reveal_attached_models_system(
    mut models: Query<&mut Visibility, Added<AvatarAttached>>,
) {
    for mut visibility in &mut models {
        *visibility = Visibility::Inherited;
    }
}

/// Plugin loading avatar models from glTF files.
#[derive(Debug, Default)]
pub struct ModelLoaderPlugin;

impl Plugin for ModelLoaderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingModelLoads>()
            .add_observer(request_avatar_model)
            .add_systems(
                Update,
                (
                    resolve_model_loads_system,
                    bind_animation_players_system,
                    reveal_attached_models_system,
                    seek_animation_players_system.after(CrowdSystems::Reconcile),
                ),
            );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    fn loader_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<Assets<AnimationGraph>>();
        app.add_systems(
            Update,
            (
                bind_animation_players_system,
                reveal_attached_models_system,
                seek_animation_players_system,
            )
                .chain(),
        );
        app
    }

    /// Spawns a model root carrying a one-node walk graph and a player two
    /// levels below it, as a glTF scene would.
    fn spawn_model(app: &mut App) -> (Entity, Entity, AnimationNodeIndex) {
        let mut graph = AnimationGraph::new();
        let walk = graph.add_blend(1.0, graph.root);
        let handle = app
            .world_mut()
            .resource_mut::<Assets<AnimationGraph>>()
            .add(graph);
        let model = app
            .world_mut()
            .spawn((
                AvatarAnimation {
                    graph: handle,
                    walk: Some(walk),
                },
                AnimationDriver::default(),
            ))
            .id();
        let armature = app.world_mut().spawn(ChildOf(model)).id();
        let player = app
            .world_mut()
            .spawn((AnimationPlayer::default(), ChildOf(armature)))
            .id();
        (model, player, walk)
    }

    #[rstest]
    fn scene_player_is_bound_to_its_model() {
        let mut app = loader_app();
        let (model, player, walk) = spawn_model(&mut app);
        app.update();

        let world = app.world();
        assert_eq!(world.get::<AnimatesAvatar>(player).map(|link| link.0), Some(model));
        assert!(world.get::<AnimationGraphHandle>(player).is_some());
        let state = world.get::<AnimationPlayer>(player).expect("player survives");
        assert!(state.is_playing_animation(walk));
        let active = state.animation(walk).expect("walk is active");
        assert_relative_eq!(active.speed(), 0.0);
    }

    #[rstest]
    fn player_outside_a_model_is_left_alone() {
        let mut app = loader_app();
        let stray = app.world_mut().spawn(AnimationPlayer::default()).id();
        app.update();
        assert!(app.world().get::<AnimatesAvatar>(stray).is_none());
    }

    #[rstest]
    fn bound_player_follows_the_driver_clock() {
        let mut app = loader_app();
        let (model, player, walk) = spawn_model(&mut app);
        app.update();

        app.world_mut()
            .get_mut::<AnimationDriver>(model)
            .expect("model has a driver")
            .advance(Duration::from_millis(1500), 0.8);
        app.update();

        let state = app
            .world()
            .get::<AnimationPlayer>(player)
            .expect("player survives");
        let active = state.animation(walk).expect("walk is active");
        assert_relative_eq!(active.seek_time(), 1.2, epsilon = 1e-5);
    }

    #[rstest]
    fn models_stay_hidden_until_attached() {
        let mut app = loader_app();
        let model = app.world_mut().spawn(Visibility::Hidden).id();
        app.update();
        app.update();
        assert_eq!(app.world().get::<Visibility>(model), Some(&Visibility::Hidden));

        app.world_mut().entity_mut(model).insert(AvatarAttached);
        app.update();
        assert_eq!(
            app.world().get::<Visibility>(model),
            Some(&Visibility::Inherited)
        );
    }
}
