//! Asset-free stand-in for the glTF model loader.

use bevy::prelude::*;
use crowd3d::avatar::ModelRequest;
use crowd3d::avatar_sync::{avatar_model_components, AvatarModelReady, AvatarModelRequested};

/// Requests parked while [`InstantModelPlugin::holding`] is active.
#[derive(Resource, Debug, Default)]
pub struct HeldModelRequests(pub Vec<ModelRequest>);

/// Every request seen, in arrival order.
#[derive(Resource, Debug, Default)]
pub struct ModelRequestLog(pub Vec<ModelRequest>);

#[derive(Resource, Debug, Clone, Copy)]
struct HoldLoads(bool);

/// Answers model requests with a bare model entity.
///
/// By default the model is spawned and reported ready in the same command
/// flush. With [`InstantModelPlugin::holding`] requests are parked in
/// [`HeldModelRequests`] until [`release_held_models`] runs.
#[derive(Debug, Default)]
pub struct InstantModelPlugin {
    hold: bool,
}

impl InstantModelPlugin {
    /// Parks requests instead of completing them.
    #[must_use]
    pub const fn holding() -> Self {
        Self { hold: true }
    }
}

impl Plugin for InstantModelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(HoldLoads(self.hold))
            .init_resource::<HeldModelRequests>()
            .init_resource::<ModelRequestLog>()
            .add_observer(answer_request);
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must take On<T> by value."
)]
fn answer_request(
    event: On<AvatarModelRequested>,
    hold: Res<HoldLoads>,
    mut log: ResMut<ModelRequestLog>,
    mut held: ResMut<HeldModelRequests>,
    mut commands: Commands,
) {
    let request = event.event().0.clone();
    log.0.push(request.clone());
    if hold.0 {
        held.0.push(request);
    } else {
        complete(&mut commands, &request);
    }
}

fn complete(commands: &mut Commands, request: &ModelRequest) {
    let model = commands.spawn(avatar_model_components(request)).id();
    commands.trigger(AvatarModelReady {
        ticket: request.ticket,
        model,
    });
}

/// Completes every parked request, oldest first.
pub fn release_held_models(world: &mut World) {
    let requests = std::mem::take(&mut world.resource_mut::<HeldModelRequests>().0);
    let mut commands = world.commands();
    for request in &requests {
        complete(&mut commands, request);
    }
    world.flush();
}
