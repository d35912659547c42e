//! Scene driving systems.
//!
//! The scene is advanced once per frame; the session countdowns tick on a
//! separate one-second clock.

use bevy::prelude::*;

use crate::bevy::plugin::SessionPhase;
use crate::bevy::{IntentEvent, IntentQueue, SceneRes, SecondClock, SessionStateChanged};

/// Applies intents from the external queue, then those raised in the ECS.
pub fn process_intents(
    queue: Res<IntentQueue>,
    mut intents: MessageReader<IntentEvent>,
    mut scene: ResMut<SceneRes>,
) {
    let external = queue.drain();
    for intent in external.into_iter().chain(intents.read().map(|e| e.0.clone())) {
        let name = intent.name();
        if let Err(err) = scene.0.dispatch(intent) {
            tracing::warn!("[intent] {name} rejected: {err}");
        }
    }
}

pub fn tick_scene(time: Res<Time>, mut scene: ResMut<SceneRes>) {
    if let Err(err) = scene.0.tick(time.delta_secs()) {
        tracing::warn!("[scene] tick failed: {err}");
    }
}

/// Runs `tick_second` once per elapsed whole second.
pub fn tick_session_clock(time: Res<Time>, mut clock: ResMut<SecondClock>, mut scene: ResMut<SceneRes>) {
    clock.0.tick(time.delta());
    for _ in 0..clock.0.times_finished_this_tick() {
        if let Err(err) = scene.0.tick_second() {
            tracing::warn!("[scene] clock tick failed: {err}");
        }
    }
}

/// Restarts the second clock so a fresh countdown gets full seconds.
pub fn reset_second_clock(mut clock: ResMut<SecondClock>) {
    clock.0.reset();
}

/// Mirrors the session controller's state into [`SessionPhase`].
pub fn sync_session_phase(
    scene: Res<SceneRes>,
    phase: Res<State<SessionPhase>>,
    mut next: ResMut<NextState<SessionPhase>>,
    mut changed: MessageWriter<SessionStateChanged>,
) {
    let current = SessionPhase::from(scene.0.session().state());
    let previous = *phase.get();
    if previous != current {
        tracing::debug!("[bevy] session phase {previous:?} -> {current:?}");
        changed.write(SessionStateChanged {
            from: previous.into(),
            to: current.into(),
        });
        next.set(current);
    }
}
