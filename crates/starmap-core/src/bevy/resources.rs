//! ECS Resources for the starmap scene.

use std::collections::VecDeque;
use std::sync::Arc;

use bevy::prelude::*;
use parking_lot::Mutex;

use crate::input::Intent;
use crate::leaderboard::{LeaderboardClient, LeaderboardEntry, LocalLeaderboard};
use crate::overlay::OverlayStore;
use crate::scene::Scene;
use crate::world::ObjectId;

/// The scene context, owned by the ECS world.
#[derive(Resource)]
pub struct SceneRes(pub Scene);

impl SceneRes {
    pub fn new(scene: Scene) -> Self {
        Self(scene)
    }
}

/// Coarse one-second clock driving the session countdowns.
#[derive(Resource, Debug)]
pub struct SecondClock(pub Timer);

impl Default for SecondClock {
    fn default() -> Self {
        Self(Timer::from_seconds(1.0, TimerMode::Repeating))
    }
}

/// Leaderboard backend used by the async leaderboard service.
#[derive(Resource, Clone)]
pub struct LeaderboardRes(pub Arc<dyn LeaderboardClient>);

impl LeaderboardRes {
    pub fn new(client: Arc<dyn LeaderboardClient>) -> Self {
        Self(client)
    }
}

impl Default for LeaderboardRes {
    fn default() -> Self {
        Self(Arc::new(LocalLeaderboard::in_memory(100)))
    }
}

/// Result of a leaderboard job run off the render path.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardReply {
    Submitted { name: String, score: i64 },
    Ranking(Vec<LeaderboardEntry>),
    Failed(String),
}

/// Replies waiting to be handed to the scene.
///
/// Cloning shares the inbox with the worker task.
#[derive(Resource, Clone, Default)]
pub struct RankingInbox {
    inner: Arc<Mutex<Vec<LeaderboardReply>>>,
}

impl RankingInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: LeaderboardReply) {
        self.inner.lock().push(reply);
    }

    pub fn drain(&self) -> Vec<LeaderboardReply> {
        std::mem::take(&mut *self.inner.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Intents pushed from outside the ECS (UI buttons, scripts).
///
/// Cloning shares the queue.
#[derive(Resource, Clone)]
pub struct IntentQueue {
    inner: Arc<Mutex<VecDeque<Intent>>>,
}

impl IntentQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn push(&self, intent: Intent) {
        self.inner.lock().push_back(intent);
    }

    pub fn drain(&self) -> Vec<Intent> {
        self.inner.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Default for IntentQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared overlay store read by the UI.
#[derive(Resource, Clone, Default)]
pub struct OverlayRes(pub Arc<OverlayStore>);

/// Object under the pointer, written by picking.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct HoveredObject(pub Option<ObjectId>);

/// Mouse-button bookkeeping for click, double-click and drag detection.
#[derive(Resource, Debug, Clone, Default)]
pub struct PointerTracker {
    /// Left button is down.
    pub pressed: bool,
    /// The current press has moved far enough to count as a drag.
    pub dragged: bool,
    /// Accumulated motion of the current press.
    pub travel: f32,
    /// Elapsed seconds and target of the last click.
    pub last_click: Option<(f32, Option<ObjectId>)>,
}

/// Pixels of motion before a press becomes a drag.
pub const DRAG_THRESHOLD: f32 = 4.0;
/// Seconds within which a second click counts as a double click.
pub const DOUBLE_CLICK_WINDOW: f32 = 0.35;
