//! ECS Messages for the starmap scene.
//!
//! In Bevy 0.18+, buffered events use the Message trait.

use bevy::prelude::*;

use crate::input::Intent;
use crate::session::SessionState;

/// Intent raised inside the ECS, applied by `process_intents`.
#[derive(Message, Debug, Clone)]
pub struct IntentEvent(pub Intent);

/// Pointer capture must be acquired (`true`) or released.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerCaptureEvent {
    pub captured: bool,
}

/// A leaderboard request finished.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardEvent {
    Submitted { name: String, score: i64 },
    RankingLoaded { count: usize },
    Failed { reason: String },
}

/// The session controller changed state.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStateChanged {
    pub from: SessionState,
    pub to: SessionState,
}
