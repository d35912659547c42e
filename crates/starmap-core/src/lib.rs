//! Starmap Core Library
//!
//! Explorable 3D topic graph with a timed quiz layered on top.
//!
//! The engine-agnostic core (world registry, edges, camera rig, session
//! controller, leaderboard client) is driven through [`Scene`]. The
//! [`bevy`](crate::bevy) module wires the scene into a Bevy app, headless
//! or windowed.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod config;
pub mod easing;
pub mod edge;
pub mod graph;
pub mod input;
pub mod leaderboard;
pub mod overlay;
pub mod scene;
pub mod session;
pub mod timeline;
pub mod world;

// Bevy integration
pub mod bevy;

pub use camera::{CameraModel, CameraRig, WarpArrival};
pub use config::{
    CameraConfig, ConfigError, LayoutConfig, LeaderboardConfig, SessionConfig, StarmapConfig,
    VisitorConfig,
};
pub use easing::EasingType;
pub use edge::{Edge, EdgeKind, EdgeSet, RenderedEdge};
pub use graph::{GraphError, NodeKind, NodeRecord, TopicGraph};
pub use input::{InputState, Intent, IntentMapper, Key, RawInput};
pub use leaderboard::{
    FallbackLeaderboard, LeaderboardClient, LeaderboardEntry, LeaderboardError, LocalLeaderboard,
    SessionStats,
};
pub use overlay::{Hud, NullOverlay, OverlayStore, OverlaySurface, PanelContent};
pub use scene::{RenderSnapshot, RenderedObject, Scene, SceneError, SceneEvent};
pub use session::{AnswerOutcome, GameMode, Session, SessionEffect, SessionError, SessionState};
pub use timeline::{Timeline, TimelineStep, TourAction};
pub use world::{ActivationState, ObjectId, World, WorldObject};
