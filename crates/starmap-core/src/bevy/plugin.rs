//! Bevy plugins for the starmap scene.
//!
//! Provides:
//! - `StarmapHeadlessPlugin`: Logic-only plugin (no rendering/window dependencies) for headless testing
//! - `StarmapPlugin`: `StarmapHeadlessPlugin` + camera entity, picking and gizmo rendering

use std::sync::Arc;

use bevy::prelude::*;

use crate::bevy::events::*;
use crate::bevy::resources::*;
use crate::bevy::systems;
use crate::config::StarmapConfig;
use crate::graph::TopicGraph;
use crate::leaderboard::LeaderboardClient;
use crate::overlay::OverlayStore;
use crate::scene::{Scene, SceneError};
use crate::session::SessionState;

/// Mirror of the session controller state, for run conditions and
/// `OnEnter`/`OnExit` schedules.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Exploration,
    Evaluation,
    Results,
    Ranking,
}

impl From<SessionState> for SessionPhase {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Idle => Self::Idle,
            SessionState::Exploration => Self::Exploration,
            SessionState::Evaluation => Self::Evaluation,
            SessionState::Results => Self::Results,
            SessionState::Ranking => Self::Ranking,
        }
    }
}

impl From<SessionPhase> for SessionState {
    fn from(phase: SessionPhase) -> Self {
        match phase {
            SessionPhase::Idle => Self::Idle,
            SessionPhase::Exploration => Self::Exploration,
            SessionPhase::Evaluation => Self::Evaluation,
            SessionPhase::Results => Self::Results,
            SessionPhase::Ranking => Self::Ranking,
        }
    }
}

// ============================================================================
// Headless Plugin (logic only, no rendering/window dependencies)
// ============================================================================

/// Headless plugin containing all scene logic without rendering or window dependencies.
///
/// Use this plugin in tests with `MinimalPlugins`, `StatesPlugin` and
/// `InputPlugin` to run the ECS systems without a windowing or rendering
/// backend.
///
/// Excluded systems (rendering-dependent):
/// - Camera entity spawning and transform sync
/// - Cursor picking and pointer capture (need `Window`)
/// - Gizmo rendering
#[derive(Clone)]
pub struct StarmapHeadlessPlugin {
    pub graph: TopicGraph,
    pub config: StarmapConfig,
    pub intent_queue: Option<IntentQueue>,
    pub overlay: Option<Arc<OverlayStore>>,
    pub leaderboard: Option<Arc<dyn LeaderboardClient>>,
}

impl StarmapHeadlessPlugin {
    pub fn new(graph: TopicGraph, config: StarmapConfig) -> Self {
        Self {
            graph,
            config,
            intent_queue: None,
            overlay: None,
            leaderboard: None,
        }
    }

    /// Parses the topic-graph document. A bad document is fatal.
    pub fn from_json(json: &str, config: StarmapConfig) -> Result<Self, SceneError> {
        Ok(Self::new(TopicGraph::from_json(json)?, config))
    }

    pub fn with_intent_queue(mut self, queue: IntentQueue) -> Self {
        self.intent_queue = Some(queue);
        self
    }

    pub fn with_overlay(mut self, overlay: Arc<OverlayStore>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_leaderboard(mut self, client: Arc<dyn LeaderboardClient>) -> Self {
        self.leaderboard = Some(client);
        self
    }
}

impl Plugin for StarmapHeadlessPlugin {
    fn build(&self, app: &mut App) {
        // ====================================================================
        // States
        // ====================================================================
        app.init_state::<SessionPhase>();

        // ====================================================================
        // Resources
        // ====================================================================
        let overlay = self.overlay.clone().unwrap_or_default();
        let scene = Scene::from_graph(&self.graph, self.config.clone()).with_overlay(overlay.clone());
        let leaderboard = self
            .leaderboard
            .clone()
            .map_or_else(LeaderboardRes::default, LeaderboardRes::new);

        app.insert_resource(SceneRes::new(scene))
            .insert_resource(OverlayRes(overlay))
            .insert_resource(leaderboard)
            .insert_resource(self.intent_queue.clone().unwrap_or_default())
            .insert_resource(SecondClock::default())
            .insert_resource(RankingInbox::new())
            .insert_resource(HoveredObject::default())
            .insert_resource(PointerTracker::default());

        // ====================================================================
        // Messages
        // ====================================================================
        app.add_message::<IntentEvent>()
            .add_message::<PointerCaptureEvent>()
            .add_message::<LeaderboardEvent>()
            .add_message::<SessionStateChanged>();

        // ====================================================================
        // Frame systems
        // ====================================================================
        let clock_running = in_state(SessionPhase::Exploration).or(in_state(SessionPhase::Evaluation));
        app.add_systems(
            Update,
            (
                systems::map_keyboard_input,
                systems::map_mouse_input,
                systems::process_intents,
                systems::tick_session_clock.run_if(clock_running),
                systems::tick_scene,
                systems::service_leaderboard,
                systems::collect_rankings,
            )
                .chain(),
        );

        app.add_systems(PostUpdate, systems::sync_session_phase);

        // ====================================================================
        // Phase transitions
        // ====================================================================
        app.add_systems(OnEnter(SessionPhase::Exploration), systems::reset_second_clock);
        app.add_systems(OnEnter(SessionPhase::Evaluation), systems::reset_second_clock);
        app.add_systems(OnExit(SessionPhase::Exploration), log_phase_exit);
    }
}

fn log_phase_exit(scene: Res<SceneRes>) {
    let session = scene.0.session();
    tracing::info!(
        "[bevy] exploration over: {} visited, score {}",
        session.visited().len(),
        session.score()
    );
}

// ============================================================================
// Full Plugin (headless + rendering)
// ============================================================================

/// Full plugin: headless logic plus the window-dependent systems.
#[derive(Clone)]
pub struct StarmapPlugin {
    pub headless: StarmapHeadlessPlugin,
}

impl StarmapPlugin {
    pub fn new(headless: StarmapHeadlessPlugin) -> Self {
        Self { headless }
    }
}

impl Plugin for StarmapPlugin {
    fn build(&self, app: &mut App) {
        // ====================================================================
        // Headless logic
        // ====================================================================
        app.add_plugins(self.headless.clone());

        app.insert_resource(systems::SceneGizmoConfig::default());

        // ====================================================================
        // Camera entity (needs Camera3d)
        // ====================================================================
        app.add_systems(Startup, systems::setup_main_camera);

        // Picking feeds the mouse mapper with the hovered object
        app.add_systems(
            Update,
            systems::pick_hovered_object.before(systems::map_mouse_input),
        );

        app.add_systems(
            PostUpdate,
            (
                systems::sync_camera_transform,
                systems::apply_pointer_capture,
                systems::render_scene,
            ),
        );
    }
}
