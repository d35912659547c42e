//! Test utilities for headless Bevy integration tests.
//!
//! Provides `TestApp`, a wrapper around `bevy::app::App` that uses
//! `MinimalPlugins` + `StarmapHeadlessPlugin` for testing scene logic
//! without a rendering or windowing backend.

use std::sync::Arc;
use std::time::Duration;

use bevy::input::mouse::MouseButtonInput;
use bevy::input::ButtonState;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use crate::bevy::plugin::{SessionPhase, StarmapHeadlessPlugin};
use crate::bevy::resources::{HoveredObject, IntentQueue, SceneRes};
use crate::config::StarmapConfig;
use crate::graph::fixtures::sample_graph;
use crate::input::Intent;
use crate::leaderboard::{LeaderboardClient, LocalLeaderboard};
use crate::scene::Scene;

/// Frame length fed to the app on every update.
pub const FRAME_DT: f32 = 1.0 / 60.0;

/// A headless Bevy app wrapper for testing.
///
/// Every update advances time by exactly [`FRAME_DT`], so frame counts map
/// directly onto seconds.
pub(crate) struct TestApp {
    pub app: App,
    pub leaderboard: Arc<LocalLeaderboard>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(StarmapConfig::default().with_seed(7))
    }

    pub fn with_config(config: StarmapConfig) -> Self {
        let leaderboard = Arc::new(LocalLeaderboard::in_memory(100));
        let client: Arc<dyn LeaderboardClient> = leaderboard.clone();

        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::state::app::StatesPlugin);
        app.add_plugins(bevy::input::InputPlugin);
        app.add_plugins(StarmapHeadlessPlugin::new(sample_graph(), config).with_leaderboard(client));
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(FRAME_DT)));
        // Run one update to initialize all resources and state
        app.update();
        Self { app, leaderboard }
    }

    pub fn update(&mut self) {
        self.app.update();
    }

    pub fn step(&mut self, frames: usize) {
        for _ in 0..frames {
            self.app.update();
        }
    }

    /// Runs enough frames to cover `seconds`.
    pub fn advance_secs(&mut self, seconds: f32) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let frames = (seconds / FRAME_DT).ceil() as usize;
        self.step(frames);
    }

    pub fn push_intent(&mut self, intent: Intent) {
        self.app.world().resource::<IntentQueue>().push(intent);
    }

    /// Pushes an intent and runs one frame.
    pub fn dispatch(&mut self, intent: Intent) {
        self.push_intent(intent);
        self.update();
    }

    pub fn scene(&self) -> &Scene {
        &self.app.world().resource::<SceneRes>().0
    }

    pub fn phase(&self) -> SessionPhase {
        *self.app.world().resource::<State<SessionPhase>>().get()
    }

    pub fn set_hovered(&mut self, id: Option<&str>) {
        self.app.world_mut().resource_mut::<HoveredObject>().0 = id.map(Into::into);
    }

    /// Presses and releases the left mouse button over the hovered object.
    pub fn click(&mut self) {
        for state in [ButtonState::Pressed, ButtonState::Released] {
            self.app.world_mut().write_message(MouseButtonInput {
                button: MouseButton::Left,
                state,
                window: Entity::PLACEHOLDER,
            });
            self.update();
        }
    }

    /// Runs frames until `done` holds, up to `max_frames`.
    pub fn run_until(&mut self, max_frames: usize, done: impl Fn(&Scene) -> bool) -> bool {
        for _ in 0..max_frames {
            if done(self.scene()) {
                return true;
            }
            self.update();
            std::thread::sleep(Duration::from_millis(1));
        }
        done(self.scene())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraModel;
    use crate::session::{GameMode, SessionState};

    #[test]
    fn test_headless_app_starts_idle() {
        let app = TestApp::new();
        assert_eq!(app.phase(), SessionPhase::Idle);
        assert_eq!(app.scene().world().len(), 10);
        assert_eq!(app.scene().camera().model(), CameraModel::OrbitalWide);
    }

    #[test]
    fn test_click_selects_and_double_click_warps() {
        let mut app = TestApp::new();
        app.set_hovered(Some("rust"));
        app.click();
        assert_eq!(app.scene().world().active().unwrap(), "rust");

        app.click();
        assert!(app.scene().camera().is_warping());
        assert!(app.run_until(300, |scene| !scene.camera().is_warping()));
        assert_eq!(app.scene().camera().follow_target().unwrap(), "rust");
    }

    #[test]
    fn test_click_on_empty_space_deselects() {
        let mut app = TestApp::new();
        app.dispatch(Intent::Select("go".into()));
        app.set_hovered(None);
        app.click();
        assert!(app.scene().world().active().is_none());
    }

    #[test]
    fn test_session_clock_runs_only_while_exploring() {
        let mut app = TestApp::with_config(StarmapConfig::default().with_seed(7).with_time_limit(5));
        app.dispatch(Intent::StartGame(GameMode::Waypoint));
        app.update();
        assert_eq!(app.phase(), SessionPhase::Exploration);

        let before = app.scene().session().time_remaining();
        app.advance_secs(2.0);
        let after = app.scene().session().time_remaining();
        assert!((1..=2).contains(&(before - after)), "{before} -> {after}");

        app.advance_secs(5.0);
        assert_eq!(app.scene().session().state(), SessionState::Evaluation);
        app.update();
        assert_eq!(app.phase(), SessionPhase::Evaluation);
    }

    #[test]
    fn test_submission_reaches_leaderboard_and_ranking() {
        let mut app = TestApp::new();
        app.dispatch(Intent::StartGame(GameMode::Waypoint));
        app.dispatch(Intent::ForceEnd);
        assert_eq!(app.scene().session().state(), SessionState::Evaluation);

        while app.scene().session().state() == SessionState::Evaluation {
            let correct = app.scene().session().question().unwrap().correct_index;
            app.dispatch(Intent::Answer(correct));
            app.step(120);
        }
        assert_eq!(app.scene().session().state(), SessionState::Results);

        app.dispatch(Intent::SubmitScore("Grace".to_string()));
        assert_eq!(app.scene().session().state(), SessionState::Results);
        let board = app.leaderboard.clone();
        let stored = (0..500).any(|_| {
            app.update();
            std::thread::sleep(Duration::from_millis(1));
            !board.is_empty()
        });
        assert!(stored);
        assert_eq!(app.phase(), SessionPhase::Results);

        app.dispatch(Intent::ShowRanking);
        assert_eq!(app.scene().session().state(), SessionState::Ranking);
        assert!(app.run_until(500, |scene| !scene.session().ranking().is_empty()));

        let ranking = app.scene().session().ranking();
        assert_eq!(ranking[0].name, "Grace");
        assert_eq!(ranking[0].score, 350);
        assert_eq!(app.leaderboard.list(10).unwrap().len(), 1);

        app.dispatch(Intent::CloseRanking);
        app.update();
        assert_eq!(app.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_free_flight_toggle_emits_pointer_capture() {
        use crate::bevy::events::PointerCaptureEvent;
        use bevy::ecs::message::Messages;

        let mut app = TestApp::new();
        app.dispatch(Intent::ToggleFreeFlight);
        assert_eq!(app.scene().camera().model(), CameraModel::FreeFlight);
        let messages = app.app.world().resource::<Messages<PointerCaptureEvent>>();
        let mut cursor = messages.get_cursor();
        let captured: Vec<bool> = cursor.read(messages).map(|e| e.captured).collect();
        assert_eq!(captured, vec![true]);
    }
}
