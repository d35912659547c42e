//! Overlay/HUD contract.
//!
//! The scene pushes panel and HUD content through [`OverlaySurface`]. The
//! [`OverlayStore`] implementation keeps the latest content behind locks
//! with a version counter so a UI thread can poll it cheaply.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::leaderboard::{LeaderboardEntry, SessionStats};
use crate::session::AnswerOutcome;
use crate::world::ObjectId;

/// Content of the modal panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PanelContent {
    /// Details of the selected object.
    Info {
        id: ObjectId,
        title: String,
        url: Option<String>,
        description: Option<String>,
    },
    /// Forced reading shown on arrival during a session.
    Reading { id: ObjectId, title: String, body: String },
    Question {
        prompt: String,
        options: Vec<String>,
        index: usize,
        total: usize,
        remaining: u32,
        /// Outcome, chosen option and correct option once answered.
        feedback: Option<(AnswerOutcome, Option<usize>, usize)>,
    },
    Candidates {
        options: Vec<(ObjectId, String)>,
        remaining: u32,
    },
    Results {
        score: i64,
        final_score: i64,
        stats: SessionStats,
        submitted: bool,
    },
    Ranking { entries: Vec<LeaderboardEntry> },
}

/// Heads-up display line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hud {
    pub state: String,
    pub camera: String,
    pub score: i64,
    pub combo: u32,
    pub time_remaining: Option<u32>,
    pub next_waypoint: Option<String>,
}

pub trait OverlaySurface: Send + Sync {
    fn show_panel(&self, panel: PanelContent);
    fn hide_panel(&self);
    fn set_hud_text(&self, hud: Hud);
    /// Progress of the current tour or evaluation in `[0, 1]`.
    fn set_progress(&self, progress: f32);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOverlay;

impl OverlaySurface for NullOverlay {
    fn show_panel(&self, _panel: PanelContent) {}
    fn hide_panel(&self) {}
    fn set_hud_text(&self, _hud: Hud) {}
    fn set_progress(&self, _progress: f32) {}
}

/// Versioned store polled by a UI.
#[derive(Debug, Default)]
pub struct OverlayStore {
    panel: RwLock<Option<PanelContent>>,
    hud: RwLock<Hud>,
    progress: RwLock<f32>,
    version: RwLock<u64>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_version(&self) -> u64 {
        *self.version.read()
    }

    pub fn get_panel(&self) -> Option<PanelContent> {
        self.panel.read().clone()
    }

    pub fn get_hud(&self) -> Hud {
        self.hud.read().clone()
    }

    pub fn get_progress(&self) -> f32 {
        *self.progress.read()
    }

    fn bump(&self) {
        *self.version.write() += 1;
    }
}

impl OverlaySurface for OverlayStore {
    fn show_panel(&self, panel: PanelContent) {
        let mut current = self.panel.write();
        if current.as_ref() != Some(&panel) {
            *current = Some(panel);
            drop(current);
            self.bump();
        }
    }

    fn hide_panel(&self) {
        if self.panel.write().take().is_some() {
            self.bump();
        }
    }

    fn set_hud_text(&self, hud: Hud) {
        // the HUD is refreshed every frame; only real changes bump the version
        let mut current = self.hud.write();
        if *current != hud {
            *current = hud;
            drop(current);
            self.bump();
        }
    }

    fn set_progress(&self, progress: f32) {
        let progress = progress.clamp(0.0, 1.0);
        let mut current = self.progress.write();
        if (*current - progress).abs() > f32::EPSILON {
            *current = progress;
            drop(current);
            self.bump();
        }
    }
}
