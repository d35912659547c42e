//! Runtime configuration for the starmap scene.
//!
//! Every field has a default, so a partial JSON document only needs to
//! name the values it overrides.

use std::path::Path;

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

/// Error produced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StarmapConfig {
    /// RNG seed for waypoint selection and question shuffling.
    pub seed: u64,
    pub camera: CameraConfig,
    pub session: SessionConfig,
    pub visitor: VisitorConfig,
    pub layout: LayoutConfig,
    pub leaderboard: LeaderboardConfig,
}

impl StarmapConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the exploration time limit in seconds (at least one second).
    pub fn with_time_limit(mut self, seconds: u32) -> Self {
        self.session.time_limit = seconds.max(1);
        self
    }
}

/// Camera rig tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub home_position: [f32; 3],
    pub home_target: [f32; 3],
    /// Per-tick blend factor for orbital transitions.
    pub transition_blend: f32,
    /// Distance under which a transition counts as arrived.
    pub arrive_epsilon: f32,
    pub zoom_step: f32,
    pub orbital_min_distance: f32,
    pub orbital_max_distance: f32,
    /// Radians of orbit per pixel of drag.
    pub drag_sensitivity: f32,

    pub follow_acceleration: f32,
    pub follow_max_angular_speed: f32,
    /// Velocity decay per reference frame while the user drags.
    pub follow_drag_decay: f32,
    /// Velocity decay per reference frame while idle.
    pub follow_idle_decay: f32,
    pub follow_pitch_limit: f32,
    pub follow_min_distance: f32,
    pub follow_max_distance: f32,
    pub follow_default_distance: f32,
    pub follow_position_blend: f32,

    pub ship_throttle_ramp: f32,
    pub ship_throttle_decay: f32,
    pub ship_thrust: f32,
    pub ship_strafe: f32,
    pub ship_vertical: f32,
    pub ship_boost: f32,
    pub ship_drag: f32,
    pub ship_max_speed: f32,
    pub ship_boost_max_speed: f32,
    pub ship_turn_rate: f32,
    pub ship_pitch_limit: f32,
    pub mouse_sensitivity: f32,

    /// Warp flight duration in seconds.
    pub warp_duration: f32,
    /// Frame rate the decay constants are expressed against.
    pub ref_rate: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            home_position: [0.0, 700.0, 1600.0],
            home_target: [0.0, 0.0, 0.0],
            transition_blend: 0.08,
            arrive_epsilon: 0.5,
            zoom_step: 1.1,
            orbital_min_distance: 150.0,
            orbital_max_distance: 5000.0,
            drag_sensitivity: 0.005,

            follow_acceleration: 3.0,
            follow_max_angular_speed: 2.0,
            follow_drag_decay: 0.80,
            follow_idle_decay: 0.95,
            follow_pitch_limit: 1.45,
            follow_min_distance: 20.0,
            follow_max_distance: 2000.0,
            follow_default_distance: 120.0,
            follow_position_blend: 0.2,

            ship_throttle_ramp: 1.5,
            ship_throttle_decay: 0.90,
            ship_thrust: 600.0,
            ship_strafe: 350.0,
            ship_vertical: 350.0,
            ship_boost: 2.5,
            ship_drag: 0.96,
            ship_max_speed: 900.0,
            ship_boost_max_speed: 2200.0,
            ship_turn_rate: 1.6,
            ship_pitch_limit: 1.5,
            mouse_sensitivity: 0.0025,

            warp_duration: 2.0,
            ref_rate: 60.0,
        }
    }
}

impl CameraConfig {
    pub fn home_position(&self) -> Vec3 {
        Vec3::from_array(self.home_position)
    }

    pub fn home_target(&self) -> Vec3 {
        Vec3::from_array(self.home_target)
    }
}

/// Scoring and timing of a waypoint session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Exploration countdown in seconds.
    pub time_limit: u32,
    pub points_route_visit: i64,
    pub points_random_visit: i64,
    pub points_per_correct: i64,
    pub points_per_wrong: i64,
    /// Per-question countdown in seconds.
    pub question_time: u32,
    /// Seconds the answer feedback stays up before the next question.
    pub answer_display_delay: f32,
    pub options_per_question: usize,
    pub combo_threshold: u32,
    pub combo_cap: u32,
    /// Open the reading overlay whenever a node with a description is reached.
    pub forced_reading: bool,
    pub warp_stop_distance: f32,
    /// Free-flight distance at which an unvisited tool counts as reached.
    pub collect_radius: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit: 120,
            points_route_visit: 150,
            points_random_visit: 50,
            points_per_correct: 200,
            points_per_wrong: -50,
            question_time: 30,
            answer_display_delay: 1.5,
            options_per_question: 5,
            combo_threshold: 3,
            combo_cap: 5,
            forced_reading: true,
            warp_stop_distance: 60.0,
            collect_radius: 25.0,
        }
    }
}

/// Planet-visitor session flavor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorConfig {
    pub candidates_per_step: usize,
    /// Seconds before the first candidate is picked automatically.
    pub auto_advance: u32,
    pub total_planets: usize,
    pub points_per_visit: i64,
}

impl Default for VisitorConfig {
    fn default() -> Self {
        Self {
            candidates_per_step: 3,
            auto_advance: 10,
            total_planets: 8,
            points_per_visit: 100,
        }
    }
}

/// Orbit layout of categories and tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub category_radius: f32,
    pub orbit_base_radius: f32,
    pub orbit_spacing: f32,
    pub base_angular_speed: f32,
    pub tilt: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            category_radius: 650.0,
            orbit_base_radius: 90.0,
            orbit_spacing: 28.0,
            base_angular_speed: 0.12,
            tilt: 0.18,
        }
    }
}

/// Leaderboard endpoints and cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub top_n: usize,
    pub cache_capacity: usize,
    pub cache_path: Option<String>,
    pub remote_url: Option<String>,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            cache_capacity: 100,
            cache_path: None,
            remote_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = StarmapConfig::default();
        assert_eq!(cfg.session.time_limit, 120);
        assert_eq!(cfg.session.options_per_question, 5);
        assert_eq!(cfg.leaderboard.top_n, 10);
        assert!((cfg.session.collect_radius - 25.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_json_overrides() {
        let cfg = StarmapConfig::from_json_str(
            r#"{ "seed": 7, "session": { "time_limit": 60, "points_route_visit": 200 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.session.time_limit, 60);
        assert_eq!(cfg.session.points_route_visit, 200);
        // untouched values keep their defaults
        assert_eq!(cfg.session.points_random_visit, 50);
        assert_eq!(cfg.visitor.total_planets, 8);
    }

    #[test]
    fn test_builder_methods() {
        let cfg = StarmapConfig::default().with_seed(99).with_time_limit(0);
        assert_eq!(cfg.seed, 99);
        assert_eq!(cfg.session.time_limit, 1);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            StarmapConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }
}
