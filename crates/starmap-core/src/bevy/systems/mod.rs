//! Systems for the starmap scene.
//!
//! Organized by functionality:
//! - input: keyboard/mouse forwarding into the intent mapper
//! - scene: intent processing, frame tick, session clock, phase mirror
//! - leaderboard: async leaderboard jobs and their replies
//! - camera: camera entity sync and pointer capture (windowed)
//! - picking: cursor ray picking (windowed)
//! - rendering: gizmo rendering of the scene snapshot (windowed)

pub mod camera;
pub mod input;
pub mod leaderboard;
pub mod picking;
pub mod rendering;
pub mod scene;

pub use camera::*;
pub use input::*;
pub use leaderboard::*;
pub use picking::*;
pub use rendering::*;
pub use scene::*;
