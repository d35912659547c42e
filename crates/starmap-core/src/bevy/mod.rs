//! Bevy integration for the starmap scene.
//!
//! The [`Scene`](crate::scene::Scene) lives in a resource; systems forward
//! input into it, tick it, and move leaderboard I/O onto the task pool.

pub mod components;
pub mod events;
pub mod plugin;
pub mod resources;
pub mod systems;

#[cfg(test)]
pub(crate) mod test_utils;

pub use components::*;
pub use events::*;
pub use plugin::{SessionPhase, StarmapHeadlessPlugin, StarmapPlugin};
pub use resources::*;
pub use systems::{
    collect_rankings, map_keyboard_input, map_mouse_input, process_intents, service_leaderboard,
    tick_scene, tick_session_clock,
};
