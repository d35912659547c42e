//! Intent dispatch layer.
//!
//! Device events arrive as [`RawInput`] and are translated by
//! [`IntentMapper`] into the closed [`Intent`] set consumed by the scene.
//! Held keys are not intents; they update [`InputState`] flags that the
//! camera reads every tick.

use bevy::math::Vec2;

use crate::session::GameMode;
use crate::world::ObjectId;

/// Held flags and pointer accumulators read by the camera models.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    pub forward: bool,
    pub brake: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    pub up: bool,
    pub down: bool,
    pub boost: bool,
    pub yaw_left: bool,
    pub yaw_right: bool,
    pub pitch_up: bool,
    pub pitch_down: bool,
    /// Pointer motion accumulated since the last camera tick.
    pub pointer_delta: Vec2,
    pub dragging: bool,
    pub pointer_captured: bool,
}

impl InputState {
    /// Releases every held flag and drops accumulated pointer motion.
    pub fn clear_held(&mut self) {
        let captured = self.pointer_captured;
        *self = Self {
            pointer_captured: captured,
            ..Self::default()
        };
    }

    /// Returns and resets the accumulated pointer delta.
    pub fn take_pointer_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.pointer_delta)
    }

    /// Horizontal rotation axis: -1 left, +1 right.
    pub fn yaw_axis(&self) -> f32 {
        axis(self.yaw_right, self.yaw_left)
    }

    /// Vertical rotation axis: -1 down, +1 up.
    pub fn pitch_axis(&self) -> f32 {
        axis(self.pitch_up, self.pitch_down)
    }

    pub fn strafe_axis(&self) -> f32 {
        axis(self.strafe_right, self.strafe_left)
    }

    pub fn vertical_axis(&self) -> f32 {
        axis(self.up, self.down)
    }

    pub fn any_rotation_held(&self) -> bool {
        self.yaw_left || self.yaw_right || self.pitch_up || self.pitch_down
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// Logical keys the mapper understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    F,
    C,
    L,
    H,
    T,
    G,
    V,
    X,
    Space,
    Shift,
    Ctrl,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// Number row 1..=9.
    Digit(u8),
}

/// Device-level input event.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    KeyDown(Key),
    KeyUp(Key),
    /// Single click; `target` is the picked object, if any.
    Click { target: Option<ObjectId> },
    DoubleClick { target: Option<ObjectId> },
    Drag { delta: Vec2 },
    DragEnd,
    Wheel { delta: f32 },
    PointerMove { delta: Vec2, hover: Option<ObjectId> },
}

/// Semantic user intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Select(ObjectId),
    Hover(Option<ObjectId>),
    WarpTo(ObjectId),
    Deselect,
    GoHome,
    Zoom(f32),
    OrbitDrag(Vec2),
    ToggleFreeFlight,
    ToggleConnections,
    ToggleLabels,
    Escape,
    StartGame(GameMode),
    ForceEnd,
    Answer(usize),
    ChooseCandidate(ObjectId),
    CloseReading,
    SubmitScore(String),
    Replay,
    ExitSession,
    ShowRanking,
    CloseRanking,
    StartTour,
    CancelTour,
}

impl Intent {
    /// Short label used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Select(_) => "select",
            Intent::Hover(_) => "hover",
            Intent::WarpTo(_) => "warp_to",
            Intent::Deselect => "deselect",
            Intent::GoHome => "go_home",
            Intent::Zoom(_) => "zoom",
            Intent::OrbitDrag(_) => "orbit_drag",
            Intent::ToggleFreeFlight => "toggle_free_flight",
            Intent::ToggleConnections => "toggle_connections",
            Intent::ToggleLabels => "toggle_labels",
            Intent::Escape => "escape",
            Intent::StartGame(_) => "start_game",
            Intent::ForceEnd => "force_end",
            Intent::Answer(_) => "answer",
            Intent::ChooseCandidate(_) => "choose_candidate",
            Intent::CloseReading => "close_reading",
            Intent::SubmitScore(_) => "submit_score",
            Intent::Replay => "replay",
            Intent::ExitSession => "exit_session",
            Intent::ShowRanking => "show_ranking",
            Intent::CloseRanking => "close_ranking",
            Intent::StartTour => "start_tour",
            Intent::CancelTour => "cancel_tour",
        }
    }

    /// Intents that only change the view; they stay available while the
    /// reading overlay is open.
    pub fn is_passive(&self) -> bool {
        matches!(
            self,
            Intent::Hover(_) | Intent::ToggleConnections | Intent::ToggleLabels | Intent::Zoom(_)
        )
    }
}

/// Translates raw device events into intents and held flags.
#[derive(Debug, Clone, Default)]
pub struct IntentMapper;

impl IntentMapper {
    pub fn new() -> Self {
        Self
    }

    /// Applies `raw` to `state` and returns the intent it produces, if any.
    pub fn map(&self, raw: RawInput, state: &mut InputState) -> Option<Intent> {
        match raw {
            RawInput::KeyDown(key) => {
                if set_held(state, key, true) {
                    return None;
                }
                key_intent(key)
            }
            RawInput::KeyUp(key) => {
                set_held(state, key, false);
                None
            }
            RawInput::Click { target } => Some(target.map_or(Intent::Deselect, Intent::Select)),
            RawInput::DoubleClick { target } => target.map(Intent::WarpTo),
            RawInput::Drag { delta } => {
                state.dragging = true;
                state.pointer_delta += delta;
                Some(Intent::OrbitDrag(delta))
            }
            RawInput::DragEnd => {
                state.dragging = false;
                None
            }
            RawInput::Wheel { delta } => (delta != 0.0).then_some(Intent::Zoom(delta)),
            RawInput::PointerMove { delta, hover } => {
                if state.pointer_captured {
                    state.pointer_delta += delta;
                    None
                } else {
                    Some(Intent::Hover(hover))
                }
            }
        }
    }
}

/// Updates the held flag bound to `key`. Returns false for keys that are
/// not held controls.
fn set_held(state: &mut InputState, key: Key, pressed: bool) -> bool {
    let flag = match key {
        Key::W => &mut state.forward,
        Key::S => &mut state.brake,
        Key::A => &mut state.strafe_left,
        Key::D => &mut state.strafe_right,
        Key::Space | Key::E => &mut state.up,
        Key::Ctrl | Key::Q => &mut state.down,
        Key::Shift => &mut state.boost,
        Key::ArrowLeft => &mut state.yaw_left,
        Key::ArrowRight => &mut state.yaw_right,
        Key::ArrowUp => &mut state.pitch_up,
        Key::ArrowDown => &mut state.pitch_down,
        _ => return false,
    };
    *flag = pressed;
    true
}

fn key_intent(key: Key) -> Option<Intent> {
    match key {
        Key::F => Some(Intent::ToggleFreeFlight),
        Key::C => Some(Intent::ToggleConnections),
        Key::L => Some(Intent::ToggleLabels),
        Key::H => Some(Intent::GoHome),
        Key::T => Some(Intent::StartTour),
        Key::G => Some(Intent::StartGame(GameMode::Waypoint)),
        Key::V => Some(Intent::StartGame(GameMode::PlanetVisitor)),
        Key::X => Some(Intent::ForceEnd),
        Key::Escape => Some(Intent::Escape),
        Key::Digit(n @ 1..=9) => Some(Intent::Answer(usize::from(n - 1))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_keys_do_not_emit_intents() {
        let mapper = IntentMapper::new();
        let mut state = InputState::default();
        assert_eq!(mapper.map(RawInput::KeyDown(Key::W), &mut state), None);
        assert!(state.forward);
        mapper.map(RawInput::KeyDown(Key::ArrowLeft), &mut state);
        assert!((state.yaw_axis() + 1.0).abs() < f32::EPSILON);
        mapper.map(RawInput::KeyUp(Key::W), &mut state);
        assert!(!state.forward);
    }

    #[test]
    fn test_command_keys() {
        let mapper = IntentMapper::new();
        let mut state = InputState::default();
        assert_eq!(
            mapper.map(RawInput::KeyDown(Key::F), &mut state),
            Some(Intent::ToggleFreeFlight)
        );
        assert_eq!(
            mapper.map(RawInput::KeyDown(Key::Digit(3)), &mut state),
            Some(Intent::Answer(2))
        );
        assert_eq!(mapper.map(RawInput::KeyDown(Key::Digit(0)), &mut state), None);
        assert_eq!(
            mapper.map(RawInput::KeyDown(Key::G), &mut state),
            Some(Intent::StartGame(GameMode::Waypoint))
        );
        assert_eq!(
            mapper.map(RawInput::KeyDown(Key::V), &mut state),
            Some(Intent::StartGame(GameMode::PlanetVisitor))
        );
        assert_eq!(mapper.map(RawInput::KeyDown(Key::X), &mut state), Some(Intent::ForceEnd));
    }

    #[test]
    fn test_pointer_events() {
        let mapper = IntentMapper::new();
        let mut state = InputState::default();
        assert_eq!(
            mapper.map(RawInput::Click { target: Some("rust".into()) }, &mut state),
            Some(Intent::Select("rust".into()))
        );
        assert_eq!(
            mapper.map(RawInput::Click { target: None }, &mut state),
            Some(Intent::Deselect)
        );
        assert_eq!(
            mapper.map(RawInput::DoubleClick { target: Some("go".into()) }, &mut state),
            Some(Intent::WarpTo("go".into()))
        );
        assert_eq!(mapper.map(RawInput::DoubleClick { target: None }, &mut state), None);

        mapper.map(RawInput::Drag { delta: Vec2::new(4.0, 0.0) }, &mut state);
        assert!(state.dragging);
        mapper.map(RawInput::DragEnd, &mut state);
        assert!(!state.dragging);
    }

    #[test]
    fn test_captured_pointer_accumulates_delta() {
        let mapper = IntentMapper::new();
        let mut state = InputState {
            pointer_captured: true,
            ..InputState::default()
        };
        let out = mapper.map(
            RawInput::PointerMove {
                delta: Vec2::new(3.0, -2.0),
                hover: None,
            },
            &mut state,
        );
        assert_eq!(out, None);
        assert_eq!(state.take_pointer_delta(), Vec2::new(3.0, -2.0));
        assert_eq!(state.pointer_delta, Vec2::ZERO);
    }

    #[test]
    fn test_clear_held_keeps_capture() {
        let mut state = InputState {
            forward: true,
            boost: true,
            dragging: true,
            pointer_captured: true,
            pointer_delta: Vec2::ONE,
            ..InputState::default()
        };
        state.clear_held();
        assert!(!state.forward && !state.boost && !state.dragging);
        assert_eq!(state.pointer_delta, Vec2::ZERO);
        assert!(state.pointer_captured);
    }
}
