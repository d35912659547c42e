//! Keyboard and mouse forwarding.
//!
//! Bevy input is translated into [`RawInput`] and fed through the scene's
//! intent mapper, so held flags and intents follow one set of rules.

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;

use crate::bevy::{HoveredObject, PointerTracker, SceneRes, DOUBLE_CLICK_WINDOW, DRAG_THRESHOLD};
use crate::input::{Key, RawInput};

fn forward(scene: &mut SceneRes, raw: RawInput) {
    if let Err(err) = scene.0.handle_raw(raw) {
        tracing::warn!("[input] {err}");
    }
}

/// Maps a Bevy key code onto the keys the intent mapper understands.
pub fn key_from_code(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyX => Key::X,
        KeyCode::Space => Key::Space,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Ctrl,
        KeyCode::Escape => Key::Escape,
        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,
        KeyCode::Digit1 => Key::Digit(1),
        KeyCode::Digit2 => Key::Digit(2),
        KeyCode::Digit3 => Key::Digit(3),
        KeyCode::Digit4 => Key::Digit(4),
        KeyCode::Digit5 => Key::Digit(5),
        KeyCode::Digit6 => Key::Digit(6),
        KeyCode::Digit7 => Key::Digit(7),
        KeyCode::Digit8 => Key::Digit(8),
        KeyCode::Digit9 => Key::Digit(9),
        _ => return None,
    };
    Some(key)
}

pub fn map_keyboard_input(keys: Res<ButtonInput<KeyCode>>, mut scene: ResMut<SceneRes>) {
    for code in keys.get_just_pressed() {
        if let Some(key) = key_from_code(*code) {
            forward(&mut scene, RawInput::KeyDown(key));
        }
    }
    for code in keys.get_just_released() {
        if let Some(key) = key_from_code(*code) {
            forward(&mut scene, RawInput::KeyUp(key));
        }
    }
}

/// Left button: click, double click or drag. Wheel: zoom. Motion: hover,
/// or look input while the pointer is captured.
pub fn map_mouse_input(
    time: Res<Time>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: MessageReader<MouseMotion>,
    mut wheel: MessageReader<MouseWheel>,
    hovered: Res<HoveredObject>,
    mut tracker: ResMut<PointerTracker>,
    mut scene: ResMut<SceneRes>,
) {
    for event in wheel.read() {
        forward(&mut scene, RawInput::Wheel { delta: event.y });
    }

    let captured = scene.0.input().pointer_captured;
    if buttons.just_pressed(MouseButton::Left) && !captured {
        tracker.pressed = true;
        tracker.dragged = false;
        tracker.travel = 0.0;
    }

    let delta: Vec2 = motion.read().map(|m| m.delta).sum();
    if tracker.pressed && !captured {
        tracker.travel += delta.length();
        if tracker.travel >= DRAG_THRESHOLD {
            tracker.dragged = true;
        }
        if tracker.dragged && delta != Vec2::ZERO {
            forward(&mut scene, RawInput::Drag { delta });
        }
    } else if delta != Vec2::ZERO || hovered.is_changed() {
        forward(
            &mut scene,
            RawInput::PointerMove {
                delta,
                hover: hovered.0.clone(),
            },
        );
    }

    if buttons.just_released(MouseButton::Left) && tracker.pressed {
        tracker.pressed = false;
        if tracker.dragged {
            tracker.dragged = false;
            forward(&mut scene, RawInput::DragEnd);
            return;
        }
        let now = time.elapsed_secs();
        let target = hovered.0.clone();
        let double = target.is_some()
            && tracker
                .last_click
                .as_ref()
                .is_some_and(|(at, last)| now - at <= DOUBLE_CLICK_WINDOW && *last == target);
        if double {
            tracker.last_click = None;
            forward(&mut scene, RawInput::DoubleClick { target });
        } else {
            tracker.last_click = Some((now, target.clone()));
            forward(&mut scene, RawInput::Click { target });
        }
    }
}
