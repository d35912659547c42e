//! Camera entity systems.
//!
//! The scene's camera rig is authoritative; the ECS camera only mirrors it.

use bevy::prelude::*;
use bevy::window::{CursorGrabMode, CursorOptions, PrimaryWindow};

use crate::bevy::{MainCamera, PointerCaptureEvent, SceneRes};

/// Spawns the main camera at the rig's pose, reusing an existing one.
pub fn setup_main_camera(
    mut commands: Commands,
    scene: Res<SceneRes>,
    mut existing: Query<&mut Transform, With<MainCamera>>,
) {
    let rig = scene.0.camera();
    let transform = Transform::from_translation(rig.position).with_rotation(rig.orientation);
    if let Ok(mut current) = existing.single_mut() {
        *current = transform;
        tracing::info!("[camera] main camera reconfigured");
    } else {
        commands.spawn((Camera3d::default(), MainCamera, transform));
        tracing::info!("[camera] main camera spawned");
    }
}

pub fn sync_camera_transform(scene: Res<SceneRes>, mut cameras: Query<&mut Transform, With<MainCamera>>) {
    let rig = scene.0.camera();
    for mut transform in &mut cameras {
        transform.translation = rig.position;
        transform.rotation = rig.orientation;
    }
}

/// Locks and hides the cursor while free flight owns the pointer.
pub fn apply_pointer_capture(
    mut events: MessageReader<PointerCaptureEvent>,
    mut cursors: Query<&mut CursorOptions, With<PrimaryWindow>>,
) {
    let Some(last) = events.read().last().copied() else {
        return;
    };
    for mut cursor in &mut cursors {
        cursor.grab_mode = if last.captured {
            CursorGrabMode::Locked
        } else {
            CursorGrabMode::None
        };
        cursor.visible = !last.captured;
    }
    tracing::debug!("[camera] pointer captured: {}", last.captured);
}
