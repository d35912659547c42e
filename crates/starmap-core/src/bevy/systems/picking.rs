//! Pointer picking.
//!
//! Casts the cursor ray against object spheres and records the nearest hit
//! in [`HoveredObject`].

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::bevy::systems::rendering::object_radius;
use crate::bevy::{HoveredObject, MainCamera, SceneRes};
use crate::scene::RenderedObject;
use crate::world::ObjectId;

/// Nearest object whose sphere the ray passes through.
pub fn pick_object(objects: &[RenderedObject], origin: Vec3, direction: Vec3) -> Option<ObjectId> {
    let direction = direction.try_normalize()?;
    objects
        .iter()
        .filter_map(|object| {
            let along = (object.position - origin).dot(direction);
            if along < 0.0 {
                return None;
            }
            let closest = origin + direction * along;
            (closest.distance(object.position) <= object_radius(object.kind)).then_some((along, &object.id))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id.clone())
}

pub fn pick_hovered_object(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    scene: Res<SceneRes>,
    mut hovered: ResMut<HoveredObject>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    if scene.0.input().pointer_captured {
        hovered.set_if_neq(HoveredObject(None));
        return;
    }
    let picked = window
        .cursor_position()
        .and_then(|cursor| camera.viewport_to_world(camera_transform, cursor).ok())
        .and_then(|ray| pick_object(&scene.0.rendered().objects, ray.origin, *ray.direction));
    hovered.set_if_neq(HoveredObject(picked));
}
