//! Follow-orbit model.
//!
//! Orbits a world object with inertial yaw/pitch. The target's frame to
//! frame displacement is applied to the camera before re-lerping toward
//! the desired offset, so orbiting targets do not drag the camera behind.

use bevy::math::Vec3;

use super::{frame_blend, look_rotation, spherical_from, spherical_offset, CameraRig};
use crate::input::InputState;
use crate::world::ObjectId;

/// Transient state of the follow model.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowState {
    pub target_id: Option<ObjectId>,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub yaw_velocity: f32,
    pub pitch_velocity: f32,
    /// Target position seen on the previous tick.
    pub last_target: Vec3,
}

impl CameraRig {
    /// Derives yaw, pitch and distance from the current camera to target
    /// vector.
    pub fn init_follow_from(&mut self, target: Vec3) {
        let cfg = &self.config;
        let (yaw, pitch, distance) = spherical_from(self.position - target);
        let distance = if distance <= f32::EPSILON {
            cfg.follow_default_distance
        } else {
            distance.clamp(cfg.follow_min_distance, cfg.follow_max_distance)
        };
        let pitch = pitch.clamp(-cfg.follow_pitch_limit, cfg.follow_pitch_limit);
        self.follow = Some(FollowState {
            target_id: None,
            yaw,
            pitch,
            distance,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            last_target: target,
        });
        self.look_target = target;
        self.orientation = look_rotation(target - self.position);
    }

    /// Integrates the follow orbit.
    ///
    /// A `target` of `None` keeps orbiting the last known position.
    pub fn update_follow(&mut self, dt: f32, target: Option<Vec3>, input: &mut InputState) {
        let cfg = self.config.clone();
        let Some(follow) = self.follow.as_mut() else {
            return;
        };
        let target = target.unwrap_or(follow.last_target);

        // held directions accelerate, drags rotate directly
        let max_speed = cfg.follow_max_angular_speed;
        follow.yaw_velocity =
            (follow.yaw_velocity + input.yaw_axis() * cfg.follow_acceleration * dt).clamp(-max_speed, max_speed);
        follow.pitch_velocity = (follow.pitch_velocity + input.pitch_axis() * cfg.follow_acceleration * dt)
            .clamp(-max_speed, max_speed);
        if input.dragging && !input.pointer_captured {
            let drag = input.take_pointer_delta();
            follow.yaw -= drag.x * cfg.drag_sensitivity;
            follow.pitch += drag.y * cfg.drag_sensitivity;
        }

        let decay = if input.dragging {
            cfg.follow_drag_decay
        } else {
            cfg.follow_idle_decay
        };
        let factor = decay.powf(dt * cfg.ref_rate);
        follow.yaw_velocity *= factor;
        follow.pitch_velocity *= factor;

        follow.yaw += follow.yaw_velocity * dt;
        follow.pitch += follow.pitch_velocity * dt;
        let limit = cfg.follow_pitch_limit;
        if follow.pitch.abs() >= limit {
            follow.pitch = follow.pitch.clamp(-limit, limit);
            follow.pitch_velocity = 0.0;
        }

        let displacement = target - follow.last_target;
        follow.last_target = target;
        let desired = target + spherical_offset(follow.yaw, follow.pitch, follow.distance);

        self.position += displacement;
        self.position = self
            .position
            .lerp(desired, frame_blend(cfg.follow_position_blend, dt, cfg.ref_rate));
        self.look_target = target;
        self.orientation = look_rotation(target - self.position);
    }
}
