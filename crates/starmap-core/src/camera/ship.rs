//! Free-flight model.

use bevy::math::Vec3;

use super::{look_rotation, CameraRig};
use crate::input::InputState;

/// Distance ahead of the ship used as the nominal look target.
const LOOK_AHEAD: f32 = 100.0;

/// Transient state of the ship.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipState {
    pub velocity: Vec3,
    /// Throttle in `[-1, 1]`.
    pub throttle: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl ShipState {
    pub fn forward(&self) -> Vec3 {
        ship_forward(self.yaw, self.pitch)
    }

    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

fn ship_forward(yaw: f32, pitch: f32) -> Vec3 {
    Vec3::new(-yaw.sin() * pitch.cos(), pitch.sin(), -yaw.cos() * pitch.cos())
}

impl CameraRig {
    /// Resets the ship at rest, aligned with the current orientation.
    pub fn init_ship(&mut self) {
        let forward = self.forward();
        let pitch = forward.y.clamp(-1.0, 1.0).asin();
        let yaw = (-forward.x).atan2(-forward.z);
        let limit = self.config.ship_pitch_limit;
        self.ship = Some(ShipState {
            velocity: Vec3::ZERO,
            throttle: 0.0,
            yaw,
            pitch: pitch.clamp(-limit, limit),
        });
    }

    pub fn update_ship(&mut self, dt: f32, input: &mut InputState) {
        let cfg = &self.config;
        let Some(ship) = self.ship.as_mut() else {
            return;
        };

        if input.forward {
            ship.throttle = (ship.throttle + cfg.ship_throttle_ramp * dt).min(1.0);
        } else if input.brake {
            ship.throttle = (ship.throttle - cfg.ship_throttle_ramp * dt).max(-1.0);
        } else {
            ship.throttle *= cfg.ship_throttle_decay.powf(dt * cfg.ref_rate);
        }

        if input.pointer_captured {
            let look = input.take_pointer_delta();
            ship.yaw -= look.x * cfg.mouse_sensitivity;
            ship.pitch -= look.y * cfg.mouse_sensitivity;
        }
        ship.yaw -= input.yaw_axis() * cfg.ship_turn_rate * dt;
        ship.pitch += input.pitch_axis() * cfg.ship_turn_rate * dt;
        ship.pitch = ship.pitch.clamp(-cfg.ship_pitch_limit, cfg.ship_pitch_limit);

        let forward = ship.forward();
        let boost = if input.boost { cfg.ship_boost } else { 1.0 };
        let thrust = forward * ship.throttle * cfg.ship_thrust
            + ship.right() * input.strafe_axis() * cfg.ship_strafe
            + Vec3::Y * input.vertical_axis() * cfg.ship_vertical;
        ship.velocity += thrust * boost * dt;
        ship.velocity *= cfg.ship_drag.powf(dt * cfg.ref_rate);
        let max_speed = if input.boost {
            cfg.ship_boost_max_speed
        } else {
            cfg.ship_max_speed
        };
        ship.velocity = ship.velocity.clamp_length_max(max_speed);

        let velocity = ship.velocity;
        self.position += velocity * dt;
        self.orientation = look_rotation(forward);
        self.look_target = self.position + forward * LOOK_AHEAD;
    }
}
