//! Orbital overview model.

use bevy::math::{Vec2, Vec3};

use super::{frame_blend, look_rotation, spherical_from, spherical_offset, CameraModel, CameraRig};

/// Pending smoothed transition of the overview camera.
#[derive(Debug, Clone, Default)]
pub struct OrbitalState {
    pub transitioning: bool,
    pub dest_position: Vec3,
    pub dest_target: Vec3,
}

impl CameraRig {
    pub fn is_transitioning(&self) -> bool {
        self.model() == CameraModel::OrbitalWide && self.orbital.transitioning
    }

    /// Returns to the home pose.
    pub fn go_home(&mut self, instant: bool) {
        let (position, target) = (self.config.home_position(), self.config.home_target());
        self.navigate_to(position, target, instant);
    }

    /// Moves the overview camera to `position` looking at `look_at`.
    pub fn navigate_to(&mut self, position: Vec3, look_at: Vec3, instant: bool) {
        self.enter_orbital();
        if instant {
            self.position = position;
            self.look_target = look_at;
            self.orientation = look_rotation(look_at - position);
            self.orbital.transitioning = false;
            return;
        }
        self.orbital = OrbitalState {
            transitioning: true,
            dest_position: position,
            dest_target: look_at,
        };
    }

    /// Rotates the overview camera around its look target.
    ///
    /// Cancels a running transition.
    pub fn orbit_drag(&mut self, delta: Vec2) {
        if self.model() != CameraModel::OrbitalWide {
            return;
        }
        self.orbital.transitioning = false;
        let (yaw, pitch, distance) = spherical_from(self.position - self.look_target);
        let sensitivity = self.config.drag_sensitivity;
        let limit = self.config.follow_pitch_limit;
        let yaw = yaw - delta.x * sensitivity;
        let pitch = (pitch + delta.y * sensitivity).clamp(-limit, limit);
        self.position = self.look_target + spherical_offset(yaw, pitch, distance);
        self.orientation = look_rotation(self.look_target - self.position);
    }

    pub(crate) fn update_orbital(&mut self, dt: f32) {
        if !self.orbital.transitioning {
            return;
        }
        let blend = frame_blend(self.config.transition_blend, dt, self.config.ref_rate);
        let OrbitalState {
            dest_position,
            dest_target,
            ..
        } = self.orbital;

        self.position = self.position.lerp(dest_position, blend);
        self.look_target = self.look_target.lerp(dest_target, blend);

        let epsilon = self.config.arrive_epsilon;
        if self.position.distance(dest_position) < epsilon && self.look_target.distance(dest_target) < epsilon {
            self.position = dest_position;
            self.look_target = dest_target;
            self.orbital.transitioning = false;
            tracing::debug!("[camera] orbital transition arrived");
        }
        self.orientation = look_rotation(self.look_target - self.position);
    }
}

#[cfg(test)]
mod tests {
    use crate::camera::{CameraModel, CameraRig};
    use crate::config::CameraConfig;
    use crate::input::InputState;
    use bevy::math::{Vec2, Vec3};

    #[test]
    fn test_instant_navigation_snaps() {
        let mut rig = CameraRig::new(CameraConfig::default());
        rig.navigate_to(Vec3::new(10.0, 0.0, 300.0), Vec3::ZERO, true);
        assert_eq!(rig.position, Vec3::new(10.0, 0.0, 300.0));
        assert!(!rig.is_transitioning());
    }

    #[test]
    fn test_smoothed_transition_arrives() {
        let mut rig = CameraRig::new(CameraConfig::default());
        let mut input = InputState::default();
        let dest = Vec3::new(400.0, 200.0, 400.0);
        rig.navigate_to(dest, Vec3::new(50.0, 0.0, 0.0), false);
        assert!(rig.is_transitioning());

        rig.update(1.0 / 60.0, &mut input, |_| None);
        assert!(rig.is_transitioning());
        assert!(rig.position != dest);

        for _ in 0..600 {
            rig.update(1.0 / 60.0, &mut input, |_| None);
        }
        assert!(!rig.is_transitioning());
        assert_eq!(rig.position, dest);
        assert_eq!(rig.look_target, Vec3::new(50.0, 0.0, 0.0));
    }

    #[test]
    fn test_go_home_from_follow() {
        let mut rig = CameraRig::new(CameraConfig::default());
        rig.enter_follow(Some("rust".into()), Vec3::new(500.0, 0.0, 0.0));
        rig.go_home(true);
        assert_eq!(rig.model(), CameraModel::OrbitalWide);
        assert!(rig.follow().is_none());
        assert_eq!(rig.position, rig.config().home_position());
    }

    #[test]
    fn test_orbit_drag_keeps_distance() {
        let mut rig = CameraRig::new(CameraConfig::default());
        let before = rig.position.distance(rig.look_target);
        rig.orbit_drag(Vec2::new(120.0, -40.0));
        let after = rig.position.distance(rig.look_target);
        assert!((before - after).abs() < 1e-2);
        let to_target = (rig.look_target - rig.position).normalize();
        assert!(rig.forward().distance(to_target) < 1e-4);
    }
}
