//! Camera rig.
//!
//! Provides four motion models:
//! - `OrbitalWide`: overview around a look target with smoothed transitions
//! - `FollowOrbit`: inertial orbit around a (moving) world object
//! - `FreeFlight`: ship flight with throttle, strafe and drag
//! - `Warping`: scripted flight to a stop point near a target
//!
//! Exactly one model is authoritative per tick. Switching models goes
//! through the `enter_*` / `start_warp` methods, which reinitialize the
//! new model from the current pose.

pub mod follow;
pub mod orbital;
pub mod ship;
pub mod warp;

pub use follow::FollowState;
pub use orbital::OrbitalState;
pub use ship::ShipState;
pub use warp::{WarpArrival, WarpState};

use bevy::math::{Mat3, Quat, Vec3};

use crate::config::CameraConfig;
use crate::input::InputState;
use crate::world::ObjectId;

/// Active motion model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraModel {
    #[default]
    OrbitalWide,
    FollowOrbit,
    FreeFlight,
    Warping,
}

impl CameraModel {
    pub fn name(self) -> &'static str {
        match self {
            CameraModel::OrbitalWide => "orbital_wide",
            CameraModel::FollowOrbit => "follow_orbit",
            CameraModel::FreeFlight => "free_flight",
            CameraModel::Warping => "warping",
        }
    }
}

/// Rotation whose forward axis (-Z) points along `forward`.
///
/// Matches the convention of `Transform::looking_to` with `Vec3::Y` as up,
/// falling back to `Vec3::Z` when looking straight up or down.
pub fn look_rotation(forward: Vec3) -> Quat {
    let back = -forward.normalize_or_zero();
    if back == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let up_hint = if back.cross(Vec3::Y).length_squared() < 1e-8 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let right = up_hint.cross(back).normalize();
    let up = back.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, back))
}

/// Offset on a sphere of radius `distance` for the given yaw and pitch.
pub fn spherical_offset(yaw: f32, pitch: f32, distance: f32) -> Vec3 {
    Vec3::new(
        distance * pitch.cos() * yaw.sin(),
        distance * pitch.sin(),
        distance * pitch.cos() * yaw.cos(),
    )
}

/// Yaw, pitch and length of `offset` in the [`spherical_offset`] convention.
pub fn spherical_from(offset: Vec3) -> (f32, f32, f32) {
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return (0.0, 0.0, 0.0);
    }
    let yaw = offset.x.atan2(offset.z);
    let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
    (yaw, pitch, distance)
}

/// Per-tick lerp factor equivalent to applying `blend` once per reference
/// frame.
pub(crate) fn frame_blend(blend: f32, dt: f32, ref_rate: f32) -> f32 {
    1.0 - (1.0 - blend.clamp(0.0, 1.0)).powf(dt * ref_rate)
}

/// Camera pose plus per-model transient state.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub position: Vec3,
    pub orientation: Quat,
    pub look_target: Vec3,
    model: CameraModel,
    pub(crate) orbital: OrbitalState,
    pub(crate) follow: Option<FollowState>,
    pub(crate) ship: Option<ShipState>,
    pub(crate) warp: Option<WarpState>,
    pub(crate) config: CameraConfig,
}

impl CameraRig {
    /// Creates a rig parked at the home pose.
    pub fn new(config: CameraConfig) -> Self {
        let position = config.home_position();
        let look_target = config.home_target();
        Self {
            position,
            orientation: look_rotation(look_target - position),
            look_target,
            model: CameraModel::OrbitalWide,
            orbital: OrbitalState::default(),
            follow: None,
            ship: None,
            warp: None,
            config,
        }
    }

    pub fn model(&self) -> CameraModel {
        self.model
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn follow(&self) -> Option<&FollowState> {
        self.follow.as_ref()
    }

    pub fn ship(&self) -> Option<&ShipState> {
        self.ship.as_ref()
    }

    pub fn warp(&self) -> Option<&WarpState> {
        self.warp.as_ref()
    }

    pub fn is_warping(&self) -> bool {
        self.model == CameraModel::Warping
    }

    /// Object the follow model orbits, if any.
    pub fn follow_target(&self) -> Option<&ObjectId> {
        self.follow.as_ref().and_then(|f| f.target_id.as_ref())
    }

    /// Leaves the current model, clearing its transient state.
    pub(crate) fn switch_model(&mut self, next: CameraModel) {
        if self.model == next {
            return;
        }
        match self.model {
            CameraModel::FreeFlight => self.ship = None,
            CameraModel::Warping => self.warp = None,
            CameraModel::FollowOrbit => self.follow = None,
            CameraModel::OrbitalWide => self.orbital.transitioning = false,
        }
        tracing::debug!("[camera] {} -> {}", self.model.name(), next.name());
        self.model = next;
    }

    /// Switches to the orbital overview around the current look target.
    pub fn enter_orbital(&mut self) {
        self.switch_model(CameraModel::OrbitalWide);
    }

    /// Switches to follow orbit around `target_id` at `target`.
    ///
    /// Always reinitializes from the current pose, so the camera does not
    /// move on the switching frame.
    pub fn enter_follow(&mut self, target_id: Option<ObjectId>, target: Vec3) {
        self.switch_model(CameraModel::FollowOrbit);
        self.init_follow_from(target);
        if let Some(follow) = &mut self.follow {
            follow.target_id = target_id;
        }
    }

    /// Switches to free flight.
    ///
    /// With `preserve_velocity` an existing ship state is kept; otherwise
    /// the ship is reinitialized from the current orientation at rest.
    pub fn enter_free_flight(&mut self, preserve_velocity: bool) {
        let resume = preserve_velocity && self.model == CameraModel::FreeFlight && self.ship.is_some();
        self.switch_model(CameraModel::FreeFlight);
        if !resume {
            self.init_ship();
        }
    }

    /// Scales the camera distance of the orbital or follow model.
    ///
    /// Positive deltas move closer. Ignored during free flight and warp.
    pub fn zoom(&mut self, delta: f32) {
        if delta == 0.0 {
            return;
        }
        let factor = if delta > 0.0 {
            1.0 / self.config.zoom_step
        } else {
            self.config.zoom_step
        };
        match self.model {
            CameraModel::OrbitalWide => {
                let (min, max) = (self.config.orbital_min_distance, self.config.orbital_max_distance);
                let orbital = &mut self.orbital;
                if orbital.transitioning {
                    orbital.dest_position =
                        scale_about(orbital.dest_position, orbital.dest_target, factor, min, max);
                } else {
                    self.position = scale_about(self.position, self.look_target, factor, min, max);
                }
            }
            CameraModel::FollowOrbit => {
                if let Some(follow) = &mut self.follow {
                    follow.distance = (follow.distance * factor)
                        .clamp(self.config.follow_min_distance, self.config.follow_max_distance);
                }
            }
            CameraModel::FreeFlight | CameraModel::Warping => {}
        }
    }

    /// Advances the authoritative model by `dt` seconds.
    ///
    /// `resolve` yields the current position of a world object. Returns the
    /// arrival action when a warp completes on this tick.
    pub fn update(
        &mut self,
        dt: f32,
        input: &mut InputState,
        resolve: impl Fn(&str) -> Option<Vec3>,
    ) -> Option<WarpArrival> {
        match self.model {
            CameraModel::OrbitalWide => {
                self.update_orbital(dt);
                None
            }
            CameraModel::FollowOrbit => {
                let target = self
                    .follow
                    .as_ref()
                    .and_then(|f| f.target_id.as_ref())
                    .and_then(|id| resolve(id.as_str()));
                self.update_follow(dt, target, input);
                None
            }
            CameraModel::FreeFlight => {
                self.update_ship(dt, input);
                None
            }
            CameraModel::Warping => self.update_warp(dt, resolve),
        }
    }
}

fn scale_about(point: Vec3, center: Vec3, factor: f32, min: f32, max: f32) -> Vec3 {
    let offset = point - center;
    let distance = (offset.length() * factor).clamp(min, max);
    center + offset.normalize_or(Vec3::Z) * distance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> CameraRig {
        CameraRig::new(CameraConfig::default())
    }

    #[test]
    fn test_look_rotation_points_forward() {
        for dir in [Vec3::X, Vec3::NEG_Z, Vec3::new(1.0, 2.0, -3.0), Vec3::Y, Vec3::NEG_Y] {
            let q = look_rotation(dir);
            let forward = q * Vec3::NEG_Z;
            assert!(forward.distance(dir.normalize()) < 1e-4, "{dir:?} -> {forward:?}");
        }
        assert_eq!(look_rotation(Vec3::ZERO), Quat::IDENTITY);
    }

    #[test]
    fn test_spherical_round_trip() {
        let offset = Vec3::new(30.0, -12.0, 55.0);
        let (yaw, pitch, distance) = spherical_from(offset);
        assert!(spherical_offset(yaw, pitch, distance).distance(offset) < 1e-3);
    }

    #[test]
    fn test_new_rig_at_home() {
        let rig = rig();
        assert_eq!(rig.model(), CameraModel::OrbitalWide);
        assert_eq!(rig.position, Vec3::new(0.0, 700.0, 1600.0));
        let to_target = (rig.look_target - rig.position).normalize();
        assert!(rig.forward().distance(to_target) < 1e-4);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut rig = rig();
        for _ in 0..200 {
            rig.zoom(1.0);
        }
        let distance = rig.position.distance(rig.look_target);
        assert!((distance - rig.config.orbital_min_distance).abs() < 1e-2);

        for _ in 0..200 {
            rig.zoom(-1.0);
        }
        let distance = rig.position.distance(rig.look_target);
        assert!((distance - rig.config.orbital_max_distance).abs() < 1e-1);
    }

    #[test]
    fn test_follow_zoom_changes_distance() {
        let mut rig = rig();
        rig.enter_follow(None, Vec3::ZERO);
        let before = rig.follow().unwrap().distance;
        rig.zoom(1.0);
        assert!(rig.follow().unwrap().distance < before);
    }

    #[test]
    fn test_leaving_free_flight_clears_ship() {
        let mut rig = rig();
        rig.enter_free_flight(false);
        assert!(rig.ship().is_some());
        rig.enter_orbital();
        assert!(rig.ship().is_none());
    }

    #[test]
    fn test_free_flight_to_follow_has_no_jump() {
        let mut rig = rig();
        let mut input = InputState::default();
        rig.enter_free_flight(false);
        input.forward = true;
        for _ in 0..30 {
            rig.update(1.0 / 60.0, &mut input, |_| None);
        }
        input.clear_held();

        let target = Vec3::new(100.0, 20.0, -40.0);
        let before = rig.position;
        rig.enter_follow(Some("rust".into()), target);
        assert_eq!(rig.position, before);
        assert!(rig.ship().is_none());

        // the first follow tick lands on the same pose
        rig.update(1.0 / 60.0, &mut input, |_| Some(target));
        assert!(rig.position.distance(before) < 1e-2);
    }
}
