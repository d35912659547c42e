//! Warp transition.
//!
//! Flies the camera to a stop point in front of a target. Each tick moves
//! the remaining fraction of the eased curve, `(e(t1) - e(t0)) / (1 - e(t0))`,
//! toward the current stop point, so a tracked target that keeps moving is
//! chased smoothly instead of snapping at the end.

use bevy::math::Vec3;

use super::{look_rotation, CameraModel, CameraRig};
use crate::easing::EasingType;
use crate::world::ObjectId;

/// What the host should do once the warp lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarpArrival {
    /// Focus the object (follow orbit, info panel).
    Focus(ObjectId),
    /// Session node reached; register the visit.
    Visit(ObjectId),
    /// Nothing to do.
    None,
}

/// Transient state of a running warp.
#[derive(Debug, Clone)]
pub struct WarpState {
    /// Last known target position.
    pub target: Vec3,
    /// Object whose position is re-resolved every tick.
    pub tracked: Option<ObjectId>,
    pub stop_distance: f32,
    /// Unit vector from the camera toward the target at warp start.
    pub approach_dir: Vec3,
    pub elapsed: f32,
    pub duration: f32,
    pub easing: EasingType,
    pub on_arrival: WarpArrival,
}

impl WarpState {
    /// Point `stop_distance` short of the target along the approach.
    pub fn stop_point(&self) -> Vec3 {
        self.target - self.approach_dir * self.stop_distance
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }
}

impl CameraRig {
    /// Starts a warp toward `target`.
    ///
    /// The previous model's transient state is cleared. Ship input is
    /// ignored until the warp lands.
    pub fn start_warp(
        &mut self,
        target: Vec3,
        stop_distance: f32,
        on_arrival: WarpArrival,
        tracked: Option<ObjectId>,
    ) {
        let approach_dir = (target - self.position).try_normalize().unwrap_or_else(|| self.forward());
        if self.model() == CameraModel::Warping {
            tracing::debug!("[camera] warp retargeted");
            self.warp = None;
        }
        self.switch_model(CameraModel::Warping);
        tracing::info!(
            "[camera] warp start -> {}",
            tracked.as_ref().map_or("<point>", ObjectId::as_str)
        );
        self.warp = Some(WarpState {
            target,
            tracked,
            stop_distance,
            approach_dir,
            elapsed: 0.0,
            duration: self.config.warp_duration,
            easing: EasingType::CubicInOut,
            on_arrival,
        });
    }

    pub(crate) fn update_warp(
        &mut self,
        dt: f32,
        resolve: impl Fn(&str) -> Option<Vec3>,
    ) -> Option<WarpArrival> {
        let warp = self.warp.as_mut()?;

        if let Some(id) = &warp.tracked {
            match resolve(id.as_str()) {
                Some(pos) => warp.target = pos,
                None => {
                    tracing::warn!("[camera] warp target {id} lost, holding last position");
                    warp.tracked = None;
                }
            }
        }

        let t0 = warp.progress();
        warp.elapsed += dt;
        let t1 = warp.progress();
        let stop = warp.stop_point();
        let target = warp.target;

        if warp.elapsed >= warp.duration {
            let arrival = std::mem::replace(&mut warp.on_arrival, WarpArrival::None);
            self.position = stop;
            self.look_target = target;
            self.orientation = look_rotation(target - stop);
            self.switch_model(CameraModel::OrbitalWide);
            tracing::info!("[camera] warp complete");
            return Some(arrival);
        }

        let e0 = warp.easing.apply(t0);
        let e1 = warp.easing.apply(t1);
        let step = if e0 < 1.0 { ((e1 - e0) / (1.0 - e0)).clamp(0.0, 1.0) } else { 1.0 };

        self.position = self.position.lerp(stop, step);
        let facing = look_rotation(target - self.position);
        self.orientation = self.orientation.slerp(facing, step);
        self.look_target = target;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::input::InputState;

    const DT: f32 = 1.0 / 60.0;

    fn run_to_arrival(rig: &mut CameraRig, resolve: impl Fn(&str) -> Option<Vec3>) -> WarpArrival {
        let mut input = InputState::default();
        for _ in 0..1000 {
            if let Some(arrival) = rig.update(DT, &mut input, &resolve) {
                return arrival;
            }
        }
        panic!("warp never completed");
    }

    #[test]
    fn test_warp_lands_at_stop_distance() {
        let mut rig = CameraRig::new(CameraConfig::default());
        let target = Vec3::new(300.0, -50.0, 120.0);
        rig.start_warp(target, 60.0, WarpArrival::Focus("rust".into()), None);
        assert!(rig.is_warping());

        let arrival = run_to_arrival(&mut rig, |_| None);
        assert_eq!(arrival, WarpArrival::Focus("rust".into()));
        assert!((rig.position.distance(target) - 60.0).abs() < 1e-3);
        let facing = (target - rig.position).normalize();
        assert!(rig.forward().distance(facing) < 1e-4);
        assert!(rig.warp().is_none());
        assert!(!rig.is_warping());
    }

    #[test]
    fn test_warp_tracks_moving_target() {
        use std::cell::Cell;

        let mut rig = CameraRig::new(CameraConfig::default());
        let clock = Cell::new(0.0_f32);
        let moving = |_: &str| {
            let t = clock.get();
            clock.set(t + DT);
            Some(Vec3::new(400.0 + 50.0 * t, 0.0, 0.0))
        };
        rig.start_warp(Vec3::new(400.0, 0.0, 0.0), 60.0, WarpArrival::Visit("go".into()), Some("go".into()));
        let arrival = run_to_arrival(&mut rig, moving);
        assert_eq!(arrival, WarpArrival::Visit("go".into()));
        let last = Vec3::new(400.0 + 50.0 * (clock.get() - DT), 0.0, 0.0);
        assert!((rig.position.distance(last) - 60.0).abs() < 1e-2);
    }

    #[test]
    fn test_lost_target_degrades_to_last_position() {
        use std::cell::Cell;

        let mut rig = CameraRig::new(CameraConfig::default());
        let ticks = Cell::new(0);
        let flaky = |_: &str| {
            ticks.set(ticks.get() + 1);
            (ticks.get() < 10).then_some(Vec3::new(200.0, 0.0, 0.0))
        };
        rig.start_warp(Vec3::new(100.0, 0.0, 0.0), 40.0, WarpArrival::None, Some("zig".into()));
        run_to_arrival(&mut rig, flaky);
        assert!((rig.position.distance(Vec3::new(200.0, 0.0, 0.0)) - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_warp_ignores_ship_input() {
        let mut rig = CameraRig::new(CameraConfig::default());
        rig.enter_free_flight(false);
        rig.start_warp(Vec3::ZERO, 60.0, WarpArrival::None, None);
        assert!(rig.ship().is_none());

        let mut input = InputState {
            forward: true,
            boost: true,
            ..InputState::default()
        };
        let mut clean = rig.clone();
        let mut idle = InputState::default();
        for _ in 0..30 {
            rig.update(DT, &mut input, |_| None);
            clean.update(DT, &mut idle, |_| None);
        }
        assert_eq!(rig.position, clean.position);
    }
}
