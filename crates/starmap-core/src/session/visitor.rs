//! Planet-visitor flavor of the session.
//!
//! Each step offers a few random unvisited tools. Picking one (or letting
//! the auto-advance countdown pick the first) warps the camera there; the
//! arrival is scored as a plain visit.

use rand::prelude::*;

use super::{waypoint, GameMode, Session, SessionEffect, SessionError, SessionState};
use crate::world::{ObjectId, World};

impl Session {
    pub(super) fn offer_candidates<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        rng: &mut R,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let candidates =
            waypoint::random_unvisited(world, &self.visited, self.visitor.candidates_per_step, rng);
        if candidates.is_empty() {
            tracing::info!("[session] no planets left");
            return self.begin_evaluation(world, rng);
        }
        let mut keep: Vec<&str> = self.visited.iter().map(ObjectId::as_str).collect();
        keep.extend(candidates.iter().map(ObjectId::as_str));
        world.dim_all_except(&keep);

        self.candidates = candidates.clone();
        self.advance_timer.start(self.visitor.auto_advance);
        tracing::debug!("[session] offering {} candidates", candidates.len());
        Ok(vec![SessionEffect::Candidates(candidates)])
    }

    /// Picks one of the offered planets.
    pub fn choose_candidate(&mut self, id: &str) -> Result<Vec<SessionEffect>, SessionError> {
        self.expect_state(SessionState::Exploration)?;
        if self.mode != GameMode::PlanetVisitor {
            return Err(SessionError::UnknownObject(id.to_string()));
        }
        let Some(index) = self.candidates.iter().position(|c| c == id) else {
            return Err(SessionError::UnknownObject(id.to_string()));
        };
        let chosen = self.candidates.swap_remove(index);
        self.candidates.clear();
        self.advance_timer.stop();
        self.pending = Some(chosen.clone());
        Ok(vec![SessionEffect::WarpTo(chosen)])
    }

    pub(super) fn visitor_visit<R: Rng + ?Sized>(
        &mut self,
        id: ObjectId,
        world: &mut World,
        rng: &mut R,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        if self.pending.as_ref() != Some(&id) {
            // only the chosen planet counts
            return Ok(Vec::new());
        }
        self.pending = None;
        let points = self.visitor.points_per_visit;
        self.score = self.score.saturating_add(points);
        self.route_visited += 1;
        self.visited.push(id.clone());
        tracing::info!("[session] planet {id} +{points}");

        let mut effects = vec![SessionEffect::Scored {
            id,
            points,
            route: true,
        }];
        if self.visited.len() >= self.visitor.total_planets {
            effects.extend(self.begin_evaluation(world, rng)?);
        } else {
            effects.extend(self.offer_candidates(world, rng)?);
        }
        Ok(effects)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SessionConfig;
    use crate::session::test_support::fixture;
    use crate::session::{GameMode, SessionEffect, SessionState};

    #[test]
    fn test_offers_candidates_on_start() {
        let mut fx = fixture(SessionConfig::default());
        let effects = fx.start(GameMode::PlanetVisitor);
        assert_eq!(fx.session.candidates().len(), 3);
        assert!(matches!(effects.last(), Some(SessionEffect::Candidates(c)) if c.len() == 3));
        assert!(fx.session.visited().is_empty());
        assert!(fx.session.advance_timer().is_running());
        // no global clock in this flavor
        assert!(!fx.session.exploration_timer().is_running());
    }

    #[test]
    fn test_choose_then_arrive_scores() {
        let mut fx = fixture(SessionConfig::default());
        fx.start(GameMode::PlanetVisitor);
        let pick = fx.session.candidates()[1].clone();
        let effects = fx.session.choose_candidate(pick.as_str()).unwrap();
        assert_eq!(effects, vec![SessionEffect::WarpTo(pick.clone())]);
        assert!(fx.session.candidates().is_empty());

        fx.visit(pick.as_str());
        assert_eq!(fx.session.score(), 100);
        assert_eq!(fx.session.visited(), &[pick]);
        assert_eq!(fx.session.candidates().len(), 3);
    }

    #[test]
    fn test_auto_advance_picks_first_candidate() {
        let mut fx = fixture(SessionConfig::default());
        fx.start(GameMode::PlanetVisitor);
        let first = fx.session.candidates()[0].clone();
        for _ in 0..9 {
            assert!(fx.tick_second().is_empty());
        }
        assert_eq!(fx.tick_second(), vec![SessionEffect::WarpTo(first)]);
    }

    #[test]
    fn test_exhausting_planets_starts_evaluation() {
        let mut fx = fixture(SessionConfig::default());
        fx.start(GameMode::PlanetVisitor);
        // six tools, fewer than the default eight-planet target
        for _ in 0..6 {
            let pick = fx.session.candidates()[0].clone();
            fx.session.choose_candidate(pick.as_str()).unwrap();
            fx.visit(pick.as_str());
        }
        assert_eq!(fx.session.state(), SessionState::Evaluation);
        assert_eq!(fx.session.visited().len(), 6);
    }

    #[test]
    fn test_unoffered_planet_is_rejected() {
        let mut fx = fixture(SessionConfig::default());
        fx.start(GameMode::PlanetVisitor);
        assert!(fx.session.choose_candidate("lang").is_err());
    }
}
