//! Session controller.
//!
//! A strict forward state machine:
//! `idle -> exploration -> evaluation -> results -> {ranking | idle}`, plus
//! `ranking -> idle` and `idle -> ranking` for the standalone ranking view.
//!
//! Countdowns tick on the coarse one-second clock (`tick_second`); only the
//! timer owned by the current state ticks, and every transition stops the
//! timers of the state being left. The answer feedback delay runs on the
//! frame clock (`update`).

pub mod quiz;
pub mod scoring;
pub mod timer;
pub mod visitor;
pub mod waypoint;

pub use quiz::{AnswerOutcome, Question};
pub use timer::Countdown;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{SessionConfig, VisitorConfig};
use crate::edge::EdgeSet;
use crate::leaderboard::{LeaderboardEntry, LeaderboardError, SessionStats};
use crate::world::{ObjectId, World};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session transition {from:?} -> {to:?}")]
    InvalidTransition { from: SessionState, to: SessionState },
    #[error("expected session state {expected:?}, found {actual:?}")]
    NotInState { expected: SessionState, actual: SessionState },
    #[error("unknown object {0}")]
    UnknownObject(String),
    #[error("score already submitted")]
    AlreadySubmitted,
    #[error("invalid answer index {0}")]
    InvalidAnswer(usize),
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Exploration,
    Evaluation,
    Results,
    Ranking,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::{Evaluation, Exploration, Idle, Ranking, Results};
        matches!(
            (self, next),
            (Idle, Exploration)
                | (Exploration, Evaluation)
                | (Evaluation, Results)
                | (Results, Ranking | Idle)
                | (Ranking, Idle)
                | (Idle, Ranking)
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Exploration => "exploration",
            SessionState::Evaluation => "evaluation",
            SessionState::Results => "results",
            SessionState::Ranking => "ranking",
        }
    }
}

/// Session flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Follow the suggested waypoints against the clock.
    #[default]
    Waypoint,
    /// Pick the next planet from a few random candidates.
    PlanetVisitor,
}

/// Side effects the host must carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    StateChanged { from: SessionState, to: SessionState },
    /// Fly the camera to this object; its arrival is a visit.
    WarpTo(ObjectId),
    Scored { id: ObjectId, points: i64, route: bool },
    NextWaypoint(Option<ObjectId>),
    Candidates(Vec<ObjectId>),
    QuestionReady,
    Answered(AnswerOutcome),
    RankingRequested,
}

/// Answer feedback shown before the next question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feedback {
    pub outcome: AnswerOutcome,
    pub selected: Option<usize>,
    pub remaining: f32,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    visitor: VisitorConfig,
    state: SessionState,
    mode: GameMode,
    visited: Vec<ObjectId>,
    route_visited: u32,
    random_visited: u32,
    next_waypoint: Option<ObjectId>,
    score: i64,
    combo_count: u32,
    exploration_timer: Countdown,
    question_timer: Countdown,
    advance_timer: Countdown,
    eval_queue: Vec<ObjectId>,
    eval_index: usize,
    correct_count: u32,
    wrong_count: u32,
    question: Option<Question>,
    feedback: Option<Feedback>,
    candidates: Vec<ObjectId>,
    /// Candidate the camera is flying to in planet-visitor mode.
    pending: Option<ObjectId>,
    reading: Option<ObjectId>,
    submitted: bool,
    ranking: Vec<LeaderboardEntry>,
}

impl Session {
    pub fn new(config: SessionConfig, visitor: VisitorConfig) -> Self {
        Self {
            config,
            visitor,
            state: SessionState::Idle,
            mode: GameMode::Waypoint,
            visited: Vec::new(),
            route_visited: 0,
            random_visited: 0,
            next_waypoint: None,
            score: 0,
            combo_count: 0,
            exploration_timer: Countdown::default(),
            question_timer: Countdown::default(),
            advance_timer: Countdown::default(),
            eval_queue: Vec::new(),
            eval_index: 0,
            correct_count: 0,
            wrong_count: 0,
            question: None,
            feedback: None,
            candidates: Vec::new(),
            pending: None,
            reading: None,
            submitted: false,
            ranking: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Exploration | SessionState::Evaluation)
    }

    pub fn visited(&self) -> &[ObjectId] {
        &self.visited
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn combo_count(&self) -> u32 {
        self.combo_count
    }

    pub fn next_waypoint(&self) -> Option<&ObjectId> {
        self.next_waypoint.as_ref()
    }

    pub fn time_remaining(&self) -> u32 {
        self.exploration_timer.remaining()
    }

    pub fn exploration_timer(&self) -> &Countdown {
        &self.exploration_timer
    }

    pub fn question_timer(&self) -> &Countdown {
        &self.question_timer
    }

    pub fn advance_timer(&self) -> &Countdown {
        &self.advance_timer
    }

    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Position in the evaluation queue and its length.
    pub fn eval_progress(&self) -> (usize, usize) {
        (self.eval_index, self.eval_queue.len())
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    pub fn candidates(&self) -> &[ObjectId] {
        &self.candidates
    }

    pub fn reading(&self) -> Option<&ObjectId> {
        self.reading.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn ranking(&self) -> &[LeaderboardEntry] {
        &self.ranking
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            visited: u32::try_from(self.visited.len()).unwrap_or(u32::MAX),
            correct: self.correct_count,
            wrong: self.wrong_count,
            route_visits: self.route_visited,
            random_visits: self.random_visited,
        }
    }

    pub fn final_score(&self) -> i64 {
        scoring::final_score(&self.config, self.score, self.correct_count, self.wrong_count)
    }

    fn expect_state(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::NotInState {
                expected,
                actual: self.state,
            })
        }
    }

    /// Moves to `next`, stopping every timer owned by the state being left.
    fn transition(&mut self, next: SessionState) -> Result<SessionEffect, SessionError> {
        let from = self.state;
        if !from.can_transition_to(next) {
            return Err(SessionError::InvalidTransition { from, to: next });
        }
        match from {
            SessionState::Exploration => {
                self.exploration_timer.stop();
                self.advance_timer.stop();
                self.candidates.clear();
                self.pending = None;
                self.reading = None;
            }
            SessionState::Evaluation => {
                self.question_timer.stop();
                self.question = None;
                self.feedback = None;
            }
            SessionState::Idle | SessionState::Results | SessionState::Ranking => {}
        }
        self.state = next;
        tracing::info!("[session] {} -> {}", from.name(), next.name());
        Ok(SessionEffect::StateChanged { from, to: next })
    }

    fn reset(&mut self, mode: GameMode) {
        let fresh = Self::new(self.config.clone(), self.visitor.clone());
        *self = Self { mode, ..fresh };
    }

    /// Starts a session from idle.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        mode: GameMode,
        world: &mut World,
        edges: &EdgeSet,
        rng: &mut R,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        if !self.state.can_transition_to(SessionState::Exploration) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: SessionState::Exploration,
            });
        }
        self.reset(mode);
        let mut effects = vec![self.transition(SessionState::Exploration)?];

        match mode {
            GameMode::Waypoint => {
                let first = waypoint::random_unvisited(world, &[], 1, rng).pop();
                let Some(first) = first else {
                    tracing::warn!("[session] no tool nodes, ending immediately");
                    effects.extend(self.begin_evaluation(world, rng)?);
                    return Ok(effects);
                };
                world.dim_all_except(&[first.as_str()]);
                self.exploration_timer.start(self.config.time_limit);
                self.next_waypoint = Some(first.clone());
                effects.push(SessionEffect::WarpTo(first.clone()));
                effects.extend(self.register_visit(first.as_str(), world, edges, rng)?);
            }
            GameMode::PlanetVisitor => {
                effects.extend(self.offer_candidates(world, rng)?);
            }
        }
        Ok(effects)
    }

    /// Records that the camera reached `id`.
    ///
    /// Non-tool and already visited nodes score nothing.
    pub fn register_visit<R: Rng + ?Sized>(
        &mut self,
        id: &str,
        world: &mut World,
        edges: &EdgeSet,
        rng: &mut R,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        self.expect_state(SessionState::Exploration)?;
        let object = world.get(id).ok_or_else(|| SessionError::UnknownObject(id.to_string()))?;
        if !object.is_tool() || self.visited.iter().any(|v| v == id) {
            return Ok(Vec::new());
        }
        let object_id = object.id.clone();

        if self.mode == GameMode::PlanetVisitor {
            return self.visitor_visit(object_id, world, rng);
        }

        let route = self.next_waypoint.as_ref() == Some(&object_id);
        let points = if route {
            let points = scoring::route_points(&self.config, self.combo_count);
            self.combo_count += 1;
            self.route_visited += 1;
            points
        } else {
            self.combo_count = 0;
            self.random_visited += 1;
            self.config.points_random_visit
        };
        self.score = self.score.saturating_add(points);
        self.visited.push(object_id.clone());
        tracing::info!(
            "[session] visit {object_id} ({}) +{points}, combo {}",
            if route { "route" } else { "random" },
            self.combo_count
        );

        self.next_waypoint = waypoint::pick_next_waypoint(object_id.as_str(), world, edges, &self.visited, rng);
        let mut keep: Vec<&str> = self.visited.iter().map(ObjectId::as_str).collect();
        if let Some(next) = &self.next_waypoint {
            keep.push(next.as_str());
        }
        world.dim_all_except(&keep);

        Ok(vec![
            SessionEffect::Scored {
                id: object_id,
                points,
                route,
            },
            SessionEffect::NextWaypoint(self.next_waypoint.clone()),
        ])
    }

    /// Coarse one-second clock.
    pub fn tick_second<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        rng: &mut R,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        match self.state {
            SessionState::Exploration => match self.mode {
                GameMode::Waypoint => {
                    if self.exploration_timer.tick() {
                        tracing::info!("[session] time is up");
                        return self.begin_evaluation(world, rng);
                    }
                    Ok(Vec::new())
                }
                GameMode::PlanetVisitor => {
                    if self.advance_timer.tick() {
                        if let Some(first) = self.candidates.first().cloned() {
                            tracing::info!("[session] auto-advancing to {first}");
                            return self.choose_candidate(first.as_str());
                        }
                    }
                    Ok(Vec::new())
                }
            },
            SessionState::Evaluation => {
                if self.feedback.is_none() && self.question_timer.tick() {
                    return Ok(vec![self.resolve_answer(AnswerOutcome::Timeout, None)]);
                }
                Ok(Vec::new())
            }
            SessionState::Idle | SessionState::Results | SessionState::Ranking => Ok(Vec::new()),
        }
    }

    /// Frame clock: runs the answer feedback delay.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        world: &mut World,
        rng: &mut R,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        if self.state != SessionState::Evaluation {
            return Ok(Vec::new());
        }
        let Some(feedback) = &mut self.feedback else {
            return Ok(Vec::new());
        };
        feedback.remaining -= dt;
        if feedback.remaining > 0.0 {
            return Ok(Vec::new());
        }
        self.feedback = None;
        self.eval_index += 1;
        self.next_question(world, rng)
    }

    /// Ends exploration early.
    pub fn force_end<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        rng: &mut R,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        self.expect_state(SessionState::Exploration)?;
        tracing::info!("[session] exploration ended early");
        self.begin_evaluation(world, rng)
    }

    fn begin_evaluation<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        rng: &mut R,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let mut effects = vec![self.transition(SessionState::Evaluation)?];
        world.undim_all();
        self.eval_queue = self.visited.clone();
        self.eval_queue.shuffle(rng);
        self.eval_index = 0;
        effects.extend(self.next_question(world, rng)?);
        Ok(effects)
    }

    fn next_question<R: Rng + ?Sized>(
        &mut self,
        world: &World,
        rng: &mut R,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        while let Some(subject) = self.eval_queue.get(self.eval_index) {
            if let Some(question) = Question::generate(subject.as_str(), world, self.config.options_per_question, rng) {
                tracing::debug!(
                    "[session] question {}/{} about {subject}",
                    self.eval_index + 1,
                    self.eval_queue.len()
                );
                self.question = Some(question);
                self.question_timer.start(self.config.question_time);
                return Ok(vec![SessionEffect::QuestionReady]);
            }
            tracing::warn!("[session] no question for {subject}, skipped");
            self.eval_index += 1;
        }
        self.question = None;
        Ok(vec![self.transition(SessionState::Results)?])
    }

    /// Answers the current question with option `index`.
    pub fn answer(&mut self, index: usize) -> Result<SessionEffect, SessionError> {
        self.expect_state(SessionState::Evaluation)?;
        if self.feedback.is_some() {
            return Err(SessionError::InvalidAnswer(index));
        }
        let question = self.question.as_ref().ok_or(SessionError::InvalidAnswer(index))?;
        if index >= question.options.len() {
            return Err(SessionError::InvalidAnswer(index));
        }
        let outcome = if question.is_correct(index) {
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Wrong
        };
        Ok(self.resolve_answer(outcome, Some(index)))
    }

    fn resolve_answer(&mut self, outcome: AnswerOutcome, selected: Option<usize>) -> SessionEffect {
        self.question_timer.stop();
        if outcome.is_correct() {
            self.correct_count += 1;
        } else {
            self.wrong_count += 1;
        }
        tracing::debug!("[session] answer {outcome:?}");
        self.feedback = Some(Feedback {
            outcome,
            selected,
            remaining: self.config.answer_display_delay,
        });
        SessionEffect::Answered(outcome)
    }

    /// Entry to persist for this session's final score. Succeeds once.
    pub fn submission(&mut self, name: &str) -> Result<LeaderboardEntry, SessionError> {
        self.expect_state(SessionState::Results)?;
        if self.submitted {
            return Err(SessionError::AlreadySubmitted);
        }
        let entry = LeaderboardEntry::new(name, self.final_score(), self.stats())?;
        self.submitted = true;
        tracing::info!("[session] submitting {} with {}", entry.name, entry.score);
        Ok(entry)
    }

    /// Starts a new session with the same mode.
    pub fn replay<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        edges: &EdgeSet,
        rng: &mut R,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let mut effects = vec![self.transition(SessionState::Idle)?];
        effects.extend(self.start(self.mode, world, edges, rng)?);
        Ok(effects)
    }

    /// Leaves results for idle.
    pub fn exit(&mut self, world: &mut World) -> Result<SessionEffect, SessionError> {
        let effect = self.transition(SessionState::Idle)?;
        world.undim_all();
        Ok(effect)
    }

    pub fn show_ranking(&mut self) -> Result<Vec<SessionEffect>, SessionError> {
        Ok(vec![self.transition(SessionState::Ranking)?, SessionEffect::RankingRequested])
    }

    /// Stores fetched ranking entries. Ignored outside the ranking view.
    pub fn receive_ranking(&mut self, entries: Vec<LeaderboardEntry>) {
        if self.state == SessionState::Ranking {
            self.ranking = entries;
        } else {
            tracing::debug!("[session] late ranking dropped");
        }
    }

    pub fn close_ranking(&mut self, world: &mut World) -> Result<SessionEffect, SessionError> {
        let effect = self.transition(SessionState::Idle)?;
        world.undim_all();
        Ok(effect)
    }

    /// Opens the reading overlay for `id`, pausing exploration countdowns.
    pub fn open_reading(&mut self, id: ObjectId) {
        if self.state == SessionState::Exploration {
            self.exploration_timer.pause();
            self.advance_timer.pause();
        }
        self.reading = Some(id);
    }

    /// Closes the reading overlay; countdowns resume only while still
    /// exploring.
    pub fn close_reading(&mut self) -> Option<ObjectId> {
        let closed = self.reading.take();
        if self.state == SessionState::Exploration {
            self.exploration_timer.resume();
            self.advance_timer.resume();
        }
        closed
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::graph::fixtures::sample_graph;
    use rand_chacha::ChaCha8Rng;

    pub struct Fixture {
        pub world: World,
        pub edges: EdgeSet,
        pub rng: ChaCha8Rng,
        pub session: Session,
    }

    pub fn fixture(config: SessionConfig) -> Fixture {
        let graph = sample_graph();
        let world = World::build(&graph, &LayoutConfig::default());
        let edges = EdgeSet::build(&graph, &world);
        Fixture {
            world,
            edges,
            rng: ChaCha8Rng::seed_from_u64(42),
            session: Session::new(config, VisitorConfig::default()),
        }
    }

    impl Fixture {
        pub fn start(&mut self, mode: GameMode) -> Vec<SessionEffect> {
            self.session
                .start(mode, &mut self.world, &self.edges, &mut self.rng)
                .unwrap()
        }

        pub fn visit(&mut self, id: &str) -> Vec<SessionEffect> {
            self.session
                .register_visit(id, &mut self.world, &self.edges, &mut self.rng)
                .unwrap()
        }

        pub fn tick_second(&mut self) -> Vec<SessionEffect> {
            self.session.tick_second(&mut self.world, &mut self.rng).unwrap()
        }

        pub fn update(&mut self, dt: f32) -> Vec<SessionEffect> {
            self.session.update(dt, &mut self.world, &mut self.rng).unwrap()
        }

        pub fn force_end(&mut self) -> Vec<SessionEffect> {
            self.session.force_end(&mut self.world, &mut self.rng).unwrap()
        }
    }
}
