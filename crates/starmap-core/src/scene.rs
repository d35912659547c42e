//! Scene context.
//!
//! Owns every subsystem and routes intents, frame ticks and the coarse
//! session clock between them. Leaderboard I/O never happens here: the
//! scene queues [`SceneEvent`]s and the host services them.

use std::sync::Arc;

use bevy::math::{Quat, Vec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::camera::{CameraModel, CameraRig, WarpArrival};
use crate::config::{ConfigError, StarmapConfig};
use crate::edge::{EdgeSet, RenderedEdge};
use crate::graph::{GraphError, NodeKind, TopicGraph};
use crate::input::{InputState, Intent, IntentMapper, RawInput};
use crate::leaderboard::{LeaderboardClient, LeaderboardEntry, LeaderboardError};
use crate::overlay::{Hud, NullOverlay, OverlaySurface, PanelContent};
use crate::session::{GameMode, Session, SessionEffect, SessionError, SessionState};
use crate::timeline::{Timeline, TourAction, DEFAULT_DWELL};
use crate::world::{ActivationState, ObjectId, World};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),
    #[error("unknown object {0}")]
    UnknownObject(String),
}

/// Work the host must do outside the frame loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    PersistScore(LeaderboardEntry),
    /// Fetch the top `limit` entries and hand them to `receive_ranking`.
    RankingRequested(usize),
    /// Acquire (`true`) or release the exclusive pointer.
    PointerCapture(bool),
}

impl SceneEvent {
    pub fn is_leaderboard(&self) -> bool {
        matches!(self, SceneEvent::PersistScore(_) | SceneEvent::RankingRequested(_))
    }
}

/// Object as the render surface should draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedObject {
    pub id: ObjectId,
    pub label: Option<String>,
    pub kind: NodeKind,
    pub position: Vec3,
    pub activation: ActivationState,
    pub dimmed: bool,
    pub waypoint: bool,
}

/// Per-frame snapshot for the render surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub camera_position: Vec3,
    pub camera_orientation: Quat,
    pub objects: Vec<RenderedObject>,
    pub edges: Vec<RenderedEdge>,
}

pub struct Scene {
    config: StarmapConfig,
    world: World,
    edges: EdgeSet,
    camera: CameraRig,
    session: Session,
    input: InputState,
    mapper: IntentMapper,
    overlay: Arc<dyn OverlaySurface>,
    rng: ChaCha8Rng,
    tour: Option<Timeline>,
    show_connections: bool,
    show_labels: bool,
    events: Vec<SceneEvent>,
}

impl Scene {
    /// Parses the topic graph and builds every subsystem.
    ///
    /// A document that does not parse is fatal.
    pub fn load(json: &str, config: StarmapConfig) -> Result<Self, SceneError> {
        let graph = TopicGraph::from_json(json)?;
        Ok(Self::from_graph(&graph, config))
    }

    pub fn from_graph(graph: &TopicGraph, config: StarmapConfig) -> Self {
        let world = World::build(graph, &config.layout);
        let edges = EdgeSet::build(graph, &world);
        tracing::info!(
            "[scene] loaded {} objects, {} edges (seed {})",
            world.len(),
            edges.len(),
            config.seed
        );
        Self {
            camera: CameraRig::new(config.camera.clone()),
            session: Session::new(config.session.clone(), config.visitor.clone()),
            input: InputState::default(),
            mapper: IntentMapper::new(),
            overlay: Arc::new(NullOverlay),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            tour: None,
            show_connections: false,
            show_labels: true,
            events: Vec::new(),
            world,
            edges,
            config,
        }
    }

    /// Routes panel and HUD output to `overlay`.
    pub fn with_overlay(mut self, overlay: Arc<dyn OverlaySurface>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn config(&self) -> &StarmapConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn edges(&self) -> &EdgeSet {
        &self.edges
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn tour(&self) -> Option<&Timeline> {
        self.tour.as_ref()
    }

    pub fn show_connections(&self) -> bool {
        self.show_connections
    }

    pub fn show_labels(&self) -> bool {
        self.show_labels
    }

    fn reading_open(&self) -> bool {
        self.session.reading().is_some()
    }

    /// Feeds a device event through the intent mapper.
    pub fn handle_raw(&mut self, raw: RawInput) -> Result<(), SceneError> {
        let intent = self.mapper.map(raw, &mut self.input);
        if self.reading_open() {
            self.input.clear_held();
        }
        match intent {
            Some(intent) => self.dispatch(intent),
            None => Ok(()),
        }
    }

    pub fn dispatch(&mut self, intent: Intent) -> Result<(), SceneError> {
        if self.camera.is_warping() && moves_camera(&intent) {
            tracing::debug!("[scene] {} ignored during warp", intent.name());
            return Ok(());
        }
        if self.reading_open()
            && !matches!(intent, Intent::CloseReading | Intent::Escape | Intent::ForceEnd)
            && !intent.is_passive()
        {
            tracing::debug!("[scene] {} ignored while reading", intent.name());
            return Ok(());
        }
        if !matches!(intent, Intent::Hover(_) | Intent::Zoom(_) | Intent::OrbitDrag(_)) {
            tracing::info!("[scene] intent {}", intent.name());
        }

        match intent {
            Intent::Select(id) => self.select(&id)?,
            Intent::Hover(id) => self.world.hover(id.as_ref().map(ObjectId::as_str)),
            Intent::WarpTo(id) => {
                let arrival = if self.session.state() == SessionState::Exploration
                    && self.session.mode() == GameMode::Waypoint
                {
                    WarpArrival::Visit(id.clone())
                } else {
                    WarpArrival::Focus(id.clone())
                };
                self.warp_to(&id, arrival)?;
            }
            Intent::Deselect => self.deselect(),
            Intent::GoHome => {
                self.deselect();
                self.leave_free_flight_capture();
                self.camera.go_home(false);
            }
            Intent::Zoom(delta) => self.camera.zoom(delta),
            Intent::OrbitDrag(_) => {
                if self.camera.model() == CameraModel::OrbitalWide {
                    let delta = self.input.take_pointer_delta();
                    self.camera.orbit_drag(delta);
                }
            }
            Intent::ToggleFreeFlight => self.toggle_free_flight(),
            Intent::ToggleConnections => {
                self.show_connections = !self.show_connections;
                let active = self.world.active().cloned();
                self.edges
                    .apply_visibility(active.as_ref().map(ObjectId::as_str), self.show_connections);
            }
            Intent::ToggleLabels => self.show_labels = !self.show_labels,
            Intent::Escape => self.escape()?,
            Intent::StartGame(mode) => {
                self.stop_tour();
                self.deselect();
                let effects = self
                    .session
                    .start(mode, &mut self.world, &self.edges, &mut self.rng)?;
                self.apply_effects(effects)?;
            }
            Intent::ForceEnd => {
                let effects = self.session.force_end(&mut self.world, &mut self.rng)?;
                self.apply_effects(effects)?;
            }
            Intent::Answer(index) => {
                let effect = self.session.answer(index)?;
                self.apply_effects(vec![effect])?;
            }
            Intent::ChooseCandidate(id) => {
                let effects = self.session.choose_candidate(id.as_str())?;
                self.apply_effects(effects)?;
            }
            Intent::CloseReading => self.close_reading(),
            Intent::SubmitScore(name) => {
                let entry = self.session.submission(&name)?;
                self.events.push(SceneEvent::PersistScore(entry));
            }
            Intent::Replay => {
                let effects = self
                    .session
                    .replay(&mut self.world, &self.edges, &mut self.rng)?;
                self.apply_effects(effects)?;
            }
            Intent::ExitSession => {
                let effect = self.session.exit(&mut self.world)?;
                self.apply_effects(vec![effect])?;
            }
            Intent::ShowRanking => {
                let effects = self.session.show_ranking()?;
                self.apply_effects(effects)?;
            }
            Intent::CloseRanking => {
                let effect = self.session.close_ranking(&mut self.world)?;
                self.apply_effects(vec![effect])?;
            }
            Intent::StartTour => self.start_tour(),
            Intent::CancelTour => {
                if let Some(tour) = &mut self.tour {
                    tour.cancel();
                }
            }
        }
        self.refresh_panel();
        Ok(())
    }

    /// Frame tick.
    pub fn tick(&mut self, dt: f32) -> Result<(), SceneError> {
        self.world.advance(dt);

        let world = &self.world;
        let arrival = self
            .camera
            .update(dt, &mut self.input, |id| world.position(id));
        if let Some(arrival) = arrival {
            self.handle_arrival(arrival)?;
        }
        self.collect_nearby()?;

        self.edges.update_traces(dt, &self.world);

        let (actions, finished) = match &mut self.tour {
            Some(tour) => (tour.advance(dt), tour.is_finished()),
            None => (Vec::new(), false),
        };
        for action in actions {
            self.run_tour_action(action)?;
        }
        if finished {
            tracing::info!("[tour] finished");
            self.tour = None;
        }

        let effects = self.session.update(dt, &mut self.world, &mut self.rng)?;
        if !effects.is_empty() {
            self.apply_effects(effects)?;
            self.refresh_panel();
        }
        self.refresh_hud();
        Ok(())
    }

    /// Coarse one-second clock.
    pub fn tick_second(&mut self) -> Result<(), SceneError> {
        let effects = self.session.tick_second(&mut self.world, &mut self.rng)?;
        self.apply_effects(effects)?;
        self.refresh_panel();
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[SceneEvent] {
        &self.events
    }

    /// Takes only the leaderboard events, leaving the rest queued.
    pub fn drain_leaderboard_events(&mut self) -> Vec<SceneEvent> {
        let (leaderboard, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.events)
            .into_iter()
            .partition(SceneEvent::is_leaderboard);
        self.events = rest;
        leaderboard
    }

    pub fn receive_ranking(&mut self, entries: Vec<LeaderboardEntry>) {
        self.session.receive_ranking(entries);
        self.refresh_panel();
    }

    /// Services queued leaderboard events synchronously against `client`.
    ///
    /// Submission failures are logged; a failed listing is returned.
    pub fn service_leaderboard(&mut self, client: &dyn LeaderboardClient) -> Result<(), LeaderboardError> {
        for event in self.drain_leaderboard_events() {
            match event {
                SceneEvent::PersistScore(entry) => {
                    if let Err(err) = client.submit(entry) {
                        tracing::warn!("[scene] score not persisted: {err}");
                    }
                }
                SceneEvent::RankingRequested(limit) => {
                    let entries = client.list(limit)?;
                    self.receive_ranking(entries);
                }
                SceneEvent::PointerCapture(_) => {}
            }
        }
        Ok(())
    }

    pub fn rendered(&self) -> RenderSnapshot {
        let waypoint = self.session.next_waypoint();
        let objects = self
            .world
            .objects()
            .map(|object| RenderedObject {
                id: object.id.clone(),
                label: (self.show_labels || object.activation != ActivationState::Inactive)
                    .then(|| object.label.clone()),
                kind: object.kind,
                position: object.position_at(self.world.elapsed()),
                activation: object.activation,
                dimmed: object.dimmed,
                waypoint: waypoint == Some(&object.id),
            })
            .collect();
        RenderSnapshot {
            camera_position: self.camera.position,
            camera_orientation: self.camera.orientation,
            objects,
            edges: self.edges.rendered(),
        }
    }

    fn select(&mut self, id: &ObjectId) -> Result<(), SceneError> {
        let position = self
            .world
            .position(id.as_str())
            .ok_or_else(|| SceneError::UnknownObject(id.to_string()))?;
        self.world.activate(Some(id.as_str()));
        self.edges
            .apply_visibility(Some(id.as_str()), self.show_connections);
        self.edges.highlight(id.as_str(), &self.world);
        if self.camera.model() == CameraModel::FollowOrbit {
            self.camera.enter_follow(Some(id.clone()), position);
        }
        Ok(())
    }

    fn deselect(&mut self) {
        if self.world.activate(None).is_some() {
            self.edges.apply_visibility(None, self.show_connections);
        }
        if self.camera.model() == CameraModel::FollowOrbit {
            self.camera.enter_orbital();
        }
    }

    /// Activates `id` and orbits it.
    fn focus(&mut self, id: &ObjectId) -> Result<(), SceneError> {
        let position = self
            .world
            .position(id.as_str())
            .ok_or_else(|| SceneError::UnknownObject(id.to_string()))?;
        self.world.activate(Some(id.as_str()));
        self.edges
            .apply_visibility(Some(id.as_str()), self.show_connections);
        self.edges.highlight(id.as_str(), &self.world);
        self.camera.enter_follow(Some(id.clone()), position);
        Ok(())
    }

    fn warp_to(&mut self, id: &ObjectId, arrival: WarpArrival) -> Result<(), SceneError> {
        let position = self
            .world
            .position(id.as_str())
            .ok_or_else(|| SceneError::UnknownObject(id.to_string()))?;
        self.leave_free_flight_capture();
        let stop_distance = self.config.session.warp_stop_distance;
        self.camera
            .start_warp(position, stop_distance, arrival, Some(id.clone()));
        Ok(())
    }

    fn handle_arrival(&mut self, arrival: WarpArrival) -> Result<(), SceneError> {
        match arrival {
            WarpArrival::Visit(id) => {
                if self.session.state() == SessionState::Exploration {
                    let effects =
                        self.session
                            .register_visit(id.as_str(), &mut self.world, &self.edges, &mut self.rng)?;
                    self.apply_effects(effects)?;
                }
                if self.world.contains(id.as_str()) {
                    self.focus(&id)?;
                    self.maybe_open_reading(&id);
                }
            }
            WarpArrival::Focus(id) => {
                if self.world.contains(id.as_str()) {
                    self.focus(&id)?;
                    if self.session.mode() == GameMode::PlanetVisitor {
                        let effects =
                            self.session
                                .register_visit(id.as_str(), &mut self.world, &self.edges, &mut self.rng);
                        match effects {
                            Ok(effects) => self.apply_effects(effects)?,
                            Err(SessionError::NotInState { .. }) => {}
                            Err(err) => return Err(err.into()),
                        }
                        self.maybe_open_reading(&id);
                    }
                }
            }
            WarpArrival::None => {}
        }
        self.refresh_panel();
        Ok(())
    }

    /// Free-flight counterpart of a warp arrival: flying within
    /// `collect_radius` of an unvisited tool registers it.
    fn collect_nearby(&mut self) -> Result<(), SceneError> {
        if self.camera.model() != CameraModel::FreeFlight
            || self.session.state() != SessionState::Exploration
            || self.session.mode() != GameMode::Waypoint
            || self.reading_open()
        {
            return Ok(());
        }
        let radius = self.config.session.collect_radius;
        let ship = self.camera.position;
        let elapsed = self.world.elapsed();
        let visited = self.session.visited();
        let nearest = self
            .world
            .tools()
            .filter(|object| !visited.contains(&object.id))
            .map(|object| (object.position_at(elapsed).distance(ship), &object.id))
            .filter(|(distance, _)| *distance <= radius)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id.clone());
        let Some(id) = nearest else {
            return Ok(());
        };

        tracing::info!("[scene] collected {id} in free flight");
        let effects = self
            .session
            .register_visit(id.as_str(), &mut self.world, &self.edges, &mut self.rng)?;
        self.apply_effects(effects)?;
        if self.session.state() == SessionState::Exploration {
            self.select(&id)?;
            self.maybe_open_reading(&id);
        }
        self.refresh_panel();
        Ok(())
    }

    fn maybe_open_reading(&mut self, id: &ObjectId) {
        if !self.config.session.forced_reading || self.session.state() != SessionState::Exploration {
            return;
        }
        let has_text = self
            .world
            .get(id.as_str())
            .is_some_and(|o| o.description.is_some());
        if has_text {
            self.session.open_reading(id.clone());
            self.input.clear_held();
            self.set_pointer_capture(false);
        }
    }

    fn close_reading(&mut self) {
        if self.session.close_reading().is_some() && self.camera.model() == CameraModel::FreeFlight {
            self.set_pointer_capture(true);
        }
    }

    fn set_pointer_capture(&mut self, captured: bool) {
        if self.input.pointer_captured != captured {
            self.input.pointer_captured = captured;
            self.events.push(SceneEvent::PointerCapture(captured));
        }
    }

    fn leave_free_flight_capture(&mut self) {
        if self.camera.model() == CameraModel::FreeFlight {
            self.input.clear_held();
            self.set_pointer_capture(false);
        }
    }

    fn toggle_free_flight(&mut self) {
        if self.camera.model() == CameraModel::FreeFlight {
            self.leave_free_flight_capture();
            let active = self.world.active().cloned();
            match active.and_then(|id| self.world.position(id.as_str()).map(|p| (id, p))) {
                Some((id, position)) => self.camera.enter_follow(Some(id), position),
                None => self.camera.enter_orbital(),
            }
        } else {
            self.stop_tour();
            self.camera.enter_free_flight(false);
            self.set_pointer_capture(true);
        }
    }

    fn escape(&mut self) -> Result<(), SceneError> {
        if self.reading_open() {
            self.close_reading();
        } else if self.tour.as_ref().is_some_and(Timeline::is_running) {
            self.stop_tour();
        } else if self.camera.model() == CameraModel::FreeFlight {
            self.toggle_free_flight();
        } else if self.session.state() == SessionState::Ranking {
            let effect = self.session.close_ranking(&mut self.world)?;
            self.apply_effects(vec![effect])?;
        } else {
            self.deselect();
        }
        Ok(())
    }

    fn start_tour(&mut self) {
        if self.session.is_active() {
            tracing::debug!("[tour] not available during a session");
            return;
        }
        self.deselect();
        self.tour = Some(Timeline::category_tour(&self.world, DEFAULT_DWELL));
        tracing::info!("[tour] started");
    }

    fn stop_tour(&mut self) {
        if let Some(tour) = &mut self.tour {
            tour.cancel();
        }
    }

    fn run_tour_action(&mut self, action: TourAction) -> Result<(), SceneError> {
        match action {
            TourAction::Home => {
                self.deselect();
                self.camera.go_home(false);
                Ok(())
            }
            TourAction::Focus(id) => self.warp_to(&id, WarpArrival::Focus(id.clone())),
        }
    }

    fn apply_effects(&mut self, effects: Vec<SessionEffect>) -> Result<(), SceneError> {
        for effect in effects {
            match effect {
                SessionEffect::WarpTo(id) => {
                    let arrival = match self.session.mode() {
                        GameMode::Waypoint => WarpArrival::Visit(id.clone()),
                        GameMode::PlanetVisitor => WarpArrival::Focus(id.clone()),
                    };
                    self.warp_to(&id, arrival)?;
                }
                SessionEffect::StateChanged { to, .. } => match to {
                    SessionState::Evaluation | SessionState::Idle => {
                        self.deselect();
                        self.leave_free_flight_capture();
                        self.camera.go_home(false);
                    }
                    SessionState::Exploration | SessionState::Results | SessionState::Ranking => {}
                },
                SessionEffect::RankingRequested => {
                    self.events
                        .push(SceneEvent::RankingRequested(self.config.leaderboard.top_n));
                }
                SessionEffect::Scored { .. }
                | SessionEffect::NextWaypoint(_)
                | SessionEffect::Candidates(_)
                | SessionEffect::QuestionReady
                | SessionEffect::Answered(_) => {}
            }
        }
        Ok(())
    }

    fn refresh_panel(&self) {
        match self.panel_content() {
            Some(panel) => self.overlay.show_panel(panel),
            None => self.overlay.hide_panel(),
        }
    }

    fn panel_content(&self) -> Option<PanelContent> {
        let session = &self.session;
        if let Some(id) = session.reading() {
            let object = self.world.get(id.as_str())?;
            return Some(PanelContent::Reading {
                id: id.clone(),
                title: object.label.clone(),
                body: object.description.clone().unwrap_or_default(),
            });
        }
        match session.state() {
            SessionState::Evaluation => {
                let question = session.question()?;
                let (index, total) = session.eval_progress();
                Some(PanelContent::Question {
                    prompt: question.prompt.clone(),
                    options: question.options.clone(),
                    index,
                    total,
                    remaining: session.question_timer().remaining(),
                    feedback: session
                        .feedback()
                        .map(|f| (f.outcome, f.selected, question.correct_index)),
                })
            }
            SessionState::Results => Some(PanelContent::Results {
                score: session.score(),
                final_score: session.final_score(),
                stats: session.stats(),
                submitted: session.is_submitted(),
            }),
            SessionState::Ranking => Some(PanelContent::Ranking {
                entries: session.ranking().to_vec(),
            }),
            SessionState::Exploration if !session.candidates().is_empty() => Some(PanelContent::Candidates {
                options: session
                    .candidates()
                    .iter()
                    .filter_map(|id| self.world.get(id.as_str()).map(|o| (id.clone(), o.label.clone())))
                    .collect(),
                remaining: session.advance_timer().remaining(),
            }),
            SessionState::Exploration | SessionState::Idle => {
                let object = self.world.get(self.world.active()?.as_str())?;
                Some(PanelContent::Info {
                    id: object.id.clone(),
                    title: object.label.clone(),
                    url: object.url.clone(),
                    description: object.description.clone(),
                })
            }
        }
    }

    fn refresh_hud(&self) {
        let session = &self.session;
        let next_waypoint = session
            .next_waypoint()
            .and_then(|id| self.world.get(id.as_str()))
            .map(|o| o.label.clone());
        let time_remaining = (session.state() == SessionState::Exploration && session.mode() == GameMode::Waypoint)
            .then(|| session.time_remaining());
        self.overlay.set_hud_text(Hud {
            state: session.state().name().to_string(),
            camera: self.camera.model().name().to_string(),
            score: session.score(),
            combo: session.combo_count(),
            time_remaining,
            next_waypoint,
        });

        #[allow(clippy::cast_precision_loss)]
        let progress = match (&self.tour, session.state()) {
            (Some(tour), _) if tour.is_running() => tour.progress(),
            (_, SessionState::Evaluation) => {
                let (index, total) = session.eval_progress();
                if total == 0 { 1.0 } else { index as f32 / total as f32 }
            }
            _ => 0.0,
        };
        self.overlay.set_progress(progress);
    }
}

/// Intents that would move the camera; suppressed while a warp runs.
fn moves_camera(intent: &Intent) -> bool {
    matches!(
        intent,
        Intent::Select(_)
            | Intent::WarpTo(_)
            | Intent::Deselect
            | Intent::GoHome
            | Intent::OrbitDrag(_)
            | Intent::ToggleFreeFlight
            | Intent::StartTour
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::sample_graph;
    use crate::input::Key;
    use crate::leaderboard::LocalLeaderboard;
    use crate::overlay::OverlayStore;

    const DT: f32 = 1.0 / 60.0;

    fn scene() -> Scene {
        Scene::from_graph(&sample_graph(), StarmapConfig::default().with_seed(7))
    }

    fn run_until_landed(scene: &mut Scene) {
        for _ in 0..600 {
            scene.tick(DT).unwrap();
            if !scene.camera().is_warping() {
                return;
            }
        }
        panic!("warp did not land");
    }

    #[test]
    fn test_load_rejects_bad_document() {
        assert!(matches!(
            Scene::load("{ broken", StarmapConfig::default()),
            Err(SceneError::Graph(GraphError::Parse(_)))
        ));
        assert!(matches!(
            Scene::load(r#"{ "categories": [] }"#, StarmapConfig::default()),
            Err(SceneError::Graph(GraphError::NoCategories))
        ));
    }

    #[test]
    fn test_select_shows_info_and_glows_edges() {
        let store = Arc::new(OverlayStore::new());
        let mut scene = scene().with_overlay(store.clone());
        scene.dispatch(Intent::Select("rust".into())).unwrap();

        assert_eq!(scene.world().active().unwrap(), "rust");
        assert!(matches!(store.get_panel(), Some(PanelContent::Info { title, .. }) if title == "Rust"));
        assert_eq!(scene.edges().iter().filter(|e| e.glow).count(), 2);

        scene.dispatch(Intent::Deselect).unwrap();
        assert!(store.get_panel().is_none());
        assert!(scene.edges().iter().all(|e| !e.visible));
    }

    #[test]
    fn test_warp_outside_session_focuses_target() {
        let mut scene = scene();
        scene.dispatch(Intent::WarpTo("go".into())).unwrap();
        assert!(scene.camera().is_warping());

        // camera intents are suppressed mid-warp
        scene.dispatch(Intent::GoHome).unwrap();
        assert!(scene.camera().is_warping());

        run_until_landed(&mut scene);
        assert_eq!(scene.camera().model(), CameraModel::FollowOrbit);
        assert_eq!(scene.camera().follow_target().unwrap(), "go");
        assert_eq!(scene.world().active().unwrap(), "go");
    }

    #[test]
    fn test_free_flight_to_follow_keeps_position() {
        let mut scene = scene();
        scene.dispatch(Intent::Select("rust".into())).unwrap();
        scene.dispatch(Intent::ToggleFreeFlight).unwrap();
        assert_eq!(scene.camera().model(), CameraModel::FreeFlight);
        assert!(scene.input().pointer_captured);

        scene.handle_raw(RawInput::KeyDown(Key::W)).unwrap();
        for _ in 0..20 {
            scene.tick(DT).unwrap();
        }
        let before = scene.camera().position;
        scene.dispatch(Intent::ToggleFreeFlight).unwrap();
        assert_eq!(scene.camera().model(), CameraModel::FollowOrbit);
        assert_eq!(scene.camera().position, before);
        assert!(!scene.input().pointer_captured);
        assert_eq!(
            scene.drain_events(),
            vec![SceneEvent::PointerCapture(true), SceneEvent::PointerCapture(false)]
        );
    }

    #[test]
    fn test_session_warp_registers_and_reads() {
        let store = Arc::new(OverlayStore::new());
        let mut scene = scene().with_overlay(store.clone());
        scene.dispatch(Intent::StartGame(GameMode::Waypoint)).unwrap();
        assert_eq!(scene.session().state(), SessionState::Exploration);
        assert!(scene.camera().is_warping());
        let first = scene.session().visited()[0].clone();

        run_until_landed(&mut scene);
        assert_eq!(scene.camera().follow_target().unwrap(), &first);

        let has_text = scene.world().get(first.as_str()).unwrap().description.is_some();
        assert_eq!(scene.session().reading().is_some(), has_text);
        if has_text {
            assert!(matches!(store.get_panel(), Some(PanelContent::Reading { .. })));
            scene.dispatch(Intent::CloseReading).unwrap();
        }
        assert!(scene.session().reading().is_none());
    }

    #[test]
    fn test_full_session_submits_and_ranks() {
        let mut scene = scene();
        scene.dispatch(Intent::StartGame(GameMode::Waypoint)).unwrap();
        scene.dispatch(Intent::ForceEnd).unwrap();
        assert_eq!(scene.session().state(), SessionState::Evaluation);

        while scene.session().state() == SessionState::Evaluation {
            let correct = scene.session().question().unwrap().correct_index;
            scene.dispatch(Intent::Answer(correct)).unwrap();
            for _ in 0..120 {
                scene.tick(DT).unwrap();
            }
        }
        assert_eq!(scene.session().state(), SessionState::Results);
        assert_eq!(scene.session().final_score(), 150 + 200);

        scene.dispatch(Intent::SubmitScore("Ada".to_string())).unwrap();
        assert_eq!(scene.session().state(), SessionState::Results);
        assert!(scene.session().is_submitted());
        assert!(matches!(scene.pending_events(), [SceneEvent::PersistScore(_)]));

        let board = LocalLeaderboard::in_memory(100);
        scene.service_leaderboard(&board).unwrap();
        assert!(scene.pending_events().is_empty());
        assert_eq!(board.len(), 1);

        scene.dispatch(Intent::ShowRanking).unwrap();
        assert_eq!(scene.session().state(), SessionState::Ranking);
        assert!(matches!(scene.pending_events(), [SceneEvent::RankingRequested(_)]));
        scene.service_leaderboard(&board).unwrap();
        let ranking = scene.session().ranking();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].name, "Ada");
        assert_eq!(ranking[0].score, 350);

        scene.dispatch(Intent::Escape).unwrap();
        assert_eq!(scene.session().state(), SessionState::Idle);
    }

    #[test]
    fn test_reading_clears_held_movement() {
        let mut scene = scene();
        scene.dispatch(Intent::StartGame(GameMode::Waypoint)).unwrap();
        scene.handle_raw(RawInput::KeyDown(Key::W)).unwrap();
        scene.handle_raw(RawInput::KeyDown(Key::Shift)).unwrap();
        assert!(scene.input().forward);
        run_until_landed(&mut scene);

        if scene.session().reading().is_none() {
            let target = ["rust", "postgres"]
                .into_iter()
                .find(|id| !scene.session().visited().iter().any(|v| v == *id))
                .unwrap();
            scene.handle_raw(RawInput::KeyDown(Key::W)).unwrap();
            scene.dispatch(Intent::WarpTo(target.into())).unwrap();
            run_until_landed(&mut scene);
        }
        assert!(scene.session().reading().is_some());
        assert!(!scene.input().forward);
        assert!(!scene.input().boost);

        // movement keys and camera switches stay dead until the overlay closes
        scene.handle_raw(RawInput::KeyDown(Key::W)).unwrap();
        assert!(!scene.input().forward);
        scene.handle_raw(RawInput::KeyDown(Key::F)).unwrap();
        assert_eq!(scene.camera().model(), CameraModel::FollowOrbit);

        scene.dispatch(Intent::CloseReading).unwrap();
        scene.handle_raw(RawInput::KeyDown(Key::W)).unwrap();
        assert!(scene.input().forward);
    }

    #[test]
    fn test_free_flight_collects_nearby_tool() {
        let mut config = StarmapConfig::default().with_seed(7);
        config.session.collect_radius = 1.0e6;
        config.session.forced_reading = false;
        let mut scene = Scene::from_graph(&sample_graph(), config);
        scene.dispatch(Intent::StartGame(GameMode::Waypoint)).unwrap();
        run_until_landed(&mut scene);
        assert_eq!(scene.session().visited().len(), 1);

        // orbiting a node never collects
        for _ in 0..10 {
            scene.tick(DT).unwrap();
        }
        assert_eq!(scene.session().visited().len(), 1);

        scene.dispatch(Intent::ToggleFreeFlight).unwrap();
        scene.tick(DT).unwrap();
        assert_eq!(scene.session().visited().len(), 2);
        let collected = scene.session().visited()[1].clone();
        assert!(scene.world().get(collected.as_str()).unwrap().is_tool());
        assert_eq!(scene.world().active().unwrap(), &collected);
        assert_eq!(scene.camera().model(), CameraModel::FreeFlight);
        assert!(scene.session().score() > 150);
    }

    #[test]
    fn test_free_flight_outside_radius_collects_nothing() {
        let mut config = StarmapConfig::default().with_seed(7);
        config.session.collect_radius = 0.0;
        let mut scene = Scene::from_graph(&sample_graph(), config);
        scene.dispatch(Intent::StartGame(GameMode::Waypoint)).unwrap();
        run_until_landed(&mut scene);
        scene.dispatch(Intent::CloseReading).unwrap();
        scene.dispatch(Intent::ToggleFreeFlight).unwrap();
        for _ in 0..30 {
            scene.tick(DT).unwrap();
        }
        assert_eq!(scene.session().visited().len(), 1);
    }

    #[test]
    fn test_tour_visits_categories_and_cancels() {
        let mut scene = scene();
        scene.dispatch(Intent::StartTour).unwrap();
        scene.tick(DT).unwrap();
        assert!(scene.tour().unwrap().is_running());

        // home step, then the first category warp
        for _ in 0..((DEFAULT_DWELL * 0.5 / DT) as usize + 2) {
            scene.tick(DT).unwrap();
        }
        assert!(scene.camera().is_warping());

        scene.dispatch(Intent::CancelTour).unwrap();
        for _ in 0..((DEFAULT_DWELL / DT) as usize + 2) {
            scene.tick(DT).unwrap();
        }
        assert!(scene.tour().is_none());
    }

    #[test]
    fn test_labels_and_snapshot() {
        let mut scene = scene();
        let snapshot = scene.rendered();
        assert_eq!(snapshot.objects.len(), scene.world().len());
        assert!(snapshot.objects.iter().all(|o| o.label.is_some()));

        scene.dispatch(Intent::ToggleLabels).unwrap();
        scene.dispatch(Intent::Select("zig".into())).unwrap();
        let snapshot = scene.rendered();
        let labelled: Vec<&str> = snapshot
            .objects
            .iter()
            .filter(|o| o.label.is_some())
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(labelled, vec!["zig"]);
    }
}
