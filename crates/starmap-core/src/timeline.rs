//! Scripted tour executor.
//!
//! A flat list of steps advanced by a virtual clock. Each step's action
//! is emitted when the step starts; a cancel request takes effect at the
//! next step boundary.

use serde::{Deserialize, Serialize};

use crate::world::{ObjectId, World};

/// Seconds the tour dwells on each category.
pub const DEFAULT_DWELL: f32 = 4.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TourAction {
    /// Return to the home pose.
    Home,
    /// Fly to and focus an object.
    Focus(ObjectId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStep {
    pub action: TourAction,
    pub duration: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    steps: Vec<TimelineStep>,
    /// Index of the running step, `None` before start or after the end.
    current: Option<usize>,
    elapsed: f32,
    cancel_requested: bool,
    finished: bool,
}

impl Timeline {
    pub fn new(steps: Vec<TimelineStep>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    /// Home, then every category in layout order, then home again.
    pub fn category_tour(world: &World, dwell: f32) -> Self {
        let mut steps = vec![TimelineStep {
            action: TourAction::Home,
            duration: dwell * 0.5,
        }];
        steps.extend(world.categories().map(|category| TimelineStep {
            action: TourAction::Focus(category.id.clone()),
            duration: dwell,
        }));
        steps.push(TimelineStep {
            action: TourAction::Home,
            duration: 0.0,
        });
        Self::new(steps)
    }

    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some() && !self.finished
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Completed fraction of the steps.
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f32 {
        if self.finished || self.steps.is_empty() {
            return 1.0;
        }
        self.current
            .map_or(0.0, |index| index as f32 / self.steps.len() as f32)
    }

    /// Requests a stop at the next step boundary.
    pub fn cancel(&mut self) {
        if self.is_running() {
            self.cancel_requested = true;
        }
    }

    pub fn restart(&mut self) {
        self.current = None;
        self.elapsed = 0.0;
        self.cancel_requested = false;
        self.finished = false;
    }

    /// Advances the clock, returning the actions of steps that started.
    pub fn advance(&mut self, dt: f32) -> Vec<TourAction> {
        let mut started = Vec::new();
        if self.finished {
            return started;
        }
        let mut index = match self.current {
            Some(index) => index,
            None => {
                let Some(first) = self.steps.first() else {
                    self.finished = true;
                    return started;
                };
                started.push(first.action.clone());
                self.current = Some(0);
                self.elapsed = 0.0;
                0
            }
        };

        self.elapsed += dt;
        while let Some(step) = self.steps.get(index) {
            if self.elapsed < step.duration {
                return started;
            }
            self.elapsed -= step.duration;
            if self.cancel_requested {
                tracing::info!("[tour] cancelled after step {index}");
                break;
            }
            index += 1;
            self.current = Some(index);
            if let Some(next) = self.steps.get(index) {
                started.push(next.action.clone());
            }
        }

        self.finished = true;
        self.current = None;
        self.cancel_requested = false;
        started
    }
}
