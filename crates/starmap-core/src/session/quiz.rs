//! Evaluation questions.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::world::{ObjectId, World};

/// One multiple-choice question about a visited node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub subject: ObjectId,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl Question {
    /// Builds a question for `subject`: its label plus up to
    /// `options - 1` distinct distractor labels drawn from the other tools,
    /// shuffled.
    pub fn generate<R: Rng + ?Sized>(
        subject: &str,
        world: &World,
        options: usize,
        rng: &mut R,
    ) -> Option<Self> {
        let object = world.get(subject)?;
        let correct = object.label.clone();

        let mut pool: Vec<&str> = world
            .tool_labels()
            .into_iter()
            .filter(|label| *label != correct)
            .collect();
        pool.sort_unstable();
        pool.dedup();

        let mut choices: Vec<String> = pool
            .choose_multiple(rng, options.saturating_sub(1))
            .map(|label| (*label).to_string())
            .collect();
        choices.push(correct.clone());
        choices.shuffle(rng);
        let correct_index = choices.iter().position(|label| *label == correct)?;

        let prompt = match &object.description {
            Some(description) => description.clone(),
            None => {
                let category = object
                    .category_id
                    .as_ref()
                    .and_then(|id| world.get(id.as_str()))
                    .map_or("this system", |c| c.label.as_str());
                format!("Which node from {category} did you visit?")
            }
        };

        Some(Self {
            subject: object.id.clone(),
            prompt,
            options: choices,
            correct_index,
        })
    }

    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }

    pub fn correct_label(&self) -> &str {
        self.options.get(self.correct_index).map_or("", String::as_str)
    }
}

/// How a question was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerOutcome {
    Correct,
    Wrong,
    /// The countdown ran out; scored as wrong.
    Timeout,
}

impl AnswerOutcome {
    pub fn is_correct(self) -> bool {
        self == AnswerOutcome::Correct
    }
}
