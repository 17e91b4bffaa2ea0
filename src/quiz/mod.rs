//! The timed font-reaction survey.
//!
//! [`QuizController`] is a pure state machine; the quiz page owns the
//! interval timer and HTTP calls and feeds their outcomes back as events.

mod controller;
mod types;

pub use controller::{MAX_CUSTOM_TEXTS, QuizCommand, QuizController, QuizEvent, QuizPhase, QuizSnapshot};
pub use types::{StudyReaction, Variation, VariationConfig, format_clock};
