//! Onboarding — sequential question flow with impact scoring.
//!
//! The flow walks the user through the question set one step at a time,
//! records one selection per question, and on the final answer aggregates
//! per-category and total impact scores into the preference store.

pub mod controller;
pub mod flow;
pub mod model;
pub mod source;

pub use controller::{OnboardingController, OnboardingSnapshot};
pub use flow::{FlowState, OnboardingFlow, Selection};
pub use model::{Question, QuestionOption, ScoreSummary, SpectrumCategory};
pub use source::{HttpQuestionSource, QuestionSource, StaticQuestionSource};
