//! Onboarding flow state machine.
//!
//! Pure, synchronous core: `Loading → {Failed | InProgress(step 0..N-1) →
//! ... → Completed}`. No backward navigation. The async controller layers
//! question loading, the UI-feedback delay, and persistence on top.

use super::model::{Question, ScoreSummary};

/// Where the flow currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    /// Questions are being fetched.
    Loading,
    /// Loading failed or returned nothing.
    Failed(String),
    /// Walking the questions; `step` indexes the current one.
    InProgress { step: usize },
    /// All questions answered; scores computed.
    Completed(ScoreSummary),
}

/// Outcome of a `select_option` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Nothing changed: not in progress, unknown option, or the current
    /// question already has a selection (no double taps).
    Ignored,
    /// The option was marked selected. `last_step` tells the caller whether
    /// the upcoming advance will complete the flow.
    Selected { last_step: bool },
}

/// The onboarding question walk.
#[derive(Debug, Clone)]
pub struct OnboardingFlow {
    questions: Vec<Question>,
    state: FlowState,
}

impl OnboardingFlow {
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
            state: FlowState::Loading,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn total_steps(&self) -> usize {
        self.questions.len()
    }

    /// The question at the current step, when in progress.
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            FlowState::InProgress { step } => self.questions.get(step),
            _ => None,
        }
    }

    /// Install the loaded question set. An empty list is a failure state.
    pub fn questions_loaded(&mut self, questions: Vec<Question>) {
        if questions.is_empty() {
            self.state = FlowState::Failed("Could not load onboarding steps.".to_string());
        } else {
            self.questions = questions;
            self.state = FlowState::InProgress { step: 0 };
        }
    }

    pub fn load_failed(&mut self, message: impl Into<String>) {
        self.state = FlowState::Failed(message.into());
    }

    /// Mark `option_id` selected on the current question, deselecting any
    /// sibling. No-op if the question is already answered.
    pub fn select_option(&mut self, option_id: &str) -> Selection {
        let FlowState::InProgress { step } = self.state else {
            return Selection::Ignored;
        };
        let last_step = step + 1 == self.questions.len();
        let Some(question) = self.questions.get_mut(step) else {
            return Selection::Ignored;
        };
        if question.has_selection() {
            return Selection::Ignored;
        }
        if !question.options.iter().any(|o| o.id == option_id) {
            return Selection::Ignored;
        }
        for option in &mut question.options {
            option.selected = option.id == option_id;
        }
        Selection::Selected { last_step }
    }

    /// Move to the next step, or compute scores and complete on the last one.
    ///
    /// Only advances when the current question has a selection.
    pub fn advance(&mut self) {
        let FlowState::InProgress { step } = self.state else {
            return;
        };
        let answered = self.questions.get(step).is_some_and(Question::has_selection);
        if !answered {
            return;
        }
        if step + 1 == self.questions.len() {
            let summary = ScoreSummary::from_questions(&self.questions);
            tracing::debug!(total = summary.total, "Onboarding finished");
            self.state = FlowState::Completed(summary);
        } else {
            self.state = FlowState::InProgress { step: step + 1 };
        }
    }
}

impl Default for OnboardingFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::{QuestionOption, SpectrumCategory};

    fn question(id: &str, category: SpectrumCategory, impacts: &[(&str, u32)]) -> Question {
        Question {
            id: id.to_string(),
            title: format!("question {id}"),
            subtitle: None,
            category,
            options: impacts
                .iter()
                .map(|(opt_id, impact)| QuestionOption {
                    id: opt_id.to_string(),
                    text: format!("option {opt_id}"),
                    impact: *impact,
                    selected: false,
                })
                .collect(),
        }
    }

    fn two_question_flow() -> OnboardingFlow {
        let mut flow = OnboardingFlow::new();
        flow.questions_loaded(vec![
            question("q1", SpectrumCategory::SensoryProcessing, &[("a", 1), ("b", 3)]),
            question("q2", SpectrumCategory::MedicalNeeds, &[("c", 2), ("d", 4)]),
        ]);
        flow
    }

    #[test]
    fn starts_loading() {
        let flow = OnboardingFlow::new();
        assert_eq!(*flow.state(), FlowState::Loading);
        assert!(flow.current_question().is_none());
    }

    #[test]
    fn empty_question_list_fails() {
        let mut flow = OnboardingFlow::new();
        flow.questions_loaded(Vec::new());
        assert!(matches!(flow.state(), FlowState::Failed(_)));
    }

    #[test]
    fn walks_to_completion_with_scores() {
        let mut flow = two_question_flow();

        assert_eq!(flow.select_option("b"), Selection::Selected { last_step: false });
        flow.advance();
        assert_eq!(*flow.state(), FlowState::InProgress { step: 1 });

        assert_eq!(flow.select_option("c"), Selection::Selected { last_step: true });
        flow.advance();

        let FlowState::Completed(summary) = flow.state() else {
            panic!("expected completion, got {:?}", flow.state());
        };
        assert_eq!(summary.total, 5);
        assert_eq!(summary.category(SpectrumCategory::SensoryProcessing), 3);
        assert_eq!(summary.category(SpectrumCategory::MedicalNeeds), 2);
    }

    #[test]
    fn second_selection_on_answered_question_is_ignored() {
        let mut flow = two_question_flow();

        assert_eq!(flow.select_option("a"), Selection::Selected { last_step: false });
        // Double tap before the advance: first selection stands, no advance.
        assert_eq!(flow.select_option("b"), Selection::Ignored);
        assert_eq!(*flow.state(), FlowState::InProgress { step: 0 });

        let selected: Vec<&str> = flow.questions()[0]
            .options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(selected, vec!["a"]);
    }

    #[test]
    fn selection_deselects_siblings() {
        let mut flow = two_question_flow();
        flow.select_option("a");
        flow.advance();
        flow.select_option("d");
        let q2 = &flow.questions()[1];
        assert!(!q2.options[0].selected);
        assert!(q2.options[1].selected);
    }

    #[test]
    fn unknown_option_is_ignored() {
        let mut flow = two_question_flow();
        assert_eq!(flow.select_option("nope"), Selection::Ignored);
        assert!(!flow.questions()[0].has_selection());
    }

    #[test]
    fn advance_without_selection_stays_put() {
        let mut flow = two_question_flow();
        flow.advance();
        assert_eq!(*flow.state(), FlowState::InProgress { step: 0 });
    }

    #[test]
    fn select_ignored_while_loading_or_failed() {
        let mut flow = OnboardingFlow::new();
        assert_eq!(flow.select_option("a"), Selection::Ignored);
        flow.load_failed("boom");
        assert_eq!(flow.select_option("a"), Selection::Ignored);
    }

    #[test]
    fn select_ignored_after_completion() {
        let mut flow = two_question_flow();
        flow.select_option("a");
        flow.advance();
        flow.select_option("c");
        flow.advance();
        assert!(matches!(flow.state(), FlowState::Completed(_)));
        assert_eq!(flow.select_option("d"), Selection::Ignored);
    }
}
