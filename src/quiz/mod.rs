use std::collections::HashSet;

pub mod answers;
pub mod bank;
pub mod feedback;
pub mod gate;
pub mod scoring;
pub mod session;
pub mod shuffle;

pub use answers::{AnswerError, AnswerSheet};
pub use bank::{BankError, ContentIssue, QuestionBank, Subject};
pub use feedback::{classify, FeedbackTier, Severity, ThresholdError, Thresholds};
pub use gate::{check_complete, Completeness};
pub use scoring::{score, ScoreCard};
pub use session::{QuizResult, Session, SessionError, SessionState, SubmitOutcome, SubmitToken};
pub use shuffle::shuffle_questions;

/// Number of options every question in this domain is authored with.
pub const EXPECTED_OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub id: u32,
    #[serde(rename = "q")]
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: AnswerKey,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl Question {
    pub fn new(id: u32, prompt: impl Into<String>, options: Vec<String>, answer: AnswerKey) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            options,
            answer,
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Index of the correct option, or `None` when the key points at nothing.
    pub fn answer_index(&self) -> Option<usize> {
        self.answer.resolve(&self.options)
    }

    pub fn is_gradable(&self) -> bool {
        self.answer_index().is_some()
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        self.answer_index() == Some(choice)
    }

    /// The options' own labels, when every option has one and no two agree.
    pub fn distinct_labels(&self) -> Option<Vec<&str>> {
        let labels = self
            .options
            .iter()
            .map(|option| leading_label(option))
            .collect::<Option<Vec<_>>>()?;
        let mut seen = HashSet::new();
        labels.iter().all(|label| seen.insert(*label)).then_some(labels)
    }
}

/// Reference to the correct option. Authors write either the option index
/// (`"answer": 1`) or the option's leading label (`"answer": "B"`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    Index(usize),
    Label(String),
}

impl AnswerKey {
    pub fn resolve(&self, options: &[String]) -> Option<usize> {
        match self {
            AnswerKey::Index(index) => (*index < options.len()).then_some(*index),
            AnswerKey::Label(token) => {
                let token = normalize_token(token);
                if token.is_empty() {
                    return None;
                }
                options
                    .iter()
                    .position(|option| leading_label(option) == Some(token))
            }
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self, AnswerKey::Label(_))
    }
}

/// The label an option starts with: `"B. y"` -> `"B"`, `"ข) ..."` -> `"ข"`.
pub fn leading_label(option: &str) -> Option<&str> {
    let option = option.trim_start();
    let end = option
        .find(|c: char| c == '.' || c == ')' || c.is_whitespace())
        .unwrap_or(option.len());
    let label = &option[..end];
    (!label.is_empty()).then_some(label)
}

fn normalize_token(token: &str) -> &str {
    let token = token.trim();
    token.strip_suffix(['.', ')']).unwrap_or(token)
}
