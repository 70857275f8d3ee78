use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::quiz::feedback::Thresholds;
use crate::quiz::{leading_label, Question, EXPECTED_OPTION_COUNT};

const EMBEDDED_BANK: &str = include_str!("../../data/questions.json");

#[derive(Debug, Error)]
pub enum BankError {
    #[error("failed to open question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("question bank is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question bank has no subjects")]
    NoSubjects,
    #[error("subject {0:?} has no questions")]
    EmptySubject(String),
    #[error("question {id} in subject {subject:?} has no options")]
    NoOptions { subject: String, id: u32 },
}

#[derive(Debug, serde::Deserialize)]
struct BankRecord {
    subjects: Vec<SubjectRecord>,
}

#[derive(Debug, serde::Deserialize)]
struct SubjectRecord {
    name: String,
    #[serde(default)]
    thresholds: Option<Thresholds>,
    questions: Vec<Question>,
}

/// A named group of questions. One quiz session covers one subject.
#[derive(Debug, Clone)]
pub struct Subject {
    pub name: String,
    pub thresholds: Option<Thresholds>,
    pub questions: Arc<Vec<Question>>,
}

impl Subject {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Subject-specific thresholds when the bank sets them, otherwise `default`.
    pub fn thresholds_or(&self, default: Thresholds) -> Thresholds {
        self.thresholds.unwrap_or(default)
    }
}

/// Content problems that do not stop the bank from loading but make
/// grading less accurate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentIssue {
    UngradableKey { subject: String, id: u32 },
    UnexpectedOptionCount { subject: String, id: u32, count: usize },
    DuplicateId { subject: String, id: u32 },
    DuplicateLabel { subject: String, id: u32, label: String },
    UnreachableBand { subject: String, high: usize, total: usize },
}

impl fmt::Display for ContentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentIssue::UngradableKey { subject, id } => write!(
                f,
                "{subject}: question {id} has an answer key that matches no option"
            ),
            ContentIssue::UnexpectedOptionCount { subject, id, count } => write!(
                f,
                "{subject}: question {id} has {count} options, expected {EXPECTED_OPTION_COUNT}"
            ),
            ContentIssue::DuplicateId { subject, id } => {
                write!(f, "{subject}: question id {id} is used more than once")
            }
            ContentIssue::DuplicateLabel { subject, id, label } => write!(
                f,
                "{subject}: question {id} has more than one option labelled {label:?}"
            ),
            ContentIssue::UnreachableBand {
                subject,
                high,
                total,
            } => write!(
                f,
                "{subject}: top feedback threshold {high} is not below its {total} questions"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    subjects: Vec<Subject>,
}

impl QuestionBank {
    /// The bank compiled into the binary.
    pub fn embedded() -> Result<Self, BankError> {
        Self::from_json(EMBEDDED_BANK)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| BankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, BankError> {
        Self::from_record(serde_json::from_reader(reader)?)
    }

    pub fn from_json(json: &str) -> Result<Self, BankError> {
        Self::from_record(serde_json::from_str(json)?)
    }

    fn from_record(record: BankRecord) -> Result<Self, BankError> {
        if record.subjects.is_empty() {
            return Err(BankError::NoSubjects);
        }

        let mut subjects = Vec::with_capacity(record.subjects.len());
        for subject in record.subjects {
            if subject.questions.is_empty() {
                return Err(BankError::EmptySubject(subject.name));
            }
            if let Some(question) = subject.questions.iter().find(|q| q.options.is_empty()) {
                return Err(BankError::NoOptions {
                    subject: subject.name,
                    id: question.id,
                });
            }
            subjects.push(Subject {
                name: subject.name,
                thresholds: subject.thresholds,
                questions: Arc::new(subject.questions),
            });
        }

        Ok(Self { subjects })
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.name == name)
    }

    /// Looks for authoring mistakes. `default` is the threshold set used by
    /// subjects that do not carry their own.
    pub fn validate(&self, default: Thresholds) -> Vec<ContentIssue> {
        let mut issues = Vec::new();

        for subject in &self.subjects {
            let mut seen = HashSet::new();
            for question in subject.questions.iter() {
                if !seen.insert(question.id) {
                    issues.push(ContentIssue::DuplicateId {
                        subject: subject.name.clone(),
                        id: question.id,
                    });
                }
                if question.option_count() != EXPECTED_OPTION_COUNT {
                    issues.push(ContentIssue::UnexpectedOptionCount {
                        subject: subject.name.clone(),
                        id: question.id,
                        count: question.option_count(),
                    });
                }
                if !question.is_gradable() {
                    issues.push(ContentIssue::UngradableKey {
                        subject: subject.name.clone(),
                        id: question.id,
                    });
                }
                if question.answer.is_label() {
                    if let Some(label) = repeated_label(question) {
                        issues.push(ContentIssue::DuplicateLabel {
                            subject: subject.name.clone(),
                            id: question.id,
                            label: label.to_string(),
                        });
                    }
                }
            }

            let thresholds = subject.thresholds_or(default);
            if thresholds.check_total(subject.len()).is_err() {
                issues.push(ContentIssue::UnreachableBand {
                    subject: subject.name.clone(),
                    high: thresholds.high(),
                    total: subject.len(),
                });
            }
        }

        issues
    }
}

fn repeated_label(question: &Question) -> Option<&str> {
    let mut seen = HashSet::new();
    question
        .options
        .iter()
        .filter_map(|option| leading_label(option))
        .find(|label| !seen.insert(*label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::AnswerKey;

    const SMALL_BANK: &str = r#"{
        "subjects": [
            {
                "name": "Letters",
                "thresholds": [1, 2, 3],
                "questions": [
                    {"id": 1, "q": "first", "options": ["A. a", "B. b", "C. c", "D. d"], "answer": "A"},
                    {"id": 2, "q": "second", "options": ["A. a", "B. b", "C. c", "D. d"], "answer": "X"},
                    {"id": 2, "q": "third", "options": ["a", "b", "c"], "answer": 2, "explanation": "c"},
                    {"id": 4, "q": "fourth", "options": ["a", "b", "c", "d"], "answer": 3}
                ]
            },
            {
                "name": "Numbers",
                "questions": [
                    {"id": 1, "q": "only", "options": ["a", "b", "c", "d"], "answer": 0}
                ]
            }
        ]
    }"#;

    #[test]
    fn loads_subjects_in_order() {
        let bank = QuestionBank::from_json(SMALL_BANK).unwrap();
        let names = bank.subjects().iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Letters", "Numbers"]);

        let letters = bank.subject("Letters").unwrap();
        assert_eq!(letters.len(), 4);
        assert_eq!(letters.questions[0].answer, AnswerKey::Label("A".into()));
        assert_eq!(letters.questions[2].explanation.as_deref(), Some("c"));
        assert!(bank.subject("History").is_none());
    }

    #[test]
    fn subject_thresholds_override_default() {
        let bank = QuestionBank::from_json(SMALL_BANK).unwrap();
        let default = Thresholds::default();
        assert_eq!(
            bank.subject("Letters").unwrap().thresholds_or(default),
            Thresholds::new(1, 2, 3).unwrap()
        );
        assert_eq!(bank.subject("Numbers").unwrap().thresholds_or(default), default);
    }

    #[test]
    fn validation_reports_every_authoring_problem() {
        let bank = QuestionBank::from_json(SMALL_BANK).unwrap();
        let issues = bank.validate(Thresholds::default());

        assert_eq!(
            issues,
            vec![
                ContentIssue::UngradableKey { subject: "Letters".into(), id: 2 },
                ContentIssue::DuplicateId { subject: "Letters".into(), id: 2 },
                ContentIssue::UnexpectedOptionCount { subject: "Letters".into(), id: 2, count: 3 },
                ContentIssue::UnreachableBand { subject: "Numbers".into(), high: 18, total: 1 },
            ]
        );
        assert!(issues[0].to_string().contains("matches no option"));
    }

    #[test]
    fn repeated_option_labels_are_reported() {
        let bank = QuestionBank::from_json(
            r#"{"subjects": [{"name": "S", "thresholds": [0, 1, 2], "questions": [
                {"id": 1, "q": "?", "options": ["A. one", "A. two", "C. x", "D. y"], "answer": "C"},
                {"id": 2, "q": "?", "options": ["A. one", "A. two", "C. x", "D. y"], "answer": 2},
                {"id": 3, "q": "?", "options": ["A. one", "B. two", "C. x", "D. y"], "answer": "B"}
            ]}]}"#,
        )
        .unwrap();

        let issues = bank.validate(Thresholds::default());
        assert_eq!(
            issues,
            vec![ContentIssue::DuplicateLabel { subject: "S".into(), id: 1, label: "A".into() }]
        );
        assert!(issues[0].to_string().contains("labelled \"A\""));
    }

    #[test]
    fn structural_problems_fail_the_load() {
        assert!(matches!(
            QuestionBank::from_json(r#"{"subjects": []}"#),
            Err(BankError::NoSubjects)
        ));
        assert!(matches!(
            QuestionBank::from_json(r#"{"subjects": [{"name": "Empty", "questions": []}]}"#),
            Err(BankError::EmptySubject(name)) if name == "Empty"
        ));
        assert!(matches!(
            QuestionBank::from_json(
                r#"{"subjects": [{"name": "S", "questions": [{"id": 3, "q": "?", "options": [], "answer": 0}]}]}"#
            ),
            Err(BankError::NoOptions { id: 3, .. })
        ));
        assert!(matches!(
            QuestionBank::from_json(
                r#"{"subjects": [{"name": "S", "thresholds": [5, 2, 1], "questions": []}]}"#
            ),
            Err(BankError::Json(_))
        ));
        assert!(matches!(
            QuestionBank::from_json("not json"),
            Err(BankError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = QuestionBank::open("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, BankError::Io { .. }));
    }

    #[test]
    fn from_reader_matches_from_json() {
        let bank = QuestionBank::from_reader(SMALL_BANK.as_bytes()).unwrap();
        assert_eq!(bank.subjects().len(), 2);
    }
}
