use thiserror::Error;

use crate::quiz::Question;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("question {position} does not exist (quiz has {len} questions)")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("question {position} has {options} options, option {option} is out of range")]
    OptionOutOfRange {
        position: usize,
        option: usize,
        options: usize,
    },
}

/// Chosen option per question position. A slot is `None` until the user
/// picks something; picking again overwrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSheet {
    slots: Vec<Option<usize>>,
    option_counts: Vec<usize>,
}

impl AnswerSheet {
    pub fn for_questions(questions: &[Question]) -> Self {
        Self {
            slots: vec![None; questions.len()],
            option_counts: questions.iter().map(Question::option_count).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn set(&mut self, position: usize, option: usize) -> Result<(), AnswerError> {
        let options = self.option_count(position)?;
        if option >= options {
            return Err(AnswerError::OptionOutOfRange {
                position,
                option,
                options,
            });
        }
        self.slots[position] = Some(option);
        Ok(())
    }

    pub fn get(&self, position: usize) -> Result<Option<usize>, AnswerError> {
        self.slots
            .get(position)
            .copied()
            .ok_or(AnswerError::PositionOutOfRange {
                position,
                len: self.slots.len(),
            })
    }

    pub fn reset(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    pub fn answered(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn option_count(&self, position: usize) -> Result<usize, AnswerError> {
        self.option_counts
            .get(position)
            .copied()
            .ok_or(AnswerError::PositionOutOfRange {
                position,
                len: self.slots.len(),
            })
    }
}
