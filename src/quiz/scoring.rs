use crate::quiz::Question;

/// Outcome of grading one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    /// One flag per question position.
    pub correct: Vec<bool>,
    /// Number of `true` flags.
    pub total: usize,
    /// Positions whose answer key matches none of the options. These are
    /// always counted wrong.
    pub ungradable: Vec<usize>,
}

impl ScoreCard {
    pub fn wrong_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.correct
            .iter()
            .enumerate()
            .filter(|(_, ok)| !**ok)
            .map(|(position, _)| position)
    }
}

/// Grades `answers` against `questions` position by position. A missing
/// answer (or an answer slot past the end of `answers`) is wrong.
pub fn score(questions: &[Question], answers: &[Option<usize>]) -> ScoreCard {
    let mut correct = Vec::with_capacity(questions.len());
    let mut ungradable = Vec::new();
    let mut total = 0;

    for (position, question) in questions.iter().enumerate() {
        let key = question.answer_index();
        if key.is_none() {
            ungradable.push(position);
        }
        let chosen = answers.get(position).copied().flatten();
        let ok = key.is_some() && chosen == key;
        if ok {
            total += 1;
        }
        correct.push(ok);
    }

    ScoreCard {
        correct,
        total,
        ungradable,
    }
}
