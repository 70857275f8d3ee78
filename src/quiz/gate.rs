#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    Complete,
    /// `position` is the first unanswered slot; the user sees it as question `position + 1`.
    Incomplete { position: usize },
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        matches!(self, Completeness::Complete)
    }
}

pub fn check_complete(answers: &[Option<usize>]) -> Completeness {
    match answers.iter().position(Option::is_none) {
        Some(position) => Completeness::Incomplete { position },
        None => Completeness::Complete,
    }
}
