use rand::seq::SliceRandom;
use rand::Rng;

use crate::quiz::Question;

/// Returns the bank in a fresh random order. Only question order changes;
/// options stay where the author put them so index keys keep pointing at
/// the right option.
pub fn shuffle_questions<R: Rng + ?Sized>(bank: &[Question], rng: &mut R) -> Vec<Question> {
    let mut order = bank.to_vec();
    order.shuffle(rng);
    order
}
