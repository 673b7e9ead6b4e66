//! Deterministic scoring of a submitted session.

use crate::ledger::TimeLedger;
use crate::model::{
    Answer, ExamPaper, ExamResult, Marks, Outcome, Question, QuestionKind, QuestionResult,
};
use crate::responses::ResponseStore;

/// Score every question of `paper` in order.
///
/// Pure: the same inputs always produce the same result.
#[must_use]
pub fn evaluate(paper: &ExamPaper, responses: &ResponseStore, ledger: &TimeLedger) -> ExamResult {
    let mut result = ExamResult::default();

    for (index, question) in paper.questions().iter().enumerate() {
        let answer = responses.answer(index);
        let (outcome, marks) = score_question(question, answer);

        match outcome {
            Outcome::Correct => result.correct += 1,
            Outcome::Wrong => result.wrong += 1,
            Outcome::Partial => result.partial += 1,
            Outcome::Unattempted => result.unattempted += 1,
        }
        if outcome != Outcome::Unattempted {
            result.attempted += 1;
        }
        result.score += marks;

        result.questions.push(QuestionResult {
            number: index + 1,
            question_id: question.id(),
            outcome,
            marks,
            time_spent_secs: ledger.spent(index),
            answer: answer.cloned(),
        });
    }

    result
}

/// Judge one answer against its question's key and marking scheme.
///
/// An answer whose shape does not fit the question kind scores as wrong.
#[must_use]
pub fn score_question(question: &Question, answer: Option<&Answer>) -> (Outcome, Marks) {
    let marking = question.marking();
    let Some(answer) = answer.filter(|a| a.is_attempted()) else {
        return (Outcome::Unattempted, marking.on_unattempted);
    };

    let outcome = match (question.kind(), answer) {
        (QuestionKind::SingleChoice { correct, .. }, Answer::Single(selected)) => {
            if selected == correct {
                Outcome::Correct
            } else {
                Outcome::Wrong
            }
        }
        (QuestionKind::Numeric { answer: key }, Answer::Numeric(raw)) => {
            if raw.trim() == key.as_str() {
                Outcome::Correct
            } else {
                Outcome::Wrong
            }
        }
        (QuestionKind::MultiChoice { correct, .. }, Answer::Multi(selected)) => {
            if !selected.is_subset(correct) {
                Outcome::Wrong
            } else if selected == correct {
                Outcome::Correct
            } else {
                let picked = Marks::try_from(selected.len()).unwrap_or(Marks::MAX);
                return (Outcome::Partial, picked.saturating_mul(marking.on_partial));
            }
        }
        _ => Outcome::Wrong,
    };

    let marks = match outcome {
        Outcome::Correct => marking.on_correct,
        _ => marking.on_wrong,
    };
    (outcome, marks)
}
