//! Question-wise analysis of a submitted session.

use std::fmt::Write as _;

use crate::export::correct_answer;
use crate::model::{ExamPaper, ExamResult, Outcome};
use crate::time::format_clock;

/// Shown in place of the candidate answer for unattempted questions.
pub const NO_ANSWER: &str = "—";

/// Summary counts followed by one block per question.
#[must_use]
pub fn render(paper: &ExamPaper, result: &ExamResult) -> String {
    let total = u32::try_from(result.total_time_secs()).unwrap_or(u32::MAX);

    let mut out = String::new();
    let _ = writeln!(out, "{}", paper.title());
    let _ = writeln!(out, "Total Score: {}", result.score);
    let _ = writeln!(out, "Attempted: {}", result.attempted);
    let _ = writeln!(out, "Correct: {}", result.correct);
    let _ = writeln!(out, "Wrong: {}", result.wrong);
    let _ = writeln!(out, "Partial: {}", result.partial);
    let _ = writeln!(out, "Unattempted: {}", result.unattempted);
    let _ = writeln!(out, "Time Spent: {}", format_clock(total));
    let _ = writeln!(out);
    let _ = writeln!(out, "Question-wise Analysis:");

    for line in &result.questions {
        let _ = writeln!(
            out,
            "Q{} - {} | Marks: {} | Time Spent: {}",
            line.number,
            line.outcome.as_str().to_uppercase(),
            line.marks,
            format_clock(line.time_spent_secs)
        );

        if let Some(question) = paper.question(line.number - 1) {
            let _ = writeln!(out, "   Correct Answer: {}", correct_answer(question.kind()));
        }

        let given = match (&line.answer, line.outcome) {
            (_, Outcome::Unattempted) | (None, _) => NO_ANSWER.to_string(),
            (Some(answer), _) => answer.display(),
        };
        let _ = writeln!(out, "   Your Answer: {given}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate;
    use crate::ledger::TimeLedger;
    use crate::model::{Marking, PaperDraft, QuestionDraft, QuestionId, QuestionKind};
    use crate::responses::ResponseStore;

    #[test]
    fn renders_summary_and_each_question() {
        let marking = Marking::new(4, -1, 0, 1);
        let paper = PaperDraft {
            title: "Mock".into(),
            duration_secs: 600,
            questions: vec![
                QuestionDraft {
                    id: QuestionId::new(1),
                    prompt: "Pick B".into(),
                    image: None,
                    kind: QuestionKind::SingleChoice {
                        options: vec!["A".into(), "B".into()],
                        correct: 1,
                    },
                    marking,
                },
                QuestionDraft {
                    id: QuestionId::new(2),
                    prompt: "Pick A and C".into(),
                    image: None,
                    kind: QuestionKind::MultiChoice {
                        options: vec!["A".into(), "B".into(), "C".into()],
                        correct: [0, 2].into_iter().collect(),
                    },
                    marking,
                },
                QuestionDraft {
                    id: QuestionId::new(3),
                    prompt: "6 x 7".into(),
                    image: None,
                    kind: QuestionKind::Numeric {
                        answer: "42".into(),
                    },
                    marking,
                },
            ],
        }
        .validate()
        .unwrap();

        let mut responses = ResponseStore::new(3);
        responses.toggle_single(0, 1).unwrap();
        responses.toggle_multi(1, 2).unwrap();
        let result = evaluate(&paper, &responses, &TimeLedger::from(vec![12, 65, 3]));

        let text = render(&paper, &result);

        assert!(text.contains("Total Score: 5\nAttempted: 2\n"));
        assert!(text.contains("Unattempted: 1\nTime Spent: 01:20\n"));
        assert!(text.contains(
            "Q1 - CORRECT | Marks: 4 | Time Spent: 00:12\n   Correct Answer: B\n   Your Answer: B\n"
        ));
        assert!(text.contains("Q2 - PARTIAL | Marks: 1 | Time Spent: 01:05\n"));
        assert!(text.contains("   Correct Answer: A, C\n   Your Answer: C\n"));
        assert!(text.contains("Q3 - UNATTEMPTED | Marks: 0 | Time Spent: 00:03\n"));
        assert!(text.ends_with("   Correct Answer: 42\n   Your Answer: —\n"));
    }
}
