//! Plain-text renderings of a paper for printing or sharing.

use std::fmt::Write as _;

use crate::model::{ExamPaper, QuestionKind, option_label};

/// Numbered questions with lettered options and image references.
#[must_use]
pub fn question_paper(paper: &ExamPaper) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "QUESTION PAPER: {}", paper.title());
    let _ = writeln!(
        out,
        "Duration: {} minutes",
        paper.duration_secs().div_ceil(60)
    );

    for (index, question) in paper.questions().iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {}", index + 1, question.prompt());
        if let Some(image) = question.image() {
            let _ = writeln!(out, "   [image: {image}]");
        }
        match question.kind() {
            QuestionKind::SingleChoice { options, .. } => {
                write_options(&mut out, options);
            }
            QuestionKind::MultiChoice { options, .. } => {
                let _ = writeln!(out, "   (select all that apply)");
                write_options(&mut out, options);
            }
            QuestionKind::Numeric { .. } => {
                let _ = writeln!(out, "   Answer: ________");
            }
        }
    }
    out
}

/// One line per question: option letters or the canonical numeric answer.
#[must_use]
pub fn answer_key(paper: &ExamPaper) -> String {
    let mut out = String::from("ANSWER KEY\n");
    for (index, question) in paper.questions().iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, correct_answer(question.kind()));
    }
    out
}

/// The answer key of one question in display form.
#[must_use]
pub fn correct_answer(kind: &QuestionKind) -> String {
    match kind {
        QuestionKind::SingleChoice { correct, .. } => option_label(*correct),
        QuestionKind::MultiChoice { correct, .. } => correct
            .iter()
            .map(|index| option_label(*index))
            .collect::<Vec<_>>()
            .join(", "),
        QuestionKind::Numeric { answer } => answer.clone(),
    }
}

fn write_options(out: &mut String, options: &[String]) {
    for (index, option) in options.iter().enumerate() {
        let _ = writeln!(out, "   {}. {option}", option_label(index));
    }
}
