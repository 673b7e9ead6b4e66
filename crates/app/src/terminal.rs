//! Line-oriented exam screen: parses typed commands and renders questions.

use std::fmt::{self, Write as _};

use exam_core::SessionCommand;
use exam_core::model::{Answer, AnswerStatus, ExamPaper, QuestionKind, option_label};
use services::SessionProgress;

pub const HELP: &str = "\
Commands:
  n | next              next question
  p | prev              previous question
  g <N> | goto <N>      jump to question N
  a <X> | answer <X>    choose option X (A, B, ... or 1, 2, ...); list several
                        options for multi-select questions; free text for
                        numeric questions
  c | clear             clear the answer to this question
  r | review            mark / unmark this question for review
  s | show              show the current question again
  submit                submit the exam
  q | quit              save progress and leave without submitting
  h | help              this text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Commands(Vec<SessionCommand>),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Unknown(String),
    MissingValue { command: &'static str },
    InvalidNumber(String),
    InvalidOption(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Unknown(raw) => write!(f, "unknown command: {raw} (type h for help)"),
            InputError::MissingValue { command } => write!(f, "{command} requires a value"),
            InputError::InvalidNumber(raw) => write!(f, "not a question number: {raw}"),
            InputError::InvalidOption(raw) => write!(f, "not an option: {raw}"),
        }
    }
}

impl std::error::Error for InputError {}

/// Parse one typed line against the question currently in focus.
pub fn parse_line(line: &str, paper: &ExamPaper, current: usize) -> Result<Input, InputError> {
    let trimmed = line.trim_start();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (trimmed.trim_end(), ""),
    };

    let single = |command: SessionCommand| -> Result<Input, InputError> {
        Ok(Input::Commands(vec![command]))
    };
    match word.to_ascii_lowercase().as_str() {
        "" | "s" | "show" => Ok(Input::Show),
        "h" | "?" | "help" => Ok(Input::Help),
        "q" | "quit" => Ok(Input::Quit),
        "n" | "next" => single(SessionCommand::Next),
        "p" | "prev" => single(SessionCommand::Previous),
        "c" | "clear" => single(SessionCommand::Clear(current)),
        "r" | "review" => single(SessionCommand::ToggleReview(current)),
        "submit" => single(SessionCommand::Submit),
        "g" | "goto" => {
            let raw = rest.trim();
            if raw.is_empty() {
                return Err(InputError::MissingValue { command: "goto" });
            }
            match raw.parse::<usize>() {
                Ok(number) if number >= 1 => single(SessionCommand::Focus(number - 1)),
                _ => Err(InputError::InvalidNumber(raw.to_string())),
            }
        }
        "a" | "answer" => parse_answer(rest, paper, current),
        _ => Err(InputError::Unknown(word.to_string())),
    }
}

fn parse_answer(rest: &str, paper: &ExamPaper, current: usize) -> Result<Input, InputError> {
    let Some(question) = paper.question(current) else {
        return Err(InputError::InvalidNumber((current + 1).to_string()));
    };

    match question.kind() {
        QuestionKind::Numeric { .. } => {
            let raw = rest.trim_end_matches(['\r', '\n']);
            if raw.trim().is_empty() {
                return Err(InputError::MissingValue { command: "answer" });
            }
            Ok(Input::Commands(vec![SessionCommand::SetNumeric {
                question: current,
                raw: raw.to_string(),
            }]))
        }
        QuestionKind::SingleChoice { .. } => {
            let raw = rest.trim();
            if raw.is_empty() {
                return Err(InputError::MissingValue { command: "answer" });
            }
            Ok(Input::Commands(vec![SessionCommand::ToggleSingle {
                question: current,
                option: parse_option(raw)?,
            }]))
        }
        QuestionKind::MultiChoice { .. } => {
            let commands = rest
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .map(|token| {
                    parse_option(token).map(|option| SessionCommand::ToggleMulti {
                        question: current,
                        option,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if commands.is_empty() {
                return Err(InputError::MissingValue { command: "answer" });
            }
            Ok(Input::Commands(commands))
        }
    }
}

/// `A`..`Z` (any case) or a 1-based number.
fn parse_option(raw: &str) -> Result<usize, InputError> {
    let mut chars = raw.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        if letter.is_ascii_alphabetic() {
            let upper = letter.to_ascii_uppercase();
            return Ok(usize::from(upper as u8 - b'A'));
        }
    }
    match raw.parse::<usize>() {
        Ok(number) if number >= 1 => Ok(number - 1),
        _ => Err(InputError::InvalidOption(raw.to_string())),
    }
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

/// Status line, palette and the question in focus.
pub fn render_question(paper: &ExamPaper, progress: &SessionProgress) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[{}]  Question {}/{}  answered {}  marked {}",
        progress.clock(),
        progress.current_index + 1,
        progress.total,
        progress.answered,
        progress.marked
    );
    let _ = writeln!(out, "{}", render_palette(progress));

    let Some(question) = paper.question(progress.current_index) else {
        return out;
    };
    let _ = writeln!(out);
    let _ = writeln!(out, "{}. {}", progress.current_index + 1, question.prompt());
    if let Some(image) = question.image() {
        let _ = writeln!(out, "   [image: {image}]");
    }

    let answer = progress.current_answer.as_ref();
    match question.kind() {
        QuestionKind::SingleChoice { options, .. } => {
            for (index, option) in options.iter().enumerate() {
                let mark = if answer == Some(&Answer::Single(index)) { "(x)" } else { "( )" };
                let _ = writeln!(out, "   {mark} {}. {option}", option_label(index));
            }
        }
        QuestionKind::MultiChoice { options, .. } => {
            for (index, option) in options.iter().enumerate() {
                let picked = matches!(answer, Some(Answer::Multi(set)) if set.contains(&index));
                let mark = if picked { "[x]" } else { "[ ]" };
                let _ = writeln!(out, "   {mark} {}. {option}", option_label(index));
            }
            let _ = writeln!(out, "   (select all that apply)");
        }
        QuestionKind::Numeric { .. } => {
            let raw = match answer {
                Some(Answer::Numeric(raw)) => raw.as_str(),
                _ => "",
            };
            let _ = writeln!(out, "   Answer: {raw}");
        }
    }

    if progress.statuses.get(progress.current_index) == Some(&AnswerStatus::MarkedForReview) {
        let _ = writeln!(out, "   (marked for review)");
    }
    out
}

/// One cell per question: `+` answered, `.` unanswered, `?` marked; the
/// question in focus is wrapped in `>` `<`.
pub fn render_palette(progress: &SessionProgress) -> String {
    progress
        .statuses
        .iter()
        .enumerate()
        .map(|(index, status)| {
            let symbol = match status {
                AnswerStatus::Answered => '+',
                AnswerStatus::Unanswered => '.',
                AnswerStatus::MarkedForReview => '?',
            };
            if index == progress.current_index {
                format!(">{}{symbol}<", index + 1)
            } else {
                format!(" {}{symbol} ", index + 1)
            }
        })
        .collect()
}
