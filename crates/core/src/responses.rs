//! Candidate answers and review flags, keyed by question position.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::model::{Answer, AnswerStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResponseError {
    #[error("question index {index} is out of range ({count} questions)")]
    QuestionOutOfRange { index: usize, count: usize },
}

/// Holds at most one attempted answer per question.
///
/// An unattempted question has no entry; empty selections and empty text are
/// never stored, so "no key" is the only representation of "no answer".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseStore {
    question_count: usize,
    answers: BTreeMap<usize, Answer>,
    review: BTreeSet<usize>,
}

impl ResponseStore {
    #[must_use]
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            answers: BTreeMap::new(),
            review: BTreeSet::new(),
        }
    }

    /// Rebuild from persisted maps, dropping entries that are not attempted.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::QuestionOutOfRange` if any key is past the last question.
    pub fn restore(
        question_count: usize,
        answers: BTreeMap<usize, Answer>,
        review: BTreeSet<usize>,
    ) -> Result<Self, ResponseError> {
        let store = Self::new(question_count);
        for &index in answers.keys().chain(review.iter()) {
            store.check(index)?;
        }
        Ok(Self {
            answers: answers
                .into_iter()
                .filter(|(_, answer)| answer.is_attempted())
                .collect(),
            review,
            ..store
        })
    }

    /// Select `option`, or clear the answer if `option` is already selected.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::QuestionOutOfRange` for an invalid index.
    pub fn toggle_single(&mut self, index: usize, option: usize) -> Result<(), ResponseError> {
        self.check(index)?;
        if self.answers.get(&index) == Some(&Answer::Single(option)) {
            self.answers.remove(&index);
        } else {
            self.answers.insert(index, Answer::Single(option));
        }
        Ok(())
    }

    /// Add `option` to the selection, or remove it if present.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::QuestionOutOfRange` for an invalid index.
    pub fn toggle_multi(&mut self, index: usize, option: usize) -> Result<(), ResponseError> {
        self.check(index)?;
        let mut selected = match self.answers.remove(&index) {
            Some(Answer::Multi(set)) => set,
            _ => BTreeSet::new(),
        };
        if !selected.remove(&option) {
            selected.insert(option);
        }
        if !selected.is_empty() {
            self.answers.insert(index, Answer::Multi(selected));
        }
        Ok(())
    }

    /// Store numeric input verbatim. Empty text clears the answer.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::QuestionOutOfRange` for an invalid index.
    pub fn set_numeric(&mut self, index: usize, raw: impl Into<String>) -> Result<(), ResponseError> {
        self.check(index)?;
        let raw = raw.into();
        if raw.is_empty() {
            self.answers.remove(&index);
        } else {
            self.answers.insert(index, Answer::Numeric(raw));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ResponseError::QuestionOutOfRange` for an invalid index.
    pub fn clear(&mut self, index: usize) -> Result<(), ResponseError> {
        self.check(index)?;
        self.answers.remove(&index);
        Ok(())
    }

    /// Flip the review flag and return its new value.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::QuestionOutOfRange` for an invalid index.
    pub fn toggle_review(&mut self, index: usize) -> Result<bool, ResponseError> {
        self.check(index)?;
        if self.review.remove(&index) {
            Ok(false)
        } else {
            self.review.insert(index);
            Ok(true)
        }
    }

    /// Review flag first, then answered/unanswered.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::QuestionOutOfRange` for an invalid index.
    pub fn status(&self, index: usize) -> Result<AnswerStatus, ResponseError> {
        self.check(index)?;
        Ok(if self.review.contains(&index) {
            AnswerStatus::MarkedForReview
        } else if self.answer(index).is_some() {
            AnswerStatus::Answered
        } else {
            AnswerStatus::Unanswered
        })
    }

    /// The attempted answer for `index`, if any.
    #[must_use]
    pub fn answer(&self, index: usize) -> Option<&Answer> {
        self.answers.get(&index).filter(|a| a.is_attempted())
    }

    #[must_use]
    pub fn is_marked(&self, index: usize) -> bool {
        self.review.contains(&index)
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, Answer> {
        &self.answers
    }

    #[must_use]
    pub fn review_flags(&self) -> &BTreeSet<usize> {
        &self.review
    }

    #[must_use]
    pub fn attempted_count(&self) -> usize {
        self.answers.values().filter(|a| a.is_attempted()).count()
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    fn check(&self, index: usize) -> Result<(), ResponseError> {
        if index < self.question_count {
            Ok(())
        } else {
            Err(ResponseError::QuestionOutOfRange {
                index,
                count: self.question_count,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reselecting_single_option_clears_answer() {
        let mut store = ResponseStore::new(2);
        store.toggle_single(0, 1).unwrap();
        assert_eq!(store.answer(0), Some(&Answer::Single(1)));

        store.toggle_single(0, 2).unwrap();
        assert_eq!(store.answer(0), Some(&Answer::Single(2)));

        store.toggle_single(0, 2).unwrap();
        assert_eq!(store.answer(0), None);
        assert_eq!(store.status(0).unwrap(), AnswerStatus::Unanswered);
    }

    #[test]
    fn emptied_multi_selection_removes_key() {
        let mut store = ResponseStore::new(1);
        store.toggle_multi(0, 0).unwrap();
        store.toggle_multi(0, 2).unwrap();
        assert_eq!(
            store.answer(0),
            Some(&Answer::Multi([0, 2].into_iter().collect()))
        );

        store.toggle_multi(0, 0).unwrap();
        store.toggle_multi(0, 2).unwrap();
        assert!(store.answers().is_empty());
    }

    #[test]
    fn numeric_text_is_kept_verbatim() {
        let mut store = ResponseStore::new(1);
        store.set_numeric(0, "-007").unwrap();
        assert_eq!(store.answer(0), Some(&Answer::Numeric("-007".into())));

        store.set_numeric(0, "4a2").unwrap();
        assert_eq!(store.answer(0), Some(&Answer::Numeric("4a2".into())));

        store.set_numeric(0, "").unwrap();
        assert_eq!(store.answer(0), None);
    }

    #[test]
    fn review_flag_takes_precedence_in_status() {
        let mut store = ResponseStore::new(2);
        store.toggle_single(1, 0).unwrap();
        assert!(store.toggle_review(1).unwrap());
        assert_eq!(store.status(1).unwrap(), AnswerStatus::MarkedForReview);

        assert!(!store.toggle_review(1).unwrap());
        assert_eq!(store.status(1).unwrap(), AnswerStatus::Answered);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut store = ResponseStore::new(2);
        assert_eq!(
            store.toggle_single(2, 0).unwrap_err(),
            ResponseError::QuestionOutOfRange { index: 2, count: 2 }
        );
        assert!(store.status(5).is_err());
    }

    #[test]
    fn restore_drops_empty_answers() {
        let mut answers = BTreeMap::new();
        answers.insert(0, Answer::Multi(BTreeSet::new()));
        answers.insert(1, Answer::Numeric("12".into()));
        let store = ResponseStore::restore(2, answers, BTreeSet::new()).unwrap();

        assert_eq!(store.attempted_count(), 1);
        assert_eq!(store.status(0).unwrap(), AnswerStatus::Unanswered);
    }

    #[test]
    fn restore_rejects_foreign_indexes() {
        let review = [3].into_iter().collect();
        assert!(ResponseStore::restore(2, BTreeMap::new(), review).is_err());
    }
}
