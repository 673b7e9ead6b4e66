//! Per-question time accounting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("time ledger has {actual} entries, paper has {expected} questions")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("question index {index} is out of range ({count} questions)")]
    OutOfRange { index: usize, count: usize },
}

/// Cumulative seconds spent on each question, in paper order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeLedger(Vec<u32>);

impl TimeLedger {
    #[must_use]
    pub fn zeroed(question_count: usize) -> Self {
        Self(vec![0; question_count])
    }

    #[must_use]
    pub fn spent(&self, index: usize) -> u32 {
        self.0.get(index).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.iter().map(|s| u64::from(*s)).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for TimeLedger {
    fn from(entries: Vec<u32>) -> Self {
        Self(entries)
    }
}

/// Attributes elapsed seconds to whichever question currently has focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeAccountant {
    ledger: TimeLedger,
    focused: usize,
}

impl TimeAccountant {
    /// Fresh accountant focused on the first question.
    #[must_use]
    pub fn new(question_count: usize) -> Self {
        Self {
            ledger: TimeLedger::zeroed(question_count),
            focused: 0,
        }
    }

    /// Rebuild from persisted state.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if the ledger length or focus does not fit the paper.
    pub fn restore(
        ledger: TimeLedger,
        focused: usize,
        question_count: usize,
    ) -> Result<Self, LedgerError> {
        if ledger.len() != question_count {
            return Err(LedgerError::LengthMismatch {
                expected: question_count,
                actual: ledger.len(),
            });
        }
        if focused >= question_count {
            return Err(LedgerError::OutOfRange {
                index: focused,
                count: question_count,
            });
        }
        Ok(Self { ledger, focused })
    }

    /// Credit `seconds` to the focused question.
    pub fn record(&mut self, seconds: u32) {
        if let Some(entry) = self.ledger.0.get_mut(self.focused) {
            *entry = entry.saturating_add(seconds);
        }
    }

    /// Move focus. Callers record the interval that ended first.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::OutOfRange` for an index past the last question.
    pub fn focus(&mut self, index: usize) -> Result<(), LedgerError> {
        if index >= self.ledger.len() {
            return Err(LedgerError::OutOfRange {
                index,
                count: self.ledger.len(),
            });
        }
        self.focused = index;
        Ok(())
    }

    #[must_use]
    pub fn focused(&self) -> usize {
        self.focused
    }

    #[must_use]
    pub fn ledger(&self) -> &TimeLedger {
        &self.ledger
    }
}
