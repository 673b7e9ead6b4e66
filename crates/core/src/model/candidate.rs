use thiserror::Error;

use crate::model::ids::CandidateId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CandidateError {
    #[error("candidate name cannot be empty")]
    EmptyName,

    #[error("candidate id cannot be empty")]
    EmptyId,
}

/// The person taking the exam. Both fields are required before a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    id: CandidateId,
    name: String,
}

impl Candidate {
    /// Build a candidate from raw form input.
    ///
    /// # Errors
    ///
    /// Returns `CandidateError` if either field is blank.
    pub fn new(id: impl AsRef<str>, name: impl AsRef<str>) -> Result<Self, CandidateError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(CandidateError::EmptyName);
        }
        let id = CandidateId::parse(id).map_err(|_| CandidateError::EmptyId)?;
        Ok(Self {
            id,
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &CandidateId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_fields_are_required() {
        assert_eq!(Candidate::new("42", " ").unwrap_err(), CandidateError::EmptyName);
        assert_eq!(Candidate::new("", "Asha").unwrap_err(), CandidateError::EmptyId);

        let candidate = Candidate::new(" 42 ", " Asha ").unwrap();
        assert_eq!(candidate.id().as_str(), "42");
        assert_eq!(candidate.name(), "Asha");
    }
}
