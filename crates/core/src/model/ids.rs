use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a question: the 1-based source row it was parsed from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(u64);

impl QuestionId {
    /// Creates a new `QuestionId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Row ids start at 1; zero only shows up in hand-built or corrupted data.
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for parsing an id from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse QuestionId from {:?}", self.raw)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for QuestionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(QuestionId::new)
            .map_err(|_| ParseIdError { raw: s.to_string() })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_id_display() {
        let id = QuestionId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{id:?}"), "QuestionId(42)");
    }

    #[test]
    fn question_id_from_str() {
        let id: QuestionId = " 7 ".parse().unwrap();
        assert_eq!(id, QuestionId::new(7));
        assert!("seven".parse::<QuestionId>().is_err());
    }

    #[test]
    fn zero_is_unassigned() {
        assert!(!QuestionId::new(0).is_assigned());
        assert!(QuestionId::new(1).is_assigned());
    }

    #[test]
    fn serializes_as_plain_number() {
        let json = serde_json::to_string(&QuestionId::new(3)).unwrap();
        assert_eq!(json, "3");
        let back: QuestionId = serde_json::from_str("3").unwrap();
        assert_eq!(back, QuestionId::new(3));
    }
}
