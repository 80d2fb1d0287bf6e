//! Evaluation record produced after each draft.

use serde::{Deserialize, Serialize};

/// Lowest score an evaluation can carry.
pub const MIN_SCORE: u8 = 1;
/// Highest score an evaluation can carry.
pub const MAX_SCORE: u8 = 10;
/// Score at or above which an acceptable answer is finalized.
pub const ACCEPTANCE_SCORE: u8 = 7;
/// Maximum entries kept in each feedback list.
pub const MAX_FEEDBACK_ITEMS: usize = 3;

/// Structured scoring and feedback for one draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// 1-10
    pub score: u8,
    pub is_acceptable: bool,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub needs_search: bool,
}

impl EvaluationRecord {
    /// True when the record alone is enough to finalize.
    pub fn passes(&self) -> bool {
        self.is_acceptable && self.score >= ACCEPTANCE_SCORE
    }

    /// True when there is concrete feedback to reflect on.
    pub fn has_feedback(&self) -> bool {
        !self.weaknesses.is_empty() || !self.suggestions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: u8, is_acceptable: bool) -> EvaluationRecord {
        EvaluationRecord {
            score,
            is_acceptable,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            suggestions: Vec::new(),
            needs_search: false,
        }
    }

    #[test]
    fn test_passes_requires_both_signals() {
        assert!(record(7, true).passes());
        assert!(!record(6, true).passes());
        assert!(!record(9, false).passes());
    }

    #[test]
    fn test_has_feedback() {
        let mut r = record(5, false);
        assert!(!r.has_feedback());
        r.suggestions.push("add examples".to_string());
        assert!(r.has_feedback());
    }

    #[test]
    fn test_missing_lists_default_when_deserializing() {
        let r: EvaluationRecord =
            serde_json::from_str(r#"{"score": 8, "is_acceptable": true}"#).unwrap();
        assert_eq!(r.score, 8);
        assert!(r.strengths.is_empty());
        assert!(!r.needs_search);
    }
}
