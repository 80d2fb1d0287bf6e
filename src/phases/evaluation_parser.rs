//! Evaluation output parsing.
//!
//! The evaluator is asked for a bare JSON object but models routinely wrap it
//! in markdown fences, surround it with prose, or ignore the format entirely.
//! Extraction is attempted from a fenced block, then from the first brace
//! delimited object, then from the whole text. When none of those yields a
//! record with at least `score` and `is_acceptable`, a heuristic fallback
//! record is produced so the loop can keep going.

use crate::phases::evaluation_schema::{
    EvaluationRecord, ACCEPTANCE_SCORE, MAX_FEEDBACK_ITEMS, MAX_SCORE, MIN_SCORE,
};
use regex::Regex;
use serde_json::Value;

/// Characters of draft per fallback score point.
const FALLBACK_CHARS_PER_POINT: usize = 200;
const FALLBACK_MIN_SCORE: u8 = 5;
/// From this iteration on, a fallback evaluation always accepts.
const FALLBACK_ACCEPT_ITERATION: u32 = 2;

/// Inputs the fallback heuristic needs when the model output is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackContext {
    /// Length of the draft being evaluated, in characters.
    pub draft_len: usize,
    /// Iteration count at evaluation time.
    pub iteration: u32,
}

/// Where the evaluation record came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationSource {
    FencedBlock,
    EmbeddedObject,
    WholeText,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvaluation {
    pub record: EvaluationRecord,
    pub source: EvaluationSource,
}

impl ParsedEvaluation {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, EvaluationSource::Fallback { .. })
    }
}

/// Parses an evaluation from raw model output, falling back to the heuristic.
///
/// Pure function of its inputs.
pub fn parse_evaluation(text: &str, context: FallbackContext) -> ParsedEvaluation {
    if let Some(record) = extract_fenced_block(text).and_then(record_from_json) {
        return ParsedEvaluation {
            record,
            source: EvaluationSource::FencedBlock,
        };
    }

    if let Some(record) = extract_embedded_object(text).and_then(record_from_json) {
        return ParsedEvaluation {
            record,
            source: EvaluationSource::EmbeddedObject,
        };
    }

    if let Some(record) = record_from_json(text.trim()) {
        return ParsedEvaluation {
            record,
            source: EvaluationSource::WholeText,
        };
    }

    let reason = if text.trim().is_empty() {
        "Empty evaluation response".to_string()
    } else {
        "No JSON object with score and is_acceptable found".to_string()
    };

    ParsedEvaluation {
        record: fallback_evaluation(context),
        source: EvaluationSource::Fallback { reason },
    }
}

/// Builds the heuristic record used when parsing fails.
///
/// Score grows with draft length and is clamped to 5..=10. The record is
/// acceptable once the loop is past its first iteration or the score alone
/// clears the acceptance bar.
pub fn fallback_evaluation(context: FallbackContext) -> EvaluationRecord {
    let points = context.draft_len / FALLBACK_CHARS_PER_POINT;
    let score = points.clamp(FALLBACK_MIN_SCORE as usize, MAX_SCORE as usize) as u8;
    let good_enough = score >= ACCEPTANCE_SCORE;

    EvaluationRecord {
        score,
        is_acceptable: context.iteration >= FALLBACK_ACCEPT_ITERATION || good_enough,
        strengths: vec!["Answer provided".to_string()],
        weaknesses: if good_enough {
            Vec::new()
        } else {
            vec!["Could be more detailed".to_string()]
        },
        suggestions: if good_enough {
            Vec::new()
        } else {
            vec!["Add more examples".to_string()]
        },
        needs_search: false,
    }
}

/// Returns the object inside a ```json (or bare ```) fence, if any.
fn extract_fenced_block(text: &str) -> Option<&str> {
    let re = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```")
        .expect("regex to extract a JSON object from a fenced code block");
    re.captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Returns the first brace-delimited object, tolerating one level of nesting.
fn extract_embedded_object(text: &str) -> Option<&str> {
    let re = Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}")
        .expect("regex to match a brace-delimited object with one nesting level");
    re.find(text).map(|m| m.as_str())
}

/// Converts a JSON candidate into a record, requiring score and is_acceptable.
fn record_from_json(candidate: &str) -> Option<EvaluationRecord> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    let object = value.as_object()?;

    let score = coerce_score(object.get("score")?)?;
    let is_acceptable = coerce_bool(object.get("is_acceptable")?)?;

    Some(EvaluationRecord {
        score,
        is_acceptable,
        strengths: coerce_list(object.get("strengths")),
        weaknesses: coerce_list(object.get("weaknesses")),
        suggestions: coerce_list(object.get("suggestions")),
        needs_search: object
            .get("needs_search")
            .and_then(coerce_bool)
            .unwrap_or(false),
    })
}

fn coerce_score(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE)) as u8)
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_list(value: Option<&Value>) -> Vec<String> {
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(Value::String(s)) if !s.trim().is_empty() => return vec![s.trim().to_string()],
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .take(MAX_FEEDBACK_ITEMS)
        .collect()
}

#[cfg(test)]
#[path = "tests/evaluation_parser_tests.rs"]
mod tests;
