//! Error types for the answer loop.
//!
//! Only configuration and model failures are fatal. Parse failures and
//! search failures are absorbed by the step functions and never surface here.

use crate::state::Step;
use std::fmt::{Display, Formatter};

/// Errors that abort a run or prevent one from starting.
#[derive(Debug, Clone, PartialEq)]
pub enum QaError {
    /// Required credential, endpoint or setting is missing or invalid.
    Configuration { message: String },
    /// The language model failed during a step that cannot degrade.
    Model { step: Step, message: String },
    /// The session store could not be read or written.
    Storage { message: String },
    /// No session with the requested id exists in the store.
    SessionNotFound { session_id: String },
}

impl QaError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn model(step: Step, message: impl Into<String>) -> Self {
        Self::Model {
            step,
            message: message.into(),
        }
    }

    /// Returns true for the failures that must stop the process before any run.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

impl Display for QaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration { message } => write!(f, "configuration error: {}", message),
            Self::Model { step, message } => {
                write!(f, "model call failed during {}: {}", step.node_name(), message)
            }
            Self::Storage { message } => write!(f, "storage failure: {}", message),
            Self::SessionNotFound { session_id } => {
                write!(f, "session not found: {}", session_id)
            }
        }
    }
}

impl std::error::Error for QaError {}
