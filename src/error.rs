//! Error taxonomy of the judging pipeline.
//!
//! None of these ever reach a caller of [`crate::orchestrator::Orchestrator::submit`]: they
//! are folded into a `RuntimeError` result by [`JudgeError::into_result`].

use thiserror::Error;

use crate::language::Language;
use crate::problem::ValueKind;
use crate::verdict::{ExecutionResult, Verdict};

/// Harness generation failed for a problem/language pair
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("check refers to unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("expected {expected:?} value for '{name}', found {found:?}")]
    KindMismatch {
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("test case {index} passes {found} arguments, entry point takes {expected}")]
    Arity {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// The sandbox could not be reached or answered with something unusable
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to sandbox failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("sandbox responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed sandbox response: {0}")]
    Envelope(String),
}

/// The harness ran but its stdout did not follow the delimiter protocol
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("execution finished without a verdict payload")]
    MissingPayload,

    #[error("failed to parse judge output: {0}")]
    MalformedPayload(String),
}

#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("unknown problem '{0}'")]
    UnknownProblem(String),

    #[error("language '{0}' is not configured")]
    UnknownLanguage(Language),

    #[error("harness generation failed: {0}")]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("submission cancelled")]
    Cancelled,
}

impl JudgeError {
    /// Normalizes a pipeline failure into the result shape every caller can render
    pub fn into_result(self) -> ExecutionResult {
        ExecutionResult {
            verdict: Verdict::RuntimeError,
            user_output: String::new(),
            error: Some(format!("System Error: {self}")),
            elapsed_summary: None,
            memory_summary: None,
            test_results: Vec::new(),
        }
    }
}
