use std::fmt;

use serde::{Deserialize, Serialize};

/// Overall outcome of a submission
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    #[serde(rename = "AC")]
    Accepted,
    #[serde(rename = "WA")]
    WrongAnswer,
    #[serde(rename = "RE")]
    RuntimeError,
    #[serde(rename = "TLE")]
    TimeLimitExceeded,
}

impl Verdict {
    /// Precedence rule over per-test outcomes: any error means `RuntimeError`, otherwise any
    /// failure means `WrongAnswer`
    pub fn from_test_results(results: &[PerTestResult]) -> Verdict {
        if results.iter().any(|r| r.error.is_some()) {
            Verdict::RuntimeError
        } else if results.iter().any(|r| !r.passed) {
            Verdict::WrongAnswer
        } else {
            Verdict::Accepted
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Accepted => "Accepted",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::RuntimeError => "Runtime Error",
            Verdict::TimeLimitExceeded => "Time Limit Exceeded",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one test case as reported by the harness
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerTestResult {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected: String,
    #[serde(default)]
    pub actual: String,
    pub passed: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Milliseconds; the harness names this field `time`
    #[serde(default, alias = "time")]
    pub elapsed_ms: Option<f64>,
}

/// Everything a caller ever gets back for a submission
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub verdict: Verdict,
    pub user_output: String,
    pub error: Option<String>,
    pub elapsed_summary: Option<String>,
    pub memory_summary: Option<String>,
    pub test_results: Vec<PerTestResult>,
}

impl ExecutionResult {
    pub fn runtime_error(user_output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::RuntimeError,
            user_output: user_output.into(),
            error: Some(error.into()),
            elapsed_summary: None,
            memory_summary: None,
            test_results: Vec::new(),
        }
    }

    pub fn passed_count(&self) -> usize {
        self.test_results.iter().filter(|r| r.passed).count()
    }
}
