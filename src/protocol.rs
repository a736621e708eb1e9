//! The contract between a generated harness and the resolver.
//!
//! A harness prints whatever the user's code prints, then a line holding exactly
//! [`JUDGE_DELIMITER`], then one line of JSON shaped like [`JudgePayload`].

use serde::{Deserialize, Serialize};

use crate::verdict::{PerTestResult, Verdict};

pub const JUDGE_DELIMITER: &str = "---JUDGE_RESULT_JSON::7c1e4b90-a3d2-4f6e-9b58-e0f1d2c3b4a5---";

/// Structured record printed by the harness after the delimiter
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JudgePayload {
    pub verdict: Verdict,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub test_results: Vec<PerTestResult>,
}
