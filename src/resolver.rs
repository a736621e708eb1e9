//! Turns the sandbox's raw output back into an [`ExecutionResult`].

use crate::error::ProtocolError;
use crate::protocol::{JUDGE_DELIMITER, JudgePayload};
use crate::sandbox::RawRunOutput;
use crate::verdict::{ExecutionResult, PerTestResult, Verdict};

const GENERIC_FAILURE: &str = "Compilation/Runtime Error";

/// Classifies one run; never fails
pub fn resolve(output: &RawRunOutput) -> ExecutionResult {
    let Some((user_output, payload)) = output.stdout.split_once(JUDGE_DELIMITER) else {
        return resolve_without_delimiter(output);
    };

    // One line of JSON follows the delimiter; anything printed after it is not ours
    let payload = payload.trim_start().lines().next().unwrap_or("").trim();
    if payload.is_empty() {
        log::warn!("Judge delimiter present but no payload follows");
        return ExecutionResult::runtime_error(
            user_output,
            ProtocolError::MissingPayload.to_string(),
        );
    }

    match serde_json::from_str::<JudgePayload>(payload) {
        Ok(parsed) => from_payload(user_output, parsed),
        Err(e) => {
            log::warn!("Failed to parse judge payload: {e}");
            ExecutionResult::runtime_error(
                user_output,
                ProtocolError::MalformedPayload(e.to_string()).to_string(),
            )
        }
    }
}

fn resolve_without_delimiter(output: &RawRunOutput) -> ExecutionResult {
    if output.killed_by_limiter() {
        let mut result = ExecutionResult::runtime_error(
            output.stdout.as_str(),
            "Time Limit Exceeded: the program was stopped before it finished",
        );
        result.verdict = Verdict::TimeLimitExceeded;
        return result;
    }

    if output.exit_code != 0 {
        let stderr = output.stderr.trim();
        let error = if stderr.is_empty() {
            GENERIC_FAILURE
        } else {
            stderr
        };
        return ExecutionResult::runtime_error(output.stdout.as_str(), error);
    }

    ExecutionResult::runtime_error(
        output.stdout.as_str(),
        ProtocolError::MissingPayload.to_string(),
    )
}

fn from_payload(user_output: &str, payload: JudgePayload) -> ExecutionResult {
    let JudgePayload {
        verdict,
        error,
        time,
        memory,
        test_results,
    } = payload;

    let claimed = verdict;
    let verdict = reconcile(claimed, &test_results);
    let error = match verdict {
        Verdict::RuntimeError => error
            .filter(|e| claimed == Verdict::RuntimeError && !e.trim().is_empty())
            .or_else(|| first_test_error(&test_results))
            .or_else(|| Some(GENERIC_FAILURE.to_string())),
        _ => None,
    };

    ExecutionResult {
        verdict,
        user_output: user_output.to_string(),
        error,
        elapsed_summary: time,
        memory_summary: memory,
        test_results,
    }
}

/// The harness's claim is kept unless the per-test results demand something more severe;
/// a time limit verdict is never overridden
fn reconcile(claimed: Verdict, results: &[PerTestResult]) -> Verdict {
    if claimed == Verdict::TimeLimitExceeded {
        return claimed;
    }
    let derived = Verdict::from_test_results(results);
    if severity(derived) > severity(claimed) {
        derived
    } else {
        claimed
    }
}

fn severity(verdict: Verdict) -> u8 {
    match verdict {
        Verdict::Accepted => 0,
        Verdict::WrongAnswer => 1,
        Verdict::RuntimeError => 2,
        Verdict::TimeLimitExceeded => 3,
    }
}

fn first_test_error(results: &[PerTestResult]) -> Option<String> {
    results
        .iter()
        .enumerate()
        .find_map(|(idx, r)| {
            r.error
                .as_ref()
                .map(|e| format!("Runtime Error on Test Case {}: {e}", idx + 1))
        })
}
