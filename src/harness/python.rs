use super::{HarnessBackend, apply_template, delimiter_literal};
use crate::error::GenerateError;
use crate::language::Language;
use crate::problem::{CaseConfig, EntryPoint, ProblemConfig, ResolvedCheck, Value, ValueKind};

const PRELUDE: &str = "from typing import *\n\n";

const HEADER: &str = r#"import json as _judge_json
import sys as _judge_sys
import time as _judge_time

try:
    import resource as _judge_resource
except ImportError:
    _judge_resource = None

JUDGE_DELIMITER = %DELIMITER%


def _judge_format(value):
    if value is None:
        return "null"
    if isinstance(value, bool):
        return "true" if value else "false"
    if isinstance(value, (list, tuple)):
        return "[" + ", ".join(_judge_format(v) for v in value) + "]"
    if isinstance(value, str):
        return _judge_json.dumps(value)
    return str(value)


def _judge_equals(result, expected):
    if isinstance(expected, bool):
        return result is expected
    if isinstance(result, bool):
        return False
    if isinstance(expected, list):
        return isinstance(result, (list, tuple)) and list(result) == expected
    return result == expected


def _judge_is_index_pair(result, values, target):
    if not isinstance(result, (list, tuple)) or len(result) != 2:
        return False
    i, j = result[0], result[1]
    for index in (i, j):
        if isinstance(index, bool) or not isinstance(index, int):
            return False
        if index < 0 or index >= len(values):
            return False
    return i != j and values[i] + values[j] == target


def _judge_describe(exc):
    return "%s: %s" % (type(exc).__name__, exc)


def _judge_record(results, input_label, expected_label, actual, passed, elapsed_ms, error=None):
    results.append({
        "input": input_label,
        "expected": expected_label,
        "actual": actual,
        "passed": passed,
        "error": error,
        "time": elapsed_ms,
    })


def _judge_run_cases(results):
    solution = Solution()
"#;

const CASE: &str = r#"
    # Test case %NUMBER%
    judge_input = %INPUT%
    judge_expected = %EXPECTED%
    try:
%ARGS%
        judge_start = _judge_time.perf_counter()
        judge_result = solution.%FUNCTION%(%CALL_ARGS%)
        judge_elapsed = (_judge_time.perf_counter() - judge_start) * 1000.0
        judge_passed = %CHECK%
        _judge_record(results, judge_input, judge_expected, _judge_format(judge_result), bool(judge_passed), judge_elapsed)
    except BaseException as exc:
        _judge_record(results, judge_input, judge_expected, "Error", False, None, _judge_describe(exc))
"#;

const FOOTER: &str = r#"

def _judge_peak_memory():
    if _judge_resource is None:
        return None
    try:
        peak = _judge_resource.getrusage(_judge_resource.RUSAGE_SELF).ru_maxrss
    except Exception:
        return None
    if _judge_sys.platform == "darwin":
        peak = peak / 1024.0
    return "%.2fMB" % (peak / 1024.0)


def _judge_summarize(results, fatal):
    total_ms = 0.0
    runtime_error = None
    wrong_answer = None
    for index, entry in enumerate(results):
        if entry["time"] is not None:
            total_ms += entry["time"]
        if entry["error"] is not None:
            if runtime_error is None:
                runtime_error = "Runtime Error on Test Case %d: %s" % (index + 1, entry["error"])
        elif not entry["passed"] and wrong_answer is None:
            wrong_answer = "Wrong Answer on Test Case %d" % (index + 1)

    if fatal is not None:
        verdict, error = "RE", fatal
    elif runtime_error is not None:
        verdict, error = "RE", runtime_error
    elif wrong_answer is not None:
        verdict, error = "WA", wrong_answer
    else:
        verdict, error = "AC", None

    return {
        "verdict": verdict,
        "error": error,
        "time": "%.2fms" % total_ms,
        "memory": _judge_peak_memory(),
        "testResults": results,
    }


def _judge_main():
    results = []
    fatal = None
    if "Solution" not in globals():
        fatal = "Class 'Solution' not found."
    elif not callable(getattr(globals()["Solution"], "%FUNCTION%", None)):
        fatal = "Method '%FUNCTION%' not found on class 'Solution'."
    else:
        try:
            _judge_run_cases(results)
        except Exception as exc:
            fatal = _judge_describe(exc)

    payload = _judge_summarize(results, fatal)
    _judge_sys.stdout.flush()
    _judge_sys.stdout.write("\n" + JUDGE_DELIMITER + "\n")
    _judge_sys.stdout.write(_judge_json.dumps(payload) + "\n")
    _judge_sys.stdout.flush()


if __name__ == "__main__":
    _judge_main()
"#;

pub struct PythonBackend;

impl HarnessBackend for PythonBackend {
    fn language(&self) -> Language {
        Language::Python
    }

    fn prelude(&self, _problem: &ProblemConfig) -> String {
        PRELUDE.to_string()
    }

    fn header(&self, _problem: &ProblemConfig) -> String {
        apply_template(HEADER, &[("%DELIMITER%", &delimiter_literal())])
    }

    fn case_block(
        &self,
        problem: &ProblemConfig,
        case: &CaseConfig,
        index: usize,
    ) -> Result<String, GenerateError> {
        let check = match case.resolve_check(&problem.entry)? {
            ResolvedCheck::Equals(value) => {
                format!("_judge_equals(judge_result, {})", literal(value))
            }
            ResolvedCheck::IndexPairSum { values, target } => format!(
                "_judge_is_index_pair(judge_result, {}, {target})",
                list_literal(values)
            ),
        };

        let args: Vec<String> = case
            .args
            .iter()
            .enumerate()
            .map(|(idx, value)| format!("        judge_arg{idx} = {}", literal(value)))
            .collect();
        let call_args: Vec<String> = (0..case.args.len())
            .map(|idx| format!("judge_arg{idx}"))
            .collect();

        let number = (index + 1).to_string();
        let input = string_literal(&case.input_label(&problem.entry));
        let expected = string_literal(&case.expected_label());
        let args = if args.is_empty() {
            "        pass".to_string()
        } else {
            args.join("\n")
        };
        let call_args = call_args.join(", ");

        Ok(apply_template(
            CASE,
            &[
                ("%NUMBER%", &number),
                ("%INPUT%", &input),
                ("%EXPECTED%", &expected),
                ("%ARGS%", &args),
                ("%FUNCTION%", &problem.entry.function),
                ("%CALL_ARGS%", &call_args),
                ("%CHECK%", &check),
            ],
        ))
    }

    fn footer(&self, problem: &ProblemConfig) -> String {
        apply_template(FOOTER, &[("%FUNCTION%", &problem.entry.function)])
    }

    fn starter(&self, entry: &EntryPoint) -> String {
        let params: Vec<String> = entry
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, type_name(p.kind)))
            .collect();
        let mut signature = vec!["self".to_string()];
        signature.extend(params);
        format!(
            "class Solution:\n    def {}({}) -> {}:\n        # Write your code here\n        pass\n",
            entry.function,
            signature.join(", "),
            type_name(entry.returns)
        )
    }
}

fn type_name(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Int => "int",
        ValueKind::Bool => "bool",
        ValueKind::Str => "str",
        ValueKind::IntArray => "List[int]",
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Int(n) => n.to_string(),
        Value::Str(s) => string_literal(s),
        Value::IntArray(items) => list_literal(items),
    }
}

fn list_literal(items: &[i32]) -> String {
    let inner: Vec<String> = items.iter().map(|n| n.to_string()).collect();
    format!("[{}]", inner.join(", "))
}

/// JSON string syntax is a subset of Python's
fn string_literal(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
