use super::{HarnessBackend, apply_template, delimiter_literal, quoted_literal};
use crate::error::GenerateError;
use crate::language::Language;
use crate::problem::{CaseConfig, EntryPoint, ProblemConfig, ResolvedCheck, Value, ValueKind};

const PRELUDE: &str = r#"#define _GNU_SOURCE
#include <setjmp.h>
#include <signal.h>
#include <stdbool.h>
#include <stdio.h>
#include <stdlib.h>
#include <string.h>
#include <time.h>
#include <sys/resource.h>

extern %PROTOTYPE% __attribute__((weak));

"#;

const HEADER: &str = r#"#define JUDGE_TEXT_MAX 4096

static const char* JUDGE_DELIMITER = %DELIMITER%;

typedef struct {
    const char* input;
    const char* expected;
    char actual[JUDGE_TEXT_MAX];
    bool passed;
    const char* error;
    double time;
} JudgeResult;

static JudgeResult judge_results[%CASE_CAPACITY%];
static int judge_result_count = 0;
static sigjmp_buf judge_jump;
static volatile sig_atomic_t judge_signal = 0;
static char judge_alt_stack[1 << 16];

static void judge_on_signal(int sig) {
    judge_signal = sig;
    siglongjmp(judge_jump, 1);
}

static void judge_install_handlers(void) {
    stack_t ss;
    ss.ss_sp = judge_alt_stack;
    ss.ss_size = sizeof(judge_alt_stack);
    ss.ss_flags = 0;
    sigaltstack(&ss, NULL);

    struct sigaction sa;
    memset(&sa, 0, sizeof(sa));
    sa.sa_handler = judge_on_signal;
    sigemptyset(&sa.sa_mask);
    sa.sa_flags = SA_ONSTACK | SA_NODEFER;
    int signals[] = {SIGSEGV, SIGFPE, SIGBUS, SIGILL, SIGABRT};
    for (size_t i = 0; i < sizeof(signals) / sizeof(signals[0]); i++) {
        sigaction(signals[i], &sa, NULL);
    }
}

static const char* judge_signal_name(int sig) {
    switch (sig) {
        case SIGSEGV: return "Segmentation fault (SIGSEGV)";
        case SIGFPE: return "Floating point exception (SIGFPE)";
        case SIGBUS: return "Bus error (SIGBUS)";
        case SIGILL: return "Illegal instruction (SIGILL)";
        case SIGABRT: return "Aborted (SIGABRT)";
        default: return "Fatal signal";
    }
}

static double judge_elapsed_ms(const struct timespec* start) {
    struct timespec now;
    clock_gettime(CLOCK_MONOTONIC, &now);
    return (double)(now.tv_sec - start->tv_sec) * 1000.0
        + (double)(now.tv_nsec - start->tv_nsec) / 1000000.0;
}

static void judge_format_ints(char* buf, size_t cap, const int* items, int size) {
    if (items == NULL && size > 0) {
        snprintf(buf, cap, "null");
        return;
    }
    size_t len = (size_t)snprintf(buf, cap, "[");
    for (int i = 0; i < size && len < cap; i++) {
        len += (size_t)snprintf(buf + len, cap - len, i ? ", %d" : "%d", items[i]);
    }
    if (len < cap) {
        snprintf(buf + len, cap - len, "]");
    }
}

static void judge_format_string(char* buf, size_t cap, const char* s) {
    if (s == NULL) {
        snprintf(buf, cap, "null");
        return;
    }
    size_t len = 0;
    buf[len++] = '"';
    for (; *s && len + 3 < cap; s++) {
        if (*s == '"' || *s == '\\') {
            buf[len++] = '\\';
        }
        buf[len++] = *s;
    }
    buf[len++] = '"';
    buf[len] = '\0';
}

static bool judge_ints_equal(const int* actual, int actual_size, const int* expected, int expected_size) {
    if (actual_size != expected_size) {
        return false;
    }
    if (expected_size == 0) {
        return true;
    }
    if (actual == NULL) {
        return false;
    }
    return memcmp(actual, expected, sizeof(int) * (size_t)expected_size) == 0;
}

static bool judge_is_index_pair(const int* result, int size, const int* values, int values_size, int target) {
    if (result == NULL || size != 2) {
        return false;
    }
    int i = result[0];
    int j = result[1];
    if (i == j || i < 0 || j < 0 || i >= values_size || j >= values_size) {
        return false;
    }
    return (long long)values[i] + (long long)values[j] == (long long)target;
}

static void judge_record(const char* input, const char* expected, const char* actual, bool passed, const char* error, double time) {
    JudgeResult* r = &judge_results[judge_result_count++];
    r->input = input;
    r->expected = expected;
    snprintf(r->actual, sizeof(r->actual), "%s", actual);
    r->passed = passed;
    r->error = error;
    r->time = time;
}

static void judge_json_print(const char* s) {
    if (s == NULL) {
        fputs("null", stdout);
        return;
    }
    putchar('"');
    for (const unsigned char* p = (const unsigned char*)s; *p; p++) {
        switch (*p) {
            case '"': fputs("\\\"", stdout); break;
            case '\\': fputs("\\\\", stdout); break;
            case '\n': fputs("\\n", stdout); break;
            case '\r': fputs("\\r", stdout); break;
            case '\t': fputs("\\t", stdout); break;
            default:
                if (*p < 0x20) {
                    printf("\\u%04x", *p);
                } else {
                    putchar(*p);
                }
        }
    }
    putchar('"');
}

static void judge_finish(const char* fatal);

int main(void) {
    judge_install_handlers();
    if (!%FUNCTION%) {
        judge_finish("Function '%FUNCTION%' not found.");
        return 0;
    }
"#;

const CASE: &str = r#"
    // Test case %NUMBER%
    {
        const char* judge_input = %INPUT%;
        const char* judge_expected = %EXPECTED%;
        if (sigsetjmp(judge_jump, 1) == 0) {
%ARGS%
            struct timespec judge_start;
            clock_gettime(CLOCK_MONOTONIC, &judge_start);
%CALL%
            double judge_elapsed = judge_elapsed_ms(&judge_start);
            char judge_actual[JUDGE_TEXT_MAX];
            %FORMAT%
            bool judge_passed = %CHECK%;
            judge_record(judge_input, judge_expected, judge_actual, judge_passed, NULL, judge_elapsed);
        } else {
            judge_record(judge_input, judge_expected, "Error", false, judge_signal_name(judge_signal), -1.0);
        }
    }
"#;

const FOOTER: &str = r#"
    judge_finish(NULL);
    return 0;
}

static void judge_finish(const char* fatal) {
    double total_time = 0.0;
    int runtime_error_at = 0;
    int wrong_answer_at = 0;
    for (int i = 0; i < judge_result_count; i++) {
        const JudgeResult* r = &judge_results[i];
        if (r->time >= 0.0) {
            total_time += r->time;
        }
        if (r->error != NULL) {
            if (runtime_error_at == 0) {
                runtime_error_at = i + 1;
            }
        } else if (!r->passed && wrong_answer_at == 0) {
            wrong_answer_at = i + 1;
        }
    }

    const char* verdict = "AC";
    char error[JUDGE_TEXT_MAX];
    const char* error_text = NULL;
    if (fatal != NULL) {
        verdict = "RE";
        error_text = fatal;
    } else if (runtime_error_at > 0) {
        verdict = "RE";
        snprintf(error, sizeof(error), "Runtime Error on Test Case %d: %s",
            runtime_error_at, judge_results[runtime_error_at - 1].error);
        error_text = error;
    } else if (wrong_answer_at > 0) {
        verdict = "WA";
        snprintf(error, sizeof(error), "Wrong Answer on Test Case %d", wrong_answer_at);
        error_text = error;
    }

    char time_text[64];
    snprintf(time_text, sizeof(time_text), "%.2fms", total_time);

    char memory_text[64];
    const char* memory = NULL;
    struct rusage usage;
    if (getrusage(RUSAGE_SELF, &usage) == 0) {
        snprintf(memory_text, sizeof(memory_text), "%.2fMB", (double)usage.ru_maxrss / 1024.0);
        memory = memory_text;
    }

    fflush(stdout);
    printf("\n%s\n", JUDGE_DELIMITER);
    fputs("{\"verdict\": ", stdout);
    judge_json_print(verdict);
    fputs(", \"error\": ", stdout);
    judge_json_print(error_text);
    fputs(", \"time\": ", stdout);
    judge_json_print(time_text);
    fputs(", \"memory\": ", stdout);
    judge_json_print(memory);
    fputs(", \"testResults\": [", stdout);
    for (int i = 0; i < judge_result_count; i++) {
        const JudgeResult* r = &judge_results[i];
        if (i > 0) {
            fputs(", ", stdout);
        }
        fputs("{\"input\": ", stdout);
        judge_json_print(r->input);
        fputs(", \"expected\": ", stdout);
        judge_json_print(r->expected);
        fputs(", \"actual\": ", stdout);
        judge_json_print(r->actual);
        printf(", \"passed\": %s, \"error\": ", r->passed ? "true" : "false");
        judge_json_print(r->error);
        if (r->time >= 0.0) {
            printf(", \"time\": %.4f}", r->time);
        } else {
            fputs(", \"time\": null}", stdout);
        }
    }
    fputs("]}\n", stdout);
    fflush(stdout);
}
"#;

pub struct CBackend;

impl HarnessBackend for CBackend {
    fn language(&self) -> Language {
        Language::C
    }

    /// A weak prototype lets `main` detect a missing entry point instead of failing to link
    fn prelude(&self, problem: &ProblemConfig) -> String {
        apply_template(PRELUDE, &[("%PROTOTYPE%", &prototype(&problem.entry))])
    }

    fn header(&self, problem: &ProblemConfig) -> String {
        let capacity = problem.cases.len().max(1).to_string();
        apply_template(
            HEADER,
            &[
                ("%DELIMITER%", &delimiter_literal()),
                ("%CASE_CAPACITY%", &capacity),
                ("%FUNCTION%", &problem.entry.function),
            ],
        )
    }

    fn case_block(
        &self,
        problem: &ProblemConfig,
        case: &CaseConfig,
        index: usize,
    ) -> Result<String, GenerateError> {
        let entry = &problem.entry;
        let check = match case.resolve_check(entry)? {
            ResolvedCheck::Equals(value) => equals_check(value),
            ResolvedCheck::IndexPairSum { values, target } => format!(
                "judge_is_index_pair(judge_result, judge_size, {}, {target})",
                array_with_size(values)
            ),
        };

        let mut args = Vec::new();
        let mut call_args = Vec::new();
        for (idx, value) in case.args.iter().enumerate() {
            let name = format!("judge_arg{idx}");
            match value {
                Value::Int(n) => args.push(format!("            int {name} = {n};")),
                Value::Bool(b) => args.push(format!("            bool {name} = {b};")),
                Value::Str(s) => {
                    args.push(format!("            char {name}[] = {};", string_literal(s)))
                }
                Value::IntArray(items) if items.is_empty() => {
                    args.push(format!("            int {name}[1] = {{0}};"));
                    args.push(format!("            int {name}_size = 0;"));
                }
                Value::IntArray(items) => {
                    args.push(format!("            int {name}[] = {};", brace_list(items)));
                    args.push(format!("            int {name}_size = {};", items.len()));
                }
            }
            call_args.push(name.clone());
            if value.kind() == ValueKind::IntArray {
                call_args.push(format!("{name}_size"));
            }
        }

        let call = if entry.returns == ValueKind::IntArray {
            call_args.push("&judge_size".to_string());
            format!(
                "            int judge_size = 0;\n            int* judge_result = {}({});",
                entry.function,
                call_args.join(", ")
            )
        } else {
            format!(
                "            {} judge_result = {}({});",
                type_name(entry.returns),
                entry.function,
                call_args.join(", ")
            )
        };

        let format_actual = match entry.returns {
            ValueKind::Int => {
                r#"snprintf(judge_actual, sizeof(judge_actual), "%d", judge_result);"#
            }
            ValueKind::Bool => {
                r#"snprintf(judge_actual, sizeof(judge_actual), "%s", judge_result ? "true" : "false");"#
            }
            ValueKind::Str => "judge_format_string(judge_actual, sizeof(judge_actual), judge_result);",
            ValueKind::IntArray => {
                "judge_format_ints(judge_actual, sizeof(judge_actual), judge_result, judge_size);"
            }
        };

        let number = (index + 1).to_string();
        let input = string_literal(&case.input_label(entry));
        let expected = string_literal(&case.expected_label());
        let args = args.join("\n");

        Ok(apply_template(
            CASE,
            &[
                ("%NUMBER%", &number),
                ("%INPUT%", &input),
                ("%EXPECTED%", &expected),
                ("%ARGS%", &args),
                ("%CALL%", &call),
                ("%FORMAT%", format_actual),
                ("%CHECK%", &check),
            ],
        ))
    }

    fn footer(&self, _problem: &ProblemConfig) -> String {
        FOOTER.to_string()
    }

    fn starter(&self, entry: &EntryPoint) -> String {
        let body = match entry.returns {
            ValueKind::Int => "return 0;",
            ValueKind::Bool => "return false;",
            ValueKind::Str => "return \"\";",
            ValueKind::IntArray => "*returnSize = 0;\n    return NULL;",
        };
        format!(
            "{} {{\n    // Write your code here\n    {body}\n}}\n",
            prototype(entry)
        )
    }
}

fn type_name(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Int => "int",
        ValueKind::Bool => "bool",
        ValueKind::Str => "char*",
        ValueKind::IntArray => "int*",
    }
}

/// Signature in the usual pointer-and-length convention: arrays pass `nameSize` after the
/// pointer, array returns report their length through `returnSize`
fn prototype(entry: &EntryPoint) -> String {
    let mut params = Vec::new();
    for param in &entry.params {
        params.push(format!("{} {}", type_name(param.kind), param.name));
        if param.kind == ValueKind::IntArray {
            params.push(format!("int {}Size", param.name));
        }
    }
    if entry.returns == ValueKind::IntArray {
        params.push("int* returnSize".to_string());
    }
    let params = if params.is_empty() {
        "void".to_string()
    } else {
        params.join(", ")
    };
    format!("{} {}({})", type_name(entry.returns), entry.function, params)
}

fn equals_check(value: &Value) -> String {
    match value {
        Value::Int(n) => format!("judge_result == {n}"),
        Value::Bool(b) => format!("judge_result == {b}"),
        Value::Str(s) => format!(
            "judge_result != NULL && strcmp(judge_result, {}) == 0",
            string_literal(s)
        ),
        Value::IntArray(items) => format!(
            "judge_ints_equal(judge_result, judge_size, {})",
            array_with_size(items)
        ),
    }
}

fn brace_list(items: &[i32]) -> String {
    let inner: Vec<String> = items.iter().map(|n| n.to_string()).collect();
    format!("{{{}}}", inner.join(", "))
}

/// A fresh compound literal and its length, so predicates never see arrays the user mutated
fn array_with_size(items: &[i32]) -> String {
    if items.is_empty() {
        "NULL, 0".to_string()
    } else {
        format!("(const int[]){}, {}", brace_list(items), items.len())
    }
}

/// C string literal; `??` is broken up so no trigraph can form
fn string_literal(s: &str) -> String {
    let quoted = quoted_literal(s, false);
    let mut out = String::with_capacity(quoted.len());
    let mut prev_question = false;
    for ch in quoted.chars() {
        if ch == '?' && prev_question {
            out.push_str("\\?");
        } else {
            out.push(ch);
        }
        prev_question = ch == '?';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::generate;
    use crate::harness::tests::{two_sum, valid_parentheses};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prototype() {
        assert_eq!(
            prototype(&two_sum().entry),
            "int* twoSum(int* nums, int numsSize, int target, int* returnSize)"
        );
        assert_eq!(prototype(&valid_parentheses().entry), "bool isValid(char* s)");
    }

    #[test]
    fn test_case_block_two_sum() {
        let problem = two_sum();
        let block = CBackend.case_block(&problem, &problem.cases[0], 0).unwrap();
        assert!(block.contains("// Test case 1\n"));
        assert!(block.contains("int judge_arg0[] = {2, 7, 11, 15};"));
        assert!(block.contains("int judge_arg0_size = 4;"));
        assert!(block.contains("int judge_arg1 = 9;"));
        assert!(block.contains(
            "int* judge_result = twoSum(judge_arg0, judge_arg0_size, judge_arg1, &judge_size);"
        ));
        assert!(block.contains(
            "judge_is_index_pair(judge_result, judge_size, (const int[]){2, 7, 11, 15}, 4, 9)"
        ));
        assert!(!block.contains("free("));
    }

    #[test]
    fn test_case_block_string_equality() {
        let problem = valid_parentheses();
        let block = CBackend.case_block(&problem, &problem.cases[2], 2).unwrap();
        assert!(block.contains(r#"char judge_arg0[] = "(]";"#));
        assert!(block.contains("bool judge_result = isValid(judge_arg0);"));
        assert!(block.contains("bool judge_passed = judge_result == false;"));
        assert!(block.contains(r#"const char* judge_input = "s=\"(]\"";"#));
    }

    #[test]
    fn test_empty_array_argument() {
        let mut problem = two_sum();
        problem.cases[0].args[0] = Value::IntArray(Vec::new());
        let block = CBackend.case_block(&problem, &problem.cases[0], 0).unwrap();
        assert!(block.contains("int judge_arg0[1] = {0};"));
        assert!(block.contains("int judge_arg0_size = 0;"));
        assert!(block.contains("judge_is_index_pair(judge_result, judge_size, NULL, 0, 9)"));
    }

    #[test]
    fn test_missing_entry_check_and_single_emission() {
        let generated = generate(&two_sum(), Language::C, "").unwrap();
        assert!(generated.content.starts_with("#define _GNU_SOURCE\n"));
        assert!(generated.content.contains("if (!twoSum) {"));
        assert!(generated.content.contains("static JudgeResult judge_results[2];"));
        assert_eq!(
            generated
                .content
                .matches(r#"printf("\n%s\n", JUDGE_DELIMITER);"#)
                .count(),
            1
        );
    }

    #[test]
    fn test_trigraphs_broken_up() {
        assert_eq!(string_literal("a??=b"), r#""a?\?=b""#);
        assert_eq!(string_literal("???"), r#""?\?\?""#);
    }

    #[test]
    fn test_starter() {
        assert_eq!(
            CBackend.starter(&two_sum().entry),
            "int* twoSum(int* nums, int numsSize, int target, int* returnSize) {\n    // Write your code here\n    *returnSize = 0;\n    return NULL;\n}\n"
        );
    }
}
