use super::{HarnessBackend, apply_template, delimiter_literal, quoted_literal};
use crate::error::GenerateError;
use crate::language::Language;
use crate::problem::{CaseConfig, EntryPoint, ProblemConfig, ResolvedCheck, Value, ValueKind};

const PRELUDE: &str = "import java.io.*;\nimport java.lang.reflect.*;\nimport java.util.*;\n";

const HEADER: &str = r#"
public class Main {
    private static final String JUDGE_DELIMITER = %DELIMITER%;

    static final class JudgeResult {
        final String input;
        final String expected;
        final String actual;
        final boolean passed;
        final String error;
        final Double time;

        JudgeResult(String input, String expected, String actual, boolean passed, String error, Double time) {
            this.input = input;
            this.expected = expected;
            this.actual = actual;
            this.passed = passed;
            this.error = error;
            this.time = time;
        }

        String toJson() {
            return "{\"input\": " + judgeJson(input)
                + ", \"expected\": " + judgeJson(expected)
                + ", \"actual\": " + judgeJson(actual)
                + ", \"passed\": " + passed
                + ", \"error\": " + judgeJson(error)
                + ", \"time\": " + (time == null ? "null" : String.format(Locale.ROOT, "%.4f", time))
                + "}";
        }
    }

    static String judgeJson(String s) {
        if (s == null) {
            return "null";
        }
        StringBuilder sb = new StringBuilder("\"");
        for (int i = 0; i < s.length(); i++) {
            char c = s.charAt(i);
            switch (c) {
                case '"': sb.append("\\\""); break;
                case '\\': sb.append("\\\\"); break;
                case '\n': sb.append("\\n"); break;
                case '\r': sb.append("\\r"); break;
                case '\t': sb.append("\\t"); break;
                default:
                    if (c < 0x20) {
                        sb.append(String.format(Locale.ROOT, "\\u%04x", (int) c));
                    } else {
                        sb.append(c);
                    }
            }
        }
        return sb.append('"').toString();
    }

    static String judgeFormat(Object value) {
        if (value == null) {
            return "null";
        }
        if (value instanceof int[]) {
            return Arrays.toString((int[]) value);
        }
        if (value instanceof String) {
            return judgeJson((String) value);
        }
        return String.valueOf(value);
    }

    static boolean judgeEquals(Object result, Object expected) {
        if (result instanceof int[] && expected instanceof int[]) {
            return Arrays.equals((int[]) result, (int[]) expected);
        }
        return expected.equals(result);
    }

    static boolean judgeIsIndexPair(Object result, int[] values, int target) {
        if (!(result instanceof int[])) {
            return false;
        }
        int[] pair = (int[]) result;
        if (pair.length != 2) {
            return false;
        }
        int i = pair[0];
        int j = pair[1];
        if (i == j || i < 0 || j < 0 || i >= values.length || j >= values.length) {
            return false;
        }
        return (long) values[i] + values[j] == target;
    }

    static String judgeDescribe(Throwable t) {
        if (t instanceof InvocationTargetException && t.getCause() != null) {
            t = t.getCause();
        }
        return t.toString();
    }

    static Object judgeInvoke(Object target, Method method, Object[] args) throws Throwable {
        try {
            return method.invoke(target, args);
        } catch (InvocationTargetException e) {
            throw e.getCause() != null ? e.getCause() : e;
        }
    }

    static void judgeRunCases(Object solution, Method method, List<JudgeResult> results) {
"#;

const CASE: &str = r#"
        // Test case %NUMBER%
        {
            String judgeInput = %INPUT%;
            String judgeExpected = %EXPECTED%;
            try {
%ARGS%
                long judgeStart = System.nanoTime();
                Object judgeResult = judgeInvoke(solution, method, new Object[] {%CALL_ARGS%});
                double judgeElapsed = (System.nanoTime() - judgeStart) / 1_000_000.0;
                boolean judgePassed = %CHECK%;
                results.add(new JudgeResult(judgeInput, judgeExpected, judgeFormat(judgeResult), judgePassed, null, judgeElapsed));
            } catch (Throwable e) {
                results.add(new JudgeResult(judgeInput, judgeExpected, "Error", false, judgeDescribe(e), null));
            }
        }
"#;

const FOOTER: &str = r#"    }

    static String judgePeakMemory() {
        try (BufferedReader reader = new BufferedReader(new FileReader("/proc/self/status"))) {
            String line;
            while ((line = reader.readLine()) != null) {
                if (line.startsWith("VmHWM:")) {
                    String[] parts = line.substring(6).trim().split("\\s+");
                    double kb = Double.parseDouble(parts[0]);
                    return String.format(Locale.ROOT, "%.2fMB", kb / 1024.0);
                }
            }
        } catch (Exception e) {
            return null;
        }
        return null;
    }

    static void judgeFinish(List<JudgeResult> results, String fatal) {
        double totalTime = 0.0;
        String runtimeError = null;
        String wrongAnswer = null;
        StringBuilder tests = new StringBuilder("[");
        for (int i = 0; i < results.size(); i++) {
            JudgeResult r = results.get(i);
            if (i > 0) {
                tests.append(", ");
            }
            tests.append(r.toJson());
            if (r.time != null) {
                totalTime += r.time;
            }
            if (r.error != null) {
                if (runtimeError == null) {
                    runtimeError = "Runtime Error on Test Case " + (i + 1) + ": " + r.error;
                }
            } else if (!r.passed && wrongAnswer == null) {
                wrongAnswer = "Wrong Answer on Test Case " + (i + 1);
            }
        }
        tests.append("]");

        String verdict = "AC";
        String error = null;
        if (fatal != null) {
            verdict = "RE";
            error = fatal;
        } else if (runtimeError != null) {
            verdict = "RE";
            error = runtimeError;
        } else if (wrongAnswer != null) {
            verdict = "WA";
            error = wrongAnswer;
        }

        String payload = "{\"verdict\": " + judgeJson(verdict)
            + ", \"error\": " + judgeJson(error)
            + ", \"time\": " + judgeJson(String.format(Locale.ROOT, "%.2fms", totalTime))
            + ", \"memory\": " + judgeJson(judgePeakMemory())
            + ", \"testResults\": " + tests
            + "}";

        System.out.flush();
        System.out.println();
        System.out.println(JUDGE_DELIMITER);
        System.out.println(payload);
        System.out.flush();
    }

    public static void main(String[] args) {
        List<JudgeResult> results = new ArrayList<>();
        String fatal = null;
        Object solution = null;
        Method method = null;

        Class<?> cls = null;
        try {
            cls = Class.forName("Solution");
        } catch (Throwable e) {
            fatal = "Class 'Solution' not found.";
        }
        if (cls != null) {
            try {
                method = cls.getDeclaredMethod("%FUNCTION%"%PARAM_CLASSES%);
                method.setAccessible(true);
            } catch (NoSuchMethodException e) {
                fatal = "Method '%FUNCTION%(%PARAM_TYPES%)' not found on class 'Solution'.";
            } catch (Throwable e) {
                fatal = judgeDescribe(e);
            }
        }
        if (fatal == null) {
            try {
                Constructor<?> ctor = cls.getDeclaredConstructor();
                ctor.setAccessible(true);
                solution = ctor.newInstance();
            } catch (Throwable e) {
                fatal = judgeDescribe(e);
            }
        }

        if (fatal == null) {
            judgeRunCases(solution, method, results);
        }
        judgeFinish(results, fatal);
    }
}
"#;

pub struct JavaBackend;

impl HarnessBackend for JavaBackend {
    fn language(&self) -> Language {
        Language::Java
    }

    fn prelude(&self, _problem: &ProblemConfig) -> String {
        PRELUDE.to_string()
    }

    /// `import` lines are illegal after a type declaration, and a `public` top-level class
    /// would have to live in its own file
    fn split_user_source(&self, user_source: &str) -> (String, String) {
        let mut imports = String::new();
        let mut rest = String::with_capacity(user_source.len());
        for line in user_source.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("import ") && trimmed.ends_with(';') {
                imports.push_str(trimmed);
                imports.push('\n');
                continue;
            }
            let line = match line.strip_prefix("public ") {
                Some(stripped) if is_type_declaration(stripped) => stripped,
                _ => line,
            };
            rest.push_str(line);
            rest.push('\n');
        }
        (imports, rest)
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
                format!("judgeEquals(judgeResult, {})", boxed_literal(value))
            }
            ResolvedCheck::IndexPairSum { values, target } => format!(
                "judgeIsIndexPair(judgeResult, {}, {target})",
                int_array_literal(values)
            ),
        };

        let args: Vec<String> = case
            .args
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                format!(
                    "                {} judgeArg{idx} = {};",
                    type_name(value.kind()),
                    literal(value)
                )
            })
            .collect();
        let call_args: Vec<String> = (0..case.args.len())
            .map(|idx| format!("judgeArg{idx}"))
            .collect();

        let number = (index + 1).to_string();
        let input = string_literal(&case.input_label(&problem.entry));
        let expected = string_literal(&case.expected_label());
        let args = args.join("\n");
        let call_args = call_args.join(", ");

        Ok(apply_template(
            CASE,
            &[
                ("%NUMBER%", &number),
                ("%INPUT%", &input),
                ("%EXPECTED%", &expected),
                ("%ARGS%", &args),
                ("%CALL_ARGS%", &call_args),
                ("%CHECK%", &check),
            ],
        ))
    }

    fn footer(&self, problem: &ProblemConfig) -> String {
        let param_classes: String = problem
            .entry
            .params
            .iter()
            .map(|p| format!(", {}.class", type_name(p.kind)))
            .collect();
        let param_types = problem
            .entry
            .params
            .iter()
            .map(|p| type_name(p.kind))
            .collect::<Vec<_>>()
            .join(", ");
        apply_template(
            FOOTER,
            &[
                ("%FUNCTION%", &problem.entry.function),
                ("%PARAM_CLASSES%", &param_classes),
                ("%PARAM_TYPES%", &param_types),
            ],
        )
    }

    fn starter(&self, entry: &EntryPoint) -> String {
        let params: Vec<String> = entry
            .params
            .iter()
            .map(|p| format!("{} {}", type_name(p.kind), p.name))
            .collect();
        format!(
            "class Solution {{\n    public {} {}({}) {{\n        // Write your code here\n        return {};\n    }}\n}}\n",
            type_name(entry.returns),
            entry.function,
            params.join(", "),
            default_return(entry.returns)
        )
    }
}

/// Whether `line` (already without `public`) opens a top-level class, interface, enum or record
fn is_type_declaration(line: &str) -> bool {
    const MODIFIERS: [&str; 5] = ["final ", "abstract ", "sealed ", "non-sealed ", "strictfp "];
    const KINDS: [&str; 5] = ["class ", "interface ", "enum ", "record ", "@interface "];

    let mut rest = line;
    while let Some(stripped) = MODIFIERS.iter().find_map(|m| rest.strip_prefix(m)) {
        rest = stripped.trim_start();
    }
    KINDS.iter().any(|kind| rest.starts_with(kind))
}

fn type_name(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Int => "int",
        ValueKind::Bool => "boolean",
        ValueKind::Str => "String",
        ValueKind::IntArray => "int[]",
    }
}

fn default_return(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Int => "0",
        ValueKind::Bool => "false",
        ValueKind::Str => "\"\"",
        ValueKind::IntArray => "new int[]{}",
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Str(s) => string_literal(s),
        Value::IntArray(items) => int_array_literal(items),
    }
}

/// Reflection hands results back boxed, so expected scalars are boxed too
fn boxed_literal(value: &Value) -> String {
    match value {
        Value::Bool(b) => format!("Boolean.valueOf({b})"),
        Value::Int(n) => format!("Integer.valueOf({n})"),
        other => literal(other),
    }
}

fn int_array_literal(items: &[i32]) -> String {
    let inner: Vec<String> = items.iter().map(|n| n.to_string()).collect();
    format!("new int[] {{{}}}", inner.join(", "))
}

fn string_literal(s: &str) -> String {
    quoted_literal(s, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::generate;
    use crate::harness::tests::{two_sum, valid_parentheses};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_case_block_two_sum() {
        let problem = two_sum();
        let block = JavaBackend
            .case_block(&problem, &problem.cases[1], 1)
            .unwrap();
        assert!(block.contains("// Test case 2\n"));
        assert!(block.contains("int[] judgeArg0 = new int[] {3, 2, 4};"));
        assert!(block.contains("int judgeArg1 = 6;"));
        assert!(block.contains("new Object[] {judgeArg0, judgeArg1}"));
        assert!(block.contains("judgeIsIndexPair(judgeResult, new int[] {3, 2, 4}, 6)"));
        assert!(block.contains("catch (Throwable e)"));
    }

    #[test]
    fn test_case_block_string_argument() {
        let problem = valid_parentheses();
        let block = JavaBackend
            .case_block(&problem, &problem.cases[1], 1)
            .unwrap();
        assert!(block.contains(r#"String judgeArg0 = "()[]{}";"#));
        assert!(block.contains("judgeEquals(judgeResult, Boolean.valueOf(true))"));
    }

    #[test]
    fn test_reflection_lookup_uses_parameter_classes() {
        let footer = JavaBackend.footer(&two_sum());
        assert!(footer.contains(r#"cls.getDeclaredMethod("twoSum", int[].class, int.class)"#));
        assert!(footer.contains("Method 'twoSum(int[], int)' not found"));
        assert_eq!(footer.matches("System.out.println(JUDGE_DELIMITER);").count(), 1);
    }

    #[test]
    fn test_split_user_source() {
        let user = "import java.util.HashMap;\n\npublic class Solution {\n    public int[] twoSum(int[] nums, int target) {\n        return new int[]{};\n    }\n}";
        let (imports, rest) = JavaBackend.split_user_source(user);
        assert_eq!(imports, "import java.util.HashMap;\n");
        assert!(rest.starts_with("\nclass Solution {"));
        assert!(rest.contains("    public int[] twoSum"));
    }

    #[test]
    fn test_public_helper_types_are_demoted() {
        let user = "public enum Dir { UP }\npublic interface Shape {}\npublic record Point(int x, int y) {}\npublic final class Solution {\n    public int maxProfit(int[] prices) { return 0; }\n}\npublic static int notAType;\n";
        let (_, rest) = JavaBackend.split_user_source(user);
        assert_eq!(
            rest,
            "enum Dir { UP }\ninterface Shape {}\nrecord Point(int x, int y) {}\nfinal class Solution {\n    public int maxProfit(int[] prices) { return 0; }\n}\npublic static int notAType;\n"
        );
    }

    #[test]
    fn test_generated_layout() {
        let generated = generate(&two_sum(), Language::Java, "class Solution {}").unwrap();
        assert!(generated.content.starts_with(PRELUDE));
        assert!(generated.content.trim_end().ends_with("class Solution {}"));
        assert_eq!(
            generated
                .content
                .matches("System.out.println(JUDGE_DELIMITER);")
                .count(),
            1
        );
    }

    #[test]
    fn test_starter() {
        let starter = JavaBackend.starter(&valid_parentheses().entry);
        assert_eq!(
            starter,
            "class Solution {\n    public boolean isValid(String s) {\n        // Write your code here\n        return false;\n    }\n}\n"
        );
    }
}
