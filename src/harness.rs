//! Harness synthesis: wraps a submission in a driver program that runs every test case of a
//! problem in isolation and prints the judge payload after [`JUDGE_DELIMITER`].
//!
//! Each language implements [`HarnessBackend`]; [`generate`] owns the assembly order.

mod c;
mod java;
mod python;

use c::CBackend;
use java::JavaBackend;
use python::PythonBackend;

use crate::error::GenerateError;
use crate::language::{Language, Placement};
use crate::problem::{CaseConfig, EntryPoint, ProblemConfig};
use crate::protocol::JUDGE_DELIMITER;

/// Complete program handed to the sandbox
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedSource {
    pub language: Language,
    pub file_name: &'static str,
    pub content: String,
}

/// Per-language source templating
///
/// Implementations only know their own syntax; the order in which prelude, user code,
/// header, test case blocks and footer are concatenated is decided by [`generate`].
pub trait HarnessBackend: Send + Sync {
    fn language(&self) -> Language;

    /// Text that must precede the user's code (imports, prototypes)
    fn prelude(&self, _problem: &ProblemConfig) -> String {
        String::new()
    }

    /// Splits user code into a part hoisted above the driver and the remainder
    fn split_user_source(&self, user_source: &str) -> (String, String) {
        (String::new(), user_source.to_string())
    }

    /// Delimiter constant, result record shape and instrumentation helpers
    fn header(&self, problem: &ProblemConfig) -> String;

    /// One isolated test case; `index` is zero-based
    fn case_block(
        &self,
        problem: &ProblemConfig,
        case: &CaseConfig,
        index: usize,
    ) -> Result<String, GenerateError>;

    /// Aggregation, verdict and the single delimiter emission
    fn footer(&self, problem: &ProblemConfig) -> String;

    /// Skeleton a user starts editing from
    fn starter(&self, entry: &EntryPoint) -> String;
}

pub fn backend(language: Language) -> &'static dyn HarnessBackend {
    match language {
        Language::Python => &PythonBackend,
        Language::Java => &JavaBackend,
        Language::C => &CBackend,
    }
}

/// Builds the full program for `problem` in `language` around `user_source`
pub fn generate(
    problem: &ProblemConfig,
    language: Language,
    user_source: &str,
) -> Result<GeneratedSource, GenerateError> {
    let backend = backend(language);
    debug_assert_eq!(backend.language(), language);

    let mut body = String::new();
    for (idx, case) in problem.cases.iter().enumerate() {
        case.check_args(idx + 1, &problem.entry)?;
        body.push_str(&backend.case_block(problem, case, idx)?);
    }

    let prelude = backend.prelude(problem);
    let header = backend.header(problem);
    let footer = backend.footer(problem);
    let (hoisted, user_source) = backend.split_user_source(user_source);

    let content = match language.placement() {
        Placement::AppendDriver | Placement::PrecedeEntry => [
            prelude.as_str(),
            hoisted.as_str(),
            user_source.as_str(),
            "\n\n",
            header.as_str(),
            body.as_str(),
            footer.as_str(),
        ]
        .concat(),
        Placement::WrapUser => [
            prelude.as_str(),
            hoisted.as_str(),
            header.as_str(),
            body.as_str(),
            footer.as_str(),
            "\n\n",
            user_source.as_str(),
            "\n",
        ]
        .concat(),
    };

    log::debug!(
        "Generated {} harness for problem {} ({} cases, {} bytes)",
        language,
        problem.id,
        problem.cases.len(),
        content.len()
    );

    Ok(GeneratedSource {
        language,
        file_name: language.file_name(),
        content,
    })
}

pub fn starter_code(entry: &EntryPoint, language: Language) -> String {
    backend(language).starter(entry)
}

/// Replaces every `%KEY%` placeholder of a template
///
/// Substitution is single-pass: placeholder-looking text inside a value is left alone.
fn apply_template(template: &str, mapping: &[(&str, &str)]) -> String {
    let mut text = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('%') {
        text.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match mapping.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                text.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                text.push('%');
                rest = &tail[1..];
            }
        }
    }
    text.push_str(rest);
    text
}

/// Double-quoted literal for C and Java source
///
/// Control characters become three-digit octal escapes, which both languages accept. With
/// `escape_non_ascii` every non-ASCII char is written as UTF-16 `\uXXXX` units, so the
/// generated file is pure ASCII regardless of the compiler's source encoding.
fn quoted_literal(s: &str, escape_non_ascii: bool) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            c if escape_non_ascii && !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04x}", unit));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn delimiter_literal() -> String {
    quoted_literal(JUDGE_DELIMITER, false)
}
