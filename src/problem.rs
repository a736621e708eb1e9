//! Declarative description of a problem: the callable the user implements, the literal
//! arguments of every test case and the predicate that decides whether a result is correct.
//!
//! Backends in [`crate::harness`] render these into Python, Java or C; nothing in here is
//! specific to one problem.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

/// Static type of an argument or return value
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Int,
    Bool,
    Str,
    IntArray,
}

/// A literal embedded verbatim into generated source
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Str(String),
    IntArray(Vec<i32>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Str(_) => ValueKind::Str,
            Value::IntArray(_) => ValueKind::IntArray,
        }
    }

    /// Human-readable rendering, formatted like the harnesses format actual results
    pub fn label(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Str(s) => serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\"")),
            Value::IntArray(items) => format_int_list(items),
        }
    }
}

pub fn format_int_list(items: &[i32]) -> String {
    let inner: Vec<String> = items.iter().map(|n| n.to_string()).collect();
    format!("[{}]", inner.join(", "))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ValueKind,
}

/// The callable a submission must provide
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EntryPoint {
    pub function: String,
    pub params: Vec<Param>,
    pub returns: ValueKind,
}

impl EntryPoint {
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

/// Correctness predicate attached to a test case
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Check {
    /// Result equals the literal, element-wise for arrays
    Equals { value: Value },
    /// Result is two distinct in-range indices into `values` whose elements sum to `target`,
    /// in either order
    IndexPairSum { values: String, target: String },
}

/// A [`Check`] with parameter references replaced by the case's literal arguments
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedCheck<'a> {
    Equals(&'a Value),
    IndexPairSum { values: &'a [i32], target: i32 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CaseConfig {
    pub args: Vec<Value>,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    pub check: Check,
}

impl CaseConfig {
    /// Label shown as the test's input, e.g. `nums=[2, 7, 11, 15], target=9`
    pub fn input_label(&self, entry: &EntryPoint) -> String {
        if let Some(input) = &self.input {
            return input.clone();
        }
        entry
            .params
            .iter()
            .zip(&self.args)
            .map(|(param, value)| format!("{}={}", param.name, value.label()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn expected_label(&self) -> String {
        if let Some(expected) = &self.expected {
            return expected.clone();
        }
        match &self.check {
            Check::Equals { value } => value.label(),
            Check::IndexPairSum { values, target } => {
                format!("two distinct indices i, j with {values}[i] + {values}[j] == {target}")
            }
        }
    }

    pub fn resolve_check<'a>(
        &'a self,
        entry: &EntryPoint,
    ) -> Result<ResolvedCheck<'a>, GenerateError> {
        match &self.check {
            Check::Equals { value } => {
                if value.kind() != entry.returns {
                    return Err(GenerateError::KindMismatch {
                        name: "expected value".to_string(),
                        expected: entry.returns,
                        found: value.kind(),
                    });
                }
                Ok(ResolvedCheck::Equals(value))
            }
            Check::IndexPairSum { values, target } => {
                if entry.returns != ValueKind::IntArray {
                    return Err(GenerateError::KindMismatch {
                        name: format!("{} return value", entry.function),
                        expected: ValueKind::IntArray,
                        found: entry.returns,
                    });
                }
                let values_arg = self.arg_named(entry, values)?;
                let target_arg = self.arg_named(entry, target)?;
                match (values_arg, target_arg) {
                    (Value::IntArray(items), Value::Int(sum)) => Ok(ResolvedCheck::IndexPairSum {
                        values: items,
                        target: *sum,
                    }),
                    (Value::IntArray(_), other) => Err(GenerateError::KindMismatch {
                        name: target.clone(),
                        expected: ValueKind::Int,
                        found: other.kind(),
                    }),
                    (other, _) => Err(GenerateError::KindMismatch {
                        name: values.clone(),
                        expected: ValueKind::IntArray,
                        found: other.kind(),
                    }),
                }
            }
        }
    }

    fn arg_named(&self, entry: &EntryPoint, name: &str) -> Result<&Value, GenerateError> {
        entry
            .param_index(name)
            .and_then(|idx| self.args.get(idx))
            .ok_or_else(|| GenerateError::UnknownParameter(name.to_string()))
    }

    /// Checks arity and argument kinds against the entry point
    pub fn check_args(&self, index: usize, entry: &EntryPoint) -> Result<(), GenerateError> {
        if self.args.len() != entry.params.len() {
            return Err(GenerateError::Arity {
                index,
                expected: entry.params.len(),
                found: self.args.len(),
            });
        }
        for (param, value) in entry.params.iter().zip(&self.args) {
            if param.kind != value.kind() {
                return Err(GenerateError::KindMismatch {
                    name: param.name.clone(),
                    expected: param.kind,
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }
}

/// One registered problem
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProblemConfig {
    pub id: String,
    pub name: String,
    pub entry: EntryPoint,
    pub cases: Vec<CaseConfig>,
}

impl ProblemConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cases.is_empty() {
            bail!("problem {} has no test cases", self.id);
        }
        if !is_identifier(&self.entry.function) {
            bail!(
                "problem {}: '{}' is not a valid function name",
                self.id,
                self.entry.function
            );
        }
        for param in &self.entry.params {
            if !is_identifier(&param.name) {
                bail!(
                    "problem {}: '{}' is not a valid parameter name",
                    self.id,
                    param.name
                );
            }
        }
        for (idx, case) in self.cases.iter().enumerate() {
            let index = idx + 1;
            case.check_args(index, &self.entry)
                .and_then(|_| case.resolve_check(&self.entry).map(|_| ()))
                .map_err(|e| anyhow::anyhow!("problem {} case {index}: {e}", self.id))?;
        }
        Ok(())
    }
}

/// Generated names all start with `judge`, so user-facing names may not
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    head_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.to_lowercase().starts_with("judge")
        && !name.starts_with("_judge")
}
