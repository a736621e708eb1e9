use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;

use crate::language::Language;
use crate::problem::ProblemConfig;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_BIND_PORT: u16 = 12345;
pub const DEFAULT_PISTON_ENDPOINT: &str = "https://emkc.org/api/v2/piston/execute";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Parser)]
#[command(name = "oj-harness", version = "1.0", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(long = "config", short = 'c')]
    pub config_path: String,

    /// Judge a single file for this problem instead of starting the server
    #[arg(long, requires = "language", requires = "source")]
    pub problem: Option<String>,

    /// Language of `--source`
    #[arg(long, short = 'l')]
    pub language: Option<Language>,

    /// File holding the submission to judge
    #[arg(long, short = 's')]
    pub source: Option<PathBuf>,

    /// Print the generated program rather than submitting it
    #[arg(long = "emit-harness", default_value_t = false, requires = "problem")]
    pub emit_harness: bool,
}

impl CliArgs {
    /// Load and validate the configuration from the specified file
    pub fn to_config(&self) -> Result<Config> {
        Config::load(&self.config_path)
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    pub languages: Vec<LanguageConfig>,
    pub problems: Vec<ProblemConfig>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ServerConfig {
    pub bind_address: Option<String>,
    pub bind_port: Option<u16>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SandboxConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Transport deadline for one execute call
    pub request_timeout_ms: Option<u64>,
    pub run_timeout_ms: Option<u64>,
    pub compile_timeout_ms: Option<u64>,
    /// Bytes; `-1` means no limit
    pub run_memory_limit: Option<i64>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_ms: None,
            run_timeout_ms: None,
            compile_timeout_ms: None,
            run_memory_limit: None,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_PISTON_ENDPOINT.to_string()
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LanguageConfig {
    pub name: Language,
    /// Runtime identifier understood by the sandbox, e.g. `python`
    pub runtime: String,
    pub version: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Config> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("unable to open configuration file {path}"))?;
        let reader = std::io::BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("invalid configuration in {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that would fail later, before anything is generated
    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            bail!("no languages configured");
        }
        let mut seen_languages = HashSet::new();
        for language in &self.languages {
            if !seen_languages.insert(language.name) {
                bail!("language {} configured twice", language.name);
            }
        }

        let mut seen_problems = HashSet::new();
        for problem in &self.problems {
            if !seen_problems.insert(problem.id.as_str()) {
                bail!("problem id {} used twice", problem.id);
            }
            problem.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{Check, Value};

    fn example() -> Config {
        Config::load("data/example.json").unwrap()
    }

    #[test]
    fn test_config_deserialization() {
        let config = example();
        assert_eq!(config.server.bind_address, Some("127.0.0.1".to_string()));
        assert_eq!(config.sandbox.endpoint, DEFAULT_PISTON_ENDPOINT);
        assert_eq!(config.sandbox.run_timeout_ms, Some(3000));
        assert_eq!(config.languages.len(), 3);
        assert_eq!(config.problems.len(), 3);

        let two_sum = &config.problems[0];
        assert_eq!(two_sum.id, "1");
        assert_eq!(two_sum.entry.function, "twoSum");
        assert_eq!(
            two_sum.cases[0].args,
            vec![Value::IntArray(vec![2, 7, 11, 15]), Value::Int(9)]
        );
        assert!(matches!(
            two_sum.cases[0].check,
            Check::IndexPairSum { .. }
        ));

        assert_eq!(config.languages[0].name, Language::Python);
        assert_eq!(config.languages[0].runtime, "python");
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"languages": [{"name": "c", "runtime": "c", "version": "10.2.0"}], "problems": []}"#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.server.bind_address, None);
        assert_eq!(config.server.bind_port, None);
        assert_eq!(config.sandbox.request_timeout_ms, None);
        assert_eq!(config.sandbox.endpoint, DEFAULT_PISTON_ENDPOINT);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut config = example();
        let copy = config.problems[0].clone();
        config.problems.push(copy);
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "problem id 1 used twice");

        let mut config = example();
        let copy = config.languages[0].clone();
        config.languages.push(copy);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_cases() {
        let mut config = example();
        config.problems[1].cases[0].args.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("case 1"), "{err}");
    }

    #[test]
    fn test_cli_one_shot_requires_language_and_source() {
        assert!(CliArgs::try_parse_from(["oj-harness", "-c", "x.json", "--problem", "1"]).is_err());
        let cli = CliArgs::try_parse_from([
            "oj-harness",
            "-c",
            "x.json",
            "--problem",
            "1",
            "--language",
            "python3",
            "--source",
            "sol.py",
        ])
        .unwrap();
        assert_eq!(cli.language, Some(Language::Python));
        assert!(!cli.emit_harness);
    }
}
