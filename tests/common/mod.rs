//! Process-based sandbox for exercising generated harnesses against real toolchains.
//!
//! Runs programs as plain child processes with only a wall-clock limit, so it is only fit
//! for the trusted sources in this test suite.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use oj_harness::config::LanguageConfig;
use oj_harness::error::TransportError;
use oj_harness::harness::GeneratedSource;
use oj_harness::language::Language;
use oj_harness::sandbox::{RawRunOutput, SandboxClient};

const COMPILE_TIMEOUT: Duration = Duration::from_secs(60);

/// Compiles and runs each program in a fresh temporary directory
///
/// Timeouts are reported the way Piston reports them so the resolver sees the same shape.
pub struct LocalSandbox {
    run_timeout: Duration,
}

impl LocalSandbox {
    pub fn new(run_timeout_ms: u64) -> Self {
        Self {
            run_timeout: Duration::from_millis(run_timeout_ms),
        }
    }

    async fn run_command(
        &self,
        command: &[String],
        work_dir: &Path,
        limit: Duration,
    ) -> Result<RawRunOutput, TransportError> {
        let Some((program, args)) = command.split_first() else {
            return Err(TransportError::Envelope("empty command".to_string()));
        };

        let child = tokio::process::Command::new(program)
            .args(args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(io_error)?;

        match timeout(limit, child.wait_with_output()).await {
            Ok(output) => {
                let output = output.map_err(io_error)?;
                Ok(RawRunOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code: output.status.code().unwrap_or(-1),
                    signal: signal_name(&output.status),
                    status: None,
                })
            }
            Err(_) => Ok(RawRunOutput {
                exit_code: -1,
                signal: Some("SIGKILL".to_string()),
                status: Some("TO".to_string()),
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl SandboxClient for LocalSandbox {
    async fn execute(
        &self,
        source: &GeneratedSource,
        language: &LanguageConfig,
    ) -> Result<RawRunOutput, TransportError> {
        let work_dir = tempfile::tempdir().map_err(io_error)?;
        let source_path = work_dir.path().join(source.file_name);
        tokio::fs::write(&source_path, &source.content)
            .await
            .map_err(io_error)?;

        let dir = work_dir.path().to_string_lossy().into_owned();
        let input = source_path.to_string_lossy().into_owned();
        let output = work_dir.path().join("main").to_string_lossy().into_owned();
        let mapping = [
            ("%INPUT%", input.as_str()),
            ("%OUTPUT%", output.as_str()),
            ("%DIR%", dir.as_str()),
        ];

        let (compile, run) = commands(language.name);
        if let Some(compile) = compile {
            let compiled = self
                .run_command(&apply_template(compile, &mapping), work_dir.path(), COMPILE_TIMEOUT)
                .await?;
            if compiled.exit_code != 0 || compiled.killed_by_limiter() {
                return Ok(compiled);
            }
        }

        self.run_command(&apply_template(run, &mapping), work_dir.path(), self.run_timeout)
            .await
    }
}

fn io_error(e: std::io::Error) -> TransportError {
    TransportError::Envelope(e.to_string())
}

fn commands(language: Language) -> (Option<&'static [&'static str]>, &'static [&'static str]) {
    match language {
        Language::Python => (None, &["python3", "%INPUT%"]),
        Language::Java => (
            Some(&["javac", "-encoding", "UTF-8", "-d", "%DIR%", "%INPUT%"][..]),
            &["java", "-cp", "%DIR%", "Main"],
        ),
        Language::C => (
            Some(&["gcc", "-std=c11", "-O2", "-o", "%OUTPUT%", "%INPUT%", "-lm"][..]),
            &["%OUTPUT%"],
        ),
    }
}

fn apply_template(cmd_template: &[&str], mapping: &[(&str, &str)]) -> Vec<String> {
    cmd_template
        .iter()
        .map(|s| {
            let mut t = s.to_string();
            for (k, v) in mapping {
                t = t.replace(k, v);
            }
            t
        })
        .collect()
}

#[cfg(unix)]
fn signal_name(status: &std::process::ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;

    status.signal().map(|sig| {
        match sig {
            4 => "SIGILL",
            6 => "SIGABRT",
            7 => "SIGBUS",
            8 => "SIGFPE",
            9 => "SIGKILL",
            11 => "SIGSEGV",
            15 => "SIGTERM",
            _ => return format!("signal {sig}"),
        }
        .to_string()
    })
}

#[cfg(not(unix))]
fn signal_name(_status: &std::process::ExitStatus) -> Option<String> {
    None
}
