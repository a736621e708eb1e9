use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{RawRunOutput, SandboxClient};
use crate::config::{DEFAULT_REQUEST_TIMEOUT_MS, LanguageConfig, SandboxConfig};
use crate::error::TransportError;
use crate::harness::GeneratedSource;

/// Client of the Piston `execute` endpoint
pub struct PistonClient {
    http: reqwest::Client,
    endpoint: String,
    run_timeout_ms: Option<u64>,
    compile_timeout_ms: Option<u64>,
    run_memory_limit: Option<i64>,
}

#[derive(Serialize, Debug)]
struct ExecuteRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<SourceFile<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compile_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_memory_limit: Option<i64>,
}

#[derive(Serialize, Debug)]
struct SourceFile<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ExecuteResponse {
    run: Option<StageResult>,
    compile: Option<StageResult>,
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StageResult {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    code: Option<i32>,
    signal: Option<String>,
    status: Option<String>,
}

impl StageResult {
    fn into_raw(self) -> RawRunOutput {
        RawRunOutput {
            stdout: self.stdout,
            stderr: self.stderr,
            exit_code: self.code.unwrap_or(-1),
            signal: self.signal,
            status: self.status,
        }
    }

    fn failed(&self) -> bool {
        self.code != Some(0) || self.signal.is_some()
    }
}

impl PistonClient {
    pub fn new(config: &SandboxConfig) -> Result<Self, TransportError> {
        let deadline = config
            .request_timeout_ms
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(deadline))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            run_timeout_ms: config.run_timeout_ms,
            compile_timeout_ms: config.compile_timeout_ms,
            run_memory_limit: config.run_memory_limit,
        })
    }
}

#[async_trait]
impl SandboxClient for PistonClient {
    async fn execute(
        &self,
        source: &GeneratedSource,
        language: &LanguageConfig,
    ) -> Result<RawRunOutput, TransportError> {
        let request = ExecuteRequest {
            language: &language.runtime,
            version: &language.version,
            files: vec![SourceFile {
                name: Some(source.file_name),
                content: &source.content,
            }],
            run_timeout: self.run_timeout_ms,
            compile_timeout: self.compile_timeout_ms,
            run_memory_limit: self.run_memory_limit,
        };

        log::debug!(
            "POST {} ({} {}, {} bytes)",
            self.endpoint,
            language.runtime,
            language.version,
            source.content.len()
        );

        let response = self.http.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        parse_envelope(&body)
    }
}

/// Extracts the run outcome from a successful response body
///
/// A compile failure comes back without a `run` stage; the compile stage then stands in for
/// it. An empty run stderr falls back to the compile stderr so warnings explain crashes.
pub fn parse_envelope(body: &str) -> Result<RawRunOutput, TransportError> {
    let response: ExecuteResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Envelope(e.to_string()))?;

    match (response.run, response.compile) {
        (Some(run), Some(compile)) if compile.failed() && run.stdout.is_empty() => {
            let mut raw = compile.into_raw();
            if raw.stderr.is_empty() {
                raw.stderr = run.stderr;
            }
            Ok(raw)
        }
        (Some(run), compile) => {
            let mut raw = run.into_raw();
            if raw.stderr.trim().is_empty() {
                if let Some(compile) = compile {
                    raw.stderr = compile.stderr;
                }
            }
            Ok(raw)
        }
        (None, Some(compile)) => Ok(compile.into_raw()),
        (None, None) => Err(TransportError::Envelope(
            response
                .message
                .unwrap_or_else(|| "response carries neither a run nor a compile stage".to_string()),
        )),
    }
}

fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}
