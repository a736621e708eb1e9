mod piston;

pub use piston::{PistonClient, parse_envelope};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{LanguageConfig, SandboxConfig};
use crate::error::TransportError;
use crate::harness::GeneratedSource;

/// What the sandbox reports about one execution, verbatim
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RawRunOutput {
    pub stdout: String,
    pub stderr: String,
    /// `-1` when the process had no exit code (killed by a signal)
    pub exit_code: i32,
    pub signal: Option<String>,
    /// Sandbox status code such as `TO` (timed out) or `RE`
    pub status: Option<String>,
}

impl RawRunOutput {
    /// Whether the sandbox stopped the program for running too long
    ///
    /// A `SIGKILL` only counts when no status says otherwise: output and memory limits are
    /// also enforced with `SIGKILL` but report `OL` or `SG`.
    pub fn killed_by_limiter(&self) -> bool {
        match self.status.as_deref() {
            Some(status) => status == "TO",
            None => self.signal.as_deref() == Some("SIGKILL"),
        }
    }
}

/// Anything that can compile and run one generated program
///
/// One call per submission and no retries; an unreachable sandbox or unusable response is a
/// [`TransportError`], while a program that merely exits non-zero is a normal output.
#[async_trait]
pub trait SandboxClient: Send + Sync {
    async fn execute(
        &self,
        source: &GeneratedSource,
        language: &LanguageConfig,
    ) -> Result<RawRunOutput, TransportError>;
}

/// Creates the sandbox client described by the configuration
pub fn create_sandbox_client(
    config: &SandboxConfig,
) -> Result<Arc<dyn SandboxClient>, TransportError> {
    log::info!("Using Piston sandbox at {}", config.endpoint);
    Ok(Arc::new(PistonClient::new(config)?))
}
