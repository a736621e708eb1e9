//! One call from user source to verdict: generate, execute, resolve.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{Config, LanguageConfig};
use crate::error::JudgeError;
use crate::harness::{self, GeneratedSource};
use crate::language::Language;
use crate::problem::ProblemConfig;
use crate::resolver::resolve;
use crate::sandbox::SandboxClient;
use crate::verdict::ExecutionResult;

/// Read-only registry plus a sandbox client, shared by concurrent submissions
pub struct Orchestrator {
    problems: Vec<ProblemConfig>,
    languages: Vec<LanguageConfig>,
    client: Arc<dyn SandboxClient>,
}

impl Orchestrator {
    pub fn new(
        problems: Vec<ProblemConfig>,
        languages: Vec<LanguageConfig>,
        client: Arc<dyn SandboxClient>,
    ) -> Self {
        Self {
            problems,
            languages,
            client,
        }
    }

    pub fn from_config(config: Config, client: Arc<dyn SandboxClient>) -> Self {
        Self::new(config.problems, config.languages, client)
    }

    pub fn problems(&self) -> &[ProblemConfig] {
        &self.problems
    }

    pub fn languages(&self) -> &[LanguageConfig] {
        &self.languages
    }

    pub fn find_problem(&self, id: &str) -> Option<&ProblemConfig> {
        self.problems.iter().find(|p| p.id == id)
    }

    pub fn find_language(&self, name: Language) -> Option<&LanguageConfig> {
        self.languages.iter().find(|l| l.name == name)
    }

    /// Judges `user_source`; every failure comes back as a `RuntimeError` result
    pub async fn submit(
        &self,
        user_source: &str,
        problem_id: &str,
        language: Language,
    ) -> ExecutionResult {
        self.submit_cancellable(user_source, problem_id, language, &CancellationToken::new())
            .await
    }

    /// Like [`Orchestrator::submit`], abandoning the sandbox call once `token` is cancelled
    pub async fn submit_cancellable(
        &self,
        user_source: &str,
        problem_id: &str,
        language: Language,
        token: &CancellationToken,
    ) -> ExecutionResult {
        log::info!("Judging submission for problem {problem_id} in {language}");

        match self.judge(user_source, problem_id, language, token).await {
            Ok(result) => {
                log::info!(
                    "Problem {problem_id} ({language}): {} ({}/{} passed)",
                    result.verdict,
                    result.passed_count(),
                    result.test_results.len()
                );
                result
            }
            Err(JudgeError::Cancelled) => {
                log::info!("Submission for problem {problem_id} cancelled");
                JudgeError::Cancelled.into_result()
            }
            Err(e) => {
                log::error!("Submission for problem {problem_id} failed: {e}");
                e.into_result()
            }
        }
    }

    /// Builds the program that would be sent to the sandbox
    pub fn generate(
        &self,
        user_source: &str,
        problem_id: &str,
        language: Language,
    ) -> Result<GeneratedSource, JudgeError> {
        let problem = self
            .find_problem(problem_id)
            .ok_or_else(|| JudgeError::UnknownProblem(problem_id.to_string()))?;
        Ok(harness::generate(problem, language, user_source)?)
    }

    async fn judge(
        &self,
        user_source: &str,
        problem_id: &str,
        language: Language,
        token: &CancellationToken,
    ) -> Result<ExecutionResult, JudgeError> {
        let language_config = self
            .find_language(language)
            .ok_or(JudgeError::UnknownLanguage(language))?;
        let source = self.generate(user_source, problem_id, language)?;

        log::debug!(
            "Dispatching {} ({} bytes) to sandbox",
            source.file_name,
            source.content.len()
        );

        let raw = tokio::select! {
            _ = token.cancelled() => return Err(JudgeError::Cancelled),
            raw = self.client.execute(&source, language_config) => raw?,
        };

        log::debug!(
            "Sandbox finished with exit code {} ({} bytes of stdout)",
            raw.exit_code,
            raw.stdout.len()
        );

        Ok(resolve(&raw))
    }
}
