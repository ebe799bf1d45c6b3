//! Analyzer - task analysis pipeline
//!
//! Splits raw text into tasks, asks the reasoning engine for priorities and
//! breakdowns, and reconciles the reply into a guaranteed-valid result.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::AnalysisResult;
use crate::error::AnalyzeError;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message, StopReason, create_client};
use crate::prompts::PromptLoader;
use crate::reconcile::reconcile_str;
use crate::splitter::{self, DEFAULT_MAX_TASKS};

/// Configuration for an [`Analyzer`]
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Maximum tasks accepted after parsing
    pub max_tasks: usize,
    /// Max tokens requested from the engine
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_tasks: DEFAULT_MAX_TASKS,
            max_tokens: 3000,
            temperature: 0.5,
        }
    }
}

impl From<&Config> for AnalyzerConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_tasks: config.analysis.max_tasks,
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
        }
    }
}

/// Runs one analysis per call; safe to share across concurrent requests
pub struct Analyzer {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Create an analyzer using embedded prompts
    pub fn new(llm: Arc<dyn LlmClient>, config: AnalyzerConfig) -> Self {
        Self::with_prompts(llm, PromptLoader::embedded_only(), config)
    }

    pub fn with_prompts(llm: Arc<dyn LlmClient>, prompts: PromptLoader, config: AnalyzerConfig) -> Self {
        debug!(model = llm.model(), max_tasks = config.max_tasks, "Analyzer::new: called");
        Self { llm, prompts, config }
    }

    /// Build the production analyzer: configured engine client plus prompt overrides under `root`
    pub fn from_config(config: &Config, root: impl AsRef<Path>) -> Result<Self, AnalyzeError> {
        debug!(provider = %config.llm.provider, "Analyzer::from_config: called");
        let llm = create_client(&config.llm).map_err(|e| match e {
            LlmError::MissingApiKey(env) => AnalyzeError::MissingCredential(env),
            other => AnalyzeError::UpstreamUnavailable(other),
        })?;
        Ok(Self::with_prompts(llm, PromptLoader::new(root), AnalyzerConfig::from(config)))
    }

    /// Parse tasks from text and enforce the task count limit
    pub fn parse_tasks(&self, text: &str) -> Result<Vec<String>, AnalyzeError> {
        let tasks = splitter::split(text);
        if tasks.is_empty() {
            debug!("parse_tasks: no tasks found");
            return Err(AnalyzeError::EmptyInput);
        }
        splitter::validate_count(&tasks, self.config.max_tasks)?;
        Ok(tasks)
    }

    /// Analyze free-form task text
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalyzeError> {
        let tasks = self.parse_tasks(text)?;
        self.analyze_tasks(&tasks).await
    }

    /// Analyze an already-split task list
    pub async fn analyze_tasks(&self, tasks: &[String]) -> Result<AnalysisResult, AnalyzeError> {
        if tasks.is_empty() {
            return Err(AnalyzeError::EmptyInput);
        }
        info!(task_count = tasks.len(), model = self.llm.model(), "Analyzing tasks");
        let started = Instant::now();

        let request = self.build_request(tasks)?;
        let response = self.llm.complete(request).await?;

        if response.stop_reason == StopReason::MaxTokens {
            warn!("Reasoning engine hit the token limit, reply may be truncated");
        }
        let content = response.content.ok_or_else(|| {
            AnalyzeError::UpstreamUnavailable(LlmError::InvalidResponse(
                "Reasoning engine returned no content".to_string(),
            ))
        })?;

        let result = reconcile_str(&content, tasks)?;
        info!(
            task_count = tasks.len(),
            total_tokens = response.usage.total(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            next_task = %result.next_action.task,
            next_priority = ?result.priorities.priority_of(&result.next_action.task),
            "Analysis complete"
        );
        Ok(result)
    }

    fn build_request(&self, tasks: &[String]) -> Result<CompletionRequest, AnalyzeError> {
        let system_prompt = self
            .prompts
            .system_prompt()
            .map_err(|e| AnalyzeError::Prompt(e.to_string()))?;
        let prompt = self
            .prompts
            .analysis_prompt(tasks)
            .map_err(|e| AnalyzeError::Prompt(e.to_string()))?;

        Ok(CompletionRequest {
            system_prompt,
            messages: vec![Message::user(prompt)],
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            json_output: true,
        })
    }
}
