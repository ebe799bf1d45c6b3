//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::domain::{MAX_STEP_MINUTES, MIN_STEP_MINUTES};

/// Context for rendering the analysis template
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPromptContext {
    /// Number of tasks being analyzed
    pub task_count: usize,
    /// Numbered task list, one `N. task` per line
    pub task_list: String,
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl AnalysisPromptContext {
    pub fn new(tasks: &[String]) -> Self {
        debug!(task_count = tasks.len(), "AnalysisPromptContext::new: called");
        let task_list = tasks
            .iter()
            .enumerate()
            .map(|(i, task)| format!("{}. {}", i + 1, task))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            task_count: tasks.len(),
            task_list,
            min_minutes: MIN_STEP_MINUTES,
            max_minutes: MAX_STEP_MINUTES,
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.prioritizer/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `<root>/.prioritizer/prompts/` before embedded prompts
    pub fn new(root: impl AsRef<Path>) -> Self {
        let user_dir = root.as_ref().join(".prioritizer/prompts");
        let exists = user_dir.exists();
        debug!(?user_dir, %exists, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            user_dir: if exists { Some(user_dir) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; task names must reach the model verbatim
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name, user override first
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: using embedded");
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// System instruction for the reasoning engine
    pub fn system_prompt(&self) -> Result<String> {
        self.load_template("system")
    }

    /// Render the analysis prompt for a task list
    pub fn analysis_prompt(&self, tasks: &[String]) -> Result<String> {
        let context = AnalysisPromptContext::new(tasks);
        let template = self.load_template("analyze")?;
        self.hbs
            .render_template(&template, &context)
            .map_err(|e| eyre!("Failed to render template analyze: {}", e))
    }
}
