//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for task analysis.
//!
//! Template loading chain:
//! 1. `.prioritizer/prompts/{name}.pmt` (user override)
//! 2. Embedded fallback compiled into the binary
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{AnalysisPromptContext, PromptLoader};
