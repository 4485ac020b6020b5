//! Prompt system for medfaq.
//!
//! - YAML prompt definitions, overridable per workspace
//! - Handlebars rendering of system and user messages
//! - The built-in answer prompt used by the answer synthesizer

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{default_answer_prompt, ANSWER_PROMPT_ID};
pub use loader::{load_prompt, load_prompt_or};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
