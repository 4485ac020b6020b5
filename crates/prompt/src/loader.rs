//! Prompt loader for YAML prompt definitions.

use crate::builder::check_templates;
use crate::types::PromptDefinition;
use medfaq_core::config::STATE_DIR;
use medfaq_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    workspace_path
        .join(STATE_DIR)
        .join("prompts")
        .join(format!("{}.yml", prompt_id))
}

/// Load a prompt definition by ID from the workspace.
///
/// Looks for `<id>.yml` in the `.medfaq/prompts/` directory.
///
/// # Example
/// ```no_run
/// use medfaq_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load a workspace override if one exists, otherwise return `fallback`.
///
/// A present but invalid override is an error rather than a silent fallback.
pub fn load_prompt_or(
    workspace_path: &Path,
    prompt_id: &str,
    fallback: PromptDefinition,
) -> AppResult<PromptDefinition> {
    if prompt_path(workspace_path, prompt_id).exists() {
        load_prompt(workspace_path, prompt_id)
    } else {
        Ok(fallback)
    }
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    check_templates(def)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{default_answer_prompt, ANSWER_PROMPT_ID};
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, content: &str) {
        let prompts_dir = dir.join(STATE_DIR).join("prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(prompts_dir.join(format!("{}.yml", id)), content).unwrap();
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "answer",
            "id: answer\ntitle: Custom\napiVersion: \"1.0\"\ntemplate: \"Q: {{question}}\"\n",
        );

        let prompt = load_prompt(temp_dir.path(), "answer").unwrap();
        assert_eq!(prompt.id, "answer");
        assert_eq!(prompt.title, "Custom");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "invalid", "invalid: yaml: content:");
        assert!(load_prompt(temp_dir.path(), "invalid").is_err());
    }

    #[test]
    fn test_load_rejects_broken_template() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "answer",
            "id: answer\ntitle: Broken\napiVersion: \"1.0\"\ntemplate: \"{{#each documents}}\"\n",
        );
        assert!(load_prompt(temp_dir.path(), "answer").is_err());
    }

    #[test]
    fn test_load_prompt_or_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let prompt =
            load_prompt_or(temp_dir.path(), ANSWER_PROMPT_ID, default_answer_prompt()).unwrap();
        assert_eq!(prompt.title, "Medical FAQ answer");
    }
}
