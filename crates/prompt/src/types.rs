//! Prompt types for medfaq.

use serde::{Deserialize, Serialize};

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// System message template (Handlebars), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// User message template (Handlebars)
    pub template: String,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Rendered size of system + user messages in bytes
    #[serde(rename = "renderedBytes")]
    pub rendered_bytes: usize,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(system: Option<String>, user: String, source_prompt_id: String) -> Self {
        let rendered_bytes = user.len() + system.as_ref().map(String::len).unwrap_or(0);
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                rendered_bytes,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: answer
title: FAQ answer
apiVersion: "1.0"
system: "You are a helpful assistant."
template: "{{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "answer");
        assert_eq!(def.system.as_deref(), Some("You are a helpful assistant."));
        assert_eq!(def.template, "{{question}}");
    }

    #[test]
    fn test_system_is_optional() {
        let yaml = "id: x\ntitle: X\napiVersion: \"1.0\"\ntemplate: hi\n";
        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(def.system.is_none());
    }

    #[test]
    fn test_built_prompt_creation() {
        let built = BuiltPrompt::new(
            Some("sys".to_string()),
            "user".to_string(),
            "answer".to_string(),
        );

        assert_eq!(built.system.as_deref(), Some("sys"));
        assert_eq!(built.user, "user");
        assert_eq!(built.metadata.source_prompt_id, "answer");
        assert_eq!(built.metadata.rendered_bytes, 7);
    }
}
