//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use medfaq_core::{AppError, AppResult};
use serde::Serialize;

/// Build a prompt from a definition and a template context.
///
/// Both the system and the user template are rendered with the same
/// context. HTML escaping is disabled since the output is plain text.
///
/// # Example
/// ```no_run
/// use medfaq_prompt::{build_prompt, default_answer_prompt};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let context = serde_json::json!({ "question": "為什麼會便秘？", "documents": [] });
/// let built = build_prompt(&default_answer_prompt(), &context)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt<T: Serialize>(
    definition: &PromptDefinition,
    context: &T,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(false);

    handlebars
        .register_template_string("user", &definition.template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let user = handlebars
        .render("user", context)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    let system = match definition.system {
        Some(ref system_template) => {
            handlebars
                .register_template_string("system", system_template)
                .map_err(|e| {
                    AppError::Prompt(format!("Failed to register system template: {}", e))
                })?;
            Some(handlebars.render("system", context).map_err(|e| {
                AppError::Prompt(format!("Failed to render system template: {}", e))
            })?)
        }
        None => None,
    };

    Ok(BuiltPrompt::new(system, user, definition.id.clone()))
}

/// Check that a definition's templates parse.
pub(crate) fn check_templates(definition: &PromptDefinition) -> AppResult<()> {
    let mut handlebars = Handlebars::new();
    handlebars
        .register_template_string("user", &definition.template)
        .map_err(|e| AppError::Prompt(format!("Invalid template in '{}': {}", definition.id, e)))?;
    if let Some(ref system) = definition.system {
        handlebars
            .register_template_string("system", system)
            .map_err(|e| {
                AppError::Prompt(format!(
                    "Invalid system template in '{}': {}",
                    definition.id, e
                ))
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(system: Option<&str>, template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "test".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            system: system.map(str::to_string),
            template: template.to_string(),
        }
    }

    #[test]
    fn test_render_user_and_system() {
        let def = definition(Some("Dataset: {{dataset}}"), "Q: {{question}}");
        let built = build_prompt(&def, &json!({"dataset": "經痛", "question": "怎麼緩解？"})).unwrap();

        assert_eq!(built.system.as_deref(), Some("Dataset: 經痛"));
        assert_eq!(built.user, "Q: 怎麼緩解？");
    }

    #[test]
    fn test_no_html_escaping() {
        let def = definition(None, "{{question}}");
        let built = build_prompt(&def, &json!({"question": "a < b & \"c\""})).unwrap();
        assert_eq!(built.user, "a < b & \"c\"");
    }

    #[test]
    fn test_each_over_documents() {
        let def = definition(None, "{{#each documents}}[{{position}}] {{content}}\n{{/each}}");
        let built = build_prompt(
            &def,
            &json!({"documents": [
                {"position": 1, "content": "first"},
                {"position": 2, "content": "second"}
            ]}),
        )
        .unwrap();
        assert!(built.user.contains("[1] first"));
        assert!(built.user.contains("[2] second"));
        assert!(built.user.find("[1]") < built.user.find("[2]"));
    }

    #[test]
    fn test_invalid_template() {
        let def = definition(None, "{{#each documents}}unclosed");
        assert!(matches!(build_prompt(&def, &json!({})), Err(AppError::Prompt(_))));
        assert!(check_templates(&def).is_err());
    }
}
