//! Built-in prompt definitions.

use crate::types::PromptDefinition;

/// Identifier of the answer prompt; `.medfaq/prompts/answer.yml` overrides it.
pub const ANSWER_PROMPT_ID: &str = "answer";

const ANSWER_SYSTEM: &str = "\
You answer questions for a medical FAQ demo built on the Taiwan Ministry of Health \
and Welfare \"常見問題\" pages.

Instructions:
- Answer in the language of the question; use Traditional Chinese for Chinese questions
- Base the answer on the reference material; do not invent facts it does not support
- Do not mention \"documents\", \"references\" or document numbers
- Keep the answer short and practical
- This service is not professional medical advice; when symptoms sound serious, \
advise seeing a physician";

const ANSWER_TEMPLATE: &str = "\
Question:
{{question}}

{{#if has_documents}}
Reference material:
{{#each documents}}
[{{position}}] {{content}}
{{#if answer}}
{{answer}}
{{/if}}
{{/each}}
{{else}}
No reference material was found for this question. Give a brief, cautious general \
answer and recommend consulting a physician.
{{/if}}";

/// The prompt used to synthesize answers from retrieved FAQ entries.
///
/// Context variables: `question`, `has_documents` and
/// `documents[] {position, content, answer}`.
pub fn default_answer_prompt() -> PromptDefinition {
    PromptDefinition {
        id: ANSWER_PROMPT_ID.to_string(),
        title: "Medical FAQ answer".to_string(),
        api_version: "1.0".to_string(),
        system: Some(ANSWER_SYSTEM.to_string()),
        template: ANSWER_TEMPLATE.to_string(),
    }
}
