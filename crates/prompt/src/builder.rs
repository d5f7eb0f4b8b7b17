//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use lectern_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// This function:
/// 1. Checks that every variable listed in `input.required` is present and non-blank
/// 2. Renders the user template (and the system template, if any) with Handlebars
/// 3. Returns a `BuiltPrompt` ready for LLM execution
///
/// Variable values are inserted verbatim: no HTML escaping and no trimming.
///
/// # Example
/// ```no_run
/// use lectern_core::Locale;
/// use lectern_prompt::{build_prompt, load_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(None, "material.answer", Locale::En)?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is covered?".to_string());
/// vars.insert("fileReference".to_string(), "https://files/physics.pdf".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    for name in &definition.input.required {
        let present = variables
            .get(name)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !present {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' requires variable '{}'",
                definition.id, name
            )));
        }
    }

    let user = render_template(&definition.template, &variables)?;
    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        definition.locale,
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text prompts: never HTML-escape user input
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptInputSpec, PromptOutputSpec};
    use lectern_core::Locale;

    fn create_test_definition(system: Option<&str>) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            locale: Locale::En,
            input: PromptInputSpec {
                required: vec!["question".to_string()],
            },
            system: system.map(str::to_string),
            template: "Question: {{question}}".to_string(),
            output: PromptOutputSpec {
                format: "text".to_string(),
            },
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{question}}", &vars);
        assert_eq!(result.unwrap(), "Question: Hello, world!");
    }

    #[test]
    fn test_values_are_not_html_escaped() {
        let mut vars = HashMap::new();
        vars.insert(
            "question".to_string(),
            "a < b && \"quoted\" https://x/y?a=1&b=2".to_string(),
        );

        let result = render_template("{{question}}", &vars).unwrap();
        assert_eq!(result, "a < b && \"quoted\" https://x/y?a=1&b=2");
    }

    #[test]
    fn test_build_prompt_with_system() {
        let def = create_test_definition(Some("Answer about {{question}}"));
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "motion".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.user, "Question: motion");
        assert_eq!(built.system.as_deref(), Some("Answer about motion"));
        assert_eq!(built.metadata.locale, Locale::En);
    }

    #[test]
    fn test_missing_required_variable_fails() {
        let def = create_test_definition(None);
        let result = build_prompt(&def, HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_blank_required_variable_fails() {
        let def = create_test_definition(None);
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "   ".to_string());
        assert!(build_prompt(&def, vars).is_err());
    }
}
