//! Prompt loader for YAML prompt definitions.
//!
//! Built-in prompts ship inside the binary. Operators can override any of
//! them by dropping `<id>.<locale>.yml` (or a locale-neutral `<id>.yml`)
//! into the prompts directory.

use crate::types::PromptDefinition;
use lectern_core::{AppError, AppResult, Locale};
use std::path::{Path, PathBuf};

/// Built-in prompt files keyed by `<id>.<locale>`.
const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (
        "material.answer.ar",
        include_str!("../prompts/material.answer.ar.yml"),
    ),
    (
        "material.answer.en",
        include_str!("../prompts/material.answer.en.yml"),
    ),
    (
        "answer.summarize.ar",
        include_str!("../prompts/answer.summarize.ar.yml"),
    ),
    (
        "answer.summarize.en",
        include_str!("../prompts/answer.summarize.en.yml"),
    ),
    (
        "answer.explain.ar",
        include_str!("../prompts/answer.explain.ar.yml"),
    ),
    (
        "answer.explain.en",
        include_str!("../prompts/answer.explain.en.yml"),
    ),
];

/// Load a prompt definition by ID and locale.
///
/// Lookup order:
/// 1. `<prompts_dir>/<id>.<locale>.yml`
/// 2. `<prompts_dir>/<id>.yml`
/// 3. The built-in definition for `<id>.<locale>`
///
/// # Example
/// ```no_run
/// use lectern_core::Locale;
/// use lectern_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Some(Path::new(".lectern/prompts")), "material.answer", Locale::Ar)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(
    prompts_dir: Option<&Path>,
    prompt_id: &str,
    locale: Locale,
) -> AppResult<PromptDefinition> {
    if let Some(dir) = prompts_dir {
        for candidate in override_candidates(dir, prompt_id, locale) {
            if candidate.exists() {
                return load_prompt_file(&candidate);
            }
        }
    }

    let key = format!("{}.{}", prompt_id, locale.as_str());
    let contents = BUILTIN_PROMPTS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, contents)| *contents)
        .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", key)))?;

    let definition = parse_prompt(contents, &key)?;
    tracing::debug!("Loaded built-in prompt: {}", key);
    Ok(definition)
}

/// List all prompt keys (`<id>.<locale>` or `<id>`) available, built-in and overridden.
pub fn list_prompts(prompts_dir: Option<&Path>) -> AppResult<Vec<String>> {
    let mut prompt_ids: Vec<String> = BUILTIN_PROMPTS
        .iter()
        .map(|(name, _)| name.to_string())
        .collect();

    if let Some(dir) = prompts_dir.filter(|d| d.exists()) {
        for entry in walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids.sort();
    prompt_ids.dedup();
    Ok(prompt_ids)
}

fn override_candidates(dir: &Path, prompt_id: &str, locale: Locale) -> [PathBuf; 2] {
    [
        dir.join(format!("{}.{}.yml", prompt_id, locale.as_str())),
        dir.join(format!("{}.yml", prompt_id)),
    ]
}

fn load_prompt_file(path: &Path) -> AppResult<PromptDefinition> {
    tracing::debug!("Loading prompt from: {:?}", path);

    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e))
    })?;

    let definition = parse_prompt(&contents, &path.display().to_string())?;
    tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
    Ok(definition)
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
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

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, file_name: &str, valid: bool) {
        let content = if valid {
            r#"
id: material.answer
title: "Override"
apiVersion: "1.0"
locale: en
input:
  required: [question]
template: "Custom: {{question}}"
output:
  format: text
"#
            .to_string()
        } else {
            "invalid: yaml: content:".to_string()
        };

        fs::write(dir.join(file_name), content).unwrap();
    }

    #[test]
    fn test_all_builtins_parse() {
        for (key, contents) in BUILTIN_PROMPTS {
            let def = parse_prompt(contents, key).unwrap();
            assert!(key.starts_with(&def.id), "{} does not match id {}", key, def.id);
            assert!(key.ends_with(def.locale.as_str()));
        }
    }

    #[test]
    fn test_builtin_answer_prompt_per_locale() {
        let ar = load_prompt(None, "material.answer", Locale::Ar).unwrap();
        assert_eq!(ar.locale, Locale::Ar);
        assert!(ar.template.contains("{{fileReference}}"));

        let en = load_prompt(None, "material.answer", Locale::En).unwrap();
        assert!(en.template.contains("Do not use any outside knowledge"));
    }

    #[test]
    fn test_override_wins_over_builtin() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "material.answer.en.yml", true);

        let prompt = load_prompt(Some(temp_dir.path()), "material.answer", Locale::En).unwrap();
        assert_eq!(prompt.title, "Override");
    }

    #[test]
    fn test_locale_neutral_override() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "material.answer.yml", true);

        let prompt = load_prompt(Some(temp_dir.path()), "material.answer", Locale::Ar).unwrap();
        assert_eq!(prompt.template, "Custom: {{question}}");
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let result = load_prompt(None, "nonexistent", Locale::Ar);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "material.answer.ar.yml", false);

        let result = load_prompt(Some(temp_dir.path()), "material.answer", Locale::Ar);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_prompts_merges_overrides() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "custom.prompt.yml", true);
        write_prompt(temp_dir.path(), "material.answer.en.yml", true);

        let prompts = list_prompts(Some(temp_dir.path())).unwrap();
        assert!(prompts.contains(&"custom.prompt".to_string()));
        assert_eq!(
            prompts.iter().filter(|p| *p == "material.answer.en").count(),
            1
        );
    }
}
