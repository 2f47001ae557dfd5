//! Prompt templates for the content generator.
//!
//! Templates are Markdown files whose stem is the template name. A default set
//! is compiled in; a directory on disk can override any subset of them.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const EMBEDDED: [(&str, &str); 6] = [
    ("system_prompt", include_str!("../prompts/system_prompt.md")),
    (
        "extract_project_spec",
        include_str!("../prompts/extract_project_spec.md"),
    ),
    ("generate_plan", include_str!("../prompts/generate_plan.md")),
    (
        "generate_explanation",
        include_str!("../prompts/generate_explanation.md"),
    ),
    (
        "generate_exercises",
        include_str!("../prompts/generate_exercises.md"),
    ),
    ("review_code", include_str!("../prompts/review_code.md")),
];

/// The compiled-in template set.
pub fn embedded() -> HashMap<String, String> {
    EMBEDDED
        .iter()
        .map(|(name, body)| (name.to_string(), body.to_string()))
        .collect()
}

/// Reads every `*.md` file in `prompts_path` into a name -> template map.
pub fn load_dir(prompts_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    let entries = fs::read_dir(prompts_path)
        .with_context(|| format!("Failed to read prompts directory {}", prompts_path.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read prompt {}", path.display()))?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}

/// Embedded templates, overridden by whatever `prompts_path` provides.
pub fn load(prompts_path: Option<&Path>) -> Result<HashMap<String, String>> {
    let mut prompts = embedded();
    if let Some(path) = prompts_path {
        prompts.extend(load_dir(path)?);
    }
    Ok(prompts)
}

/// Substitutes each `{key}` in `template` with its value in a single pass, so
/// braces inside substituted values (code, JSON) are left alone. Unknown keys
/// are kept verbatim.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let value = after.find('}').and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_embedded_has_every_template() {
        let prompts = embedded();
        for name in [
            "system_prompt",
            "extract_project_spec",
            "generate_plan",
            "generate_explanation",
            "generate_exercises",
            "review_code",
        ] {
            assert!(prompts.contains_key(name), "missing template {}", name);
        }
    }

    #[test]
    fn test_directory_overrides_embedded() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("generate_plan.md"), "custom plan {summary}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let prompts = load(Some(dir.path())).unwrap();
        assert_eq!(prompts["generate_plan"], "custom plan {summary}");
        assert!(prompts.contains_key("review_code"));
        assert!(!prompts.contains_key("notes"));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Failed to read prompts directory"));
    }

    #[test]
    fn test_render_replaces_all_occurrences() {
        let rendered = render(
            "{name} builds {project}; go {name}!",
            &[("name", "Sam"), ("project", "a todo app")],
        );
        assert_eq!(rendered, "Sam builds a todo app; go Sam!");
    }

    #[test]
    fn test_render_leaves_braces_in_values_and_json() {
        let rendered = render(
            "code: {snippet}\nshape: { \"issues\": string }",
            &[("snippet", "const {user} = props;"), ("user", "WRONG")],
        );
        assert_eq!(
            rendered,
            "code: const {user} = props;\nshape: { \"issues\": string }"
        );
    }
}
