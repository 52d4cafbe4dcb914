use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::report::Issue;

const DEFAULT_FIX: &str = include_str!("default_prompts/fix-issue.md");

/// File name a user override must have inside the prompt directory.
pub const FIX_TEMPLATE_FILENAME: &str = "fix-issue.md";

/// Placeholder for issue fields the report does not provide.
const MISSING: &str = "unknown";

/// Values exposed to the remediation template.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PromptVars {
    pub category: String,
    pub file: String,
    pub line: String,
    pub function: String,
    pub subcategory: String,
    pub events: String,
}

impl PromptVars {
    pub fn from_issue(issue: &Issue) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_else(|| MISSING.to_string());
        Self {
            category: text(&issue.checker_name),
            file: text(&issue.main_event_file_pathname),
            line: issue
                .main_event_line_number
                .map(|n| n.to_string())
                .unwrap_or_else(|| MISSING.to_string()),
            function: text(&issue.function_display_name),
            subcategory: text(&issue.subcategory),
            events: issue.event_descriptions().join(" "),
        }
    }
}

/// Renders remediation prompts from the embedded template or a user override.
pub struct PromptEngine {
    override_dir: Option<PathBuf>,
    engine: upon::Engine<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PromptEngine {
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self {
            override_dir,
            engine: upon::Engine::new(),
        }
    }

    /// Load the fix template. An override in `override_dir` takes precedence.
    pub fn load_template(&self) -> Result<String> {
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(FIX_TEMPLATE_FILENAME);
            if path.exists() {
                debug!(path = %path.display(), "using prompt override");
                return std::fs::read_to_string(&path).map_err(|e| {
                    Error::Prompt(format!(
                        "failed to read override template {}: {e}",
                        path.display()
                    ))
                });
            }
        }
        Ok(DEFAULT_FIX.to_string())
    }

    /// Render one prompt per issue, in the order given. The template is compiled once.
    pub fn render_issues(&self, issues: &[&Issue]) -> Result<Vec<String>> {
        let source = self.load_template()?;
        let template = self
            .engine
            .compile(source.as_str())
            .map_err(|e| Error::Prompt(format!("failed to compile template: {e}")))?;

        issues
            .iter()
            .map(|issue| {
                let vars = PromptVars::from_issue(issue);
                template
                    .render(&self.engine, &vars)
                    .to_string()
                    .map(|out| out.trim_end().to_string())
                    .map_err(|e| Error::Prompt(format!("failed to render template: {e}")))
            })
            .collect()
    }

    pub fn render_issue(&self, issue: &Issue) -> Result<String> {
        let mut rendered = self.render_issues(&[issue])?;
        rendered
            .pop()
            .ok_or_else(|| Error::Prompt("template produced no output".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Event;
    use std::fs;
    use tempfile::TempDir;

    fn null_deref() -> Issue {
        Issue {
            checker_name: Some("NULL_DEREF".to_string()),
            main_event_file_pathname: Some("a.c".to_string()),
            main_event_line_number: Some(10),
            function_display_name: Some("f".to_string()),
            subcategory: Some("deref".to_string()),
            events: vec![
                Event {
                    event_description: Some("ptr may be null".to_string()),
                    ..Default::default()
                },
                Event {
                    event_description: Some("ptr dereferenced".to_string()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_template_mentions_every_field() {
        let template = PromptEngine::default().load_template().unwrap();
        for var in ["category", "file", "line", "function", "subcategory", "events"] {
            assert!(template.contains(&format!("{{{{ {var} }}}}")), "missing {var}");
        }
    }

    #[test]
    fn test_render_default_prompt() {
        let prompt = PromptEngine::default().render_issue(&null_deref()).unwrap();
        assert!(prompt.contains("NULL_DEREF"));
        assert!(prompt.contains("a.c"));
        assert!(prompt.contains("line 10"));
        assert!(prompt.contains("function f"));
        assert!(prompt.contains("deref"));
        assert!(prompt.contains("ptr may be null ptr dereferenced"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_missing_fields_render_as_unknown() {
        let prompt = PromptEngine::default()
            .render_issue(&Issue::default())
            .unwrap();
        assert!(prompt.contains("Fix the unknown defect reported in unknown at line unknown"));
    }

    #[test]
    fn test_override_takes_precedence() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(FIX_TEMPLATE_FILENAME),
            "{{ file }}:{{ line }} {{ category }} -> {{ events }}\n",
        )
        .unwrap();

        let engine = PromptEngine::new(Some(dir.path().to_path_buf()));
        let prompt = engine.render_issue(&null_deref()).unwrap();
        assert_eq!(prompt, "a.c:10 NULL_DEREF -> ptr may be null ptr dereferenced");
    }

    #[test]
    fn test_override_fallback_to_default() {
        let dir = TempDir::new().unwrap();
        let engine = PromptEngine::new(Some(dir.path().to_path_buf()));
        assert_eq!(
            engine.load_template().unwrap(),
            PromptEngine::default().load_template().unwrap()
        );
    }

    #[test]
    fn test_unknown_variable_errors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FIX_TEMPLATE_FILENAME), "{{ severity }}").unwrap();
        let engine = PromptEngine::new(Some(dir.path().to_path_buf()));
        let err = engine.render_issue(&null_deref()).unwrap_err();
        assert!(matches!(err, Error::Prompt(_)));
        assert!(err.to_string().contains("failed to render template"));
    }

    #[test]
    fn test_unclosed_tag_errors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FIX_TEMPLATE_FILENAME), "{{ file").unwrap();
        let engine = PromptEngine::new(Some(dir.path().to_path_buf()));
        let err = engine.render_issue(&null_deref()).unwrap_err();
        assert!(err.to_string().contains("failed to compile template"));
    }

    #[test]
    fn test_render_issues_keeps_order() {
        let mut second = null_deref();
        second.main_event_file_pathname = Some("b.c".to_string());
        let first = null_deref();
        let prompts = PromptEngine::default()
            .render_issues(&[&first, &second])
            .unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("a.c"));
        assert!(prompts[1].contains("b.c"));
    }
}
