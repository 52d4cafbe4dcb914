use tracing::debug;

use crate::error::Result;
use crate::prompts::PromptEngine;
use crate::report::{Issue, Report};

/// Flag an issue as handled. Only touches memory; the report must be saved afterwards.
pub fn mark_fixed(issue: &mut Issue) {
    // An unreadable `fixed` value kept from the source would otherwise be written twice.
    issue.extra.remove("fixed");
    issue.fixed = Some(true);
}

/// Render the remediation prompt for a single issue.
pub fn build_prompt(engine: &PromptEngine, issue: &Issue) -> Result<String> {
    engine.render_issue(issue)
}

/// Mark every issue at `indices` fixed and return their prompts in the same order.
///
/// Prompts are rendered before any flag is set, so a template failure leaves the
/// report untouched.
pub fn annotate(report: &mut Report, indices: &[usize], engine: &PromptEngine) -> Result<Vec<String>> {
    let targets: Vec<&Issue> = indices.iter().map(|&idx| &report.issues[idx]).collect();
    let prompts = engine.render_issues(&targets)?;

    for &idx in indices {
        let issue = &mut report.issues[idx];
        mark_fixed(issue);
        debug!(
            category = issue.category(),
            file = issue.main_event_file_pathname.as_deref().unwrap_or(""),
            line = ?issue.main_event_line_number,
            "issue marked fixed"
        );
    }

    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::parse_report;
    use std::fs;
    use tempfile::TempDir;

    fn report() -> Report {
        parse_report(
            r#"{"issues": [
                {"checkerName": "A", "mainEventFilePathname": "one.c"},
                {"checkerName": "B", "mainEventFilePathname": "two.c"},
                {"checkerName": "A", "mainEventFilePathname": "three.c"}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_mark_fixed_idempotent() {
        let mut issue = Issue::default();
        mark_fixed(&mut issue);
        mark_fixed(&mut issue);
        assert_eq!(issue.fixed, Some(true));
    }

    #[test]
    fn test_mark_fixed_replaces_unreadable_flag() {
        let mut report = parse_report(r#"{"issues": [{"checkerName": "A", "fixed": "no"}]}"#).unwrap();
        mark_fixed(&mut report.issues[0]);
        assert!(report.issues[0].extra.get("fixed").is_none());

        let written: serde_json::Value =
            serde_json::from_str(&crate::report::render_report(&report).unwrap()).unwrap();
        assert_eq!(written["issues"][0]["fixed"], true);
    }

    #[test]
    fn test_build_prompt_uses_engine() {
        let issue = Issue {
            function_display_name: Some("main".to_string()),
            ..Default::default()
        };
        let prompt = build_prompt(&PromptEngine::default(), &issue).unwrap();
        assert!(prompt.contains("function main"));
    }

    #[test]
    fn test_annotate_marks_only_targets() {
        let mut report = report();
        let prompts = annotate(&mut report, &[0, 2], &PromptEngine::default()).unwrap();

        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("one.c"));
        assert!(prompts[1].contains("three.c"));
        assert!(report.issues[0].is_fixed());
        assert!(report.issues[1].fixed.is_none());
        assert!(report.issues[2].is_fixed());
    }

    #[test]
    fn test_annotate_render_failure_leaves_flags() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fix-issue.md"), "{{ nope }}").unwrap();
        let engine = PromptEngine::new(Some(dir.path().to_path_buf()));

        let mut report = report();
        assert!(annotate(&mut report, &[0], &engine).is_err());
        assert!(report.issues.iter().all(|i| i.fixed.is_none()));
    }
}
