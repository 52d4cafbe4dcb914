use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fix;
use crate::prompts::PromptEngine;
use crate::query::{Summary, matching_indices, query_by_category, summarize};
use crate::report::Issue;
use crate::store::ReportStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ReportNotFound,
    InvalidReport,
    Unexpected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventsView {
    pub descriptions: Vec<String>,
    pub subcategory: Option<String>,
}

/// The shape a single issue is reported in by `query`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueView {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub file: Option<String>,
    pub line: Option<i64>,
    pub function: Option<String>,
    pub events: EventsView,
}

impl From<&Issue> for IssueView {
    fn from(issue: &Issue) -> Self {
        Self {
            kind: issue.checker_name.clone(),
            file: issue.main_event_file_pathname.clone(),
            line: issue.main_event_line_number,
            function: issue.function_display_name.clone(),
            events: EventsView {
                descriptions: issue
                    .event_descriptions()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                subcategory: issue.subcategory.clone(),
            },
        }
    }
}

/// Result of one request. Always produced, whatever went wrong.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok {
        category: String,
        matches: usize,
        issue: IssueView,
    },
    Fixed {
        category: String,
        fixed_count: usize,
        prompts: Vec<String>,
        saved_to: String,
    },
    Summary {
        total_issues: usize,
        issues_by_type: Summary,
    },
    NoMatch {
        category: String,
        message: String,
    },
    Error {
        kind: ErrorKind,
        error: String,
    },
}

impl Response {
    pub fn no_match(category: &str) -> Self {
        Response::NoMatch {
            category: category.to_string(),
            message: format!("No issues found in category '{category}'."),
        }
    }

    pub fn from_error(err: &Error) -> Self {
        let kind = match err {
            Error::ReportNotFound(_) => ErrorKind::ReportNotFound,
            Error::InvalidReport(_) => ErrorKind::InvalidReport,
            _ => ErrorKind::Unexpected,
        };
        let error = if err.is_domain() {
            err.to_string()
        } else {
            format!("unexpected error: {err}")
        };
        Response::Error { kind, error }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// Pretty JSON text handed back to the caller.
    pub fn to_text(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!(r#"{{"status": "error", "kind": "unexpected", "error": "unexpected error: {e}"}}"#)
        })
    }
}

/// Per-process request context: the loaded report plus where fixes are written.
pub struct ReportContext {
    store: ReportStore,
    fixed_report_path: PathBuf,
    prompts: PromptEngine,
}

impl ReportContext {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(
            ReportStore::new(&config.report_path),
            config.fixed_report_path.clone(),
            PromptEngine::new(config.prompt_dir.clone()),
        )
    }

    pub fn with_parts(
        store: ReportStore,
        fixed_report_path: impl Into<PathBuf>,
        prompts: PromptEngine,
    ) -> Self {
        Self {
            store,
            fixed_report_path: fixed_report_path.into(),
            prompts,
        }
    }

    pub fn report_path(&self) -> &Path {
        self.store.report_path()
    }

    pub fn fixed_report_path(&self) -> &Path {
        &self.fixed_report_path
    }

    /// Drop the held report and read it again from the report path.
    pub fn reload(&mut self) -> Result<usize> {
        let path = self.store.report_path().to_path_buf();
        Ok(self.store.load(&path)?.issues.len())
    }

    pub fn query(&mut self, category: &str) -> Response {
        info!(category, "query");
        finish("query", self.try_query(category))
    }

    pub fn fix(&mut self, category: &str) -> Response {
        info!(category, "fix");
        finish("fix", self.try_fix(category))
    }

    pub fn summary(&mut self) -> Response {
        info!("summary");
        finish("summary", self.try_summary())
    }

    fn try_query(&mut self, category: &str) -> Result<Response> {
        let report = self.store.data()?;
        let found = query_by_category(&report.issues, category);
        let Some(first) = found.first() else {
            return Ok(Response::no_match(category));
        };
        Ok(Response::Ok {
            category: category.to_string(),
            matches: found.len(),
            issue: IssueView::from(*first),
        })
    }

    /// Flags set before a failed save stay set in memory.
    fn try_fix(&mut self, category: &str) -> Result<Response> {
        let report = self.store.data()?;
        let indices = matching_indices(&report.issues, category);
        if indices.is_empty() {
            return Ok(Response::no_match(category));
        }

        let prompts = fix::annotate(report, &indices, &self.prompts)?;
        self.store.save(&self.fixed_report_path)?;
        info!(
            category,
            fixed = indices.len(),
            path = %self.fixed_report_path.display(),
            "issues marked fixed"
        );

        Ok(Response::Fixed {
            category: category.to_string(),
            fixed_count: indices.len(),
            prompts,
            saved_to: self.fixed_report_path.display().to_string(),
        })
    }

    fn try_summary(&mut self) -> Result<Response> {
        let report = self.store.data()?;
        let summary = summarize(&report.issues);
        Ok(Response::Summary {
            total_issues: summary.total(),
            issues_by_type: summary,
        })
    }
}

fn finish(op: &str, result: Result<Response>) -> Response {
    match result {
        Ok(response) => response,
        Err(e) => {
            warn!(op, error = %e, "request failed");
            Response::from_error(&e)
        }
    }
}
