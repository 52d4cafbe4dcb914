#![allow(dead_code)]

use std::path::{Path, PathBuf};

use covfix::handlers::ReportContext;
use covfix::prompts::PromptEngine;
use covfix::store::ReportStore;

/// The single-issue report used throughout the scenario tests.
pub const NULL_DEREF_REPORT: &str = r#"{"issues":[{"checkerName":"NULL_DEREF","mainEventFilePathname":"a.c","mainEventLineNumber":10,"functionDisplayName":"f","subcategory":"deref","events":[{"eventDescription":"ptr may be null"}]}]}"#;

/// Three issues: two in `A`, one in `B`.
pub const TWO_CATEGORY_REPORT: &str = r#"{"issues":[
    {"checkerName":"A","mainEventFilePathname":"x.c","mainEventLineNumber":1},
    {"checkerName":"B","mainEventFilePathname":"y.c","mainEventLineNumber":2},
    {"checkerName":"A","mainEventFilePathname":"z.c","mainEventLineNumber":3}
]}"#;

pub fn report_path(dir: &Path) -> PathBuf {
    dir.join("report.json")
}

pub fn fixed_path(dir: &Path) -> PathBuf {
    dir.join("report_fixed.json")
}

/// Write `report` (if any) into `dir` and build a context over it.
pub fn context_in(dir: &Path, report: Option<&str>) -> ReportContext {
    if let Some(content) = report {
        std::fs::write(report_path(dir), content).unwrap();
    }
    ReportContext::with_parts(
        ReportStore::new(report_path(dir)),
        fixed_path(dir),
        PromptEngine::default(),
    )
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}
