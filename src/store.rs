use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::report::{Report, parse_report, render_report};

/// Holds the defect report in memory between requests.
pub struct ReportStore {
    report_path: PathBuf,
    report: Option<Report>,
}

impl ReportStore {
    pub fn new(report_path: impl Into<PathBuf>) -> Self {
        Self {
            report_path: report_path.into(),
            report: None,
        }
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    pub fn is_loaded(&self) -> bool {
        self.report.is_some()
    }

    /// Read and parse the report at `path`, replacing whatever is currently held.
    /// On failure the previously held report (if any) is kept.
    pub fn load(&mut self, path: &Path) -> Result<&mut Report> {
        if !path.exists() {
            return Err(Error::ReportNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidReport(format!("failed to read {}: {e}", path.display()))
        })?;
        let report = parse_report(&content)?;
        info!(path = %path.display(), issues = report.issues.len(), "report loaded");

        Ok(self.report.insert(report))
    }

    /// The held report, loading it from the configured path on first use.
    pub fn data(&mut self) -> Result<&mut Report> {
        if self.report.is_none() {
            let path = self.report_path.clone();
            return self.load(&path);
        }
        debug!("reusing loaded report");
        self.report
            .as_mut()
            .ok_or_else(|| Error::InvalidReport("no report loaded".to_string()))
    }

    /// Write the held report to `path`, overwriting any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let report = self
            .report
            .as_ref()
            .ok_or_else(|| Error::InvalidReport("no report loaded".to_string()))?;

        let content = render_report(report)?;
        std::fs::write(path, content).map_err(|e| {
            Error::InvalidReport(format!("failed to write {}: {e}", path.display()))
        })?;

        info!(path = %path.display(), "report saved");
        Ok(())
    }
}
