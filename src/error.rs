use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("report not found: {0}")]
    ReportNotFound(PathBuf),

    #[error("invalid report: {0}")]
    InvalidReport(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("prompt error: {0}")]
    Prompt(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Report errors are shown to callers verbatim; everything else is unexpected.
    pub fn is_domain(&self) -> bool {
        matches!(self, Error::ReportNotFound(_) | Error::InvalidReport(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
