use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::cli::Cli;
use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "covfix.toml";
pub const DEFAULT_REPORT_PATH: &str = "report.json";
pub const DEFAULT_FIXED_REPORT_PATH: &str = "report_fixed.json";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub report_path: Option<String>,
    pub fixed_report_path: Option<String>,
    pub prompt_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub report_path: PathBuf,
    pub fixed_report_path: PathBuf,
    pub prompt_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            fixed_report_path: PathBuf::from(DEFAULT_FIXED_REPORT_PATH),
            prompt_dir: None,
        }
    }
}

impl Config {
    /// Load the config file and apply CLI overrides.
    ///
    /// An explicit `--config` must exist; the default `covfix.toml` is optional.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match cli.config {
            Some(ref explicit) => {
                let path = Path::new(explicit);
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.to_path_buf()));
                }
                read_config(path)?
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    read_config(path)?
                } else {
                    debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
                    ConfigFile::default()
                }
            }
        };

        let config = merge(file_config, cli);
        validate(&config)?;
        Ok(config)
    }
}

fn read_config(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.report_path.as_os_str().is_empty() {
        return Err(Error::ConfigValidation(
            "report_path must not be empty".to_string(),
        ));
    }
    if config.fixed_report_path.as_os_str().is_empty() {
        return Err(Error::ConfigValidation(
            "fixed_report_path must not be empty".to_string(),
        ));
    }
    if normalize(&config.report_path) == normalize(&config.fixed_report_path) {
        return Err(Error::ConfigValidation(format!(
            "fixed_report_path must differ from report_path ({})",
            config.report_path.display()
        )));
    }
    if let Some(ref dir) = config.prompt_dir
        && dir.as_os_str().is_empty()
    {
        return Err(Error::ConfigValidation(
            "prompt_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Absolute form of `path` with `.` and `..` folded away, used to tell whether two
/// configured paths name the same file. The parent directory is canonicalized when it
/// exists so symlinked directories compare equal too.
fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }

    match (
        cleaned.parent().and_then(|p| p.canonicalize().ok()),
        cleaned.file_name(),
    ) {
        (Some(parent), Some(name)) => parent.join(name),
        _ => cleaned,
    }
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Config {
    Config {
        report_path: PathBuf::from(
            cli.report
                .clone()
                .or(file.report_path)
                .unwrap_or_else(|| DEFAULT_REPORT_PATH.to_string()),
        ),
        fixed_report_path: PathBuf::from(
            cli.fixed_report
                .clone()
                .or(file.fixed_report_path)
                .unwrap_or_else(|| DEFAULT_FIXED_REPORT_PATH.to_string()),
        ),
        prompt_dir: cli.prompt_dir.clone().or(file.prompt_dir).map(PathBuf::from),
    }
}
