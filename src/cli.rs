use clap::{Parser, Subcommand};

/// covfix: query, summarize and mark static-analysis defects
#[derive(Parser, Debug, Clone)]
#[command(name = "covfix", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    /// Path to config file (default: covfix.toml, optional)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Defect report to read (default: report.json)
    #[arg(long, global = true)]
    pub report: Option<String>,

    /// Where fixed reports are written (default: report_fixed.json)
    #[arg(long, global = true)]
    pub fixed_report: Option<String>,

    /// Directory holding a fix-issue.md prompt override
    #[arg(long, global = true)]
    pub prompt_dir: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Serve query/fix/summary tools over stdin/stdout (default)
    Serve,

    /// Show the first issue in a category
    Query {
        /// Checker name, matched case-insensitively
        category: String,
    },

    /// Mark every issue in a category fixed and print remediation prompts
    Fix {
        /// Checker name, matched case-insensitively
        category: String,
    },

    /// Count issues per category
    Summary,
}
