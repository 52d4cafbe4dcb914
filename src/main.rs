use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use covfix::cli::{Cli, CliCommand};
use covfix::config::Config;
use covfix::handlers::ReportContext;
use covfix::server::{ToolServer, serve};

/// Logs go to stderr; stdout carries responses.
fn init_logging() {
    let filter = EnvFilter::try_from_env("COVFIX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    info!(?config, "config loaded");

    let mut ctx = ReportContext::new(&config);

    let response = match cli.command.unwrap_or(CliCommand::Serve) {
        CliCommand::Serve => {
            let mut server = ToolServer::new(ctx);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            if let Err(e) = serve(&mut server, stdin, tokio::io::stdout()).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
            return;
        }
        CliCommand::Query { category } => ctx.query(&category),
        CliCommand::Fix { category } => ctx.fix(&category),
        CliCommand::Summary => ctx.summary(),
    };

    println!("{}", response.to_text());
}
