pub mod cli;
pub mod config;
pub mod error;
pub mod fix;
pub mod handlers;
pub mod prompts;
pub mod query;
pub mod report;
pub mod server;
pub mod store;
