//! CLI for the CodeSage API server

pub mod serve;

use clap::{Parser, Subcommand};

/// CodeSage API - streaming AI code review backend
#[derive(Parser)]
#[command(name = "codesage-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server (default)
    Serve,
}
