//! planexe-docs CLI - build and preview the PlanExe documentation site.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use planexe_docs_nav::NavError;
use planexe_docs_server::ServeError;
use planexe_docs_static::StageError;

mod commands;
mod output;
mod settings;

use output::Output;
use settings::Settings;

#[derive(Parser)]
#[command(name = "planexe-docs")]
#[command(about = "Build and preview the PlanExe documentation site")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the optional settings file
    #[arg(short, long, default_value = "planexe-docs.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage the PlanExe docs, run mkdocs and publish to site/
    Build,

    /// Serve the built site on the first free local port
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let result = match Settings::load(&cli.config) {
        Ok(settings) => match cli.command {
            Commands::Build => commands::build::run(&settings).await,
            Commands::Serve => commands::serve::run(&settings).await,
        },
        Err(e) => Err(e),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err:#}"));
        if let Some(hint) = hint_for(&err) {
            output.hint(hint);
        }
        std::process::exit(1);
    }
}

/// Pick the follow-up line printed under a fatal error.
fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(e) = err.downcast_ref::<StageError>() {
        return e.hint();
    }
    if let Some(e) = err.downcast_ref::<ServeError>() {
        return e.hint();
    }
    if let Some(NavError::Config(_)) = err.downcast_ref::<NavError>() {
        return Some("Check the YAML syntax of mkdocs.yml");
    }
    None
}
