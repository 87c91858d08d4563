use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cmd::{
    self, inspect::InspectArgs, render::RenderArgs, schema::SchemaArgs, submit::SubmitArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "dynaform",
    about = "Inspect, render and submit schema-driven form definitions",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the JSON Schema of a form definition
    Schema(SchemaArgs),
    /// Summarise the fields and rules of a form definition
    Inspect(InspectArgs),
    /// Print the renderer payload of a form, optionally after applying edits
    Render(RenderArgs),
    /// Apply edits, validate and print the submitted output
    Submit(SubmitArgs),
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Schema(args) => cmd::schema::run(&args),
        Commands::Inspect(args) => cmd::inspect::run(&args),
        Commands::Render(args) => cmd::render::run(&args),
        Commands::Submit(args) => cmd::submit::run(&args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}
