//! Stage 2: turn an IR document into sol2 registration code

use anyhow::{Context, Result};
use clap::Parser;
use sol_weld::pipeline::run_generate;
use sol_weld_cli::{init_logging, load_config};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "sol-weld-gen")]
#[command(about = "Generate sol2 Lua registrations from a JSON IR", long_about = None)]
#[command(version)]
struct Cli {
    /// IR document written by sol-weld-extract
    ir: PathBuf,
    /// Generated header to write
    output: PathBuf,
    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
    /// TOML file overriding the built-in tables
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let generated = run_generate(&cli.ir, &cli.output, &config)
        .with_context(|| format!("Failed to generate bindings from {}", cli.ir.display()))?;

    println!("Loaded {} classes from {}", generated.total, cli.ir.display());
    println!(
        "Bound {} classes to {}",
        generated.bound,
        cli.output.display()
    );
    Ok(())
}
