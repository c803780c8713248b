//! Stage 1: extract classes from a C++ source file into an IR document

use anyhow::{Context, Result};
use clap::Parser;
use sol_weld::classify::is_operator_name;
use sol_weld::pipeline::{run_extract, ExtractOptions};
use sol_weld::{ClangFrontend, IrMap, WeldConfig, WeldError};
use sol_weld_cli::{init_logging, load_config};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "sol-weld-extract")]
#[command(about = "Extract C++ classes into a JSON IR for binding generation", long_about = None)]
#[command(version)]
struct Cli {
    /// C++ source or header file
    source: PathBuf,
    /// compile_commands.json to take include paths and defines from
    #[arg(short = 'c', long = "compile-commands")]
    compile_commands: Option<PathBuf>,
    /// IR file to write
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Debug logging and a per-class summary
    #[arg(short, long)]
    verbose: bool,
    /// Extra include directory (repeatable)
    #[arg(long = "include-path", value_name = "DIR")]
    include_paths: Vec<PathBuf>,
    /// TOML file overriding the built-in tables
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let Some(output) = cli.output else {
        eprintln!("Error: an output file is required (-o <ir.json>)");
        return Ok(ExitCode::FAILURE);
    };
    let config = load_config(cli.config.as_deref())?;

    let mut options = ExtractOptions::new(&cli.source);
    if let Some(db) = &cli.compile_commands {
        options = options.with_compile_database(db);
    }
    for dir in &cli.include_paths {
        options = options.with_include_path(dir);
    }

    let ir = match run_extract(ClangFrontend::new(), &options, &output, &config) {
        Ok(ir) => ir,
        Err(WeldError::Empty(message)) => {
            eprintln!("No classes extracted: {}", message);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Extraction from {} failed", cli.source.display()));
        }
    };

    print_summary(&ir, &config, cli.verbose);
    println!("Extracted {} classes to {}", ir.len(), output.display());
    Ok(ExitCode::SUCCESS)
}

fn print_summary(ir: &IrMap, config: &WeldConfig, verbose: bool) {
    if !verbose {
        return;
    }

    let operator_prefix = config.classify.operator_prefix.as_str();

    for (name, class) in ir {
        let operators = class
            .methods
            .iter()
            .filter(|m| is_operator_name(&m.name, operator_prefix))
            .count();
        println!(
            "  {} ({} methods, {} fields, {} operators){}",
            name,
            class.methods.len(),
            class.fields.len(),
            operators,
            if class.has_observable_base { " [observable]" } else { "" }
        );
    }
}
