//! Staged pipeline helpers shared by the two binaries
//!
//! Stage 1 runs the extractor and writes the IR document. Stage 2 reads it
//! back, classifies, selects and emits. Each stage hands the next a fresh
//! value; nothing is shared between them but the IR file.

use crate::classify::classify;
use crate::codegen::Sol2Generator;
use crate::config::WeldConfig;
use crate::error::{WeldError, WeldResult};
use crate::extract::{compile_flags, Extractor, Frontend};
use crate::ir::{read_ir, write_ir, IrMap};
use crate::select::Selector;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Stage 1 inputs
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub source: PathBuf,
    pub compile_database: Option<PathBuf>,
    pub include_paths: Vec<PathBuf>,
}

impl ExtractOptions {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            compile_database: None,
            include_paths: Vec::new(),
        }
    }

    pub fn with_compile_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.compile_database = Some(path.into());
        self
    }

    pub fn with_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }
}

/// Extract one source file into an IR map
pub fn extract_file<F: Frontend>(
    frontend: F,
    options: &ExtractOptions,
    config: &WeldConfig,
) -> IrMap {
    let flags = compile_flags(
        &options.source,
        options.compile_database.as_deref(),
        &options.include_paths,
        &config.flags,
    );
    Extractor::new(frontend, config).extract(&options.source, &flags)
}

/// Run stage 1 and write the IR document
///
/// Nothing is written when no class was extracted.
pub fn run_extract<F: Frontend>(
    frontend: F,
    options: &ExtractOptions,
    output: &Path,
    config: &WeldConfig,
) -> WeldResult<IrMap> {
    let ir = extract_file(frontend, options, config);
    if ir.is_empty() {
        return Err(WeldError::Empty(format!(
            "nothing extracted from {}",
            options.source.display()
        )));
    }

    write_ir(output, &ir)?;
    info!(count = ir.len(), output = %output.display(), "Wrote IR document");
    Ok(ir)
}

/// Stage 2 result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Registration source text
    pub source: String,
    /// Classes in the IR
    pub total: usize,
    /// Classes that received a registration block
    pub bound: usize,
}

/// Classify, select and emit an IR map
pub fn generate(ir: IrMap, config: &WeldConfig) -> Generated {
    let total = ir.len();
    let classified = classify(ir, &config.classify);
    let plans = Selector::new(config).select(&classified);
    let source = Sol2Generator::new(&plans, total, config).generate();

    Generated {
        source,
        total,
        bound: plans.len(),
    }
}

/// Run stage 2 from an IR file to an output file
pub fn run_generate(input: &Path, output: &Path, config: &WeldConfig) -> WeldResult<Generated> {
    let ir = read_ir(input)?;
    if ir.is_empty() {
        return Err(WeldError::Empty(format!("{} holds no classes", input.display())));
    }

    info!(count = ir.len(), input = %input.display(), "Loaded IR document");
    let generated = generate(ir, config);
    fs::write(output, &generated.source).map_err(|e| WeldError::io(output, e))?;
    info!(bound = generated.bound, output = %output.display(), "Wrote bindings");
    Ok(generated)
}
