//! Sol-Weld: C++ to sol2 Lua binding generator
//!
//! A two-stage pipeline. Stage 1 parses a C++ translation unit, filters its
//! records and writes them as a JSON intermediate representation. Stage 2
//! reads that IR, tags methods and classes with semantic flags, decides what
//! is worth binding and emits `lua->new_usertype<T>(...)` registration
//! blocks, synthesizing adapters where a member pointer cannot be bound
//! directly.
//!
//! # Architecture
//!
//! - `ir`: Intermediate representation, type-text helpers and the IR document
//! - `extract`: Declaration tree, skip filter, compile flags and frontends
//! - `classify`: Keyword heuristics producing the derived IR flags
//! - `select`: Per-class binding decisions and the per-method skip rule
//! - `codegen`: sol2 registration blocks and adapter lambdas
//! - `config`: Every table and cap the stages consult
//! - `pipeline`: Stage helpers used by the binaries
//!
//! # Usage
//!
//! ```rust,ignore
//! use sol_weld::{pipeline, WeldConfig};
//!
//! let config = WeldConfig::default();
//! let ir = sol_weld::ir::read_ir("classes.json")?;
//! let generated = pipeline::generate(ir, &config);
//! std::fs::write("bindings_auto.h", generated.source)?;
//! ```

pub mod classify;
pub mod codegen;
pub mod config;
pub mod error;
pub mod extract;
pub mod ir;
pub mod pipeline;
pub mod select;

// Re-export commonly used types
pub use codegen::{to_lua_name, Sol2Generator};
pub use config::WeldConfig;
pub use error::{WeldError, WeldResult};
pub use extract::{Decl, Extractor, Frontend, ParseMode};
pub use ir::{ClassInfo, Field, IrMap, Method, Parameter, Visibility};
pub use select::{BindingKind, BindingPlan, Selector};

#[cfg(feature = "libclang")]
pub use extract::ClangFrontend;
