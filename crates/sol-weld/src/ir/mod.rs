//! Intermediate Representation (IR) for extracted C++ classes
//!
//! This module provides the record types passed between extraction and
//! generation, the type-text helpers both sides share, and the JSON
//! interchange document that connects the two stages.

pub mod class;
pub mod document;
pub mod symbol;
pub mod types;

pub use class::*;
pub use document::{read_ir, write_ir};
pub use symbol::*;
pub use types::{Marshal, TypeCleaner};
