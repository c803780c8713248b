//! Code generation for sol2 registrations
//!
//! This module provides:
//! - the usertype block generator (`sol2`)
//! - forwarding lambda synthesis for methods needing marshalling (`adapter`)

pub mod adapter;
pub mod sol2;

pub use adapter::{needs_adapter, to_string_adapter, AdapterGenerator};
pub use sol2::{to_lua_name, Sol2Generator};
