//! Skip filter for extracted records
//!
//! Rules run in a fixed order and the first hit decides; the returned
//! [`SkipReason`] is only used for debug logging.

use crate::config::FilterConfig;
use crate::extract::RecordDecl;
use std::fmt;

/// Why a record was not extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NameLength(usize),
    NoisePrefix(String),
    NoiseName,
    SystemHeader(String),
    RuntimeNamespace,
    ForwardDeclaration,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NameLength(len) => write!(f, "name length {}", len),
            SkipReason::NoisePrefix(prefix) => write!(f, "noise prefix '{}'", prefix),
            SkipReason::NoiseName => write!(f, "noise name"),
            SkipReason::SystemHeader(root) => write!(f, "system header under {}", root),
            SkipReason::RuntimeNamespace => write!(f, "scripting runtime type"),
            SkipReason::ForwardDeclaration => write!(f, "forward declaration"),
        }
    }
}

/// Ordered record filter over a [`FilterConfig`]
#[derive(Debug, Clone, Copy)]
pub struct SkipFilter<'c> {
    config: &'c FilterConfig,
}

impl<'c> SkipFilter<'c> {
    pub fn new(config: &'c FilterConfig) -> Self {
        Self { config }
    }

    /// Check a record with its qualified name; `Err` carries the first rule hit
    pub fn check(&self, record: &RecordDecl, qualified: &str) -> Result<(), SkipReason> {
        let name = record.name.as_str();
        let len = name.chars().count();
        if len <= self.config.min_name_len || len > self.config.max_name_len {
            return Err(SkipReason::NameLength(len));
        }

        if let Some(prefix) = self
            .config
            .deny_prefixes
            .iter()
            .find(|p| name.starts_with(p.as_str()) || qualified.starts_with(p.as_str()))
        {
            return Err(SkipReason::NoisePrefix(prefix.clone()));
        }
        if self.config.deny_names.iter().any(|n| n == name) {
            return Err(SkipReason::NoiseName);
        }

        if let Some(root) = self
            .config
            .system_roots
            .iter()
            .find(|root| record.file.starts_with(root.as_str()))
        {
            return Err(SkipReason::SystemHeader(root.clone()));
        }

        if self.is_runtime(name, qualified) {
            return Err(SkipReason::RuntimeNamespace);
        }

        if !record.is_definition {
            return Err(SkipReason::ForwardDeclaration);
        }

        Ok(())
    }

    /// Whether a name belongs to the scripting runtime's own implementation
    fn is_runtime(&self, name: &str, qualified: &str) -> bool {
        let in_namespace = qualified
            .split("::")
            .any(|segment| self.config.runtime_namespaces.iter().any(|ns| ns == segment));

        in_namespace
            || self
                .config
                .runtime_name_prefixes
                .iter()
                .any(|p| name.starts_with(p.as_str()))
    }
}
