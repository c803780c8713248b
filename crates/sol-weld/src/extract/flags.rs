//! Compile flag assembly for stage 1
//!
//! The frontend needs include paths, defines and a language standard. They
//! come from a JSON compilation database when one is given, topped up with
//! user include paths, probed library roots and the configured defaults.

use crate::config::FlagsConfig;
use crate::error::{WeldError, WeldResult};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

lazy_static! {
    static ref GNU_STD_REGEX: Regex = Regex::new(r"^-std=gnu\+\+(\w+)$").unwrap();
}

/// One compilation database entry
#[derive(Debug, Clone, Deserialize)]
struct CompileCommand {
    #[serde(default)]
    directory: Option<PathBuf>,
    file: PathBuf,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    arguments: Option<Vec<String>>,
}

impl CompileCommand {
    fn args(&self) -> Vec<String> {
        match (&self.arguments, &self.command) {
            (Some(args), _) => args.clone(),
            (None, Some(command)) => command.split_whitespace().map(str::to_string).collect(),
            (None, None) => Vec::new(),
        }
    }

    fn source_path(&self) -> PathBuf {
        match &self.directory {
            Some(dir) if self.file.is_relative() => dir.join(&self.file),
            _ => self.file.clone(),
        }
    }

    fn matches(&self, source: &Path) -> bool {
        let path = self.source_path();
        path == source || path.ends_with(source) || source.ends_with(&self.file)
    }
}

/// Build the frontend flag list for one source file
///
/// A missing or unusable database degrades to the default flags.
pub fn compile_flags(
    source: &Path,
    database: Option<&Path>,
    include_paths: &[PathBuf],
    config: &FlagsConfig,
) -> Vec<String> {
    let mut retained = match database {
        Some(db) => database_flags(db, source).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring compilation database");
            Vec::new()
        }),
        None => Vec::new(),
    };

    if !retained.iter().any(|f| f.starts_with("-std=")) {
        retained.push(format!("-std={}", config.language_standard));
    }

    let mut flags = Vec::new();

    for dir in include_paths {
        if dir.is_dir() {
            flags.push(format!("-I{}", dir.display()));
        } else {
            warn!(path = %dir.display(), "Include path does not exist");
        }
    }

    for group in &config.probe_include_groups {
        if let Some(dir) = group.iter().find(|d| Path::new(d.as_str()).is_dir()) {
            let already = flags.iter().chain(&retained).any(|f| f.contains(dir.as_str()));
            if !already {
                debug!(path = %dir, "Probed include root");
                flags.push(format!("-I{}", dir));
            }
        }
    }

    if !retained.iter().any(|f| f == "-x") {
        flags.push("-x".to_string());
        flags.push("c++".to_string());
    }
    flags.extend(retained);
    flags.extend(config.defines.iter().map(|d| format!("-D{}", d)));

    debug!(?flags, "Assembled compile flags");
    flags
}

/// Flags retained from the database entry for `source` (or its first entry)
fn database_flags(database: &Path, source: &Path) -> WeldResult<Vec<String>> {
    let text = fs::read_to_string(database).map_err(|e| WeldError::io(database, e))?;
    let entries: Vec<CompileCommand> = serde_json::from_str(&text)
        .map_err(|e| WeldError::CompileDatabase(format!("{}: {}", database.display(), e)))?;

    let entry = entries
        .iter()
        .find(|e| e.matches(source))
        .or_else(|| entries.first())
        .ok_or_else(|| {
            WeldError::CompileDatabase(format!("{} has no entries", database.display()))
        })?;

    Ok(retain_flags(&entry.args(), entry.directory.as_deref()))
}

/// Keep include, define and standard flags, normalising GNU standards
fn retain_flags(args: &[String], directory: Option<&Path>) -> Vec<String> {
    let mut flags = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "-I" || arg == "-isystem" {
            if let Some(dir) = iter.next() {
                let dir = resolve(dir, directory);
                if arg == "-I" {
                    flags.push(format!("-I{}", dir));
                } else {
                    flags.push("-isystem".to_string());
                    flags.push(dir);
                }
            }
        } else if let Some(dir) = arg.strip_prefix("-isystem") {
            flags.push("-isystem".to_string());
            flags.push(resolve(dir, directory));
        } else if let Some(dir) = arg.strip_prefix("-I") {
            flags.push(format!("-I{}", resolve(dir, directory)));
        } else if arg.starts_with("-D") && arg.len() > 2 {
            flags.push(arg.clone());
        } else if arg.starts_with("-std=") {
            flags.push(GNU_STD_REGEX.replace(arg, "-std=c++$1").into_owned());
        }
    }

    flags
}

fn resolve(dir: &str, directory: Option<&Path>) -> String {
    match directory {
        Some(base) if Path::new(dir).is_relative() => base.join(dir).display().to_string(),
        _ => dir.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_probes() -> FlagsConfig {
        FlagsConfig {
            probe_include_groups: Vec::new(),
            ..FlagsConfig::default()
        }
    }

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_retain_flags() {
        let retained = retain_flags(
            &args("clang++ -c -O2 -Iinclude -I /abs -isystem sys -DNDEBUG -std=gnu++17 -Wall a.cpp"),
            Some(Path::new("/build")),
        );
        assert_eq!(
            retained,
            vec![
                "-I/build/include",
                "-I/abs",
                "-isystem",
                "/build/sys",
                "-DNDEBUG",
                "-std=c++17",
            ]
        );
    }

    #[test]
    fn test_defaults_without_database() {
        let flags = compile_flags(Path::new("a.h"), None, &[], &no_probes());
        assert_eq!(
            flags,
            vec![
                "-x",
                "c++",
                "-std=c++17",
                "-DPCL_NO_PRECOMPILE",
                "-DEIGEN_USE_NEW_STDVECTOR",
            ]
        );
    }

    #[test]
    fn test_database_entry_for_source_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("compile_commands.json");
        fs::write(
            &db,
            r#"[
                {"directory": "/b", "file": "other.cpp", "command": "c++ -DOTHER other.cpp"},
                {"directory": "/b", "file": "main.cpp", "arguments": ["c++", "-DMAIN", "-std=c++20", "main.cpp"]}
            ]"#,
        )
        .unwrap();

        let flags = compile_flags(Path::new("/b/main.cpp"), Some(&db), &[], &no_probes());
        assert!(flags.contains(&"-DMAIN".to_string()));
        assert!(!flags.contains(&"-DOTHER".to_string()));
        assert!(flags.contains(&"-std=c++20".to_string()));
        assert!(!flags.contains(&"-std=c++17".to_string()));

        let flags = compile_flags(Path::new("header.h"), Some(&db), &[], &no_probes());
        assert!(flags.contains(&"-DOTHER".to_string()));
    }

    #[test]
    fn test_bad_database_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("compile_commands.json");
        fs::write(&db, "{not json").unwrap();

        let flags = compile_flags(Path::new("a.h"), Some(&db), &[], &no_probes());
        assert!(flags.contains(&"-std=c++17".to_string()));

        let missing = dir.path().join("missing.json");
        let flags = compile_flags(Path::new("a.h"), Some(&missing), &[], &no_probes());
        assert_eq!(flags[0], "-x");
    }

    #[test]
    fn test_include_paths_first_and_existing_only() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let flags = compile_flags(
            Path::new("a.h"),
            None,
            &[dir.path().to_path_buf(), missing],
            &no_probes(),
        );
        assert_eq!(flags[0], format!("-I{}", dir.path().display()));
        assert_eq!(flags[1], "-x");
    }

    #[test]
    fn test_probe_group_first_existing() {
        let dir = tempfile::tempdir().unwrap();
        let config = FlagsConfig {
            probe_include_groups: vec![vec![
                "/definitely/not/here".to_string(),
                dir.path().display().to_string(),
            ]],
            ..FlagsConfig::default()
        };
        let flags = compile_flags(Path::new("a.h"), None, &[], &config);
        assert_eq!(flags[0], format!("-I{}", dir.path().display()));
    }
}
