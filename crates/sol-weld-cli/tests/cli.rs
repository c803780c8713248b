//! Exit-code behaviour of the two binaries

use sol_weld::ir::write_ir;
use sol_weld::{ClassInfo, IrMap, Method, Parameter};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn run_gen(ir: &Path, output: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sol-weld-gen"))
        .arg(ir)
        .arg(output)
        .env_remove("SOL_WELD_LOG")
        .output()
        .unwrap()
}

fn run_extract(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sol-weld-extract"))
        .args(args)
        .env_remove("SOL_WELD_LOG")
        .output()
        .unwrap()
}

fn pen_ir() -> IrMap {
    let pen = ClassInfo::new("Pen", "gfx::Pen")
        .with_constructor(Method::constructor("Pen"))
        .with_method(Method::new("Width", "int").with_const(true))
        .with_method(Method::new("SetWidth", "void").with_param(Parameter::new("w", "int")))
        .with_method(Method::new("Style", "int").with_const(true));

    let mut ir = IrMap::new();
    ir.insert(pen.qualified_name.clone(), pen);
    ir
}

#[test]
fn test_gen_writes_bindings() {
    let dir = tempdir().unwrap();
    let ir_path = dir.path().join("classes.json");
    let out_path = dir.path().join("bindings_auto.h");
    write_ir(&ir_path, &pen_ir()).unwrap();

    let output = run_gen(&ir_path, &out_path);
    assert_eq!(output.status.code(), Some(0));

    let written = fs::read_to_string(&out_path).unwrap();
    assert!(written.contains("lua->new_usertype<gfx::Pen>(\"Pen\","));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Bound 1 classes"));
}

#[test]
fn test_gen_fails_on_empty_ir() {
    let dir = tempdir().unwrap();
    let ir_path = dir.path().join("classes.json");
    let out_path = dir.path().join("bindings_auto.h");
    fs::write(&ir_path, r#"{"classes":{}}"#).unwrap();

    assert_eq!(run_gen(&ir_path, &out_path).status.code(), Some(1));
    assert!(!out_path.exists());
}

#[test]
fn test_gen_fails_on_malformed_ir() {
    let dir = tempdir().unwrap();
    let ir_path = dir.path().join("classes.json");
    let out_path = dir.path().join("bindings_auto.h");
    fs::write(&ir_path, "not json at all").unwrap();

    assert_eq!(run_gen(&ir_path, &out_path).status.code(), Some(1));
    assert!(!out_path.exists());
}

#[test]
fn test_gen_fails_on_missing_ir() {
    let dir = tempdir().unwrap();
    let output = run_gen(&dir.path().join("absent.json"), &dir.path().join("out.h"));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_extract_requires_output() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("pen.h");
    fs::write(&source, "class Pen {};").unwrap();

    let output = run_extract(&[source.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("-o"));
}

#[test]
fn test_extract_fails_when_nothing_extracted() {
    // Fails the same way whether or not libclang can be loaded
    let dir = tempdir().unwrap();
    let source = dir.path().join("empty.h");
    let ir_path = dir.path().join("classes.json");
    fs::write(&source, "// no declarations\n").unwrap();

    let output = run_extract(&[source.to_str().unwrap(), "-o", ir_path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!ir_path.exists());
}
