use indoc::indoc;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const ECHO: &str = indoc! {r#"
    (module
      (import "env" "memory" (memory 1))
      (import "env" "print" (func $print (param i32 i32)))
      (import "env" "print_i64" (func $print_i64 (param i64)))
      (import "env" "input_i64" (func $input_i64 (result i64)))
      (data (i32.const 0) "sum")
      (func (export "main")
        (call $print (i32.const 0) (i32.const 3))
        (call $print_i64 (i64.add (call $input_i64) (call $input_i64)))))
"#};

fn write_module(dir: &TempDir, wat: &str) -> std::path::PathBuf {
    let path = dir.path().join("module.wat");
    fs::write(&path, wat).unwrap();
    path
}

fn runner(module: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_env-runner"))
        .args(args)
        .arg(module)
        .env_remove("RUST_LOG")
        .env_remove("ENV_RUNNER_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // the runner may exit before reading all of its input
    let _ = child.stdin.take().unwrap().write_all(stdin.as_bytes());
    child.wait_with_output().unwrap()
}

#[test]
fn runs_main() {
    let dir = TempDir::new().unwrap();
    let module = write_module(&dir, ECHO);

    let out = runner(&module, &[], "40 2\n");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "sum\n42\n");
}

#[test]
fn prompts_on_request() {
    let dir = TempDir::new().unwrap();
    let module = write_module(&dir, ECHO);

    let out = runner(&module, &["--prompt", "always"], "1\n2\n");
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "sum\ninput int: input int: 3\n"
    );
}

#[test]
fn invalid_input_traps() {
    let dir = TempDir::new().unwrap();
    let module = write_module(&dir, ECHO);

    let out = runner(&module, &[], "abc\n");
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "sum\n");
    assert!(String::from_utf8_lossy(&out.stderr).contains("Invalid input"));
}

#[test]
fn invalid_input_aborts() {
    let dir = TempDir::new().unwrap();
    let module = write_module(&dir, ECHO);

    let out = runner(&module, &["--invalid-input", "abort"], "");
    assert!(!out.status.success());
    assert_ne!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Invalid input"));
}

#[test]
fn entry_result_is_exit_code() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        &dir,
        indoc! {r#"
            (module
              (func (export "start") (result i32)
                (i32.const 7)))
        "#},
    );

    let out = runner(&module, &["--entry", "start"], "");
    assert_eq!(out.status.code(), Some(7));
}

#[test]
fn out_of_range_entry_result_fails() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        &dir,
        indoc! {r#"
            (module
              (func (export "main") (result i32)
                (i32.const 256)))
        "#},
    );

    let out = runner(&module, &[], "");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn default_memory_cap_applies() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        &dir,
        indoc! {r#"
            (module
              (import "env" "memory" (memory 1))
              (func (export "main") (result i32)
                (i32.eqz (i32.eq (memory.grow (i32.const 100)) (i32.const -1)))))
        "#},
    );

    // growing from 1 to 101 pages exceeds the default cap of 100
    let out = runner(&module, &[], "");
    assert_eq!(out.status.code(), Some(0));

    let out = runner(&module, &["--max-pages", "200"], "");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn config_file() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        &dir,
        indoc! {r#"
            (module
              (import "env" "print_bool" (func $print_bool (param i32)))
              (import "host" "missing" (func $missing))
              (func (export "start")
                (call $print_bool (i32.const -3))))
        "#},
    );
    let config = dir.path().join("runner.toml");
    fs::write(
        &config,
        indoc! {r#"
            entry = "start"
            trap-unknown-imports = true
        "#},
    )
    .unwrap();

    let out = runner(&module, &["--config", config.to_str().unwrap()], "");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "True\n");
}

#[test]
fn memory_cap_below_minimum_fails() {
    let dir = TempDir::new().unwrap();
    let module = write_module(
        &dir,
        indoc! {r#"
            (module
              (import "env" "memory" (memory 16))
              (func (export "main")))
        "#},
    );

    let out = runner(&module, &["--max-pages", "8"], "");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn missing_module_fails() {
    let dir = TempDir::new().unwrap();
    let out = runner(&dir.path().join("nope.wasm"), &[], "");
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}
