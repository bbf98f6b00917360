//! Black-box tests for the `lzopar` binary driven through
//! `std::process::Command`: the CLI surface and exit-code contract.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tempfile::TempDir;

fn lzopar_bin() -> PathBuf {
    if let Ok(p) = std::env::var("CARGO_BIN_EXE_lzopar") {
        return PathBuf::from(p);
    }
    let mut p = std::env::current_exe().unwrap();
    p.pop();
    if p.ends_with("deps") {
        p.pop();
    }
    p.push("lzopar");
    p
}

fn make_temp_input() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("input.txt");
    let content = "the quick brown fox jumps over the lazy dog\n".repeat(500);
    fs::write(&input_path, content).unwrap();
    (dir, input_path)
}

#[test]
fn compress_decompress_roundtrip_via_default_output_paths() {
    let (dir, input) = make_temp_input();
    let original = fs::read(&input).unwrap();

    let status = Command::new(lzopar_bin())
        .arg(&input)
        .current_dir(dir.path())
        .status()
        .expect("failed to run lzopar compress");
    assert!(status.success());

    let compressed_path = dir.path().join("input.txt.lzo");
    assert!(compressed_path.exists());

    let status = Command::new(lzopar_bin())
        .args(["-d", compressed_path.to_str().unwrap()])
        .current_dir(dir.path())
        .status()
        .expect("failed to run lzopar decompress");
    assert!(status.success());

    let roundtrip_path = dir.path().join("input.txt");
    let roundtrip = fs::read(&roundtrip_path).unwrap();
    assert_eq!(roundtrip, original);
}

#[test]
fn explicit_output_path_and_level_flag_are_honoured() {
    let (dir, input) = make_temp_input();
    let original = fs::read(&input).unwrap();
    let compressed = dir.path().join("out.bin");

    let status = Command::new(lzopar_bin())
        .args([input.to_str().unwrap(), compressed.to_str().unwrap(), "-L", "1k", "-t", "2"])
        .status()
        .expect("failed to run lzopar compress");
    assert!(status.success());
    assert!(compressed.exists());

    let roundtrip = dir.path().join("back.txt");
    let status = Command::new(lzopar_bin())
        .args(["-d", compressed.to_str().unwrap(), roundtrip.to_str().unwrap()])
        .status()
        .expect("failed to run lzopar decompress");
    assert!(status.success());
    assert_eq!(fs::read(&roundtrip).unwrap(), original);
}

#[test]
fn verify_flag_without_output_path_writes_nothing() {
    let (dir, input) = make_temp_input();

    let status = Command::new(lzopar_bin())
        .args([input.to_str().unwrap(), "--verify"])
        .current_dir(dir.path())
        .status()
        .expect("failed to run lzopar --verify");
    assert!(status.success());
    assert!(!dir.path().join("input.txt.lzo").exists());
}

#[test]
fn decompress_and_level_flags_are_mutually_exclusive() {
    let (dir, input) = make_temp_input();
    let output = Command::new(lzopar_bin())
        .args([input.to_str().unwrap(), "-d", "-L", "1"])
        .current_dir(dir.path())
        .output()
        .expect("failed to run lzopar");
    assert!(!output.status.success());
}

#[test]
fn missing_input_file_exits_nonzero_with_a_diagnostic() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(lzopar_bin())
        .arg("does-not-exist.bin")
        .current_dir(dir.path())
        .output()
        .expect("failed to run lzopar");
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}

#[test]
fn tampered_container_is_rejected_with_nonzero_exit_and_no_output_file() {
    let (dir, input) = make_temp_input();

    let compressed = dir.path().join("input.txt.lzo");
    let status = Command::new(lzopar_bin())
        .args([input.to_str().unwrap(), compressed.to_str().unwrap()])
        .status()
        .expect("failed to run lzopar compress");
    assert!(status.success());

    let mut bytes = fs::read(&compressed).unwrap();
    bytes[0] = 0xFF; // corrupt the magic
    fs::write(&compressed, &bytes).unwrap();

    let roundtrip = dir.path().join("back.txt");
    let output = Command::new(lzopar_bin())
        .args(["-d", compressed.to_str().unwrap(), roundtrip.to_str().unwrap()])
        .output()
        .expect("failed to run lzopar decompress");
    assert!(!output.status.success());
    assert!(!roundtrip.exists());
}

#[test]
fn stdin_input_without_explicit_output_is_rejected() {
    let mut child = Command::new(lzopar_bin())
        .args(["-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn lzopar");
    child.stdin.take().unwrap().write_all(b"hello").unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}

#[test]
fn benchmark_flag_does_not_change_the_compressed_output() {
    let (dir, input) = make_temp_input();
    let out_a = dir.path().join("a.lzo");
    let out_b = dir.path().join("b.lzo");

    let status = Command::new(lzopar_bin())
        .args([input.to_str().unwrap(), out_a.to_str().unwrap()])
        .status()
        .unwrap();
    assert!(status.success());

    let status = Command::new(lzopar_bin())
        .args([input.to_str().unwrap(), out_b.to_str().unwrap(), "-b"])
        .status()
        .unwrap();
    assert!(status.success());

    assert_eq!(fs::read(&out_a).unwrap(), fs::read(&out_b).unwrap());
}
