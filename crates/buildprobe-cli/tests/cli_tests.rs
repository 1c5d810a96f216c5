//! Integration tests for buildprobe-cli.
//!
//! Archives are generated in memory, and `run` tests stick to scenarios that
//! never reach the network.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use buildprobe_core::test_utils::TarTestBuilder;
use buildprobe_core::test_utils::gzip;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

fn buildprobe_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("buildprobe");
    cmd.env_remove("RUST_LOG").env_remove("BUILDPROBE_CACHE_DIR");
    cmd
}

fn write_archive(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

/// Seeds `cache` with a tarball for `pip`, so nothing is downloaded.
fn seed_pip(cache: &Path) {
    fs::create_dir_all(cache).unwrap();
    let tarball = gzip(
        &TarTestBuilder::new()
            .add_directory("pip-20.2.1/")
            .add_file("pip-20.2.1/setup.py", b"")
            .build(),
    );
    fs::write(cache.join("pip-20.2.1.tar.gz"), tarball).unwrap();
}

#[test]
fn test_version_flag() {
    buildprobe_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("buildprobe"));
}

#[test]
fn test_help_lists_commands() {
    buildprobe_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("projects"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_extract_creates_files() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "sample.tar.gz",
        &gzip(
            &TarTestBuilder::new()
                .add_file("a/b.txt", b"hello")
                .add_directory("a/c/")
                .build(),
        ),
    );
    let out = temp.path().join("out");

    buildprobe_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Extraction complete"));

    assert_eq!(fs::read_to_string(out.join("a/b.txt")).unwrap(), "hello");
    assert!(out.join("a/c").is_dir());
}

#[test]
fn test_extract_json_output() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "sample.tar",
        &TarTestBuilder::new()
            .add_file("one.txt", b"1")
            .add_file("two.txt", b"22")
            .build(),
    );

    let output = buildprobe_cmd()
        .arg("--json")
        .arg("extract")
        .arg(&archive)
        .arg(temp.path().join("out"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["operation"], "extract");
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["files_extracted"], 2);
    assert_eq!(json["data"]["bytes_written"], 3);
}

#[test]
fn test_extract_rejects_traversal() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "evil.tar.gz",
        &gzip(&TarTestBuilder::new().add_file("../escape.txt", b"pwned").build()),
    );
    let out = temp.path().join("out");

    buildprobe_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("path traversal"))
        .stderr(predicate::str::contains("evil.tar.gz"))
        .stderr(predicate::str::contains("HINT"));

    assert!(!temp.path().join("escape.txt").exists());
    assert!(!out.exists());
}

#[test]
fn test_extract_strict_refuses_symlink() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(
        temp.path(),
        "links.tar",
        &TarTestBuilder::new()
            .add_file("a.txt", b"a")
            .add_symlink("b.txt", "a.txt")
            .build(),
    );

    buildprobe_cmd()
        .arg("extract")
        .arg("--strict")
        .arg(&archive)
        .arg(temp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--strict"));
}

#[test]
fn test_extract_unsupported_format() {
    let temp = TempDir::new().unwrap();
    let archive = write_archive(temp.path(), "notes.txt", b"just some text");

    buildprobe_cmd()
        .arg("extract")
        .arg(&archive)
        .arg(temp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_projects_lists_registry() {
    buildprobe_cmd()
        .arg("projects")
        .assert()
        .success()
        .stdout(predicate::str::contains("dateutil"))
        .stdout(predicate::str::contains("pip"))
        .stdout(predicate::str::contains("Solaar"))
        .stdout(predicate::str::contains("flit"));
}

#[test]
fn test_projects_json() {
    let output = buildprobe_cmd().args(["--json", "projects"]).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    let projects = json["data"].as_array().unwrap();
    assert_eq!(projects.len(), 4);
    assert_eq!(projects[3]["name"], "flit");
    assert_eq!(
        projects[3]["url"],
        "https://github.com/takluyver/flit/archive/2.3.0.tar.gz"
    );
}

#[test]
fn test_fetch_unknown_project() {
    buildprobe_cmd()
        .args(["fetch", "numpy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown project 'numpy'"))
        .stderr(predicate::str::contains("HINT"));
}

#[test]
fn test_fetch_uses_cache() {
    let temp = TempDir::new().unwrap();
    let cache = temp.path().join("cache");
    seed_pip(&cache);

    buildprobe_cmd()
        .args(["--quiet", "fetch", "pip", "--cache-dir"])
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains("pip-20.2.1.tar.gz"));
}

#[test]
fn test_fetch_cache_dir_from_env() {
    let temp = TempDir::new().unwrap();
    let cache = temp.path().join("env-cache");
    seed_pip(&cache);

    buildprobe_cmd()
        .env("BUILDPROBE_CACHE_DIR", &cache)
        .args(["fetch", "pip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("env-cache"));
}

#[test]
fn test_run_skips_missing_entrypoint() {
    let temp = TempDir::new().unwrap();

    buildprobe_cmd()
        .args(["run", "--project", "pip", "--call", "entrypoint", "--python"])
        .arg(temp.path().join("bin/python3"))
        .arg("--workdir")
        .arg(temp.path().join("work"))
        .arg("--cache-dir")
        .arg(temp.path().join("cache"))
        .assert()
        .success()
        .stdout(predicate::str::contains("pip-isolated-entrypoint"))
        .stdout(predicate::str::contains("pip-no_isolation-entrypoint"))
        .stdout(predicate::str::contains("2 skipped"));
}

#[test]
fn test_run_reports_failed_scenario() {
    let temp = TempDir::new().unwrap();
    let cache = temp.path().join("cache");
    seed_pip(&cache);

    let output = buildprobe_cmd()
        .args(["--json", "run", "-p", "pip", "--call", "module", "--isolation", "isolated"])
        .arg("--python")
        .arg(temp.path().join("missing-python"))
        .arg("--workdir")
        .arg(temp.path().join("work"))
        .arg("--cache-dir")
        .arg(&cache)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["data"][0]["id"], "pip-isolated-module");
    assert_eq!(json["data"][0]["outcome"], "failed");
    assert!(
        json["data"][0]["reason"]
            .as_str()
            .unwrap()
            .contains("failed to start")
    );
    assert!(
        temp.path()
            .join("work/pip-isolated-module/pip/pip-20.2.1/setup.py")
            .is_file()
    );
}
