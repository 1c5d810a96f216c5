//! End-to-end extraction tests against real temporary directories.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use buildprobe_core::ArchiveSource;
use buildprobe_core::ExtractionConfig;
use buildprobe_core::ExtractionError;
use buildprobe_core::extract;
use buildprobe_core::extract_archive;
use buildprobe_core::test_utils::TarTestBuilder;
use buildprobe_core::test_utils::ZipTestBuilder;
use buildprobe_core::test_utils::gzip;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Maps every path under `root` to its contents (`None` for directories).
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let relative = entry.path().strip_prefix(root).unwrap().to_path_buf();
            let contents = entry
                .file_type()
                .is_file()
                .then(|| fs::read(entry.path()).unwrap());
            (relative, contents)
        })
        .collect()
}

#[test]
fn test_extract_file_and_empty_directory() {
    let temp = TempDir::new().unwrap();
    let archive = gzip(
        &TarTestBuilder::new()
            .add_file("a/b.txt", b"hello")
            .add_directory("a/c/")
            .build(),
    );
    let out = temp.path().join("out");

    let report = extract(
        &ArchiveSource::from_bytes(archive),
        &out,
        &ExtractionConfig::default(),
    )
    .unwrap();

    assert_eq!(fs::read_to_string(out.join("a/b.txt")).unwrap(), "hello");
    assert!(out.join("a/c").is_dir());
    assert_eq!(fs::read_dir(out.join("a/c")).unwrap().count(), 0);

    assert_eq!(report.files_extracted, 1);
    assert_eq!(report.bytes_written, 5);
    let root = out.canonicalize().unwrap();
    assert!(report.extracted.contains(&root.join("a/b.txt")));
    assert!(report.extracted.contains(&root.join("a/c")));
    assert!(report.extracted.iter().all(|p| p.starts_with(&root)));
}

#[test]
fn test_github_style_tarball_from_file() {
    let temp = TempDir::new().unwrap();
    let tarball = temp.path().join("dateutil-2.8.1.tar.gz");
    fs::write(
        &tarball,
        gzip(
            &TarTestBuilder::new()
                .add_pax_global_header("comment=6f3a4c1e9b2d7a8f5e0c3b1d4a6e8f2c9b7d5a3e")
                .add_directory("dateutil-2.8.1/")
                .add_file("dateutil-2.8.1/setup.py", b"from setuptools import setup\n")
                .add_directory("dateutil-2.8.1/dateutil/")
                .add_file("dateutil-2.8.1/dateutil/__init__.py", b"")
                .build(),
        ),
    )
    .unwrap();

    let out = temp.path().join("work/dateutil");
    let report = extract_archive(&tarball, &out, &ExtractionConfig::default()).unwrap();

    assert_eq!(report.files_extracted, 2);
    assert_eq!(report.directories_created, 2);
    assert!(!report.has_warnings());
    assert!(out.join("dateutil-2.8.1/setup.py").is_file());
    assert!(!out.join("pax_global_header").exists());
}

#[cfg(unix)]
#[test]
fn test_same_archive_twice_gives_identical_trees() {
    let temp = TempDir::new().unwrap();
    let archive = gzip(
        &TarTestBuilder::new()
            .add_directory("pkg/")
            .add_file("pkg/one.txt", b"1")
            .add_file("pkg/sub/two.txt", b"22")
            .add_symlink("pkg/alias.txt", "one.txt")
            .build(),
    );
    let source = ArchiveSource::from_bytes(archive);

    let first = temp.path().join("first");
    let second = temp.path().join("second");
    extract(&source, &first, &ExtractionConfig::default()).unwrap();
    extract(&source, &second, &ExtractionConfig::default()).unwrap();

    assert_eq!(snapshot(&first), snapshot(&second));
}

#[test]
fn test_extract_over_existing_tree() {
    let temp = TempDir::new().unwrap();
    let archive = TarTestBuilder::new()
        .add_directory("a/")
        .add_file("a/b.txt", b"new")
        .build();
    let out = temp.path().join("out");
    fs::create_dir_all(out.join("a")).unwrap();
    fs::write(out.join("a/b.txt"), "old").unwrap();
    fs::write(out.join("a/keep.txt"), "kept").unwrap();

    extract(
        &ArchiveSource::from_bytes(archive),
        &out,
        &ExtractionConfig::default(),
    )
    .unwrap();

    assert_eq!(fs::read_to_string(out.join("a/b.txt")).unwrap(), "new");
    assert_eq!(fs::read_to_string(out.join("a/keep.txt")).unwrap(), "kept");
}

#[test]
fn test_zip_wheel_layout() {
    let temp = TempDir::new().unwrap();
    let wheel = temp.path().join("pkg-1.0-py3-none-any.whl");
    fs::write(
        &wheel,
        ZipTestBuilder::new()
            .add_directory("pkg/")
            .add_file("pkg/__init__.py", b"VERSION = '1.0'\n")
            .add_file("pkg-1.0.dist-info/METADATA", b"Name: pkg\n")
            .build(),
    )
    .unwrap();

    let out = temp.path().join("unpacked");
    let report = extract_archive(&wheel, &out, &ExtractionConfig::default()).unwrap();

    assert_eq!(report.files_extracted, 2);
    assert_eq!(
        fs::read_to_string(out.join("pkg/__init__.py")).unwrap(),
        "VERSION = '1.0'\n"
    );
    assert!(out.join("pkg-1.0.dist-info/METADATA").is_file());
}

#[cfg(unix)]
#[test]
fn test_permissions_preserved_without_special_bits() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let archive = TarTestBuilder::new()
        .add_file_with_mode("bin/tool", b"#!/bin/sh\n", 0o4755)
        .add_file_with_mode("data.txt", b"", 0o600)
        .build();
    let out = temp.path().join("out");

    extract(
        &ArchiveSource::from_bytes(archive),
        &out,
        &ExtractionConfig::default(),
    )
    .unwrap();

    let mode = |p: &str| fs::metadata(out.join(p)).unwrap().permissions().mode() & 0o7777;
    assert_eq!(mode("bin/tool"), 0o755);
    assert_eq!(mode("data.txt"), 0o600);
}

#[cfg(unix)]
#[test]
fn test_directory_entry_over_symlink() {
    let temp = TempDir::new().unwrap();
    let archive = TarTestBuilder::new()
        .add_symlink("a", "sub")
        .add_directory("a/")
        .add_file("a/x.txt", b"x")
        .build();
    let out = temp.path().join("out");

    let report = extract(
        &ArchiveSource::from_bytes(archive),
        &out,
        &ExtractionConfig::default(),
    )
    .expect("directory entry over a link should be tolerated");

    assert!(fs::symlink_metadata(out.join("a")).unwrap().is_symlink());
    assert!(out.join("sub").is_dir());
    assert_eq!(fs::read_to_string(out.join("sub/x.txt")).unwrap(), "x");
    assert_eq!(report.symlinks_created, 1);
}

#[test]
fn test_conflicting_entries_write_nothing() {
    let temp = TempDir::new().unwrap();
    let archive = TarTestBuilder::new()
        .add_file("first.txt", b"1")
        .add_file("a", b"file")
        .add_directory("a/")
        .build();
    let out = temp.path().join("out");

    let err = extract(
        &ArchiveSource::from_bytes(archive),
        &out,
        &ExtractionConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, ExtractionError::InvalidArchive(_)));
    assert!(!err.is_security_violation());
    assert!(!out.exists());
}
