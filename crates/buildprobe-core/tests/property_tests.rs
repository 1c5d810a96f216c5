//! Property-based tests for containment.
//!
//! Whatever entry names an archive carries, extraction either fails or
//! leaves every written path under the destination.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use buildprobe_core::ArchiveSource;
use buildprobe_core::ExtractionConfig;
use buildprobe_core::extract;
use buildprobe_core::is_within_directory;
use buildprobe_core::test_utils::TarTestBuilder;
use proptest::prelude::*;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;
use walkdir::WalkDir;

fn component() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z]{1,6}",
        2 => Just("..".to_string()),
        1 => Just(".".to_string()),
    ]
}

fn entry_path() -> impl Strategy<Value = String> {
    (any::<bool>(), prop::collection::vec(component(), 1..6)).prop_map(|(absolute, parts)| {
        let joined = parts.join("/");
        if absolute { format!("/{joined}") } else { joined }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Extraction never writes outside the destination.
    #[test]
    fn prop_extraction_stays_inside(paths in prop::collection::vec(entry_path(), 1..6)) {
        let temp = TempDir::new().unwrap();
        let sandbox = temp.path().join("sandbox");
        let out = sandbox.join("out");
        std::fs::create_dir_all(&sandbox).unwrap();

        let mut builder = TarTestBuilder::new();
        for (i, path) in paths.iter().enumerate() {
            builder = builder.add_file(path, format!("entry {i}").as_bytes());
        }

        let result = extract(
            &ArchiveSource::from_bytes(builder.build()),
            &out,
            &ExtractionConfig::default(),
        );

        let root = sandbox.canonicalize().unwrap();
        for entry in WalkDir::new(&sandbox).min_depth(1) {
            let entry = entry.unwrap();
            let relative = entry.path().strip_prefix(&sandbox).unwrap();
            prop_assert!(
                relative.starts_with("out"),
                "{} written outside the destination",
                entry.path().display()
            );
        }

        match result {
            Ok(report) => {
                let dest = root.join("out");
                prop_assert!(report.extracted.iter().all(|p| p.starts_with(&dest)));
            }
            Err(e) if e.is_security_violation() => {
                prop_assert!(!out.exists(), "rejected archive created {}: {e}", out.display());
            }
            // Conflicting entries (a file where a directory is needed) fail
            // during the write pass.
            Err(_) => {}
        }
    }

    /// Containment is decided per component, so a sibling sharing a string
    /// prefix is never inside.
    #[test]
    fn prop_sibling_prefix_not_contained(
        base in "[a-z]{1,8}",
        suffix in "[a-z0-9-]{1,8}",
        rest in prop::collection::vec("[a-z]{1,5}", 0..3),
    ) {
        let dir = PathBuf::from("/srv").join(&base);
        let mut sibling = PathBuf::from("/srv").join(format!("{base}{suffix}"));
        sibling.extend(&rest);
        prop_assert!(!is_within_directory(&dir, &sibling));

        let mut child = dir.clone();
        child.extend(&rest);
        prop_assert!(is_within_directory(&dir, &child));
    }

    /// A target that climbs out with leading `..` is never inside.
    #[test]
    fn prop_parent_prefix_escapes(ups in 1usize..5, tail in "[a-z]{1,6}") {
        let dir = Path::new("/srv/dest");
        let target = dir.join("../".repeat(ups)).join(tail);
        prop_assert!(!is_within_directory(dir, &target));
    }
}
