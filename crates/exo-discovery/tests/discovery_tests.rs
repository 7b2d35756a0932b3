//! End-to-end discovery over a realistic plugin tree.

#![cfg(unix)]

use exo_core::Category;
use exo_discovery::checksum::sha256_hex;
use exo_discovery::{MANIFEST_FILE, discover};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

fn install(path: &Path, contents: &[u8]) {
    fs::write(path, contents).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn test_manifest_and_executable_are_registered_together() {
    let root = tempfile::tempdir().unwrap();
    let inputs = root.path().join("inputs");
    fs::create_dir(&inputs).unwrap();
    install(&inputs.join("myplugin"), b"#!/bin/sh\n");
    fs::write(
        inputs.join(MANIFEST_FILE),
        "abcdef0123456789  *myplugin\n",
    )
    .unwrap();

    let reg = discover(root.path()).unwrap();

    assert_eq!(reg.executables(Category::Inputs), ["myplugin"]);
    assert_eq!(
        reg.checksum(Category::Inputs, "myplugin"),
        Some("abcdef0123456789")
    );
    assert_eq!(reg.len(), 1);
}

#[test]
fn test_every_category_is_scanned() {
    let root = tempfile::tempdir().unwrap();
    for category in Category::ALL {
        let dir = root.path().join(category.dir_name());
        fs::create_dir(&dir).unwrap();
        install(&dir.join(format!("{category}-plugin")), b"#!/bin/sh\n");
    }

    let reg = discover(root.path()).unwrap();

    assert_eq!(reg.len(), 4);
    assert_eq!(reg.executables(Category::Aggregators), ["aggregators-plugin"]);
}

#[test]
fn test_real_digest_matches_manifest_entry() {
    let root = tempfile::tempdir().unwrap();
    let inputs = root.path().join("inputs");
    fs::create_dir(&inputs).unwrap();
    let body = b"#!/bin/sh\nexit 0\n";
    install(&inputs.join("exact"), body);
    fs::write(
        inputs.join(MANIFEST_FILE),
        format!("{}  exact\n", sha256_hex(body)),
    )
    .unwrap();

    let reg = discover(root.path()).unwrap();
    let expected = reg.checksum(Category::Inputs, "exact").unwrap();
    let actual = exo_discovery::checksum::digest_file(&reg.plugin_path(Category::Inputs, "exact"))
        .unwrap();

    assert_eq!(hex::encode(actual), expected);
}

#[test]
fn test_registration_serializes_by_category_name() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir(root.path().join("inputs")).unwrap();
    install(&root.path().join("inputs/cpu"), b"#!/bin/sh\n");

    let reg = discover(root.path()).unwrap();
    let json = serde_json::to_value(&reg).unwrap();

    assert_eq!(json["categories"]["inputs"]["executables"][0], "cpu");
    assert!(json["categories"]["outputs"]["executables"]
        .as_array()
        .unwrap()
        .is_empty());
}
