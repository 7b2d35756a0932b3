//! Launch failure paths exercised against shell-script plugins.

#![cfg(unix)]

use exo_bridge::{LaunchConfig, LaunchError, PluginLauncher};
use exo_discovery::checksum::sha256_hex;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn config() -> LaunchConfig {
    LaunchConfig::default().with_start_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn test_checksum_mismatch_never_spawns() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let path = script(
        dir.path(),
        "mock",
        &format!("touch {}\nexec sleep 5", marker.display()),
    );

    let launcher = PluginLauncher::new("mock", &path, config())
        .with_checksum(sha256_hex(b"some other binary"));
    let err = launcher.launch().await.unwrap_err();

    match &err {
        LaunchError::ChecksumMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, &sha256_hex(b"some other binary"));
            assert_eq!(actual, &sha256_hex(&fs::read(&path).unwrap()));
        }
        other => panic!("expected checksum mismatch, got {other:?}"),
    }
    assert!(err.is_checksum_error());
    assert!(err.is_pre_spawn());
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_invalid_checksum_text_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = script(dir.path(), "mock", "exec sleep 5");

    let launcher = PluginLauncher::new("mock", &path, config()).with_checksum("not-hex");
    let err = launcher.launch().await.unwrap_err();

    assert!(matches!(err, LaunchError::InvalidChecksum { .. }));
}

#[tokio::test]
async fn test_matching_checksum_proceeds_to_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("spawned");
    let path = script(
        dir.path(),
        "mock",
        &format!("touch {}\nexit 0", marker.display()),
    );
    let digest = sha256_hex(&fs::read(&path).unwrap()).to_uppercase();

    let launcher = PluginLauncher::new("mock", &path, config()).with_checksum(digest);
    let err = launcher.launch().await.unwrap_err();

    assert!(matches!(err, LaunchError::Handshake(_)), "got {err:?}");
    assert!(marker.exists());
}

#[tokio::test]
async fn test_silent_plugin_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = script(dir.path(), "mock", "exec sleep 5");

    let launcher = PluginLauncher::new(
        "mock",
        &path,
        LaunchConfig::default().with_start_timeout(Duration::from_millis(200)),
    );

    let started = Instant::now();
    let err = launcher.launch().await.unwrap_err();

    assert!(matches!(err, LaunchError::Timeout { .. }), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_garbage_on_stdout_fails_handshake() {
    let dir = tempfile::tempdir().unwrap();
    let path = script(dir.path(), "mock", "echo hello world\nexec sleep 5");

    let launcher = PluginLauncher::new("mock", &path, config());
    let err = launcher.launch().await.unwrap_err();

    assert!(matches!(err, LaunchError::Handshake(_)), "got {err:?}");
    assert!(err.is_handshake_error());
}

#[tokio::test]
async fn test_immediate_exit_fails_handshake() {
    let dir = tempfile::tempdir().unwrap();
    let path = script(dir.path(), "mock", "echo starting >&2\nexit 3");

    let launcher = PluginLauncher::new("mock", &path, config());
    let err = launcher.launch().await.unwrap_err();

    assert!(matches!(err, LaunchError::Handshake(_)), "got {err:?}");
}

#[tokio::test]
async fn test_non_executable_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mock");
    fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    let launcher = PluginLauncher::new("mock", &path, config());
    let err = launcher.launch().await.unwrap_err();

    assert!(matches!(err, LaunchError::Executable(_)));
}

#[tokio::test]
async fn test_missing_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let launcher = PluginLauncher::new("mock", dir.path().join("absent"), config());

    let err = launcher.launch().await.unwrap_err();
    assert!(matches!(err, LaunchError::Executable(_)));
}
