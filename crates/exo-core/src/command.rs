//! Executable validation for plugin binaries.
//!
//! The launcher spawns plugin files by absolute path and never through a
//! shell, so validation is about the file itself: it must exist, be a regular
//! file after following symlinks and, on Unix, carry at least one execute bit.
//!
//! # Examples
//!
//! ```
//! use exo_core::validate_executable;
//! use std::path::Path;
//!
//! // Relative paths are rejected before touching the filesystem
//! assert!(validate_executable(Path::new("./plugin")).is_err());
//!
//! // Missing files are rejected
//! assert!(validate_executable(Path::new("/absolutely/missing/plugin")).is_err());
//! ```

use crate::{Error, Result};
use std::path::Path;

/// Validates that `path` points at a launchable plugin executable.
///
/// Checks, in order:
///
/// 1. **Absolute Path**: relative paths would depend on the working directory
/// 2. **File Existence**: the path (after following symlinks) must exist
/// 3. **Regular File**: directories and special files are rejected
/// 4. **Executable**: on Unix, any of the owner/group/other execute bits
///
/// # Errors
///
/// Returns `Error::SecurityViolation` describing the first failed check.
///
/// # Examples
///
/// ```no_run
/// use exo_core::validate_executable;
/// use std::path::Path;
///
/// match validate_executable(Path::new("/opt/exo/plugins/inputs/cpu")) {
///     Ok(()) => println!("plugin can be launched"),
///     Err(e) => eprintln!("refusing to launch: {e}"),
/// }
/// ```
pub fn validate_executable(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::SecurityViolation {
            reason: "Plugin path cannot be empty".into(),
        });
    }

    if !path.is_absolute() {
        return Err(Error::SecurityViolation {
            reason: format!("Plugin path must be absolute, got: {}", path.display()),
        });
    }

    let metadata = std::fs::metadata(path).map_err(|e| Error::SecurityViolation {
        reason: format!("Plugin file does not exist: {} ({e})", path.display()),
    })?;

    if !metadata.is_file() {
        return Err(Error::SecurityViolation {
            reason: format!("Plugin path is not a file: {}", path.display()),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(Error::SecurityViolation {
                reason: format!("Plugin file is not executable: {}", path.display()),
            });
        }
    }

    Ok(())
}
