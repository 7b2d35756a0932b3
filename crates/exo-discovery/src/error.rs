//! Error types for plugin discovery.

use std::path::PathBuf;

/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Errors that abort discovery of a plugin root.
#[derive(thiserror::Error, Debug)]
pub enum DiscoveryError {
    /// A manifest line does not hold a checksum and a file name.
    ///
    /// The whole manifest is rejected; no line is skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_discovery::{read_manifest, DiscoveryError};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let dir = tempfile::tempdir()?;
    /// let path = dir.path().join("checksums");
    /// std::fs::write(&path, "deadbeef\n")?;
    ///
    /// let result = read_manifest(&path);
    /// assert!(matches!(result, Err(DiscoveryError::InvalidManifestLine { line: 1, .. })));
    /// # Ok(())
    /// # }
    /// ```
    #[error("invalid number of fields in checksum file {} (line {line})", path.display())]
    InvalidManifestLine {
        /// Manifest path
        path: PathBuf,
        /// One-based line number
        line: usize,
    },

    /// A manifest exists but cannot be read.
    #[error("cannot read checksum file {}: {source}", path.display())]
    ManifestRead {
        /// Manifest path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A category directory exists but cannot be inspected.
    #[error("checking directory {} failed: {source}", path.display())]
    CategoryDir {
        /// Category directory path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The directory walk itself failed.
    #[error("path cannot be walked: {source}")]
    Walk {
        /// Underlying walk error, carrying the failing path
        #[from]
        source: walkdir::Error,
    },
}

impl DiscoveryError {
    /// Returns `true` if the error comes from a malformed or unreadable
    /// manifest.
    #[must_use]
    pub const fn is_manifest_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidManifestLine { .. } | Self::ManifestRead { .. }
        )
    }

    /// Returns the path the error relates to, when known.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::InvalidManifestLine { path, .. }
            | Self::ManifestRead { path, .. }
            | Self::CategoryDir { path, .. } => Some(path),
            Self::Walk { source } => source.path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_line_error_display() {
        let err = DiscoveryError::InvalidManifestLine {
            path: PathBuf::from("/plugins/inputs/checksums"),
            line: 3,
        };
        let display = err.to_string();
        assert!(display.contains("/plugins/inputs/checksums"));
        assert!(display.contains("line 3"));
        assert!(err.is_manifest_error());
    }

    #[test]
    fn test_category_dir_error_is_not_manifest_error() {
        let err = DiscoveryError::CategoryDir {
            path: PathBuf::from("/plugins/inputs"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(!err.is_manifest_error());
        assert_eq!(err.path(), Some(std::path::Path::new("/plugins/inputs")));
    }
}
