//! Checksum manifest reader.
//!
//! A manifest is a `checksums` file inside a category directory, in the
//! format produced by `sha256sum`:
//!
//! ```text
//! <hex-digest> <mode><filename>
//! ```
//!
//! where `<mode>` is a space (text) or `*` (binary). Lines starting with `#`
//! and blank lines are ignored.

use crate::error::{DiscoveryError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// File name of the manifest inside each category directory.
pub const MANIFEST_FILE: &str = "checksums";

/// Mapping from executable file name to expected hex digest.
///
/// An empty manifest means no verification was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    /// Parses manifest text.
    ///
    /// `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::InvalidManifestLine` for the first line that
    /// lacks a digest or a file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_discovery::Manifest;
    /// use std::path::Path;
    ///
    /// let text = "# generated\nabcdef0123  *myplugin\n0123abcd  other\n";
    /// let manifest = Manifest::parse(text, Path::new("checksums")).unwrap();
    ///
    /// assert_eq!(manifest.get("myplugin"), Some("abcdef0123"));
    /// assert_eq!(manifest.get("other"), Some("0123abcd"));
    /// assert_eq!(manifest.len(), 2);
    /// ```
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let mut entries = BTreeMap::new();

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let invalid = || DiscoveryError::InvalidManifestLine {
                path: origin.to_path_buf(),
                line: index + 1,
            };

            let (digest, rest) = trimmed.split_once(char::is_whitespace).ok_or_else(invalid)?;
            let rest = rest.trim_start();
            let name = rest.strip_prefix('*').unwrap_or(rest);
            if name.is_empty() {
                return Err(invalid());
            }

            entries.insert(name.to_string(), digest.to_string());
        }

        Ok(Self { entries })
    }

    /// Expected digest for `name`, if listed.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entry is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(file name, digest)` pairs in file name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Reads the manifest at `path`.
///
/// A missing file yields an empty manifest.
///
/// # Errors
///
/// Returns `DiscoveryError::ManifestRead` for read failures other than the
/// file being absent, and `DiscoveryError::InvalidManifestLine` for malformed
/// content.
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no checksum file found");
            return Ok(Manifest::default());
        }
        Err(source) => {
            return Err(DiscoveryError::ManifestRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    info!(path = %path.display(), "using checksums");
    Manifest::parse(&text, path)
}
