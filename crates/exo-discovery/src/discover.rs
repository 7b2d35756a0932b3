//! Plugin directory discovery.
//!
//! ```text
//! <root>/
//! ├── inputs/
//! │   ├── checksums      # optional manifest
//! │   └── mock           # executable plugin
//! ├── outputs/
//! ├── processors/
//! └── aggregators/
//! ```

use crate::error::{DiscoveryError, Result};
use crate::manifest::{MANIFEST_FILE, Manifest, read_manifest};
use exo_core::Category;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Executables and manifest found in one category directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryRegistration {
    /// Executable file names, in file name order
    pub executables: Vec<String>,
    /// Checksums declared for this category
    pub manifest: Manifest,
}

/// Result of discovering a plugin root.
///
/// Built once at startup and read-only afterwards; every category is present,
/// possibly with no executables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    root: PathBuf,
    categories: BTreeMap<Category, CategoryRegistration>,
}

impl Registration {
    /// Plugin root this registration was built from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Executable names discovered for `category`.
    #[must_use]
    pub fn executables(&self, category: Category) -> &[String] {
        self.categories
            .get(&category)
            .map(|c| c.executables.as_slice())
            .unwrap_or_default()
    }

    /// Manifest of `category`, if its directory existed.
    #[must_use]
    pub fn manifest(&self, category: Category) -> Option<&Manifest> {
        self.categories.get(&category).map(|c| &c.manifest)
    }

    /// Expected digest of plugin `name` in `category`, if listed.
    #[must_use]
    pub fn checksum(&self, category: Category, name: &str) -> Option<&str> {
        self.manifest(category).and_then(|m| m.get(name))
    }

    /// Absolute location of plugin `name` in `category`.
    #[must_use]
    pub fn plugin_path(&self, category: Category, name: &str) -> PathBuf {
        self.root.join(category.dir_name()).join(name)
    }

    /// Iterates over categories in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &CategoryRegistration)> {
        self.categories.iter().map(|(c, r)| (*c, r))
    }

    /// Total number of discovered executables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.values().map(|c| c.executables.len()).sum()
    }

    /// Returns `true` if no executable was found in any category.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Discovers plugin executables and manifests below `root`.
///
/// For each category, a missing subdirectory yields an empty entry. Existing
/// subdirectories are walked recursively; regular files (after resolving
/// symlinks) with any execute bit set are recorded by base name. The
/// manifest file itself is never recorded as a plugin.
///
/// # Errors
///
/// Returns an error if a category directory cannot be inspected, its
/// manifest is unreadable or malformed, or the walk fails.
///
/// # Examples
///
/// ```
/// use exo_core::Category;
/// use exo_discovery::discover;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let root = tempfile::tempdir()?;
/// let registration = discover(root.path())?;
///
/// assert!(registration.executables(Category::Inputs).is_empty());
/// assert!(registration.is_empty());
/// # Ok(())
/// # }
/// ```
pub fn discover(root: &Path) -> Result<Registration> {
    let mut categories = BTreeMap::new();

    for category in Category::ALL {
        let dir = root.join(category.dir_name());
        let entry = discover_category(&dir)?;
        debug!(
            category = %category,
            executables = entry.executables.len(),
            checksums = entry.manifest.len(),
            "category discovered"
        );
        categories.insert(category, entry);
    }

    Ok(Registration {
        root: root.to_path_buf(),
        categories,
    })
}

fn discover_category(dir: &Path) -> Result<CategoryRegistration> {
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Ok(CategoryRegistration::default()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(CategoryRegistration::default());
        }
        Err(source) => {
            return Err(DiscoveryError::CategoryDir {
                path: dir.to_path_buf(),
                source,
            });
        }
    }

    let manifest = read_manifest(&dir.join(MANIFEST_FILE))?;

    let mut executables = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.depth() == 1 && entry.file_name() == MANIFEST_FILE {
            continue;
        }
        if is_regular_executable(&entry) {
            executables.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    Ok(CategoryRegistration {
        executables,
        manifest,
    })
}

fn is_regular_executable(entry: &DirEntry) -> bool {
    if entry.path_is_symlink() {
        match std::fs::metadata(entry.path()) {
            Ok(meta) => is_executable_file(&meta),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "bad symbolic link");
                false
            }
        }
    } else {
        entry.metadata().is_ok_and(|meta| is_executable_file(&meta))
    }
}

#[cfg(unix)]
fn is_executable_file(meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.is_file() && meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable_file(meta: &Metadata) -> bool {
    meta.is_file()
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn write_file(path: &Path, mode: u32) {
        fs::write(path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn test_missing_categories_are_empty() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("inputs")).unwrap();
        write_file(&root.path().join("inputs/cpu"), 0o755);

        let reg = discover(root.path()).unwrap();
        assert_eq!(reg.executables(Category::Inputs), ["cpu"]);
        for category in [Category::Outputs, Category::Processors, Category::Aggregators] {
            assert!(reg.executables(category).is_empty());
        }
        assert_eq!(reg.iter().count(), 4);
    }

    #[test]
    fn test_non_executables_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let inputs = root.path().join("inputs");
        fs::create_dir(&inputs).unwrap();
        write_file(&inputs.join("plain"), 0o644);
        write_file(&inputs.join("tool"), 0o700);

        let reg = discover(root.path()).unwrap();
        assert_eq!(reg.executables(Category::Inputs), ["tool"]);
    }

    #[test]
    fn test_nested_directories_are_walked() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("processors/vendor/bin");
        fs::create_dir_all(&nested).unwrap();
        write_file(&nested.join("rename"), 0o755);

        let reg = discover(root.path()).unwrap();
        assert_eq!(reg.executables(Category::Processors), ["rename"]);
    }

    #[test]
    fn test_symlink_to_executable_is_included() {
        let root = tempfile::tempdir().unwrap();
        let inputs = root.path().join("inputs");
        fs::create_dir(&inputs).unwrap();
        let target = root.path().join("real-binary");
        write_file(&target, 0o755);
        std::os::unix::fs::symlink(&target, inputs.join("linked")).unwrap();

        let reg = discover(root.path()).unwrap();
        assert_eq!(reg.executables(Category::Inputs), ["linked"]);
    }

    #[test]
    fn test_dangling_symlink_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        let inputs = root.path().join("inputs");
        fs::create_dir(&inputs).unwrap();
        std::os::unix::fs::symlink(root.path().join("gone"), inputs.join("broken")).unwrap();
        write_file(&inputs.join("ok"), 0o755);

        let reg = discover(root.path()).unwrap();
        assert_eq!(reg.executables(Category::Inputs), ["ok"]);
    }

    #[test]
    fn test_executable_manifest_is_not_a_plugin() {
        let root = tempfile::tempdir().unwrap();
        let inputs = root.path().join("inputs");
        fs::create_dir(&inputs).unwrap();
        fs::write(inputs.join(MANIFEST_FILE), "").unwrap();
        fs::set_permissions(inputs.join(MANIFEST_FILE), fs::Permissions::from_mode(0o755))
            .unwrap();

        let reg = discover(root.path()).unwrap();
        assert!(reg.executables(Category::Inputs).is_empty());
    }

    #[test]
    fn test_category_that_is_a_file_is_empty() {
        let root = tempfile::tempdir().unwrap();
        write_file(&root.path().join("outputs"), 0o755);

        let reg = discover(root.path()).unwrap();
        assert!(reg.executables(Category::Outputs).is_empty());
    }

    #[test]
    fn test_malformed_manifest_aborts_discovery() {
        let root = tempfile::tempdir().unwrap();
        let inputs = root.path().join("inputs");
        fs::create_dir(&inputs).unwrap();
        fs::write(inputs.join(MANIFEST_FILE), "only-a-digest\n").unwrap();

        let err = discover(root.path()).unwrap_err();
        assert!(err.is_manifest_error());
    }

    #[test]
    fn test_plugin_path_joins_category() {
        let root = tempfile::tempdir().unwrap();
        let reg = discover(root.path()).unwrap();
        assert_eq!(
            reg.plugin_path(Category::Inputs, "mock"),
            root.path().join("inputs").join("mock")
        );
    }
}
