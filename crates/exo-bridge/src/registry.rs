//! Name-to-launcher table built from a discovery registration.

use crate::launcher::{LaunchConfig, PluginLauncher};
use crate::wrapper::InputWrapper;
use exo_core::{Category, Error, Result};
use exo_discovery::Registration;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    checksum: Option<String>,
}

/// External input plugins the host can instantiate.
///
/// Only the inputs category is wired to the RPC bridge. Executables found in
/// the other categories are listed by discovery but not registered here.
///
/// # Examples
///
/// ```no_run
/// use exo_bridge::{ExternalRegistry, LaunchConfig};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registration = exo_discovery::discover(Path::new("/usr/lib/exo/plugins"))?;
/// let registry = ExternalRegistry::from_registration(&registration, LaunchConfig::default());
///
/// for name in registry.names() {
///     println!("{name}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ExternalRegistry {
    config: LaunchConfig,
    inputs: BTreeMap<String, Entry>,
}

impl ExternalRegistry {
    /// Builds the registry from a discovery result.
    #[must_use]
    pub fn from_registration(registration: &Registration, config: LaunchConfig) -> Self {
        let mut inputs = BTreeMap::new();

        for (category, found) in registration.iter() {
            if category != Category::Inputs {
                if !found.executables.is_empty() {
                    debug!(
                        category = %category,
                        count = found.executables.len(),
                        "external plugins of this category are not supported, skipping"
                    );
                }
                continue;
            }

            for name in &found.executables {
                let entry = Entry {
                    path: registration.plugin_path(category, name),
                    checksum: found.manifest.get(name).map(str::to_string),
                };
                if entry.checksum.is_none() {
                    debug!(plugin = %name, "no checksum listed, launching unverified");
                }
                inputs.insert(name.clone(), entry);
            }
        }

        Self { config, inputs }
    }

    /// Registered input names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    /// Returns `true` if an input with this name was discovered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// Number of registered inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Returns `true` if no inputs were discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Launch settings shared by every plugin.
    #[must_use]
    pub const fn launch_config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Builds the launcher for a registered input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if no input with this name was
    /// discovered.
    pub fn launcher(&self, name: &str) -> Result<PluginLauncher> {
        let entry = self.inputs.get(name).ok_or_else(|| Error::ResourceNotFound {
            resource: format!("external input {name}"),
        })?;

        let launcher = PluginLauncher::new(name, entry.path.clone(), self.config.clone());
        Ok(match &entry.checksum {
            Some(checksum) => launcher.with_checksum(checksum.clone()),
            None => launcher,
        })
    }

    /// Creates a lazily-launched input for a registered plugin.
    ///
    /// `config` is the raw configuration block, header line included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceNotFound`] if no input with this name was
    /// discovered.
    pub fn create(&self, name: &str, config: impl Into<String>) -> Result<InputWrapper> {
        let launcher = self.launcher(name)?;
        Ok(InputWrapper::new(name, config, launcher))
    }
}
