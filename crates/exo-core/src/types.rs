//! Strong domain types for plugin discovery and registration.
//!
//! # Examples
//!
//! ```
//! use exo_core::{Category, PluginName};
//!
//! let name = PluginName::new("cpu").unwrap();
//! assert_eq!(name.as_str(), "cpu");
//! assert_eq!(Category::Inputs.dir_name(), "inputs");
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Plugin category, one per subfolder of the plugin root.
///
/// Ordering follows [`Category::ALL`], which is also the order in which
/// discovery visits the subfolders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Metric producers
    Inputs,
    /// Metric sinks
    Outputs,
    /// Per-metric transformers
    Processors,
    /// Windowed metric reducers
    Aggregators,
}

impl Category {
    /// Every category in discovery order.
    pub const ALL: [Self; 4] = [
        Self::Inputs,
        Self::Outputs,
        Self::Processors,
        Self::Aggregators,
    ];

    /// Name of the subfolder holding plugins of this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_core::Category;
    ///
    /// let dirs: Vec<_> = Category::ALL.iter().map(Category::dir_name).collect();
    /// assert_eq!(dirs, ["inputs", "outputs", "processors", "aggregators"]);
    /// ```
    #[must_use]
    pub const fn dir_name(&self) -> &'static str {
        match self {
            Self::Inputs => "inputs",
            Self::Outputs => "outputs",
            Self::Processors => "processors",
            Self::Aggregators => "aggregators",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.dir_name() == s)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown plugin category: '{s}' (expected: inputs, outputs, processors, or aggregators)"
                ))
            })
    }
}

/// Plugin name (newtype over String).
///
/// A plugin name is the file name of its executable inside a category
/// folder, so it can never be empty or contain a path separator.
///
/// # Examples
///
/// ```
/// use exo_core::PluginName;
///
/// assert!(PluginName::new("mock").is_ok());
/// assert!(PluginName::new("").is_err());
/// assert!(PluginName::new("../etc/passwd").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginName(String);

impl PluginName {
    /// Creates a validated plugin name.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if the name is empty, `.` or `..`, or
    /// contains a path separator or NUL byte.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name == "." || name == ".." {
            return Err(Error::InvalidArgument(format!(
                "invalid plugin name: '{name}'"
            )));
        }
        if name.contains(['/', '\\', '\0']) {
            return Err(Error::InvalidArgument(format!(
                "plugin name must not contain path separators: '{name}'"
            )));
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name and returns the inner `String`.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PluginName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PluginName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PluginName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PluginName> for String {
    fn from(name: PluginName) -> Self {
        name.0
    }
}
