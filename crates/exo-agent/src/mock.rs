//! Reference external input, also used by the end-to-end tests.

use async_trait::async_trait;
use exo_core::{Metric, MetricKind};
use exo_plugin::{ExternalInput, PluginError};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::info;

const SAMPLE_CONFIG: &str = r#"  ## Measurement name
  metric_name = "mock"

  ## Value reported in the "value" field
  value = 1

  ## Metric kind: untyped, counter, gauge, summary or histogram
  # kind = "gauge"

  ## Extra tags
  # tags = { host = "a" }
"#;

/// Settings accepted by [`MockInput`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MockConfig {
    /// Measurement name
    pub metric_name: String,
    /// Value of the `value` field
    pub value: i64,
    /// Metric kind
    pub kind: MetricKind,
    /// Tags added to every metric
    pub tags: BTreeMap<String, String>,
    /// Make `init` fail
    pub fail_init: bool,
    /// Make every `gather` fail
    pub fail_gather: bool,
    /// Exit the process inside `gather`, simulating a crash
    pub exit_on_gather: bool,
    /// Line written to stderr on every gather
    pub log_message: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            metric_name: "mock".to_string(),
            value: 1,
            kind: MetricKind::Untyped,
            tags: BTreeMap::new(),
            fail_init: false,
            fail_gather: false,
            exit_on_gather: false,
            log_message: None,
        }
    }
}

/// Emits one configurable metric per gather.
#[derive(Debug, Default)]
pub struct MockInput {
    config: MockConfig,
    gathers: u64,
}

impl MockInput {
    /// Current settings.
    #[must_use]
    pub const fn config(&self) -> &MockConfig {
        &self.config
    }
}

#[async_trait]
impl ExternalInput for MockInput {
    type Config = MockConfig;

    fn description(&self) -> String {
        "Emits a configurable test metric".to_string()
    }

    fn sample_config(&self) -> String {
        SAMPLE_CONFIG.to_string()
    }

    fn apply_config(&mut self, config: MockConfig) -> Result<(), PluginError> {
        self.config = config;
        Ok(())
    }

    async fn init(&mut self) -> Result<(), PluginError> {
        if self.config.metric_name.is_empty() {
            return Err(PluginError::config("metric_name must not be empty"));
        }
        if self.config.fail_init {
            return Err(PluginError::failed("init failed on request"));
        }
        Ok(())
    }

    async fn gather(&mut self) -> Result<Vec<Metric>, PluginError> {
        if let Some(message) = &self.config.log_message {
            info!("{message}");
        }
        if self.config.fail_gather {
            return Err(PluginError::failed("gather failed on request"));
        }
        if self.config.exit_on_gather {
            std::process::exit(3);
        }

        self.gathers += 1;
        let mut builder = Metric::builder(self.config.metric_name.as_str())
            .field("value", self.config.value)
            .field("gathers", self.gathers)
            .kind(self.config.kind);
        for (key, value) in &self.config.tags {
            builder = builder.tag(key.as_str(), value.as_str());
        }
        Ok(vec![builder.build()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exo_core::FieldValue;

    #[test]
    fn test_config_from_toml() {
        let config: MockConfig = toml::from_str(
            "metric_name = \"demo\"\nvalue = 5\nkind = \"counter\"\ntags = { host = \"a\" }\n",
        )
        .unwrap();
        assert_eq!(config.metric_name, "demo");
        assert_eq!(config.kind, MetricKind::Counter);
        assert_eq!(config.tags.get("host").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_unknown_setting_is_rejected() {
        assert!(toml::from_str::<MockConfig>("valu = 5\n").is_err());
    }

    #[tokio::test]
    async fn test_gather_counts_calls() {
        let mut input = MockInput::default();
        input.init().await.unwrap();
        input.gather().await.unwrap();
        let metrics = input.gather().await.unwrap();

        assert_eq!(metrics[0].name(), "mock");
        assert_eq!(metrics[0].field("gathers"), Some(&FieldValue::Uint(2)));
    }

    #[tokio::test]
    async fn test_empty_metric_name_fails_init() {
        let mut input = MockInput::default();
        input
            .apply_config(MockConfig {
                metric_name: String::new(),
                ..MockConfig::default()
            })
            .unwrap();
        assert!(input.init().await.unwrap_err().is_config_error());
    }
}
