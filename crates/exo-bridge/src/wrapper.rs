//! Host-side adapter exposing an external plugin as an ordinary input.

use crate::client::PluginClient;
use crate::launcher::PluginLauncher;
use async_trait::async_trait;
use exo_core::{Accumulator, Error, Input, Result};
use exo_protocol::RpcError;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unconfigured,
    Initialized,
}

#[derive(Debug)]
struct State {
    client: Option<PluginClient>,
    phase: Phase,
}

/// Counters describing a wrapper's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WrapperStats {
    /// Subprocess launches
    pub launches: u64,
    /// Gather calls that reached the plugin
    pub gathers: u64,
    /// Gather calls that returned an error
    pub gather_failures: u64,
    /// Metrics forwarded to accumulators
    pub metrics_forwarded: u64,
}

/// An external input plugin behind the host's [`Input`] contract.
///
/// Owns the raw configuration block and at most one subprocess. The
/// subprocess is launched on first use. Calls are serialized by an internal
/// lock, so concurrent callers wait for each other.
///
/// Lifecycle:
///
/// - `init` sends `Configure` with the raw block, then `Init`. If either
///   fails the subprocess is killed and the wrapper returns to its initial
///   state, so a later `init` starts from a fresh process.
/// - `gather` before a successful `init` fails with
///   [`Error::InvalidState`] without launching or contacting the plugin.
/// - A failed `gather` forwards no metrics and leaves the subprocess
///   running.
/// - `stop` kills the subprocess.
///
/// # Examples
///
/// ```no_run
/// use exo_bridge::{InputWrapper, LaunchConfig, PluginLauncher};
/// use exo_core::{Input, Metric};
///
/// # async fn example() -> exo_core::Result<()> {
/// let launcher = PluginLauncher::new(
///     "mock",
///     "/usr/lib/exo/plugins/inputs/mock",
///     LaunchConfig::default(),
/// );
/// let wrapper = InputWrapper::new("mock", "[[inputs.mock]]\nvalue = 3\n", launcher);
///
/// wrapper.init().await?;
/// let mut metrics: Vec<Metric> = Vec::new();
/// wrapper.gather(&mut metrics).await?;
/// wrapper.stop().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct InputWrapper {
    name: String,
    config: String,
    launcher: Option<PluginLauncher>,
    state: Mutex<State>,
    launches: AtomicU64,
    gathers: AtomicU64,
    gather_failures: AtomicU64,
    metrics_forwarded: AtomicU64,
}

impl InputWrapper {
    /// Creates a wrapper that launches its subprocess on first use.
    #[must_use]
    pub fn new(name: impl Into<String>, config: impl Into<String>, launcher: PluginLauncher) -> Self {
        Self::build(name.into(), config.into(), Some(launcher), None)
    }

    /// Creates a wrapper around an already-connected plugin.
    ///
    /// Once that connection is killed the wrapper cannot reconnect.
    #[must_use]
    pub fn with_client(
        name: impl Into<String>,
        config: impl Into<String>,
        client: PluginClient,
    ) -> Self {
        Self::build(name.into(), config.into(), None, Some(client))
    }

    fn build(
        name: String,
        config: String,
        launcher: Option<PluginLauncher>,
        client: Option<PluginClient>,
    ) -> Self {
        Self {
            name,
            config,
            launcher,
            state: Mutex::new(State {
                client,
                phase: Phase::Unconfigured,
            }),
            launches: AtomicU64::new(0),
            gathers: AtomicU64::new(0),
            gather_failures: AtomicU64::new(0),
            metrics_forwarded: AtomicU64::new(0),
        }
    }

    /// Plugin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw configuration block handed to `Configure`.
    #[must_use]
    pub fn config(&self) -> &str {
        &self.config
    }

    /// Returns `true` once `init` has succeeded and until `stop`.
    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.phase == Phase::Initialized
    }

    /// Returns `true` while a subprocess is alive.
    pub async fn is_running(&self) -> bool {
        self.state
            .lock()
            .await
            .client
            .as_mut()
            .is_some_and(PluginClient::is_running)
    }

    /// Snapshot of the activity counters.
    #[must_use]
    pub fn stats(&self) -> WrapperStats {
        WrapperStats {
            launches: self.launches.load(Ordering::Relaxed),
            gathers: self.gathers.load(Ordering::Relaxed),
            gather_failures: self.gather_failures.load(Ordering::Relaxed),
            metrics_forwarded: self.metrics_forwarded.load(Ordering::Relaxed),
        }
    }

    async fn connect<'a>(&self, state: &'a mut State) -> Result<&'a mut PluginClient> {
        if state.client.is_none() {
            let launcher = self.launcher.as_ref().ok_or_else(|| Error::InvalidState {
                plugin: self.name.clone(),
                message: "connection closed and no launcher to reopen it".to_string(),
            })?;
            let client = launcher.launch().await.map_err(|e| Error::Launch {
                plugin: self.name.clone(),
                source: Box::new(e),
            })?;
            self.launches.fetch_add(1, Ordering::Relaxed);
            state.client = Some(client);
        }

        state.client.as_mut().ok_or_else(|| Error::InvalidState {
            plugin: self.name.clone(),
            message: "no connection".to_string(),
        })
    }

    fn map_rpc(&self, error: RpcError) -> Error {
        match error {
            RpcError::Domain(message) => Error::Domain {
                plugin: self.name.clone(),
                message,
            },
            RpcError::Transport { message, source } => Error::Transport {
                plugin: self.name.clone(),
                message,
                source: source.map(|s| Box::new(s) as Box<dyn std::error::Error + Send + Sync>),
            },
        }
    }

    async fn setup(&self, client: &mut PluginClient) -> Result<()> {
        client
            .service()
            .configure(&self.config)
            .await
            .map_err(|e| self.map_rpc(e))?;
        debug!(plugin = %self.name, "configuration applied");

        client
            .service()
            .init()
            .await
            .map_err(|e| self.map_rpc(e))
    }
}

#[async_trait]
impl Input for InputWrapper {
    async fn description(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        let client = self.connect(&mut state).await?;
        client
            .service()
            .description()
            .await
            .map_err(|e| self.map_rpc(e))
    }

    async fn sample_config(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        let client = self.connect(&mut state).await?;
        client
            .service()
            .sample_config()
            .await
            .map_err(|e| self.map_rpc(e))
    }

    async fn init(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.phase == Phase::Initialized {
            return Err(Error::InvalidState {
                plugin: self.name.clone(),
                message: "plugin is already initialized".to_string(),
            });
        }

        let client = self.connect(&mut state).await?;
        let result = self.setup(client).await;

        match result {
            Ok(()) => {
                state.phase = Phase::Initialized;
                info!(plugin = %self.name, "external plugin initialized");
                Ok(())
            }
            Err(e) => {
                warn!(plugin = %self.name, error = %e, "external plugin setup failed");
                if let Some(mut client) = state.client.take() {
                    client.kill().await;
                }
                Err(e)
            }
        }
    }

    async fn gather(&self, acc: &mut dyn Accumulator) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.phase != Phase::Initialized {
            return Err(Error::InvalidState {
                plugin: self.name.clone(),
                message: "gather called before init".to_string(),
            });
        }

        let client = self.connect(&mut state).await?;
        self.gathers.fetch_add(1, Ordering::Relaxed);

        match client.service().gather().await {
            Ok(metrics) => {
                let count = metrics.len() as u64;
                for metric in metrics {
                    acc.add_metric(metric);
                }
                self.metrics_forwarded.fetch_add(count, Ordering::Relaxed);
                debug!(plugin = %self.name, metrics = count, "gather completed");
                Ok(())
            }
            Err(e) => {
                self.gather_failures.fetch_add(1, Ordering::Relaxed);
                Err(self.map_rpc(e))
            }
        }
    }

    async fn stop(&self) {
        let mut state = self.state.lock().await;
        state.phase = Phase::Unconfigured;
        if let Some(mut client) = state.client.take() {
            client.kill().await;
            info!(plugin = %self.name, "external plugin stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exo_core::Metric;
    use exo_protocol::InputService;
    use mockall::Sequence;
    use mockall::predicate::eq;

    mockall::mock! {
        Service {}

        #[async_trait]
        impl InputService for Service {
            async fn description(&mut self) -> std::result::Result<String, RpcError>;
            async fn sample_config(&mut self) -> std::result::Result<String, RpcError>;
            async fn configure(&mut self, config: &str) -> std::result::Result<(), RpcError>;
            async fn init(&mut self) -> std::result::Result<(), RpcError>;
            async fn gather(&mut self) -> std::result::Result<Vec<Metric>, RpcError>;
        }
    }

    const CONFIG: &str = "[[inputs.mock]]\nvalue = 1\n";

    fn wrapper(service: MockService) -> InputWrapper {
        InputWrapper::with_client(
            "mock",
            CONFIG,
            PluginClient::from_service("mock", Box::new(service)),
        )
    }

    fn initialized_service() -> MockService {
        let mut service = MockService::new();
        service.expect_configure().times(1).returning(|_| Ok(()));
        service.expect_init().times(1).returning(|| Ok(()));
        service
    }

    #[tokio::test]
    async fn test_init_configures_then_initializes() {
        let mut seq = Sequence::new();
        let mut service = MockService::new();
        service
            .expect_configure()
            .with(eq(CONFIG))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        service
            .expect_init()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let wrapper = wrapper(service);
        wrapper.init().await.unwrap();
        assert!(wrapper.is_initialized().await);
    }

    #[tokio::test]
    async fn test_configure_failure_skips_init() {
        let mut service = MockService::new();
        service
            .expect_configure()
            .times(1)
            .returning(|_| Err(RpcError::Domain("unknown key".into())));
        service.expect_init().times(0);

        let wrapper = wrapper(service);
        let err = wrapper.init().await.unwrap_err();

        assert!(err.is_domain_error());
        assert_eq!(err.plugin(), Some("mock"));
        assert!(!wrapper.is_initialized().await);
    }

    #[tokio::test]
    async fn test_gather_before_init_never_reaches_plugin() {
        let mut service = MockService::new();
        service.expect_gather().times(0);

        let wrapper = wrapper(service);
        let mut acc: Vec<Metric> = Vec::new();
        let err = wrapper.gather(&mut acc).await.unwrap_err();

        assert!(err.is_invalid_state());
        assert!(acc.is_empty());
        assert_eq!(wrapper.stats().gathers, 0);
    }

    #[tokio::test]
    async fn test_gather_forwards_metrics_in_order() {
        let mut service = initialized_service();
        service.expect_gather().times(1).returning(|| {
            Ok(vec![
                Metric::builder("first").field("v", 1_i64).build(),
                Metric::builder("second").field("v", 2_i64).build(),
            ])
        });

        let wrapper = wrapper(service);
        wrapper.init().await.unwrap();

        let mut acc: Vec<Metric> = Vec::new();
        wrapper.gather(&mut acc).await.unwrap();

        let names: Vec<_> = acc.iter().map(Metric::name).collect();
        assert_eq!(names, ["first", "second"]);
        assert_eq!(wrapper.stats().metrics_forwarded, 2);
    }

    #[tokio::test]
    async fn test_gather_domain_error_forwards_nothing() {
        let mut service = initialized_service();
        service
            .expect_gather()
            .times(2)
            .returning(|| Err(RpcError::Domain("sensor offline".into())));

        let wrapper = wrapper(service);
        wrapper.init().await.unwrap();

        let mut acc: Vec<Metric> = Vec::new();
        for _ in 0..2 {
            let err = wrapper.gather(&mut acc).await.unwrap_err();
            assert!(err.is_domain_error());
        }

        assert!(acc.is_empty());
        let stats = wrapper.stats();
        assert_eq!(stats.gathers, 2);
        assert_eq!(stats.gather_failures, 2);
    }

    #[tokio::test]
    async fn test_transport_error_is_not_domain_error() {
        let mut service = initialized_service();
        service
            .expect_gather()
            .times(1)
            .returning(|| Err(RpcError::transport("connection closed by peer")));

        let wrapper = wrapper(service);
        wrapper.init().await.unwrap();

        let mut acc: Vec<Metric> = Vec::new();
        let err = wrapper.gather(&mut acc).await.unwrap_err();
        assert!(err.is_transport_error());
    }

    #[tokio::test]
    async fn test_second_init_is_rejected() {
        let wrapper = wrapper(initialized_service());
        wrapper.init().await.unwrap();

        let err = wrapper.init().await.unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[tokio::test]
    async fn test_stop_resets_lifecycle() {
        let wrapper = wrapper(initialized_service());
        wrapper.init().await.unwrap();
        wrapper.stop().await;
        wrapper.stop().await;

        assert!(!wrapper.is_initialized().await);
        let err = wrapper.init().await.unwrap_err();
        assert!(err.is_invalid_state());
    }

    #[tokio::test]
    async fn test_description_passes_through() {
        let mut service = MockService::new();
        service
            .expect_description()
            .times(1)
            .returning(|| Ok("a mock input".to_string()));

        let wrapper = wrapper(service);
        assert_eq!(wrapper.description().await.unwrap(), "a mock input");
    }
}
