//! CLI configuration.

use anyhow::{bail, Context, Result};
use basyx_client::BasyxClientConfig;
use basyx_registry::{normalize_root_token, NetworkProbe, PingProbe, ResolverConfig, TcpProbe};
use std::time::Duration;

/// How endpoint reachability is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// ICMP echo through the system `ping`
    Ping,
    /// TCP connect to the given port
    Tcp(u16),
}

impl ProbeKind {
    /// Parse `ping` or `tcp:<port>`.
    ///
    /// # Errors
    ///
    /// Returns error for any other value.
    pub fn parse(value: &str) -> Result<Self> {
        if value.eq_ignore_ascii_case("ping") {
            return Ok(Self::Ping);
        }
        match value.split_once(':') {
            Some(("tcp", port)) => Ok(Self::Tcp(
                port.parse().with_context(|| format!("Invalid TCP probe port `{port}`"))?,
            )),
            _ => bail!("Unknown probe `{value}`, expected `ping` or `tcp:<port>`"),
        }
    }

    /// Build the probe.
    #[must_use]
    pub fn build(self) -> Box<dyn NetworkProbe> {
        match self {
            Self::Ping => Box::new(PingProbe::default()),
            Self::Tcp(port) => Box::new(TcpProbe::new(port)),
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Registry client settings
    pub registry: BasyxClientConfig,
    /// Endpoint resolution settings
    pub resolver: ResolverConfig,
    /// Reachability probe
    pub probe: ProbeKind,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            registry: BasyxClientConfig::default(),
            resolver: ResolverConfig::default(),
            probe: ProbeKind::Ping,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BASYX_REGISTRY_URL`: Registry base URL
    /// - `BASYX_BEARER_TOKEN`: Bearer token for the registry
    /// - `BASYX_PROBE_TIMEOUT_MS`: Per-endpoint probe timeout
    /// - `BASYX_ROOT_PATH_TOKEN`: Root path token replaced on redirect (default `/aas`)
    /// - `BASYX_PROBE`: `ping` or `tcp:<port>`
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("BASYX_REGISTRY_URL") {
            config.registry.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(token) = lookup("BASYX_BEARER_TOKEN") {
            config.registry.bearer_token = Some(token);
        }

        if let Some(ms) = lookup("BASYX_PROBE_TIMEOUT_MS") {
            let ms: u64 = ms.parse().context("Invalid BASYX_PROBE_TIMEOUT_MS")?;
            config.resolver.probe_timeout = Duration::from_millis(ms);
        }

        if let Some(token) = lookup("BASYX_ROOT_PATH_TOKEN") {
            config.resolver.root_path_token = normalize_root_token(&token);
        }

        if let Some(probe) = lookup("BASYX_PROBE") {
            config.probe = ProbeKind::parse(&probe).context("Invalid BASYX_PROBE")?;
        }

        Ok(config)
    }
}
