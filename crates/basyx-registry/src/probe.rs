//! Host reachability probes.
//!
//! [`PingProbe`] sends a single ICMP echo through the system `ping` binary.
//! [`TcpProbe`] opens a TCP connection to a fixed port instead, for
//! environments where ICMP is filtered.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::Command;

/// Timeout applied when the caller does not supply one.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Reports whether a host answers.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    /// Probe `host` once, giving up after `timeout`.
    ///
    /// `Ok(false)` means the host was asked and did not answer.
    ///
    /// # Errors
    ///
    /// Returns error if the probe itself could not be carried out or did not
    /// finish in time.
    async fn probe(&self, host: &str, timeout: Duration) -> Result<bool, ProbeError>;

    /// Probe `host`, folding every failure into `false`.
    async fn is_reachable(&self, host: &str, timeout: Option<Duration>) -> bool {
        let timeout = timeout.unwrap_or(DEFAULT_PROBE_TIMEOUT);
        match self.probe(host, timeout).await {
            Ok(reachable) => {
                tracing::debug!(host, reachable, "Probe finished");
                reachable
            }
            Err(e) => {
                tracing::warn!(host, error = %e, "Probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl<P: NetworkProbe + ?Sized> NetworkProbe for Box<P> {
    async fn probe(&self, host: &str, timeout: Duration) -> Result<bool, ProbeError> {
        (**self).probe(host, timeout).await
    }
}

/// ICMP echo via the system `ping` command.
#[derive(Debug, Clone)]
pub struct PingProbe {
    program: String,
}

impl Default for PingProbe {
    fn default() -> Self {
        Self {
            program: "ping".to_string(),
        }
    }
}

impl PingProbe {
    /// Probe using a specific ping executable.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, host: &str, timeout: Duration) -> Command {
        // `-W` takes whole seconds.
        let wait_secs = timeout.as_secs_f64().ceil().max(1.0).to_string();

        let mut command = Command::new(&self.program);
        command
            .args(["-c", "1", "-W", wait_secs.as_str(), host])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl NetworkProbe for PingProbe {
    async fn probe(&self, host: &str, timeout: Duration) -> Result<bool, ProbeError> {
        validate_host(host)?;

        let mut command = self.command(host, timeout);
        let status = tokio::time::timeout(timeout, command.status())
            .await
            .map_err(|_| ProbeError::Timeout(timeout))?
            .map_err(|e| ProbeError::Spawn(e.to_string()))?;

        tracing::trace!(host, code = ?status.code(), "ping exited");
        Ok(status.success())
    }
}

/// TCP connect to a fixed port.
#[derive(Debug, Clone, Copy)]
pub struct TcpProbe {
    port: u16,
}

impl TcpProbe {
    /// Probe by connecting to `port`.
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl NetworkProbe for TcpProbe {
    async fn probe(&self, host: &str, timeout: Duration) -> Result<bool, ProbeError> {
        validate_host(host)?;

        tokio::time::timeout(timeout, TcpStream::connect((host, self.port)))
            .await
            .map_err(|_| ProbeError::Timeout(timeout))?
            .map_err(|e| ProbeError::Io(e.to_string()))?;

        Ok(true)
    }
}

/// Reject values that would be read as options or are not host names.
fn validate_host(host: &str) -> Result<(), ProbeError> {
    if host.is_empty() || host.starts_with('-') || host.chars().any(char::is_whitespace) {
        return Err(ProbeError::InvalidHost(host.to_string()));
    }
    Ok(())
}

/// Errors that can occur while probing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// Host string is unusable
    #[error("invalid host `{0}`")]
    InvalidHost(String),
    /// Probe did not finish in time
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    /// Probe process could not be started
    #[error("failed to run probe: {0}")]
    Spawn(String),
    /// Network error
    #[error("probe I/O error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_validation() {
        assert!(validate_host("10.0.0.7").is_ok());
        assert!(validate_host("registry.local").is_ok());
        assert!(validate_host("::1").is_ok());
        assert_eq!(
            validate_host("-c9"),
            Err(ProbeError::InvalidHost("-c9".to_string()))
        );
        assert!(validate_host("").is_err());
        assert!(validate_host("a b").is_err());
    }

    #[test]
    fn ping_wait_is_rounded_up_to_seconds() {
        let probe = PingProbe::default();
        let command = probe.command("localhost", Duration::from_millis(1500));
        let args: Vec<_> = command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["-c", "1", "-W", "2", "localhost"]);
    }

    #[tokio::test]
    async fn missing_ping_binary_is_unreachable() {
        let probe = PingProbe::with_program("/nonexistent/ping");
        let err = probe
            .probe("localhost", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Spawn(_)));
        assert!(!probe.is_reachable("localhost", None).await);
    }

    #[tokio::test]
    async fn tcp_probe_reaches_local_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = TcpProbe::new(port);
        assert!(probe
            .is_reachable("127.0.0.1", Some(Duration::from_secs(1)))
            .await);
    }

    #[tokio::test]
    async fn invalid_host_is_unreachable() {
        let probe = TcpProbe::new(80);
        assert!(!probe.is_reachable("-oops", None).await);
    }
}
