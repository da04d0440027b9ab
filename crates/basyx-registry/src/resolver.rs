//! First-reachable endpoint selection.
//!
//! Candidates are probed strictly in registration order, one at a time. The
//! first reachable HTTP(S) candidate wins and no later candidate is probed.
//! Its address is rewritten by replacing the entity's root path token (`/aas`
//! by default) and everything after it with the requested suffix.

use crate::descriptor::EndpointCandidate;
use crate::probe::{NetworkProbe, DEFAULT_PROBE_TIMEOUT};
use std::fmt;
use std::time::Duration;
use url::{Host, Url};

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Path token marking the root of a registered entity's address
    pub root_path_token: String,
    /// Per-candidate probe timeout
    pub probe_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            root_path_token: "/aas".to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// Picks the first reachable endpoint of a registered entity.
#[derive(Debug, Clone)]
pub struct EndpointResolver<P> {
    probe: P,
    config: ResolverConfig,
}

impl<P: NetworkProbe> EndpointResolver<P> {
    /// Create a resolver.
    #[must_use]
    pub fn new(probe: P, config: ResolverConfig) -> Self {
        Self { probe, config }
    }

    /// Return the first reachable candidate with its path rewritten onto
    /// `suffix`.
    ///
    /// Candidates that are not HTTP(S) are skipped without probing. A probe
    /// error only disqualifies its own candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoReachableEndpoint`] carrying one
    /// [`EndpointFailure`] per probed or unparsable candidate when none is
    /// reachable.
    pub async fn resolve(
        &self,
        candidates: &[EndpointCandidate],
        suffix: &str,
    ) -> Result<Url, ResolveError> {
        let mut failures = Vec::new();

        for candidate in candidates {
            if !candidate.is_http() {
                tracing::debug!(
                    address = %candidate.address,
                    protocol = %candidate.protocol,
                    "Skipping non-HTTP endpoint"
                );
                continue;
            }

            let address = match Url::parse(&candidate.address) {
                Ok(url) => url,
                Err(e) => {
                    failures.push(EndpointFailure::new(candidate, format!("invalid address: {e}")));
                    continue;
                }
            };
            let Some(host) = probe_host(&address) else {
                failures.push(EndpointFailure::new(candidate, "address has no host"));
                continue;
            };

            match self.probe.probe(&host, self.config.probe_timeout).await {
                Ok(true) => {
                    let target = rewrite_path(&address, &self.config.root_path_token, suffix);
                    tracing::info!(endpoint = %candidate.address, %target, "Resolved reachable endpoint");
                    return Ok(target);
                }
                Ok(false) => {
                    tracing::warn!(endpoint = %candidate.address, host, "Endpoint not reachable");
                    failures.push(EndpointFailure::new(candidate, "host not reachable"));
                }
                Err(e) => {
                    tracing::warn!(endpoint = %candidate.address, host, error = %e, "Endpoint probe failed");
                    failures.push(EndpointFailure::new(candidate, e.to_string()));
                }
            }
        }

        Err(ResolveError::NoReachableEndpoint { failures })
    }
}

/// Host to probe, with IPv6 brackets removed.
fn probe_host(address: &Url) -> Option<String> {
    match address.host()? {
        Host::Domain(domain) => Some(domain.to_string()),
        Host::Ipv4(ip) => Some(ip.to_string()),
        Host::Ipv6(ip) => Some(ip.to_string()),
    }
}

/// Replace the last whole-segment occurrence of `root_token` and everything
/// after it by `/{suffix}`. Without a match the suffix is appended.
///
/// A `?query` or `#fragment` in `suffix` replaces the address's own.
#[must_use]
pub fn rewrite_path(address: &Url, root_token: &str, suffix: &str) -> Url {
    let (suffix, fragment) = match suffix.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (suffix, None),
    };
    let (suffix, query) = match suffix.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (suffix, None),
    };

    let path = address.path();
    let base = root_prefix(path, root_token).unwrap_or_else(|| path.trim_end_matches('/'));

    let suffix = suffix.trim_matches('/');
    let new_path = if suffix.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{suffix}")
    };

    let mut target = address.clone();
    target.set_path(&new_path);
    if query.is_some() {
        target.set_query(query);
    }
    if fragment.is_some() {
        target.set_fragment(fragment);
    }
    target
}

/// Canonical form of a root path token: one leading `/`, no trailing `/`.
#[must_use]
pub fn normalize_root_token(token: &str) -> String {
    format!("/{}", token.trim_matches('/'))
}

/// Path before the last occurrence of `token` that spans whole segments.
fn root_prefix<'p>(path: &'p str, token: &str) -> Option<&'p str> {
    let token = normalize_root_token(token);
    if token == "/" {
        return None;
    }
    // The leading `/` pins the match to a segment start.
    path.rmatch_indices(token.as_str())
        .map(|(idx, _)| idx)
        .find(|&idx| {
            let end = idx + token.len();
            end == path.len() || path[end..].starts_with('/')
        })
        .map(|idx| &path[..idx])
}

/// Why one candidate was not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFailure {
    /// Candidate address
    pub address: String,
    /// Failure detail
    pub reason: String,
}

impl EndpointFailure {
    fn new(candidate: &EndpointCandidate, reason: impl Into<String>) -> Self {
        Self {
            address: candidate.address.clone(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.address, self.reason)
    }
}

/// Errors that can occur resolving an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No candidate could be reached
    #[error("endpoints are not reachable{}", describe_failures(.failures))]
    NoReachableEndpoint {
        /// One entry per candidate that was tried
        failures: Vec<EndpointFailure>,
    },
}

impl ResolveError {
    /// HTTP status the error maps to.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            ResolveError::NoReachableEndpoint { .. } => 400,
        }
    }
}

fn describe_failures(failures: &[EndpointFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }
    let details: Vec<String> = failures.iter().map(ToString::to_string).collect();
    format!(" ({})", details.join("; "))
}
