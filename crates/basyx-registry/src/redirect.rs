//! Registry-driven redirects.
//!
//! Looks up a shell (or one of its submodels) in the registry and turns the
//! first reachable registered endpoint into a redirect target
//! `{endpoint}/{to_what}`.

use crate::descriptor::ShellDescriptor;
use crate::probe::NetworkProbe;
use crate::resolver::{EndpointResolver, ResolveError};
use async_trait::async_trait;
use basyx_client::BasyxClient;
use std::collections::HashMap;
use url::Url;

/// Where shell descriptors come from.
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    /// Descriptor for `aas_id`, `None` if it is not registered.
    ///
    /// # Errors
    ///
    /// Returns error if the registry cannot be queried.
    async fn shell_descriptor(&self, aas_id: &str)
        -> Result<Option<ShellDescriptor>, RedirectError>;
}

#[async_trait]
impl DescriptorSource for BasyxClient {
    async fn shell_descriptor(
        &self,
        aas_id: &str,
    ) -> Result<Option<ShellDescriptor>, RedirectError> {
        match self.get_shell_descriptor(aas_id).await {
            Ok(descriptor) => Ok(Some(descriptor)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(RedirectError::Registry(e.to_string())),
        }
    }
}

/// Fixed descriptor table, keyed by shell id.
#[async_trait]
impl DescriptorSource for HashMap<String, ShellDescriptor> {
    async fn shell_descriptor(
        &self,
        aas_id: &str,
    ) -> Result<Option<ShellDescriptor>, RedirectError> {
        Ok(self.get(aas_id).cloned())
    }
}

/// Resolves redirect targets for registered shells and submodels.
pub struct Redirector<S, P> {
    source: S,
    resolver: EndpointResolver<P>,
}

impl<S: DescriptorSource, P: NetworkProbe> Redirector<S, P> {
    /// Create a redirector.
    #[must_use]
    pub fn new(source: S, resolver: EndpointResolver<P>) -> Self {
        Self { source, resolver }
    }

    /// Redirect target for `to_what` on the shell `aas_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RedirectError::InvalidArgument`] for an empty id,
    /// [`RedirectError::ShellNotFound`] if the shell is not registered, and
    /// [`RedirectError::Resolve`] if none of its endpoints is reachable.
    pub async fn redirect(&self, aas_id: &str, to_what: &str) -> Result<Url, RedirectError> {
        let descriptor = self.lookup(aas_id).await?;
        tracing::debug!(aas_id, to_what, endpoints = descriptor.endpoints.len(), "Redirecting shell request");
        Ok(self.resolver.resolve(&descriptor.candidates(), to_what).await?)
    }

    /// Redirect target for `to_what` on a submodel registered with `aas_id`.
    ///
    /// # Errors
    ///
    /// As [`Redirector::redirect`], plus [`RedirectError::SubmodelNotFound`].
    pub async fn redirect_submodel(
        &self,
        aas_id: &str,
        submodel_id: &str,
        to_what: &str,
    ) -> Result<Url, RedirectError> {
        if submodel_id.is_empty() {
            return Err(RedirectError::InvalidArgument("submodel id is empty".to_string()));
        }
        let descriptor = self.lookup(aas_id).await?;
        let submodel = descriptor.submodel(submodel_id).ok_or_else(|| {
            RedirectError::SubmodelNotFound {
                aas_id: aas_id.to_string(),
                submodel_id: submodel_id.to_string(),
            }
        })?;
        tracing::debug!(aas_id, submodel_id, to_what, "Redirecting submodel request");
        Ok(self.resolver.resolve(&submodel.candidates(), to_what).await?)
    }

    async fn lookup(&self, aas_id: &str) -> Result<ShellDescriptor, RedirectError> {
        if aas_id.is_empty() {
            return Err(RedirectError::InvalidArgument("shell id is empty".to_string()));
        }
        self.source
            .shell_descriptor(aas_id)
            .await?
            .ok_or_else(|| RedirectError::ShellNotFound(aas_id.to_string()))
    }
}

/// Errors that can occur building a redirect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedirectError {
    /// A required argument was empty
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Shell is not registered
    #[error("shell `{0}` is not registered")]
    ShellNotFound(String),
    /// Submodel is not registered with the shell
    #[error("submodel `{submodel_id}` is not registered with shell `{aas_id}`")]
    SubmodelNotFound {
        /// Shell identifier
        aas_id: String,
        /// Submodel identifier
        submodel_id: String,
    },
    /// Registry query failed
    #[error("registry error: {0}")]
    Registry(String),
    /// No registered endpoint was reachable
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl RedirectError {
    /// HTTP status the error maps to.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            RedirectError::InvalidArgument(_) => 400,
            RedirectError::ShellNotFound(_) | RedirectError::SubmodelNotFound { .. } => 404,
            RedirectError::Registry(_) => 502,
            RedirectError::Resolve(e) => e.status_code(),
        }
    }
}
