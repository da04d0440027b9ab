//! # BaSyx Registry
//!
//! Registry-side endpoint resolution for redirecting requests to the place a
//! shell or submodel is actually served from.
//!
//! - [`descriptor`]: shell and submodel descriptors and their endpoint candidates
//! - [`probe`]: host reachability (ICMP echo or TCP connect)
//! - [`resolver`]: first-reachable candidate selection and path rewriting
//! - [`redirect`]: registry lookup combined with resolution

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod descriptor;
pub mod probe;
pub mod redirect;
pub mod resolver;

pub use descriptor::{EndpointCandidate, ShellDescriptor, SubmodelDescriptor};
pub use probe::{NetworkProbe, PingProbe, ProbeError, TcpProbe, DEFAULT_PROBE_TIMEOUT};
pub use redirect::{DescriptorSource, RedirectError, Redirector};
pub use resolver::{
    normalize_root_token, rewrite_path, EndpointFailure, EndpointResolver, ResolveError,
    ResolverConfig,
};
