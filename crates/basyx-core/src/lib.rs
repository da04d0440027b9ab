//! # BaSyx Core
//!
//! Request-independent building blocks shared by the BaSyx repository and
//! registry services.
//!
//! This crate provides:
//! - Cursor-based pagination over ordered key/value collections
//! - A tagged element tree with lazily materialized containers
//! - Parsing and resolution of dotted, bracket-indexed idShort paths
//!
//! All operations are synchronous and hold no state between calls, so they can
//! be invoked concurrently from any number of request handlers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod element;
pub mod paging;
pub mod path;

pub use element::{ChildLoader, Children, Container, ElementNode, Expandable, LoadError, Property};
pub use paging::{paginate, PageRequest, PagedResult, PagingError, PagingMetadata};
pub use path::{resolve, resolve_required, IdShortPath, MalformedReason, PathError, PathKey, PathSegment};
