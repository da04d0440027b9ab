//! # BaSyx Client
//!
//! AAS Part 2 encoding utilities and an HTTP client for BaSyx registries and
//! repositories.
//!
//! ## Encoding Rules (per AAS Part 2 HTTP/REST API)
//!
//! - **Identifiable IDs**: base64url-encoded WITHOUT padding
//! - **idShortPath**: URL-encoded (preserving `[]` for list indices)
//! - **Cursor**: opaque; servers emit it base64url-encoded

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod encoding;

pub use client::{BasyxClient, BasyxClientConfig, ClientError};
pub use encoding::{
    decode_cursor, decode_id_base64url, decode_idshort_path, encode_cursor, encode_id_base64url,
    encode_idshort_path, EncodingError,
};
