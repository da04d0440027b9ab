//! AAS Part 2 encoding rules for request paths and query parameters.
//!
//! - Identifiers of Identifiables travel base64url-encoded without padding
//! - idShort paths travel URL-encoded, keeping `[]` for list indices
//! - Pagination cursors travel base64url-encoded like identifiers, since a
//!   cursor is the identifier of the last entry delivered

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use basyx_core::{IdShortPath, PathError};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside an idShort path segment. `[` and `]` stay.
const IDSHORT_PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\');

/// Encode an identifier for use in a request path.
///
/// # Examples
///
/// ```
/// use basyx_client::encode_id_base64url;
///
/// let encoded = encode_id_base64url("https://example.org/shells/pump-7");
/// assert!(!encoded.contains(['=', '+', '/']));
/// ```
#[must_use]
pub fn encode_id_base64url(id: &str) -> String {
    URL_SAFE_NO_PAD.encode(id.as_bytes())
}

/// Decode an identifier taken from a request path.
///
/// # Errors
///
/// Returns error if the input is not base64url or not UTF-8.
pub fn decode_id_base64url(encoded: &str) -> Result<String, EncodingError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| EncodingError::Base64Decode(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| EncodingError::Utf8Decode(e.to_string()))
}

/// Encode a parsed idShort path for use in a request path.
///
/// # Examples
///
/// ```
/// use basyx_client::encode_idshort_path;
/// use basyx_core::IdShortPath;
///
/// let path = IdShortPath::parse("Maintenance Log[3].Entry").unwrap();
/// assert_eq!(encode_idshort_path(&path), "Maintenance%20Log[3].Entry");
/// ```
#[must_use]
pub fn encode_idshort_path(path: &IdShortPath) -> String {
    utf8_percent_encode(&path.to_string(), IDSHORT_PATH_ESCAPE).to_string()
}

/// Decode and parse an idShort path taken from a request path.
///
/// # Errors
///
/// Returns error if the input is not UTF-8 after percent-decoding or the
/// decoded path is malformed.
pub fn decode_idshort_path(encoded: &str) -> Result<IdShortPath, EncodingError> {
    let decoded = percent_decode_str(encoded)
        .decode_utf8()
        .map_err(|e| EncodingError::Utf8Decode(e.to_string()))?;
    Ok(IdShortPath::parse(&decoded)?)
}

/// Encode a pagination cursor for the `cursor` query parameter.
#[must_use]
pub fn encode_cursor(cursor: &str) -> String {
    encode_id_base64url(cursor)
}

/// Decode a `cursor` query parameter. An empty parameter means "no cursor".
///
/// # Errors
///
/// Returns error if the parameter is not a valid encoded cursor.
pub fn decode_cursor(param: &str) -> Result<Option<String>, EncodingError> {
    if param.is_empty() {
        return Ok(None);
    }
    decode_id_base64url(param).map(Some)
}

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EncodingError {
    /// Base64 decoding failed
    #[error("base64 decode error: {0}")]
    Base64Decode(String),
    /// UTF-8 decoding failed
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(String),
    /// Decoded idShort path is malformed
    #[error(transparent)]
    Path(#[from] PathError),
}

impl EncodingError {
    /// HTTP status the error maps to.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            EncodingError::Path(e) => e.status_code(),
            EncodingError::Base64Decode(_) | EncodingError::Utf8Decode(_) => 400,
        }
    }
}
