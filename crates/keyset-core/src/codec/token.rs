//! Opaque token envelope.
//!
//! The payload bytes are wrapped in unpadded URL-safe base64 so tokens can
//! travel in query strings and headers without escaping.

use super::CursorError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Default bound on token length, checked before any decoding.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 8 * 1024;

/// Wrap payload bytes into a token.
pub fn seal(payload: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(payload)
}

/// Unwrap a token into payload bytes.
///
/// Surrounding whitespace is trimmed.
pub fn open(token: &str, max_len: usize) -> Result<Vec<u8>, CursorError> {
    let token = token.trim();

    if token.is_empty() {
        return Err(CursorError::Empty);
    }

    if token.len() > max_len {
        return Err(CursorError::TooLong {
            len: token.len(),
            max: max_len,
        });
    }

    URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| CursorError::Envelope(e.to_string()))
}
