//! Inline payload encoding: attachment bytes → `data:` URI.
//!
//! Resolved inline images are embedded directly into the document so the
//! renderer never needs to fetch anything. Standard base64 with padding is
//! what every HTML engine accepts in a data URI.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// `data:<content_type>;base64,<payload>`
pub fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes of {} → {} bytes base64", bytes.len(), content_type, b64.len());
    format!("data:{content_type};base64,{b64}")
}
