//! Error types for the mailpdf library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`ConvertError`]: **Fatal**: the mail cannot be turned into a document
//!   at all (broken container, unresolved attachment, renderer down).
//!   Returned as `Err(ConvertError)` from the top-level `convert*` functions.
//!
//! * [`AttachmentError`]: **Per attachment**: one attachment could not be
//!   rendered. The driver collects these for every attachment before it
//!   escalates to [`ConvertError::UnresolvedAttachments`], so the caller sees
//!   the first cause together with how many attachments were affected.
//!
//! * [`BackendError`]: what an external collaborator (renderer, cloud
//!   converter, merger) reports. The pipeline wraps it with context.
//!
//! Unknown MAPI property tags and unmatched content-id references are *not*
//! errors; they are skipped and logged.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mailpdf library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Mail file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Input file exists but cannot be read.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// Remote input could not be fetched.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Download of '{url}' timed out after {secs}s")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes are neither a compound-file `.msg` nor a MIME message.
    #[error("Unsupported input '{name}': {reason}")]
    UnsupportedInput { name: String, reason: String },

    // ── Decoding errors ───────────────────────────────────────────────────
    /// The compound file header signature or directory is inconsistent.
    #[error("'{name}' is not a valid compound container: {detail}")]
    MalformedContainer { name: String, detail: String },

    /// A MIME message could not be parsed at all.
    #[error("Failed to parse MIME message '{name}'")]
    MimeParse { name: String },

    /// A normalized message lacks what its declared format requires.
    #[error("Normalized {format} message is malformed: {detail}")]
    InvalidMessage { format: String, detail: String },

    /// Embedded messages or mail attachments nest deeper than allowed.
    #[error("Mail nesting exceeds the configured limit of {limit} levels")]
    NestingTooDeep { limit: usize },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// At least one attachment failed; no merged output is produced.
    #[error(
        "{request_id} - {subject} - Could not convert one or more attachments of this email \
({failed}/{total} failed)\nFirst error: {first_error}"
    )]
    UnresolvedAttachments {
        request_id: String,
        subject: String,
        failed: usize,
        total: usize,
        first_error: AttachmentError,
    },

    /// The HTML renderer rejected the assembled mail body.
    #[error("Failed to render mail body '{subject}': {source}")]
    Render {
        subject: String,
        #[source]
        source: BackendError,
    },

    /// The merge service failed.
    #[error("Failed to merge {documents} documents: {source}")]
    Merge {
        documents: usize,
        #[source]
        source: BackendError,
    },

    /// No renderer could be resolved from the configuration or environment.
    #[error("Backend '{backend}' is not configured.\n{hint}")]
    BackendNotConfigured { backend: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a single attachment failed to convert.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum AttachmentError {
    /// The collaborator returned an error.
    #[error("Attachment '{filename}': conversion failed: {detail}")]
    ConversionFailed { filename: String, detail: String },

    /// The collaborator answered, but with zero bytes.
    #[error("Attachment '{filename}': converter returned an empty document")]
    Empty { filename: String },

    /// A nested `.msg` / `.eml` failed inside the recursive pipeline.
    #[error("Attachment '{filename}': nested mail failed: {detail}")]
    NestedMail { filename: String, detail: String },
}

impl AttachmentError {
    pub fn filename(&self) -> &str {
        match self {
            Self::ConversionFailed { filename, .. }
            | Self::Empty { filename }
            | Self::NestedMail { filename, .. } => filename,
        }
    }
}

/// Failure reported by an external rendering/merge collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (connection refused, TLS, body read).
    #[error("HTTP request to '{url}' failed: {reason}")]
    Http { url: String, reason: String },

    /// The service answered with a non-success status.
    #[error("'{url}' answered HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The call exceeded the configured timeout.
    #[error("'{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The collaborator does not handle this kind of document.
    #[error("Unsupported by this backend: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_attachments_display() {
        let e = ConvertError::UnresolvedAttachments {
            request_id: "req-7".into(),
            subject: "Quarterly report".into(),
            failed: 1,
            total: 3,
            first_error: AttachmentError::Empty {
                filename: "b.docx".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("req-7 - Quarterly report"), "got: {msg}");
        assert!(msg.contains("1/3"), "got: {msg}");
        assert!(msg.contains("b.docx"), "got: {msg}");
    }

    #[test]
    fn attachment_error_filename() {
        let e = AttachmentError::NestedMail {
            filename: "fwd.msg".into(),
            detail: "boom".into(),
        };
        assert_eq!(e.filename(), "fwd.msg");
        assert!(e.to_string().contains("nested mail failed"));
    }

    #[test]
    fn render_error_keeps_source() {
        use std::error::Error as _;
        let e = ConvertError::Render {
            subject: "hi".into(),
            source: BackendError::Status {
                url: "http://r/forms".into(),
                status: 503,
                body: "busy".into(),
            },
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("hi"));
    }

    #[test]
    fn timeout_display() {
        let e = BackendError::Timeout {
            url: "http://gotenberg:3000".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }
}
