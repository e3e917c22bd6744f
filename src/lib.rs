//! # mailpdf
//!
//! Turn Outlook `.msg` and MIME `.eml` mails into one merged PDF: the mail
//! body with a header block first, then every attachment converted in order.
//!
//! ## Why this crate?
//!
//! Archiving and case-file systems want mail as a single, self-contained
//! PDF. Printing the body alone loses the attachments, and printing the raw
//! message loses inline images and nested forwards. This crate decodes both
//! container formats into one normalized message, rebuilds a printable HTML
//! body (inline `cid:` images embedded, header block prepended) and hands the
//! body and every attachment to a rendering service.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .msg / .eml
//!  │
//!  ├─ 1. Input     resolve path / URL / bytes, detect the format
//!  ├─ 2. Decode    compound file + MAPI properties, or MIME tree
//!  ├─ 3. Assemble  inline images, cleanup rules, header block
//!  ├─ 4. Convert   every attachment by media type (nested mails recurse)
//!  ├─ 5. Render    body HTML → PDF
//!  └─ 6. Merge     body PDF + attachment PDFs, in order
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mailpdf::{convert_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .gotenberg_url("http://localhost:3000")
//!         .build()?;
//!     let output = convert_file("mail.msg", &config).await?;
//!     std::fs::write("mail.pdf", &output.pdf)?;
//!     eprintln!("{} attachments merged", output.stats.total_attachments);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mail2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mailpdf = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod message;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::gotenberg::GotenbergClient;
pub use backend::{CloudConverter, MediaType, PageOptions, PdfMerger, Renderer};
pub use config::{ConversionConfig, ConversionConfigBuilder, HeaderLabels};
pub use convert::{assemble_html, convert, convert_file, convert_sync, convert_to_file, inspect};
pub use error::{AttachmentError, BackendError, ConvertError};
pub use message::{
    DateStyle, HeaderField, MailAttachment, MailBody, MailDate, MailFormat, MailHeaders,
    MailMessage,
};
pub use output::{
    AttachmentInfo, AttachmentSummary, ConversionOutput, ConversionStats, HeaderLine, MailSummary,
};
pub use pipeline::assemble::AssembledMail;
pub use pipeline::dispatch::Route;
pub use pipeline::input::SourceDocument;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
