//! Pipeline stages for mail-to-PDF conversion.
//!
//! Each submodule implements one transformation step. The decoders produce a
//! [`crate::message::MailMessage`]; everything downstream only sees that
//! normalized shape, never the container or MIME tree.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ container ──▶ properties ──▶ msg ─┐
//!   │        (CFB tree)    (MAPI streams)     ├──▶ assemble ──▶ dispatch
//!   └───────────────────────────────▶ eml ────┘   (document,     (route per
//!                                                  postprocess,   attachment)
//!                                                  encode)
//! ```
//!
//! 1. [`input`]     : path, URL or bytes → [`input::SourceDocument`]; format detection
//! 2. [`container`] : compound-file directory as a flat path → bytes map
//! 3. [`properties`]: MAPI property streams → typed values, recursing into
//!    embedded messages
//! 4. [`msg`] / [`eml`]: the two decoders producing the normalized message
//! 5. [`assemble`]  : inline images, cleanup rules, header block; runs on an
//!    HTML tree from [`document`] with rules from [`postprocess`]
//! 6. [`dispatch`]  : media type → conversion route for each attachment

pub mod assemble;
pub mod container;
pub mod dispatch;
pub mod document;
pub mod encode;
pub mod eml;
pub mod input;
pub mod msg;
pub mod postprocess;
pub mod properties;
