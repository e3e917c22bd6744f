//! Result types returned by the conversion entry points.
//!
//! Everything here is `Serialize` so the CLI can print `--json` reports and
//! host services can store them next to the produced PDF. Raw PDF and
//! attachment bytes are never serialized.

use crate::config::ConversionConfig;
use crate::message::{HeaderField, MailBody, MailFormat, MailMessage};
use crate::pipeline::assemble::static_label;
use crate::pipeline::dispatch::{self, Route};
use serde::Serialize;

/// The merged PDF for one mail plus a report of how it was built.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Body PDF followed by every attachment PDF, in attachment order.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    pub request_id: String,
    pub format: MailFormat,
    pub subject: String,
    /// Top-level attachments in the order their PDFs were merged.
    pub attachments: Vec<AttachmentSummary>,
    pub stats: ConversionStats,
}

/// How one attachment ended up in the merged PDF.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentSummary {
    pub filename: String,
    /// Text listed in the header block: the file name, or the subject of a
    /// nested mail.
    pub label: String,
    pub content_type: String,
    pub route: Route,
    pub pdf_bytes: usize,
}

/// Counters and timings for a conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub total_attachments: usize,
    /// Attachments embedded into the body instead of being converted.
    pub inline_images: usize,
    /// Top-level attachments that were themselves mails.
    pub nested_mails: usize,
    pub body_pdf_bytes: usize,
    pub total_pdf_bytes: usize,
    pub total_duration_ms: u64,
}

// ── Inspection ───────────────────────────────────────────────────────────────

/// What a mail contains, decoded without rendering anything.
#[derive(Debug, Clone, Serialize)]
pub struct MailSummary {
    pub name: String,
    pub format: MailFormat,
    pub headers: Vec<HeaderLine>,
    /// `"html"` or `"text"`.
    pub body_kind: &'static str,
    pub body_chars: usize,
    pub attachments: Vec<AttachmentInfo>,
    pub inline_attachments: Vec<AttachmentInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeaderLine {
    pub field: HeaderField,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentInfo {
    pub filename: String,
    pub label: String,
    pub content_type: String,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
    /// Where the attachment would be routed with this configuration.
    pub route: Route,
}

impl MailSummary {
    pub fn from_message(name: &str, message: &MailMessage, config: &ConversionConfig) -> Self {
        let cloud = config.cloud_converter.is_some();
        let info = |a: &crate::message::MailAttachment| AttachmentInfo {
            filename: a.filename.clone(),
            label: static_label(a),
            content_type: a.content_type.clone(),
            size: a.size(),
            content_id: a.content_id.clone(),
            route: if a.is_mail() {
                Route::Msg
            } else {
                dispatch::classify(&a.content_type, cloud)
            },
        };

        let (body_kind, body_chars) = match &message.body {
            MailBody::Html(h) => ("html", h.chars().count()),
            MailBody::Text(t) => ("text", t.chars().count()),
        };

        Self {
            name: name.to_string(),
            format: message.format,
            headers: message
                .headers
                .normalized(&config.date_style)
                .into_iter()
                .map(|(field, value)| HeaderLine {
                    field,
                    label: config.labels.for_field(field).to_string(),
                    value,
                })
                .collect(),
            body_kind,
            body_chars,
            attachments: message.attachments.iter().map(info).collect(),
            inline_attachments: message.inline_attachments.iter().map(info).collect(),
        }
    }
}
