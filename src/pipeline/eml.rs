//! RFC 5322 / MIME normalizer: `.eml` bytes → [`MailMessage`].
//!
//! `mail-parser` does the MIME walking and charset decoding. This module only
//! maps its view onto the shared message shape:
//!
//! - address lists become `Name <addr>, ...`
//! - the date is rendered immediately with the configured [`DateStyle`]
//! - the HTML body keeps its `cid:` links; when only a text part exists,
//!   `mail-parser` supplies an HTML rendition of it
//! - every non-body part becomes an attachment, with its content id when set
//!
//! A message whose only attachment is a detached `application/pgp-signature`
//! gets that attachment relabelled `text/plain` so it is rendered as text
//! rather than rejected.

use crate::error::ConvertError;
use crate::message::{DateStyle, MailAttachment, MailBody, MailDate, MailFormat, MailHeaders, MailMessage};
use crate::pipeline::input::essence;
use crate::pipeline::msg::OCTET_STREAM;
use chrono::DateTime;
use mail_parser::{Address, MessageParser, MimeHeaders};
use tracing::debug;

const PGP_SIGNATURE: &str = "application/pgp-signature";

/// Parse a MIME message.
pub fn parse(name: &str, bytes: &[u8], style: &DateStyle) -> Result<MailMessage, ConvertError> {
    let parsed = MessageParser::default()
        .parse(bytes)
        .ok_or_else(|| ConvertError::MimeParse {
            name: name.to_string(),
        })?;

    let mut message = MailMessage::new(MailFormat::Eml);
    message.headers = MailHeaders {
        from: parsed.from().and_then(format_addresses),
        to: parsed.to().and_then(format_addresses),
        cc: parsed.cc().and_then(format_addresses),
        bcc: parsed.bcc().and_then(format_addresses),
        date: parsed
            .date()
            .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
            .map(|ts| MailDate::Formatted(style.format(&ts))),
        subject: parsed.subject().map(str::to_string),
    };

    message.body = match parsed.body_html(0) {
        Some(html) => MailBody::Html(html.into_owned()),
        None => MailBody::Text(
            parsed
                .body_text(0)
                .map(|t| t.into_owned())
                .unwrap_or_default(),
        ),
    };

    for (index, part) in parsed.attachments().enumerate() {
        let content_type = part
            .content_type()
            .map(|ct| match ct.subtype() {
                Some(sub) => format!("{}/{}", ct.ctype(), sub),
                None => ct.ctype().to_string(),
            })
            .map(|ct| essence(&ct))
            .unwrap_or_else(|| OCTET_STREAM.to_string());

        let filename = match part.attachment_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ if content_type == "message/rfc822" => format!("attachment_{index}.eml"),
            _ => {
                let ext = mime_guess::get_mime_extensions_str(&content_type)
                    .and_then(|exts| exts.first())
                    .unwrap_or(&"dat");
                format!("attachment_{index}.{ext}")
            }
        };

        let mut attachment = MailAttachment::new(filename, content_type, part.contents().to_vec());
        attachment.content_id = part
            .content_id()
            .map(|id| id.trim_matches(|c| c == '<' || c == '>').to_string())
            .filter(|id| !id.is_empty());
        message.attachments.push(attachment);
    }

    if let [only] = message.attachments.as_mut_slice() {
        if only.content_type == PGP_SIGNATURE {
            only.content_type = "text/plain".to_string();
        }
    }

    debug!(
        "Parsed MIME message '{}': {} attachments",
        message.headers.subject_text(),
        message.attachments.len()
    );
    Ok(message)
}

/// `Name <addr>, addr, ...`; `None` when the list is empty.
fn format_addresses(address: &Address<'_>) -> Option<String> {
    let list: Vec<String> = address
        .iter()
        .filter_map(|addr| match (addr.name(), addr.address()) {
            (Some(name), Some(email)) if !name.is_empty() => Some(format!("{name} <{email}>")),
            (_, Some(email)) => Some(email.to_string()),
            (Some(name), None) => Some(name.to_string()),
            (None, None) => None,
        })
        .collect();
    (!list.is_empty()).then(|| list.join(", "))
}
