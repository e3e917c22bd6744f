//! Outlook `.msg` normalizer: compound container → [`MailMessage`].
//!
//! ```text
//! bytes ─▶ container::parse ─▶ normalize_entry("", top-level)
//!                                 ├─ decode_properties   (headers, body)
//!                                 ├─ RTF → HTML          (rtf-html)
//!                                 └─ __attach_version1.0_#NNNNNNNN/*
//!                                       └─ decode_properties (24-byte header)
//! ```
//!
//! Attachments whose file name matches a `cid:` reference in the HTML body
//! are moved to [`MailMessage::inline_attachments`] with the full reference
//! as their content id; all others stay in [`MailMessage::attachments`].

use crate::error::ConvertError;
use crate::message::{MailAttachment, MailBody, MailDate, MailFormat, MailHeaders, MailMessage};
use crate::pipeline::container::{self, RawContainer};
use crate::pipeline::properties::{decode_properties, DecodeContext, PropertyMap, PropertyValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Prefix of attachment storages directly below a message storage.
pub const ATTACHMENT_STORAGE_PREFIX: &str = "__attach_version1.0_#";

pub const MSG_CONTENT_TYPE: &str = "application/vnd.ms-outlook";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Wraps de-encapsulated HTML so the renderer reads it as UTF-8.
const HTML_SHELL_START: &str =
    "<!DOCTYPE html><html><head><meta charset=\"UTF-8\"></head><body>";
const HTML_SHELL_END: &str = "</body></html>";

static RE_SENDER_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w\-.]+@([\w-]+\.)+[\w-]{2,4}$").unwrap());

static RE_CID_SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)src=["']cid:(([^@"']+)@[A-Z0-9]+\.[A-Z0-9]+)["']"#).unwrap()
});

static RE_SIGNED_TEXT_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Content-Type: text/(html|plain)").unwrap());

static RE_UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\?%*:|"<>]"#).unwrap());

/// Decode a complete `.msg` file.
pub fn parse(name: &str, bytes: &[u8], max_depth: usize) -> Result<MailMessage, ConvertError> {
    let container = container::parse(name, bytes)?;
    let mut ctx = DecodeContext::new(max_depth);
    normalize_entry(&container, "", true, &mut ctx)
}

/// Normalize the message stored at `entry_path`.
///
/// Called for the root storage (`is_top_level = true`) and, through the
/// property decoder, for every embedded message storage.
pub fn normalize_entry(
    container: &RawContainer,
    entry_path: &str,
    is_top_level: bool,
    ctx: &mut DecodeContext,
) -> Result<MailMessage, ConvertError> {
    let props = decode_properties(container, entry_path, is_top_level, ctx)?;

    let mut message = MailMessage::new(MailFormat::Msg);
    message.headers = headers_from(&props);

    let (body, cid_refs) = body_from(&props);
    message.body = body;

    let attachment_paths: Vec<String> = container
        .children_with_prefix(entry_path, ATTACHMENT_STORAGE_PREFIX)
        .map(|e| e.path().to_string())
        .collect();

    for path in attachment_paths {
        let Some(mut attachment) = process_attachment(container, &path, &mut message, ctx)? else {
            continue;
        };
        match cid_refs.get(&attachment.filename) {
            Some(cid) => {
                attachment.content_id = Some(cid.clone());
                message.inline_attachments.push(attachment);
            }
            None => message.attachments.push(attachment),
        }
    }

    debug!(
        "Decoded message '{}' at '{}': {} attachments, {} inline",
        message.headers.subject_text(),
        entry_path,
        message.attachments.len(),
        message.inline_attachments.len()
    );
    Ok(message)
}

fn str_prop<'a>(props: &'a PropertyMap, name: &str) -> Option<&'a str> {
    props
        .get(name)
        .and_then(PropertyValue::as_str)
        .filter(|s| !s.is_empty())
}

fn headers_from(props: &PropertyMap) -> MailHeaders {
    let mut headers = MailHeaders::default();

    if let Some(PropertyValue::Time(ts)) = props.get("MESSAGE_DELIVERY_TIME") {
        headers.date = Some(MailDate::Timestamp(*ts));
    }

    if let Some(sender) = str_prop(props, "SENDER_NAME") {
        let from = match str_prop(props, "SENT_REPRESENTING_NAME") {
            Some(rep) if rep != sender => format!("{sender} ({rep})"),
            _ => sender.to_string(),
        };
        headers.from = Some(from);
    }

    if let Some(addr) = str_prop(props, "SENDER_EMAIL_ADDRESS") {
        if RE_SENDER_ADDRESS.is_match(addr) {
            let from = match headers.from.take() {
                Some(name) => format!("{name} <{addr}>"),
                None => format!("<{addr}>"),
            };
            headers.from = Some(from);
        }
    }

    let recipients = |name| str_prop(props, name).map(|s| s.trim_end_matches('\0').to_string());
    headers.to = recipients("DISPLAY_TO");
    headers.cc = recipients("DISPLAY_CC");
    headers.bcc = recipients("DISPLAY_BCC");
    headers.subject = str_prop(props, "SUBJECT").map(str::to_string);

    headers
}

/// Pick the body and collect `token → token@host` content-id references.
fn body_from(props: &PropertyMap) -> (MailBody, HashMap<String, String>) {
    let plain = || MailBody::Text(str_prop(props, "BODY").unwrap_or_default().to_string());
    let mut refs = HashMap::new();

    let Some(compressed) = props.get("RTF_COMPRESSED").and_then(PropertyValue::as_bytes) else {
        return (plain(), refs);
    };

    let rtf = match rtf_html::decompress(compressed) {
        Ok(rtf) => rtf,
        Err(e) => {
            warn!("Falling back to plain body: {}", e);
            return (plain(), refs);
        }
    };
    if !rtf_html::is_html_encapsulated(&rtf) {
        return (plain(), refs);
    }

    match rtf_html::deencapsulate_html(&rtf) {
        Ok(html) => {
            for caps in RE_CID_SOURCE.captures_iter(&html) {
                refs.insert(caps[2].to_string(), caps[1].to_string());
            }
            let shell = format!("{HTML_SHELL_START}{html}{HTML_SHELL_END}");
            (MailBody::Html(shell), refs)
        }
        Err(e) => {
            warn!("Falling back to plain body: {}", e);
            (plain(), refs)
        }
    }
}

fn process_attachment(
    container: &RawContainer,
    path: &str,
    message: &mut MailMessage,
    ctx: &mut DecodeContext,
) -> Result<Option<MailAttachment>, ConvertError> {
    let props = decode_properties(container, path, false, ctx)?;

    let (content, embedded) = match props.get("ATTACH_DATA_BIN") {
        Some(PropertyValue::Binary(bytes)) => (bytes.clone(), None),
        Some(PropertyValue::Message(inner)) => (Vec::new(), Some(inner.clone())),
        _ => {
            warn!("Skipping attachment '{}' without payload", path);
            return Ok(None);
        }
    };

    let mut mime_tag = str_prop(&props, "ATTACH_MIME_TAG").map(str::to_string);
    let display_name = str_prop(&props, "DISPLAY_NAME");
    let declared = str_prop(&props, "ATTACH_LONG_FILENAME")
        .or_else(|| str_prop(&props, "ATTACH_FILENAME"))
        .map(str::to_string);

    let filename = match declared {
        Some(name) => name,
        None if embedded.is_some() => {
            mime_tag = Some(MSG_CONTENT_TYPE.to_string());
            match display_name {
                Some(name) => format!("{}.msg", sanitize_display_name(name)),
                None => format!("unknown_{}.msg", ctx.next_unknown_index()),
            }
        }
        None => match mime_tag.as_deref() {
            Some("multipart/signed")
                if RE_SIGNED_TEXT_PART.is_match(&String::from_utf8_lossy(&content)) =>
            {
                debug!("Attachment '{}' carries the clear-signed message", path);
                message.signed_content = Some(content);
                return Ok(None);
            }
            Some("message/rfc822") => match display_name {
                Some(name) => format!("{}.eml", sanitize_display_name(name)),
                None => format!("unknown_{}.eml", ctx.next_unknown_index()),
            },
            _ => format!("unknown_{}.dat", ctx.next_unknown_index()),
        },
    };

    let filename = strip_directories(&filename).to_string();
    let content_type = mime_tag
        .or_else(|| mime_guess::from_path(&filename).first_raw().map(str::to_string))
        .unwrap_or_else(|| OCTET_STREAM.to_string());

    Ok(Some(MailAttachment {
        filename,
        content_type,
        content,
        content_id: None,
        embedded,
    }))
}

fn sanitize_display_name(name: &str) -> String {
    RE_UNSAFE_FILENAME_CHARS.replace_all(name, "-").into_owned()
}

/// Keep only the last path component of a declared file name.
fn strip_directories(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn props(pairs: &[(&'static str, &str)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (*k, PropertyValue::String(v.to_string())))
            .collect()
    }

    #[test]
    fn sender_with_differing_representative_and_valid_address() {
        let p = props(&[
            ("SENDER_NAME", "Alice"),
            ("SENT_REPRESENTING_NAME", "Sales Team"),
            ("SENDER_EMAIL_ADDRESS", "alice@example.com"),
        ]);
        assert_eq!(
            headers_from(&p).from.as_deref(),
            Some("Alice (Sales Team) <alice@example.com>")
        );
    }

    #[test]
    fn exchange_address_is_not_appended() {
        let p = props(&[
            ("SENDER_NAME", "Bob"),
            ("SENT_REPRESENTING_NAME", "Bob"),
            ("SENDER_EMAIL_ADDRESS", "/O=EXCHANGELABS/OU=EXCHANGE/CN=RECIPIENTS/CN=BOB"),
        ]);
        assert_eq!(headers_from(&p).from.as_deref(), Some("Bob"));
    }

    #[test]
    fn recipient_terminators_are_stripped() {
        let p = props(&[("DISPLAY_TO", "Carol; Dave\0"), ("DISPLAY_CC", "Eve\0")]);
        let h = headers_from(&p);
        assert_eq!(h.to.as_deref(), Some("Carol; Dave"));
        assert_eq!(h.cc.as_deref(), Some("Eve"));
        assert_eq!(h.bcc, None);
    }

    #[test]
    fn delivery_time_becomes_timestamp() {
        let ts = Utc.with_ymd_and_hms(2023, 3, 1, 8, 0, 0).unwrap();
        let mut p = PropertyMap::new();
        p.insert("MESSAGE_DELIVERY_TIME", PropertyValue::Time(ts));
        assert_eq!(headers_from(&p).date, Some(MailDate::Timestamp(ts)));
    }

    #[test]
    fn plain_body_without_rtf() {
        let p = props(&[("BODY", "hello\r\nworld")]);
        let (body, refs) = body_from(&p);
        assert_eq!(body, MailBody::Text("hello\r\nworld".into()));
        assert!(refs.is_empty());
    }

    #[test]
    fn broken_rtf_falls_back_to_plain_body() {
        let mut p = props(&[("BODY", "fallback")]);
        p.insert("RTF_COMPRESSED", PropertyValue::Binary(vec![0xFF; 20]));
        let (body, _) = body_from(&p);
        assert_eq!(body, MailBody::Text("fallback".into()));
    }

    #[test]
    fn cid_pattern_captures_token_and_reference() {
        let html = r#"<img src="cid:image001.png@01D9C8A5.1F2E3B40"><img src="cid:nohost">"#;
        let caps: Vec<_> = RE_CID_SOURCE
            .captures_iter(html)
            .map(|c| (c[2].to_string(), c[1].to_string()))
            .collect();
        assert_eq!(
            caps,
            vec![(
                "image001.png".to_string(),
                "image001.png@01D9C8A5.1F2E3B40".to_string()
            )]
        );
    }

    #[test]
    fn filename_helpers() {
        assert_eq!(strip_directories(r"C:\Users\me\report.pdf"), "report.pdf");
        assert_eq!(strip_directories("a/b/c.txt"), "c.txt");
        assert_eq!(strip_directories("plain.txt"), "plain.txt");
        assert_eq!(sanitize_display_name("Re: a/b?"), "Re- a-b-");
    }
}
