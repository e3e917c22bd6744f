//! Document assembly: [`MailMessage`] → render-ready HTML.
//!
//! Assembly runs in two synchronous phases around attachment conversion:
//!
//! ```text
//! prepare ── body → tree, inline cid: images → data URIs, cleanup rules
//!    │
//!    ▼   (driver converts the remaining attachments; nested mails yield labels)
//! finish ─── prepend header block (+ attachment labels), charset rewrite
//! ```
//!
//! The header block needs the attachment labels, and a nested mail is
//! labelled by its subject, which is only known after it was converted.
//! Splitting also keeps the `Rc`-based document tree out of any future.

use crate::config::{ConversionConfig, HeaderLabels};
use crate::error::ConvertError;
use crate::message::{MailAttachment, MailBody, MailFormat, MailHeaders, MailMessage};
use crate::pipeline::document::{
    append_child, attr, create_element, create_text, prepend_child, replace_node, set_attr,
    MailDocument,
};
use crate::pipeline::encode::data_uri;
use crate::pipeline::postprocess::{self, style_get};
use markup5ever_rcdom::Handle;
use serde::Serialize;
use tracing::{debug, warn};

/// The body after inline resolution and cleanup, before the header block.
#[derive(Debug, Clone)]
pub struct PreparedBody {
    pub html: String,
    pub headers: MailHeaders,
    /// Attachments still to convert, in original order.
    pub attachments: Vec<MailAttachment>,
    /// Number of attachments embedded as inline images.
    pub inline_resolved: usize,
}

/// A fully assembled mail document without any rendering.
#[derive(Debug, Clone, Serialize)]
pub struct AssembledMail {
    pub html: String,
    pub headers: MailHeaders,
    pub attachments: Vec<MailAttachment>,
    pub inline_resolved: usize,
}

/// Phase one: parse the body, resolve inline images, apply cleanup rules.
pub fn prepare(message: MailMessage, config: &ConversionConfig) -> Result<PreparedBody, ConvertError> {
    message.validate()?;
    let MailMessage {
        format,
        headers,
        body,
        attachments,
        inline_attachments,
        ..
    } = message;

    let doc = match &body {
        MailBody::Html(html) => MailDocument::parse(html),
        MailBody::Text(text) => MailDocument::from_text(text),
    };

    let width = config.inline_image_width_px;
    let (inline_resolved, attachments) = match format {
        MailFormat::Msg => {
            let outcome = resolve_inline_images(&doc, inline_attachments, width);
            let mut remaining = attachments;
            remaining.extend(outcome.unresolved);
            (outcome.resolved, remaining)
        }
        // MIME parts keep their content id on the regular attachment list.
        MailFormat::Eml => {
            let outcome = resolve_inline_images(&doc, attachments, width);
            (outcome.resolved, outcome.unresolved)
        }
    };

    postprocess::clean_document(&doc, &config.default_font_family);

    debug!(
        "Prepared body: {} inline images resolved, {} attachments remain",
        inline_resolved,
        attachments.len()
    );
    Ok(PreparedBody {
        html: doc.serialize()?,
        headers,
        attachments,
        inline_resolved,
    })
}

/// Phase two: prepend the header block and fix charset declarations.
///
/// `attachment_labels` are listed on the final header line, in order.
pub fn finish(
    prepared_html: &str,
    headers: &MailHeaders,
    attachment_labels: &[String],
    config: &ConversionConfig,
) -> Result<String, ConvertError> {
    let doc = MailDocument::parse(prepared_html);
    let rows: Vec<(String, String)> = headers
        .normalized(&config.date_style)
        .into_iter()
        .map(|(field, value)| (config.labels.for_field(field).to_string(), value))
        .collect();

    if let Some(body) = doc.body() {
        prepend_child(&body, header_block(&rows, attachment_labels, &config.labels));
    }
    Ok(postprocess::rewrite_charset(&doc.serialize()?))
}

/// Both phases with attachments labelled by file name (or by subject for
/// embedded messages). No attachment is converted.
pub fn assemble(message: MailMessage, config: &ConversionConfig) -> Result<AssembledMail, ConvertError> {
    let prepared = prepare(message, config)?;
    let labels: Vec<String> = prepared.attachments.iter().map(static_label).collect();
    let html = finish(&prepared.html, &prepared.headers, &labels, config)?;
    Ok(AssembledMail {
        html,
        headers: prepared.headers,
        attachments: prepared.attachments,
        inline_resolved: prepared.inline_resolved,
    })
}

/// Label known without converting: the embedded subject, else the file name.
pub fn static_label(attachment: &MailAttachment) -> String {
    attachment
        .embedded
        .as_ref()
        .map(|m| m.headers.subject_text())
        .filter(|s| !s.is_empty())
        .unwrap_or(&attachment.filename)
        .to_string()
}

fn header_block(rows: &[(String, String)], attachment_labels: &[String], labels: &HeaderLabels) -> Handle {
    let p = create_element("p");
    let push_row = |label: &str, value: &str| {
        let b = create_element("b");
        append_child(&b, create_text(label));
        let span = create_element("span");
        append_child(&span, create_text(&format!(" {value}")));
        append_child(&p, b);
        append_child(&p, span);
        append_child(&p, create_element("br"));
    };

    for (label, value) in rows {
        push_row(label, value);
    }
    if !attachment_labels.is_empty() {
        push_row(
            labels.for_attachments(attachment_labels.len()),
            &attachment_labels.join(", "),
        );
    }
    p
}

// ── Inline images ────────────────────────────────────────────────────────────

pub struct InlineOutcome {
    pub resolved: usize,
    /// Candidates without a matching `<img>`, in input order.
    pub unresolved: Vec<MailAttachment>,
}

/// Replace every `<img src="cid:...">` that names a candidate's content id.
///
/// A candidate is consumed once all its images are replaced. Candidates
/// without a content id, or whose id no image references, are returned.
pub fn resolve_inline_images(
    doc: &MailDocument,
    candidates: Vec<MailAttachment>,
    default_width: u32,
) -> InlineOutcome {
    let mut resolved = 0;
    let mut unresolved = Vec::new();

    for attachment in candidates {
        let Some(cid) = attachment.content_id.as_deref() else {
            unresolved.push(attachment);
            continue;
        };
        let targets: Vec<Handle> = doc
            .elements("img")
            .into_iter()
            .filter(|img| attr(img, "src").as_deref().and_then(cid_of) == Some(cid))
            .collect();

        if targets.is_empty() {
            warn!(
                "No image references cid:{} ({}); keeping it as a regular attachment",
                cid, attachment.filename
            );
            unresolved.push(attachment);
            continue;
        }

        let uri = data_uri(&attachment.content_type, &attachment.content);
        let replaced = targets
            .iter()
            .filter(|img| replace_node(img, inline_block(img, &uri, default_width)))
            .count();
        if replaced == 0 {
            unresolved.push(attachment);
            continue;
        }
        debug!("Inlined {} into {} image(s)", attachment.filename, replaced);
        resolved += 1;
    }

    InlineOutcome {
        resolved,
        unresolved,
    }
}

/// Content id of a `cid:` source.
fn cid_of(src: &str) -> Option<&str> {
    let src = src.trim();
    let prefix = src.get(..4)?;
    prefix.eq_ignore_ascii_case("cid:").then(|| &src[4..])
}

fn inline_block(img: &Handle, uri: &str, default_width: u32) -> Handle {
    let width = dimension(img, "width");
    let height = dimension(img, "height");
    let div = create_element("div");

    match (width, height) {
        (Some(w), Some(h)) => {
            let style = format!(
                "display: inline-block; width: {w}px; height: {h}px; \
background-image: url('{uri}'); background-size: contain; background-repeat: no-repeat"
            );
            set_attr(&div, "style", &style);
        }
        (w, _) => {
            set_attr(&div, "style", "display: inline-block");
            let plain = create_element("img");
            set_attr(&plain, "src", uri);
            let w = w.unwrap_or(default_width);
            set_attr(&plain, "style", &format!("width: {w}px"));
            if let Some(alt) = attr(img, "alt") {
                set_attr(&plain, "alt", &alt);
            }
            append_child(&div, plain);
        }
    }
    div
}

/// Pixel size from the attribute, else from the inline style.
fn dimension(img: &Handle, name: &str) -> Option<u32> {
    let from_attr = attr(img, name).and_then(|v| parse_px(&v));
    from_attr.or_else(|| {
        attr(img, "style")
            .and_then(|style| style_get(&style, name))
            .and_then(|v| parse_px(&v))
    })
}

/// `"120"`, `"120px"`, `"120.4px"` → 120. Percentages and `auto` are unknown.
fn parse_px(value: &str) -> Option<u32> {
    let v = value.trim().to_ascii_lowercase();
    let v = v.strip_suffix("px").unwrap_or(&v).trim();
    let n: f32 = v.parse().ok()?;
    (n.is_finite() && n >= 1.0).then(|| n.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MailDate;

    fn png(name: &str, cid: Option<&str>) -> MailAttachment {
        let mut a = MailAttachment::new(name, "image/png", vec![0x89, b'P', b'N', b'G']);
        a.content_id = cid.map(str::to_string);
        a
    }

    fn msg_with(body: &str) -> MailMessage {
        let mut m = MailMessage::new(MailFormat::Msg);
        m.body = MailBody::Html(body.to_string());
        m
    }

    #[test]
    fn parse_px_variants() {
        assert_eq!(parse_px("120"), Some(120));
        assert_eq!(parse_px(" 64PX "), Some(64));
        assert_eq!(parse_px("10.6px"), Some(11));
        assert_eq!(parse_px("50%"), None);
        assert_eq!(parse_px("auto"), None);
        assert_eq!(parse_px("0"), None);
    }

    #[test]
    fn cid_prefix_is_case_insensitive() {
        assert_eq!(cid_of("CID:a@b"), Some("a@b"));
        assert_eq!(cid_of("cid:"), Some(""));
        assert_eq!(cid_of("http://x"), None);
        assert_eq!(cid_of("ci"), None);
    }

    #[test]
    fn sized_image_becomes_background_block() {
        let mut m = msg_with(r#"<img src="cid:logo.png@01D9.1F2E" width="120" height="40">"#);
        m.inline_attachments.push(png("logo.png", Some("logo.png@01D9.1F2E")));
        let p = prepare(m, &ConversionConfig::default()).unwrap();
        assert_eq!(p.inline_resolved, 1);
        assert!(p.attachments.is_empty());
        assert!(p.html.contains("width: 120px; height: 40px"), "got: {}", p.html);
        assert!(p.html.contains("background-image: url('data:image/png;base64,iVBORw==')"));
        assert!(!p.html.contains("cid:"));
    }

    #[test]
    fn unsized_image_gets_default_width() {
        let mut m = msg_with(r#"<img src="cid:a.png@X.Y" alt="A">"#);
        m.inline_attachments.push(png("a.png", Some("a.png@X.Y")));
        let config = ConversionConfig::builder().inline_image_width_px(320).build().unwrap();
        let p = prepare(m, &config).unwrap();
        assert!(
            p.html.contains(r#"<img src="data:image/png;base64,iVBORw==" style="width: 320px" alt="A">"#),
            "got: {}",
            p.html
        );
    }

    #[test]
    fn unmatched_reference_stays_dangling() {
        let mut m = msg_with(r#"<img src="cid:a.png@X.Y"><img src="cid:b.png@X.Y">"#);
        m.inline_attachments.push(png("a.png", Some("a.png@X.Y")));
        let p = prepare(m, &ConversionConfig::default()).unwrap();
        assert_eq!(p.inline_resolved, 1);
        assert_eq!(p.html.matches("cid:").count(), 1);
        assert!(p.html.contains("cid:b.png@X.Y"));
    }

    #[test]
    fn unresolved_inline_becomes_regular_attachment() {
        let mut m = msg_with("<p>no images</p>");
        m.attachments.push(MailAttachment::new("doc.pdf", "application/pdf", vec![1]));
        m.inline_attachments.push(png("lost.png", Some("lost.png@X.Y")));
        let p = prepare(m, &ConversionConfig::default()).unwrap();
        let names: Vec<_> = p.attachments.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["doc.pdf", "lost.png"]);
    }

    #[test]
    fn eml_inline_parts_are_taken_from_attachments() {
        let mut m = MailMessage::new(MailFormat::Eml);
        m.body = MailBody::Html(r#"<img src="cid:logo@example">"#.into());
        m.attachments.push(MailAttachment::new("a.txt", "text/plain", b"x".to_vec()));
        m.attachments.push(png("logo.png", Some("logo@example")));
        m.attachments.push(png("unused.png", Some("unused@example")));
        let p = prepare(m, &ConversionConfig::default()).unwrap();
        let names: Vec<_> = p.attachments.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "unused.png"]);
        assert_eq!(p.inline_resolved, 1);
    }

    #[test]
    fn second_pass_is_a_noop_for_inline_substitution() {
        let mut m = msg_with(r#"<img src="cid:a.png@X.Y" width="10" height="10">"#);
        m.inline_attachments.push(png("a.png", Some("a.png@X.Y")));
        let config = ConversionConfig::default();
        let first = prepare(m, &config).unwrap();

        let doc = MailDocument::parse(&first.html);
        let outcome = resolve_inline_images(&doc, vec![png("a.png", Some("a.png@X.Y"))], 500);
        assert_eq!(outcome.resolved, 0);
        assert_eq!(doc.serialize().unwrap(), first.html);
    }

    #[test]
    fn header_block_order_and_attachment_line() {
        let headers = MailHeaders {
            subject: Some("Quarterly".into()),
            cc: Some("c@example.com".into()),
            from: Some("Alice <a@example.com>".into()),
            date: Some(MailDate::Formatted("maandag 15-01-2024 14:05".into())),
            ..Default::default()
        };
        let config = ConversionConfig::default();
        let html = finish(
            "<html><body><p>Body</p></body></html>",
            &headers,
            &["report.pdf".into(), "Fwd: numbers".into()],
            &config,
        )
        .unwrap();

        let from = html.find("<b>From:</b>").unwrap();
        let date = html.find("<b>Sent:</b>").unwrap();
        let cc = html.find("<b>CC:</b>").unwrap();
        let subject = html.find("<b>Subject:</b>").unwrap();
        let attachments = html.find("<b>Attachments:</b>").unwrap();
        let body = html.find("<p>Body</p>").unwrap();
        assert!(from < date && date < cc && cc < subject && subject < attachments && attachments < body);
        assert!(html.contains("<span> Alice &lt;a@example.com&gt;</span><br>"), "got: {html}");
        assert!(html.contains("<span> report.pdf, Fwd: numbers</span>"));
        assert!(!html.contains("<b>To:</b>"));
    }

    #[test]
    fn single_attachment_uses_singular_label() {
        let html = finish(
            "<body></body>",
            &MailHeaders::default(),
            &["a.pdf".into()],
            &ConversionConfig::default(),
        )
        .unwrap();
        assert!(html.contains("<b>Attachment:</b><span> a.pdf</span>"), "got: {html}");
    }

    #[test]
    fn finish_rewrites_latin1_declarations() {
        let html = finish(
            r#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=iso-8859-1"></head><body></body></html>"#,
            &MailHeaders::default(),
            &[],
            &ConversionConfig::default(),
        )
        .unwrap();
        assert!(html.contains("charset=utf-8"), "got: {html}");
    }

    #[test]
    fn plain_text_body_is_escaped() {
        let mut m = MailMessage::new(MailFormat::Msg);
        m.body = MailBody::Text("1 < 2\r\nok".into());
        let assembled = assemble(m, &ConversionConfig::default()).unwrap();
        assert!(assembled.html.contains("1 &lt; 2<br>ok"), "got: {}", assembled.html);
        assert!(assembled.html.contains("font-family: Verdana"));
    }

    #[test]
    fn embedded_message_is_labelled_by_subject() {
        let mut inner = MailMessage::new(MailFormat::Msg);
        inner.headers.subject = Some("Inner subject".into());
        let mut att = MailAttachment::new("fwd.msg", "application/vnd.ms-outlook", Vec::new());
        att.embedded = Some(Box::new(inner));
        assert_eq!(static_label(&att), "Inner subject");
        assert_eq!(static_label(&png("x.png", None)), "x.png");
    }
}
