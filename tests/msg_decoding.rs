//! `.msg` decoding against containers built in memory.

mod common;

use common::*;
use mailpdf::pipeline::properties::{decode_properties, DecodeContext};
use mailpdf::pipeline::{container, msg, properties};
use mailpdf::{
    assemble_html, inspect, ConversionConfig, ConvertError, MailBody, MailDate, MailFormat, Route,
    SourceDocument,
};

fn decode(builder: &MsgBuilder) -> mailpdf::MailMessage {
    msg::parse("fixture.msg", &builder.build(), 8).unwrap()
}

fn source(builder: &MsgBuilder) -> SourceDocument {
    SourceDocument::new("req-1", "fixture.msg", builder.build())
}

#[test]
fn top_level_headers_and_plain_body() {
    let m = decode(
        &MsgBuilder::new()
            .subject("Quarterly numbers")
            .text(TAG_SENDER_NAME, "Alice")
            .text(TAG_SENT_REPRESENTING_NAME, "Finance")
            .text(TAG_SENDER_EMAIL_ADDRESS, "alice@example.com")
            .text(TAG_DISPLAY_TO, "Bob; Carol\0")
            .prop(TAG_MESSAGE_DELIVERY_TIME, Value::Time(filetime(1_705_323_900)))
            .body("line one\r\nline two"),
    );

    assert_eq!(m.format, MailFormat::Msg);
    assert_eq!(m.headers.subject.as_deref(), Some("Quarterly numbers"));
    assert_eq!(
        m.headers.from.as_deref(),
        Some("Alice (Finance) <alice@example.com>")
    );
    assert_eq!(m.headers.to.as_deref(), Some("Bob; Carol"));
    assert!(matches!(m.headers.date, Some(MailDate::Timestamp(_))));
    assert_eq!(m.body, MailBody::Text("line one\r\nline two".into()));
}

const HTML_RTF: &str = r#"{\rtf1\ansi\ansicpg1252\fromhtml1 \deff0
{\*\htmltag19 <html>}
{\*\htmltag50 <body>}\htmlrtf {\htmlrtf0
{\*\htmltag64 <p>}\htmlrtf {\htmlrtf0 See chart{\*\htmltag72 </p>}
{\*\htmltag84 <img src="cid:image001.png@01DA4F2B.3C8E1A70" alt="chart">}
\htmlrtf }\htmlrtf0 {\*\htmltag58 </body>}
{\*\htmltag27 </html>}}"#;

#[test]
fn html_body_is_recovered_from_rtf_and_cid_images_split_off() {
    let builder = MsgBuilder::new()
        .subject("Chart inside")
        .body("plain fallback")
        .prop(TAG_RTF_COMPRESSED, Value::Binary(uncompressed_rtf(HTML_RTF)))
        .file("image001.png", b"\x89PNG")
        .file("report.pdf", b"%PDF-1.7");
    let m = decode(&builder);

    let MailBody::Html(html) = &m.body else {
        panic!("expected an HTML body, got: {:?}", m.body);
    };
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("See chart"), "got: {html}");
    assert!(html.contains(r#"src="cid:image001.png@01DA4F2B.3C8E1A70""#));

    assert_eq!(m.inline_attachments.len(), 1);
    assert_eq!(m.inline_attachments[0].filename, "image001.png");
    assert_eq!(
        m.inline_attachments[0].content_id.as_deref(),
        Some("image001.png@01DA4F2B.3C8E1A70")
    );
    let names: Vec<_> = m.attachments.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec!["report.pdf"]);

    let assembled = assemble_html(&source(&builder), &ConversionConfig::default()).unwrap();
    assert!(assembled.html.contains("data:image/png;base64,"), "got: {}", assembled.html);
    assert!(!assembled.html.contains("cid:"));
    assert!(!assembled.html.contains("plain fallback"));
}

#[test]
fn undecodable_rtf_falls_back_to_the_plain_body() {
    let m = decode(
        &MsgBuilder::new()
            .body("plain text wins")
            .prop(TAG_RTF_COMPRESSED, Value::Binary(vec![0xFF; 20]))
            .file("image001.png", b"\x89PNG"),
    );
    assert_eq!(m.body, MailBody::Text("plain text wins".into()));
    assert!(m.inline_attachments.is_empty());
    assert_eq!(m.attachments[0].filename, "image001.png");
}

#[test]
fn attachment_storages_use_the_short_header() {
    let m = decode(
        &MsgBuilder::new()
            .subject("With files")
            .file("report.pdf", b"%PDF-1.7 report")
            .file("notes.txt", b"plain notes"),
    );

    let names: Vec<_> = m.attachments.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec!["report.pdf", "notes.txt"]);
    assert_eq!(m.attachments[0].content, b"%PDF-1.7 report");
    assert_eq!(m.attachments[0].content_type, "application/pdf");
    assert_eq!(m.attachments[1].content_type, "text/plain");
}

#[test]
fn top_level_stream_read_with_the_wrong_header_is_garbage() {
    let m = msg::parse(
        "fixture.msg",
        &MsgBuilder::new().subject("Hello").top_header_len(24).build(),
        8,
    )
    .unwrap();
    assert_ne!(m.headers.subject.as_deref(), Some("Hello"));
}

#[test]
fn nested_storage_read_with_the_top_level_header_misparses() {
    let bytes = MsgBuilder::new().file("plan.docx", b"PK").build();
    let c = container::parse("fixture.msg", &bytes).unwrap();
    let path = "/__attach_version1.0_#00000000";

    let props = decode_properties(&c, path, false, &mut DecodeContext::new(8)).unwrap();
    assert_eq!(
        props.get("ATTACH_LONG_FILENAME").and_then(|v| v.as_str()),
        Some("plan.docx")
    );
    assert_eq!(
        props.get("ATTACH_DATA_BIN").and_then(|v| v.as_bytes()),
        Some(&b"PK"[..])
    );

    let shifted = decode_properties(&c, path, true, &mut DecodeContext::new(8)).unwrap();
    assert!(!shifted.contains_key("ATTACH_LONG_FILENAME"));
    assert!(!shifted.contains_key("ATTACH_DATA_BIN"));
}

#[test]
fn decoded_keys_come_from_the_tag_table() {
    let bytes = MsgBuilder::new()
        .subject("s")
        .prop(0x7FF1, Value::Int32(7))
        .prop(0x6A00, Value::Binary(vec![1]))
        .build();
    let c = container::parse("fixture.msg", &bytes).unwrap();
    let props = decode_properties(&c, "", true, &mut DecodeContext::new(8)).unwrap();
    assert!(props.keys().all(|name| tag_name_known(name)));
    assert_eq!(props.len(), 1);
}

fn tag_name_known(name: &str) -> bool {
    (0..=u16::MAX).any(|tag| properties::tag_name(tag) == Some(name))
}

#[test]
fn unknown_tags_and_types_are_skipped() {
    let m = decode(
        &MsgBuilder::new()
            .prop(
                0x7FF1,
                Value::Raw {
                    type_code: PT_UNICODE,
                    data: "private".encode_utf16().flat_map(u16::to_le_bytes).collect(),
                },
            )
            .prop(
                TAG_DISPLAY_CC,
                Value::Raw {
                    type_code: 0x0048,
                    data: vec![0; 16],
                },
            )
            .subject("Still decoded"),
    );
    assert_eq!(m.headers.subject.as_deref(), Some("Still decoded"));
    assert_eq!(m.headers.cc, None);
}

#[test]
fn nameless_attachments_are_numbered_per_container() {
    let m = decode(
        &MsgBuilder::new()
            .attachment(PropertyStore::default().set(TAG_ATTACH_DATA, Value::Binary(vec![1, 2])))
            .attachment(
                PropertyStore::default()
                    .text(TAG_ATTACH_MIME_TAG, "message/rfc822")
                    .set(TAG_ATTACH_DATA, Value::Binary(b"Subject: x\r\n\r\nbody".to_vec())),
            )
            .attachment(
                PropertyStore::default()
                    .text(TAG_ATTACH_MIME_TAG, "message/rfc822")
                    .text(TAG_DISPLAY_NAME, "Re: plan/v2?")
                    .set(TAG_ATTACH_DATA, Value::Binary(b"Subject: y\r\n\r\nbody".to_vec())),
            )
            .attachment(PropertyStore::default().set(TAG_ATTACH_DATA, Value::Binary(vec![3]))),
    );

    let names: Vec<_> = m.attachments.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(
        names,
        vec!["unknown_1.dat", "unknown_2.eml", "Re- plan-v2-.eml", "unknown_3.dat"]
    );
    assert_eq!(m.attachments[2].content_type, "message/rfc822");
}

#[test]
fn attachment_without_payload_is_dropped() {
    let m = decode(
        &MsgBuilder::new()
            .attachment(PropertyStore::default().text(TAG_ATTACH_LONG_FILENAME, "ghost.bin"))
            .file("real.txt", b"x"),
    );
    assert_eq!(m.attachments.len(), 1);
    assert_eq!(m.attachments[0].filename, "real.txt");
}

#[test]
fn declared_names_lose_their_directories() {
    let m = decode(&MsgBuilder::new().file(r"C:\Users\a\Desktop\plan.docx", b"PK"));
    assert_eq!(m.attachments[0].filename, "plan.docx");
}

#[test]
fn embedded_message_is_decoded_recursively() {
    let inner = MsgBuilder::new()
        .subject("Original request")
        .body("inner body")
        .file("inner.txt", b"nested file");
    let m = decode(&MsgBuilder::new().subject("Fwd").embedded("Original: request", inner));

    assert_eq!(m.attachments.len(), 1);
    let att = &m.attachments[0];
    assert_eq!(att.filename, "Original- request.msg");
    assert_eq!(att.content_type, "application/vnd.ms-outlook");
    let nested = att.embedded.as_ref().expect("embedded message");
    assert_eq!(nested.headers.subject.as_deref(), Some("Original request"));
    assert_eq!(nested.attachments[0].filename, "inner.txt");
    assert_eq!(nested.attachments[0].content, b"nested file");
}

#[test]
fn embedding_deeper_than_the_limit_fails() {
    let mut builder = MsgBuilder::new().subject("level 3");
    for level in (0..3).rev() {
        builder = MsgBuilder::new()
            .subject(&format!("level {level}"))
            .embedded("child", builder);
    }
    let err = msg::parse("deep.msg", &builder.build(), 2).unwrap_err();
    assert!(
        matches!(err, ConvertError::NestingTooDeep { limit: 2 }),
        "got: {err:?}"
    );
    assert!(msg::parse("deep.msg", &builder.build(), 3).is_ok());
}

#[test]
fn clear_signed_payload_replaces_the_message() {
    let signed = b"Content-Type: multipart/signed; boundary=\"s\"\r\n\r\n--s\r\n\
Content-Type: text/plain\r\n\r\nsigned hello\r\n--s--\r\n";
    let builder = MsgBuilder::new().subject("Signed outer").attachment(
        PropertyStore::default()
            .text(TAG_ATTACH_MIME_TAG, "multipart/signed")
            .set(TAG_ATTACH_DATA, Value::Binary(signed.to_vec())),
    );

    let m = decode(&builder);
    assert!(m.attachments.is_empty());
    assert!(m.signed_content.is_some());

    let assembled = assemble_html(&source(&builder), &ConversionConfig::default()).unwrap();
    assert!(assembled.html.contains("signed hello"), "got: {}", assembled.html);
    assert!(assembled.html.contains("<span> Signed outer</span>"));
}

#[test]
fn signed_attachment_without_text_part_is_kept() {
    let m = decode(
        &MsgBuilder::new().attachment(
            PropertyStore::default()
                .text(TAG_ATTACH_MIME_TAG, "multipart/signed")
                .set(TAG_ATTACH_DATA, Value::Binary(b"opaque".to_vec())),
        ),
    );
    assert!(m.signed_content.is_none());
    assert_eq!(m.attachments[0].filename, "unknown_1.dat");
}

#[test]
fn smime_attachment_is_unwrapped_with_outer_headers() {
    let inner = b"From: inner@example.com\r\nSubject: inner subject\r\n\
Content-Type: text/plain\r\n\r\nthe real content\r\n";
    let builder = MsgBuilder::new()
        .subject("Outer subject")
        .text(TAG_DISPLAY_TO, "Dana")
        .file("smime.p7m", inner);

    let assembled = assemble_html(&source(&builder), &ConversionConfig::default()).unwrap();
    assert!(assembled.html.contains("the real content"));
    assert!(assembled.html.contains("<span> Outer subject</span>"));
    assert!(assembled.html.contains("<span> inner@example.com</span>"));
    assert!(!assembled.html.contains("inner subject"));
    assert!(assembled.attachments.is_empty());
}

#[test]
fn inspect_reports_routes() {
    let builder = MsgBuilder::new()
        .subject("Mixed")
        .file("a.docx", b"PK")
        .file("b.pdf", b"%PDF")
        .file("c.zip", b"PK")
        .embedded("Inner", MsgBuilder::new().subject("Inner"));

    let summary = inspect(&source(&builder), &ConversionConfig::default()).unwrap();
    let routes: Vec<_> = summary.attachments.iter().map(|a| a.route).collect();
    assert_eq!(
        routes,
        vec![Route::Primary, Route::Pdf, Route::Unsupported, Route::Msg]
    );
    assert_eq!(summary.attachments[3].label, "Inner");
}

#[test]
fn corrupt_container_is_rejected() {
    let mut bytes = MsgBuilder::new().subject("x").build();
    bytes.truncate(600);
    let err = msg::parse("broken.msg", &bytes, 8).unwrap_err();
    assert!(matches!(err, ConvertError::MalformedContainer { .. }), "got: {err:?}");

    let err = msg::parse("text.msg", b"not a compound file", 8).unwrap_err();
    assert!(matches!(err, ConvertError::MalformedContainer { .. }));
}
