//! Shared fixtures: in-memory `.msg` containers and recording collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use mailpdf::{BackendError, PageOptions, PdfMerger, Renderer};
use std::io::{Cursor, Write};
use std::sync::Mutex;

// ── MSG builder ──────────────────────────────────────────────────────────────

pub const PT_INT32: u16 = 0x0003;
pub const PT_EMBEDDED: u16 = 0x000D;
pub const PT_UNICODE: u16 = 0x001F;
pub const PT_TIME: u16 = 0x0040;
pub const PT_BINARY: u16 = 0x0102;

pub const TAG_SUBJECT: u16 = 0x0037;
pub const TAG_SENT_REPRESENTING_NAME: u16 = 0x0042;
pub const TAG_SENDER_NAME: u16 = 0x0C1A;
pub const TAG_SENDER_EMAIL_ADDRESS: u16 = 0x0C1F;
pub const TAG_DISPLAY_CC: u16 = 0x0E03;
pub const TAG_DISPLAY_TO: u16 = 0x0E04;
pub const TAG_MESSAGE_DELIVERY_TIME: u16 = 0x0E06;
pub const TAG_BODY: u16 = 0x1000;
pub const TAG_RTF_COMPRESSED: u16 = 0x1009;
pub const TAG_DISPLAY_NAME: u16 = 0x3001;
pub const TAG_ATTACH_DATA: u16 = 0x3701;
pub const TAG_ATTACH_FILENAME: u16 = 0x3704;
pub const TAG_ATTACH_LONG_FILENAME: u16 = 0x3707;
pub const TAG_ATTACH_MIME_TAG: u16 = 0x370E;

#[derive(Debug, Clone)]
pub enum Value {
    Unicode(String),
    Binary(Vec<u8>),
    Int32(i32),
    /// FILETIME ticks.
    Time(u64),
    Embedded(Box<MsgBuilder>),
    /// A record with an arbitrary type code and a raw companion stream.
    Raw { type_code: u16, data: Vec<u8> },
}

impl Value {
    fn type_code(&self) -> u16 {
        match self {
            Value::Unicode(_) => PT_UNICODE,
            Value::Binary(_) => PT_BINARY,
            Value::Int32(_) => PT_INT32,
            Value::Time(_) => PT_TIME,
            Value::Embedded(_) => PT_EMBEDDED,
            Value::Raw { type_code, .. } => *type_code,
        }
    }
}

/// A property storage: the message itself or one attachment.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    props: Vec<(u16, Value)>,
}

impl PropertyStore {
    pub fn set(mut self, tag: u16, value: Value) -> Self {
        self.props.push((tag, value));
        self
    }

    pub fn text(self, tag: u16, value: &str) -> Self {
        self.set(tag, Value::Unicode(value.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MsgBuilder {
    message: PropertyStore,
    attachments: Vec<PropertyStore>,
    /// Header length override for the top-level property stream.
    top_header_len: Option<usize>,
}

impl MsgBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, tag: u16, value: &str) -> Self {
        self.message = self.message.text(tag, value);
        self
    }

    pub fn prop(mut self, tag: u16, value: Value) -> Self {
        self.message = self.message.set(tag, value);
        self
    }

    pub fn subject(self, subject: &str) -> Self {
        self.text(TAG_SUBJECT, subject)
    }

    pub fn body(self, body: &str) -> Self {
        self.text(TAG_BODY, body)
    }

    pub fn attachment(mut self, store: PropertyStore) -> Self {
        self.attachments.push(store);
        self
    }

    /// A regular file attachment with a long file name.
    pub fn file(self, filename: &str, data: &[u8]) -> Self {
        self.attachment(
            PropertyStore::default()
                .text(TAG_ATTACH_LONG_FILENAME, filename)
                .set(TAG_ATTACH_DATA, Value::Binary(data.to_vec())),
        )
    }

    /// An attachment holding an embedded message object.
    pub fn embedded(self, display_name: &str, inner: MsgBuilder) -> Self {
        self.attachment(
            PropertyStore::default()
                .text(TAG_DISPLAY_NAME, display_name)
                .set(TAG_ATTACH_DATA, Value::Embedded(Box::new(inner))),
        )
    }

    pub fn top_header_len(mut self, len: usize) -> Self {
        self.top_header_len = Some(len);
        self
    }

    /// Serialize to compound-file bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut comp = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        let header = self.top_header_len.unwrap_or(32);
        self.write_message(&mut comp, "", header);
        comp.flush().unwrap();
        comp.into_inner().into_inner()
    }

    fn write_message(
        &self,
        comp: &mut cfb::CompoundFile<Cursor<Vec<u8>>>,
        storage: &str,
        header_len: usize,
    ) {
        write_store(comp, storage, &self.message, header_len);
        for (i, attachment) in self.attachments.iter().enumerate() {
            let path = format!("{storage}/__attach_version1.0_#{i:08X}");
            comp.create_storage(&path).unwrap();
            write_store(comp, &path, attachment, 24);
        }
    }
}

fn write_store(
    comp: &mut cfb::CompoundFile<Cursor<Vec<u8>>>,
    storage: &str,
    store: &PropertyStore,
    header_len: usize,
) {
    let mut records = vec![0u8; header_len];
    for (tag, value) in &store.props {
        let type_code = value.type_code();
        records.extend_from_slice(&type_code.to_le_bytes());
        records.extend_from_slice(&tag.to_le_bytes());
        records.extend_from_slice(&6u32.to_le_bytes());

        let companion = format!("{storage}/__substg1.0_{tag:04X}{type_code:04X}");
        let mut slot = [0u8; 8];
        match value {
            Value::Int32(v) => slot[..4].copy_from_slice(&v.to_le_bytes()),
            Value::Time(ticks) => slot.copy_from_slice(&ticks.to_le_bytes()),
            Value::Unicode(s) => {
                let bytes: Vec<u8> = s.encode_utf16().flat_map(u16::to_le_bytes).collect();
                slot[..4].copy_from_slice(&(bytes.len() as u32 + 2).to_le_bytes());
                write_stream(comp, &companion, &bytes);
            }
            Value::Binary(data) | Value::Raw { data, .. } => {
                slot[..4].copy_from_slice(&(data.len() as u32).to_le_bytes());
                write_stream(comp, &companion, data);
            }
            Value::Embedded(inner) => {
                slot[..4].copy_from_slice(&u32::MAX.to_le_bytes());
                comp.create_storage(&companion).unwrap();
                inner.write_message(comp, &companion, 24);
            }
        }
        records.extend_from_slice(&slot);
    }
    write_stream(comp, &format!("{storage}/__properties_version1.0"), &records);
}

fn write_stream(comp: &mut cfb::CompoundFile<Cursor<Vec<u8>>>, path: &str, data: &[u8]) {
    let mut stream = comp.create_stream(path).unwrap();
    stream.write_all(data).unwrap();
    stream.flush().unwrap();
}

/// `RTF_COMPRESSED` payload stored without compression (`MELA` header).
pub fn uncompressed_rtf(rtf: &str) -> Vec<u8> {
    let raw = rtf.as_bytes();
    let mut out = Vec::with_capacity(raw.len() + 16);
    out.extend_from_slice(&(raw.len() as u32 + 12).to_le_bytes());
    out.extend_from_slice(&(raw.len() as u32).to_le_bytes());
    out.extend_from_slice(b"MELA");
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(raw);
    out
}

/// FILETIME ticks for a Unix timestamp.
pub fn filetime(unix_secs: i64) -> u64 {
    ((unix_secs + 11_644_473_600) as u64) * 10_000_000
}

// ── Recording collaborators ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    Html(String),
    /// File name as sent (possibly with a unique prefix) and payload.
    Document(String, Vec<u8>),
}

/// Renderer returning `PDF[<what>]` so merged output shows its sources.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Mutex<Vec<RenderCall>>,
    /// Documents whose name ends with this fail with HTTP 500.
    pub fail_suffix: Option<String>,
    /// Documents whose name ends with this render to zero bytes.
    pub empty_suffix: Option<String>,
}

impl RecordingRenderer {
    pub fn failing_on(suffix: &str) -> Self {
        Self {
            fail_suffix: Some(suffix.to_string()),
            ..Self::default()
        }
    }

    pub fn empty_on(suffix: &str) -> Self {
        Self {
            empty_suffix: Some(suffix.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn html_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RenderCall::Html(h) => Some(h),
                RenderCall::Document(..) => None,
            })
            .collect()
    }

    pub fn document_calls(&self) -> Vec<(String, Vec<u8>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RenderCall::Document(n, d) => Some((n, d)),
                RenderCall::Html(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Renderer for RecordingRenderer {
    async fn html_to_pdf(&self, html: &str, _page: &PageOptions) -> Result<Vec<u8>, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push(RenderCall::Html(html.to_string()));
        Ok(b"PDF[html]".to_vec())
    }

    async fn document_to_pdf(&self, filename: &str, data: &[u8]) -> Result<Vec<u8>, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push(RenderCall::Document(filename.to_string(), data.to_vec()));
        if self.fail_suffix.as_deref().is_some_and(|s| filename.ends_with(s)) {
            return Err(BackendError::Status {
                url: "mock://render".into(),
                status: 500,
                body: format!("cannot import {filename}"),
            });
        }
        if self.empty_suffix.as_deref().is_some_and(|s| filename.ends_with(s)) {
            return Ok(Vec::new());
        }
        let original = filename.split_once(" - ").map_or(filename, |(_, n)| n);
        Ok(format!("PDF[{original}]").into_bytes())
    }
}

/// Merger joining its inputs with `+`.
#[derive(Debug, Default)]
pub struct RecordingMerger {
    pub calls: Mutex<Vec<Vec<Vec<u8>>>>,
}

impl RecordingMerger {
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|docs| {
                docs.iter()
                    .map(|d| String::from_utf8_lossy(d).into_owned())
                    .collect()
            })
            .collect()
    }
}

#[async_trait]
impl PdfMerger for RecordingMerger {
    async fn merge(&self, documents: Vec<Vec<u8>>) -> Result<Vec<u8>, BackendError> {
        self.calls.lock().unwrap().push(documents.clone());
        Ok(documents.join(&b'+'))
    }
}
