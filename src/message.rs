//! The format-agnostic message both normalizers produce.
//!
//! A [`MailMessage`] is what the `.msg` decoder ([`crate::pipeline::msg`]) and
//! the MIME decoder ([`crate::pipeline::eml`]) agree on. Everything downstream
//! (document assembly, attachment dispatch) only ever sees this shape.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt::{self, Write as _};

/// Which decoder produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MailFormat {
    /// Outlook compound-file container.
    Msg,
    /// RFC 5322 / MIME message.
    Eml,
}

impl fmt::Display for MailFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailFormat::Msg => f.write_str("msg"),
            MailFormat::Eml => f.write_str("eml"),
        }
    }
}

/// A header date, either still structured or already rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MailDate {
    Timestamp(DateTime<Utc>),
    Formatted(String),
}

/// How timestamps are turned into header text.
#[derive(Debug, Clone)]
pub struct DateStyle {
    pub timezone: Tz,
    pub locale: chrono::Locale,
    /// strftime pattern, e.g. `%A %-d-%m-%Y %H:%M`.
    pub pattern: String,
}

impl Default for DateStyle {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Amsterdam,
            locale: chrono::Locale::nl_NL,
            pattern: "%A %-d-%m-%Y %H:%M".to_string(),
        }
    }
}

impl DateStyle {
    /// `false` when `pattern` contains a specifier chrono cannot format.
    pub fn is_valid_pattern(pattern: &str) -> bool {
        !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
    }

    /// Render in the configured zone and locale.
    ///
    /// An unformattable pattern yields RFC 3339 instead of an error.
    pub fn format(&self, ts: &DateTime<Utc>) -> String {
        let local = ts.with_timezone(&self.timezone);
        let mut out = String::new();
        match write!(out, "{}", local.format_localized(&self.pattern, self.locale)) {
            Ok(()) => out,
            Err(_) => local.to_rfc3339(),
        }
    }
}

impl MailDate {
    /// Render to header text; already formatted dates pass through.
    pub fn to_display(&self, style: &DateStyle) -> String {
        match self {
            MailDate::Timestamp(ts) => style.format(ts),
            MailDate::Formatted(s) => s.clone(),
        }
    }
}

/// The six display headers, in source form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailHeaders {
    pub from: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub date: Option<MailDate>,
    pub subject: Option<String>,
}

/// Header keys in the order they appear in the rendered header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderField {
    From,
    To,
    Date,
    Cc,
    Bcc,
    Subject,
}

impl HeaderField {
    pub const DISPLAY_ORDER: [HeaderField; 6] = [
        HeaderField::From,
        HeaderField::To,
        HeaderField::Date,
        HeaderField::Cc,
        HeaderField::Bcc,
        HeaderField::Subject,
    ];
}

impl MailHeaders {
    /// Overlay `outer` on top of `self`: every header `outer` has wins.
    ///
    /// Used for signed mail, where the envelope carries the real headers and
    /// the nested MIME part often carries none.
    pub fn overlaid_with(mut self, outer: &MailHeaders) -> MailHeaders {
        fn pick<T: Clone>(inner: &mut Option<T>, outer: &Option<T>) {
            if outer.is_some() {
                inner.clone_from(outer);
            }
        }
        pick(&mut self.from, &outer.from);
        pick(&mut self.to, &outer.to);
        pick(&mut self.cc, &outer.cc);
        pick(&mut self.bcc, &outer.bcc);
        pick(&mut self.date, &outer.date);
        pick(&mut self.subject, &outer.subject);
        self
    }

    /// Non-empty headers as display strings, always in [`HeaderField::DISPLAY_ORDER`].
    pub fn normalized(&self, style: &DateStyle) -> Vec<(HeaderField, String)> {
        HeaderField::DISPLAY_ORDER
            .iter()
            .filter_map(|field| {
                let value = match field {
                    HeaderField::From => self.from.clone(),
                    HeaderField::To => self.to.clone(),
                    HeaderField::Date => self.date.as_ref().map(|d| d.to_display(style)),
                    HeaderField::Cc => self.cc.clone(),
                    HeaderField::Bcc => self.bcc.clone(),
                    HeaderField::Subject => self.subject.clone(),
                }?;
                (!value.is_empty()).then_some((*field, value))
            })
            .collect()
    }

    pub fn subject_text(&self) -> &str {
        self.subject.as_deref().unwrap_or("")
    }
}

/// The message body. HTML wins when both renditions exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MailBody {
    Html(String),
    Text(String),
}

impl Default for MailBody {
    fn default() -> Self {
        MailBody::Text(String::new())
    }
}

impl MailBody {
    pub fn as_html(&self) -> Option<&str> {
        match self {
            MailBody::Html(html) => Some(html),
            MailBody::Text(_) => None,
        }
    }
}

/// One attachment as decoded from the container or MIME tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    #[serde(skip)]
    pub content: Vec<u8>,
    /// Full content-id reference (`token@host`) when the body links to it.
    pub content_id: Option<String>,
    /// A `.msg` attachment stored as an embedded message object rather than bytes.
    #[serde(skip)]
    pub embedded: Option<Box<MailMessage>>,
}

impl MailAttachment {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content,
            content_id: None,
            embedded: None,
        }
    }

    /// Byte length of `content`.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn is_mail(&self) -> bool {
        self.embedded.is_some()
    }
}

/// The normalized message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub format: MailFormat,
    pub headers: MailHeaders,
    pub body: MailBody,
    pub attachments: Vec<MailAttachment>,
    /// Attachments referenced from the HTML body by content-id (`.msg` only).
    pub inline_attachments: Vec<MailAttachment>,
    /// A clear-signed payload whose inner MIME message is the real content.
    #[serde(skip)]
    pub signed_content: Option<Vec<u8>>,
}

impl MailMessage {
    pub fn new(format: MailFormat) -> Self {
        Self {
            format,
            headers: MailHeaders::default(),
            body: MailBody::default(),
            attachments: Vec::new(),
            inline_attachments: Vec::new(),
            signed_content: None,
        }
    }

    /// Check the shape the assembly engine relies on.
    ///
    /// `.eml` messages keep content-id links on their regular attachments and
    /// never populate `inline_attachments`; `.msg` inline attachments always
    /// carry a content id.
    pub fn validate(&self) -> Result<(), crate::error::ConvertError> {
        let invalid = |detail: &str| crate::error::ConvertError::InvalidMessage {
            format: self.format.to_string(),
            detail: detail.to_string(),
        };
        match self.format {
            MailFormat::Eml if !self.inline_attachments.is_empty() => {
                Err(invalid("MIME messages carry inline parts as attachments"))
            }
            MailFormat::Msg
                if self
                    .inline_attachments
                    .iter()
                    .any(|a| a.content_id.is_none()) =>
            {
                Err(invalid("inline attachment without a content id"))
            }
            _ => Ok(()),
        }
    }
}
