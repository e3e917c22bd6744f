//! Configuration types for mail-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. One struct holds the collaborators,
//! limits and presentation settings, so a config can be shared across
//! concurrent requests and logged as a whole.
//!
//! # Design choice: builder over constructor
//! Most callers only set a renderer URL and maybe the header language. The
//! builder lets them do exactly that and rely on documented defaults for the
//! rest.

use crate::backend::{CloudConverter, MediaType, PageOptions, PdfMerger, Renderer};
use crate::error::ConvertError;
use crate::message::{DateStyle, HeaderField};
use crate::progress::ProgressCallback;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a mail conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use mailpdf::{ConversionConfig, HeaderLabels};
///
/// let config = ConversionConfig::builder()
///     .gotenberg_url("http://localhost:3000")
///     .labels(HeaderLabels::dutch())
///     .concurrency(8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Pre-built HTML/office renderer. Takes precedence over `gotenberg_url`.
    pub renderer: Option<Arc<dyn Renderer>>,

    /// Optional cloud converter for the formats the primary renderer
    /// handles poorly. Without one those formats fall through to the
    /// remaining routes.
    pub cloud_converter: Option<Arc<dyn CloudConverter>>,

    /// Pre-built PDF merger. Takes precedence over `gotenberg_url`.
    pub merger: Option<Arc<dyn PdfMerger>>,

    /// Base URL of a Gotenberg service used for any collaborator not given
    /// explicitly. Falls back to the `GOTENBERG_URL` environment variable.
    pub gotenberg_url: Option<String>,

    /// Per-request timeout for the built-in HTTP adapter. Default: 120.
    pub request_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Attachments converted concurrently per message. Default: 4.
    ///
    /// Conversions are network-bound; a handful in flight keeps a single
    /// rendering service busy without queueing dozens of office imports.
    pub concurrency: usize,

    /// Maximum depth of mails nested inside mails. Default: 8.
    ///
    /// Bounds both embedded message storages inside one container and
    /// `.msg`/`.eml` attachments converted recursively.
    pub max_nesting_depth: usize,

    /// Font family set on `<body>` when the mail declares none. Default: Verdana.
    pub default_font_family: String,

    /// Width for inline images without intrinsic dimensions. Default: 500.
    pub inline_image_width_px: u32,

    /// Timezone, locale and pattern for header dates.
    pub date_style: DateStyle,

    /// Text shown before each header value.
    pub labels: HeaderLabels,

    /// Page geometry for the rendered mail body.
    pub page: PageOptions,

    /// Optional per-attachment progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            renderer: None,
            cloud_converter: None,
            merger: None,
            gotenberg_url: None,
            request_timeout_secs: 120,
            download_timeout_secs: 120,
            concurrency: 4,
            max_nesting_depth: 8,
            default_font_family: "Verdana".to_string(),
            inline_image_width_px: 500,
            date_style: DateStyle::default(),
            labels: HeaderLabels::default(),
            page: PageOptions::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn Renderer>"))
            .field(
                "cloud_converter",
                &self.cloud_converter.as_ref().map(|_| "<dyn CloudConverter>"),
            )
            .field("merger", &self.merger.as_ref().map(|_| "<dyn PdfMerger>"))
            .field("gotenberg_url", &self.gotenberg_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("max_nesting_depth", &self.max_nesting_depth)
            .field("default_font_family", &self.default_font_family)
            .field("inline_image_width_px", &self.inline_image_width_px)
            .field("date_style", &self.date_style)
            .field("labels", &self.labels)
            .field("page", &self.page)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
            errors: Vec::new(),
        }
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
    errors: Vec<String>,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .field("errors", &self.errors)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn cloud_converter(mut self, converter: Arc<dyn CloudConverter>) -> Self {
        self.config.cloud_converter = Some(converter);
        self
    }

    pub fn merger(mut self, merger: Arc<dyn PdfMerger>) -> Self {
        self.config.merger = Some(merger);
        self
    }

    pub fn gotenberg_url(mut self, url: impl Into<String>) -> Self {
        self.config.gotenberg_url = Some(url.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.config.max_nesting_depth = depth;
        self
    }

    pub fn default_font_family(mut self, family: impl Into<String>) -> Self {
        self.config.default_font_family = family.into();
        self
    }

    pub fn inline_image_width_px(mut self, px: u32) -> Self {
        self.config.inline_image_width_px = px;
        self
    }

    pub fn timezone(mut self, tz: Tz) -> Self {
        self.config.date_style.timezone = tz;
        self
    }

    /// IANA zone name, e.g. `Europe/Amsterdam`. Unknown names fail in [`build`](Self::build).
    pub fn timezone_name(mut self, name: &str) -> Self {
        match name.parse::<Tz>() {
            Ok(tz) => self.config.date_style.timezone = tz,
            Err(_) => self.errors.push(format!("Unknown timezone '{name}'")),
        }
        self
    }

    pub fn date_locale(mut self, locale: chrono::Locale) -> Self {
        self.config.date_style.locale = locale;
        self
    }

    /// POSIX locale name, e.g. `nl_NL` or `en_US`.
    pub fn date_locale_name(mut self, name: &str) -> Self {
        match chrono::Locale::try_from(name) {
            Ok(locale) => self.config.date_style.locale = locale,
            Err(_) => self.errors.push(format!("Unknown date locale '{name}'")),
        }
        self
    }

    /// strftime-style pattern for header dates.
    pub fn date_format(mut self, pattern: impl Into<String>) -> Self {
        self.config.date_style.pattern = pattern.into();
        self
    }

    pub fn labels(mut self, labels: HeaderLabels) -> Self {
        self.config.labels = labels;
        self
    }

    pub fn page(mut self, page: PageOptions) -> Self {
        self.config.page = page;
        self
    }

    /// Same margin on every side, in inches.
    pub fn margins(mut self, inches: f32) -> Self {
        let p = &mut self.config.page;
        p.margin_top = inches;
        p.margin_bottom = inches;
        p.margin_left = inches;
        p.margin_right = inches;
        self
    }

    pub fn landscape(mut self, v: bool) -> Self {
        self.config.page.landscape = v;
        self
    }

    pub fn media_type(mut self, media: MediaType) -> Self {
        self.config.page.media = media;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        if let Some(first) = self.errors.into_iter().next() {
            return Err(ConvertError::InvalidConfig(first));
        }
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ConvertError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.max_nesting_depth == 0 {
            return Err(ConvertError::InvalidConfig(
                "Nesting depth must be ≥ 1 to decode any attachment".into(),
            ));
        }
        if !DateStyle::is_valid_pattern(&c.date_style.pattern) {
            return Err(ConvertError::InvalidConfig(format!(
                "Unsupported date format '{}'",
                c.date_style.pattern
            )));
        }
        if c.inline_image_width_px == 0 {
            return Err(ConvertError::InvalidConfig(
                "Inline image width must be positive".into(),
            ));
        }
        let margins = [
            c.page.margin_top,
            c.page.margin_bottom,
            c.page.margin_left,
            c.page.margin_right,
        ];
        if margins.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "Margins must be non-negative inches, got {margins:?}"
            )));
        }
        Ok(self.config)
    }
}

// ── Header labels ────────────────────────────────────────────────────────

/// Text rendered before each header value in the document header block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderLabels {
    pub from: String,
    pub to: String,
    pub date: String,
    pub cc: String,
    pub bcc: String,
    pub subject: String,
    /// Used when exactly one attachment is listed.
    pub attachment: String,
    /// Used when more than one attachment is listed.
    pub attachments: String,
}

impl Default for HeaderLabels {
    fn default() -> Self {
        Self::english()
    }
}

impl HeaderLabels {
    pub fn english() -> Self {
        Self {
            from: "From:".into(),
            to: "To:".into(),
            date: "Sent:".into(),
            cc: "CC:".into(),
            bcc: "BCC:".into(),
            subject: "Subject:".into(),
            attachment: "Attachment:".into(),
            attachments: "Attachments:".into(),
        }
    }

    pub fn dutch() -> Self {
        Self {
            from: "Van:".into(),
            to: "Naar:".into(),
            date: "Verzonden op:".into(),
            cc: "CC:".into(),
            bcc: "BCC:".into(),
            subject: "Onderwerp:".into(),
            attachment: "Bijlage:".into(),
            attachments: "Bijlagen:".into(),
        }
    }

    pub fn for_field(&self, field: HeaderField) -> &str {
        match field {
            HeaderField::From => &self.from,
            HeaderField::To => &self.to,
            HeaderField::Date => &self.date,
            HeaderField::Cc => &self.cc,
            HeaderField::Bcc => &self.bcc,
            HeaderField::Subject => &self.subject,
        }
    }

    /// Singular or plural attachment label.
    pub fn for_attachments(&self, count: usize) -> &str {
        if count > 1 {
            &self.attachments
        } else {
            &self.attachment
        }
    }
}
