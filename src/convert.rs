//! Conversion entry points and the recursive per-message driver.
//!
//! ## Flow for one message
//!
//! ```text
//! decode ─▶ unwrap signed ─▶ prepare ─▶ convert attachments ─▶ finish ─▶ render body ─▶ merge
//!                                         (concurrent; .msg/.eml recurse)
//! ```
//!
//! ## Why all-or-nothing?
//!
//! A merged PDF that silently lacks an attachment looks complete to whoever
//! archives it. Every attachment is attempted, then the first failure (in
//! attachment order) is returned as [`ConvertError::UnresolvedAttachments`]
//! and nothing is merged.

use crate::backend::gotenberg::GotenbergClient;
use crate::backend::{CloudConverter, PdfMerger, Renderer};
use crate::config::ConversionConfig;
use crate::error::{AttachmentError, BackendError, ConvertError};
use crate::message::{MailAttachment, MailFormat, MailMessage};
use crate::output::{AttachmentSummary, ConversionOutput, ConversionStats, MailSummary};
use crate::pipeline::assemble::{self, AssembledMail};
use crate::pipeline::dispatch::{self, Route};
use crate::pipeline::input::{self, SourceDocument};
use crate::pipeline::{eml, msg};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// File name of a clear-signed Outlook payload.
const SIGNED_PAYLOAD_NAME: &str = "smime.p7m";

/// Convert one mail to a single merged PDF.
///
/// # Errors
/// Fatal for the whole mail: undecodable input, any attachment that could not
/// be converted, or a failing renderer/merger. There is no partial output.
pub async fn convert(
    source: SourceDocument,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let start = Instant::now();
    info!(
        "{} - Starting conversion of '{}' ({} bytes)",
        source.id,
        source.name,
        source.data.len()
    );

    // ── Step 1: Decode ───────────────────────────────────────────────────
    let format = source.format()?;
    let message = decode(&source.name, &source.data, format, config)?;

    // ── Step 2: Collaborators ────────────────────────────────────────────
    let ctx = RequestContext {
        config: config.clone(),
        request_id: source.id.clone(),
        backends: resolve_backends(config)?,
    };

    // ── Step 3: Render recursively ───────────────────────────────────────
    let rendered = render_message(&ctx, message, 0).await?;

    let stats = ConversionStats {
        total_attachments: rendered.attachments.len(),
        inline_images: rendered.inline_images,
        nested_mails: rendered
            .attachments
            .iter()
            .filter(|a| matches!(a.route, Route::Msg | Route::Eml))
            .count(),
        body_pdf_bytes: rendered.body_pdf_bytes,
        total_pdf_bytes: rendered.pdf.len(),
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "{} - Conversion complete: {} attachments, {} bytes, {}ms",
        source.id, stats.total_attachments, stats.total_pdf_bytes, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        pdf: rendered.pdf,
        request_id: source.id,
        format,
        subject: rendered.subject,
        attachments: rendered.attachments,
        stats,
    })
}

/// Convert a local mail file or an `http(s)` URL.
pub async fn convert_file(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let source = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    convert(source, config).await
}

/// Convert a mail and write the merged PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let output = convert_file(input_str, config).await?;
    let path = output_path.as_ref();
    let write_failed = |e: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &output.pdf)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;

    debug!("Wrote {} bytes to {}", output.pdf.len(), path.display());
    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    source: SourceDocument,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(source, config))
}

/// Decode and assemble the mail body HTML without rendering anything.
///
/// Attachments are listed by file name (nested mails by subject) but not
/// converted, so no collaborator is needed.
pub fn assemble_html(
    source: &SourceDocument,
    config: &ConversionConfig,
) -> Result<AssembledMail, ConvertError> {
    let message = decode(&source.name, &source.data, source.format()?, config)?;
    let message = unwrap_signed(message, config)?;
    assemble::assemble(message, config)
}

/// Decode headers and the attachment list without rendering.
pub fn inspect(source: &SourceDocument, config: &ConversionConfig) -> Result<MailSummary, ConvertError> {
    let message = decode(&source.name, &source.data, source.format()?, config)?;
    let message = unwrap_signed(message, config)?;
    Ok(MailSummary::from_message(&source.name, &message, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Collaborators resolved once per request.
struct Backends {
    renderer: Arc<dyn Renderer>,
    cloud: Option<Arc<dyn CloudConverter>>,
    merger: Arc<dyn PdfMerger>,
}

struct RequestContext {
    config: ConversionConfig,
    request_id: String,
    backends: Backends,
}

/// One rendered message, body and attachments merged.
struct RenderedMail {
    pdf: Vec<u8>,
    subject: String,
    attachments: Vec<AttachmentSummary>,
    inline_images: usize,
    body_pdf_bytes: usize,
}

struct ConvertedAttachment {
    pdf: Vec<u8>,
    summary: AttachmentSummary,
}

fn decode(
    name: &str,
    data: &[u8],
    format: MailFormat,
    config: &ConversionConfig,
) -> Result<MailMessage, ConvertError> {
    debug!("Decoding '{}' as {}", name, format);
    match format {
        MailFormat::Msg => msg::parse(name, data, config.max_nesting_depth),
        MailFormat::Eml => eml::parse(name, data, &config.date_style),
    }
}

/// Resolve collaborators, from most-specific to least-specific.
///
/// 1. **Pre-built** (`config.renderer`, `config.merger`, `config.cloud_converter`).
/// 2. **Named service** (`config.gotenberg_url`).
/// 3. **Environment** (`GOTENBERG_URL`).
///
/// The cloud converter has no built-in adapter; without one, cloud-only media
/// types fall through to the remaining routes.
fn resolve_backends(config: &ConversionConfig) -> Result<Backends, ConvertError> {
    let needs_service = config.renderer.is_none() || config.merger.is_none();
    let service = if needs_service {
        gotenberg_url(config)
            .map(|url| GotenbergClient::new(url, config.request_timeout_secs))
            .transpose()
            .map_err(|e| ConvertError::BackendNotConfigured {
                backend: "gotenberg".to_string(),
                hint: e.to_string(),
            })?
            .map(Arc::new)
    } else {
        None
    };

    let not_configured = |backend: &str| ConvertError::BackendNotConfigured {
        backend: backend.to_string(),
        hint: "Pass a pre-built collaborator, set `gotenberg_url`, or export GOTENBERG_URL \
(e.g. http://localhost:3000)."
            .to_string(),
    };

    let renderer: Arc<dyn Renderer> = match (&config.renderer, &service) {
        (Some(r), _) => Arc::clone(r),
        (None, Some(g)) => Arc::clone(g) as Arc<dyn Renderer>,
        (None, None) => return Err(not_configured("renderer")),
    };
    let merger: Arc<dyn PdfMerger> = match (&config.merger, &service) {
        (Some(m), _) => Arc::clone(m),
        (None, Some(g)) => Arc::clone(g) as Arc<dyn PdfMerger>,
        (None, None) => return Err(not_configured("merger")),
    };

    Ok(Backends {
        renderer,
        cloud: config.cloud_converter.clone(),
        merger,
    })
}

fn gotenberg_url(config: &ConversionConfig) -> Option<String> {
    if let Some(ref url) = config.gotenberg_url {
        return Some(url.clone());
    }
    std::env::var("GOTENBERG_URL").ok().filter(|v| !v.is_empty())
}

/// Replace a clear-signed message by the MIME message it wraps.
///
/// Triggers on a `.msg` whose only attachment is `smime.p7m`, or whenever the
/// decoder found a signed payload. Outer headers win over the inner ones.
fn unwrap_signed(message: MailMessage, config: &ConversionConfig) -> Result<MailMessage, ConvertError> {
    let payload = match &message.signed_content {
        Some(p) => Some(p.as_slice()),
        None if message.format == MailFormat::Msg
            && message.attachments.len() == 1
            && message.attachments[0]
                .filename
                .eq_ignore_ascii_case(SIGNED_PAYLOAD_NAME) =>
        {
            Some(message.attachments[0].content.as_slice())
        }
        None => None,
    };
    let Some(payload) = payload else {
        return Ok(message);
    };

    debug!("Unwrapping signed payload ({} bytes)", payload.len());
    let inner = eml::parse(SIGNED_PAYLOAD_NAME, payload, &config.date_style)?;
    let headers = inner.headers.clone().overlaid_with(&message.headers);
    Ok(MailMessage { headers, ..inner })
}

/// Render `message` (nested `depth` levels deep) into one merged PDF.
fn render_message(
    ctx: &RequestContext,
    message: MailMessage,
    depth: usize,
) -> BoxFuture<'_, Result<RenderedMail, ConvertError>> {
    async move {
        let limit = ctx.config.max_nesting_depth;
        if depth > limit {
            return Err(ConvertError::NestingTooDeep { limit });
        }

        let message = unwrap_signed(message, &ctx.config)?;
        let subject = message.headers.subject_text().to_string();
        let prepared = assemble::prepare(message, &ctx.config)?;

        let converted =
            convert_attachments(ctx, prepared.attachments, &subject, depth).await?;
        let labels: Vec<String> = converted.iter().map(|c| c.summary.label.clone()).collect();
        let html = assemble::finish(&prepared.html, &prepared.headers, &labels, &ctx.config)?;

        let body_pdf = ctx
            .backends
            .renderer
            .html_to_pdf(&html, &ctx.config.page)
            .await
            .map_err(|source| ConvertError::Render {
                subject: subject.clone(),
                source,
            })?;
        let body_pdf_bytes = body_pdf.len();

        let (pdfs, attachments): (Vec<Vec<u8>>, Vec<AttachmentSummary>) =
            converted.into_iter().map(|c| (c.pdf, c.summary)).unzip();

        let pdf = if pdfs.is_empty() {
            body_pdf
        } else {
            let mut documents = Vec::with_capacity(pdfs.len() + 1);
            documents.push(body_pdf);
            documents.extend(pdfs);
            let count = documents.len();
            debug!("Merging {} documents for '{}'", count, subject);
            ctx.backends
                .merger
                .merge(documents)
                .await
                .map_err(|source| ConvertError::Merge {
                    documents: count,
                    source,
                })?
        };

        Ok(RenderedMail {
            pdf,
            subject,
            attachments,
            inline_images: prepared.inline_resolved,
            body_pdf_bytes,
        })
    }
    .boxed()
}

/// Convert every attachment concurrently; results keep attachment order.
async fn convert_attachments(
    ctx: &RequestContext,
    attachments: Vec<MailAttachment>,
    subject: &str,
    depth: usize,
) -> Result<Vec<ConvertedAttachment>, ConvertError> {
    let total = attachments.len();
    // Nested mails count as one attachment of the top-level message.
    let callback = if depth == 0 {
        ctx.config.progress_callback.clone()
    } else {
        None
    };
    if let Some(ref cb) = callback {
        cb.on_conversion_start(total);
    }

    let mut results: Vec<(usize, Result<ConvertedAttachment, AttachmentError>)> =
        stream::iter(attachments.into_iter().enumerate().map(|(i, attachment)| {
            let callback = callback.clone();
            async move {
                if let Some(ref cb) = callback {
                    cb.on_attachment_start(i + 1, total, &attachment.filename);
                }
                let result = convert_attachment(ctx, attachment, depth).await;
                if let Some(ref cb) = callback {
                    match &result {
                        Ok(c) => cb.on_attachment_complete(i + 1, total, c.pdf.len()),
                        Err(e) => cb.on_attachment_error(i + 1, total, &e.to_string()),
                    }
                }
                (i, result)
            }
        }))
        .buffer_unordered(ctx.config.concurrency)
        .collect()
        .await;
    results.sort_by_key(|(i, _)| *i);

    let mut converted = Vec::with_capacity(total);
    let mut first_error = None;
    let mut failed = 0;
    for (_, result) in results {
        match result {
            Ok(c) => converted.push(c),
            Err(e) => {
                warn!("{} - {}", ctx.request_id, e);
                failed += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    if let Some(ref cb) = callback {
        cb.on_conversion_complete(total, converted.len());
    }

    match first_error {
        Some(first_error) => Err(ConvertError::UnresolvedAttachments {
            request_id: ctx.request_id.clone(),
            subject: subject.to_string(),
            failed,
            total,
            first_error,
        }),
        None => Ok(converted),
    }
}

async fn convert_attachment(
    ctx: &RequestContext,
    attachment: MailAttachment,
    depth: usize,
) -> Result<ConvertedAttachment, AttachmentError> {
    let MailAttachment {
        filename,
        content_type,
        content,
        embedded,
        ..
    } = attachment;

    let nested_failed = |e: ConvertError| AttachmentError::NestedMail {
        filename: filename.clone(),
        detail: e.to_string(),
    };
    let failed = |e: BackendError| AttachmentError::ConversionFailed {
        filename: filename.clone(),
        detail: e.to_string(),
    };
    let renderer = &ctx.backends.renderer;

    let route;
    let label;
    let pdf = if let Some(inner) = embedded {
        route = Route::Msg;
        let nested = render_message(ctx, *inner, depth + 1)
            .await
            .map_err(nested_failed)?;
        label = nested_label(&nested.subject, &filename);
        nested.pdf
    } else {
        route = dispatch::classify(&content_type, ctx.backends.cloud.is_some());
        debug!("Attachment '{}' ({}) → {}", filename, content_type, route);
        let mut nested_subject = None;
        let pdf = match route {
            Route::Primary => {
                let unique = format!("{} - {}", Uuid::new_v4(), filename);
                renderer
                    .document_to_pdf(&unique, &content)
                    .await
                    .map_err(failed)?
            }
            Route::Cloud => {
                let Some(ref cloud) = ctx.backends.cloud else {
                    return Err(AttachmentError::ConversionFailed {
                        filename: filename.clone(),
                        detail: "no cloud converter configured".to_string(),
                    });
                };
                cloud
                    .convert(&filename, &content_type, &content)
                    .await
                    .map_err(failed)?
            }
            Route::Msg | Route::Eml => {
                let decoded = match route {
                    Route::Msg => msg::parse(&filename, &content, ctx.config.max_nesting_depth),
                    _ => eml::parse(&filename, &content, &ctx.config.date_style),
                };
                let message = decoded.map_err(nested_failed)?;
                let nested = render_message(ctx, message, depth + 1)
                    .await
                    .map_err(nested_failed)?;
                nested_subject = Some(nested.subject);
                nested.pdf
            }
            Route::Html => renderer
                .html_to_pdf(&String::from_utf8_lossy(&content), &ctx.config.page)
                .await
                .map_err(failed)?,
            Route::Pdf => content,
            Route::Unsupported => {
                warn!("No conversion for '{}' ({}); adding placeholder", filename, content_type);
                renderer
                    .document_to_pdf(
                        dispatch::PLACEHOLDER_FILENAME,
                        dispatch::placeholder_text(&filename).as_bytes(),
                    )
                    .await
                    .map_err(failed)?
            }
        };
        label = match nested_subject {
            Some(ref s) => nested_label(s, &filename),
            None => filename.clone(),
        };
        pdf
    };

    if pdf.is_empty() {
        return Err(AttachmentError::Empty { filename });
    }

    Ok(ConvertedAttachment {
        summary: AttachmentSummary {
            filename,
            label,
            content_type,
            route,
            pdf_bytes: pdf.len(),
        },
        pdf,
    })
}

/// A nested mail is listed by its subject, or its file name when it has none.
fn nested_label(subject: &str, filename: &str) -> String {
    if subject.trim().is_empty() {
        filename.to_string()
    } else {
        subject.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MailAttachment;

    #[test]
    fn nested_label_prefers_subject() {
        assert_eq!(nested_label("Fwd: numbers", "a.msg"), "Fwd: numbers");
        assert_eq!(nested_label("  ", "a.msg"), "a.msg");
    }

    #[test]
    fn explicit_url_resolves_both_collaborators() {
        let config = ConversionConfig::builder()
            .gotenberg_url("http://localhost:3000")
            .build()
            .unwrap();
        let backends = resolve_backends(&config).unwrap();
        assert!(backends.cloud.is_none());
        let _ = (backends.renderer, backends.merger);
    }

    #[test]
    fn signed_msg_is_replaced_by_inner_mime() {
        let inner = b"Subject: inner\r\nTo: inner@example.com\r\nContent-Type: text/plain\r\n\r\nsigned body\r\n";
        let mut outer = MailMessage::new(MailFormat::Msg);
        outer.headers.subject = Some("outer".into());
        outer.attachments.push(MailAttachment::new(
            "smime.p7m",
            "application/pkcs7-mime",
            inner.to_vec(),
        ));

        let unwrapped = unwrap_signed(outer, &ConversionConfig::default()).unwrap();
        assert_eq!(unwrapped.format, MailFormat::Eml);
        assert_eq!(unwrapped.headers.subject.as_deref(), Some("outer"));
        assert_eq!(unwrapped.headers.to.as_deref(), Some("inner@example.com"));
        assert!(unwrapped.attachments.is_empty());
    }

    #[test]
    fn unsigned_message_is_untouched() {
        let mut m = MailMessage::new(MailFormat::Msg);
        m.attachments
            .push(MailAttachment::new("a.p7m", "application/pkcs7-mime", vec![1]));
        let same = unwrap_signed(m.clone(), &ConversionConfig::default()).unwrap();
        assert_eq!(same, m);
    }
}
