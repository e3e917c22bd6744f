//! Gotenberg adapter for [`Renderer`] and [`PdfMerger`].
//!
//! ```text
//! html_to_pdf      POST /forms/chromium/convert/html   files=index.html
//! document_to_pdf  POST /forms/libreoffice/convert     files=<filename>
//! merge            POST /forms/pdfengines/merge        files=0000.pdf, 0001.pdf, …
//! ```
//!
//! Gotenberg merges in alphabetical file-name order, so merge parts get
//! zero-padded names to keep `pdf10` from sorting before `pdf2`.

use super::{PageOptions, PdfMerger, Renderer};
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::debug;

const HTML_ROUTE: &str = "/forms/chromium/convert/html";
const OFFICE_ROUTE: &str = "/forms/libreoffice/convert";
const MERGE_ROUTE: &str = "/forms/pdfengines/merge";

#[derive(Debug, Clone)]
pub struct GotenbergClient {
    base_url: String,
    http: reqwest::Client,
    timeout_secs: u64,
}

impl GotenbergClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, BackendError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BackendError::Http {
                url: base_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            base_url,
            http,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn post_form(&self, route: &str, form: Form) -> Result<Vec<u8>, BackendError> {
        let url = self.url(route);
        debug!("POST {}", url);

        let transport = |e: reqwest::Error| {
            if e.is_timeout() {
                BackendError::Timeout {
                    url: url.clone(),
                    secs: self.timeout_secs,
                }
            } else {
                BackendError::Http {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            }
        };

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                url: url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(transport)?;
        debug!("{} answered {} bytes", url, bytes.len());
        Ok(bytes.to_vec())
    }
}

fn file_part(filename: &str, mime: &str, data: Vec<u8>) -> Result<Part, BackendError> {
    Part::bytes(data)
        .file_name(filename.to_string())
        .mime_str(mime)
        .map_err(|e| BackendError::Http {
            url: String::new(),
            reason: format!("invalid part '{filename}': {e}"),
        })
}

/// Chromium form fields for the page geometry.
fn page_fields(form: Form, page: &PageOptions) -> Form {
    form.text("marginTop", page.margin_top.to_string())
        .text("marginBottom", page.margin_bottom.to_string())
        .text("marginLeft", page.margin_left.to_string())
        .text("marginRight", page.margin_right.to_string())
        .text("landscape", page.landscape.to_string())
        .text("emulatedMediaType", page.media.as_str())
}

/// Part name for the `index`-th merge input.
pub fn merge_part_name(index: usize) -> String {
    format!("{index:04}.pdf")
}

#[async_trait]
impl Renderer for GotenbergClient {
    async fn html_to_pdf(&self, html: &str, page: &PageOptions) -> Result<Vec<u8>, BackendError> {
        let part = file_part("index.html", "text/html", html.as_bytes().to_vec())?;
        let form = page_fields(Form::new().part("files", part), page);
        self.post_form(HTML_ROUTE, form).await
    }

    async fn document_to_pdf(&self, filename: &str, data: &[u8]) -> Result<Vec<u8>, BackendError> {
        let mime = mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or("application/octet-stream");
        let part = file_part(filename, mime, data.to_vec())?;
        self.post_form(OFFICE_ROUTE, Form::new().part("files", part))
            .await
    }
}

#[async_trait]
impl PdfMerger for GotenbergClient {
    async fn merge(&self, documents: Vec<Vec<u8>>) -> Result<Vec<u8>, BackendError> {
        let mut form = Form::new();
        for (i, pdf) in documents.into_iter().enumerate() {
            form = form.part("files", file_part(&merge_part_name(i), "application/pdf", pdf)?);
        }
        self.post_form(MERGE_ROUTE, form).await
    }
}
