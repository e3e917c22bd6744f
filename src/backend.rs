//! External collaborators: HTML renderer, cloud office converter, PDF merger.
//!
//! The pipeline never produces PDF bytes itself. It hands documents to these
//! three seams and stitches the answers together, so tests can substitute
//! in-memory fakes and deployments can point at whatever service they run.
//!
//! [`gotenberg::GotenbergClient`] implements [`Renderer`] and [`PdfMerger`]
//! against a Gotenberg instance. No built-in [`CloudConverter`] exists; one is
//! only consulted when the caller configures it.

pub mod gotenberg;

use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Page geometry for HTML rendering. Margins are in inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOptions {
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub landscape: bool,
    pub media: MediaType,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            margin_top: 0.5,
            margin_bottom: 0.5,
            margin_left: 0.5,
            margin_right: 0.5,
            landscape: false,
            media: MediaType::Screen,
        }
    }
}

/// CSS media type the renderer emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Screen,
    Print,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Screen => "screen",
            MediaType::Print => "print",
        }
    }
}

/// Turns markup and office documents into PDF.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render a complete HTML document.
    async fn html_to_pdf(&self, html: &str, page: &PageOptions) -> Result<Vec<u8>, BackendError>;

    /// Convert an office document or image; `filename` carries the extension
    /// the renderer uses to pick an import filter.
    async fn document_to_pdf(&self, filename: &str, data: &[u8]) -> Result<Vec<u8>, BackendError>;
}

/// Converts formats the primary renderer handles poorly (macro workbooks,
/// slide shows, markdown) through a cloud office service.
#[async_trait]
pub trait CloudConverter: Send + Sync {
    async fn convert(
        &self,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<Vec<u8>, BackendError>;
}

/// Concatenates PDFs in the given order.
#[async_trait]
pub trait PdfMerger: Send + Sync {
    async fn merge(&self, documents: Vec<Vec<u8>>) -> Result<Vec<u8>, BackendError>;
}
