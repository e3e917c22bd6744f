//! Input resolution: a user-supplied path, URL or byte buffer → [`SourceDocument`].
//!
//! ## Why sniff the bytes?
//!
//! Mail files arrive with unreliable names and media types: archives hand out
//! `.msg` files as `application/octet-stream`, and webmail exports `.eml` as
//! `text/plain`. Detection therefore tries the declared media type, then the
//! file extension, then the compound-file signature, and only then gives up
//! with [`ConvertError::UnsupportedInput`].

use crate::error::ConvertError;
use crate::message::MailFormat;
use crate::pipeline::container::CFB_SIGNATURE;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One mail to convert, as handed over by the caller.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Caller-chosen request id; prefixes failure messages.
    pub id: String,
    /// Original file name (used for format detection and error messages).
    pub name: String,
    /// Declared media type, if any.
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: None,
            data,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Which decoder handles this document.
    pub fn format(&self) -> Result<MailFormat, ConvertError> {
        MailFormat::detect(self.mime_type.as_deref(), &self.name, &self.data).ok_or_else(|| {
            ConvertError::UnsupportedInput {
                name: self.name.clone(),
                reason: "neither an Outlook .msg container nor a MIME message".into(),
            }
        })
    }
}

/// Lowercase a media type and drop its parameters (`; charset=...`).
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

impl MailFormat {
    /// Detect from declared media type, then extension, then magic bytes.
    pub fn detect(mime_type: Option<&str>, name: &str, data: &[u8]) -> Option<MailFormat> {
        let by_mime = mime_type.map(essence).and_then(|m| match m.as_str() {
            "application/vnd.ms-outlook" => Some(MailFormat::Msg),
            "message/rfc822" => Some(MailFormat::Eml),
            _ => None,
        });
        if by_mime.is_some() {
            return by_mime;
        }

        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("msg") => return Some(MailFormat::Msg),
            Some("eml") => return Some(MailFormat::Eml),
            _ => {}
        }

        if data.starts_with(&CFB_SIGNATURE) {
            return Some(MailFormat::Msg);
        }
        None
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or URL into a [`SourceDocument`].
///
/// The request id defaults to the file name.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<SourceDocument, ConvertError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

/// Read a local mail file.
pub async fn read_local(path: &Path) -> Result<SourceDocument, ConvertError> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(ConvertError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
    };

    let name = file_name(path);
    debug!("Read local mail: {} ({} bytes)", path.display(), data.len());
    let mime_type = mime_guess::from_path(path).first_raw().map(str::to_string);
    Ok(SourceDocument {
        id: name.clone(),
        name,
        mime_type,
        data,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<SourceDocument, ConvertError> {
    info!("Downloading mail from: {}", url);

    let failed = |reason: String| ConvertError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ConvertError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(essence)
        .filter(|m| m != "application/octet-stream");
    let name = extract_filename(url);

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    info!("Downloaded {} ({} bytes)", name, bytes.len());

    Ok(SourceDocument {
        id: name.clone(),
        name,
        mime_type,
        data: bytes.to_vec(),
    })
}

/// Last URL path segment when it looks like a file name.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.eml".to_string()
}
