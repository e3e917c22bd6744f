//! Attachment classification: media type → conversion route.
//!
//! First match wins:
//!
//! ```text
//! primary renderer ─▶ cloud converter ─▶ .msg ─▶ .eml ─▶ HTML ─▶ PDF ─▶ placeholder
//! ```
//!
//! The cloud route only matches when a cloud converter is configured;
//! otherwise those media types continue down the chain (and usually end as a
//! placeholder page).

use crate::pipeline::input::essence;
use serde::Serialize;
use std::fmt;

/// How one attachment becomes PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Office, text and image formats handled by the primary renderer.
    Primary,
    /// Formats only the cloud office service handles well.
    Cloud,
    /// Nested Outlook message, converted recursively.
    Msg,
    /// Nested MIME message, converted recursively.
    Eml,
    /// Rendered as a web page.
    Html,
    /// Already PDF; passed through unchanged.
    Pdf,
    /// A one-page placeholder naming the file.
    Unsupported,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Route::Primary => "primary",
            Route::Cloud => "cloud",
            Route::Msg => "msg",
            Route::Eml => "eml",
            Route::Html => "html",
            Route::Pdf => "pdf",
            Route::Unsupported => "unsupported",
        };
        f.write_str(s)
    }
}

/// Renderer-native office, text and image formats.
pub static PRIMARY_TYPES: &[&str] = &[
    // also accepted by the cloud service
    "application/epub+zip",
    "application/vnd.ms-powerpoint",
    "application/msword",
    "application/rtf",
    "application/vnd.oasis.opendocument.presentation",
    "application/vnd.oasis.opendocument.spreadsheet",
    "application/vnd.oasis.opendocument.text",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "image/tiff",
    "text/rtf",
    // renderer only
    "application/vnd.dbf",
    "application/postscript",
    "application/vnd.ms-excel",
    "application/vnd.ms-powerpoint.template.macroenabled.12",
    "application/vnd.oasis.opendocument.graphics-template",
    "application/vnd.oasis.opendocument.graphics",
    "application/vnd.oasis.opendocument.spreadsheet-template",
    "application/vnd.oasis.opendocument.text-template",
    "application/vnd.stardivision.calc",
    "application/vnd.stardivision.draw",
    "application/vnd.stardivision.impress",
    "application/vnd.stardivision.writer",
    "application/vnd.sun.xml.calc.template",
    "application/vnd.sun.xml.calc",
    "application/vnd.sun.xml.draw",
    "application/vnd.sun.xml.impress.template",
    "application/vnd.sun.xml.impress",
    "application/vnd.sun.xml.writer.template",
    "application/vnd.sun.xml.writer",
    "application/vnd.palm",
    "application/x-bibtex",
    "application/x-latex",
    "application/x-msmetafile",
    "application/x-pilot",
    "application/x-pocket-excel",
    "application/x-pocket-word",
    "application/x-shockwave-flash",
    "application/x-sylk",
    "application/xml",
    "chemical/x-pdb",
    "image/bmp",
    "image/emf",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "image/wmf",
    "image/x-cmu-raster",
    "image/x-pcx",
    "image/x-ms-bmp",
    "image/x-portable-bitmap",
    "image/x-portable-graymap",
    "image/x-xpixmap",
    "text/csv",
    "text/plain",
    "text/xml",
];

/// Cloud-only formats.
pub static CLOUD_TYPES: &[&str] = &[
    "application/vnd.ms-excel.sheet.macroenabled.12",
    "application/vnd.openxmlformats-officedocument.presentationml.slideshow",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/markdown",
];

const MSG_TYPES: &[&str] = &["application/vnd.ms-outlook"];
const EML_TYPES: &[&str] = &["message/rfc822"];
const HTML_TYPES: &[&str] = &["application/xhtml+xml", "text/html"];
const PDF_TYPES: &[&str] = &["application/pdf"];

/// File name the placeholder document is rendered under.
pub const PLACEHOLDER_FILENAME: &str = "message.txt";

/// Pick the route for a media type. Parameters and case are ignored.
pub fn classify(content_type: &str, cloud_available: bool) -> Route {
    let mime = essence(content_type);
    let is = |table: &[&str]| table.contains(&mime.as_str());

    if is(PRIMARY_TYPES) {
        Route::Primary
    } else if cloud_available && is(CLOUD_TYPES) {
        Route::Cloud
    } else if is(MSG_TYPES) {
        Route::Msg
    } else if is(EML_TYPES) {
        Route::Eml
    } else if is(HTML_TYPES) {
        Route::Html
    } else if is(PDF_TYPES) {
        Route::Pdf
    } else {
        Route::Unsupported
    }
}

/// Body of the placeholder page for an unconvertible attachment.
pub fn placeholder_text(filename: &str) -> String {
    format!("could not be converted: {filename}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn office_and_images_go_to_primary() {
        assert_eq!(
            classify(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                false
            ),
            Route::Primary
        );
        assert_eq!(classify("image/PNG", true), Route::Primary);
        assert_eq!(classify("text/plain; charset=utf-8", false), Route::Primary);
    }

    #[test]
    fn cloud_types_need_a_cloud_converter() {
        let xlsx = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
        assert_eq!(classify(xlsx, true), Route::Cloud);
        assert_eq!(classify(xlsx, false), Route::Unsupported);
        assert_eq!(classify("text/markdown", true), Route::Cloud);
    }

    #[test]
    fn mail_html_pdf_routes() {
        assert_eq!(classify("application/vnd.ms-outlook", false), Route::Msg);
        assert_eq!(classify("message/rfc822", false), Route::Eml);
        assert_eq!(classify("text/html", false), Route::Html);
        assert_eq!(classify("application/xhtml+xml", false), Route::Html);
        assert_eq!(classify("application/pdf", false), Route::Pdf);
    }

    #[test]
    fn unknown_types_get_a_placeholder() {
        assert_eq!(classify("application/x-unknown", true), Route::Unsupported);
        assert_eq!(classify("", true), Route::Unsupported);
        assert_eq!(placeholder_text("a.bin"), "could not be converted: a.bin");
    }

    #[test]
    fn tables_do_not_overlap() {
        for t in CLOUD_TYPES {
            assert!(!PRIMARY_TYPES.contains(t), "{t} in both tables");
        }
    }
}
