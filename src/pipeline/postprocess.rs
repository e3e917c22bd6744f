//! Post-processing: deterministic cleanup of the assembled mail document.
//!
//! ## Why is post-processing necessary?
//!
//! Mail bodies are authored for mail clients, not for paged rendering.
//! Outlook in particular emits markup that looks fine on screen but breaks
//! a print layout:
//!
//! - `WordSection1` classes that map to `@page` rules with fixed page sizes
//! - `<pre>` blocks with a fixed width that run off the page edge
//! - no font at all, so the renderer falls back to a serif default
//! - `charset=iso-8859-1` declarations left over after the body was decoded
//!   to UTF-8
//!
//! Each rule is a small function over the document (or the serialized text)
//! and is independently testable.

use crate::pipeline::document::{attr, remove_attr, set_attr, text_content, MailDocument};
use once_cell::sync::Lazy;
use regex::Regex;

/// Apply the tree rules in order.
///
/// 1. Default font on `<body>` when the document sets none
/// 2. Strip page-section classes from `<div>`s
/// 3. Make `<pre>` blocks wrap and drop their fixed widths
pub fn clean_document(doc: &MailDocument, default_font: &str) {
    apply_default_font(doc, default_font);
    strip_page_sections(doc);
    wrap_preformatted(doc);
}

// ── Inline style helpers ─────────────────────────────────────────────────────

fn declarations(style: &str) -> impl Iterator<Item = (String, &str)> + '_ {
    style.split(';').filter_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        let prop = prop.trim().to_ascii_lowercase();
        (!prop.is_empty()).then_some((prop, value.trim()))
    })
}

/// Value of `prop` in an inline style, last declaration wins.
pub fn style_get(style: &str, prop: &str) -> Option<String> {
    declarations(style)
        .filter(|(p, _)| p == prop)
        .last()
        .map(|(_, v)| v.to_string())
}

/// Set `prop`, replacing earlier declarations of it.
pub fn style_set(style: &str, prop: &str, value: &str) -> String {
    let mut out = style_remove(style, prop);
    if !out.is_empty() {
        out.push_str("; ");
    }
    out.push_str(&format!("{prop}: {value}"));
    out
}

pub fn style_remove(style: &str, prop: &str) -> String {
    declarations(style)
        .filter(|(p, _)| p != prop)
        .map(|(p, v)| format!("{p}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

// ── Rule 1: Default font ─────────────────────────────────────────────────────

static RE_CSS_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^{}]+)\{([^}]*)\}").unwrap());
static RE_FONT_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|[;\s])font(-family)?\s*:").unwrap());

fn stylesheet_sets_body_font(css: &str) -> bool {
    RE_CSS_RULE.captures_iter(css).any(|caps| {
        let targets_body = caps[1].split(',').any(|sel| {
            let sel = sel.trim().to_ascii_lowercase();
            sel == "body" || sel == "html" || sel == "*"
        });
        targets_body && RE_FONT_DECL.is_match(&caps[2])
    })
}

fn apply_default_font(doc: &MailDocument, family: &str) {
    let Some(body) = doc.body() else {
        return;
    };
    let style = attr(&body, "style").unwrap_or_default();
    if style_get(&style, "font-family").is_some() || style_get(&style, "font").is_some() {
        return;
    }
    if doc
        .elements("style")
        .iter()
        .any(|s| stylesheet_sets_body_font(&text_content(s)))
    {
        return;
    }
    set_attr(&body, "style", &style_set(&style, "font-family", family));
}

// ── Rule 2: Page-section classes ─────────────────────────────────────────────

const PAGE_SECTION_MARKER: &str = "WordSection";

fn strip_page_sections(doc: &MailDocument) {
    for div in doc.elements("div") {
        let Some(class) = attr(&div, "class") else {
            continue;
        };
        let kept: Vec<&str> = class
            .split_whitespace()
            .filter(|c| !c.contains(PAGE_SECTION_MARKER))
            .collect();
        if kept.is_empty() {
            remove_attr(&div, "class");
        } else {
            set_attr(&div, "class", &kept.join(" "));
        }
    }
}

// ── Rule 3: Preformatted blocks ──────────────────────────────────────────────

fn wrap_preformatted(doc: &MailDocument) {
    for pre in doc.elements("pre") {
        let style = attr(&pre, "style").unwrap_or_default();
        let style = style_set(&style_remove(&style, "width"), "white-space", "pre-wrap");
        set_attr(&pre, "style", &style);
        remove_attr(&pre, "width");
    }
}

// ── Rule 4: Charset declarations (text pass) ─────────────────────────────────

static RE_LATIN1_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(charset\s*=\s*["']?)iso-8859-1"#).unwrap());

/// Rewrite legacy Latin-1 charset declarations to `utf-8`.
///
/// Runs on the serialized document: html5ever always writes UTF-8.
pub fn rewrite_charset(html: &str) -> String {
    RE_LATIN1_CHARSET.replace_all(html, "${1}utf-8").into_owned()
}
