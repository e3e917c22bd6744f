//! # rtf-html
//!
//! Outlook stores the body of many `.msg` files as *compressed RTF*
//! (MS-OXRTFCP). When the message was originally written as HTML, that RTF
//! is only a wrapper: the real markup survives inside `{\*\htmltag…}` groups
//! and the plain RTF in between is fenced off with `\htmlrtf` … `\htmlrtf0`
//! (MS-OXRTFEX). This crate performs both steps:
//!
//! ```text
//! compressed bytes ──▶ decompress() ──▶ RTF text ──▶ deencapsulate_html() ──▶ HTML
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! # fn demo(bytes: &[u8]) -> Result<(), rtf_html::RtfError> {
//! let rtf = rtf_html::decompress(bytes)?;
//! if rtf_html::is_html_encapsulated(&rtf) {
//!     let html = rtf_html::deencapsulate_html(&rtf)?;
//!     println!("{html}");
//! }
//! # Ok(())
//! # }
//! ```

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use thiserror::Error;

/// Marker that every HTML-encapsulating RTF body contains.
pub const HTML_TAG_MARKER: &str = "\\*\\htmltag";

#[derive(Debug, Error)]
pub enum RtfError {
    /// The LZFu stream header or payload is inconsistent.
    #[error("compressed RTF stream is corrupt")]
    Decompress,

    /// The RTF does not carry an HTML body.
    #[error("RTF body does not encapsulate HTML (no \\fromhtml / \\*\\htmltag groups)")]
    NotEncapsulated,
}

/// Decompress an MS-OXRTFCP payload (the `RTF_COMPRESSED` property).
pub fn decompress(data: &[u8]) -> Result<String, RtfError> {
    compressed_rtf::decompress_rtf(data).map_err(|_| RtfError::Decompress)
}

/// True when `rtf` wraps an HTML body rather than native rich text.
pub fn is_html_encapsulated(rtf: &str) -> bool {
    rtf.contains(HTML_TAG_MARKER)
}

/// Recover the HTML that an encapsulating RTF document carries.
pub fn deencapsulate_html(rtf: &str) -> Result<String, RtfError> {
    if !is_html_encapsulated(rtf) {
        return Err(RtfError::NotEncapsulated);
    }
    Ok(Deencapsulator::new(rtf.as_bytes()).run())
}

// ── Tokenizer state ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct GroupState {
    /// Inside a destination whose content never reaches the output.
    skip: bool,
    /// Inside `{\*\htmltagN …}`: content is original HTML.
    html_tag: bool,
    /// `\htmlrtf` is on: the RTF-only rendition must be suppressed.
    suppressed: bool,
    /// Characters to drop after each `\uN`.
    unicode_skip: usize,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            skip: false,
            html_tag: false,
            suppressed: false,
            unicode_skip: 1,
        }
    }
}

impl GroupState {
    fn emits(&self) -> bool {
        !self.skip && (self.html_tag || !self.suppressed)
    }
}

/// Destinations whose whole group is dropped.
const IGNORED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "object",
    "header",
    "footer",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "xmlnstbl",
    "mhtmltag",
];

struct Deencapsulator<'a> {
    src: &'a [u8],
    pos: usize,
    state: GroupState,
    stack: Vec<GroupState>,
    /// Set right after `{` until the first token of the group is seen.
    group_start: bool,
    /// Set after `\*` at the start of a group.
    starred: bool,
    encoding: &'static Encoding,
    pending: Vec<u8>,
    out: String,
}

impl<'a> Deencapsulator<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            state: GroupState::default(),
            stack: Vec::new(),
            group_start: false,
            starred: false,
            encoding: WINDOWS_1252,
            pending: Vec::new(),
            out: String::new(),
        }
    }

    fn run(mut self) -> String {
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            self.pos += 1;
            match b {
                b'{' => {
                    self.stack.push(self.state);
                    self.group_start = true;
                    self.starred = false;
                }
                b'}' => {
                    if let Some(prev) = self.stack.pop() {
                        self.state = prev;
                    }
                    self.group_start = false;
                    self.starred = false;
                }
                b'\\' => self.control(),
                b'\r' | b'\n' => {}
                _ => {
                    self.group_start = false;
                    self.emit_byte(b);
                }
            }
        }
        self.flush();
        self.out
    }

    fn control(&mut self) {
        let Some(&next) = self.src.get(self.pos) else {
            return;
        };
        if next.is_ascii_alphabetic() {
            let (word, param) = self.read_control_word();
            self.apply_word(&word, param);
            return;
        }
        self.pos += 1;
        match next {
            b'*' => {
                // The destination word that follows still opens the group.
                self.starred = self.group_start;
                return;
            }
            b'\'' => {
                let hex = self.src.get(self.pos..self.pos + 2);
                if let Some(byte) = hex
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                {
                    self.pos += 2;
                    self.emit_byte(byte);
                }
            }
            b'{' | b'}' | b'\\' => self.emit_byte(next),
            b'~' => self.emit_char('\u{a0}'),
            b'_' => self.emit_char('-'),
            b'\r' | b'\n' => self.emit_str("\r\n"),
            // \- optional hyphen, \| formula, \: index subentry
            _ => {}
        }
        self.group_start = false;
    }

    fn read_control_word(&mut self) -> (String, Option<i32>) {
        let start = self.pos;
        while self
            .src
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_alphabetic())
        {
            self.pos += 1;
        }
        let word = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();

        let num_start = self.pos;
        if self.src.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        while self.src.get(self.pos).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let param = std::str::from_utf8(&self.src[num_start..self.pos])
            .ok()
            .and_then(|s| s.parse::<i32>().ok());

        // A single space delimits the control word and is part of it.
        if self.src.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }
        (word, param)
    }

    fn apply_word(&mut self, word: &str, param: Option<i32>) {
        let at_group_start = std::mem::replace(&mut self.group_start, false);
        let starred = std::mem::replace(&mut self.starred, false);

        if at_group_start {
            if word == "htmltag" {
                self.state.html_tag = true;
                self.state.skip = false;
                return;
            }
            if starred || IGNORED_DESTINATIONS.contains(&word) {
                self.state.skip = true;
                return;
            }
        }

        match word {
            "htmlrtf" => self.state.suppressed = param != Some(0),
            "ansicpg" => {
                if let Some(cp) = param {
                    self.flush();
                    self.encoding = encoding_for_codepage(cp);
                }
            }
            "par" | "line" => self.emit_str("\r\n"),
            "tab" => self.emit_char('\t'),
            "emdash" => self.emit_char('\u{2014}'),
            "endash" => self.emit_char('\u{2013}'),
            "lquote" => self.emit_char('\u{2018}'),
            "rquote" => self.emit_char('\u{2019}'),
            "ldblquote" => self.emit_char('\u{201c}'),
            "rdblquote" => self.emit_char('\u{201d}'),
            "bullet" => self.emit_char('\u{2022}'),
            "uc" => self.state.unicode_skip = param.unwrap_or(1).max(0) as usize,
            "u" => {
                if let Some(n) = param {
                    // Negative values encode code units above 0x7FFF.
                    let unit = if n < 0 { (n + 65536) as u32 } else { n as u32 };
                    if let Some(c) = char::from_u32(unit) {
                        self.emit_char(c);
                    }
                    self.skip_fallback_chars();
                }
            }
            "bin" => {
                let len = param.unwrap_or(0).max(0) as usize;
                self.pos = (self.pos + len).min(self.src.len());
            }
            _ => {}
        }
    }

    /// Skip the ANSI fallback that follows `\uN` (an `\'hh` counts as one char).
    fn skip_fallback_chars(&mut self) {
        let mut remaining = self.state.unicode_skip;
        while remaining > 0 && self.pos < self.src.len() {
            match self.src[self.pos] {
                b'{' | b'}' => break,
                b'\\' => {
                    if self.src.get(self.pos + 1) == Some(&b'\'') {
                        self.pos += 4;
                    } else {
                        break;
                    }
                }
                _ => self.pos += 1,
            }
            remaining -= 1;
        }
        self.pos = self.pos.min(self.src.len());
    }

    fn emit_byte(&mut self, b: u8) {
        if self.state.emits() {
            self.pending.push(b);
        }
    }

    fn emit_char(&mut self, c: char) {
        if self.state.emits() {
            self.flush();
            self.out.push(c);
        }
    }

    fn emit_str(&mut self, s: &str) {
        if self.state.emits() {
            self.flush();
            self.out.push_str(s);
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let (decoded, _, _) = self.encoding.decode(&self.pending);
        self.out.push_str(&decoded);
        self.pending.clear();
    }
}

/// Map a Windows code page number (as found in `\ansicpgN`) to an encoding.
fn encoding_for_codepage(cp: i32) -> &'static Encoding {
    let label = match cp {
        65001 => return UTF_8,
        932 => "shift_jis".to_string(),
        936 => "gbk".to_string(),
        949 => "euc-kr".to_string(),
        950 => "big5".to_string(),
        20866 => "koi8-r".to_string(),
        28591..=28605 => format!("iso-8859-{}", cp - 28590),
        other => format!("windows-{other}"),
    };
    Encoding::for_label(label.as_bytes()).unwrap_or(WINDOWS_1252)
}
