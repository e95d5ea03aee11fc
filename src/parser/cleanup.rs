//! Line-level text cleanup for content-stream extraction.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

fn whitespace_run() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").ok()).as_ref()
}

fn page_label_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:page\s+\d{1,4}(?:\s*(?:of|/)\s*\d{1,4})?|[-–—]\s*\d{1,4}\s*[-–—])$").ok()
    })
    .as_ref()
}

fn bare_number_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,3}(?:\s*(?:of|/)\s*\d{1,4})?$").ok())
        .as_ref()
}

/// Normalize one extracted line.
///
/// Applies NFC, expands Latin ligatures, drops private-use and replacement
/// characters and collapses whitespace runs to a single space.
pub fn clean_line(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfc() {
        if let Some((_, expanded)) = LIGATURES.iter().find(|(l, _)| *l == c) {
            out.push_str(expanded);
        } else if !is_private_use(c) && c != '\u{FFFD}' {
            out.push(c);
        }
    }

    let collapsed = match whitespace_run() {
        Some(re) => re.replace_all(&out, " ").into_owned(),
        None => out,
    };
    collapsed.trim().to_string()
}

/// A line that only a page label can produce ("- 3 -", "Page 4 of 20").
pub fn is_page_label(text: &str) -> bool {
    page_label_pattern().is_some_and(|re| re.is_match(text.trim()))
}

/// A bare page reference ("12", "7 / 30").
///
/// Such a line is just as likely a figure in running text, so callers
/// should also check where it sits on the page.
pub fn is_bare_page_number(text: &str) -> bool {
    bare_number_pattern().is_some_and(|re| re.is_match(text.trim()))
}

fn is_private_use(c: char) -> bool {
    let code = c as u32;
    (0xE000..=0xF8FF).contains(&code)
        || (0xF0000..=0xFFFFD).contains(&code)
        || (0x100000..=0x10FFFD).contains(&code)
}
