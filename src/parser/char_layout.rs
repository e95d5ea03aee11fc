//! Character-level page layout decoded from PDF content streams.
//!
//! Text is reported as runs: one [`LayoutChar`] per text-showing operator,
//! positioned in top-down page coordinates so that `top` grows toward the
//! bottom of the page.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::table_detector::TableDetector;
use crate::error::Result;

/// Page height used when no MediaBox can be resolved (US Letter).
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// TJ adjustment (thousandths of text space) treated as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A positioned run of text with its font.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutChar {
    /// Decoded text
    pub text: String,
    /// Left edge
    pub x: f32,
    /// Baseline distance from the top of the page
    pub top: f32,
    /// Estimated advance width
    pub width: f32,
    /// Effective font size in points
    pub size: f32,
    /// Base font name (e.g. "Helvetica-Bold")
    pub font_name: String,
}

impl LayoutChar {
    /// Create a run, estimating its width from the font size.
    pub fn new(
        text: impl Into<String>,
        x: f32,
        top: f32,
        size: f32,
        font_name: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let width = estimate_width(&text, size);
        Self {
            text,
            x,
            top,
            width,
            size,
            font_name: font_name.into(),
        }
    }

    /// Bold fonts carry "Bold" in their name.
    pub fn is_bold(&self) -> bool {
        self.font_name.contains("Bold")
    }

    /// Number of characters in the run.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Rows of a detected table; `None` marks a cell with no text.
pub type TableRows = Vec<Vec<Option<String>>>;

/// Everything the heuristic path needs from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Page height in points; zero when unknown
    pub height: f32,
    /// Text runs outside detected tables
    pub chars: Vec<LayoutChar>,
    /// Tables found on the page, in top-down order
    pub tables: Vec<TableRows>,
}

/// Supplies raw character layout for a PDF.
pub trait CharLayoutProvider: Send + Sync {
    /// Decode every page of `pdf`.
    fn pages(&self, pdf: &[u8]) -> Result<Vec<PageLayout>>;
}

/// [`CharLayoutProvider`] backed by `lopdf` content-stream decoding.
#[derive(Debug, Clone)]
pub struct LopdfCharLayout {
    detector: Option<TableDetector>,
}

impl LopdfCharLayout {
    /// Create a provider that also detects tables.
    pub fn new() -> Self {
        Self {
            detector: Some(TableDetector::new()),
        }
    }

    /// Enable or disable table detection.
    pub fn with_tables(mut self, detect: bool) -> Self {
        self.detector = detect.then(TableDetector::new);
        self
    }

    fn page_layout(&self, doc: &LopdfDocument, page_number: u32, page_id: ObjectId) -> Result<PageLayout> {
        let height = page_height(doc, page_id);
        let content = doc.get_page_content(page_id)?;
        let fonts = doc.get_page_fonts(page_id)?;
        let runs = decode_runs(doc, &content, &fonts, height)?;

        let (tables, chars) = match &self.detector {
            Some(detector) => {
                let detection = detector.detect(runs);
                let tables = detection.tables.into_iter().map(|t| t.rows).collect();
                (tables, detection.remaining)
            }
            None => (Vec::new(), runs),
        };

        Ok(PageLayout {
            page_number,
            height,
            chars,
            tables,
        })
    }
}

impl Default for LopdfCharLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl CharLayoutProvider for LopdfCharLayout {
    fn pages(&self, pdf: &[u8]) -> Result<Vec<PageLayout>> {
        let doc = LopdfDocument::load_mem(pdf)?;
        let pages = doc.get_pages();
        let mut layouts = Vec::with_capacity(pages.len());

        for (page_number, page_id) in pages {
            match self.page_layout(&doc, page_number, page_id) {
                Ok(layout) => layouts.push(layout),
                Err(e) => {
                    log::warn!("Skipping page {}: {}", page_number, e);
                    layouts.push(PageLayout {
                        page_number,
                        ..Default::default()
                    });
                }
            }
        }

        log::debug!(
            "Decoded {} pages, {} text runs",
            layouts.len(),
            layouts.iter().map(|p| p.chars.len()).sum::<usize>()
        );
        Ok(layouts)
    }
}

/// Join runs that share a line, inserting a space where the horizontal gap
/// suggests one.
pub fn line_text(runs: &[&LayoutChar]) -> String {
    let mut sorted: Vec<&LayoutChar> = runs.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut text = String::new();
    let mut prev: Option<&LayoutChar> = None;
    for run in sorted {
        if let Some(prev) = prev {
            if needs_space(prev, run) {
                text.push(' ');
            }
        }
        text.push_str(&run.text);
        prev = Some(run);
    }
    text
}

fn needs_space(prev: &LayoutChar, next: &LayoutChar) -> bool {
    if prev.text.ends_with([' ', '\u{00A0}']) || next.text.starts_with([' ', '\u{00A0}']) {
        return false;
    }
    let char_width = if next.char_count() > 0 && next.width > 0.0 {
        next.width / next.char_count() as f32
    } else {
        next.size * 0.5
    };
    if next.x - prev.right() <= char_width * 0.2 {
        return false;
    }
    let spaceless = |c: Option<char>| c.map(is_spaceless_script_char).unwrap_or(false);
    !(spaceless(prev.text.chars().last()) && spaceless(next.text.chars().next()))
}

fn estimate_width(text: &str, size: f32) -> f32 {
    text.chars()
        .map(|c| if is_spaceless_script_char(c) { size } else { size * 0.5 })
        .sum()
}

/// Resolve the page height from the (possibly inherited) MediaBox.
fn page_height(doc: &LopdfDocument, page_id: ObjectId) -> f32 {
    let mut current = doc.get_dictionary(page_id).ok();
    // Inheritance chains are short; the bound guards against cycles.
    for _ in 0..16 {
        let Some(dict) = current else { break };
        if let Some(height) = media_box_height(doc, dict) {
            return height;
        }
        current = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .ok();
    }
    DEFAULT_PAGE_HEIGHT
}

fn media_box_height(doc: &LopdfDocument, dict: &Dictionary) -> Option<f32> {
    let media_box = match dict.get(b"MediaBox").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let values: Vec<f32> = media_box
        .as_array()
        .ok()?
        .iter()
        .filter_map(number)
        .collect();
    match values.as_slice() {
        [_, y0, _, y1] => Some((y1 - y0).abs()),
        _ => None,
    }
}

/// Text state tracked across a content stream.
struct TextState {
    matrix: [f32; 6],
    line_start: [f32; 2],
    leading: f32,
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    in_text: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            matrix: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            line_start: [0.0, 0.0],
            leading: 0.0,
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            in_text: false,
        }
    }
}

impl TextState {
    fn begin_text(&mut self) {
        self.matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        self.line_start = [0.0, 0.0];
        self.in_text = true;
    }

    fn set_matrix(&mut self, m: [f32; 6]) {
        self.matrix = m;
        self.line_start = [m[4], m[5]];
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, _, _] = self.matrix;
        let e = self.line_start[0] + tx * a + ty * c;
        let f = self.line_start[1] + tx * b + ty * d;
        self.matrix[4] = e;
        self.matrix[5] = f;
        self.line_start = [e, f];
    }

    fn next_line(&mut self) {
        let leading = if self.leading > 0.0 { self.leading } else { self.font_size * 1.2 };
        self.move_line(0.0, -leading);
    }

    fn scale(&self) -> f32 {
        let [a, _, c, _, _, _] = self.matrix;
        (a * a + c * c).sqrt()
    }

    fn effective_size(&self) -> f32 {
        self.font_size * self.scale()
    }

    /// Emit a run at the current position and advance past it.
    fn show(&mut self, text: String, page_height: f32, runs: &mut Vec<LayoutChar>) {
        if text.trim().is_empty() {
            return;
        }
        let size = self.effective_size();
        let run = LayoutChar::new(
            text,
            self.matrix[4],
            page_height - self.matrix[5],
            size,
            self.font_name.clone(),
        );
        self.matrix[4] += run.width;
        runs.push(run);
    }
}

fn decode_runs(
    doc: &LopdfDocument,
    content: &[u8],
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    page_height: f32,
) -> Result<Vec<LayoutChar>> {
    let content = lopdf::content::Content::decode(content)?;
    let mut state = TextState::default();
    let mut runs = Vec::new();

    let decode = |state: &TextState, bytes: &[u8]| -> String {
        fonts
            .get(&state.font_key)
            .and_then(|font| font.get_font_encoding(doc).ok())
            .and_then(|enc| LopdfDocument::decode_text(&enc, bytes).ok())
            .unwrap_or_else(|| decode_text_simple(bytes))
    };

    for op in content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => state.begin_text(),
            "ET" => state.in_text = false,
            "Tf" => {
                if let [Object::Name(key), size, ..] = operands.as_slice() {
                    state.font_name = fonts
                        .get(key)
                        .and_then(|font| font.get(b"BaseFont").ok())
                        .and_then(|name| name.as_name().ok())
                        .map(|name| String::from_utf8_lossy(name).to_string())
                        .unwrap_or_else(|| String::from_utf8_lossy(key).to_string());
                    state.font_key = key.clone();
                    state.font_size = number(size).unwrap_or(12.0);
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                if let [tx, ty, ..] = operands.as_slice() {
                    let (tx, ty) = (number(tx).unwrap_or(0.0), number(ty).unwrap_or(0.0));
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
            }
            "Tm" => {
                if operands.len() >= 6 {
                    let mut m = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                    for (slot, operand) in m.iter_mut().zip(operands.iter()) {
                        if let Some(v) = number(operand) {
                            *slot = v;
                        }
                    }
                    state.set_matrix(m);
                }
            }
            "T*" => state.next_line(),
            "Tj" if state.in_text => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = decode(&state, bytes);
                    state.show(text, page_height, &mut runs);
                }
            }
            "TJ" if state.in_text => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut combined = String::new();
                    for item in items {
                        match item {
                            Object::String(bytes, _) => combined.push_str(&decode(&state, bytes)),
                            other => {
                                let gap = number(other).map(|n| -n).unwrap_or(0.0);
                                if gap > TJ_SPACE_THRESHOLD && ends_with_word_char(&combined) {
                                    combined.push(' ');
                                }
                            }
                        }
                    }
                    state.show(combined, page_height, &mut runs);
                }
            }
            "'" | "\"" => {
                state.next_line();
                let text_index = if op.operator == "\"" { 2 } else { 0 };
                if state.in_text {
                    if let Some(Object::String(bytes, _)) = operands.get(text_index) {
                        let text = decode(&state, bytes);
                        state.show(text, page_height, &mut runs);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(runs)
}

fn ends_with_word_char(text: &str) -> bool {
    match text.chars().last() {
        Some(c) => !c.is_whitespace() && c != '\u{00A0}' && !is_spaceless_script_char(c),
        None => false,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Scripts written without spaces between words (Han, kana, CJK punctuation).
fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x3000..=0x303F
        | 0x3040..=0x309F
        | 0x30A0..=0x30FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0x20000..=0x2EBEF)
}

/// Decode string bytes when the font's encoding is unavailable.
fn decode_text_simple(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, rest @ ..] = bytes {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
