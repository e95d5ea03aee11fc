//! Sections and their elements.

use serde::{Deserialize, Serialize};

use super::{Paragraph, TableBlock};

/// One entry in a section's ordered content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    /// Running text
    Paragraph(Paragraph),
    /// A whole table
    Table(TableBlock),
}

impl Element {
    /// First page this element touches.
    pub fn page_start(&self) -> u32 {
        match self {
            Element::Paragraph(p) => p.page,
            Element::Table(t) => t.page_start,
        }
    }

    /// Last page this element touches.
    pub fn page_end(&self) -> u32 {
        match self {
            Element::Paragraph(p) => p.page,
            Element::Table(t) => t.page_end,
        }
    }
}

impl From<Paragraph> for Element {
    fn from(p: Paragraph) -> Self {
        Element::Paragraph(p)
    }
}

impl From<TableBlock> for Element {
    fn from(t: TableBlock) -> Self {
        Element::Table(t)
    }
}

/// A headed, contiguous region of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text
    pub heading: String,

    /// 1 = document-level heading, 2 = sub-heading
    pub level: u8,

    /// First page of the section
    pub page_start: u32,

    /// Last page of the section
    pub page_end: u32,

    /// Content in source order
    pub elements: Vec<Element>,
}

impl Section {
    /// Heading used before the first real heading is seen.
    pub const DEFAULT_HEADING: &'static str = "Introduction";

    /// Create an empty section starting and ending on `page`.
    pub fn new(heading: impl Into<String>, level: u8, page: u32) -> Self {
        let page = page.max(1);
        Self {
            heading: heading.into(),
            level: level.clamp(1, 2),
            page_start: page,
            page_end: page,
            elements: Vec::new(),
        }
    }

    /// The implicit section that collects content preceding any heading.
    pub fn introduction() -> Self {
        Self::new(Self::DEFAULT_HEADING, 1, 1)
    }

    /// Append an element, widening `page_end` if needed.
    pub fn push(&mut self, element: impl Into<Element>) {
        let element = element.into();
        self.page_end = self.page_end.max(element.page_end());
        self.elements.push(element);
    }

    /// Check if the section holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over paragraph elements.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.elements.iter().filter_map(|e| match e {
            Element::Paragraph(p) => Some(p),
            Element::Table(_) => None,
        })
    }

    /// Iterate over table elements.
    pub fn tables(&self) -> impl Iterator<Item = &TableBlock> {
        self.elements.iter().filter_map(|e| match e {
            Element::Table(t) => Some(t),
            Element::Paragraph(_) => None,
        })
    }
}
