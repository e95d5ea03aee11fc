//! Paragraph and role types.

use serde::{Deserialize, Serialize};

/// Semantic role of an extracted paragraph.
///
/// Unknown or missing role strings map to [`ParagraphRole::Body`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParagraphRole {
    /// Document-level heading
    Title,
    /// Sub-heading
    SectionHeading,
    /// Running page header
    PageHeader,
    /// Running page footer
    PageFooter,
    /// Printed page number
    PageNumber,
    /// Footnote text
    Footnote,
    /// Ordinary running text
    #[default]
    Body,
}

impl ParagraphRole {
    /// Parse an upstream role string (`"title"`, `"sectionHeading"`, ...).
    pub fn from_upstream(role: Option<&str>) -> Self {
        match role {
            Some("title") => ParagraphRole::Title,
            Some("sectionHeading") => ParagraphRole::SectionHeading,
            Some("pageHeader") => ParagraphRole::PageHeader,
            Some("pageFooter") => ParagraphRole::PageFooter,
            Some("pageNumber") => ParagraphRole::PageNumber,
            Some("footnote") => ParagraphRole::Footnote,
            _ => ParagraphRole::Body,
        }
    }

    /// Page furniture that never reaches a section or a chunk.
    pub fn is_furniture(&self) -> bool {
        matches!(
            self,
            ParagraphRole::PageHeader | ParagraphRole::PageFooter | ParagraphRole::PageNumber
        )
    }

    /// Section level this role opens, if it is a heading role.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            ParagraphRole::Title => Some(1),
            ParagraphRole::SectionHeading => Some(2),
            _ => None,
        }
    }
}

/// A paragraph of text with its role and page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Text content
    pub text: String,

    /// Semantic role
    pub role: ParagraphRole,

    /// Page number (1-indexed)
    pub page: u32,
}

impl Paragraph {
    /// Create a paragraph with an explicit role.
    pub fn new(text: impl Into<String>, role: ParagraphRole, page: u32) -> Self {
        Self {
            text: text.into(),
            role,
            page: page.max(1),
        }
    }

    /// Create a body paragraph.
    pub fn body(text: impl Into<String>, page: u32) -> Self {
        Self::new(text, ParagraphRole::Body, page)
    }

    /// Create a title paragraph.
    pub fn title(text: impl Into<String>, page: u32) -> Self {
        Self::new(text, ParagraphRole::Title, page)
    }

    /// Create a section heading paragraph.
    pub fn section_heading(text: impl Into<String>, page: u32) -> Self {
        Self::new(text, ParagraphRole::SectionHeading, page)
    }

    /// Create a footnote paragraph.
    pub fn footnote(text: impl Into<String>, page: u32) -> Self {
        Self::new(text, ParagraphRole::Footnote, page)
    }

    /// Text as it enters a chunk: footnotes are framed so that retrieval can
    /// tell them apart from running text.
    pub fn chunk_text(&self) -> String {
        match self.role {
            ParagraphRole::Footnote => format!("[Footnote: {}]", self.text),
            _ => self.text.clone(),
        }
    }

    /// Check if the paragraph is empty.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_upstream() {
        assert_eq!(ParagraphRole::from_upstream(Some("title")), ParagraphRole::Title);
        assert_eq!(
            ParagraphRole::from_upstream(Some("sectionHeading")),
            ParagraphRole::SectionHeading
        );
        assert_eq!(
            ParagraphRole::from_upstream(Some("pageFooter")),
            ParagraphRole::PageFooter
        );
        assert_eq!(
            ParagraphRole::from_upstream(Some("footnote")),
            ParagraphRole::Footnote
        );
        assert_eq!(ParagraphRole::from_upstream(Some("formulaBlock")), ParagraphRole::Body);
        assert_eq!(ParagraphRole::from_upstream(None), ParagraphRole::Body);
    }

    #[test]
    fn test_furniture_roles() {
        assert!(ParagraphRole::PageHeader.is_furniture());
        assert!(ParagraphRole::PageFooter.is_furniture());
        assert!(ParagraphRole::PageNumber.is_furniture());
        assert!(!ParagraphRole::Footnote.is_furniture());
        assert!(!ParagraphRole::Body.is_furniture());
    }

    #[test]
    fn test_footnote_chunk_text() {
        let note = Paragraph::footnote("Restated for IFRS 16.", 4);
        assert_eq!(note.chunk_text(), "[Footnote: Restated for IFRS 16.]");

        let body = Paragraph::body("Revenue grew 5%.", 1);
        assert_eq!(body.chunk_text(), "Revenue grew 5%.");
    }

    #[test]
    fn test_page_is_at_least_one() {
        let p = Paragraph::body("x", 0);
        assert_eq!(p.page, 1);
    }
}
