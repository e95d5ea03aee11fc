//! Section building: one forward fold over the paragraph stream.

use std::collections::{HashMap, VecDeque};

use crate::model::{NormalizedLayout, Paragraph, ParagraphRole, Section, TableBlock};

/// Build the section list for a normalized layout.
///
/// Page furniture is dropped, tables are interleaved by page, and a section
/// is emitted only if it received at least one element.
pub fn build_sections(layout: &NormalizedLayout) -> Vec<Section> {
    let sections = layout
        .paragraphs
        .iter()
        .fold(SectionBuilder::new(layout), SectionBuilder::step)
        .finish();

    log::debug!(
        "Built {} sections from {} paragraphs and {} tables",
        sections.len(),
        layout.paragraphs.len(),
        layout.tables.len()
    );
    sections
}

/// Accumulator state of the fold.
#[derive(Debug)]
pub struct SectionBuilder {
    done: Vec<Section>,
    current: Section,
    pending_tables: VecDeque<TableBlock>,
    heading_levels: HashMap<String, u8>,
}

impl SectionBuilder {
    /// Start a fold for `layout`.
    pub fn new(layout: &NormalizedLayout) -> Self {
        let mut tables = layout.tables.clone();
        tables.sort_by_key(|t| (t.page_start, t.page_end));

        // Font-inferred headings match by exact text; the first detection
        // of a text fixes its level.
        let mut heading_levels = HashMap::new();
        for heading in &layout.headings {
            heading_levels
                .entry(heading.text.clone())
                .or_insert(heading.level);
        }

        Self {
            done: Vec::new(),
            current: Section::introduction(),
            pending_tables: tables.into(),
            heading_levels,
        }
    }

    /// Consume one paragraph.
    pub fn step(mut self, paragraph: &Paragraph) -> Self {
        let role = self.role_of(paragraph);
        if role.is_furniture() {
            return self;
        }

        self.drain_tables_through(paragraph.page);

        match role.heading_level() {
            Some(level) => {
                let next = Section::new(paragraph.text.clone(), level, paragraph.page);
                let finished = std::mem::replace(&mut self.current, next);
                self.emit(finished);
            }
            None => self.current.push(paragraph.clone()),
        }
        self
    }

    /// Place the remaining tables and close the last section.
    pub fn finish(mut self) -> Vec<Section> {
        while let Some(table) = self.pending_tables.pop_front() {
            self.current.push(table);
        }
        let last = std::mem::replace(&mut self.current, Section::introduction());
        self.emit(last);
        self.done
    }

    fn role_of(&self, paragraph: &Paragraph) -> ParagraphRole {
        if paragraph.role != ParagraphRole::Body {
            return paragraph.role;
        }
        match self.heading_levels.get(&paragraph.text) {
            Some(1) => ParagraphRole::Title,
            Some(_) => ParagraphRole::SectionHeading,
            None => ParagraphRole::Body,
        }
    }

    fn drain_tables_through(&mut self, page: u32) {
        while self
            .pending_tables
            .front()
            .is_some_and(|t| t.page_start <= page)
        {
            if let Some(table) = self.pending_tables.pop_front() {
                self.current.push(table);
            }
        }
    }

    fn emit(&mut self, section: Section) {
        if !section.is_empty() {
            self.done.push(section);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DetectedHeading, Element};

    fn layout(paragraphs: Vec<Paragraph>, tables: Vec<TableBlock>) -> NormalizedLayout {
        NormalizedLayout {
            paragraphs,
            tables,
            page_count: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_title_and_body() {
        let sections = build_sections(&layout(
            vec![
                Paragraph::title("Annual Report", 1),
                Paragraph::body("Revenue grew 5%.", 1),
            ],
            Vec::new(),
        ));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Annual Report");
        assert_eq!(sections[0].level, 1);
        assert_eq!((sections[0].page_start, sections[0].page_end), (1, 1));
    }

    #[test]
    fn test_empty_layout() {
        assert!(build_sections(&NormalizedLayout::default()).is_empty());
    }

    #[test]
    fn test_content_before_first_heading_goes_to_introduction() {
        let sections = build_sections(&layout(
            vec![
                Paragraph::body("Forward-looking statements.", 1),
                Paragraph::title("Overview", 2),
                Paragraph::body("We make widgets.", 2),
            ],
            Vec::new(),
        ));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "Introduction");
        assert_eq!(sections[1].heading, "Overview");
    }

    #[test]
    fn test_empty_sections_not_emitted() {
        let sections = build_sections(&layout(
            vec![
                Paragraph::title("Part I", 1),
                Paragraph::section_heading("Item 1", 1),
                Paragraph::body("Business.", 2),
            ],
            Vec::new(),
        ));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Item 1");
        assert_eq!(sections[0].level, 2);
        assert_eq!((sections[0].page_start, sections[0].page_end), (1, 2));
    }

    #[test]
    fn test_furniture_filtered() {
        let sections = build_sections(&layout(
            vec![
                Paragraph::new("ACME Corp 10-K", ParagraphRole::PageHeader, 1),
                Paragraph::body("Text.", 1),
                Paragraph::new("Page 1", ParagraphRole::PageNumber, 1),
                Paragraph::new("Confidential", ParagraphRole::PageFooter, 1),
                Paragraph::footnote("Restated.", 1),
            ],
            Vec::new(),
        ));
        let texts: Vec<&str> = sections[0].paragraphs().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["Text.", "Restated."]);
        assert_eq!(
            sections[0].paragraphs().nth(1).map(|p| p.role),
            Some(ParagraphRole::Footnote)
        );
    }

    #[test]
    fn test_tables_interleaved_by_page() {
        let sections = build_sections(&layout(
            vec![
                Paragraph::title("Financials", 1),
                Paragraph::body("Before table.", 2),
                Paragraph::body("After table.", 3),
            ],
            vec![
                TableBlock::new("| late |", 5, 5),
                TableBlock::new("| t |", 3, 4),
            ],
        ));
        assert_eq!(sections.len(), 1);
        let kinds: Vec<String> = sections[0]
            .elements
            .iter()
            .map(|e| match e {
                Element::Paragraph(p) => p.text.clone(),
                Element::Table(t) => t.grid_markdown.clone(),
            })
            .collect();
        assert_eq!(kinds, vec!["Before table.", "| t |", "After table.", "| late |"]);
        assert_eq!(sections[0].page_end, 5);
    }

    #[test]
    fn test_table_drained_before_heading_stays_in_previous_section() {
        let sections = build_sections(&layout(
            vec![
                Paragraph::title("A", 1),
                Paragraph::body("a", 1),
                Paragraph::title("B", 2),
                Paragraph::body("b", 2),
            ],
            vec![TableBlock::new("| x |", 2, 2)],
        ));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].tables().count(), 1);
        assert_eq!(sections[0].page_end, 2);
        assert_eq!(sections[1].tables().count(), 0);
    }

    #[test]
    fn test_tables_only() {
        let sections = build_sections(&layout(Vec::new(), vec![TableBlock::new("| x |", 4, 4)]));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Introduction");
        assert_eq!((sections[0].page_start, sections[0].page_end), (1, 4));
    }

    #[test]
    fn test_detected_headings_matched_by_text() {
        let mut l = layout(
            vec![
                Paragraph::body("Annual Report", 1),
                Paragraph::body("Intro text.", 1),
                Paragraph::body("Risks", 2),
                Paragraph::body("Risk text.", 2),
            ],
            Vec::new(),
        );
        l.headings = vec![
            DetectedHeading {
                text: "Annual Report".to_string(),
                level: 1,
                page: 1,
                font_size: 24.0,
            },
            DetectedHeading {
                text: "Risks".to_string(),
                level: 2,
                page: 2,
                font_size: 14.0,
            },
        ];
        let sections = build_sections(&l);
        let heads: Vec<(&str, u8)> = sections.iter().map(|s| (s.heading.as_str(), s.level)).collect();
        assert_eq!(heads, vec![("Annual Report", 1), ("Risks", 2)]);
    }
}
