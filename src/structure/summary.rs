//! Deduplicated section summaries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::Section;

/// One row of the section outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub heading: String,
    pub level: u8,
    pub start_page: u32,
    pub end_page: u32,
}

/// Collapse sections sharing a heading into one summary each.
///
/// The first occurrence fixes level and start page; `end_page` widens to
/// the largest end seen. Order follows first occurrence.
pub fn summarize_sections(sections: &[Section]) -> Vec<SectionSummary> {
    let mut summaries: Vec<SectionSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for section in sections {
        match index.get(section.heading.as_str()) {
            Some(&i) => {
                let summary = &mut summaries[i];
                summary.end_page = summary.end_page.max(section.page_end);
            }
            None => {
                index.insert(&section.heading, summaries.len());
                summaries.push(SectionSummary {
                    heading: section.heading.clone(),
                    level: section.level,
                    start_page: section.page_start,
                    end_page: section.page_end,
                });
            }
        }
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(heading: &str, level: u8, start: u32, end: u32) -> Section {
        let mut s = Section::new(heading, level, start);
        s.page_end = end;
        s
    }

    #[test]
    fn test_duplicates_merged() {
        let sections = vec![
            section("Risk Factors", 1, 3, 5),
            section("Liquidity", 2, 6, 6),
            section("Risk Factors", 2, 9, 8),
        ];
        let summaries = summarize_sections(&sections);
        assert_eq!(summaries.len(), 2);
        assert_eq!(
            summaries[0],
            SectionSummary {
                heading: "Risk Factors".to_string(),
                level: 1,
                start_page: 3,
                end_page: 8,
            }
        );
        assert_eq!(summaries[1].heading, "Liquidity");
    }

    #[test]
    fn test_end_page_never_shrinks() {
        let sections = vec![section("Notes", 1, 10, 20), section("Notes", 1, 11, 12)];
        assert_eq!(summarize_sections(&sections)[0].end_page, 20);
    }

    #[test]
    fn test_empty() {
        assert!(summarize_sections(&[]).is_empty());
    }
}
