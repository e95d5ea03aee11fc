//! Section structure: grouping normalized layout into headed sections.

mod builder;
mod summary;

pub use builder::{build_sections, SectionBuilder};
pub use summary::{summarize_sections, SectionSummary};
