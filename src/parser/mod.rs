//! Layout extraction.
//!
//! Two [`LayoutSource`]s produce the same [`NormalizedLayout`](crate::model::NormalizedLayout):
//! [`StructuredAdapter`] over a layout-analysis result, and
//! [`HeuristicExtractor`] over raw character layout decoded with `lopdf`.

pub mod analyze;
mod char_layout;
mod cleanup;
mod heuristic;
mod source;
mod structured;
mod table_detector;

pub use analyze::AnalyzeResult;
pub use char_layout::{line_text, CharLayoutProvider, LayoutChar, LopdfCharLayout, PageLayout, TableRows};
pub use cleanup::{clean_line, is_bare_page_number, is_page_label};
pub use heuristic::{HeuristicExtractor, HeuristicOptions};
pub use source::LayoutSource;
pub use structured::{
    normalize, JsonLayoutService, LayoutService, StructuredAdapter, StructuredOptions,
};
pub use table_detector::{DetectedTable, TableDetection, TableDetector, TableDetectorConfig};
