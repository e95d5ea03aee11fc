//! The layout-source capability shared by both extraction paths.

use crate::error::Result;
use crate::model::NormalizedLayout;

/// Turns PDF bytes into a [`NormalizedLayout`].
///
/// `page_count` is the byte-exact page count of `pdf`, computed once by the
/// caller and shared by every source tried for the same document.
pub trait LayoutSource: Send + Sync {
    /// Short name used in logs and outcomes ("structured", "heuristic").
    fn name(&self) -> &str;

    /// Extract paragraphs, tables and key/value pairs.
    fn extract(&self, pdf: &[u8], page_count: u32) -> Result<NormalizedLayout>;
}

impl<S: LayoutSource + ?Sized> LayoutSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn extract(&self, pdf: &[u8], page_count: u32) -> Result<NormalizedLayout> {
        (**self).extract(pdf, page_count)
    }
}
