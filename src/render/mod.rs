//! Output rendering: markdown tables and JSON results.

mod json;
pub mod markdown;

pub use json::{to_json, to_metadata_lines, JsonFormat};
pub use markdown::render_table_rows;
