//! Table detection from text alignment (stream mode).
//!
//! No ruling lines are needed: runs are grouped into rows by vertical
//! position, column edges are left edges shared by enough rows, and stretches
//! of consecutive well-aligned rows become tables.

use std::collections::{HashMap, HashSet};

use super::char_layout::{LayoutChar, TableRows};

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Row grouping tolerance as a fraction of font size
    pub row_tolerance_factor: f32,
    /// Fraction of a row's runs that must sit on a column edge
    pub min_alignment_ratio: f32,
    /// Minimum gap between column edges (points)
    pub min_column_gap: f32,
    /// Width of the buckets left edges are snapped to (points)
    pub edge_bucket: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            row_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
            edge_bucket: 5.0,
        }
    }
}

/// A table found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    /// Top of the first row
    pub top: f32,
    /// Top of the last row
    pub bottom: f32,
    /// Column left edges
    pub columns: Vec<f32>,
    /// Cell text per row; row 0 is the header
    pub rows: TableRows,
}

/// Result of running detection over a page.
#[derive(Debug, Clone, Default)]
pub struct TableDetection {
    /// Tables in top-down order
    pub tables: Vec<DetectedTable>,
    /// Runs not claimed by any table, in their original order
    pub remaining: Vec<LayoutChar>,
}

/// Runs sharing a vertical position, as indices into the page's runs.
#[derive(Debug, Clone)]
struct Row {
    top: f32,
    members: Vec<usize>,
}

/// Detects tables in a page's text runs.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Split runs into tables and the remaining running text.
    pub fn detect(&self, chars: Vec<LayoutChar>) -> TableDetection {
        let cfg = &self.config;
        let none = |chars| TableDetection {
            tables: Vec::new(),
            remaining: chars,
        };

        if chars.len() < cfg.min_rows * cfg.min_columns {
            return none(chars);
        }

        let rows = self.group_rows(&chars);
        if rows.len() < cfg.min_rows {
            return none(chars);
        }

        let columns = self.column_edges(&chars, &rows);
        if columns.len() < cfg.min_columns {
            log::debug!("TableDetector: {} column edges, no table", columns.len());
            return none(chars);
        }

        let mut tables = Vec::new();
        let mut claimed: HashSet<usize> = HashSet::new();

        for (start, end) in self.aligned_regions(&chars, &rows, &columns) {
            let region = &rows[start..=end];

            // Edges are recomputed per region; page-wide edges mix tables.
            let region_columns = self.column_edges(&chars, region);
            if region_columns.len() < cfg.min_columns {
                continue;
            }
            if region_columns.len() > cfg.max_columns {
                log::debug!(
                    "TableDetector: skipping region, {} columns exceeds {}",
                    region_columns.len(),
                    cfg.max_columns
                );
                continue;
            }
            if self.is_list_pattern(&chars, region, &region_columns) {
                log::debug!("TableDetector: skipping region, looks like a list");
                continue;
            }

            claimed.extend(region.iter().flat_map(|row| row.members.iter().copied()));
            tables.push(DetectedTable {
                top: region[0].top,
                bottom: region[region.len() - 1].top,
                rows: self.build_grid(&chars, region, &region_columns),
                columns: region_columns,
            });
        }

        log::debug!(
            "TableDetector: {} runs, {} rows, {} tables",
            chars.len(),
            rows.len(),
            tables.len()
        );

        let remaining = chars
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !claimed.contains(i))
            .map(|(_, c)| c)
            .collect();

        TableDetection { tables, remaining }
    }

    /// Group runs into rows, top to bottom.
    fn group_rows(&self, chars: &[LayoutChar]) -> Vec<Row> {
        let mut order: Vec<usize> = (0..chars.len()).collect();
        order.sort_by(|&a, &b| {
            chars[a]
                .top
                .total_cmp(&chars[b].top)
                .then(chars[a].x.total_cmp(&chars[b].x))
        });

        let mut rows: Vec<Row> = Vec::new();
        let mut anchor: Option<f32> = None;
        let mut members: Vec<usize> = Vec::new();

        for i in order {
            let c = &chars[i];
            let tolerance = c.size * self.config.row_tolerance_factor;
            match anchor {
                Some(top) if (c.top - top).abs() <= tolerance => members.push(i),
                _ => {
                    if !members.is_empty() {
                        rows.push(make_row(chars, std::mem::take(&mut members)));
                    }
                    anchor = Some(c.top);
                    members.push(i);
                }
            }
        }
        if !members.is_empty() {
            rows.push(make_row(chars, members));
        }

        rows
    }

    /// Left edges shared by enough rows, merged when closer than the
    /// minimum column gap.
    fn column_edges(&self, chars: &[LayoutChar], rows: &[Row]) -> Vec<f32> {
        let cfg = &self.config;
        let multi: Vec<&Row> = rows.iter().filter(|r| r.members.len() >= 2).collect();

        // Prefer rows with several runs; each counts an edge once. With too
        // few of those, every run of every row votes.
        let (voters, once_per_row): (Vec<&Row>, bool) = if multi.len() >= cfg.min_rows {
            (multi, true)
        } else {
            (rows.iter().collect(), false)
        };
        if voters.is_empty() {
            return Vec::new();
        }

        let mut votes: HashMap<i32, usize> = HashMap::new();
        for row in &voters {
            let buckets = row
                .members
                .iter()
                .map(|&i| (chars[i].x / cfg.edge_bucket).round() as i32);
            if once_per_row {
                for bucket in buckets.collect::<HashSet<_>>() {
                    *votes.entry(bucket).or_default() += 1;
                }
            } else {
                for bucket in buckets {
                    *votes.entry(bucket).or_default() += 1;
                }
            }
        }

        let threshold = ((voters.len() as f32 * cfg.min_alignment_ratio) as usize).max(2);
        let mut edges: Vec<f32> = votes
            .into_iter()
            .filter(|&(_, n)| n >= threshold)
            .map(|(bucket, _)| bucket as f32 * cfg.edge_bucket)
            .collect();
        edges.sort_by(f32::total_cmp);

        let mut merged: Vec<f32> = Vec::with_capacity(edges.len());
        for edge in edges {
            match merged.last() {
                Some(&last) if edge - last < cfg.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Stretches of consecutive rows that line up with `columns`.
    fn aligned_regions(
        &self,
        chars: &[LayoutChar],
        rows: &[Row],
        columns: &[f32],
    ) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            let aligned = alignment_score(chars, row, columns) >= self.config.min_alignment_ratio;
            match (aligned, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    spans.push((s, i - 1));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            spans.push((s, rows.len() - 1));
        }

        spans
            .into_iter()
            .filter_map(|(s, e)| self.trim_region(rows, s, e))
            .collect()
    }

    /// Drop single-run rows at either end of a region; a lone line of text
    /// that happens to start on a column edge is not part of the table.
    fn trim_region(&self, rows: &[Row], mut start: usize, mut end: usize) -> Option<(usize, usize)> {
        while start < end && rows[start].members.len() < 2 {
            start += 1;
        }
        while end > start && rows[end].members.len() < 2 {
            end -= 1;
        }
        (end + 1 - start >= self.config.min_rows).then_some((start, end))
    }

    /// Assign every run to one column and join per-cell text.
    fn build_grid(&self, chars: &[LayoutChar], rows: &[Row], columns: &[f32]) -> TableRows {
        let right = rows
            .iter()
            .flat_map(|r| r.members.iter().map(|&i| chars[i].right()))
            .fold(f32::MIN, f32::max);

        rows.iter()
            .map(|row| {
                let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
                for &i in &row.members {
                    let c = &chars[i];
                    let column = column_for(c.x, columns, right);
                    cells[column].push(c.text.trim());
                }
                cells
                    .into_iter()
                    .map(|parts| {
                        let text = parts.join(" ");
                        (!text.trim().is_empty()).then_some(text)
                    })
                    .collect()
            })
            .collect()
    }

    /// Numbered or bulleted lists split into marker and text runs look like
    /// two-column tables.
    fn is_list_pattern(&self, chars: &[LayoutChar], rows: &[Row], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullets = 0usize;
        let mut numbers = 0usize;
        for row in rows {
            let first = row
                .members
                .iter()
                .map(|&i| &chars[i])
                .min_by(|a, b| a.x.total_cmp(&b.x));
            if let Some(c) = first {
                let text = c.text.trim();
                if is_bullet_marker(text) {
                    bullets += 1;
                } else if is_number_marker(text) {
                    numbers += 1;
                }
            }
        }

        let n = rows.len() as f32;
        if bullets as f32 / n >= 0.5 {
            return true;
        }
        // Real tables often number their first column; only two-column
        // regions are rejected on numbering alone.
        columns.len() == 2 && (bullets + numbers) as f32 / n >= 0.5
    }
}

fn make_row(chars: &[LayoutChar], members: Vec<usize>) -> Row {
    let top = members.iter().map(|&i| chars[i].top).sum::<f32>() / members.len() as f32;
    Row { top, members }
}

/// Fraction of a row's runs that start on a column edge.
fn alignment_score(chars: &[LayoutChar], row: &Row, columns: &[f32]) -> f32 {
    if row.members.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .members
        .iter()
        .filter(|&&i| columns.iter().any(|col| (chars[i].x - col).abs() <= 5.0))
        .count();
    aligned as f32 / row.members.len() as f32
}

/// Column whose span contains `x`, allowing runs to start up to 10pt early;
/// otherwise the nearest edge.
fn column_for(x: f32, columns: &[f32], right: f32) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right + 100.0);
        if x >= start - 10.0 && x < end - 10.0 {
            return i;
        }
    }
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (x - **a).abs().total_cmp(&(x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "▶" | "➤"
    )
}

/// "1.", "12)", "3", "a.", "B)"
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    let digits = cleaned.chars().take_while(char::is_ascii_digit).count();
    let rest = &cleaned[digits..];
    if digits > 0 && (rest.is_empty() || rest == "." || rest == ")") {
        return true;
    }

    let mut chars = cleaned.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.' | ')'), None) if c.is_alphabetic()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f32, top: f32) -> LayoutChar {
        LayoutChar::new(text, x, top, 12.0, "Helvetica")
    }

    #[test]
    fn test_group_rows() {
        let detector = TableDetector::new();
        let chars = vec![
            run("B2", 60.0, 115.0),
            run("A1", 10.0, 100.0),
            run("A2", 10.0, 115.0),
            run("B1", 60.0, 101.0),
        ];
        let rows = detector.group_rows(&chars);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].members, vec![1, 3]);
        assert_eq!(rows[1].members, vec![2, 0]);
    }

    #[test]
    fn test_detect_simple_table() {
        let detector = TableDetector::new();
        let chars = vec![
            run("Segment", 10.0, 100.0),
            run("Revenue", 120.0, 100.0),
            run("Retail", 10.0, 115.0),
            run("1,200", 120.0, 115.0),
            run("Wholesale", 10.0, 130.0),
            run("840", 120.0, 130.0),
        ];

        let detection = detector.detect(chars);
        assert_eq!(detection.tables.len(), 1);
        assert!(detection.remaining.is_empty());

        let table = &detection.tables[0];
        assert_eq!(table.columns.len(), 2);
        assert_eq!(
            table.rows,
            vec![
                vec![Some("Segment".to_string()), Some("Revenue".to_string())],
                vec![Some("Retail".to_string()), Some("1,200".to_string())],
                vec![Some("Wholesale".to_string()), Some("840".to_string())],
            ]
        );
    }

    #[test]
    fn test_config_min_rows() {
        let detector = TableDetector::with_config(TableDetectorConfig {
            min_rows: 4,
            ..Default::default()
        });
        let chars = vec![
            run("Segment", 10.0, 100.0),
            run("Revenue", 120.0, 100.0),
            run("Retail", 10.0, 115.0),
            run("1,200", 120.0, 115.0),
            run("Wholesale", 10.0, 130.0),
            run("840", 120.0, 130.0),
        ];

        let detection = detector.detect(chars);
        assert!(detection.tables.is_empty());
        assert_eq!(detection.remaining.len(), 6);
    }

    #[test]
    fn test_missing_cell_is_none() {
        let detector = TableDetector::new();
        let chars = vec![
            run("Item", 10.0, 100.0),
            run("2024", 120.0, 100.0),
            run("2023", 220.0, 100.0),
            run("Cash", 10.0, 115.0),
            run("50", 120.0, 115.0),
            run("Debt", 10.0, 130.0),
            run("70", 120.0, 130.0),
            run("65", 220.0, 130.0),
        ];
        let detection = detector.detect(chars);
        assert_eq!(detection.tables.len(), 1);
        assert_eq!(detection.tables[0].rows[1][2], None);
    }

    #[test]
    fn test_single_column_is_not_a_table() {
        let detector = TableDetector::new();
        let chars = vec![
            run("Line 1", 10.0, 100.0),
            run("Line 2", 10.0, 115.0),
            run("Line 3", 10.0, 130.0),
            run("Line 4", 10.0, 145.0),
        ];
        let detection = detector.detect(chars);
        assert!(detection.tables.is_empty());
        assert_eq!(detection.remaining.len(), 4);
    }

    #[test]
    fn test_table_runs_removed_from_text() {
        let detector = TableDetector::new();
        let chars = vec![
            run("Results improved across segments.", 10.0, 60.0),
            run("Segment", 10.0, 100.0),
            run("Revenue", 120.0, 100.0),
            run("Retail", 10.0, 115.0),
            run("1,200", 120.0, 115.0),
        ];
        let detection = detector.detect(chars);
        assert_eq!(detection.tables.len(), 1);
        assert_eq!(detection.remaining.len(), 1);
        assert_eq!(detection.remaining[0].text, "Results improved across segments.");
    }

    #[test]
    fn test_numbered_list_not_detected() {
        let detector = TableDetector::new();
        let chars = vec![
            run("1.", 50.0, 100.0),
            run("Risk factors", 80.0, 100.0),
            run("2.", 50.0, 130.0),
            run("Liquidity", 80.0, 130.0),
            run("3.", 50.0, 160.0),
            run("Outlook", 80.0, 160.0),
        ];
        let detection = detector.detect(chars);
        assert!(detection.tables.is_empty());
        assert_eq!(detection.remaining.len(), 6);
    }

    #[test]
    fn test_bullet_list_not_detected() {
        let detector = TableDetector::new();
        let chars = vec![
            run("•", 50.0, 100.0),
            run("Dividend raised", 80.0, 100.0),
            run("•", 50.0, 130.0),
            run("Buyback extended", 80.0, 130.0),
        ];
        let detection = detector.detect(chars);
        assert!(detection.tables.is_empty());
    }

    #[test]
    fn test_markers() {
        assert!(is_number_marker("1."));
        assert!(is_number_marker("12)"));
        assert!(is_number_marker("1 ."));
        assert!(is_number_marker("3"));
        assert!(is_number_marker("a."));
        assert!(is_number_marker("B)"));
        assert!(!is_number_marker("Net"));
        assert!(!is_number_marker("1,200"));
        assert!(!is_number_marker(""));

        assert!(is_bullet_marker("•"));
        assert!(is_bullet_marker(" - "));
        assert!(!is_bullet_marker("Revenue"));
    }
}
