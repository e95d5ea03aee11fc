//! Markdown emission for table grids.

/// Render rows as a markdown table.
///
/// Row 0 is the header and is followed by a `---` separator with one marker
/// per header column. Rows are emitted as given; no row is padded or cut.
/// No rows renders as `""`.
pub fn render_table_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> String {
    let Some(header) = rows.first() else {
        return String::new();
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render_row(header));
    lines.push(render_separator(header.len()));
    lines.extend(rows[1..].iter().map(|row| render_row(row)));

    lines.join("\n").trim().to_string()
}

fn render_row<S: AsRef<str>>(cells: &[S]) -> String {
    let mut line = String::from("|");
    for cell in cells {
        line.push(' ');
        line.push_str(&escape_cell(cell.as_ref()));
        line.push_str(" |");
    }
    line
}

fn render_separator(columns: usize) -> String {
    let mut line = String::from("|");
    for _ in 0..columns {
        line.push_str(" --- |");
    }
    line
}

/// Escape characters that would break a table row.
fn escape_cell(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '|' => result.push_str("\\|"),
            '\n' | '\r' => result.push(' '),
            _ => result.push(c),
        }
    }
    result
}
