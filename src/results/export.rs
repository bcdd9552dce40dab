//! CSV export of normalized tables

use super::normalize::NormalizedTable;

/// Render a table as UTF-8 CSV with a header row and no index column
pub fn to_csv(table: &NormalizedTable) -> String {
    let mut csv = String::new();
    push_line(&mut csv, table.columns());
    for row in table.rows() {
        push_line(&mut csv, row);
    }
    csv
}

fn push_line<S: AsRef<str>>(out: &mut String, cells: &[S]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(cell.as_ref()));
    }
    out.push('\n');
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Download file name for a domain: trimmed domain plus suffix
pub fn csv_filename(domain: &str, suffix: &str) -> String {
    let stem: String = domain
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}{}", stem, suffix)
}
