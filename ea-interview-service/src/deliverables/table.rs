use serde::{Deserialize, Serialize};

/// Rectangular text table, the unit of spreadsheet export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating it to the column count.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&markdown_row(&self.columns));
        out.push_str(&markdown_row(
            &self.columns.iter().map(|_| "---".to_string()).collect::<Vec<_>>(),
        ));
        for row in &self.rows {
            out.push_str(&markdown_row(row));
        }
        out
    }
}

fn markdown_row(cells: &[String]) -> String {
    let escaped: Vec<String> = cells.iter().map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |\n", escaped.join(" | "))
}

fn is_table_line(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('|') && line.matches('|').count() >= 2
}

fn split_cells(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn is_separator(cells: &[String]) -> bool {
    cells.iter().all(|cell| {
        !cell.is_empty() && cell.contains('-') && cell.chars().all(|c| matches!(c, '-' | ':' | ' '))
    })
}

/// Finds the first markdown table block in free model output.
///
/// The block starts at the first line that opens with `|` and ends at the first
/// line that is not a table line. Separator rows and repeated header rows are
/// dropped. Returns `None` when there is no table or it has no data rows.
pub fn extract_markdown_table(text: &str) -> Option<Table> {
    let block: Vec<&str> = text
        .lines()
        .skip_while(|line| !is_table_line(line))
        .take_while(|line| is_table_line(line))
        .collect();

    let (header, body) = block.split_first()?;
    let columns = split_cells(header);
    if columns.iter().all(|c| c.is_empty()) {
        return None;
    }

    let mut table = Table::new(columns);
    for line in body {
        let cells = split_cells(line);
        if is_separator(&cells) || cells == table.columns {
            continue;
        }
        table.push_row(cells);
    }

    if table.is_empty() { None } else { Some(table) }
}
