//! Terminal output for the end-of-run summary.

use crate::driver::RunReport;
use crate::fetch::InstallStatus;
use crate::vcs::short_hash;
use colored::*;

/// Box-drawn table sized to its content, shrunk to fit the terminal.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(console::measure_text_width(cell));
            }
        }

        // Shave the widest column until the table fits, never below 8.
        let overhead = 3 + 3 * widths.len();
        while overhead + widths.iter().sum::<usize>() > max_width {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 8 {
                break;
            }
            widths[idx] -= 1;
        }
        widths
    }

    pub fn render(&self, max_width: usize) -> String {
        if self.headers.is_empty() {
            return String::new();
        }
        let widths = self.column_widths(max_width);
        let border = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}\n", left, segments.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| {
            let mut out = String::from("  │");
            for (cell, &width) in cells.iter().zip(&widths) {
                let cell = cell.replace(['\n', '\r', '\t'], " ");
                let text = console::truncate_str(&cell, width, "...");
                let pad = width.saturating_sub(console::measure_text_width(&text));
                let text = if bold {
                    text.bold().to_string()
                } else {
                    text.to_string()
                };
                out.push_str(&format!(" {}{} │", text, " ".repeat(pad)));
            }
            out.push('\n');
            out
        };

        let mut out = border("┌", "┬", "┐");
        out.push_str(&line(&self.headers, true));
        out.push_str(&border("├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&line(row, false));
        }
        out.push_str(&border("└", "┴", "┘"));
        out
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        print!("{}", self.render(term_width as usize));
    }
}

pub fn print_report(report: &RunReport) {
    let mut table = Table::new(&["Dependency", "Revision", "Fetch", "Build"]);
    for entry in &report.entries {
        let fetch = match entry.status {
            InstallStatus::CacheHit => "cached".green().to_string(),
            InstallStatus::Fetched => "fetched".cyan().to_string(),
        };
        table.add_row(vec![
            entry.name.clone(),
            short_hash(&entry.revision).to_string(),
            fetch,
            entry.strategy.clone(),
        ]);
    }
    table.print();
}
