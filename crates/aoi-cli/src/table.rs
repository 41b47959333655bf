//! Box-drawn tables for CLI output.

use colored::Colorize;

/// Collects rows under fixed headers and renders them with box-drawing borders.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Add a row. Extra cells are dropped; missing cells are blank.
    pub fn add_row<S: AsRef<str>>(&mut self, cells: &[S]) {
        let row = (0..self.headers.len())
            .map(|i| cells.get(i).map(|c| c.as_ref().to_string()).unwrap_or_default())
            .collect();
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .fold(h.chars().count(), usize::max)
            })
            .collect()
    }

    fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
        let segments: Vec<String> = widths.iter().map(|w| "\u{2500}".repeat(w + 2)).collect();
        format!("{left}{}{right}", segments.join(&mid.to_string()))
    }

    fn line(cells: impl Iterator<Item = String>) -> String {
        let cells: Vec<String> = cells.collect();
        format!("\u{2502}{}\u{2502}", cells.join("\u{2502}"))
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let pad = |text: &str, width: usize| {
            format!(" {text}{} ", " ".repeat(width - text.chars().count()))
        };

        let mut lines = vec![Self::border(&widths, '\u{250c}', '\u{252c}', '\u{2510}')];
        lines.push(Self::line(
            self.headers
                .iter()
                .zip(&widths)
                .map(|(h, &w)| pad(h, w).bold().to_string()),
        ));
        lines.push(Self::border(&widths, '\u{251c}', '\u{253c}', '\u{2524}'));
        for row in &self.rows {
            lines.push(Self::line(row.iter().zip(&widths).map(|(c, &w)| pad(c, w))));
        }
        lines.push(Self::border(&widths, '\u{2514}', '\u{2534}', '\u{2518}'));
        lines.join("\n")
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}
