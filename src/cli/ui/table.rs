use ansi_term::{Color, Style};
use terminal_size::terminal_size;

use super::{COLUMN_GAP, DEFAULT_WIDTH, END_PADDING};

pub const STATUS_RUNNING: &str = "running";
pub const STATUS_STOPPED: &str = "stopped";

#[derive(Debug, Clone)]
pub enum TableCellStyle {
    Default,
    Important,
    /// Green for running, red for anything else.
    Status,
}

#[derive(Debug, Clone)]
pub struct TableHeader {
    pub text: String,
    pub cell_style: TableCellStyle,
    pub max_width: Option<usize>,
}

impl TableHeader {
    pub fn new(text: impl Into<String>, cell_style: TableCellStyle) -> Self {
        Self {
            text: text.into(),
            cell_style,
            max_width: None,
        }
    }
}

impl TableCellStyle {
    pub fn get_style(&self, cell: &str) -> Style {
        match self {
            TableCellStyle::Default => Style::new(),
            TableCellStyle::Important => Style::new().bold().fg(Color::Purple),
            TableCellStyle::Status if cell == STATUS_RUNNING => Style::new().bold().fg(Color::Green),
            TableCellStyle::Status => Style::new().bold().fg(Color::Red),
        }
    }
}

pub struct Table {
    pub headers: Vec<TableHeader>,
    pub rows: Vec<Vec<Option<String>>>,
}

fn cell_len(cell: &Option<String>) -> usize {
    cell.as_ref().map(|c| c.chars().count()).unwrap_or(0)
}

impl Table {
    /// Width of every column once shrunk to fit `terminal_width`. Columns never
    /// get narrower than their header.
    pub fn column_widths(&self, terminal_width: usize) -> Vec<usize> {
        let mut column_widths = self
            .headers
            .iter()
            .map(|h| h.text.chars().count())
            .collect::<Vec<_>>();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let max_width = self.headers[i].max_width.unwrap_or(usize::MAX);
                column_widths[i] = column_widths[i].max(cell_len(cell).min(max_width));
            }
        }

        loop {
            let gaps_width = column_widths.len().saturating_sub(1) * COLUMN_GAP;
            let total_width: usize = column_widths.iter().sum::<usize>() + gaps_width + END_PADDING;
            if total_width <= terminal_width {
                break;
            }

            // shrink the widest columns first, one char at a time
            let max_width = column_widths.iter().copied().max().unwrap_or(0);
            let mut shrinked_count = 0;
            for (i, width) in column_widths.iter_mut().enumerate() {
                if *width != max_width || *width <= self.headers[i].text.chars().count() {
                    continue;
                }
                *width -= 1;
                shrinked_count += 1;
            }

            if shrinked_count == 0 {
                break;
            }
        }

        column_widths
    }

    pub fn print(&self) {
        let terminal_width = terminal_size().map(|(w, _)| w.0).unwrap_or(DEFAULT_WIDTH);
        let column_widths = self.column_widths(terminal_width as usize);

        for (i, header) in self.headers.iter().enumerate() {
            print!("{}", Style::new().bold().paint(header.text.clone()));
            print!(
                "{}",
                " ".repeat(column_widths[i].saturating_sub(header.text.chars().count()))
            );
            if i < self.headers.len() - 1 {
                print!("{}", " ".repeat(COLUMN_GAP));
            }
        }
        println!("{}", " ".repeat(END_PADDING));

        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let text = cell.clone().unwrap_or_default();
                let style = self.headers[i].cell_style.get_style(&text);
                let len = cell_len(cell);

                if len > column_widths[i] {
                    let clipped: String = text
                        .chars()
                        .take(column_widths[i].saturating_sub(3))
                        .collect();
                    print!("{}", style.paint(clipped));
                    print!("{}", style.paint("..."));
                } else {
                    print!("{}", style.paint(text));
                    print!("{}", " ".repeat(column_widths[i] - len));
                }
                if i < row.len() - 1 {
                    print!("{}", " ".repeat(COLUMN_GAP));
                }
            }
            println!("{}", " ".repeat(END_PADDING));
        }
    }
}
