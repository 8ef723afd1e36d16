// ABOUTME: Output formatting for CLI results.
// ABOUTME: Supports normal (tables), quiet (ids only) and JSON-lines output modes.

use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly tables and progress lines
    Normal,
    /// Only ids and final results
    Quiet,
    /// One JSON document per line
    Json,
}

impl OutputMode {
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

/// Prints command results according to the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing a long-running operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    fn elapsed_secs(&self) -> Option<f64> {
        self.start_time.map(|t| t.elapsed().as_secs_f64())
    }

    /// Print a progress line (normal mode only).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a table: header plus rows, columns padded to the widest cell.
    ///
    /// Quiet mode prints only the first column; JSON mode prints `records`.
    pub fn table<T: Serialize>(&self, header: &[&str], rows: &[Vec<String>], records: &[T]) {
        match self.mode {
            OutputMode::Json => records.iter().for_each(|r| self.json(r)),
            OutputMode::Quiet => rows
                .iter()
                .filter_map(|row| row.first())
                .for_each(|id| println!("{id}")),
            OutputMode::Normal => {
                let widths: Vec<usize> = (0..header.len())
                    .map(|col| {
                        rows.iter()
                            .filter_map(|row| row.get(col))
                            .map(|cell| cell.chars().count())
                            .chain(std::iter::once(header[col].len()))
                            .max()
                            .unwrap_or(0)
                    })
                    .collect();

                let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
                println!("{}", pad_row(&header, &widths));
                for row in rows {
                    println!("{}", pad_row(row, &widths));
                }
            }
        }
    }

    /// Print one record: pretty JSON for humans, compact JSON in JSON mode.
    pub fn document<T: Serialize>(&self, record: &T) {
        match self.mode {
            OutputMode::Json => self.json(record),
            OutputMode::Normal | OutputMode::Quiet => {
                if let Ok(text) = serde_json::to_string_pretty(record) {
                    println!("{text}");
                }
            }
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => match self.elapsed_secs() {
                Some(elapsed) => println!("{message} ({elapsed:.1}s)"),
                None => println!("{message}"),
            },
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.json(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.elapsed_secs(),
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.elapsed_secs(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    fn json<T: Serialize>(&self, record: &T) {
        if let Ok(json) = serde_json::to_string(record) {
            println!("{json}");
        }
    }
}

fn pad_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("   ")
        .trim_end()
        .to_string()
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
