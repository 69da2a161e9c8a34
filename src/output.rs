use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunSummary};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Console,
    Json,
}

/// Prints progress lines to stdout as they happen.
pub struct ConsoleOutput;

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        println!("{}", progress_line(&event));
    }
}

fn progress_line(event: &ProgressEvent) -> String {
    match event.elapsed {
        Some(elapsed) => format!("{} ({:.1}s)", event.message, elapsed.as_secs_f64()),
        None => event.message.clone(),
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn progress_line_appends_elapsed() {
        let event = ProgressEvent {
            message: "Retrying 1 failed TaxIDs after 2 seconds...".to_string(),
            elapsed: Some(Duration::from_millis(1300)),
        };
        assert_eq!(
            progress_line(&event),
            "Retrying 1 failed TaxIDs after 2 seconds... (1.3s)"
        );
    }

    #[test]
    fn progress_line_without_elapsed() {
        let event = ProgressEvent {
            message: "Processing 2 unique TaxIDs...".to_string(),
            elapsed: None,
        };
        assert_eq!(progress_line(&event), "Processing 2 unique TaxIDs...");
    }
}
