use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ArtifactResult, BootstrapResult, ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_bootstrap(result: &BootstrapResult) -> io::Result<()> {
        Self::print_json(result)
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

/// Plain-text progress for interactive runs; one line per event on stderr so
/// stdout stays reserved for results.
pub struct TextOutput;

impl TextOutput {
    pub fn print_summary(result: &BootstrapResult) {
        println!("populated {} ({})", result.out_dir, summarize(&result.items));
        for item in &result.items {
            println!("  {} {} ({})", item.kind, item.remote_path, item.action);
        }
    }
}

impl ProgressSink for TextOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("-> {} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("-> {}", event.message),
        }
    }
}

pub fn summarize(items: &[ArtifactResult]) -> String {
    let downloads = items
        .iter()
        .filter(|item| item.action != "planned")
        .count();
    format!("{} artifacts ({} materialized)", items.len(), downloads)
}
