//! Impact Reporter
//!
//! Renders affected binaries for people (text, summary) and for scripts
//! (simple, json).

use clap::ValueEnum;

use crate::domain::callpath::AffectedBinary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One binary name per line
    #[default]
    Simple,
    /// Binary, entry package and call chain
    Text,
    /// Pretty-printed JSON array
    Json,
    /// Count followed by names
    Summary,
}

pub struct Reporter<'a> {
    results: &'a [AffectedBinary],
    color: bool,
}

impl<'a> Reporter<'a> {
    pub fn new(results: &'a [AffectedBinary]) -> Self {
        Self {
            results,
            color: false,
        }
    }

    /// Enable ANSI highlighting in text output.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Simple => Ok(self.to_simple()),
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => self.to_json(),
            OutputFormat::Summary => Ok(self.to_summary()),
        }
    }

    pub fn to_simple(&self) -> String {
        self.results
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self.results)
    }

    pub fn to_summary(&self) -> String {
        let mut lines = vec![format!("Affected binaries: {}", self.results.len())];
        lines.extend(self.results.iter().map(|r| format!("- {}", r.name)));
        lines.join("\n")
    }

    pub fn to_text(&self) -> String {
        if self.results.is_empty() {
            return "No affected binaries detected.".to_string();
        }

        let rule = "-".repeat(50);
        let mut lines = vec![
            format!("Detected {} affected binaries:", self.results.len()),
            rule.clone(),
        ];

        for result in self.results {
            lines.push(format!("Binary: {}", self.paint(&result.name, "1;32")));
            lines.push(format!("   Entry package: {}", result.package_path));
            lines.push("   Call chain:".to_string());

            let last = result.trace_path.len().saturating_sub(1);
            for (i, step) in result.trace_path.iter().enumerate() {
                let marker = if i == 0 {
                    "start"
                } else if i == last {
                    "end  "
                } else {
                    "  |  "
                };
                let step = if step.ends_with("(Changed)") {
                    self.paint(step, "1;31")
                } else {
                    step.clone()
                };
                lines.push(format!("      {} {}", marker, step));
            }
            lines.push(rule.clone());
        }

        lines.join("\n")
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }
}
