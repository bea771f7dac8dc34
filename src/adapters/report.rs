use crate::domain::model::{GroupSnapshot, MatchReport};
use crate::utils::error::{BuddyError, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::Path;
use std::str::FromStr;

const UNMATCHED_TEXT: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Txt,
}

impl FromStr for OutputFormat {
    type Err = BuddyError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "txt" => Ok(OutputFormat::Txt),
            _ => Err(BuddyError::invalid_argument(
                "output_format",
                value,
                "supported output formats are json and txt",
            )),
        }
    }
}

impl OutputFormat {
    pub fn resolve(explicit: Option<&str>, path: &str) -> Result<Self> {
        match explicit {
            Some(format) => format.parse(),
            None => Path::new(path)
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("")
                .parse(),
        }
    }
}

// 保持成員順序輸出成 JSON object
impl Serialize for MatchReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.member, &entry.partner)?;
        }
        map.end()
    }
}

pub fn render(report: &MatchReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(report),
        OutputFormat::Txt => Ok(render_txt(report)),
    }
}

pub fn render_json(report: &MatchReport) -> Result<String> {
    to_pretty_json(report)
}

/// One `A <--> B` line per member.
pub fn render_txt(report: &MatchReport) -> String {
    report
        .entries
        .iter()
        .map(|entry| {
            format!(
                "{} <--> {}",
                entry.member,
                entry.partner.as_deref().unwrap_or(UNMATCHED_TEXT)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_snapshot(snapshot: &GroupSnapshot) -> Result<String> {
    to_pretty_json(snapshot)
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buffer)
        .map_err(|e| BuddyError::invariant(format!("JSON output is not UTF-8: {}", e)))
}
