use crate::domain::model::MemberRecord;
use crate::utils::error::{BuddyError, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
}

impl FromStr for InputFormat {
    type Err = BuddyError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(InputFormat::Json),
            "csv" => Ok(InputFormat::Csv),
            _ => Err(BuddyError::invalid_argument(
                "input_format",
                value,
                "supported input formats are json and csv",
            )),
        }
    }
}

impl InputFormat {
    /// 明確指定優先，否則看副檔名
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

/// A JSON roster is either a bare array of members or a previously written
/// group snapshot.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRoster {
    List(Vec<MemberRecord>),
    Snapshot { members: Vec<MemberRecord> },
}

pub fn parse_records(data: &[u8], format: InputFormat) -> Result<Vec<MemberRecord>> {
    match format {
        InputFormat::Json => parse_json_records(data),
        InputFormat::Csv => parse_csv_records(data),
    }
}

pub fn parse_json_records(data: &[u8]) -> Result<Vec<MemberRecord>> {
    let roster: JsonRoster = serde_json::from_slice(data)?;
    Ok(match roster {
        JsonRoster::List(records) => records,
        JsonRoster::Snapshot { members } => members,
    })
}

pub fn parse_csv_records(data: &[u8]) -> Result<Vec<MemberRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: MemberRecord = row?;
        records.push(record);
    }
    tracing::debug!("Parsed {} CSV roster rows", records.len());
    Ok(records)
}
