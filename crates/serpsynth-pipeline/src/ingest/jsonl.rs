//! Directory of daily JSON Lines exports, one `<YYYY-MM-DD>.jsonl` per day.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serpsynth_core::errors::SourceError;
use serpsynth_core::types::{Device, SourceRecord};

use super::SearchAnalyticsSource;

#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    dir: PathBuf,
}

impl JsonLinesSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.jsonl", date.format("%F")))
    }
}

impl SearchAnalyticsSource for JsonLinesSource {
    fn fetch_day(&self, date: NaiveDate, device: Device) -> Result<Vec<SourceRecord>, SourceError> {
        let path = self.file_for(date);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no export for date");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(SourceError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let malformed = |message: String| SourceError::Malformed {
                path: path.display().to_string(),
                line: idx + 1,
                message,
            };
            let record: SourceRecord =
                serde_json::from_str(line).map_err(|e| malformed(e.to_string()))?;
            if record.date != date {
                return Err(malformed(format!(
                    "record dated {} in export for {date}",
                    record.date
                )));
            }
            if record.device == device {
                records.push(record);
            }
        }
        Ok(records)
    }
}
