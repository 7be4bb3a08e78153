use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::{Map, Number, Value};

use super::domain::{SimulationFilters, UsageEvent};
use super::usage::scope_events;

/// Errors raised while loading a historical usage export.
#[derive(Debug, thiserror::Error)]
pub enum UsageFeedError {
    #[error("unable to read usage export: {0}")]
    Io(#[from] std::io::Error),
    #[error("usage export is not a JSON array of events: {0}")]
    Json(#[from] serde_json::Error),
    #[error("usage export CSV is malformed: {0}")]
    Csv(#[from] csv::Error),
}

/// Immutable snapshot of historical usage events shared across simulation runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageFeed {
    events: Vec<UsageEvent>,
}

impl UsageFeed {
    pub fn new(events: Vec<UsageEvent>) -> Self {
        Self { events }
    }

    /// Load a feed from disk; `.csv` files use the CSV reader, everything else JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, UsageFeedError> {
        let path = path.as_ref();
        let file = BufReader::new(File::open(path)?);
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if is_csv {
            Self::from_csv_reader(file)
        } else {
            Self::from_json_reader(file)
        }
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, UsageFeedError> {
        let events: Vec<UsageEvent> = serde_json::from_reader(reader)?;
        Ok(Self::new(events))
    }

    /// Each header names an event field. Numeric cells become numbers, except
    /// in the type and subject columns, and empty cells are left out of the event.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, UsageFeedError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let mut events = Vec::new();

        for record in csv_reader.records() {
            let record = record?;
            let mut fields = Map::new();
            for (header, cell) in headers.iter().zip(record.iter()) {
                if cell.is_empty() {
                    continue;
                }
                fields.insert(header.to_string(), cell_value(header, cell));
            }
            events.push(UsageEvent::new(fields));
        }

        Ok(Self::new(events))
    }

    pub fn events(&self) -> &[UsageEvent] {
        &self.events
    }

    /// Events inside the run's workspace and segment.
    pub fn scoped(&self, filters: &SimulationFilters) -> Vec<&UsageEvent> {
        scope_events(&self.events, filters)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// Scoping and event-type matching compare these columns as text.
const TEXT_COLUMNS: [&str; 3] = ["event_type", "workspace_id", "segment"];

fn cell_value(header: &str, cell: &str) -> Value {
    if TEXT_COLUMNS.contains(&header) {
        return Value::String(cell.to_string());
    }
    if let Ok(integer) = cell.parse::<i64>() {
        return Value::Number(integer.into());
    }
    cell.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}
