use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Label used when an issue carries no checker name.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Root of a defect report. Fields other than `issues` are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub issues: Vec<Issue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named fields are read leniently: a null or wrongly typed value leaves the field at its
/// default and stays in `extra` under its original key, so saving writes it back as found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct Issue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checker_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_event_file_pathname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_event_line_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// An empty or unreadable `events` value is left in `extra` as it was.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    /// Absent until the issue has been through `fix`; never written as `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Move `key` out of `map` if it has the expected type; otherwise leave it where it is.
fn take_field<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = map.get(key)?;
    let parsed = serde_json::from_value(value.clone()).ok()?;
    map.remove(key);
    Some(parsed)
}

impl From<Map<String, Value>> for Issue {
    fn from(mut map: Map<String, Value>) -> Self {
        let has_events = map
            .get("events")
            .and_then(Value::as_array)
            .is_some_and(|events| !events.is_empty());
        let events = if has_events {
            take_field::<Vec<Map<String, Value>>>(&mut map, "events")
                .map(|events| events.into_iter().map(Event::from).collect())
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        Self {
            checker_name: take_field(&mut map, "checkerName"),
            main_event_file_pathname: take_field(&mut map, "mainEventFilePathname"),
            main_event_line_number: take_field(&mut map, "mainEventLineNumber"),
            function_display_name: take_field(&mut map, "functionDisplayName"),
            subcategory: take_field(&mut map, "subcategory"),
            events,
            fixed: take_field(&mut map, "fixed"),
            extra: map,
        }
    }
}

impl From<Map<String, Value>> for Event {
    fn from(mut map: Map<String, Value>) -> Self {
        Self {
            event_description: take_field(&mut map, "eventDescription"),
            extra: map,
        }
    }
}

impl Issue {
    /// Checker name, or `""` when absent. Used for matching.
    pub fn category(&self) -> &str {
        self.checker_name.as_deref().unwrap_or("")
    }

    /// Checker name, or [`UNKNOWN_CATEGORY`] when absent. Used for counting.
    pub fn category_label(&self) -> &str {
        self.checker_name.as_deref().unwrap_or(UNKNOWN_CATEGORY)
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed.unwrap_or(false)
    }

    /// Event descriptions in trace order; events without a description are skipped.
    pub fn event_descriptions(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| e.event_description.as_deref())
            .collect()
    }
}

/// Parse a report document. The only shape requirement is a top-level `issues` field.
pub fn parse_report(raw: &str) -> Result<Report> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| Error::InvalidReport(format!("failed to parse report JSON: {e}")))?;

    match value.as_object() {
        Some(obj) if obj.contains_key("issues") => {}
        Some(_) => {
            return Err(Error::InvalidReport(
                "missing required field `issues`".to_string(),
            ));
        }
        None => {
            return Err(Error::InvalidReport(
                "report must be a JSON object".to_string(),
            ));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| Error::InvalidReport(format!("malformed issues: {e}")))
}

/// Serialize a report with indentation, the same shape it was read in.
pub fn render_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| Error::InvalidReport(format!("failed to serialize report: {e}")))
}
