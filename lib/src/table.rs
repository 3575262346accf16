use serde_json::{Map, Value};
use tracing::warn;

pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub key: String,
    pub full_value: String,
    pub display_value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub cells: Vec<Cell>,
    /// `{field: full_value}` over exactly the rendered fields.
    pub export: Map<String, Value>,
}

impl DisplayRow {
    /// The row as the JSON object that gets copied to the clipboard.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.export)
    }
}

/// Shorten `value` to its first `trim_length / 2` characters, an ellipsis
/// and its last `trim_length` characters. Values no longer than
/// `trim_length` are returned as they are.
pub fn trim_table_str(value: &str, trim_length: usize) -> String {
    let length = value.chars().count();
    if length <= trim_length {
        return value.to_string();
    }
    let head: String = value.chars().take(trim_length / 2).collect();
    let tail: String = value.chars().skip(length - trim_length).collect();
    format!("{head}{ELLIPSIS}{tail}")
}

/// Strings are shown verbatim, everything else as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(string) => string.clone(),
        other => other.to_string(),
    }
}

/// One row per record, in input order. Records that are not objects or
/// that lack one of `fields` are skipped.
pub fn render<S: AsRef<str>>(
    records: &[Value],
    fields: &[S],
    trim_length: usize,
) -> Vec<DisplayRow> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match render_row(record, fields, trim_length) {
            Ok(row) => Some(row),
            Err(err) => {
                warn!(target: "toychain::table", index, %err, "skipping record");
                None
            }
        })
        .collect()
}

pub fn render_row<S: AsRef<str>>(
    record: &Value,
    fields: &[S],
    trim_length: usize,
) -> Result<DisplayRow, Error> {
    let object = record.as_object().ok_or(Error::NotAnObject)?;
    let mut cells = Vec::with_capacity(fields.len());
    let mut export = Map::new();
    for field in fields {
        let key = field.as_ref();
        let value = object.get(key).ok_or_else(|| Error::MissingField {
            field: key.to_string(),
        })?;
        let full_value = stringify(value);
        export.insert(key.to_string(), Value::String(full_value.clone()));
        cells.push(Cell {
            key: key.to_string(),
            display_value: trim_table_str(&full_value, trim_length),
            full_value,
        });
    }
    Ok(DisplayRow { cells, export })
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("record is not an object")]
    NotAnObject,
    #[error("record has no field {field}")]
    MissingField { field: String },
}
