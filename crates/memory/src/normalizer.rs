//! Record normalizer — one sensor record in, one retrievable text line out.

use nomi_core::record::SensorRecord;
use serde_json::Value;

/// Separator between `key: value` pairs on a normalized line.
pub const FIELD_SEPARATOR: &str = " | ";

/// Render one record as `key: value` pairs in priority order.
///
/// Records without any recognized field fall back to their compact JSON
/// form so extra fields are never silently dropped.
pub fn normalize(record: &SensorRecord) -> String {
    let fields = record.recognized_fields();
    if fields.is_empty() {
        return serde_json::to_string(record).unwrap_or_else(|_| format!("{:?}", record.extra));
    }

    fields
        .iter()
        .map(|(key, value)| format!("{key}: {}", render_value(value)))
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR)
}

/// Normalize every record and join the lines with `\n`, in order.
pub fn normalize_all(records: &[SensorRecord]) -> String {
    records.iter().map(normalize).collect::<Vec<_>>().join("\n")
}

/// Strings render raw, everything else as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
