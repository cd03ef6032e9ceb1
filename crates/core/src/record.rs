//! Sensor/vitals records — the raw input of the pipeline.
//!
//! A record has a handful of recognized fields and an open extension bag
//! for anything else the device or data source sends. Shape validation
//! happens once, at deserialization; the rest of the pipeline works with
//! typed fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Recognized record keys, in normalization priority order.
pub const RECOGNIZED_KEYS: [&str; 7] = [
    "timestamp",
    "patient_id",
    "sensor_type",
    "value",
    "vitals",
    "notes",
    "status",
];

/// One sensor or vitals reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<Value>,

    /// Device kind, e.g. "heart_rate", "fall_detector", "meds"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitals: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,

    /// Any other fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SensorRecord {
    /// Shorthand for a record carrying only a sensor type and value.
    pub fn reading(sensor_type: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            sensor_type: Some(sensor_type.into()),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// The recognized fields that are present, in priority order.
    pub fn recognized_fields(&self) -> Vec<(&'static str, Value)> {
        let slots: [Option<Value>; 7] = [
            self.timestamp.clone(),
            self.patient_id.clone(),
            self.sensor_type.clone().map(Value::String),
            self.value.clone(),
            self.vitals.clone(),
            self.notes.clone().map(Value::String),
            self.status.clone(),
        ];
        RECOGNIZED_KEYS
            .iter()
            .zip(slots)
            .filter_map(|(key, slot)| slot.map(|v| (*key, v)))
            .collect()
    }

    /// Parse a data-source payload: either one record object or an array of them.
    pub fn many_from_json(value: Value) -> Result<Vec<Self>, serde_json::Error> {
        match value {
            Value::Array(items) => items.into_iter().map(serde_json::from_value).collect(),
            other => Ok(vec![serde_json::from_value(other)?]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_recognized_and_extra_fields() {
        let record: SensorRecord = serde_json::from_value(json!({
            "timestamp": "2025-01-01T08:00:00Z",
            "sensor_type": "heart_rate",
            "value": 72,
            "room": "kitchen"
        }))
        .unwrap();
        assert_eq!(record.sensor_type.as_deref(), Some("heart_rate"));
        assert_eq!(record.value, Some(json!(72)));
        assert_eq!(record.extra.get("room"), Some(&json!("kitchen")));
        assert!(record.patient_id.is_none());
    }

    #[test]
    fn null_is_treated_as_absent() {
        let record: SensorRecord =
            serde_json::from_value(json!({"sensor_type": "sleep", "notes": null})).unwrap();
        assert!(record.notes.is_none());
        let fields = record.recognized_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "sensor_type");
    }

    #[test]
    fn non_string_sensor_type_is_rejected() {
        let result: Result<SensorRecord, _> = serde_json::from_value(json!({"sensor_type": 5}));
        assert!(result.is_err());
    }

    #[test]
    fn serialization_skips_absent_fields() {
        let record = SensorRecord::reading("fall_detector", "triggered");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"sensor_type":"fall_detector","value":"triggered"}"#);
    }

    #[test]
    fn recognized_fields_follow_priority_order() {
        let record: SensorRecord = serde_json::from_value(json!({
            "status": "ok",
            "notes": "after lunch",
            "patient_id": "p-7",
            "timestamp": 1700000000
        }))
        .unwrap();
        let keys: Vec<_> = record.recognized_fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["timestamp", "patient_id", "notes", "status"]);
    }

    #[test]
    fn many_from_single_object() {
        let records = SensorRecord::many_from_json(json!({"sensor_type": "meds"})).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn many_from_array_keeps_order() {
        let records = SensorRecord::many_from_json(json!([
            {"sensor_type": "sleep"},
            {"sensor_type": "eating"}
        ]))
        .unwrap();
        assert_eq!(records[0].sensor_type.as_deref(), Some("sleep"));
        assert_eq!(records[1].sensor_type.as_deref(), Some("eating"));
    }
}
