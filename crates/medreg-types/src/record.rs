use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::fields::{self, json_type_name};

/// Identity of a record: the string it is stored under.
///
/// Any non-empty string is a valid identity here. Storage backends may impose
/// their own key rules on top (see `medreg_store::names`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a record id, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidRecordId("record id must not be empty".into()));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A patient record: a JSON object carrying a string `recordId`.
///
/// Only the identity is interpreted here. All other fields, including ones the
/// registry knows nothing about, are kept verbatim and serialized back as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    id: RecordId,
    fields: Map<String, Value>,
}

impl Record {
    /// Build a record from an arbitrary JSON value.
    ///
    /// Fails if the value is not an object or its `recordId` is not a
    /// non-empty string. Shape rules beyond the identity live in the gate.
    pub fn from_value(value: Value) -> Result<Self, TypeError> {
        let fields = match value {
            Value::Object(map) => map,
            other => return Err(TypeError::NotAnObject(json_type_name(&other))),
        };
        let id = match fields.get(fields::RECORD_ID) {
            None | Some(Value::Null) => return Err(TypeError::MissingRecordId(fields::RECORD_ID)),
            Some(Value::String(s)) => RecordId::new(s.clone())?,
            Some(other) => {
                return Err(TypeError::InvalidRecordId(format!(
                    "expected a string, got {}",
                    json_type_name(other)
                )))
            }
        };
        Ok(Self { id, fields })
    }

    /// Parse a record from its serialized JSON form.
    pub fn from_json(json: &str) -> Result<Self, TypeError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| TypeError::Serialization(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Look up a single field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// All fields, including `recordId`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Serialize the full record, every field included.
    pub fn to_json(&self) -> Result<String, TypeError> {
        serde_json::to_string(&self.fields).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patient() -> Value {
        json!({
            "recordId": "P1",
            "name": "A",
            "age": 30,
            "gender": "M",
            "bloodType": "O+",
            "allergies": "None reported",
        })
    }

    #[test]
    fn record_id_rejects_empty() {
        assert!(RecordId::new("").is_err());
        assert_eq!(RecordId::new("P1").unwrap().as_str(), "P1");
    }

    #[test]
    fn record_id_display_and_debug() {
        let id = RecordId::new("PAT-2024-001").unwrap();
        assert_eq!(id.to_string(), "PAT-2024-001");
        assert_eq!(format!("{id:?}"), "RecordId(PAT-2024-001)");
    }

    #[test]
    fn from_value_keeps_unknown_fields() {
        let record = Record::from_value(patient()).unwrap();
        assert_eq!(record.id().as_str(), "P1");
        assert_eq!(record.get("allergies"), Some(&json!("None reported")));
        assert_eq!(record.fields().len(), 6);
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert_eq!(
            Record::from_value(json!([1, 2])).unwrap_err(),
            TypeError::NotAnObject("array")
        );
        assert_eq!(
            Record::from_value(Value::Null).unwrap_err(),
            TypeError::NotAnObject("null")
        );
    }

    #[test]
    fn from_value_requires_string_id() {
        let err = Record::from_value(json!({ "name": "A" })).unwrap_err();
        assert_eq!(err, TypeError::MissingRecordId("recordId"));

        let err = Record::from_value(json!({ "recordId": null })).unwrap_err();
        assert_eq!(err, TypeError::MissingRecordId("recordId"));

        let err = Record::from_value(json!({ "recordId": 42 })).unwrap_err();
        assert!(matches!(err, TypeError::InvalidRecordId(_)));

        let err = Record::from_value(json!({ "recordId": "" })).unwrap_err();
        assert!(matches!(err, TypeError::InvalidRecordId(_)));
    }

    #[test]
    fn json_round_trip_preserves_every_field() {
        let record = Record::from_value(patient()).unwrap();
        let json = record.to_json().unwrap();
        let back = Record::from_json(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn serde_uses_the_plain_object_form() {
        let record = Record::from_value(patient()).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, patient());

        let parsed: Record = serde_json::from_value(patient()).unwrap();
        assert_eq!(parsed.id().as_str(), "P1");
        assert!(serde_json::from_value::<Record>(json!("P1")).is_err());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_non_empty_string_id_is_accepted(id in ".{1,64}") {
                let record = Record::from_value(json!({ "recordId": id.clone() })).unwrap();
                prop_assert_eq!(record.id().as_str(), id.as_str());
            }
        }
    }
}
