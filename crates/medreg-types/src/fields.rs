//! Well-known record field names.

/// The identity field. Its value is the store key.
pub const RECORD_ID: &str = "recordId";
pub const NAME: &str = "name";
pub const AGE: &str = "age";
pub const GENDER: &str = "gender";
pub const BLOOD_TYPE: &str = "bloodType";

/// Optional image attachment, a `data:image/...` URI when present.
pub const PHOTO: &str = "photo";

/// Prefix every non-empty photo value must carry.
pub const PHOTO_PREFIX: &str = "data:image/";

/// Fields that must be present and non-null on every record.
pub const REQUIRED: [&str; 5] = [RECORD_ID, NAME, AGE, GENDER, BLOOD_TYPE];

/// Short name of a JSON value's type, for error messages.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
