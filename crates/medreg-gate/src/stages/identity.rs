use serde_json::Value;

use medreg_types::{fields, RecordId};

use crate::config::GateConfig;
use crate::error::GateError;
use crate::stage::{GateStage, StageDecision};

/// Identity stage.
///
/// The candidate must be a JSON object whose `recordId` is a non-empty
/// string, since that value becomes the store key.
pub struct IdentityStage;

impl GateStage for IdentityStage {
    fn name(&self) -> &str {
        "identity"
    }

    fn evaluate(&self, candidate: &Value, _config: &GateConfig) -> Result<StageDecision, GateError> {
        if !candidate.is_object() {
            return Ok(StageDecision::fail(format!(
                "record must be a JSON object, got {}",
                fields::json_type_name(candidate)
            )));
        }
        // A missing or null id is reported by the required-fields stage so the
        // reason lists every absent field at once.
        match candidate.get(fields::RECORD_ID) {
            None | Some(Value::Null) => Ok(StageDecision::Pass),
            Some(Value::String(id)) => match RecordId::new(id.as_str()) {
                Ok(_) => Ok(StageDecision::Pass),
                Err(e) => Ok(StageDecision::fail(e.to_string())),
            },
            Some(other) => Ok(StageDecision::fail(format!(
                "{} must be a string, got {}",
                fields::RECORD_ID,
                fields::json_type_name(other)
            ))),
        }
    }
}
