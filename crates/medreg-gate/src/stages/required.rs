use serde_json::Value;

use medreg_types::fields;

use crate::config::GateConfig;
use crate::error::GateError;
use crate::stage::{GateStage, StageDecision};

/// Required-fields stage.
///
/// Every configured field, plus the identity field, must be present and not
/// `null`. Any other value, empty strings included, satisfies the check.
pub struct RequiredFieldsStage;

impl GateStage for RequiredFieldsStage {
    fn name(&self) -> &str {
        "required-fields"
    }

    fn evaluate(&self, candidate: &Value, config: &GateConfig) -> Result<StageDecision, GateError> {
        let Some(object) = candidate.as_object() else {
            return Ok(StageDecision::fail("record must be a JSON object"));
        };

        let identity = std::iter::once(fields::RECORD_ID)
            .filter(|id| !config.required_fields.iter().any(|f| f == id));
        let missing: Vec<&str> = identity
            .chain(config.required_fields.iter().map(String::as_str))
            .filter(|field| matches!(object.get(*field), None | Some(Value::Null)))
            .collect();

        if missing.is_empty() {
            Ok(StageDecision::Pass)
        } else {
            Ok(StageDecision::fail(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}
