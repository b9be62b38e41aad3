use serde_json::Value;

use medreg_types::fields;

use crate::config::GateConfig;
use crate::error::GateError;
use crate::stage::{GateStage, StageDecision};

/// Photo stage.
///
/// The photo field is optional. `null` and the empty string count as absent;
/// any other value must be a string starting with the configured prefix
/// (`data:image/` by default).
pub struct PhotoStage;

impl GateStage for PhotoStage {
    fn name(&self) -> &str {
        "photo"
    }

    fn evaluate(&self, candidate: &Value, config: &GateConfig) -> Result<StageDecision, GateError> {
        match candidate.get(&config.photo_field) {
            None | Some(Value::Null) => Ok(StageDecision::Pass),
            Some(Value::String(s)) if s.is_empty() => Ok(StageDecision::Pass),
            Some(Value::String(s)) if s.starts_with(&config.photo_prefix) => {
                Ok(StageDecision::Pass)
            }
            Some(Value::String(_)) => Ok(StageDecision::fail(format!(
                "{} must be a data URI starting with {:?}",
                config.photo_field, config.photo_prefix
            ))),
            Some(other) => Ok(StageDecision::fail(format!(
                "{} must be a string, got {}",
                config.photo_field,
                fields::json_type_name(other)
            ))),
        }
    }
}
