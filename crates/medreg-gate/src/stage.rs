use std::time::Duration;

use serde_json::Value;

use crate::config::GateConfig;
use crate::error::GateError;

// ---------------------------------------------------------------------------
// StageDecision
// ---------------------------------------------------------------------------

/// The outcome of a single gate stage evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageDecision {
    /// The stage passed; proceed to the next stage.
    Pass,
    /// The stage failed; the record must be rejected.
    Fail { reason: String },
}

impl StageDecision {
    /// Shorthand for a failure with a reason.
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::Fail {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the decision is `Pass`.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns `true` if the decision is `Fail`.
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Recorded result from a completed stage evaluation.
#[derive(Clone, Debug)]
pub struct StageResult {
    /// Name of the stage that produced this result.
    pub stage_name: String,
    /// Whether the stage passed.
    pub passed: bool,
    /// Populated on failure.
    pub reason: Option<String>,
    /// Wall-clock time the stage took to evaluate.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// GateStage trait
// ---------------------------------------------------------------------------

/// A single check in the record gate.
///
/// Stages see the raw candidate value, which has not been validated in any
/// way: it may not even be a JSON object. They are evaluated in order and
/// must be `Send + Sync` so the gate can be shared across tasks.
pub trait GateStage: Send + Sync {
    /// Human-readable name of this stage (e.g., "identity", "photo").
    fn name(&self) -> &str;

    /// Evaluate the candidate and return a decision.
    fn evaluate(&self, candidate: &Value, config: &GateConfig) -> Result<StageDecision, GateError>;
}
