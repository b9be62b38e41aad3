use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use crate::config::GateConfig;
use crate::error::GateError;
use crate::stage::{GateStage, StageDecision, StageResult};
use crate::stages::{IdentityStage, PhotoStage, RequiredFieldsStage};

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Final decision of the gate for one candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected { stage: String, reason: String },
}

// ---------------------------------------------------------------------------
// GateResult
// ---------------------------------------------------------------------------

/// The outcome of running a candidate through the full gate.
#[derive(Clone, Debug)]
pub struct GateResult {
    /// The final decision.
    pub verdict: Verdict,
    /// Per-stage results in evaluation order.
    pub stage_results: Vec<StageResult>,
    /// Total wall-clock time for the evaluation.
    pub elapsed: Duration,
}

impl GateResult {
    /// Returns `true` if the candidate was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self.verdict, Verdict::Accepted)
    }

    /// The rejection reason, if the candidate was rejected.
    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Accepted => None,
            Verdict::Rejected { reason, .. } => Some(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordGate
// ---------------------------------------------------------------------------

/// The record gate: an ordered pipeline of shape checks every candidate
/// must pass before the registry looks at the store.
///
/// Validation is all-or-nothing. There is no partial acceptance.
pub struct RecordGate {
    stages: Vec<Box<dyn GateStage>>,
    config: GateConfig,
}

impl RecordGate {
    /// Create a gate with an empty pipeline.
    pub fn new(config: GateConfig) -> Result<Self, GateError> {
        config.validate()?;
        Ok(Self {
            stages: Vec::new(),
            config,
        })
    }

    /// Create a gate with the default pipeline:
    /// Identity -> RequiredFields -> Photo
    pub fn with_default_stages(config: GateConfig) -> Result<Self, GateError> {
        let mut gate = Self::new(config)?;
        gate.add_stage(Box::new(IdentityStage));
        gate.add_stage(Box::new(RequiredFieldsStage));
        gate.add_stage(Box::new(PhotoStage));
        Ok(gate)
    }

    /// Append a stage to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn GateStage>) {
        self.stages.push(stage);
    }

    /// The current configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Evaluate a candidate through the full pipeline.
    ///
    /// The pipeline is **fail-fast**: the first stage that fails stops
    /// evaluation and produces a `Rejected` verdict.
    pub fn evaluate(&self, candidate: &Value) -> Result<GateResult, GateError> {
        let pipeline_start = Instant::now();
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let stage_start = Instant::now();
            let decision = stage.evaluate(candidate, &self.config)?;
            let elapsed = stage_start.elapsed();

            let reason = match &decision {
                StageDecision::Pass => None,
                StageDecision::Fail { reason } => Some(reason.clone()),
            };
            debug!(stage = stage.name(), passed = reason.is_none(), "gate stage evaluated");

            stage_results.push(StageResult {
                stage_name: stage.name().to_string(),
                passed: reason.is_none(),
                reason: reason.clone(),
                elapsed,
            });

            if let Some(reason) = reason {
                return Ok(GateResult {
                    verdict: Verdict::Rejected {
                        stage: stage.name().to_string(),
                        reason,
                    },
                    stage_results,
                    elapsed: pipeline_start.elapsed(),
                });
            }
        }

        Ok(GateResult {
            verdict: Verdict::Accepted,
            stage_results,
            elapsed: pipeline_start.elapsed(),
        })
    }
}

impl std::fmt::Debug for RecordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("RecordGate")
            .field("stages", &names)
            .field("config", &self.config)
            .finish()
    }
}
