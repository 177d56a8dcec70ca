//! Typed error hierarchy for the execution engine.
//!
//! Three enums cover the three failure domains:
//! - `GraphError` - phase-graph construction failures (fatal, before any
//!   module runs)
//! - `PhaseError` - failures inside a single phase's module chain
//! - `EngineError` - orchestrator-level failures surfaced by `Engine::execute`

use crate::pipeline::PhaseKind;
use thiserror::Error;

/// Errors detected while building the phase graph.
///
/// All variants abort the run before any phase node executes.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Pipeline {pipeline} has dependency on unknown pipeline {dependency}")]
    UnknownDependency { pipeline: String, dependency: String },

    #[error("Pipeline {pipeline} has dependency on isolated pipeline {dependency}")]
    IsolatedDependency { pipeline: String, dependency: String },

    #[error("Pipeline cyclical dependency detected involving {pipeline}")]
    CycleDetected { pipeline: String },

    #[error("Isolated pipeline {pipeline} may not declare dependencies")]
    IsolatedWithDependencies { pipeline: String },
}

/// Errors from a single phase's module chain.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("Module {module} failed in {pipeline}/{phase}")]
    ModuleFailure {
        module: String,
        pipeline: String,
        phase: PhaseKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("Execution was canceled")]
    Canceled,
}

impl PhaseError {
    /// Cooperative cancellation is reported silently; everything else is an
    /// error worth logging.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Errors surfaced by the engine orchestrator itself.
///
/// Per-phase failures are never returned from `Engine::execute`; they live in
/// the run summary's phase reports.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Execute was called on a disposed engine")]
    Disposed,

    #[error(transparent)]
    Graph(#[from] GraphError),
}
