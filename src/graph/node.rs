//! Phase nodes and their status.

use crate::module::Module;
use crate::pipeline::{PhaseKind, Pipeline};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Index of a phase node in the graph arena.
pub type NodeIndex = usize;

/// Status of a phase node during and after a run.
///
/// A node transitions at most once out of `Pending` and exactly once to a
/// terminal state. `Failed` and `Skipped` are observed identically by
/// downstream nodes: both cause a downstream skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Waiting for upstream nodes to reach a terminal state.
    #[default]
    Pending,
    /// The module chain is executing.
    Running,
    /// The module chain completed.
    Succeeded,
    /// A module failed; the phase aborted.
    Failed,
    /// An upstream node did not succeed.
    Skipped,
    /// Cooperative cancellation was observed.
    Canceled,
}

impl PhaseStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Skipped | Self::Canceled
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// One (pipeline, phase) pair in the phase graph.
///
/// Nodes live as long as the engine; per-run state (status, outputs,
/// completion signal) belongs to the scheduler, so the same graph is reused
/// across runs.
#[derive(Debug)]
pub struct PhaseNode {
    pipeline_name: Arc<str>,
    pipeline: Arc<Pipeline>,
    kind: PhaseKind,
    /// Nodes that must reach a terminal state before this one starts.
    upstream: Vec<NodeIndex>,
    /// The upstream node whose output feeds this phase; `None` for input
    /// phases, which start from the empty document array.
    input_source: Option<NodeIndex>,
}

impl PhaseNode {
    pub(crate) fn new(
        pipeline_name: Arc<str>,
        pipeline: Arc<Pipeline>,
        kind: PhaseKind,
        upstream: Vec<NodeIndex>,
        input_source: Option<NodeIndex>,
    ) -> Self {
        Self {
            pipeline_name,
            pipeline,
            kind,
            upstream,
            input_source,
        }
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline_name
    }

    pub(crate) fn pipeline_arc(&self) -> &Arc<str> {
        &self.pipeline_name
    }

    pub fn kind(&self) -> PhaseKind {
        self.kind
    }

    pub fn is_isolated(&self) -> bool {
        self.pipeline.is_isolated()
    }

    pub fn upstream(&self) -> &[NodeIndex] {
        &self.upstream
    }

    pub fn input_source(&self) -> Option<NodeIndex> {
        self.input_source
    }

    pub(crate) fn modules(&self) -> &[Box<dyn Module>] {
        self.pipeline.modules(self.kind)
    }

    pub(crate) fn add_upstream(&mut self, index: NodeIndex) {
        self.upstream.push(index);
    }
}
