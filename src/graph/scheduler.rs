//! Phase scheduling.
//!
//! Launches one task per phase node and lets dependency edges constrain the
//! real-time order. Each node owns a watch channel; its terminal outcome is
//! broadcast exactly once, and downstream tasks await *every* upstream
//! outcome before deciding whether to run or skip. A failed upstream never
//! short-circuits observation of its siblings.

use crate::document::Documents;
use crate::graph::builder::PhaseGraph;
use crate::graph::node::{NodeIndex, PhaseNode, PhaseStatus};
use crate::module::{ContextData, execute_module_chain};
use crate::pipeline::PhaseKind;
use crate::store::DocumentStore;
use crate::summary::{ExecutionTimer, PhaseReport};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use uuid::Uuid;

/// Terminal result of one phase node, broadcast to downstream nodes.
#[derive(Clone)]
struct PhaseOutcome {
    status: PhaseStatus,
    /// Output document array; empty unless the phase succeeded.
    outputs: Documents,
}

type OutcomeSender = watch::Sender<Option<PhaseOutcome>>;
type OutcomeReceiver = watch::Receiver<Option<PhaseOutcome>>;

/// Run-scoped collaborators shared by every phase task.
#[derive(Clone)]
pub(crate) struct RunContext {
    pub execution_id: Uuid,
    pub store: Arc<DocumentStore>,
    pub cancellation: CancellationToken,
}

/// Execute every phase node of the graph once, honoring dependency edges and
/// cancellation. Returns one report per node in scheduler order.
pub(crate) async fn run_graph(graph: Arc<PhaseGraph>, run: RunContext) -> Vec<PhaseReport> {
    let node_count = graph.len();
    let mut senders: Vec<Option<OutcomeSender>> = Vec::with_capacity(node_count);
    let mut receivers: Vec<OutcomeReceiver> = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let (sender, receiver) = watch::channel(None);
        senders.push(Some(sender));
        receivers.push(receiver);
    }

    let mut scheduled: Vec<NodeIndex> = Vec::with_capacity(node_count);
    let mut handles = Vec::with_capacity(node_count);
    for &index in graph.order() {
        let Some(sender) = senders.get_mut(index).and_then(Option::take) else {
            continue;
        };
        scheduled.push(index);
        let upstream: Vec<(NodeIndex, OutcomeReceiver)> = graph
            .node(index)
            .upstream()
            .iter()
            .map(|&up| (up, receivers[up].clone()))
            .collect();
        let graph = Arc::clone(&graph);
        let run = run.clone();
        handles.push(tokio::spawn(async move {
            run_phase(&graph, index, sender, upstream, run).await
        }));
    }

    let mut reports = Vec::with_capacity(node_count);
    for (&index, result) in scheduled.iter().zip(join_all(handles).await) {
        match result {
            Ok(report) => reports.push(report),
            Err(join_error) => {
                let node = graph.node(index);
                error!(
                    execution_id = %run.execution_id,
                    "Phase task for {}/{} terminated abnormally: {join_error}",
                    node.pipeline(),
                    node.kind(),
                );
                reports.push(
                    PhaseReport::new(node.pipeline(), node.kind(), PhaseStatus::Failed)
                        .with_error(join_error.to_string()),
                );
            }
        }
    }
    reports
}

async fn run_phase(
    graph: &PhaseGraph,
    index: NodeIndex,
    sender: OutcomeSender,
    upstream: Vec<(NodeIndex, OutcomeReceiver)>,
    run: RunContext,
) -> PhaseReport {
    let node = graph.node(index);

    let mut outcomes: HashMap<NodeIndex, PhaseOutcome> = HashMap::with_capacity(upstream.len());
    for (upstream_index, receiver) in upstream {
        outcomes.insert(upstream_index, await_outcome(receiver).await);
    }

    if run.cancellation.is_cancelled() {
        return finish(node, &sender, PhaseStatus::Canceled, Documents::empty());
    }

    if outcomes.values().any(|outcome| !outcome.status.is_success()) {
        error!(
            "Skipping {}/{} due to dependency error",
            node.pipeline(),
            node.kind(),
        );
        return finish(node, &sender, PhaseStatus::Skipped, Documents::empty());
    }

    let inputs = node
        .input_source()
        .and_then(|source| outcomes.get(&source))
        .map(|outcome| outcome.outputs.clone())
        .unwrap_or_default();

    debug!(
        execution_id = %run.execution_id,
        "Executing {}/{} with {} input documents",
        node.pipeline(),
        node.kind(),
        inputs.len(),
    );
    let timer = ExecutionTimer::start();
    let data = ContextData {
        execution_id: run.execution_id,
        pipeline: Arc::clone(node.pipeline_arc()),
        phase: node.kind(),
        store: Arc::clone(&run.store),
        cancellation: run.cancellation.clone(),
    };

    match execute_module_chain(&data, None, node.modules(), inputs).await {
        Ok(outputs) => {
            if node.kind() == PhaseKind::Process && !node.is_isolated() {
                run.store.publish(node.pipeline(), outputs.clone());
            }
            debug!(
                "Finished {}/{} with {} output documents",
                node.pipeline(),
                node.kind(),
                outputs.len(),
            );
            finish(node, &sender, PhaseStatus::Succeeded, outputs).with_duration(timer.elapsed())
        }
        Err(err) if err.is_canceled() => {
            finish(node, &sender, PhaseStatus::Canceled, Documents::empty())
                .with_duration(timer.elapsed())
        }
        Err(err) => finish(node, &sender, PhaseStatus::Failed, Documents::empty())
            .with_error(err.to_string())
            .with_duration(timer.elapsed()),
    }
}

/// Broadcast the terminal outcome so downstream nodes may progress, then
/// build the report for the run summary.
fn finish(
    node: &PhaseNode,
    sender: &OutcomeSender,
    status: PhaseStatus,
    outputs: Documents,
) -> PhaseReport {
    sender.send(Some(PhaseOutcome { status, outputs })).ok();
    PhaseReport::new(node.pipeline(), node.kind(), status)
}

/// Wait until an upstream node broadcasts its terminal outcome.
///
/// A closed channel means the upstream task died without signaling (a
/// panic); treat it as a failure so downstream nodes skip.
async fn await_outcome(mut receiver: OutcomeReceiver) -> PhaseOutcome {
    loop {
        {
            let value = receiver.borrow_and_update();
            if let Some(outcome) = value.as_ref() {
                return outcome.clone();
            }
        }
        if receiver.changed().await.is_err() {
            return PhaseOutcome {
                status: PhaseStatus::Failed,
                outputs: Documents::empty(),
            };
        }
    }
}
