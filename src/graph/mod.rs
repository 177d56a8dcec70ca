//! The phase graph and its scheduler.
//!
//! Every pipeline contributes four phase nodes (input, process, transform,
//! output) to a single directed acyclic graph spanning all pipelines:
//!
//! 1. **Builder** - topologically visits pipelines, validates dependencies,
//!    detects cycles, and wires edges, including the transform barrier that
//!    orders every non-isolated transform after every non-isolated process.
//! 2. **Scheduler** - runs one task per node; edges constrain real-time
//!    order, failures propagate as skips, and cancellation is cooperative.
//!
//! The graph is built once per engine and reused across runs; all per-run
//! state lives in the scheduler.

mod builder;
mod node;
mod scheduler;

pub use builder::PhaseGraph;
pub use node::{NodeIndex, PhaseNode, PhaseStatus};

pub(crate) use builder::build_phase_graph;
pub(crate) use scheduler::{RunContext, run_graph};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, DocumentFactory, Documents, Metadata, NullContent};
    use crate::module::{ExecutionContext, Module};
    use crate::pipeline::{PhaseKind, Pipeline, Pipelines};
    use crate::store::DocumentStore;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    /// Emits a fixed number of fresh documents, ignoring inputs.
    struct Emit(usize);

    #[async_trait]
    impl Module for Emit {
        async fn execute(
            &self,
            _ctx: &ExecutionContext,
        ) -> anyhow::Result<Option<Vec<Arc<Document>>>> {
            let factory = DocumentFactory::new();
            Ok(Some(
                (0..self.0)
                    .map(|_| factory.create(None, None, Metadata::new(), Arc::new(NullContent)))
                    .collect(),
            ))
        }
    }

    struct Fail;

    #[async_trait]
    impl Module for Fail {
        async fn execute(
            &self,
            _ctx: &ExecutionContext,
        ) -> anyhow::Result<Option<Vec<Arc<Document>>>> {
            Err(anyhow::anyhow!("boom"))
        }
    }

    /// Counts invocations and passes inputs through.
    struct Count(Arc<AtomicUsize>);

    #[async_trait]
    impl Module for Count {
        async fn execute(
            &self,
            ctx: &ExecutionContext,
        ) -> anyhow::Result<Option<Vec<Arc<Document>>>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Some(ctx.inputs().to_vec()))
        }
    }

    fn modules(list: Vec<Box<dyn Module>>) -> Vec<Box<dyn Module>> {
        list
    }

    async fn run(
        pipelines: &Pipelines,
        cancellation: CancellationToken,
    ) -> (Vec<crate::summary::PhaseReport>, Arc<DocumentStore>) {
        let graph = Arc::new(build_phase_graph(pipelines).unwrap());
        let store = Arc::new(DocumentStore::new());
        let reports = run_graph(
            graph,
            RunContext {
                execution_id: Uuid::new_v4(),
                store: Arc::clone(&store),
                cancellation,
            },
        )
        .await;
        (reports, store)
    }

    fn status_of(
        reports: &[crate::summary::PhaseReport],
        pipeline: &str,
        kind: PhaseKind,
    ) -> PhaseStatus {
        reports
            .iter()
            .find(|report| report.pipeline == pipeline && report.phase == kind)
            .map(|report| report.status)
            .unwrap()
    }

    #[tokio::test]
    async fn process_output_flows_to_transform_and_output() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut pipelines = Pipelines::new();
        pipelines.add(
            "a",
            Pipeline::new()
                .with_process_modules(modules(vec![Box::new(Emit(2))]))
                .with_output_modules(modules(vec![Box::new(Count(Arc::clone(&seen)))])),
        );

        let (reports, store) = run(&pipelines, CancellationToken::new()).await;

        assert!(reports.iter().all(|report| report.status.is_success()));
        assert_eq!(store.get("a").unwrap().len(), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn isolated_process_does_not_publish() {
        let mut pipelines = Pipelines::new();
        pipelines.add(
            "iso",
            Pipeline::new()
                .isolated()
                .with_process_modules(modules(vec![Box::new(Emit(1))])),
        );

        let (reports, store) = run(&pipelines, CancellationToken::new()).await;

        assert!(reports.iter().all(|report| report.status.is_success()));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failure_skips_downstream_and_dependents_but_not_independents() {
        let b_ran = Arc::new(AtomicUsize::new(0));
        let c_ran = Arc::new(AtomicUsize::new(0));
        let mut pipelines = Pipelines::new();
        pipelines.add(
            "a",
            Pipeline::new().with_process_modules(modules(vec![Box::new(Fail)])),
        );
        pipelines.add(
            "b",
            Pipeline::new()
                .with_dependency("a")
                .with_process_modules(modules(vec![Box::new(Count(Arc::clone(&b_ran)))])),
        );
        pipelines.add(
            "c",
            Pipeline::new().with_process_modules(modules(vec![Box::new(Count(Arc::clone(&c_ran)))])),
        );

        let (reports, store) = run(&pipelines, CancellationToken::new()).await;

        assert_eq!(status_of(&reports, "a", PhaseKind::Process), PhaseStatus::Failed);
        assert_eq!(status_of(&reports, "a", PhaseKind::Transform), PhaseStatus::Skipped);
        assert_eq!(status_of(&reports, "a", PhaseKind::Output), PhaseStatus::Skipped);
        assert_eq!(status_of(&reports, "b", PhaseKind::Process), PhaseStatus::Skipped);
        assert_eq!(status_of(&reports, "b", PhaseKind::Output), PhaseStatus::Skipped);
        assert_eq!(b_ran.load(Ordering::SeqCst), 0);

        // c's process is independent of a, so it still runs; its transform
        // sits behind the barrier and skips.
        assert_eq!(status_of(&reports, "c", PhaseKind::Process), PhaseStatus::Succeeded);
        assert_eq!(status_of(&reports, "c", PhaseKind::Transform), PhaseStatus::Skipped);
        assert_eq!(c_ran.load(Ordering::SeqCst), 1);
        assert!(store.get("a").is_none());
        assert!(store.get("c").is_some());
    }

    #[tokio::test]
    async fn cancellation_before_run_leaves_only_canceled_and_skipped() {
        let ran = Arc::new(AtomicUsize::new(0));
        let mut pipelines = Pipelines::new();
        pipelines.add(
            "a",
            Pipeline::new().with_process_modules(modules(vec![Box::new(Count(Arc::clone(&ran)))])),
        );
        pipelines.add("b", Pipeline::new().with_dependency("a"));

        let cancellation = CancellationToken::new();
        cancellation.cancel();
        let (reports, store) = run(&pipelines, cancellation).await;

        for report in &reports {
            assert!(
                matches!(report.status, PhaseStatus::Canceled | PhaseStatus::Skipped),
                "{}/{} was {:?}",
                report.pipeline,
                report.phase,
                report.status
            );
        }
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn panicking_module_fails_its_node_and_skips_downstream() {
        struct Panic;

        #[async_trait]
        impl Module for Panic {
            async fn execute(
                &self,
                _ctx: &ExecutionContext,
            ) -> anyhow::Result<Option<Vec<Arc<Document>>>> {
                panic!("module panicked");
            }
        }

        let mut pipelines = Pipelines::new();
        pipelines.add(
            "a",
            Pipeline::new().with_process_modules(modules(vec![Box::new(Panic)])),
        );

        let (reports, _store) = run(&pipelines, CancellationToken::new()).await;

        assert_eq!(status_of(&reports, "a", PhaseKind::Process), PhaseStatus::Failed);
        assert_eq!(status_of(&reports, "a", PhaseKind::Transform), PhaseStatus::Skipped);
        assert_eq!(status_of(&reports, "a", PhaseKind::Output), PhaseStatus::Skipped);
    }

    #[tokio::test]
    async fn documents_are_passed_by_reference_between_phases() {
        struct Tag;

        #[async_trait]
        impl Module for Tag {
            async fn execute(
                &self,
                ctx: &ExecutionContext,
            ) -> anyhow::Result<Option<Vec<Arc<Document>>>> {
                assert_eq!(ctx.inputs().len(), 1);
                Ok(Some(ctx.inputs().to_vec()))
            }
        }

        let mut pipelines = Pipelines::new();
        pipelines.add(
            "a",
            Pipeline::new()
                .with_input_modules(modules(vec![Box::new(Emit(1))]))
                .with_process_modules(modules(vec![Box::new(Tag)])),
        );

        let (reports, store) = run(&pipelines, CancellationToken::new()).await;
        assert!(reports.iter().all(|report| report.status.is_success()));
        let published: Documents = store.get("a").unwrap();
        assert_eq!(published.len(), 1);
    }
}
