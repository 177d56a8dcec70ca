//! The execution engine.
//!
//! One engine owns the pipeline registry, the shared document store, and the
//! collaborators a run needs. `execute` performs a single run: clean paths,
//! build the phase graph once, clear the store, schedule every phase node,
//! and report per-phase outcomes. Per-phase failures never surface as
//! errors from `execute`; callers inspect the returned [`RunSummary`].
//!
//! An engine is not safe for concurrent `execute` calls; successive runs on
//! the same engine are serialized by the caller.

use crate::document::DocumentFactory;
use crate::errors::EngineError;
use crate::fs::FileSystem;
use crate::graph::{PhaseGraph, RunContext, build_phase_graph, run_graph};
use crate::pipeline::{Pipeline, Pipelines};
use crate::settings::{self, Settings};
use crate::store::DocumentStore;
use crate::summary::{ExecutionTimer, RunSummary};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

pub struct Engine {
    pipelines: Pipelines,
    settings: Settings,
    file_system: FileSystem,
    factory: Arc<DocumentFactory>,
    store: Arc<DocumentStore>,
    graph: Option<Arc<PhaseGraph>>,
    disposed: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Register a pipeline under a case-insensitive name.
    ///
    /// Registrations after the first `execute` call do not take effect: the
    /// phase graph is built once and reused across runs.
    pub fn add_pipeline(&mut self, name: impl Into<String>, pipeline: Pipeline) {
        self.pipelines.add(name, pipeline);
    }

    pub fn pipelines(&self) -> &Pipelines {
        &self.pipelines
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn file_system(&self) -> &FileSystem {
        &self.file_system
    }

    pub fn document_factory(&self) -> &Arc<DocumentFactory> {
        &self.factory
    }

    /// The shared document store, readable between and after runs.
    pub fn documents(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Perform one run over all registered pipelines.
    pub async fn execute(
        &mut self,
        cancellation: CancellationToken,
    ) -> Result<RunSummary, EngineError> {
        if self.disposed {
            return Err(EngineError::Disposed);
        }

        let execution_id = Uuid::new_v4();

        if self.pipelines.is_empty() {
            warn!("No pipelines are registered, nothing to execute");
            return Ok(RunSummary::empty(execution_id));
        }

        for input in self.file_system.input_paths() {
            if input == self.file_system.output_path() {
                warn!(
                    path = %input.display(),
                    "An input path is the same as the output path",
                );
            }
        }

        if let Err(err) = self.file_system.clean(self.file_system.temp_path()) {
            warn!(
                path = %self.file_system.temp_path().display(),
                "Failed to clean temp path: {err}",
            );
        }
        if self.settings.get_bool(settings::CLEAN_OUTPUT_PATH) {
            if let Err(err) = self.file_system.clean(self.file_system.output_path()) {
                warn!(
                    path = %self.file_system.output_path().display(),
                    "Failed to clean output path: {err}",
                );
            }
        }

        let graph = match self.graph.as_ref() {
            Some(graph) => Arc::clone(graph),
            None => {
                let graph = Arc::new(build_phase_graph(&self.pipelines)?);
                self.graph = Some(Arc::clone(&graph));
                graph
            }
        };

        let timer = ExecutionTimer::start();
        info!(
            "Executing {} pipelines (execution ID {execution_id})",
            self.pipelines.len(),
        );

        self.store.clear();

        let reports = run_graph(
            graph,
            RunContext {
                execution_id,
                store: Arc::clone(&self.store),
                cancellation,
            },
        )
        .await;

        let duration = timer.elapsed();
        info!(
            %execution_id,
            "Finished execution in {} ms",
            duration.as_millis(),
        );

        Ok(RunSummary {
            execution_id,
            duration,
            phases: reports,
        })
    }

    /// Tear the engine down. Idempotent; `execute` fails with
    /// [`EngineError::Disposed`] afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.graph = None;
        self.store.clear();
        if let Err(err) = self.file_system.clean(self.file_system.temp_path()) {
            warn!(
                path = %self.file_system.temp_path().display(),
                "Failed to clean temp path on dispose: {err}",
            );
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[derive(Debug, Default)]
pub struct EngineBuilder {
    settings: Settings,
    file_system: FileSystem,
    factory: DocumentFactory,
}

impl EngineBuilder {
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_file_system(mut self, file_system: FileSystem) -> Self {
        self.file_system = file_system;
        self
    }

    pub fn with_document_factory(mut self, factory: DocumentFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            pipelines: Pipelines::new(),
            settings: self.settings,
            file_system: self.file_system,
            factory: Arc::new(self.factory),
            store: Arc::new(DocumentStore::new()),
            graph: None,
            disposed: false,
        }
    }
}
