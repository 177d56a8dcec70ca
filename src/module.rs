//! Modules and the module chain executor.
//!
//! A module is an opaque transformer with a single asynchronous execute
//! operation. Within a phase, modules run sequentially: the output array of
//! one module becomes the input array of the next.

use crate::document::{Document, Documents};
use crate::errors::PhaseError;
use crate::pipeline::PhaseKind;
use crate::store::DocumentStore;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::error;
use uuid::Uuid;

/// An opaque unit of work inside a phase.
///
/// Modules are embedder code; errors they return are arbitrary and abort the
/// owning phase. A `None` result is treated as an empty output array.
#[async_trait]
pub trait Module: Send + Sync {
    /// Short name used in logs. Defaults to the implementing type's name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("module")
    }

    /// Transform the context's input documents into output documents.
    async fn execute(&self, ctx: &ExecutionContext) -> anyhow::Result<Option<Vec<Arc<Document>>>>;
}

/// Run-scoped data shared by every module context of one phase.
#[derive(Clone)]
pub(crate) struct ContextData {
    pub execution_id: Uuid,
    pub pipeline: Arc<str>,
    pub phase: PhaseKind,
    pub store: Arc<DocumentStore>,
    pub cancellation: CancellationToken,
}

/// The per-module execution context.
///
/// Bundles the run identity, the current pipeline and phase, the module's
/// input documents, a handle to the shared document store, and the
/// cooperative cancellation token.
#[derive(Clone)]
pub struct ExecutionContext {
    data: ContextData,
    module: &'static str,
    inputs: Documents,
    parent: Option<Arc<ExecutionContext>>,
}

impl ExecutionContext {
    fn new(
        data: &ContextData,
        parent: Option<Arc<ExecutionContext>>,
        module: &'static str,
        inputs: Documents,
    ) -> Self {
        Self {
            data: data.clone(),
            module,
            inputs,
            parent,
        }
    }

    /// Unique token minted for this engine run, for log correlation.
    pub fn execution_id(&self) -> Uuid {
        self.data.execution_id
    }

    /// Name of the pipeline this module runs in.
    pub fn pipeline(&self) -> &str {
        &self.data.pipeline
    }

    pub fn phase(&self) -> PhaseKind {
        self.data.phase
    }

    /// Name of the currently executing module.
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// The input document array for this module.
    pub fn inputs(&self) -> &Documents {
        &self.inputs
    }

    /// The engine-wide shared document store.
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.data.store
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.data.cancellation
    }

    /// The context of the module chain that spawned this one, if nested.
    pub fn parent(&self) -> Option<&ExecutionContext> {
        self.parent.as_deref()
    }

    /// Execute a child module chain with this context as parent.
    ///
    /// Lets composite modules thread a document array through inner modules
    /// with the same cancellation and store visibility.
    pub async fn execute_modules(
        &self,
        modules: &[Box<dyn Module>],
        inputs: Documents,
    ) -> Result<Documents, PhaseError> {
        execute_module_chain(&self.data, Some(Arc::new(self.clone())), modules, inputs).await
    }
}

/// Run an ordered module chain over an input document array.
///
/// Cancellation is observed before each module and propagates silently. Any
/// other module failure logs an error naming the module and aborts the chain;
/// subsequent modules do not run. An empty chain returns the inputs
/// unchanged.
pub(crate) async fn execute_module_chain(
    data: &ContextData,
    parent: Option<Arc<ExecutionContext>>,
    modules: &[Box<dyn Module>],
    inputs: Documents,
) -> Result<Documents, PhaseError> {
    let mut current = inputs;
    for module in modules {
        if data.cancellation.is_cancelled() {
            return Err(PhaseError::Canceled);
        }
        let ctx = ExecutionContext::new(data, parent.clone(), module.name(), current.clone());
        match module.execute(&ctx).await {
            Ok(outputs) => {
                current = outputs.map(Documents::from).unwrap_or_default();
            }
            Err(source) => {
                error!(
                    pipeline = %data.pipeline,
                    phase = %data.phase,
                    module = module.name(),
                    "Module {} failed: {source:#}",
                    module.name(),
                );
                return Err(PhaseError::ModuleFailure {
                    module: module.name().to_string(),
                    pipeline: data.pipeline.to_string(),
                    phase: data.phase,
                    source,
                });
            }
        }
    }
    Ok(current)
}
