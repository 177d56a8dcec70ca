//! Static-content generation engine.
//!
//! `strata` executes a user-defined set of named **pipelines** over a shared
//! in-memory **document** collection. Each pipeline is decomposed into four
//! ordered phases (input, process, transform, output); the phases of all
//! pipelines form one directed acyclic graph that runs concurrently,
//! honoring cross-pipeline dependencies and cooperative cancellation.
//! Within a phase, an ordered chain of **modules** threads a document array
//! through successive transforms.
//!
//! ## Example
//!
//! ```no_run
//! use strata::engine::Engine;
//! use strata::pipeline::Pipeline;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(modules: Vec<Box<dyn strata::module::Module>>) {
//! let mut engine = Engine::new();
//! engine.add_pipeline("assets", Pipeline::new());
//! engine.add_pipeline(
//!     "posts",
//!     Pipeline::new()
//!         .with_process_modules(modules)
//!         .with_dependency("assets"),
//! );
//!
//! let summary = engine.execute(CancellationToken::new()).await.unwrap();
//! assert!(summary.all_succeeded());
//! # }
//! ```

pub mod document;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod graph;
pub mod module;
pub mod pipeline;
pub mod scripting;
pub mod settings;
pub mod store;
pub mod summary;

pub use document::{ContentProvider, Document, DocumentFactory, Documents, Metadata};
pub use engine::{Engine, EngineBuilder};
pub use errors::{EngineError, GraphError, PhaseError};
pub use graph::{PhaseGraph, PhaseStatus};
pub use module::{ExecutionContext, Module};
pub use pipeline::{PhaseKind, Pipeline, Pipelines};
pub use store::DocumentStore;
pub use summary::{PhaseReport, RunSummary};
