//! Pipeline definitions and the case-insensitive pipeline registry.
//!
//! A pipeline is a named unit carrying four ordered module lists, one per
//! execution phase, a set of dependency names, and an isolated flag.
//! Pipelines are registered before the first execution and are immutable for
//! the duration of a run.

use crate::module::Module;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The four ordered execution phases of every pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// Reads or synthesizes the pipeline's initial documents.
    Input,
    /// Processes input documents; output is published to the shared store
    /// for non-isolated pipelines.
    Process,
    /// Transforms process output; may consult the shared store for other
    /// pipelines' process results.
    Transform,
    /// Emits the final documents.
    Output,
}

impl PhaseKind {
    /// All phases in execution order.
    pub const ALL: [PhaseKind; 4] = [
        PhaseKind::Input,
        PhaseKind::Process,
        PhaseKind::Transform,
        PhaseKind::Output,
    ];
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseKind::Input => "input",
            PhaseKind::Process => "process",
            PhaseKind::Transform => "transform",
            PhaseKind::Output => "output",
        };
        f.write_str(name)
    }
}

/// A named sequence of module chains executed over four phases.
#[derive(Default)]
pub struct Pipeline {
    input_modules: Vec<Box<dyn Module>>,
    process_modules: Vec<Box<dyn Module>>,
    transform_modules: Vec<Box<dyn Module>>,
    output_modules: Vec<Box<dyn Module>>,
    dependencies: Vec<String>,
    isolated: bool,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_modules(mut self, modules: Vec<Box<dyn Module>>) -> Self {
        self.input_modules = modules;
        self
    }

    pub fn with_process_modules(mut self, modules: Vec<Box<dyn Module>>) -> Self {
        self.process_modules = modules;
        self
    }

    pub fn with_transform_modules(mut self, modules: Vec<Box<dyn Module>>) -> Self {
        self.transform_modules = modules;
        self
    }

    pub fn with_output_modules(mut self, modules: Vec<Box<dyn Module>>) -> Self {
        self.output_modules = modules;
        self
    }

    /// Declare a dependency on another pipeline by name.
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(names.into_iter().map(Into::into));
        self
    }

    /// Mark this pipeline isolated: its phases form a private linear chain
    /// and it neither declares nor satisfies dependencies.
    pub fn isolated(mut self) -> Self {
        self.isolated = true;
        self
    }

    /// The module chain for one phase.
    pub fn modules(&self, phase: PhaseKind) -> &[Box<dyn Module>] {
        match phase {
            PhaseKind::Input => &self.input_modules,
            PhaseKind::Process => &self.process_modules,
            PhaseKind::Transform => &self.transform_modules,
            PhaseKind::Output => &self.output_modules,
        }
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn is_isolated(&self) -> bool {
        self.isolated
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("input_modules", &self.input_modules.len())
            .field("process_modules", &self.process_modules.len())
            .field("transform_modules", &self.transform_modules.len())
            .field("output_modules", &self.output_modules.len())
            .field("dependencies", &self.dependencies)
            .field("isolated", &self.isolated)
            .finish()
    }
}

/// Registry of pipelines keyed by case-insensitive name.
///
/// Registration order is preserved; the graph builder visits pipelines in
/// this order so graph construction is deterministic.
#[derive(Debug, Default)]
pub struct Pipelines {
    entries: Vec<(Arc<str>, Arc<Pipeline>)>,
    index: HashMap<String, usize>,
}

impl Pipelines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pipeline. A name that matches an existing registration
    /// case-insensitively replaces it in place, keeping its position.
    pub fn add(&mut self, name: impl Into<String>, pipeline: Pipeline) {
        let name = name.into();
        let key = name.to_lowercase();
        let entry = (Arc::<str>::from(name.as_str()), Arc::new(pipeline));
        match self.index.get(&key) {
            Some(&position) => self.entries[position] = entry,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Pipeline>> {
        self.index
            .get(&name.to_lowercase())
            .map(|&position| &self.entries[position].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Registered display-case name for a case-insensitive lookup.
    pub fn display_name(&self, name: &str) -> Option<&Arc<str>> {
        self.index
            .get(&name.to_lowercase())
            .map(|&position| &self.entries[position].0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate pipelines in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Arc<Pipeline>)> {
        self.entries.iter().map(|(name, pipeline)| (name, pipeline))
    }
}
