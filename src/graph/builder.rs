//! Phase graph construction.
//!
//! Builds the directed acyclic graph of phase nodes for all registered
//! pipelines in two passes:
//!
//! 1. A depth-first topological visit in registration order that validates
//!    dependencies, detects cycles exactly, and wires same-pipeline and
//!    dependency edges.
//! 2. The transform barrier: every non-isolated transform phase gains an
//!    upstream edge to the process phase of every other non-isolated
//!    pipeline, so transform modules can consult the shared document store
//!    for any of them.

use crate::errors::GraphError;
use crate::graph::node::{NodeIndex, PhaseNode};
use crate::pipeline::{PhaseKind, Pipeline, Pipelines};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The four node indices of one pipeline, grouped during construction.
struct PipelinePhases {
    input: NodeIndex,
    process: NodeIndex,
    transform: NodeIndex,
    output: NodeIndex,
    isolated: bool,
}

/// An immutable DAG of phase nodes, built once per engine and reused across
/// runs.
#[derive(Debug)]
pub struct PhaseGraph {
    nodes: Vec<PhaseNode>,
    /// Scheduler insertion order: every node appears after all of its
    /// upstream nodes. Execution order is constrained only by edges.
    order: Vec<NodeIndex>,
}

impl PhaseGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: NodeIndex) -> &PhaseNode {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[PhaseNode] {
        &self.nodes
    }

    pub fn order(&self) -> &[NodeIndex] {
        &self.order
    }

    /// Find a node by pipeline name (case-insensitive) and phase kind.
    pub fn find(&self, pipeline: &str, kind: PhaseKind) -> Option<NodeIndex> {
        self.nodes.iter().position(|node| {
            node.kind() == kind && node.pipeline().eq_ignore_ascii_case(pipeline)
        })
    }
}

/// Build the phase graph for a set of registered pipelines.
pub(crate) fn build_phase_graph(pipelines: &Pipelines) -> Result<PhaseGraph, GraphError> {
    Builder::new(pipelines).build()
}

struct Builder<'a> {
    pipelines: &'a Pipelines,
    nodes: Vec<PhaseNode>,
    /// Groups in visit order.
    groups: Vec<PipelinePhases>,
    /// Lowercased name -> position in `groups`; present only once the
    /// pipeline's visit has completed.
    group_index: HashMap<String, usize>,
    /// Lowercased names whose visit has started. A name that is visited but
    /// has no group yet is mid-visit, which is exactly a cycle.
    visited: HashSet<String>,
}

impl<'a> Builder<'a> {
    fn new(pipelines: &'a Pipelines) -> Self {
        Self {
            pipelines,
            nodes: Vec::with_capacity(pipelines.len() * PhaseKind::ALL.len()),
            groups: Vec::with_capacity(pipelines.len()),
            group_index: HashMap::new(),
            visited: HashSet::new(),
        }
    }

    fn build(mut self) -> Result<PhaseGraph, GraphError> {
        let registered: Vec<(Arc<str>, Arc<Pipeline>)> = self
            .pipelines
            .iter()
            .map(|(name, pipeline)| (Arc::clone(name), Arc::clone(pipeline)))
            .collect();
        for (name, pipeline) in registered {
            self.visit(name, pipeline)?;
        }

        self.add_transform_barrier();

        let mut order = Vec::with_capacity(self.nodes.len());
        order.extend(self.groups.iter().map(|group| group.input));
        order.extend(self.groups.iter().map(|group| group.process));
        order.extend(self.groups.iter().map(|group| group.transform));
        order.extend(self.groups.iter().map(|group| group.output));

        Ok(PhaseGraph {
            nodes: self.nodes,
            order,
        })
    }

    fn visit(&mut self, name: Arc<str>, pipeline: Arc<Pipeline>) -> Result<usize, GraphError> {
        let key = name.to_lowercase();
        if self.visited.contains(&key) {
            return match self.group_index.get(&key) {
                Some(&group) => Ok(group),
                None => Err(GraphError::CycleDetected {
                    pipeline: name.to_string(),
                }),
            };
        }
        self.visited.insert(key.clone());

        if pipeline.is_isolated() {
            if !pipeline.dependencies().is_empty() {
                return Err(GraphError::IsolatedWithDependencies {
                    pipeline: name.to_string(),
                });
            }
            let group = self.add_group(name, pipeline, Vec::new());
            self.group_index.insert(key, group);
            return Ok(group);
        }

        let mut dependency_processes = Vec::new();
        for dependency in pipeline.dependencies() {
            let Some(dependency_pipeline) = self.pipelines.get(dependency) else {
                return Err(GraphError::UnknownDependency {
                    pipeline: name.to_string(),
                    dependency: dependency.clone(),
                });
            };
            if dependency_pipeline.is_isolated() {
                return Err(GraphError::IsolatedDependency {
                    pipeline: name.to_string(),
                    dependency: dependency.clone(),
                });
            }
            let dependency_name = self
                .pipelines
                .display_name(dependency)
                .map(Arc::clone)
                .unwrap_or_else(|| Arc::from(dependency.as_str()));
            let dependency_pipeline = Arc::clone(dependency_pipeline);
            let dependency_group = self.visit(dependency_name, dependency_pipeline)?;
            let process = self.groups[dependency_group].process;
            if !dependency_processes.contains(&process) {
                dependency_processes.push(process);
            }
        }

        let group = self.add_group(name, pipeline, dependency_processes);
        self.group_index.insert(key, group);
        Ok(group)
    }

    /// Create the four phase nodes of one pipeline and record the group.
    ///
    /// `dependency_processes` is empty for isolated pipelines, whose phases
    /// form a private linear chain.
    fn add_group(
        &mut self,
        name: Arc<str>,
        pipeline: Arc<Pipeline>,
        dependency_processes: Vec<NodeIndex>,
    ) -> usize {
        let isolated = pipeline.is_isolated();
        let input = self.add_node(&name, &pipeline, PhaseKind::Input, Vec::new(), None);

        let mut process_upstream = vec![input];
        process_upstream.extend(dependency_processes);
        let process = self.add_node(
            &name,
            &pipeline,
            PhaseKind::Process,
            process_upstream,
            Some(input),
        );

        let transform = self.add_node(
            &name,
            &pipeline,
            PhaseKind::Transform,
            vec![process],
            Some(process),
        );
        let output = self.add_node(
            &name,
            &pipeline,
            PhaseKind::Output,
            vec![transform],
            Some(transform),
        );

        self.groups.push(PipelinePhases {
            input,
            process,
            transform,
            output,
            isolated,
        });
        self.groups.len() - 1
    }

    fn add_node(
        &mut self,
        name: &Arc<str>,
        pipeline: &Arc<Pipeline>,
        kind: PhaseKind,
        upstream: Vec<NodeIndex>,
        input_source: Option<NodeIndex>,
    ) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(PhaseNode::new(
            Arc::clone(name),
            Arc::clone(pipeline),
            kind,
            upstream,
            input_source,
        ));
        index
    }

    /// Pass 2: synchronize every non-isolated transform phase behind the
    /// process phases of all other non-isolated pipelines.
    fn add_transform_barrier(&mut self) {
        let non_isolated: Vec<(NodeIndex, NodeIndex)> = self
            .groups
            .iter()
            .filter(|group| !group.isolated)
            .map(|group| (group.transform, group.process))
            .collect();

        for &(transform, own_process) in &non_isolated {
            for &(_, process) in &non_isolated {
                if process != own_process {
                    self.nodes[transform].add_upstream(process);
                }
            }
        }
    }
}
