//! Step dependency graph
//!
//! Immutable DAG of step keys built from a pipeline's step definitions.
//! Construction checks every upstream reference and rejects cycles, so the
//! rest of the system can walk the graph without re-validating it.

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

/// A single step as declared by a pipeline definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub key: String,
    /// Steps whose outputs this step consumes
    #[serde(default)]
    pub upstream: Vec<String>,
}

impl StepDefinition {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            upstream: Vec::new(),
        }
    }

    /// Declares the steps this one depends on
    pub fn after<I, S>(mut self, upstream: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.upstream.extend(upstream.into_iter().map(Into::into));
        self
    }
}

/// Errors raised while building a [`StepGraph`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("step '{0}' is declared more than once")]
    DuplicateStep(String),

    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    #[error("dependency cycle detected through step '{0}'")]
    Cycle(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StepNode {
    upstream: Vec<String>,
    downstream: Vec<String>,
}

/// Validated step dependency graph
///
/// Keeps both edge directions per step plus a deterministic topological
/// order: steps sorted by depth from the roots, ties broken by declaration
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StepDefinition>", into = "Vec<StepDefinition>")]
pub struct StepGraph {
    nodes: HashMap<String, StepNode>,
    order: Vec<String>,
}

impl StepGraph {
    /// Builds a graph from step definitions
    pub fn new(steps: impl IntoIterator<Item = StepDefinition>) -> Result<Self, GraphError> {
        let mut nodes: HashMap<String, StepNode> = HashMap::new();
        let mut declared: Vec<String> = Vec::new();

        for step in steps {
            if nodes.contains_key(&step.key) {
                return Err(GraphError::DuplicateStep(step.key));
            }

            let mut seen = HashSet::new();
            let upstream = step
                .upstream
                .into_iter()
                .filter(|dep| seen.insert(dep.clone()))
                .collect();

            declared.push(step.key.clone());
            nodes.insert(
                step.key,
                StepNode {
                    upstream,
                    downstream: Vec::new(),
                },
            );
        }

        // Second pass: resolve upstream references into downstream edges.
        for key in &declared {
            let upstream = nodes
                .get(key)
                .map(|n| n.upstream.clone())
                .unwrap_or_default();

            for dep in upstream {
                match nodes.get_mut(&dep) {
                    Some(dep_node) => dep_node.downstream.push(key.clone()),
                    None => {
                        return Err(GraphError::UnknownDependency {
                            step: key.clone(),
                            dependency: dep,
                        });
                    }
                }
            }
        }

        let order = topological_order(&declared, &nodes)?;

        Ok(Self { nodes, order })
    }

    /// Number of steps in the graph
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, step_key: &str) -> bool {
        self.nodes.contains_key(step_key)
    }

    /// Step keys in topological order
    pub fn step_keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Immediate upstream steps of `step_key`
    pub fn dependencies_of(&self, step_key: &str) -> &[String] {
        self.nodes
            .get(step_key)
            .map(|n| n.upstream.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate downstream steps of `step_key`
    pub fn dependents_of(&self, step_key: &str) -> &[String] {
        self.nodes
            .get(step_key)
            .map(|n| n.downstream.as_slice())
            .unwrap_or(&[])
    }

    /// The seeds plus everything transitively downstream of them.
    ///
    /// Seeds that are not part of the graph are ignored.
    pub fn downstream_closure<'a, I>(&self, seeds: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut selected = BTreeSet::new();
        let mut stack: Vec<&str> = seeds.into_iter().filter(|s| self.contains(s)).collect();

        while let Some(key) = stack.pop() {
            if !selected.insert(key.to_string()) {
                continue;
            }
            stack.extend(self.dependents_of(key).iter().map(String::as_str));
        }

        selected
    }
}

impl TryFrom<Vec<StepDefinition>> for StepGraph {
    type Error = GraphError;

    fn try_from(steps: Vec<StepDefinition>) -> Result<Self, Self::Error> {
        Self::new(steps)
    }
}

impl From<StepGraph> for Vec<StepDefinition> {
    fn from(graph: StepGraph) -> Self {
        let StepGraph { mut nodes, order } = graph;
        order
            .into_iter()
            .map(|key| {
                let upstream = nodes.remove(&key).map(|n| n.upstream).unwrap_or_default();
                StepDefinition { key, upstream }
            })
            .collect()
    }
}

// Depth from the roots, as computed over petgraph's topological sort, with
// declaration order breaking ties so the result is stable.
fn topological_order(
    declared: &[String],
    nodes: &HashMap<String, StepNode>,
) -> Result<Vec<String>, GraphError> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for key in declared {
        graph.add_node(key.as_str());
    }

    // Edge direction: dependency -> dependent
    for key in declared {
        let upstream = nodes.get(key).map(|n| n.upstream.as_slice()).unwrap_or(&[]);
        for dep in upstream {
            graph.add_edge(dep.as_str(), key.as_str(), ());
        }
    }

    let sorted = toposort(&graph, None)
        .map_err(|cycle| GraphError::Cycle(cycle.node_id().to_string()))?;

    let mut depth: HashMap<&str, usize> = HashMap::with_capacity(sorted.len());
    for key in sorted {
        let level = graph
            .neighbors_directed(key, Direction::Incoming)
            .filter_map(|dep| depth.get(dep))
            .map(|d| d + 1)
            .max()
            .unwrap_or(0);
        depth.insert(key, level);
    }

    let mut order: Vec<(usize, usize, &String)> = declared
        .iter()
        .enumerate()
        .map(|(index, key)| (depth.get(key.as_str()).copied().unwrap_or(0), index, key))
        .collect();
    order.sort_by_key(|(level, index, _)| (*level, *index));

    Ok(order.into_iter().map(|(_, _, key)| key.clone()).collect())
}
