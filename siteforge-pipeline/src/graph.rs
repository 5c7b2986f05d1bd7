//! The step DAG.
//!
//! Edges point from a step to the steps that must wait for it. A graph is
//! only executed after [`TaskGraph::validate`] has checked that it is acyclic
//! and that no two unordered steps write the same build resource.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::algo::{has_path_connecting, kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::PipelineError;
use crate::step::{Resource, Step};

#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    graph: DiGraph<Step, ()>,
    nodes: HashMap<Step, NodeIndex>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph where every step of a stage depends on every step of the
    /// previous stage. Steps inside one stage are unordered.
    pub fn from_stages(stages: &[Vec<Step>]) -> Self {
        let mut graph = Self::new();
        let mut previous: Vec<Step> = Vec::new();
        for stage in stages {
            for &step in stage {
                graph.add_step(step);
                for &before in &previous {
                    graph.add_dependency(before, step);
                }
            }
            if !stage.is_empty() {
                previous = stage.clone();
            }
        }
        graph
    }

    /// Add a step. Adding the same step twice returns the existing node.
    pub fn add_step(&mut self, step: Step) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&step) {
            return idx;
        }
        let idx = self.graph.add_node(step);
        self.nodes.insert(step, idx);
        idx
    }

    /// `after` starts only once `before` has completed.
    pub fn add_dependency(&mut self, before: Step, after: Step) {
        let from = self.add_step(before);
        let to = self.add_step(after);
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Reject cycles, then reject concurrent writers of one resource.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for scc in kosaraju_scc(&self.graph) {
            if scc.len() > 1 {
                return Err(PipelineError::Cycle(self.graph[scc[0]]));
            }
        }
        if let Err(cycle) = toposort(&self.graph, None) {
            return Err(PipelineError::Cycle(self.graph[cycle.node_id()]));
        }

        let steps = self.steps()?;
        for (i, &first) in steps.iter().enumerate() {
            let first_writes: BTreeSet<Resource> = first.writes().into_iter().collect();
            for &second in &steps[i + 1..] {
                if self.ordered(first, second) {
                    continue;
                }
                let shared = second
                    .writes()
                    .into_iter()
                    .filter(|r| !r.allows_concurrent_writers())
                    .find(|r| first_writes.contains(r));
                if let Some(resource) = shared {
                    return Err(PipelineError::WriteConflict {
                        first,
                        second,
                        resource: resource.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Steps in a dependency-respecting order.
    pub fn steps(&self) -> Result<Vec<Step>, PipelineError> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|idx| self.graph[idx]).collect())
            .map_err(|cycle| PipelineError::Cycle(self.graph[cycle.node_id()]))
    }

    /// Direct predecessors of `step`.
    pub fn dependencies(&self, step: Step) -> Vec<Step> {
        self.neighbors(step, Direction::Incoming)
    }

    /// Direct successors of `step`.
    pub fn dependents(&self, step: Step) -> Vec<Step> {
        self.neighbors(step, Direction::Outgoing)
    }

    /// Every step that must complete before `step`, nearest first.
    pub fn ancestors(&self, step: Step) -> Vec<Step> {
        let Some(&start) = self.nodes.get(&step) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(idx) = queue.pop_front() {
            for pred in self.graph.neighbors_directed(idx, Direction::Incoming) {
                if seen.insert(pred) {
                    out.push(self.graph[pred]);
                    queue.push_back(pred);
                }
            }
        }
        out
    }

    fn neighbors(&self, step: Step, dir: Direction) -> Vec<Step> {
        let Some(&idx) = self.nodes.get(&step) else {
            return Vec::new();
        };
        let mut out: Vec<Step> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n])
            .collect();
        out.sort();
        out
    }

    /// One of the two steps must finish before the other starts.
    fn ordered(&self, a: Step, b: Step) -> bool {
        let (ia, ib) = (self.nodes[&a], self.nodes[&b]);
        has_path_connecting(&self.graph, ia, ib, None) || has_path_connecting(&self.graph, ib, ia, None)
    }
}
