// src/dag/graph.rs

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

/// Dependency graph of one job's operations.
///
/// Node `i` is operation index `i` of the owning job; an edge `a -> b` means
/// `a` must complete before `b` can start. Acyclicity is checked when a
/// workload is validated (or asserted by whoever builds a job by hand), so
/// here we only answer adjacency questions.
#[derive(Debug, Clone)]
pub struct JobDag {
    graph: DiGraph<(), ()>,
}

impl JobDag {
    /// Build a DAG over `num_ops` operations from `(from, to)` edges.
    pub fn new(num_ops: usize, edges: &[(usize, usize)]) -> Self {
        let mut graph = DiGraph::with_capacity(num_ops, edges.len());
        for _ in 0..num_ops {
            graph.add_node(());
        }
        for &(from, to) in edges {
            assert!(
                from < num_ops && to < num_ops,
                "edge {from} -> {to} references an operation outside 0..{num_ops}"
            );
            graph.update_edge(NodeIndex::new(from), NodeIndex::new(to), ());
        }
        Self { graph }
    }

    /// Build from per-operation predecessor lists (`deps[i]` = ops that `i`
    /// waits for).
    pub fn from_dependencies(deps: &[Vec<usize>]) -> Self {
        let edges: Vec<(usize, usize)> = deps
            .iter()
            .enumerate()
            .flat_map(|(op, preds)| preds.iter().map(move |&p| (p, op)))
            .collect();
        Self::new(deps.len(), &edges)
    }

    pub fn num_ops(&self) -> usize {
        self.graph.node_count()
    }

    /// Immediate predecessors of `op`, in ascending index order.
    pub fn predecessors(&self, op: usize) -> Vec<usize> {
        self.neighbors(op, Direction::Incoming)
    }

    /// Immediate successors of `op`, in ascending index order.
    pub fn successors(&self, op: usize) -> Vec<usize> {
        self.neighbors(op, Direction::Outgoing)
    }

    /// Operations with no predecessors.
    pub fn sources(&self) -> Vec<usize> {
        (0..self.num_ops())
            .filter(|&op| {
                self.graph
                    .neighbors_directed(NodeIndex::new(op), Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect()
    }

    fn neighbors(&self, op: usize, dir: Direction) -> Vec<usize> {
        // petgraph yields neighbours in reverse insertion order; sort so that
        // frontier updates do not depend on how the edges were listed.
        let mut out: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(op), dir)
            .map(|n| n.index())
            .collect();
        out.sort_unstable();
        out
    }
}
