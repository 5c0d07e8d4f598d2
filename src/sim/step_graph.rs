//! Reachability exploration: from one marked net to its step graph.
use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;

use indexmap::IndexMap;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::net::{Marking, NodeId, NodeKind, PetriNet, RouteContext};

/// Exploration budget. The walk over markings is exhaustive and deduplicated,
/// so it terminates on cyclic nets by itself; the limit bounds nets whose
/// marking space is genuinely unbounded (e.g. a transition with no preset).
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub state_limit: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            state_limit: Some(8192),
        }
    }
}

/// Place-kind step-graph node: one distinct reachable marking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkingNode {
    pub marking: Marking,
    pub label: String,
}

impl MarkingNode {
    fn new(marking: Marking, net: &PetriNet) -> Self {
        let label = marking.render(|id| {
            net.node(id)
                .map(|node| node.name.clone())
                .unwrap_or_else(|| format!("n{}", id.raw()))
        });
        Self { marking, label }
    }
}

/// Transition-kind step-graph node: one firing occurrence. Carries its own
/// copy of the route context so predicates over the step graph never reach
/// back into the net.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiringNode {
    pub transition: NodeId,
    pub name: String,
    pub context: Option<RouteContext>,
}

impl FiringNode {
    fn new(net: &PetriNet, transition: NodeId) -> Self {
        let node = net.node(transition);
        Self {
            transition,
            name: node.map(|n| n.name.clone()).unwrap_or_default(),
            context: node.and_then(|n| n.context().cloned()),
        }
    }
}

/// The step graph mirrors the net shape one level up: markings take the role
/// of places, firings the role of transitions, and every edge connects the
/// two kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StepNode {
    Marking(MarkingNode),
    Firing(FiringNode),
}

impl StepNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            StepNode::Marking(_) => NodeKind::Place,
            StepNode::Firing(_) => NodeKind::Transition,
        }
    }

    pub fn as_marking(&self) -> Option<&MarkingNode> {
        match self {
            StepNode::Marking(node) => Some(node),
            StepNode::Firing(_) => None,
        }
    }

    pub fn as_firing(&self) -> Option<&FiringNode> {
        match self {
            StepNode::Firing(node) => Some(node),
            StepNode::Marking(_) => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StepNode::Marking(node) => &node.label,
            StepNode::Firing(node) => &node.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStats {
    pub markings: usize,
    pub firings: usize,
    pub edges: usize,
    pub terminals: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone)]
pub struct StepGraph {
    pub graph: DiGraph<StepNode, ()>,
    pub initial: NodeIndex,
    pub truncated: bool,
    terminals: Vec<NodeIndex>,
    markings: IndexMap<Marking, NodeIndex>,
}

impl StepGraph {
    /// Explores every marking reachable from the net's initial marking.
    /// Each fired transition contributes a `marking → firing → successor`
    /// pair of edges; already-seen markings are reused, never duplicated.
    pub fn build(net: &PetriNet, config: &SimConfig) -> Self {
        let mut graph = DiGraph::new();
        let mut markings: IndexMap<Marking, NodeIndex> = IndexMap::new();
        let mut terminals = Vec::new();
        let mut truncated = false;
        let mut queue = VecDeque::new();

        let initial_marking = net.initial_marking();
        let initial = graph.add_node(StepNode::Marking(MarkingNode::new(
            initial_marking.clone(),
            net,
        )));
        markings.insert(initial_marking, initial);
        queue.push_back(initial);

        while let Some(source) = queue.pop_front() {
            let marking = match &graph[source] {
                StepNode::Marking(node) => node.marking.clone(),
                StepNode::Firing(_) => continue,
            };
            let enabled = net.enabled_transitions(&marking);
            if enabled.is_empty() {
                terminals.push(source);
                continue;
            }
            for transition in enabled {
                let Ok(next) = net.fire(&marking, transition) else {
                    continue;
                };
                let target = match markings.get(&next) {
                    Some(&seen) => seen,
                    None => {
                        if let Some(limit) = config.state_limit {
                            if markings.len() >= limit {
                                truncated = true;
                                continue;
                            }
                        }
                        let fresh = graph.add_node(StepNode::Marking(MarkingNode::new(
                            next.clone(),
                            net,
                        )));
                        markings.insert(next, fresh);
                        queue.push_back(fresh);
                        fresh
                    }
                };
                let firing = graph.add_node(StepNode::Firing(FiringNode::new(net, transition)));
                graph.add_edge(source, firing, ());
                graph.add_edge(firing, target, ());
            }
        }

        if truncated {
            log::warn!(
                "step graph of net {:?} truncated at {} markings",
                net.id(),
                markings.len()
            );
        } else {
            log::debug!(
                "step graph of net {:?}: {} markings, {} terminal",
                net.id(),
                markings.len(),
                terminals.len()
            );
        }

        Self {
            graph,
            initial,
            truncated,
            terminals,
            markings,
        }
    }

    pub fn node(&self, ix: NodeIndex) -> Option<&StepNode> {
        self.graph.node_weight(ix)
    }

    /// One-step successors; empty for an index that is not in the graph.
    pub fn successors(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_weight(ix)
            .is_some()
            .then(|| self.graph.neighbors(ix))
            .into_iter()
            .flatten()
    }

    /// Nodes with no incoming edge. Usually just the initial marking; a cycle
    /// that re-enters the initial marking leaves the graph without roots.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.graph.externals(Direction::Incoming).collect()
    }

    /// Markings under which no transition was enabled.
    pub fn terminals(&self) -> &[NodeIndex] {
        &self.terminals
    }

    pub fn contains_marking(&self, marking: &Marking) -> bool {
        self.markings.contains_key(marking)
    }

    pub fn marking_count(&self) -> usize {
        self.markings.len()
    }

    pub fn stats(&self) -> StepStats {
        StepStats {
            markings: self.markings.len(),
            firings: self.graph.node_count() - self.markings.len(),
            edges: self.graph.edge_count(),
            terminals: self.terminals.len(),
            truncated: self.truncated,
        }
    }

    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(&mut dot, "digraph StepGraph {{");
        let _ = writeln!(&mut dot, "    rankdir=LR;");
        for ix in self.graph.node_indices() {
            let node = &self.graph[ix];
            let shape = match node.kind() {
                NodeKind::Place => "ellipse",
                NodeKind::Transition => "box",
            };
            let _ = writeln!(
                &mut dot,
                "    s{} [label=\"{}\", shape={}];",
                ix.index(),
                node.label().replace('"', "\\\""),
                shape
            );
        }
        for edge in self.graph.edge_indices() {
            if let Some((a, b)) = self.graph.edge_endpoints(edge) {
                let _ = writeln!(&mut dot, "    s{} -> s{};", a.index(), b.index());
            }
        }
        let _ = writeln!(&mut dot, "}}");
        dot
    }
}
