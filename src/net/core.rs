//! The route net container: membership, validation, firing.
use std::fmt::{self, Write as FmtWrite};

use indexmap::IndexMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::net::ids::{IdVec, NodeId};
use crate::net::structure::{Arc, Marking, Node, NodeBody, NodeKind, RouteContext, Tokens};

type AdjRow = SmallVec<[NodeId; 4]>;

/// Construction-time validation failures. Raised eagerly so a malformed net
/// from the route translator cannot reach the simulator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidNetError {
    #[error("net {net:?} already contains a node named {name:?}")]
    DuplicateName { net: String, name: String },
    #[error("arc endpoint {0:?} is not a member of this net")]
    UnknownNode(NodeId),
    #[error("arc {source_name:?} -> {target:?} connects two {kind:?} nodes")]
    SameKindArc {
        source_name: String,
        target: String,
        kind: NodeKind,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FireError {
    #[error("node {0:?} is out of bounds")]
    OutOfBounds(NodeId),
    #[error("node {0:?} is a place and cannot fire")]
    NotATransition(NodeId),
    #[error("transition {0:?} is not enabled under the supplied marking")]
    NotEnabled(NodeId),
}

/// An immutable-after-construction bipartite net describing one deployed
/// route. Arcs are a set: re-adding an existing arc is a no-op.
#[derive(Debug, Clone)]
pub struct PetriNet {
    id: String,
    nodes: IdVec<NodeId, Node>,
    by_name: IndexMap<String, NodeId>,
    arcs: Vec<Arc>,
    succ: IdVec<NodeId, AdjRow>,
    pred: IdVec<NodeId, AdjRow>,
}

impl PetriNet {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: IdVec::new(),
            by_name: IndexMap::new(),
            arcs: Vec::new(),
            succ: IdVec::new(),
            pred: IdVec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_place(
        &mut self,
        name: impl Into<String>,
        tokens: Tokens,
    ) -> Result<NodeId, InvalidNetError> {
        self.add_node(Node::place(name, tokens))
    }

    pub fn add_transition(
        &mut self,
        name: impl Into<String>,
        context: Option<RouteContext>,
    ) -> Result<NodeId, InvalidNetError> {
        self.add_node(Node::transition(name, context))
    }

    pub fn add_node(&mut self, node: Node) -> Result<NodeId, InvalidNetError> {
        if self.by_name.contains_key(&node.name) {
            return Err(InvalidNetError::DuplicateName {
                net: self.id.clone(),
                name: node.name.clone(),
            });
        }
        let name = node.name.clone();
        let id = self.nodes.push(node);
        self.by_name.insert(name, id);
        self.succ.push(AdjRow::new());
        self.pred.push(AdjRow::new());
        Ok(id)
    }

    /// Adds the arc `source -> target` after checking membership and
    /// bipartiteness.
    pub fn add_arc(&mut self, source: NodeId, target: NodeId) -> Result<(), InvalidNetError> {
        let src = self
            .nodes
            .get(source)
            .ok_or(InvalidNetError::UnknownNode(source))?;
        let dst = self
            .nodes
            .get(target)
            .ok_or(InvalidNetError::UnknownNode(target))?;
        if !src.is_complement_of(dst) {
            return Err(InvalidNetError::SameKindArc {
                source_name: src.name.clone(),
                target: dst.name.clone(),
                kind: src.kind(),
            });
        }
        let arc = Arc::new(source, target);
        if self.arcs.contains(&arc) {
            return Ok(());
        }
        self.arcs.push(arc);
        self.succ[source].push(target);
        self.pred[target].push(source);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter_enumerated()
    }

    pub fn places(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes()
            .filter(|(_, node)| node.kind() == NodeKind::Place)
    }

    pub fn transitions(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes()
            .filter(|(_, node)| node.kind() == NodeKind::Transition)
    }

    pub fn nodes_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        self.succ.get(id).map_or(&[], |row| row.as_slice())
    }

    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        self.pred.get(id).map_or(&[], |row| row.as_slice())
    }

    /// The marking the route translator authored: token counts as stored on
    /// the place nodes.
    pub fn initial_marking(&self) -> Marking {
        let mut marking = Marking::new();
        for (id, node) in self.places() {
            if let Some(tokens) = node.tokens() {
                marking.set_tokens(id, tokens);
            }
        }
        marking
    }

    /// A transition is enabled iff every input place holds at least one
    /// token. A transition with no input places is always enabled.
    pub fn is_enabled(&self, marking: &Marking, transition: NodeId) -> bool {
        match self.nodes.get(transition) {
            Some(node) if node.kind() == NodeKind::Transition => self
                .predecessors(transition)
                .iter()
                .all(|&place| marking.tokens(place) >= 1),
            _ => false,
        }
    }

    pub fn enabled_transitions(&self, marking: &Marking) -> Vec<NodeId> {
        self.transitions()
            .filter(|&(id, _)| self.is_enabled(marking, id))
            .map(|(id, _)| id)
            .collect()
    }

    /// Fires an enabled transition: one token leaves every input place, one
    /// token arrives at every output place. Counts accumulate freely above
    /// one; they are never clamped.
    pub fn fire(&self, marking: &Marking, transition: NodeId) -> Result<Marking, FireError> {
        let node = self
            .nodes
            .get(transition)
            .ok_or(FireError::OutOfBounds(transition))?;
        if node.kind() != NodeKind::Transition {
            return Err(FireError::NotATransition(transition));
        }
        if !self.is_enabled(marking, transition) {
            return Err(FireError::NotEnabled(transition));
        }

        let mut next = marking.clone();
        for &place in self.predecessors(transition) {
            next.remove_token(place);
        }
        for &place in self.successors(transition) {
            next.add_token(place);
        }
        Ok(next)
    }

    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(&mut dot, "digraph RouteNet {{");
        let _ = writeln!(&mut dot, "    rankdir=LR;");
        let _ = writeln!(&mut dot, "    node [fontname=\"Helvetica\"];");

        for (id, node) in self.nodes() {
            let node_id = format!("n{}", id.raw());
            match &node.body {
                NodeBody::Place { tokens } => {
                    let _ = writeln!(
                        &mut dot,
                        "    {} [label=\"{}\\n{}\", shape=circle];",
                        node_id,
                        escape_label(&node.name),
                        tokens
                    );
                }
                NodeBody::Transition { .. } => {
                    let _ = writeln!(
                        &mut dot,
                        "    {} [label=\"{}\", shape=box];",
                        node_id,
                        escape_label(&node.name)
                    );
                }
            }
        }
        for arc in &self.arcs {
            let _ = writeln!(&mut dot, "    n{} -> n{};", arc.source.raw(), arc.target.raw());
        }
        let _ = writeln!(&mut dot, "}}");
        dot
    }

    /// Structural sanity report over the translated route.
    pub fn diagnose(&self) -> DiagnosticReport {
        let mut report = DiagnosticReport {
            isolated_nodes: Vec::new(),
            warnings: Vec::new(),
            total_places: self.places().count(),
            total_transitions: self.transitions().count(),
        };

        for (id, node) in self.nodes() {
            let has_input = !self.predecessors(id).is_empty();
            let has_output = !self.successors(id).is_empty();

            if !has_input && !has_output {
                report.isolated_nodes.push(node.name.clone());
                continue;
            }
            match node.kind() {
                NodeKind::Place => {
                    if !has_input && node.tokens() == Some(0) {
                        report.warnings.push(format!(
                            "place {:?} has no input arc and no initial token; it can never be marked",
                            node.name
                        ));
                    }
                }
                NodeKind::Transition => {
                    if !has_input {
                        report.warnings.push(format!(
                            "transition {:?} has no input place; it is enabled in every marking",
                            node.name
                        ));
                    }
                    if !has_output {
                        report.warnings.push(format!(
                            "transition {:?} has no output place; its tokens vanish",
                            node.name
                        ));
                    }
                }
            }
        }
        report
    }

    pub fn log_diagnostics(&self) {
        let report = self.diagnose();
        if !report.has_issues() {
            log::debug!(
                "net {:?}: {} places, {} transitions, no structural issues",
                self.id,
                report.total_places,
                report.total_transitions
            );
            return;
        }
        for name in &report.isolated_nodes {
            log::warn!("net {:?}: node {:?} has no arcs", self.id, name);
        }
        for warning in &report.warnings {
            log::warn!("net {:?}: {}", self.id, warning);
        }
    }

    fn arc_names(&self) -> Vec<(&str, &str)> {
        self.arcs
            .iter()
            .map(|arc| {
                (
                    self.nodes[arc.source].name.as_str(),
                    self.nodes[arc.target].name.as_str(),
                )
            })
            .collect()
    }
}

/// Equality up to node ids: same net id, name-and-state-equal nodes, and the
/// same arc set under name translation. Intended for tests and snapshots.
impl PartialEq for PetriNet {
    fn eq(&self, other: &Self) -> bool {
        if self.id != other.id || self.nodes.len() != other.nodes.len() {
            return false;
        }
        for (_, node) in self.nodes() {
            match other.node_id(&node.name).and_then(|id| other.node(id)) {
                Some(counterpart) if counterpart == node => {}
                _ => return false,
            }
        }
        let mut left = self.arc_names();
        let mut right = other.arc_names();
        left.sort_unstable();
        right.sort_unstable();
        left == right
    }
}

impl Eq for PetriNet {}

#[derive(Debug, Clone, Default)]
pub struct DiagnosticReport {
    pub isolated_nodes: Vec<String>,
    pub warnings: Vec<String>,
    pub total_places: usize,
    pub total_transitions: usize,
}

impl DiagnosticReport {
    pub fn has_issues(&self) -> bool {
        !self.isolated_nodes.is_empty() || !self.warnings.is_empty()
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} places, {} transitions",
            self.total_places, self.total_transitions
        )?;
        for name in &self.isolated_nodes {
            writeln!(f, "isolated: {}", name)?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {}", warning)?;
        }
        Ok(())
    }
}

fn escape_label(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
