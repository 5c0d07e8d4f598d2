//! Static structure of a route net: nodes, arcs and markings.
use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::net::ids::NodeId;

pub type Tokens = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Place,
    Transition,
}

/// Which layer of the route a transition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    App,
    Control,
}

/// Metadata attached to a transition by the route translator.
///
/// Predicates inspect it; the simulator never writes to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteContext {
    pub kind: ContextKind,
    pub reads: Option<String>,
    pub writes: Option<String>,
    pub erases: Option<String>,
    pub labels: Vec<String>,
}

impl RouteContext {
    pub fn new(kind: ContextKind) -> Self {
        Self {
            kind,
            reads: None,
            writes: None,
            erases: None,
            labels: Vec::new(),
        }
    }

    pub fn with_reads(mut self, slot: impl Into<String>) -> Self {
        self.reads = Some(slot.into());
        self
    }

    pub fn with_writes(mut self, slot: impl Into<String>) -> Self {
        self.writes = Some(slot.into());
        self
    }

    pub fn with_erases(mut self, slot: impl Into<String>) -> Self {
        self.erases = Some(slot.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeBody {
    Place { tokens: Tokens },
    Transition { context: Option<RouteContext> },
}

/// A node of the bipartite route net.
///
/// `name` is the stable identifier within one net. `Clone` is a deep copy:
/// a cloned node shares no mutable storage with the original.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub body: NodeBody,
}

impl Node {
    pub fn place(name: impl Into<String>, tokens: Tokens) -> Self {
        Self {
            name: name.into(),
            body: NodeBody::Place { tokens },
        }
    }

    pub fn transition(name: impl Into<String>, context: Option<RouteContext>) -> Self {
        Self {
            name: name.into(),
            body: NodeBody::Transition { context },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::Place { .. } => NodeKind::Place,
            NodeBody::Transition { .. } => NodeKind::Transition,
        }
    }

    /// True iff `other` is of the opposite kind. False within a kind, so the
    /// relation is irreflexive and holds exactly across the bipartition.
    pub fn is_complement_of(&self, other: &Node) -> bool {
        self.kind() != other.kind()
    }

    pub fn tokens(&self) -> Option<Tokens> {
        match self.body {
            NodeBody::Place { tokens } => Some(tokens),
            NodeBody::Transition { .. } => None,
        }
    }

    pub fn context(&self) -> Option<&RouteContext> {
        match &self.body {
            NodeBody::Transition { context } => context.as_ref(),
            NodeBody::Place { .. } => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            NodeBody::Place { tokens } => f
                .debug_struct("Place")
                .field("name", &self.name)
                .field("tokens", tokens)
                .finish(),
            NodeBody::Transition { context } => f
                .debug_struct("Transition")
                .field("name", &self.name)
                .field("context", context)
                .finish(),
        }
    }
}

/// A directed arc. Exactly one endpoint is a place, the other a transition;
/// [`crate::net::PetriNet::add_arc`] enforces this at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Arc {
    pub source: NodeId,
    pub target: NodeId,
}

impl Arc {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }
}

/// Token counts per place, in canonical form: zero entries are never stored,
/// so `Eq` and `Hash` coincide with structural marking equality.
///
/// One marking is a small map layered over the shared topology; firing clones
/// the map, never the net.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marking(BTreeMap<NodeId, Tokens>);

impl Marking {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn tokens(&self, place: NodeId) -> Tokens {
        self.0.get(&place).copied().unwrap_or(0)
    }

    pub fn set_tokens(&mut self, place: NodeId, tokens: Tokens) {
        if tokens == 0 {
            self.0.remove(&place);
        } else {
            self.0.insert(place, tokens);
        }
    }

    pub fn add_token(&mut self, place: NodeId) {
        *self.0.entry(place).or_insert(0) += 1;
    }

    /// Removes one token. Callers check enabledness first; an unmarked place
    /// stays at zero.
    pub fn remove_token(&mut self, place: NodeId) {
        match self.0.get_mut(&place) {
            Some(tokens) if *tokens > 1 => *tokens -= 1,
            Some(_) => {
                self.0.remove(&place);
            }
            None => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> Tokens {
        self.0.values().sum()
    }

    /// Places holding at least one token, in id order.
    pub fn marked_places(&self) -> impl Iterator<Item = (NodeId, Tokens)> + '_ {
        self.0.iter().map(|(&place, &tokens)| (place, tokens))
    }

    /// Renders the marking with place names resolved through `resolve`.
    pub fn render(&self, mut resolve: impl FnMut(NodeId) -> String) -> String {
        if self.0.is_empty() {
            return "∅".to_owned();
        }
        self.0
            .iter()
            .map(|(&place, &tokens)| format!("{}:{}", resolve(place), tokens))
            .join(" ")
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (place, tokens) in self.0.iter() {
            map.entry(place, tokens);
        }
        map.finish()
    }
}
