//! Branching-time formula trees over step-graph nodes.
//!
//! The boolean skeleton is generic: [`Ctl`] carries the connectives and the
//! path operators once, and the two mirrored families instantiate it with
//! their atom type and with each other as the kind-flipping modal target.
use std::fmt;
use std::sync::Arc;

use crate::net::{ContextKind, Marking, NodeId};
use crate::sim::step_graph::{FiringNode, StepNode};

/// An atomic proposition: a caller predicate over one step-graph node plus a
/// label surfaced in renderings.
///
/// Atoms are self-guarding: a node of the wrong kind (or an absent node)
/// makes the atom false rather than an error.
pub trait Proposition {
    fn holds(&self, node: &StepNode) -> bool;
    fn label(&self) -> &str;
}

/// Predicate over a marking (place-kind step node).
#[derive(Clone)]
pub struct NodeExpression {
    label: String,
    pred: Arc<dyn Fn(&Marking) -> bool + Send + Sync>,
}

impl NodeExpression {
    pub fn new(
        label: impl Into<String>,
        pred: impl Fn(&Marking) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            pred: Arc::new(pred),
        }
    }

    /// The place holds at least one token.
    pub fn place_marked(name: impl Into<String>, place: NodeId) -> Self {
        Self::new(format!("marked({})", name.into()), move |marking| {
            marking.tokens(place) >= 1
        })
    }

    /// Every token in the marking sits on the given place.
    pub fn only_place_marked(name: impl Into<String>, place: NodeId) -> Self {
        Self::new(format!("only({})", name.into()), move |marking| {
            !marking.is_empty() && marking.marked_places().all(|(p, _)| p == place)
        })
    }
}

impl Proposition for NodeExpression {
    fn holds(&self, node: &StepNode) -> bool {
        node.as_marking()
            .map(|m| (self.pred)(&m.marking))
            .unwrap_or(false)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for NodeExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeExpression").field(&self.label).finish()
    }
}

/// Predicate over a firing occurrence (transition-kind step node).
#[derive(Clone)]
pub struct ArcExpression {
    label: String,
    pred: Arc<dyn Fn(&FiringNode) -> bool + Send + Sync>,
}

impl ArcExpression {
    pub fn new(
        label: impl Into<String>,
        pred: impl Fn(&FiringNode) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            pred: Arc::new(pred),
        }
    }

    /// The firing belongs to the transition with this name.
    pub fn fired(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(format!("fired({})", name), move |firing| firing.name == name)
    }

    pub fn writes_slot(slot: impl Into<String>) -> Self {
        let slot = slot.into();
        Self::new(format!("writes({})", slot), move |firing| {
            firing
                .context
                .as_ref()
                .is_some_and(|cx| cx.writes.as_deref() == Some(slot.as_str()))
        })
    }

    pub fn reads_slot(slot: impl Into<String>) -> Self {
        let slot = slot.into();
        Self::new(format!("reads({})", slot), move |firing| {
            firing
                .context
                .as_ref()
                .is_some_and(|cx| cx.reads.as_deref() == Some(slot.as_str()))
        })
    }

    pub fn erases_slot(slot: impl Into<String>) -> Self {
        let slot = slot.into();
        Self::new(format!("erases({})", slot), move |firing| {
            firing
                .context
                .as_ref()
                .is_some_and(|cx| cx.erases.as_deref() == Some(slot.as_str()))
        })
    }

    pub fn has_label(label: impl Into<String>) -> Self {
        let label = label.into();
        Self::new(format!("label({})", label), move |firing| {
            firing
                .context
                .as_ref()
                .is_some_and(|cx| cx.labels.iter().any(|l| l == &label))
        })
    }

    pub fn kind_is(kind: ContextKind) -> Self {
        Self::new(format!("kind({:?})", kind), move |firing| {
            firing.context.as_ref().is_some_and(|cx| cx.kind == kind)
        })
    }
}

impl Proposition for ArcExpression {
    fn holds(&self, node: &StepNode) -> bool {
        node.as_firing().map(|f| (self.pred)(f)).unwrap_or(false)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for ArcExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArcExpression").field(&self.label).finish()
    }
}

/// The shared formula skeleton. `A` is the family's atom type, `M` the
/// mirrored family reached through the modal operators.
#[derive(Clone)]
pub enum Ctl<A, M> {
    True,
    False,
    Not(Box<Ctl<A, M>>),
    And(Box<Ctl<A, M>>, Box<Ctl<A, M>>),
    Or(Box<Ctl<A, M>>, Box<Ctl<A, M>>),
    /// Rejects an absent node, then delegates. The only null filter.
    Guard(Box<Ctl<A, M>>),
    Atom(A),
    /// Some one-arc successor satisfies the mirrored formula.
    Modal(Box<M>),
    /// Some path-realized successor satisfies the mirrored formula.
    ExistModal(Box<M>),
    /// Every path-realized successor satisfies the mirrored formula.
    ForallModal(Box<M>),
    ExistNext(Box<Ctl<A, M>>),
    ForallNext(Box<Ctl<A, M>>),
    ExistUntil(Box<Ctl<A, M>>, Box<Ctl<A, M>>),
    ForallUntil(Box<Ctl<A, M>>, Box<Ctl<A, M>>),
}

impl<A: Proposition, M> Ctl<A, M> {
    /// Operator tag, or the atom's label. Stable across renderings; meant for
    /// terse log lines.
    pub fn symbol(&self) -> &str {
        match self {
            Ctl::True => "T",
            Ctl::False => "⊥",
            Ctl::Not(_) => "¬",
            Ctl::And(..) => "∧",
            Ctl::Or(..) => "∨",
            Ctl::Guard(_) => "guard",
            Ctl::Atom(atom) => atom.label(),
            Ctl::Modal(_) => "⟨⟩",
            Ctl::ExistModal(_) => "E⟨⟩",
            Ctl::ForallModal(_) => "A⟨⟩",
            Ctl::ExistNext(_) => "EX",
            Ctl::ForallNext(_) => "AX",
            Ctl::ExistUntil(..) => "EU",
            Ctl::ForallUntil(..) => "AU",
        }
    }
}

impl<A: Proposition, M: fmt::Display> fmt::Display for Ctl<A, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ctl::True => write!(f, "T"),
            Ctl::False => write!(f, "⊥"),
            Ctl::Not(inner) => write!(f, "¬{}", inner),
            Ctl::And(a, b) => write!(f, "({} ∧ {})", a, b),
            Ctl::Or(a, b) => write!(f, "({} ∨ {})", a, b),
            Ctl::Guard(inner) => write!(f, "guard({})", inner),
            Ctl::Atom(atom) => write!(f, "{}", atom.label()),
            Ctl::Modal(inner) => write!(f, "⟨{}⟩", inner),
            Ctl::ExistModal(inner) => write!(f, "E⟨{}⟩", inner),
            Ctl::ForallModal(inner) => write!(f, "A⟨{}⟩", inner),
            Ctl::ExistNext(inner) => write!(f, "EX {}", inner),
            Ctl::ForallNext(inner) => write!(f, "AX {}", inner),
            Ctl::ExistUntil(a, b) => write!(f, "E({} U {})", a, b),
            Ctl::ForallUntil(a, b) => write!(f, "A({} U {})", a, b),
        }
    }
}

macro_rules! formula_family {
    ($family:ident, $atom:ty, $mirror:ty) => {
        impl $family {
            pub fn tt() -> Self {
                Self(Ctl::True)
            }

            pub fn ff() -> Self {
                Self(Ctl::False)
            }

            pub fn atom(expr: $atom) -> Self {
                Self(Ctl::Atom(expr))
            }

            pub fn not(self) -> Self {
                Self(Ctl::Not(Box::new(self.0)))
            }

            pub fn and(self, other: Self) -> Self {
                Self(Ctl::And(Box::new(self.0), Box::new(other.0)))
            }

            pub fn or(self, other: Self) -> Self {
                Self(Ctl::Or(Box::new(self.0), Box::new(other.0)))
            }

            pub fn guarded(self) -> Self {
                Self(Ctl::Guard(Box::new(self.0)))
            }

            pub fn modal(inner: $mirror) -> Self {
                Self(Ctl::Modal(Box::new(inner)))
            }

            pub fn exist_modal(inner: $mirror) -> Self {
                Self(Ctl::ExistModal(Box::new(inner)))
            }

            pub fn forall_modal(inner: $mirror) -> Self {
                Self(Ctl::ForallModal(Box::new(inner)))
            }

            pub fn exist_next(self) -> Self {
                Self(Ctl::ExistNext(Box::new(self.0)))
            }

            pub fn forall_next(self) -> Self {
                Self(Ctl::ForallNext(Box::new(self.0)))
            }

            pub fn exist_until(hold: Self, until: Self) -> Self {
                Self(Ctl::ExistUntil(Box::new(hold.0), Box::new(until.0)))
            }

            pub fn forall_until(hold: Self, until: Self) -> Self {
                Self(Ctl::ForallUntil(Box::new(hold.0), Box::new(until.0)))
            }

            pub fn symbol(&self) -> &str {
                self.0.symbol()
            }
        }

        impl fmt::Display for $family {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $family {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($family), self)
            }
        }
    };
}

/// Formulas over place-kind nodes (markings).
#[derive(Clone)]
pub struct StateFormula(pub Ctl<NodeExpression, TransitionFormula>);

/// Formulas over transition-kind nodes (firings).
#[derive(Clone)]
pub struct TransitionFormula(pub Ctl<ArcExpression, StateFormula>);

formula_family!(StateFormula, NodeExpression, TransitionFormula);
formula_family!(TransitionFormula, ArcExpression, StateFormula);

/// A formula of either family, tagged with the node kind it applies to.
#[derive(Debug, Clone)]
pub enum Formula {
    State(StateFormula),
    Transition(TransitionFormula),
}

impl Formula {
    pub fn symbol(&self) -> &str {
        match self {
            Formula::State(f) => f.symbol(),
            Formula::Transition(f) => f.symbol(),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::State(inner) => fmt::Display::fmt(inner, f),
            Formula::Transition(inner) => fmt::Display::fmt(inner, f),
        }
    }
}
