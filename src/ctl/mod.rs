//! # Branching-time formula engine
//!
//! Two structurally mirrored formula families share one generic skeleton:
//! [`StateFormula`] speaks about place-kind step-graph nodes (markings),
//! [`TransitionFormula`] about transition-kind nodes (firings), and the
//! modal operators cross between them. [`CtlEvaluator`] is the single
//! dispatch point; a formula applied to the wrong node kind is `false`,
//! never an error.
//!
//! Evaluation is a pure recursive tree walk; no state beyond the supplied
//! step graph and path set is read or written.

pub mod eval;
pub mod formula;

pub use eval::{CtlEvaluator, EvalCx, Evaluate};
pub use formula::{
    ArcExpression, Ctl, Formula, NodeExpression, Proposition, StateFormula, TransitionFormula,
};
