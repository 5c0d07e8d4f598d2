//! # Route net model (place/transition net)
//!
//! A deployed data route is modelled as a bipartite directed graph over a
//! place set `P` and a transition set `T`, with an arc set
//! `A ⊆ (P × T) ∪ (T × P)`. A marking `M ∈ ℕ^P` assigns token counts to
//! places. For a transition `t ∈ T` with preset `•t = {p | (p, t) ∈ A}` and
//! postset `t• = {p | (t, p) ∈ A}`:
//!
//! * `t` is **enabled** under `M` iff `∀p ∈ •t: M[p] ≥ 1`;
//! * **firing** `t` yields `M'[p] = M[p] - [p ∈ •t] + [p ∈ t•]`.
//!
//! Counts accumulate freely above one; nothing clamps a marking. Cycles are
//! legal and model repeatable route segments. The topology is immutable once
//! built; markings are small maps layered over it, so exploring a branch
//! copies a map and never the net.
//!
//! ## Example
//!
//! ```rust
//! use routectl::net::PetriNet;
//!
//! let mut net = PetriNet::new("demo");
//! let start = net.add_place("start", 1).unwrap();
//! let done = net.add_place("done", 0).unwrap();
//! let step = net.add_transition("step", None).unwrap();
//! net.add_arc(start, step).unwrap();
//! net.add_arc(step, done).unwrap();
//!
//! let marking = net.initial_marking();
//! assert_eq!(net.enabled_transitions(&marking), vec![step]);
//! let next = net.fire(&marking, step).unwrap();
//! assert_eq!(next.tokens(start), 0);
//! assert_eq!(next.tokens(done), 1);
//! ```

pub mod core;
pub mod ids;
pub mod structure;

pub use self::core::{DiagnosticReport, FireError, InvalidNetError, PetriNet};
pub use ids::{IdVec, Idx, NodeId};
pub use structure::{Arc, ContextKind, Marking, Node, NodeBody, NodeKind, RouteContext, Tokens};
