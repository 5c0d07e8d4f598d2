//! # Step-graph simulation
//!
//! Explores the firing relation of a route net from its initial marking and
//! turns it into material the formula engine can quantify over: the
//! deduplicated step graph ([`StepGraph`]) and the set of maximal simple
//! paths through it ([`all_paths`]).
//!
//! Building a step graph walks a private visited-marking map and is therefore
//! exclusive per net; the built graph and path set are read-only afterwards
//! and safe to share across concurrent formula evaluations.

pub mod paths;
pub mod step_graph;

pub use paths::{PathConfig, PathSet, StepPath, all_paths};
pub use step_graph::{FiringNode, MarkingNode, SimConfig, StepGraph, StepNode, StepStats};
