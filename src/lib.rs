//! # routectl
//!
//! Structural verification of deployed data routes. A route is modelled as a
//! marked Petri net ([`net`]), its behavior unfolded into a deduplicated
//! reachability step graph with enumerated paths ([`sim`]), and
//! branching-time properties ("does every token eventually reach the
//! sink?", "is no branch a dead end?") evaluated over that material
//! ([`ctl`]). [`verify::verify`] ties the three together and returns a
//! boolean verdict plus diagnostic text.
//!
//! Route translation from external descriptions and property-selection
//! policy live in collaborating components; this crate starts at a validated
//! [`net::PetriNet`] and a [`ctl::Formula`].

pub mod ctl;
pub mod net;
pub mod sim;
pub mod verify;

#[cfg(test)]
mod testutil;

pub use verify::{Verdict, VerifyConfig, verify};
