//! AIS Core - the account intervention state-transition engine.
//!
//! This crate decides, for an incoming fraud/identity event and an account's
//! current restriction flags, the one legal next state, and produces the
//! persistence-agnostic mutation that moves the account there.
//!
//! # Components
//!
//! - **Policy graph**: immutable, validated description of legal account
//!   states and the events that move between them ([`PolicyGraph`])
//! - **Transition resolver**: pure lookup of the one matching outgoing edge
//!   ([`StateEngine::resolve`])
//! - **Mutation builder**: turns a resolved transition into field
//!   assignments, removals and an optional audit append
//!   ([`build_mutation`])
//! - **History encoder**: fixed-shape audit-trail record serialization
//!   ([`encode_history_entry`] / [`HistoryEntry::decode`])
//!
//! # Key Invariants
//!
//! - The flag-tuple ↔ node-name mapping in a graph is a bijection
//! - A graph that fails validation can never resolve a transition
//! - A transition that changes nothing is never valid
//! - Every fraud-driven intervention appends exactly one history entry;
//!   user-led completions append none
//!
//! The engine is purely functional over its immutable graph: no I/O, no
//! hidden state, safe to call concurrently without synchronization.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod engine;
mod error;
mod event;
mod graph;
mod history;
pub mod metrics;
mod mutation;
mod state;

pub use engine::*;
pub use error::*;
pub use event::*;
pub use graph::*;
pub use history::*;
pub use mutation::*;
pub use state::*;
