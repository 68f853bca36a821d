//! Event ingestion for account interventions.
//!
//! # Overview
//!
//! Wires the pure transition engine from `ais-core` to a storage
//! collaborator from `ais-store`. The [`EventProcessor`] takes one queue
//! message at a time, applies the guard rails (recognized event, timestamp
//! not in the future, account not deleted, event not stale), resolves the
//! transition, and hands the resulting mutation to the store's conditional
//! write. A conflicting write triggers exactly one re-read and re-resolve.
//!
//! [`StatusProjection`] is the read side: the externally visible status
//! derived from a stored record.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod processor;
mod status;

pub use error::*;
pub use processor::*;
pub use status::*;
