//! Water purification simulator core.
//!
//! Scores a water sample, recommends a filter from a fixed catalog,
//! projects post-filter levels, keeps an append-only run history and
//! assembles a paginated report. `session::SimSession` ties it together.

pub mod charts;
pub mod clock;
pub mod command;
pub mod config;
pub mod contamination_index;
pub mod dataset;
pub mod error;
pub mod event;
pub mod ledger;
pub mod projection;
pub mod recommendation;
pub mod report;
pub mod risk;
pub mod rng;
pub mod sample;
pub mod session;
pub mod stage_sequencer;
pub mod store;
pub mod sync;
pub mod types;
