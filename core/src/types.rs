//! Shared primitive types used across the purification pipeline.

/// Sequence number of a completed run within one session, starting at 1.
pub type RunNumber = u64;

/// The canonical session identifier.
pub type SessionId = String;

/// A percentage in [0, 100].
pub type Percent = f64;
