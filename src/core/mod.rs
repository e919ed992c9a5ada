//! In-memory favorite state and rank helpers.

/// Dense-rank helpers.
pub mod order;
/// Authoritative favorite set and mutation planners.
pub mod set;
