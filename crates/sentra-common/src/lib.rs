//! Shared value types for the sentra alert evaluation engine.
//!
//! Everything here is a plain, serializable value object: the engine creates
//! these fresh on every evaluation cycle and the embedding scheduler/notifier
//! consumes them once and discards them.

pub mod types;
