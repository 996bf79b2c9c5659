//! Core types for the event matching service
//!
//! This crate defines the data model shared by the embedding provider and the
//! similarity ranking engine, plus the error taxonomy every component maps
//! its failures into before they reach a caller.

pub mod error;
pub mod types;

pub use error::{ErrorKind, MatchError, MatchResult};
pub use types::{Candidate, ItemId, Ranking, ScoredItem, Vector};
