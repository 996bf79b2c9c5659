//! Data model shared by the embedding provider and the ranking engine

use std::fmt;

use serde::{Deserialize, Serialize};

/// Embedding vector
///
/// Every vector produced by one provider has the same length, fixed when the
/// model is loaded.
pub type Vector = Vec<f32>;

/// Caller supplied identifier for an event
///
/// Opaque to the service: it is threaded through ranking and written back
/// exactly as it arrived (a JSON string or a JSON number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{n}"),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId::Text(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        ItemId::Text(value)
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId::Number(value.into())
    }
}

/// An event embedding to score against a reference vector
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: ItemId,
    pub embedding: Vector,
}

impl Candidate {
    pub fn new(id: impl Into<ItemId>, embedding: Vector) -> Self {
        Self {
            id: id.into(),
            embedding,
        }
    }
}

/// A candidate that survived filtering, with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    pub id: ItemId,
    /// Dot product with the reference (cosine similarity for unit vectors)
    pub score: f64,
}

/// Outcome of one ranking call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// Accepted candidates, highest score first
    pub items: Vec<ScoredItem>,
    /// Candidates dropped because their dimension did not match
    /// (only populated under the skip policy)
    pub skipped: Vec<ItemId>,
}

impl Ranking {
    /// Identifiers in rank order, without scores
    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }

    pub fn into_ids(self) -> Vec<ItemId> {
        self.items.into_iter().map(|item| item.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
