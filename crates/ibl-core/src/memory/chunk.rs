//! Chunks, slot values, and retrieval requests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value stored in a chunk slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotValue {
    Number(f64),
    Text(String),
}

impl SlotValue {
    /// Numeric value, if this slot holds a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SlotValue::Number(n) => Some(*n),
            SlotValue::Text(_) => None,
        }
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Number(n) => write!(f, "{}", n),
            SlotValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for SlotValue {
    fn from(n: f64) -> Self {
        SlotValue::Number(n)
    }
}

impl From<&str> for SlotValue {
    fn from(s: &str) -> Self {
        SlotValue::Text(s.to_string())
    }
}

impl From<String> for SlotValue {
    fn from(s: String) -> Self {
        SlotValue::Text(s)
    }
}

/// Slot name to value mapping.
pub type Slots = BTreeMap<String, SlotValue>;

/// Build a [`Slots`] map from `(name, value)` pairs.
pub fn slots<I, K, V>(pairs: I) -> Slots
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<SlotValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A declarative memory record and its presentation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in its memory.
    pub id: usize,
    pub slots: Slots,
    /// Presentation times in seconds on the simulation clock.
    pub presentations: Vec<f64>,
}

impl Chunk {
    pub fn new(id: usize, slots: Slots) -> Self {
        Self {
            id,
            slots,
            presentations: Vec::new(),
        }
    }

    pub fn slot(&self, name: &str) -> Option<&SlotValue> {
        self.slots.get(name)
    }

    /// Whether every constraint in `request` is satisfied by this chunk.
    pub fn matches(&self, request: &Request) -> bool {
        request
            .constraints
            .iter()
            .all(|(name, value)| self.slots.get(name) == Some(value))
    }
}

/// A retrieval request: slot constraints a chunk must satisfy.
///
/// The empty request matches every chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Request {
    pub constraints: Slots,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SlotValue>) -> Self {
        self.constraints.insert(name.into(), value.into());
        self
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .constraints
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
