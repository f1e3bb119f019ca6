//! Declarative memory.
//!
//! Chunks are slot/value records. Each chunk keeps the times it was
//! presented, which drive its base-level activation. Requests select the
//! retrieval set; activations decide which member of that set is retrieved
//! (or blended).

pub mod chunk;
pub mod declarative;

pub use chunk::{slots, Chunk, Request, SlotValue, Slots};
pub use declarative::{DeclarativeMemory, RetrievalProbabilities};
