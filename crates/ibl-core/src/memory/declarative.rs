//! Declarative memory: a store of chunks with presentation histories.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::chunk::{Chunk, Request, Slots};
use crate::activation::{activation_noise, base_level_activation, ActivationConfig};
use crate::choice::softmax;
use crate::error::{IblError, IblResult};

/// Probabilities of each matching chunk being retrieved, and of failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalProbabilities {
    /// `(chunk id, probability)` for every chunk matching the request.
    pub chunks: Vec<(usize, f64)>,
    /// Probability that no chunk exceeds the retrieval threshold.
    pub failure: f64,
}

/// A store of chunks.
///
/// Adding a chunk whose slots equal an existing chunk merges the two by
/// recording a new presentation of the existing one. A chunk's id is its
/// position in the store; deserialization rejects stores that break this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MemoryParams")]
pub struct DeclarativeMemory {
    chunks: Vec<Chunk>,
}

#[derive(Deserialize)]
struct MemoryParams {
    chunks: Vec<Chunk>,
}

impl TryFrom<MemoryParams> for DeclarativeMemory {
    type Error = IblError;

    fn try_from(params: MemoryParams) -> IblResult<Self> {
        for (position, chunk) in params.chunks.iter().enumerate() {
            if chunk.id != position {
                return Err(IblError::validation(format!(
                    "chunk at position {} has id {}",
                    position, chunk.id
                )));
            }
        }
        Ok(Self {
            chunks: params.chunks,
        })
    }
}

impl DeclarativeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Present `slots` at `time`, creating the chunk if needed.
    ///
    /// Returns the chunk id.
    pub fn add(&mut self, slots: Slots, time: f64) -> usize {
        if let Some(chunk) = self.chunks.iter_mut().find(|c| c.slots == slots) {
            chunk.presentations.push(time);
            trace!(chunk = chunk.id, time, "merged presentation");
            return chunk.id;
        }
        let id = self.chunks.len();
        let mut chunk = Chunk::new(id, slots);
        chunk.presentations.push(time);
        self.chunks.push(chunk);
        trace!(chunk = id, time, "new chunk");
        id
    }

    /// Record a presentation of an existing chunk.
    pub fn present(&mut self, id: usize, time: f64) -> IblResult<()> {
        let len = self.chunks.len();
        let chunk = self
            .chunks
            .get_mut(id)
            .ok_or_else(|| IblError::index_out_of_range("chunk", id, len))?;
        chunk.presentations.push(time);
        Ok(())
    }

    pub fn get(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunks matching `request`, in id order.
    pub fn matching<'a>(&'a self, request: &'a Request) -> impl Iterator<Item = &'a Chunk> + 'a {
        self.chunks.iter().filter(move |c| c.matches(request))
    }

    fn chunk(&self, id: usize) -> IblResult<&Chunk> {
        self.chunks
            .get(id)
            .ok_or_else(|| IblError::index_out_of_range("chunk", id, self.chunks.len()))
    }

    /// Noise-free activation of chunk `id` at `now`.
    pub fn activation(&self, id: usize, now: f64, config: &ActivationConfig) -> IblResult<f64> {
        let chunk = self.chunk(id)?;
        Ok(base_level_activation(&chunk.presentations, now, config))
    }

    /// Activation of chunk `id` at `now` with one draw of logistic noise.
    pub fn noisy_activation<R: Rng + ?Sized>(
        &self,
        id: usize,
        now: f64,
        config: &ActivationConfig,
        rng: &mut R,
    ) -> IblResult<f64> {
        Ok(self.activation(id, now, config)? + activation_noise(rng, config))
    }

    /// ACT-R retrieval probabilities for `request` at `now`.
    ///
    /// ```text
    /// P_i = exp(A_i / t) / (exp(tau / t) + sum_j exp(A_j / t)),  t = s * sqrt(2)
    /// ```
    pub fn retrieval_probabilities(
        &self,
        request: &Request,
        now: f64,
        config: &ActivationConfig,
    ) -> IblResult<RetrievalProbabilities> {
        let ids: Vec<usize> = self.matching(request).map(|c| c.id).collect();
        let mut values = Vec::with_capacity(ids.len() + 1);
        for &id in &ids {
            values.push(self.activation(id, now, config)?);
        }
        values.push(config.retrieval_threshold);

        let mut probs = softmax(&values, config.blending_temperature())?;
        let failure = probs.pop().unwrap_or(1.0);
        Ok(RetrievalProbabilities {
            chunks: ids.into_iter().zip(probs).collect(),
            failure,
        })
    }

    /// Blended value of numeric slot `slot` over chunks matching `request`.
    ///
    /// ```text
    /// V = sum_i P_i * v_i,  P_i = exp(A_i / t) / sum_j exp(A_j / t),  t = s * sqrt(2)
    /// ```
    ///
    /// Only chunks that hold a number in `slot` and have been presented by
    /// `now` take part. Returns `None` when no chunk qualifies.
    pub fn blended_value(
        &self,
        request: &Request,
        slot: &str,
        now: f64,
        config: &ActivationConfig,
    ) -> IblResult<Option<f64>> {
        let mut outcomes = Vec::new();
        let mut activations = Vec::new();
        for chunk in self.matching(request) {
            let Some(value) = chunk.slot(slot).and_then(|v| v.as_number()) else {
                continue;
            };
            let activation = base_level_activation(&chunk.presentations, now, config);
            if activation == f64::NEG_INFINITY {
                continue;
            }
            outcomes.push(value);
            activations.push(activation);
        }
        if outcomes.is_empty() {
            return Ok(None);
        }

        let weights = softmax(&activations, config.blending_temperature())?;
        Ok(Some(
            weights.iter().zip(&outcomes).map(|(w, v)| w * v).sum(),
        ))
    }
}
