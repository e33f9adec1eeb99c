//! Repeated sequences of chunk elements.

use super::{ChunkElement, InvalidChunk};

/// A sequence of elements repeated a fixed number of times.
///
/// The compiler folds the repetitions into a single repeat block once the
/// body reaches a steady state, so the compiled size does not grow with
/// `repetitions`.
#[derive(Clone, Debug)]
pub struct ChunkLoop {
    body: Vec<ChunkElement>,
    repetitions: usize,
}

impl ChunkLoop {
    /// Create a loop over `body`.
    pub fn new(
        body: impl IntoIterator<Item = impl Into<ChunkElement>>,
        repetitions: usize,
    ) -> Self {
        Self {
            body: body.into_iter().map(Into::into).collect(),
            repetitions,
        }
    }

    /// The elements of one iteration.
    #[inline]
    pub fn body(&self) -> &[ChunkElement] {
        &self.body
    }

    /// The number of iterations.
    #[inline]
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Check every element of the body.
    pub fn verify(&self) -> Result<(), InvalidChunk> {
        self.body.iter().try_for_each(ChunkElement::verify)
    }

    /// The body repeated `repetitions` times, as a flat list of elements.
    pub fn unrolled(&self) -> Vec<ChunkElement> {
        std::iter::repeat(&self.body)
            .take(self.repetitions)
            .flatten()
            .cloned()
            .collect()
    }
}
