//! Sources of uniformly distributed elimination indices.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Narrow randomness capability used by the transition engine: a uniform index in `0..len`.
///
/// Implementations may assume `len > 0`.
pub trait IndexSource {
    /// Draw an index in `0..len`.
    fn pick(&mut self, len: usize) -> usize;
}

/// Draws from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadIndex;

impl IndexSource for ThreadIndex {
    fn pick(&mut self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Reproducible draws from a fixed seed.
#[derive(Debug, Clone)]
pub struct SeededIndex {
    inner: StdRng,
}

impl SeededIndex {
    /// Create a generator whose sequence is fully determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl IndexSource for SeededIndex {
    fn pick(&mut self, len: usize) -> usize {
        self.inner.random_range(0..len)
    }
}

/// Replays a scripted list of indices, wrapping each into range. Once the script is
/// exhausted it keeps answering `0`.
#[derive(Debug, Default, Clone)]
pub struct SequenceIndex {
    script: VecDeque<usize>,
}

impl SequenceIndex {
    /// Script the upcoming draws.
    pub fn new(script: impl IntoIterator<Item = usize>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl IndexSource for SequenceIndex {
    fn pick(&mut self, len: usize) -> usize {
        self.script.pop_front().unwrap_or(0) % len
    }
}

/// Build the production index source, seeded when a seed is configured.
pub fn index_source(seed: Option<u64>) -> Box<dyn IndexSource + Send> {
    match seed {
        Some(seed) => Box::new(SeededIndex::new(seed)),
        None => Box::new(ThreadIndex),
    }
}
