use crate::pipeline::traits::FaultInjector;
use bitvec::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Flips one random bit in every full chunk
///
/// One flip per codeword is the most a single-error-correcting code can
/// repair, so artifacts intoxicated this way stay recoverable with error
/// correction enabled and fail detection without it.
#[derive(Debug)]
pub struct Intoxicator {
    rng: Mutex<StdRng>,
}

impl Intoxicator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible flips for tests and demos
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for Intoxicator {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultInjector for Intoxicator {
    fn flip_random_bits_in_chunks(
        &self,
        bits: &mut BitSlice<u8, Lsb0>,
        chunk_bits: usize,
    ) -> usize {
        if chunk_bits == 0 {
            return 0;
        }
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut flips = 0;
        for chunk in bits.chunks_exact_mut(chunk_bits) {
            let index = rng.gen_range(0..chunk_bits);
            let flipped = !chunk[index];
            chunk.set(index, flipped);
            flips += 1;
        }
        flips
    }
}
