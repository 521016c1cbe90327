//! Deterministic seed derivation.
//!
//! A master seed expands into per-(label, index) sub-seeds via BLAKE3.
//! Derivation is hash-based rather than draw-order-based, so the same master
//! seed produces the same sub-seeds regardless of the order in which
//! consumers ask for them.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Deterministic seed hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct SeedSequence {
    master_seed: u64,
}

impl SeedSequence {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive the sub-seed for a (label, index) pair.
    pub fn derive(&self, label: &str, index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(label.as_bytes());
        hasher.update(&index.to_le_bytes());
        let hash = hasher.finalize();
        u64::from_le_bytes(hash.as_bytes()[..8].try_into().unwrap())
    }

    /// Seeded generator for a (label, index) pair.
    ///
    /// ChaCha8 keeps the stream identical across platforms and releases, so
    /// optimizer and resampler output is bit-reproducible given the master
    /// seed.
    pub fn rng(&self, label: &str, index: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.derive(label, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn sub_seeds_are_deterministic() {
        let seeds = SeedSequence::new(42);
        assert_eq!(seeds.derive("window", 0), seeds.derive("window", 0));
    }

    #[test]
    fn different_labels_different_seeds() {
        let seeds = SeedSequence::new(42);
        assert_ne!(seeds.derive("window", 0), seeds.derive("restart", 0));
    }

    #[test]
    fn different_indices_different_seeds() {
        let seeds = SeedSequence::new(42);
        assert_ne!(seeds.derive("window", 0), seeds.derive("window", 1));
    }

    #[test]
    fn different_master_seeds_different_output() {
        assert_ne!(
            SeedSequence::new(42).derive("window", 0),
            SeedSequence::new(43).derive("window", 0)
        );
    }

    #[test]
    fn derivation_order_independent() {
        let seeds = SeedSequence::new(42);
        let a_first = seeds.derive("window", 0);
        let _b = seeds.derive("window", 1);
        let a_second = seeds.derive("window", 0);
        assert_eq!(a_first, a_second);
    }

    #[test]
    fn rng_streams_are_reproducible() {
        let seeds = SeedSequence::new(7);
        let draws_a: Vec<u32> = (0..5).map(|_| seeds.rng("mc", 3).gen()).collect();
        let mut rng = seeds.rng("mc", 3);
        let first: u32 = rng.gen();
        assert!(draws_a.iter().all(|&d| d == first));
    }
}
