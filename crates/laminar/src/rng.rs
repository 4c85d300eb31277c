//! Engine-local deterministic pseudo-random source.
//!
//! The ordering stage shuffles with a Lehmer generator (multiplier 48271, modulus
//! 2^31 - 1) seeded from a fixed string, so repeated runs on the same input produce
//! byte-identical coordinates and external random sources are never perturbed.

const MULTIPLIER: u64 = 48271;
const MODULUS: u64 = (1 << 31) - 1;

#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn seed_from_str(seed: &str) -> Self {
        // FNV-1a, folded into the Lehmer state range. State zero would be a fixpoint.
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for b in seed.bytes() {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(0x100_0000_01b3);
        }
        let state = hash % MODULUS;
        Self {
            state: if state == 0 { 1 } else { state },
        }
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER) % MODULUS;
        self.state as f64 / MODULUS as f64
    }

    /// Uniform in `[0, bound)`.
    pub fn next_below(&mut self, bound: usize) -> usize {
        if bound <= 1 {
            return 0;
        }
        let r = (self.next_f64() * bound as f64) as usize;
        r.min(bound - 1)
    }

    /// Fisher-Yates in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_below(i + 1);
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Rng::seed_from_str("ordering");
        let mut b = Rng::seed_from_str("ordering");
        for _ in 0..32 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let mut rng = Rng::seed_from_str("bounds");
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = Rng::seed_from_str("shuffle");
        let mut items: Vec<usize> = (0..16).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..16).collect::<Vec<_>>());
    }
}
