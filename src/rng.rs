//! Small xorshift64* pseudo-random generator.
//!
//! Target selection needs uniform draws, not cryptographic quality, so a
//! 16-byte generator seeded from the system clock is enough. Deterministic
//! when seeded explicitly, which the mode tests rely on.

pub struct Rng {
    state: u64,
}

impl Rng {
    /// Seed from the system clock. A zero seed would lock xorshift at zero,
    /// so it is remapped.
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64 ^ d.as_secs())
            .unwrap_or(0x9E37_79B9);
        Self::seeded(nanos)
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        // xorshift64* (Vigna 2014)
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform draw in `[low, high)`. `low == high` returns `low`.
    pub fn gen_range(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        low + self.next_u64() % (high - low)
    }

    /// Uniform index in `[0, len)`. `len == 0` returns 0.
    pub fn gen_index(&mut self, len: usize) -> usize {
        self.gen_range(0, len as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds_respected() {
        let mut rng = Rng::seeded(42);
        for _ in 0..1000 {
            let v = rng.gen_range(500, 3500);
            assert!((500..3500).contains(&v));
        }
    }

    #[test]
    fn index_covers_all_slots() {
        let mut rng = Rng::seeded(7);
        let mut hit = [false; 6];
        for _ in 0..1000 {
            hit[rng.gen_index(6)] = true;
        }
        assert!(hit.iter().all(|h| *h), "a slot was never drawn: {hit:?}");
    }

    #[test]
    fn degenerate_ranges_do_not_panic() {
        let mut rng = Rng::seeded(1);
        assert_eq!(rng.gen_range(10, 10), 10);
        assert_eq!(rng.gen_index(0), 0);
    }

    #[test]
    fn zero_seed_is_remapped() {
        let mut rng = Rng::seeded(0);
        assert_ne!(rng.next_u64(), 0);
    }
}
