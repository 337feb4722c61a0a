use crate::core::common::Float;
use hexf::*;

pub const ONE_MINUS_EPSILON: Float = hexf32!("0x1.fffffep-1");

/// xorshift128 pseudorandom stream. Each worker thread owns one,
/// seeded from a shared top-level stream, so a render is reproducible
/// for a fixed (seed, thread count) pair.
#[derive(Debug, Copy, Clone)]
pub struct XorShiftRng {
    state: [u32; 4],
}

impl Default for XorShiftRng {
    fn default() -> Self {
        Self::new(89_482_311)
    }
}

impl XorShiftRng {
    pub fn new(seed: u32) -> Self {
        // SplitMix-style scramble so nearby seeds give unrelated states.
        let mut s = seed as u64;
        let mut state = [0u32; 4];

        for v in state.iter_mut() {
            s = s.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = s;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            *v = (z ^ (z >> 31)) as u32;
        }

        // All-zero state would lock the generator.
        if state == [0, 0, 0, 0] {
            state[0] = 1;
        }

        Self { state }
    }

    pub fn uniform_u32(&mut self) -> u32 {
        let t = self.state[0] ^ (self.state[0] << 11);
        self.state[0] = self.state[1];
        self.state[1] = self.state[2];
        self.state[2] = self.state[3];
        self.state[3] = (self.state[3] ^ (self.state[3] >> 19)) ^ (t ^ (t >> 8));

        self.state[3]
    }

    /// Uniform in [0, 1).
    pub fn uniform_float(&mut self) -> Float {
        ONE_MINUS_EPSILON.min(self.uniform_u32() as Float * hexf32!("0x1.0p-32"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_unit_interval() {
        let mut rng = XorShiftRng::new(42);
        for _ in 0..10_000 {
            let u = rng.uniform_float();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn streams_repeat() {
        let mut a = XorShiftRng::new(7);
        let mut b = XorShiftRng::new(7);
        for _ in 0..100 {
            assert_eq!(a.uniform_u32(), b.uniform_u32());
        }
    }
}
