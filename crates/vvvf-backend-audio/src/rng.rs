//! Deterministic carrier jitter for resonant (random) modulation.
//!
//! A cyclic table of pre-seeded values is XOR-ed with a 16-bit Fibonacci LFSR
//! that advances once per draw. The table walk has period 256 and the LFSR
//! period 65535, so the combined sequence does not repeat audibly.

/// Seed the LFSR starts from.
pub const LFSR_SEED: u16 = 0xACE1;

const JITTER_TABLE: [u16; 256] = [
    42, 17, 89, 63, 31, 55, 10, 72, 94, 28, 5, 36, 81, 22, 68, 14, //
    77, 49, 90, 33, 8, 45, 99, 12, 60, 25, 70, 40, 83, 19, 3, 50, //
    88, 7, 65, 29, 74, 52, 96, 21, 1, 38, 79, 16, 57, 34, 85, 47, //
    92, 26, 9, 44, 98, 13, 61, 24, 71, 39, 84, 18, 4, 51, 87, 6, //
    66, 30, 75, 53, 95, 20, 2, 37, 80, 15, 58, 35, 86, 48, 91, 27, //
    11, 46, 97, 23, 62, 32, 76, 54, 93, 41, 0, 43, 78, 17, 59, 36, //
    82, 49, 89, 22, 123, 234, 189, 145, 67, 201, 132, 98, 177, 210, 55, 120, //
    33, 200, 88, 150, 44, 99, 111, 66, 77, 22, 199, 180, 30, 155, 43, 166, //
    92, 188, 10, 144, 78, 199, 65, 122, 87, 33, 210, 99, 45, 177, 66, 88, //
    150, 44, 123, 234, 189, 145, 67, 201, 132, 98, 177, 210, 55, 120, 33, 200, //
    88, 150, 44, 99, 111, 66, 77, 22, 199, 180, 30, 155, 43, 166, 92, 188, //
    10, 144, 78, 199, 65, 122, 87, 33, 210, 99, 45, 177, 66, 88, 150, 44, //
    123, 234, 189, 145, 67, 201, 132, 98, 177, 210, 55, 120, 33, 200, 88, 150, //
    44, 99, 111, 66, 77, 22, 199, 180, 30, 155, 43, 166, 92, 188, 10, 144, //
    78, 199, 65, 122, 87, 33, 210, 99, 45, 177, 66, 88, 150, 44, 123, 234, //
    189, 145, 67, 201, 132, 98, 177, 210, 55, 120, 33, 200, 88, 150, 44, 99, //
];

/// Table-plus-LFSR pseudo-random source.
#[derive(Debug, Clone)]
pub struct CarrierJitter {
    index: usize,
    lfsr: u16,
}

impl CarrierJitter {
    /// Creates a jitter source at the start of its sequence.
    pub fn new() -> Self {
        Self::with_seed(LFSR_SEED)
    }

    /// Creates a jitter source with a custom LFSR seed. A zero seed would lock
    /// the register, so it is replaced by [`LFSR_SEED`].
    pub fn with_seed(seed: u16) -> Self {
        Self {
            index: 0,
            lfsr: if seed == 0 { LFSR_SEED } else { seed },
        }
    }

    /// Returns the next raw 16-bit value.
    pub fn next_u16(&mut self) -> u16 {
        let table_value = JITTER_TABLE[self.index];
        self.index = (self.index + 1) % JITTER_TABLE.len();

        // Taps 16, 14, 13, 11.
        let bit = (self.lfsr ^ (self.lfsr >> 2) ^ (self.lfsr >> 3) ^ (self.lfsr >> 5)) & 1;
        self.lfsr = (self.lfsr >> 1) | (bit << 15);

        table_value ^ self.lfsr
    }

    /// Draws an integer uniformly-ish from `[min, max]` (inclusive).
    ///
    /// Bounds are swapped if given in the wrong order.
    pub fn range(&mut self, min: u32, max: u32) -> u32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let width = u64::from(hi - lo) + 1;
        lo + (u64::from(self.next_u16()) % width) as u32
    }

    /// Draws a whole-Hz frequency from `[min_hz, max_hz]`.
    pub fn frequency(&mut self, min_hz: f32, max_hz: f32) -> f32 {
        let lo = min_hz.max(0.0) as u32;
        let hi = max_hz.max(0.0) as u32;
        self.range(lo, hi) as f32
    }
}

impl Default for CarrierJitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_determinism() {
        let mut a = CarrierJitter::new();
        let mut b = CarrierJitter::new();

        let values_a: Vec<u16> = (0..500).map(|_| a.next_u16()).collect();
        let values_b: Vec<u16> = (0..500).map(|_| b.next_u16()).collect();
        assert_eq!(values_a, values_b);
    }

    #[test]
    fn test_first_value_mixes_table_and_lfsr() {
        let mut jitter = CarrierJitter::new();
        // 0xACE1 shifted right with feedback bit 0: 0x5670.
        assert_eq!(jitter.next_u16(), 42 ^ 0x5670);
    }

    #[test]
    fn test_range_stays_in_bounds() {
        let mut jitter = CarrierJitter::new();
        for _ in 0..10_000 {
            let v = jitter.range(400, 900);
            assert!((400..=900).contains(&v));
        }
    }

    #[test]
    fn test_range_swapped_bounds() {
        let mut jitter = CarrierJitter::new();
        for _ in 0..100 {
            let v = jitter.range(900, 400);
            assert!((400..=900).contains(&v));
        }
    }

    #[test]
    fn test_degenerate_range_is_constant() {
        let mut jitter = CarrierJitter::new();
        assert!((0..50).all(|_| jitter.range(700, 700) == 700));
    }

    #[test]
    fn test_sequence_does_not_repeat_with_table_period() {
        let mut jitter = CarrierJitter::new();
        let first: Vec<u16> = (0..256).map(|_| jitter.next_u16()).collect();
        let second: Vec<u16> = (0..256).map(|_| jitter.next_u16()).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn test_zero_seed_replaced() {
        let mut zero = CarrierJitter::with_seed(0);
        let mut default = CarrierJitter::new();
        assert_eq!(zero.next_u16(), default.next_u16());
    }
}
