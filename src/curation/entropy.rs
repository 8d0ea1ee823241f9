//! Random draws for identities and sampling
//!
//! `SystemEntropy` reads the platform source (browser `crypto` on wasm32).
//! `SplitMix64` is a small seeded generator for reproducible runs.

/// Source of independent 64-bit draws
pub trait Entropy {
    fn next_u64(&mut self) -> u64;

    /// Uniform draw in `[0, 1)` with 53 bits of precision
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// True when draws no longer come from the intended source
    fn is_degraded(&self) -> bool {
        false
    }
}

/// SplitMix64 generator
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl Entropy for SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Platform randomness with a clock-seeded fallback
pub struct SystemEntropy {
    fallback: SplitMix64,
    degraded: bool,
}

impl Default for SystemEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemEntropy {
    pub fn new() -> Self {
        let seed = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default() as u64;
        Self {
            fallback: SplitMix64::new(seed),
            degraded: false,
        }
    }
}

impl Entropy for SystemEntropy {
    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        match getrandom::fill(&mut buf) {
            Ok(()) => u64::from_le_bytes(buf),
            Err(e) => {
                if !self.degraded {
                    crate::console_warn!("[SystemEntropy] platform source failed ({}), using fallback", e);
                    self.degraded = true;
                }
                self.fallback.next_u64()
            }
        }
    }

    /// True once the platform source has failed and the fallback is in use
    fn is_degraded(&self) -> bool {
        self.degraded
    }
}
