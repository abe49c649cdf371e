//! Options shared by the codecs and the dispatcher.

use crate::error::{Error, Result};

/// Quantization step applied to R, G and B by the lossy algorithm.
pub const DEFAULT_QUANTIZATION_STEP: u8 = 32;
/// Fixed number of bits each run is accounted as.
pub const DEFAULT_BITS_PER_RUN: usize = 32;

/// Configuration for a [`Codec`](crate::dispatch::Codec).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Channel rounding step for the lossy "Compression" algorithm
    pub quantization_step: u8,
    /// Bits charged per run when reporting RLE compressed sizes
    pub bits_per_run: usize,
    /// Re-encode arithmetic-decoded pixels and reject any mismatch
    pub verify_arithmetic: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            quantization_step: DEFAULT_QUANTIZATION_STEP,
            bits_per_run: DEFAULT_BITS_PER_RUN,
            verify_arithmetic: true,
        }
    }
}

impl CodecConfig {
    pub fn with_quantization_step(mut self, step: u8) -> Self {
        self.quantization_step = step;
        self
    }

    pub fn with_bits_per_run(mut self, bits: usize) -> Self {
        self.bits_per_run = bits;
        self
    }

    pub fn with_verify_arithmetic(mut self, verify: bool) -> Self {
        self.verify_arithmetic = verify;
        self
    }

    /// Checks that every option is usable.
    pub fn validate(&self) -> Result<()> {
        if self.quantization_step == 0 {
            return Err(Error::InvalidConfig(
                "quantization step must be positive".to_string(),
            ));
        }
        if self.bits_per_run == 0 {
            return Err(Error::InvalidConfig(
                "bits per run must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
