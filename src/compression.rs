//! Pixel compression algorithms.
//!
//! This module provides four interchangeable codecs over RGBA pixel buffers:
//! - Run-length encoding
//! - Huffman coding
//! - Arithmetic coding
//! - Quantized run-length encoding (lossy)
//!
//! Each codec turns a [`PixelBuffer`] into an algorithm-specific encoded form,
//! decodes that form back into a buffer of given dimensions, and reports the
//! encoded size in bits.
//!
//! # Examples
//!
//! ```rust
//! use pixcodec::compression::{HuffmanCodec, PixelCodec};
//! use pixcodec::{Pixel, PixelBuffer};
//!
//! let buf = PixelBuffer::from_pixels(
//!     2,
//!     1,
//!     [Pixel::new(255, 0, 0, 255), Pixel::new(0, 255, 0, 255)],
//! )
//! .unwrap();
//! let output = HuffmanCodec.round_trip(&buf).unwrap();
//! assert_eq!(output.output, buf);
//! assert_eq!(output.original_size, 64);
//! assert_eq!(output.compressed_size, 2);
//! ```

use crate::config::{DEFAULT_BITS_PER_RUN, DEFAULT_QUANTIZATION_STEP};
use crate::error::Error;
use crate::pixel::PixelBuffer;

/// Result type for compression operations
pub type Result<T> = std::result::Result<T, Error>;

pub mod arithmetic;
pub mod frequency;
pub mod huffman;
pub mod quantize;
pub mod rle;

pub use arithmetic::{
    arithmetic_decode, arithmetic_encode, ArithmeticEncoded, CumulativeEntry, CumulativeTable,
};
pub use frequency::FrequencyTable;
pub use huffman::{
    build_code_table, build_huffman_tree, huffman_decode, huffman_encode, CodeTable,
    HuffmanEncoded, HuffmanNode,
};
pub use quantize::quantize;
pub use rle::Run;

/// A decoded image together with its size accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOutput {
    /// The image reconstructed by the decoder
    pub output: PixelBuffer,
    /// Size of the input image in bits
    pub original_size: usize,
    /// Size of the encoded representation in bits
    pub compressed_size: usize,
}

/// Trait for pixel codecs
pub trait PixelCodec {
    /// The encoded representation
    type Encoded;

    /// Encode the image
    fn encode(&self, buffer: &PixelBuffer) -> Result<Self::Encoded>;

    /// Decode an encoded image of the given dimensions
    fn decode(&self, encoded: &Self::Encoded, width: usize, height: usize) -> Result<PixelBuffer>;

    /// Size of the encoded representation in bits
    fn compressed_bits(&self, encoded: &Self::Encoded) -> usize;

    /// Encode then decode `buffer`, reporting both sizes.
    fn round_trip(&self, buffer: &PixelBuffer) -> Result<CodecOutput> {
        let encoded = self.encode(buffer)?;
        let output = self.decode(&encoded, buffer.width(), buffer.height())?;
        Ok(CodecOutput {
            output,
            original_size: buffer.size_in_bits(),
            compressed_size: self.compressed_bits(&encoded),
        })
    }
}

/// Lossless run-length coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RleCodec {
    pub bits_per_run: usize,
}

impl Default for RleCodec {
    fn default() -> Self {
        RleCodec {
            bits_per_run: DEFAULT_BITS_PER_RUN,
        }
    }
}

impl PixelCodec for RleCodec {
    type Encoded = Vec<Run>;

    fn encode(&self, buffer: &PixelBuffer) -> Result<Vec<Run>> {
        Ok(rle::encode(buffer))
    }

    fn decode(&self, encoded: &Vec<Run>, width: usize, height: usize) -> Result<PixelBuffer> {
        rle::decode(encoded, width, height)
    }

    fn compressed_bits(&self, encoded: &Vec<Run>) -> usize {
        rle::compressed_bits_with(encoded, self.bits_per_run)
    }
}

/// Huffman prefix coding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HuffmanCodec;

impl PixelCodec for HuffmanCodec {
    type Encoded = HuffmanEncoded;

    fn encode(&self, buffer: &PixelBuffer) -> Result<HuffmanEncoded> {
        huffman_encode(buffer)
    }

    fn decode(&self, encoded: &HuffmanEncoded, width: usize, height: usize) -> Result<PixelBuffer> {
        huffman_decode(encoded, width, height)
    }

    fn compressed_bits(&self, encoded: &HuffmanEncoded) -> usize {
        encoded.compressed_bits()
    }
}

/// Floating-point arithmetic coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticCodec {
    /// Reject decoded images that do not re-encode to the received bits
    pub verify: bool,
}

impl Default for ArithmeticCodec {
    fn default() -> Self {
        ArithmeticCodec { verify: true }
    }
}

impl PixelCodec for ArithmeticCodec {
    type Encoded = ArithmeticEncoded;

    fn encode(&self, buffer: &PixelBuffer) -> Result<ArithmeticEncoded> {
        arithmetic_encode(buffer)
    }

    fn decode(
        &self,
        encoded: &ArithmeticEncoded,
        width: usize,
        height: usize,
    ) -> Result<PixelBuffer> {
        arithmetic::arithmetic_decode_with(encoded, width, height, self.verify)
    }

    fn compressed_bits(&self, encoded: &ArithmeticEncoded) -> usize {
        encoded.compressed_bits()
    }
}

/// Lossy coding: colour quantization followed by run-length coding. Decoding
/// yields the quantized image, not the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizedRleCodec {
    pub step: u8,
    pub bits_per_run: usize,
}

impl Default for QuantizedRleCodec {
    fn default() -> Self {
        QuantizedRleCodec {
            step: DEFAULT_QUANTIZATION_STEP,
            bits_per_run: DEFAULT_BITS_PER_RUN,
        }
    }
}

impl PixelCodec for QuantizedRleCodec {
    type Encoded = Vec<Run>;

    fn encode(&self, buffer: &PixelBuffer) -> Result<Vec<Run>> {
        quantize::compress(buffer, self.step)
    }

    fn decode(&self, encoded: &Vec<Run>, width: usize, height: usize) -> Result<PixelBuffer> {
        rle::decode(encoded, width, height)
    }

    fn compressed_bits(&self, encoded: &Vec<Run>) -> usize {
        rle::compressed_bits_with(encoded, self.bits_per_run)
    }
}
