//! Lossless and lossy codecs for RGBA pixel buffers.
//!
//! Four algorithms share one interface: run-length encoding, Huffman coding,
//! arithmetic coding, and a quantized run-length variant. Every call is a pure
//! function of its input; nothing is cached between calls, so codecs can be
//! used from any number of threads without locking.

pub mod compression;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod pixel;

pub use compression::{CodecOutput, PixelCodec};
pub use config::CodecConfig;
pub use dispatch::{process, respond, Algorithm, Codec, CodecRequest, CodecResponse, ImageData};
pub use error::{Error, Result};
pub use pixel::{Pixel, PixelBuffer};
