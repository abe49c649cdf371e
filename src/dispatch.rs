//! Algorithm selection and the request/response boundary.
//!
//! A caller hands over an algorithm name and raw image data and gets back the
//! image after an encode/decode round trip plus both sizes in bits, or an
//! error message. Every failure is turned into a [`CodecResponse::Failure`];
//! nothing escapes [`Codec::respond`].

use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use rayon::prelude::*;

use crate::compression::{
    ArithmeticCodec, CodecOutput, HuffmanCodec, PixelCodec, QuantizedRleCodec, RleCodec,
};
use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::pixel::PixelBuffer;

/// The four supported algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    RunLength,
    Huffman,
    Arithmetic,
    /// Quantization followed by run-length encoding (lossy)
    Compression,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::RunLength,
        Algorithm::Huffman,
        Algorithm::Arithmetic,
        Algorithm::Compression,
    ];

    /// The selector string callers use for this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::RunLength => "Run Length Encoding",
            Algorithm::Huffman => "Huffman Encoding",
            Algorithm::Arithmetic => "Arithmetic Encoding",
            Algorithm::Compression => "Compression",
        }
    }

    /// Whether decoding reproduces the input exactly.
    pub fn is_lossless(&self) -> bool {
        !matches!(self, Algorithm::Compression)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| Error::UnsupportedAlgorithm(s.to_string()))
    }
}

/// Raw image data as supplied by a caller, not yet checked for consistency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl ImageData {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        ImageData {
            width,
            height,
            data,
        }
    }

    /// Checks the data against the dimensions.
    pub fn into_buffer(self) -> Result<PixelBuffer> {
        PixelBuffer::new(self.width, self.height, self.data)
    }
}

impl From<PixelBuffer> for ImageData {
    fn from(buffer: PixelBuffer) -> Self {
        ImageData {
            width: buffer.width(),
            height: buffer.height(),
            data: buffer.into_bytes(),
        }
    }
}

/// One unit of work: an algorithm selector and the image to run it on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecRequest {
    pub algorithm: String,
    pub image: ImageData,
}

impl CodecRequest {
    pub fn new(algorithm: impl Into<String>, image: impl Into<ImageData>) -> Self {
        CodecRequest {
            algorithm: algorithm.into(),
            image: image.into(),
        }
    }
}

/// Outcome of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecResponse {
    Success(CodecOutput),
    Failure { error: String },
}

impl CodecResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, CodecResponse::Success(_))
    }

    pub fn output(&self) -> Option<&CodecOutput> {
        match self {
            CodecResponse::Success(output) => Some(output),
            CodecResponse::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CodecResponse::Success(_) => None,
            CodecResponse::Failure { error } => Some(error),
        }
    }
}

impl From<Result<CodecOutput>> for CodecResponse {
    fn from(result: Result<CodecOutput>) -> Self {
        match result {
            Ok(output) => CodecResponse::Success(output),
            Err(err) => CodecResponse::Failure {
                error: err.to_string(),
            },
        }
    }
}

/// Runs encode/decode round trips under one configuration.
///
/// A `Codec` holds no per-call state, so one instance can serve any number
/// of threads.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    /// Creates a codec after validating `config`.
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Codec { config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encodes and decodes `buffer` with `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] for an empty image, and whatever the
    /// selected codec reports otherwise.
    pub fn process(&self, algorithm: Algorithm, buffer: &PixelBuffer) -> Result<CodecOutput> {
        if buffer.is_empty() {
            return Err(Error::MalformedInput(format!(
                "{}x{} image has no pixels",
                buffer.width(),
                buffer.height()
            )));
        }

        let output = match algorithm {
            Algorithm::RunLength => RleCodec {
                bits_per_run: self.config.bits_per_run,
            }
            .round_trip(buffer),
            Algorithm::Huffman => HuffmanCodec.round_trip(buffer),
            Algorithm::Arithmetic => ArithmeticCodec {
                verify: self.config.verify_arithmetic,
            }
            .round_trip(buffer),
            Algorithm::Compression => QuantizedRleCodec {
                step: self.config.quantization_step,
                bits_per_run: self.config.bits_per_run,
            }
            .round_trip(buffer),
        }?;

        debug!(
            "{}: {} bits -> {} bits",
            algorithm, output.original_size, output.compressed_size
        );
        Ok(output)
    }

    /// Parses the selector, validates the image and runs the round trip,
    /// converting any error into a failure response.
    ///
    /// # Example
    ///
    /// ```
    /// use pixcodec::dispatch::{Codec, CodecRequest, CodecResponse, ImageData};
    ///
    /// let request = CodecRequest::new("Unknown", ImageData::new(1, 1, vec![0; 4]));
    /// let response = Codec::default().respond(request);
    /// assert_eq!(
    ///     response,
    ///     CodecResponse::Failure { error: "Unsupported algorithm.".to_string() }
    /// );
    /// ```
    pub fn respond(&self, request: CodecRequest) -> CodecResponse {
        let result = request
            .algorithm
            .parse::<Algorithm>()
            .and_then(|algorithm| {
                let buffer = request.image.into_buffer()?;
                self.process(algorithm, &buffer)
            });
        if let Err(err) = &result {
            warn!("request for {:?} failed: {}", request.algorithm, err);
        }
        result.into()
    }

    /// Handles independent requests in parallel, returning responses in
    /// request order.
    pub fn process_batch(&self, requests: Vec<CodecRequest>) -> Vec<CodecResponse> {
        requests
            .into_par_iter()
            .map(|request| self.respond(request))
            .collect()
    }
}

/// Round trip with the default configuration.
pub fn process(algorithm: Algorithm, buffer: &PixelBuffer) -> Result<CodecOutput> {
    Codec::default().process(algorithm, buffer)
}

/// Handles one request with the default configuration.
pub fn respond(request: CodecRequest) -> CodecResponse {
    Codec::default().respond(request)
}
