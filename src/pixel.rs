//! RGBA pixel values and the buffers that hold them.
//!
//! A [`Pixel`] is the symbol every codec in this crate works with. Pixels are
//! ordered lexicographically over `(R, G, B, A)`, which gives the arithmetic
//! coder a canonical symbol order independent of how often each colour occurs.

use std::fmt;

use crate::error::{Error, Result};

/// Number of bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// A single RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Pixel(pub [u8; CHANNELS]);

impl Pixel {
    /// Creates a pixel from its four channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Pixel([r, g, b, a])
    }

    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }

    pub fn a(&self) -> u8 {
        self.0[3]
    }

    /// Returns the channels as a byte array.
    pub fn to_bytes(self) -> [u8; CHANNELS] {
        self.0
    }
}

impl From<[u8; CHANNELS]> for Pixel {
    fn from(bytes: [u8; CHANNELS]) -> Self {
        Pixel(bytes)
    }
}

impl From<Pixel> for [u8; CHANNELS] {
    fn from(pixel: Pixel) -> Self {
        pixel.0
    }
}

/// Packs the pixel big-endian, red in the most significant byte. The packed
/// value orders the same way as the pixel itself.
impl From<Pixel> for u32 {
    fn from(pixel: Pixel) -> Self {
        u32::from_be_bytes(pixel.0)
    }
}

impl From<u32> for Pixel {
    fn from(packed: u32) -> Self {
        Pixel(packed.to_be_bytes())
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.r(), self.g(), self.b(), self.a())
    }
}

/// A `width * height` RGBA image stored row-major, four bytes per pixel.
///
/// The byte length always equals `width * height * 4`; the constructors
/// enforce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw RGBA bytes, checking them against the declared dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] if `width * height * 4` overflows or
    /// differs from `data.len()`.
    ///
    /// # Example
    ///
    /// ```
    /// use pixcodec::PixelBuffer;
    ///
    /// let buf = PixelBuffer::new(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();
    /// assert_eq!(buf.pixel_count(), 2);
    /// assert!(PixelBuffer::new(2, 2, vec![0; 8]).is_err());
    /// ```
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(Error::MalformedInput(format!(
                "buffer holds {} bytes but a {}x{} image needs {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(PixelBuffer {
            width,
            height,
            data,
        })
    }

    /// Allocates an image whose bytes are all zero.
    pub fn zeroed(width: usize, height: usize) -> Result<Self> {
        let len = byte_len(width, height)?;
        Ok(PixelBuffer {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Builds an image from pixels in scan order.
    pub fn from_pixels<I>(width: usize, height: usize, pixels: I) -> Result<Self>
    where
        I: IntoIterator<Item = Pixel>,
    {
        let data = pixels.into_iter().flat_map(Pixel::to_bytes).collect();
        Self::new(width, height, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels, `width * height`.
    pub fn pixel_count(&self) -> usize {
        self.data.len() / CHANNELS
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Size of the raw image in bits.
    pub fn size_in_bits(&self) -> usize {
        self.data.len() * 8
    }

    /// Returns the pixel at scan-order index `index`, if in range.
    pub fn pixel(&self, index: usize) -> Option<Pixel> {
        let start = index.checked_mul(CHANNELS)?;
        let bytes = self.data.get(start..start.checked_add(CHANNELS)?)?;
        Some(Pixel([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Overwrites the pixel at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.pixel_count()`.
    pub fn set_pixel(&mut self, index: usize, pixel: Pixel) {
        let start = index * CHANNELS;
        self.data[start..start + CHANNELS].copy_from_slice(&pixel.0);
    }

    /// Iterates over the pixels in scan order (left to right, top to bottom).
    pub fn pixels(&self) -> impl ExactSizeIterator<Item = Pixel> + '_ {
        self.data
            .chunks_exact(CHANNELS)
            .map(|c| Pixel([c[0], c[1], c[2], c[3]]))
    }
}

fn byte_len(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or_else(|| {
            Error::MalformedInput(format!("image dimensions {}x{} overflow", width, height))
        })
}
