//! Lossy colour quantization feeding the run-length coder.
//!
//! Rounding R, G and B to a coarse grid lengthens runs in photographic images
//! at the cost of fidelity. Alpha is never touched. Quantization is
//! idempotent: every output channel is already a grid point or 255.

use crate::compression::{rle, Result};
use crate::error::Error;
use crate::pixel::{Pixel, PixelBuffer};

/// Rounds `value` to the nearest multiple of `step`, halves rounding up, and
/// clamps the result to 255.
///
/// # Panics
///
/// Panics if `step` is zero.
pub fn quantize_channel(value: u8, step: u8) -> u8 {
    let value = value as u32;
    let step = step as u32;
    let steps = (2 * value + step) / (2 * step);
    (steps * step).min(u8::MAX as u32) as u8
}

/// Quantizes the colour channels of a single pixel.
pub fn quantize_pixel(pixel: Pixel, step: u8) -> Pixel {
    Pixel::new(
        quantize_channel(pixel.r(), step),
        quantize_channel(pixel.g(), step),
        quantize_channel(pixel.b(), step),
        pixel.a(),
    )
}

/// Returns a copy of `buffer` with R, G and B quantized to multiples of `step`.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `step` is zero.
pub fn quantize(buffer: &PixelBuffer, step: u8) -> Result<PixelBuffer> {
    if step == 0 {
        return Err(Error::InvalidConfig(
            "quantization step must be positive".to_string(),
        ));
    }
    PixelBuffer::from_pixels(
        buffer.width(),
        buffer.height(),
        buffer.pixels().map(|p| quantize_pixel(p, step)),
    )
}

/// Quantizes `buffer` and run-length encodes the result.
pub fn compress(buffer: &PixelBuffer, step: u8) -> Result<Vec<rle::Run>> {
    let quantized = quantize(buffer, step)?;
    Ok(rle::encode(&quantized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_rounding() {
        assert_eq!(quantize_channel(0, 32), 0);
        assert_eq!(quantize_channel(15, 32), 0);
        assert_eq!(quantize_channel(16, 32), 32);
        assert_eq!(quantize_channel(47, 32), 32);
        assert_eq!(quantize_channel(48, 32), 64);
        assert_eq!(quantize_channel(224, 32), 224);
        assert_eq!(quantize_channel(239, 32), 224);
        assert_eq!(quantize_channel(240, 32), 255);
        assert_eq!(quantize_channel(255, 32), 255);
    }

    #[test]
    fn test_odd_step() {
        // 7 / 3 = 2.33 and 8 / 3 = 2.67
        assert_eq!(quantize_channel(7, 3), 6);
        assert_eq!(quantize_channel(8, 3), 9);
        assert_eq!(quantize_channel(255, 200), 200);
    }

    #[test]
    fn test_alpha_untouched() {
        let p = quantize_pixel(Pixel::new(10, 100, 250, 17), 32);
        assert_eq!(p, Pixel::new(0, 96, 255, 17));
    }

    #[test]
    fn test_idempotent_for_every_value() {
        for step in [1u8, 3, 32, 100, 200, 255] {
            for value in 0..=255u8 {
                let once = quantize_channel(value, step);
                assert_eq!(quantize_channel(once, step), once, "step {step}, value {value}");
            }
        }
    }

    #[test]
    fn test_buffer_quantization_idempotent() {
        let data: Vec<u8> = (0..=255u8).collect();
        let buf = PixelBuffer::new(8, 8, data).unwrap();
        let once = quantize(&buf, 32).unwrap();
        assert_eq!(quantize(&once, 32).unwrap(), once);
    }

    #[test]
    fn test_zero_step_rejected() {
        let buf = PixelBuffer::zeroed(1, 1).unwrap();
        assert!(matches!(quantize(&buf, 0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_compress_decodes_to_quantized() {
        let buf = PixelBuffer::from_pixels(
            4,
            1,
            [
                Pixel::new(30, 30, 30, 255),
                Pixel::new(33, 29, 40, 255),
                Pixel::new(100, 0, 0, 255),
                Pixel::new(95, 1, 2, 255),
            ],
        )
        .unwrap();
        let runs = compress(&buf, 32).unwrap();
        assert_eq!(runs.len(), 2);
        let decoded = rle::decode(&runs, 4, 1).unwrap();
        assert_eq!(decoded, quantize(&buf, 32).unwrap());
    }
}
