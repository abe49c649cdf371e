//! Run-length encoding of pixel buffers.
//!
//! Consecutive identical pixels collapse into a single [`Run`]. Decoding
//! replays the runs into a zeroed buffer of the target size: runs that would
//! overflow the image are cut off, and if the runs fall short the remaining
//! pixels keep their zero value.

use log::{debug, warn};

use crate::compression::Result;
use crate::config::DEFAULT_BITS_PER_RUN;
use crate::pixel::{Pixel, PixelBuffer};

/// A pixel repeated `count` times in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub pixel: Pixel,
    pub count: usize,
}

impl Run {
    pub fn new(pixel: Pixel, count: usize) -> Self {
        Run { pixel, count }
    }
}

/// Encodes `buffer` as a sequence of runs.
///
/// An empty buffer yields no runs. Otherwise the final run is always emitted,
/// even when its count is 1.
///
/// # Example
///
/// ```
/// use pixcodec::compression::rle::{encode, Run};
/// use pixcodec::{Pixel, PixelBuffer};
///
/// let red = Pixel::new(255, 0, 0, 255);
/// let buf = PixelBuffer::from_pixels(2, 1, [red, red]).unwrap();
/// assert_eq!(encode(&buf), vec![Run::new(red, 2)]);
/// ```
pub fn encode(buffer: &PixelBuffer) -> Vec<Run> {
    let mut pixels = buffer.pixels();
    let Some(first) = pixels.next() else {
        return Vec::new();
    };

    let mut runs = Vec::new();
    let mut current = Run::new(first, 1);
    for pixel in pixels {
        if pixel == current.pixel {
            current.count += 1;
        } else {
            runs.push(current);
            current = Run::new(pixel, 1);
        }
    }
    runs.push(current);

    debug!(
        "rle: {} pixels collapsed into {} runs",
        buffer.pixel_count(),
        runs.len()
    );
    runs
}

/// Replays `runs` into a `width * height` image.
pub fn decode(runs: &[Run], width: usize, height: usize) -> Result<PixelBuffer> {
    let mut output = PixelBuffer::zeroed(width, height)?;
    let capacity = output.pixel_count();
    let mut written = 0;

    'replay: for run in runs {
        for _ in 0..run.count {
            if written >= capacity {
                break 'replay;
            }
            output.set_pixel(written, run.pixel);
            written += 1;
        }
    }

    let supplied: usize = runs.iter().map(|r| r.count).fold(0, usize::saturating_add);
    if supplied < capacity {
        warn!(
            "rle: runs cover {} of {} pixels, remainder left zeroed",
            supplied, capacity
        );
    } else if supplied > capacity {
        debug!(
            "rle: dropped {} pixels beyond the {} pixel image",
            supplied - capacity,
            capacity
        );
    }
    Ok(output)
}

/// Accounted size of `runs` in bits at the default of 32 bits per run.
pub fn compressed_bits(runs: &[Run]) -> usize {
    compressed_bits_with(runs, DEFAULT_BITS_PER_RUN)
}

/// Accounted size of `runs` in bits when each run costs `bits_per_run`.
pub fn compressed_bits_with(runs: &[Run], bits_per_run: usize) -> usize {
    runs.len() * bits_per_run
}
