//! Floating-point arithmetic coding of pixel buffers.
//!
//! The whole image is encoded as one fraction inside `[0, 1)`. Each pixel
//! narrows a working interval `(low, high)` to the slice its cumulative
//! frequency assigns it; whenever the interval falls entirely into one half of
//! the unit range the encoder emits that half's bit and rescales.
//!
//! # Precision ceiling
//!
//! The interval state is a pair of `f64`s and renormalization only handles the
//! two "same half" cases. An interval that keeps straddling 0.5 while it
//! shrinks is never rescaled, and the decoder works on the absolute interval
//! with no rescaling at all. Images whose bitstream grows past the `f64`
//! mantissa therefore cannot be decoded. The decoder reports this as
//! [`Error::SymbolNotFound`]:
//!
//! - when the working range drops below [`MIN_DECODABLE_RANGE`],
//! - when no cumulative entry contains the scaled value,
//! - when re-encoding the decoded pixels does not reproduce the received bits.
//!
//! Decoding never returns a partially reconstructed image.

use std::collections::HashMap;

use bitvec::prelude::*;
use log::{debug, trace, warn};

use crate::compression::frequency::FrequencyTable;
use crate::compression::Result;
use crate::error::Error;
use crate::pixel::{Pixel, PixelBuffer};

const HALF: f64 = 0.5;

/// Smallest working range the decoder will still resolve a symbol in.
pub const MIN_DECODABLE_RANGE: f64 = f64::EPSILON * 16.0;

/// The slice of `[0, 1)` assigned to one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CumulativeEntry {
    pub pixel: Pixel,
    pub low: f64,
    pub high: f64,
}

impl CumulativeEntry {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value < self.high
    }
}

/// Cumulative frequency intervals in canonical pixel order.
#[derive(Debug, Clone, Default)]
pub struct CumulativeTable {
    entries: Vec<CumulativeEntry>,
    index: HashMap<Pixel, usize>,
}

impl CumulativeTable {
    /// Builds contiguous intervals covering `[0, 1)`, each proportional to its
    /// pixel's count, ordered by pixel value rather than by frequency.
    pub fn from_frequencies(frequencies: &FrequencyTable) -> Self {
        let total = frequencies.total() as f64;
        let mut entries = Vec::with_capacity(frequencies.len());
        let mut index = HashMap::with_capacity(frequencies.len());
        let mut cumulative = 0usize;

        for (pixel, count) in frequencies.sorted() {
            index.insert(pixel, entries.len());
            entries.push(CumulativeEntry {
                pixel,
                low: cumulative as f64 / total,
                high: (cumulative + count) as f64 / total,
            });
            cumulative += count;
        }

        CumulativeTable { entries, index }
    }

    pub fn entries(&self) -> &[CumulativeEntry] {
        &self.entries
    }

    /// The interval assigned to `pixel`.
    pub fn get(&self, pixel: &Pixel) -> Option<&CumulativeEntry> {
        self.index.get(pixel).map(|&i| &self.entries[i])
    }

    /// Linear scan in canonical order for the entry containing `value`.
    pub fn find(&self, value: f64) -> Option<&CumulativeEntry> {
        self.entries.iter().find(|entry| entry.contains(value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Encoder state: the working interval and the bits emitted so far.
#[derive(Debug, Clone)]
pub struct IntervalEncoder {
    low: f64,
    high: f64,
    bits: BitVec<u8, Msb0>,
}

impl Default for IntervalEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalEncoder {
    pub fn new() -> Self {
        IntervalEncoder {
            low: 0.0,
            high: 1.0,
            bits: BitVec::new(),
        }
    }

    /// Bits emitted so far.
    pub fn bits(&self) -> &BitSlice<u8, Msb0> {
        &self.bits
    }

    /// Narrows the interval to `entry` and renormalizes.
    pub fn push(&mut self, entry: &CumulativeEntry) {
        let range = self.high - self.low;
        self.high = self.low + range * entry.high;
        self.low = self.low + range * entry.low;

        // A collapsed interval would rescale forever.
        while self.high > self.low {
            if self.high <= HALF {
                self.bits.push(false);
                self.low *= 2.0;
                self.high *= 2.0;
            } else if self.low >= HALF {
                self.bits.push(true);
                self.low = (self.low - HALF) * 2.0;
                self.high = (self.high - HALF) * 2.0;
            } else {
                break;
            }
        }
        trace!(
            "arithmetic: interval [{}, {}) after {} bits",
            self.low,
            self.high,
            self.bits.len()
        );
    }

    /// Emits the terminating bit and returns the bit sequence.
    ///
    /// After renormalization the interval straddles the midpoint, so a trailing
    /// 1 selects a value inside it.
    pub fn finish(mut self) -> BitVec<u8, Msb0> {
        self.bits.push(self.low < HALF);
        self.bits
    }
}

/// Output of [`arithmetic_encode`]: the bit sequence plus the frequencies
/// needed to rebuild the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithmeticEncoded {
    pub bits: BitVec<u8, Msb0>,
    pub frequencies: FrequencyTable,
}

impl ArithmeticEncoded {
    /// Length of the emitted bit sequence.
    pub fn compressed_bits(&self) -> usize {
        self.bits.len()
    }
}

/// Encode pixels in scan order against a cumulative table.
pub fn encode<I>(pixels: I, table: &CumulativeTable) -> Result<BitVec<u8, Msb0>>
where
    I: IntoIterator<Item = Pixel>,
{
    let mut encoder = IntervalEncoder::new();
    for pixel in pixels {
        let entry = table.get(&pixel).ok_or_else(|| {
            Error::MalformedInput(format!("pixel {} is not in the model", pixel))
        })?;
        encoder.push(entry);
    }
    Ok(encoder.finish())
}

/// Reconstructs the fraction `sum(bit_i * 2^-(i+1))`.
pub fn encoded_value(bits: &BitSlice<u8, Msb0>) -> f64 {
    let mut value = 0.0;
    let mut weight = HALF;
    for bit in bits.iter().by_vals() {
        if bit {
            value += weight;
        }
        weight *= HALF;
    }
    value
}

/// A decoded pixel and the scaled value that selected it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedSymbol {
    pub pixel: Pixel,
    pub value: f64,
}

/// Decode `count` pixels from a bit sequence.
///
/// Works on the absolute interval without renormalizing, stopping at the
/// first pixel that cannot be resolved.
pub fn decode(
    bits: &BitSlice<u8, Msb0>,
    table: &CumulativeTable,
    count: usize,
) -> Result<Vec<DecodedSymbol>> {
    let target = encoded_value(bits);
    let mut low = 0.0f64;
    let mut high = 1.0f64;
    let mut decoded = Vec::with_capacity(count);

    for index in 0..count {
        let range = high - low;
        let value = (target - low) / range;
        if !(range > MIN_DECODABLE_RANGE) {
            return Err(Error::SymbolNotFound { index, value });
        }
        let entry = table
            .find(value)
            .ok_or(Error::SymbolNotFound { index, value })?;
        decoded.push(DecodedSymbol {
            pixel: entry.pixel,
            value,
        });
        high = low + range * entry.high;
        low = low + range * entry.low;
    }
    Ok(decoded)
}

/// Re-encodes `decoded` and checks it reproduces `bits` exactly. A mismatch
/// is reported against the first pixel whose bits diverge.
pub fn verify(
    bits: &BitSlice<u8, Msb0>,
    table: &CumulativeTable,
    decoded: &[DecodedSymbol],
) -> Result<()> {
    let mismatch = |index: usize| Error::SymbolNotFound {
        index,
        value: decoded.get(index).map_or(f64::NAN, |s| s.value),
    };

    let mut encoder = IntervalEncoder::new();
    let mut checked = 0;
    for (index, symbol) in decoded.iter().enumerate() {
        let entry = table.get(&symbol.pixel).ok_or_else(|| mismatch(index))?;
        encoder.push(entry);
        let emitted = encoder.bits();
        if emitted.len() > bits.len() || emitted[checked..] != bits[checked..emitted.len()] {
            return Err(mismatch(index));
        }
        checked = emitted.len();
    }

    let last = decoded.len().saturating_sub(1);
    if encoder.finish() != *bits {
        return Err(mismatch(last));
    }
    Ok(())
}

/// Convenience function: builds the model from the image, encodes it, and
/// returns the bit sequence together with the frequencies.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] for an empty image.
///
/// # Example
///
/// ```
/// use pixcodec::compression::arithmetic::{arithmetic_decode, arithmetic_encode};
/// use pixcodec::{Pixel, PixelBuffer};
///
/// let red = Pixel::new(255, 0, 0, 255);
/// let green = Pixel::new(0, 255, 0, 255);
/// let buf = PixelBuffer::from_pixels(3, 1, [red, green, red]).unwrap();
/// let encoded = arithmetic_encode(&buf).unwrap();
/// assert_eq!(arithmetic_decode(&encoded, 3, 1).unwrap(), buf);
/// ```
pub fn arithmetic_encode(buffer: &PixelBuffer) -> Result<ArithmeticEncoded> {
    if buffer.is_empty() {
        return Err(Error::MalformedInput(
            "cannot build an arithmetic model for an empty image".to_string(),
        ));
    }
    let frequencies = FrequencyTable::from_buffer(buffer);
    let table = CumulativeTable::from_frequencies(&frequencies);
    let bits = encode(buffer.pixels(), &table)?;
    debug!(
        "arithmetic: {} symbols, {} bits for {} pixels",
        table.len(),
        bits.len(),
        buffer.pixel_count()
    );
    Ok(ArithmeticEncoded { bits, frequencies })
}

/// Decodes and verifies an encoded image of the given dimensions.
pub fn arithmetic_decode(
    encoded: &ArithmeticEncoded,
    width: usize,
    height: usize,
) -> Result<PixelBuffer> {
    arithmetic_decode_with(encoded, width, height, true)
}

/// Decodes an encoded image, re-encoding the result to check it when
/// `verify_output` is set.
pub fn arithmetic_decode_with(
    encoded: &ArithmeticEncoded,
    width: usize,
    height: usize,
    verify_output: bool,
) -> Result<PixelBuffer> {
    let mut output = PixelBuffer::zeroed(width, height)?;
    let count = output.pixel_count();
    if encoded.frequencies.total() != count {
        return Err(Error::MalformedInput(format!(
            "model counts {} pixels but a {}x{} image has {}",
            encoded.frequencies.total(),
            width,
            height,
            count
        )));
    }
    if count == 0 {
        return Ok(output);
    }

    let table = CumulativeTable::from_frequencies(&encoded.frequencies);
    let decoded = decode(&encoded.bits, &table, count).inspect_err(|err| {
        warn!("arithmetic: decoding stopped: {}", err);
    })?;
    if verify_output {
        verify(&encoded.bits, &table, &decoded).inspect_err(|err| {
            warn!("arithmetic: decoded pixels do not re-encode: {}", err);
        })?;
    }

    for (index, symbol) in decoded.iter().enumerate() {
        output.set_pixel(index, symbol.pixel);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const RED: Pixel = Pixel::new(255, 0, 0, 255);
    const GREEN: Pixel = Pixel::new(0, 255, 0, 255);
    const BLUE: Pixel = Pixel::new(0, 0, 255, 255);
    const WHITE: Pixel = Pixel::new(255, 255, 255, 255);

    fn image(width: usize, height: usize, pixels: &[Pixel]) -> PixelBuffer {
        PixelBuffer::from_pixels(width, height, pixels.iter().copied()).unwrap()
    }

    #[test]
    fn test_cumulative_table_canonical_order() {
        let freq = FrequencyTable::from_pixels([RED, RED, GREEN, BLUE]);
        let table = CumulativeTable::from_frequencies(&freq);
        let order: Vec<Pixel> = table.entries().iter().map(|e| e.pixel).collect();
        assert_eq!(order, vec![BLUE, GREEN, RED]);

        let entries = table.entries();
        assert_relative_eq!(entries[0].low, 0.0);
        assert_relative_eq!(entries[0].high, 0.25);
        assert_relative_eq!(entries[1].low, 0.25);
        assert_relative_eq!(entries[1].high, 0.5);
        assert_relative_eq!(entries[2].low, 0.5);
        assert_eq!(entries[2].high, 1.0);
        for pair in entries.windows(2) {
            assert_eq!(pair[0].high, pair[1].low);
        }
    }

    #[test]
    fn test_find_uses_half_open_intervals() {
        let freq = FrequencyTable::from_pixels([RED, GREEN]);
        let table = CumulativeTable::from_frequencies(&freq);
        assert_eq!(table.find(0.0).unwrap().pixel, GREEN);
        assert_eq!(table.find(0.5).unwrap().pixel, RED);
        assert!(table.find(1.0).is_none());
        assert!(table.find(-0.1).is_none());
        assert!(table.find(f64::NAN).is_none());
    }

    #[test]
    fn test_encoded_value() {
        let bits = bits![u8, Msb0; 1, 0, 1];
        assert_eq!(encoded_value(bits), 0.625);
        assert_eq!(encoded_value(BitSlice::<u8, Msb0>::empty()), 0.0);
    }

    #[test]
    fn test_two_distinct_pixels() {
        // GREEN sorts first: GREEN owns [0, 0.5), RED owns [0.5, 1).
        let buf = image(2, 1, &[RED, GREEN]);
        let encoded = arithmetic_encode(&buf).unwrap();
        assert_eq!(encoded.bits, bitvec![u8, Msb0; 1, 0, 1]);
        assert_eq!(encoded.compressed_bits(), 3);
        assert_eq!(arithmetic_decode(&encoded, 2, 1).unwrap(), buf);
    }

    #[test]
    fn test_non_dyadic_probabilities() {
        let buf = image(3, 1, &[GREEN, RED, GREEN]);
        let encoded = arithmetic_encode(&buf).unwrap();
        // The interval never leaves the middle, so only the terminator is emitted.
        assert_eq!(encoded.bits, bitvec![u8, Msb0; 1]);
        assert_eq!(arithmetic_decode(&encoded, 3, 1).unwrap(), buf);
    }

    #[test]
    fn test_single_pixel_value() {
        let buf = image(3, 3, &[WHITE; 9]);
        let encoded = arithmetic_encode(&buf).unwrap();
        assert_eq!(encoded.compressed_bits(), 1);
        assert_eq!(arithmetic_decode(&encoded, 3, 3).unwrap(), buf);
    }

    #[test]
    fn test_uniform_four_colours_two_bits_each() {
        let palette = [RED, GREEN, BLUE, WHITE];
        let pixels: Vec<Pixel> = (0..16).map(|i| palette[(i * 7 + i / 4) % 4]).collect();
        let buf = image(4, 4, &pixels);
        let freq = FrequencyTable::from_buffer(&buf);
        assert!(palette.iter().all(|p| freq.count(p) == 4));

        let encoded = arithmetic_encode(&buf).unwrap();
        assert_eq!(encoded.compressed_bits(), 33);
        assert_eq!(arithmetic_decode(&encoded, 4, 4).unwrap(), buf);
    }

    #[test]
    fn test_two_colours_one_bit_each() {
        let pixels: Vec<Pixel> = (0..16)
            .map(|i| if ((i ^ (i >> 2)) & 1) == 0 { RED } else { BLUE })
            .collect();
        let buf = image(4, 4, &pixels);
        let freq = FrequencyTable::from_buffer(&buf);
        assert_eq!(freq.count(&RED), 8);
        assert_eq!(freq.count(&BLUE), 8);

        let encoded = arithmetic_encode(&buf).unwrap();
        assert_eq!(encoded.compressed_bits(), 17);
        assert_eq!(arithmetic_decode(&encoded, 4, 4).unwrap(), buf);
    }

    #[test]
    fn test_dominant_colour_large_image() {
        let mut pixels = vec![WHITE; 4096];
        pixels[1234] = RED;
        let buf = image(64, 64, &pixels);
        let encoded = arithmetic_encode(&buf).unwrap();
        assert_eq!(arithmetic_decode(&encoded, 64, 64).unwrap(), buf);
    }

    #[test]
    fn test_large_image_reports_symbol_not_found() {
        let mut rng = StdRng::seed_from_u64(7);
        let palette: Vec<Pixel> = (0..16u8).map(|i| Pixel::new(i * 16, 255 - i, i, 255)).collect();
        let pixels: Vec<Pixel> = (0..4096)
            .map(|_| palette[rng.gen_range(0..palette.len())])
            .collect();
        let buf = image(64, 64, &pixels);
        let encoded = arithmetic_encode(&buf).unwrap();
        let err = arithmetic_decode(&encoded, 64, 64).unwrap_err();
        assert!(matches!(err, Error::SymbolNotFound { .. }), "{err:?}");

        let raw = arithmetic_decode_with(&encoded, 64, 64, false).unwrap_err();
        assert!(matches!(raw, Error::SymbolNotFound { .. }), "{raw:?}");
    }

    #[test]
    fn test_rounding_at_the_midpoint_is_caught() {
        // The final interval's low bound should be exactly 0.5 but rounds to
        // just below it, so the raw decoder picks the wrong last pixel.
        let buf = image(3, 2, &[BLUE, GREEN, GREEN, BLUE, GREEN, RED]);
        let encoded = arithmetic_encode(&buf).unwrap();
        let raw = arithmetic_decode_with(&encoded, 3, 2, false).unwrap();
        assert_eq!(raw.pixel(5), Some(GREEN));

        let err = arithmetic_decode(&encoded, 3, 2).unwrap_err();
        assert!(matches!(err, Error::SymbolNotFound { index: 5, .. }), "{err:?}");
    }

    #[test]
    fn test_small_images_never_silently_wrong() {
        let mut rng = StdRng::seed_from_u64(42);
        let palette = [RED, GREEN, BLUE, WHITE];
        for _ in 0..200 {
            let width = rng.gen_range(1..=4);
            let height = rng.gen_range(1..=4);
            let colours = rng.gen_range(1..=palette.len());
            let pixels: Vec<Pixel> = (0..width * height)
                .map(|_| palette[rng.gen_range(0..colours)])
                .collect();
            let buf = image(width, height, &pixels);
            let encoded = arithmetic_encode(&buf).unwrap();
            match arithmetic_decode(&encoded, width, height) {
                Ok(decoded) => assert_eq!(decoded, buf),
                Err(err) => assert!(matches!(err, Error::SymbolNotFound { .. }), "{err:?}"),
            }
        }
    }

    #[test]
    fn test_verification_rejects_foreign_stream() {
        let buf = image(2, 1, &[RED, GREEN]);
        let mut encoded = arithmetic_encode(&buf).unwrap();
        encoded.bits.pop();

        // Without the terminator the value still lands on the right pixels,
        // but the stream is not what the encoder produces.
        assert_eq!(arithmetic_decode_with(&encoded, 2, 1, false).unwrap(), buf);
        let err = arithmetic_decode(&encoded, 2, 1).unwrap_err();
        assert_eq!(
            err,
            Error::SymbolNotFound {
                index: 1,
                value: 0.0
            }
        );
    }

    #[test]
    fn test_collapsed_interval_terminates() {
        // RED owns [0.25, 0.75): the interval keeps straddling 0.5 and halves
        // every pixel until it collapses.
        let freq = FrequencyTable::from_pixels([GREEN, RED, RED, WHITE]);
        let table = CumulativeTable::from_frequencies(&freq);
        let entry = table.get(&RED).unwrap();
        assert_relative_eq!(entry.low, 0.25);
        assert_relative_eq!(entry.high, 0.75);

        let bits = encode(std::iter::repeat(RED).take(200), &table).unwrap();
        assert!(!bits.is_empty());
        let err = decode(&bits, &table, 200).unwrap_err();
        assert!(matches!(err, Error::SymbolNotFound { .. }));
    }

    #[test]
    fn test_model_size_mismatch() {
        let buf = image(2, 1, &[RED, GREEN]);
        let encoded = arithmetic_encode(&buf).unwrap();
        assert!(matches!(
            arithmetic_decode(&encoded, 2, 2),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_empty_image_rejected() {
        let buf = PixelBuffer::zeroed(0, 3).unwrap();
        assert!(matches!(
            arithmetic_encode(&buf),
            Err(Error::MalformedInput(_))
        ));
    }
}
