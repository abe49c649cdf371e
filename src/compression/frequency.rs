use indexmap::IndexMap;

use crate::pixel::{Pixel, PixelBuffer};

/// Occurrence counts of each distinct pixel in an image.
///
/// Iteration follows first-seen order, which the Huffman builder relies on to
/// break frequency ties deterministically. Consumers that need the canonical
/// pixel order use [`FrequencyTable::sorted`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: IndexMap<Pixel, usize>,
    total: usize,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts every pixel of `buffer`.
    pub fn from_buffer(buffer: &PixelBuffer) -> Self {
        Self::from_pixels(buffer.pixels())
    }

    /// Counts a sequence of pixels.
    pub fn from_pixels<I>(pixels: I) -> Self
    where
        I: IntoIterator<Item = Pixel>,
    {
        let mut table = Self::new();
        for pixel in pixels {
            table.add(pixel);
        }
        table
    }

    /// Records one more occurrence of `pixel`.
    pub fn add(&mut self, pixel: Pixel) {
        *self.counts.entry(pixel).or_insert(0) += 1;
        self.total += 1;
    }

    /// Occurrences of `pixel`, zero if it never appeared.
    pub fn count(&self, pixel: &Pixel) -> usize {
        self.counts.get(pixel).copied().unwrap_or(0)
    }

    /// Number of distinct pixels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of pixels counted.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Iterates `(pixel, count)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (Pixel, usize)> + '_ {
        self.counts.iter().map(|(&pixel, &count)| (pixel, count))
    }

    /// Returns `(pixel, count)` pairs in canonical pixel order.
    pub fn sorted(&self) -> Vec<(Pixel, usize)> {
        let mut entries: Vec<(Pixel, usize)> = self.iter().collect();
        entries.sort_unstable_by_key(|&(pixel, _)| pixel);
        entries
    }
}

impl FromIterator<Pixel> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = Pixel>>(iter: I) -> Self {
        Self::from_pixels(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Pixel = Pixel::new(255, 0, 0, 255);
    const GREEN: Pixel = Pixel::new(0, 255, 0, 255);
    const BLUE: Pixel = Pixel::new(0, 0, 255, 255);

    #[test]
    fn test_counts() {
        let table: FrequencyTable = [RED, GREEN, RED, BLUE, RED].into_iter().collect();
        assert_eq!(table.count(&RED), 3);
        assert_eq!(table.count(&GREEN), 1);
        assert_eq!(table.count(&BLUE), 1);
        assert_eq!(table.count(&Pixel::default()), 0);
        assert_eq!(table.len(), 3);
        assert_eq!(table.total(), 5);
    }

    #[test]
    fn test_first_seen_order() {
        let table = FrequencyTable::from_pixels([GREEN, RED, GREEN, BLUE]);
        let order: Vec<Pixel> = table.iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec![GREEN, RED, BLUE]);
    }

    #[test]
    fn test_sorted_is_canonical() {
        let table = FrequencyTable::from_pixels([RED, GREEN, BLUE]);
        let order: Vec<Pixel> = table.sorted().into_iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec![BLUE, GREEN, RED]);
    }

    #[test]
    fn test_from_buffer() {
        let buffer = PixelBuffer::from_pixels(2, 2, [RED, RED, BLUE, RED]).unwrap();
        let table = FrequencyTable::from_buffer(&buffer);
        assert_eq!(table.count(&RED), 3);
        assert_eq!(table.total(), 4);
    }

    #[test]
    fn test_empty() {
        let table = FrequencyTable::new();
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
        assert!(table.sorted().is_empty());
    }
}
