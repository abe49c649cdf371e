use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use bitvec::prelude::*;
use log::{debug, warn};

use crate::compression::frequency::FrequencyTable;
use crate::compression::Result;
use crate::error::Error;
use crate::pixel::{Pixel, PixelBuffer};

/// Represents a node in the Huffman tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffmanNode {
    /// A leaf node contains a pixel and its frequency.
    Leaf { pixel: Pixel, freq: usize },
    /// An internal node with left and right children and combined frequency.
    Internal {
        freq: usize,
        left: Box<HuffmanNode>,
        right: Box<HuffmanNode>,
    },
}

impl HuffmanNode {
    /// Returns the frequency of the node.
    pub fn freq(&self) -> usize {
        match self {
            HuffmanNode::Leaf { freq, .. } => *freq,
            HuffmanNode::Internal { freq, .. } => *freq,
        }
    }

    /// Number of leaves (distinct pixels) below this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            HuffmanNode::Leaf { .. } => 1,
            HuffmanNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Length of the longest root-to-leaf path; a lone leaf has depth 0.
    pub fn depth(&self) -> usize {
        match self {
            HuffmanNode::Leaf { .. } => 0,
            HuffmanNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// A node queued for merging. Lower frequency has higher priority; among
/// equal frequencies the lower sequence number (the older node) wins.
#[derive(Debug)]
struct Pending {
    seq: usize,
    node: HuffmanNode,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .node
            .freq()
            .cmp(&self.node.freq())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Build the Huffman tree given a frequency table.
///
/// Leaves are numbered in the table's first-seen order and every merged node
/// takes the next number, so ties resolve to the node queued earliest. The
/// first node removed becomes the left child. Returns `None` if the table is
/// empty; a single distinct pixel yields a lone leaf.
pub fn build_huffman_tree(freq_table: &FrequencyTable) -> Option<HuffmanNode> {
    let mut heap: BinaryHeap<Pending> = freq_table
        .iter()
        .enumerate()
        .map(|(seq, (pixel, freq))| Pending {
            seq,
            node: HuffmanNode::Leaf { pixel, freq },
        })
        .collect();
    let mut next_seq = heap.len();

    while heap.len() > 1 {
        let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
            break;
        };
        let internal = HuffmanNode::Internal {
            freq: left.node.freq() + right.node.freq(),
            left: Box::new(left.node),
            right: Box::new(right.node),
        };
        heap.push(Pending {
            seq: next_seq,
            node: internal,
        });
        next_seq += 1;
    }
    heap.pop().map(|pending| pending.node)
}

/// Maps each pixel to its prefix code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: HashMap<Pixel, BitVec<u8, Msb0>>,
}

impl CodeTable {
    pub fn get(&self, pixel: &Pixel) -> Option<&BitSlice<u8, Msb0>> {
        self.codes.get(pixel).map(|code| code.as_bitslice())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pixel, &BitSlice<u8, Msb0>)> {
        self.codes.iter().map(|(p, c)| (p, c.as_bitslice()))
    }
}

/// Recursively build the code table mapping pixels to their Huffman codes.
///
/// If the tree consists of a single leaf (i.e. one unique pixel), the code `0`
/// is assigned.
pub fn build_code_table(node: &HuffmanNode) -> CodeTable {
    let mut table = CodeTable::default();
    build_code_table_helper(node, BitVec::new(), &mut table);
    table
}

fn build_code_table_helper(node: &HuffmanNode, prefix: BitVec<u8, Msb0>, table: &mut CodeTable) {
    match node {
        HuffmanNode::Leaf { pixel, .. } => {
            let code = if prefix.is_empty() {
                bitvec![u8, Msb0; 0]
            } else {
                prefix
            };
            table.codes.insert(*pixel, code);
        }
        HuffmanNode::Internal { left, right, .. } => {
            let mut left_prefix = prefix.clone();
            left_prefix.push(false);
            build_code_table_helper(left, left_prefix, table);
            let mut right_prefix = prefix;
            right_prefix.push(true);
            build_code_table_helper(right, right_prefix, table);
        }
    }
}

/// Output of [`huffman_encode`]: the concatenated codes plus the tree needed
/// to decode them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanEncoded {
    pub bits: BitVec<u8, Msb0>,
    pub tree: HuffmanNode,
}

impl HuffmanEncoded {
    /// Length of the code sequence in bits.
    pub fn compressed_bits(&self) -> usize {
        self.bits.len()
    }
}

/// Encode pixels in scan order using the provided code table.
pub fn encode<I>(pixels: I, code_table: &CodeTable) -> Result<BitVec<u8, Msb0>>
where
    I: IntoIterator<Item = Pixel>,
{
    let mut bits = BitVec::new();
    for pixel in pixels {
        let code = code_table.get(&pixel).ok_or_else(|| {
            Error::MalformedInput(format!("pixel {} has no Huffman code", pixel))
        })?;
        bits.extend_from_bitslice(code);
    }
    Ok(bits)
}

/// Decode a bit sequence using the Huffman tree, writing pixels into `output`
/// in scan order. Stops once `output` is full or the bits run out, and returns
/// the number of pixels written.
pub fn decode(bits: &BitSlice<u8, Msb0>, tree: &HuffmanNode, output: &mut PixelBuffer) -> usize {
    let capacity = output.pixel_count();
    let mut written = 0;

    // Special case: if tree is a leaf, each bit represents one occurrence
    if let HuffmanNode::Leaf { pixel, .. } = tree {
        for _ in bits.iter().take(capacity) {
            output.set_pixel(written, *pixel);
            written += 1;
        }
        return written;
    }

    let mut current = tree;
    let mut consumed = 0;
    for bit in bits.iter().by_vals() {
        if written >= capacity {
            break;
        }
        consumed += 1;
        if let HuffmanNode::Internal { left, right, .. } = current {
            current = if bit { right.as_ref() } else { left.as_ref() };
            if let HuffmanNode::Leaf { pixel, .. } = current {
                output.set_pixel(written, *pixel);
                written += 1;
                current = tree;
            }
        }
    }

    if !std::ptr::eq(current, tree) {
        warn!("huffman: ignoring incomplete trailing code");
    }
    if consumed < bits.len() {
        debug!("huffman: {} bits left after filling the image", bits.len() - consumed);
    }
    written
}

/// Convenience function: builds the Huffman tree from the image, encodes it,
/// and returns the bit sequence together with the tree.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] for an empty image.
///
/// # Example
///
/// ```
/// use pixcodec::compression::huffman::{huffman_decode, huffman_encode};
/// use pixcodec::{Pixel, PixelBuffer};
///
/// let buf = PixelBuffer::from_pixels(
///     2,
///     1,
///     [Pixel::new(255, 0, 0, 255), Pixel::new(0, 255, 0, 255)],
/// )
/// .unwrap();
/// let encoded = huffman_encode(&buf).unwrap();
/// assert_eq!(encoded.bits.len(), 2);
/// assert_eq!(huffman_decode(&encoded, 2, 1).unwrap(), buf);
/// ```
pub fn huffman_encode(buffer: &PixelBuffer) -> Result<HuffmanEncoded> {
    let freq_table = FrequencyTable::from_buffer(buffer);
    let tree = build_huffman_tree(&freq_table).ok_or_else(|| {
        Error::MalformedInput("cannot build a Huffman tree for an empty image".to_string())
    })?;
    let code_table = build_code_table(&tree);
    let bits = encode(buffer.pixels(), &code_table)?;
    debug!(
        "huffman: {} symbols, tree depth {}, {} bits for {} pixels",
        tree.leaf_count(),
        tree.depth(),
        bits.len(),
        buffer.pixel_count()
    );
    Ok(HuffmanEncoded { bits, tree })
}

/// Convenience function: decodes an encoded image of the given dimensions.
/// Pixels the bit sequence does not reach stay zero.
pub fn huffman_decode(encoded: &HuffmanEncoded, width: usize, height: usize) -> Result<PixelBuffer> {
    let mut output = PixelBuffer::zeroed(width, height)?;
    let written = decode(&encoded.bits, &encoded.tree, &mut output);
    if written < output.pixel_count() {
        warn!(
            "huffman: bits decoded to {} of {} pixels, remainder left zeroed",
            written,
            output.pixel_count()
        );
    }
    Ok(output)
}
