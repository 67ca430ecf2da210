//! Byte-level similarity between two weight files.
//!
//! The estimate is deliberately coarse: a size-derived base score plus half of a
//! weighted block-match rate sampled from the head, the tail and a few random
//! blocks in between. It reacts to incidental serialization padding and is not a
//! structural diff of the tensors.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use util::execution_config::SimilarityOptions;

const HEAD_WEIGHT: f64 = 0.5;
const TAIL_WEIGHT: f64 = 0.3;
const MIDDLE_WEIGHT: f64 = 0.2;
const CONTENT_FACTOR: f64 = 0.5;

/// Component scores for one pair of files. All values are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairScore {
    pub base: f64,
    pub head: f64,
    pub tail: f64,
    pub middle: f64,
    pub weighted: f64,
    pub similarity: f64,
}

impl PairScore {
    /// Score used when either file cannot be read.
    pub fn unreadable() -> Self {
        Self {
            base: 0.0,
            head: 0.0,
            tail: 0.0,
            middle: 0.0,
            weighted: 0.0,
            similarity: 0.0,
        }
    }
}

/// Compares two in-memory weight files.
///
/// Symmetric in its arguments, and deterministic for a given `options.seed`: the
/// middle-sample generator is seeded from the seed and the shorter length.
pub fn compare_bytes(a: &[u8], b: &[u8], options: &SimilarityOptions) -> PairScore {
    let min_size = a.len().min(b.len());
    let max_size = a.len().max(b.len());
    let block = options.block_size.max(1);

    let base = if (max_size - min_size) as f64 > min_size as f64 * options.size_tolerance {
        options.base_different_size
    } else {
        options.base_similar_size
    };

    let head_len = options.head_bytes.min(min_size);
    let head = block_match_percentage(&a[..head_len], &b[..head_len], block);

    let tail_len = options.tail_bytes.min(min_size);
    let tail = block_match_percentage(
        &a[a.len() - tail_len..],
        &b[b.len() - tail_len..],
        block,
    );

    let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(min_size as u64));
    let middle = match middle_block_range(head_len, tail_len, min_size, block) {
        Some((first, last)) if options.middle_samples > 0 => {
            let matches = (0..options.middle_samples)
                .filter(|_| {
                    let offset = rng.gen_range(first..=last) * block;
                    a[offset..offset + block] == b[offset..offset + block]
                })
                .count();
            percentage(matches, options.middle_samples)
        }
        _ => 0.0,
    };

    let weighted = HEAD_WEIGHT * head + TAIL_WEIGHT * tail + MIDDLE_WEIGHT * middle;
    let similarity = (base + CONTENT_FACTOR * weighted).clamp(0.0, 100.0);

    PairScore {
        base,
        head,
        tail,
        middle,
        weighted,
        similarity,
    }
}

/// Percentage of aligned `block`-sized chunks that are identical. A shorter
/// final chunk counts as one block. Empty windows score 0.
fn block_match_percentage(a: &[u8], b: &[u8], block: usize) -> f64 {
    let total = a.len().div_ceil(block);
    let matches = a
        .chunks(block)
        .zip(b.chunks(block))
        .filter(|(x, y)| x == y)
        .count();
    percentage(matches, total)
}

/// Inclusive range of block indices `k` whose block `[k*block, (k+1)*block)`
/// starts at or after the head window and ends at or before the tail window.
fn middle_block_range(
    head_len: usize,
    tail_len: usize,
    min_size: usize,
    block: usize,
) -> Option<(usize, usize)> {
    let tail_start = min_size.checked_sub(tail_len)?;
    let last_end = tail_start.checked_sub(block)?;
    let first = head_len.div_ceil(block);
    let last = last_end / block;
    (first <= last).then_some((first, last))
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}
