//! Number pool arithmetic and sampling.
//!
//! Everything here is a pure function of its arguments plus the random
//! source handed in by the caller. An inverted range (`start > end`) is a
//! caller bug, but it is treated as an empty pool rather than an error so
//! the draw pipeline stays total.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Number of integers in `[start, end]`, or zero for an inverted range.
pub fn total_range(start: i32, end: i32) -> i64 {
    (end as i64 - start as i64 + 1).max(0)
}

/// All integers in `[start, end]` not present in `excluded`, ascending.
pub fn available_numbers(start: i32, end: i32, excluded: &[i32]) -> Vec<i32> {
    if start > end {
        return Vec::new();
    }

    if excluded.is_empty() {
        return (start..=end).collect();
    }

    let excluded: HashSet<i32> = excluded.iter().copied().collect();
    (start..=end).filter(|n| !excluded.contains(n)).collect()
}

/// Uniformly pick one number from the available pool, `None` when it is empty.
pub fn sample_one<R: Rng + ?Sized>(
    rng: &mut R,
    start: i32,
    end: i32,
    excluded: &[i32],
) -> Option<i32> {
    if start > end {
        return None;
    }

    // nothing to filter, so the full range is the pool
    if excluded.is_empty() {
        return Some(rng.gen_range(start..=end));
    }

    available_numbers(start, end, excluded)
        .choose(rng)
        .copied()
}

/// Draw up to `count` numbers.
///
/// Without duplicates every draw is removed from the pool before the next
/// one, on top of `excluded`. With duplicates every draw sees the same pool.
/// Returns fewer than `count` numbers when the pool runs dry; callers must
/// check the length.
pub fn sample_many<R: Rng + ?Sized>(
    rng: &mut R,
    start: i32,
    end: i32,
    count: usize,
    excluded: &[i32],
    allow_duplicates: bool,
) -> Vec<i32> {
    let mut pool = available_numbers(start, end, excluded);
    let mut drawn = Vec::with_capacity(count.min(pool.len().max(1)));

    for _ in 0..count {
        if pool.is_empty() {
            break;
        }

        let idx = rng.gen_range(0..pool.len());
        if allow_duplicates {
            drawn.push(pool[idx]);
        } else {
            drawn.push(pool.swap_remove(idx));
        }
    }

    drawn
}

/// How many numbers a draw can still pick from. Counted from the range
/// size and the exclusions, so it never materializes the pool.
pub fn remaining_count(start: i32, end: i32, excluded: &[i32], allow_duplicates: bool) -> i64 {
    let total = total_range(start, end);
    if allow_duplicates || total == 0 {
        return total;
    }

    let inside: HashSet<i32> = excluded
        .iter()
        .copied()
        .filter(|n| (start..=end).contains(n))
        .collect();
    total - inside.len() as i64
}

pub fn can_draw(
    start: i32,
    end: i32,
    draw_count: usize,
    excluded: &[i32],
    allow_duplicates: bool,
) -> bool {
    remaining_count(start, end, excluded, allow_duplicates) >= draw_count as i64
}
