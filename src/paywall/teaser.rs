//! Daily rotation of which content cards are blurred behind the paywall.
//!
//! The selection depends only on the UTC day, so every screen agrees on the
//! same locked set all day and the set changes at midnight UTC.

use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Indices of locked cards for one day.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockedCards {
    indices: BTreeSet<usize>,
}

impl LockedCards {
    /// Nothing locked (entitled users).
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether the card at `index` is locked.
    pub fn is_locked(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Locked indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Number of locked cards.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no card is locked.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Pick `locked` of `total` cards to lock on `day`.
///
/// `locked` is clamped to `total`.
pub fn locked_cards(total: usize, locked: usize, day: NaiveDate) -> LockedCards {
    let locked = locked.min(total);
    if locked == 0 {
        return LockedCards::none();
    }

    let mut order: Vec<usize> = (0..total).collect();
    let mut rng = DayRng::new(day_seed(day));
    for i in (1..total).rev() {
        let j = rng.next_below(i + 1);
        order.swap(i, j);
    }

    LockedCards {
        indices: order.into_iter().take(locked).collect(),
    }
}

/// 31-multiplier string hash of the `YYYY-MM-DD` key.
fn day_seed(day: NaiveDate) -> u32 {
    day.format("%Y-%m-%d")
        .to_string()
        .bytes()
        .fold(0u32, |hash, b| hash.wrapping_mul(31).wrapping_add(u32::from(b)))
}

/// Linear congruential generator; quality only needs to look shuffled.
struct DayRng(u32);

impl DayRng {
    fn new(seed: u32) -> Self {
        Self(seed)
    }

    fn next_below(&mut self, bound: usize) -> usize {
        self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        ((self.0 >> 16) as usize) % bound
    }
}
