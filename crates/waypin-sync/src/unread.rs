// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side unread counter.
//!
//! A best-effort cache. It is seeded from the authoritative count, bumped
//! once per observed insert, and may be overwritten with a fresh count at
//! any time.
//!
//! Seeding races with the insert feed: an insert counted while the
//! authoritative count is being fetched may not be part of that count.
//! [`UnreadCounter::mark`] and [`UnreadCounter::set_unless_bumped`] let the
//! seeder detect that and fetch again instead of overwriting the bump.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct UnreadCounter {
    value: Arc<watch::Sender<u64>>,
    /// Increments ever applied. Only changed under the watch lock.
    bumps: Arc<AtomicU64>,
}

impl UnreadCounter {
    pub fn new() -> Self {
        let (value, _) = watch::channel(0);
        Self {
            value: Arc::new(value),
            bumps: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn get(&self) -> u64 {
        *self.value.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.value.subscribe()
    }

    /// Overwrite with an authoritative count.
    pub fn set(&self, count: u64) {
        self.value.send_replace(count);
    }

    /// Position in the insert stream, for [`Self::set_unless_bumped`].
    pub fn mark(&self) -> u64 {
        self.bumps.load(Ordering::SeqCst)
    }

    /// Overwrite with `count` only if no increment landed since `mark`.
    pub fn set_unless_bumped(&self, count: u64, mark: u64) -> bool {
        let mut applied = false;
        self.value.send_if_modified(|n| {
            if self.bumps.load(Ordering::SeqCst) != mark {
                return false;
            }
            applied = true;
            let changed = *n != count;
            *n = count;
            changed
        });
        applied
    }

    /// Raise to at least `count`.
    pub fn raise_to(&self, count: u64) {
        self.value.send_if_modified(|n| {
            if *n >= count {
                return false;
            }
            *n = count;
            true
        });
    }

    pub fn increment(&self) {
        self.value.send_modify(|n| {
            self.bumps.fetch_add(1, Ordering::SeqCst);
            *n = n.saturating_add(1);
        });
    }

    pub fn reset(&self) {
        self.set(0);
    }
}

impl Default for UnreadCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_from_seed() {
        let counter = UnreadCounter::new();
        counter.set(2);
        counter.increment();
        assert_eq!(counter.get(), 3);

        counter.reset();
        counter.increment();
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn seed_is_refused_after_a_bump() {
        let counter = UnreadCounter::new();
        let mark = counter.mark();
        counter.increment();
        assert!(!counter.set_unless_bumped(0, mark));
        assert_eq!(counter.get(), 1);

        let mark = counter.mark();
        assert!(counter.set_unless_bumped(4, mark));
        assert_eq!(counter.get(), 4);
    }

    #[test]
    fn raise_never_lowers() {
        let counter = UnreadCounter::new();
        counter.set(3);
        counter.raise_to(2);
        assert_eq!(counter.get(), 3);
        counter.raise_to(5);
        assert_eq!(counter.get(), 5);
    }

    #[test]
    fn clones_share_the_value() {
        let counter = UnreadCounter::new();
        let rx = counter.subscribe();
        counter.clone().increment();
        assert_eq!(*rx.borrow(), 1);
    }
}
