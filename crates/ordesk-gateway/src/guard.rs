// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Duplicate-checkout guard.
//!
//! Rejects a second checkout of the same (brand, package, quantity) line
//! while an earlier one is still inside the window. A checkout that fails
//! releases its keys so the caller can retry immediately.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ordesk_core::{NewOrder, OrdeskError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuardKey {
    pub brand_id: String,
    pub package_id: String,
    pub quantity: u32,
}

impl From<&NewOrder> for GuardKey {
    fn from(order: &NewOrder) -> Self {
        Self {
            brand_id: order.brand_id.clone(),
            package_id: order.package_id.clone(),
            quantity: order.quantity,
        }
    }
}

#[derive(Debug)]
pub struct DuplicateGuard {
    seen: DashMap<GuardKey, Instant>,
    window: Duration,
}

impl DuplicateGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            seen: DashMap::new(),
            window,
        }
    }

    /// Claim every distinct line in `items`. All or nothing: on conflict no
    /// key stays claimed by this call.
    pub fn acquire(&self, items: &[NewOrder]) -> Result<Vec<GuardKey>, OrdeskError> {
        if self.window.is_zero() {
            return Ok(Vec::new());
        }
        self.purge_expired();

        let now = Instant::now();
        let mut claimed = Vec::new();
        let mut distinct = HashSet::new();
        for key in items.iter().map(GuardKey::from) {
            if !distinct.insert(key.clone()) {
                continue;
            }
            let conflict = match self.seen.entry(key.clone()) {
                Entry::Occupied(mut slot) => {
                    if now.duration_since(*slot.get()) < self.window {
                        true
                    } else {
                        slot.insert(now);
                        false
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(now);
                    false
                }
            };
            if conflict {
                self.release(&claimed);
                return Err(OrdeskError::DuplicateOrder {
                    brand_id: key.brand_id,
                    package_id: key.package_id,
                });
            }
            claimed.push(key);
        }
        Ok(claimed)
    }

    /// Forget keys claimed by a checkout that did not commit.
    pub fn release(&self, keys: &[GuardKey]) {
        for key in keys {
            self.seen.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn purge_expired(&self) {
        let window = self.window;
        self.seen.retain(|_, at| at.elapsed() < window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(brand: &str, package: &str, quantity: u32) -> NewOrder {
        NewOrder {
            package_id: package.into(),
            brand_id: brand.into(),
            creator_id: "creator-1".into(),
            quantity,
            total_amount: 100,
            currency: "USD".into(),
        }
    }

    #[test]
    fn second_identical_checkout_is_rejected() {
        let guard = DuplicateGuard::new(Duration::from_secs(60));
        guard.acquire(&[line("b1", "p1", 1)]).unwrap();

        let err = guard.acquire(&[line("b1", "p1", 1)]).unwrap_err();
        assert!(matches!(err, OrdeskError::DuplicateOrder { .. }));

        guard.acquire(&[line("b1", "p1", 2)]).unwrap();
        guard.acquire(&[line("b2", "p1", 1)]).unwrap();
    }

    #[test]
    fn conflict_releases_keys_claimed_in_the_same_call() {
        let guard = DuplicateGuard::new(Duration::from_secs(60));
        guard.acquire(&[line("b1", "p2", 1)]).unwrap();

        assert!(guard
            .acquire(&[line("b1", "p1", 1), line("b1", "p2", 1)])
            .is_err());
        guard.acquire(&[line("b1", "p1", 1)]).unwrap();
    }

    #[test]
    fn released_keys_can_be_claimed_again() {
        let guard = DuplicateGuard::new(Duration::from_secs(60));
        let keys = guard.acquire(&[line("b1", "p1", 1)]).unwrap();
        guard.release(&keys);
        assert!(guard.is_empty());
        guard.acquire(&[line("b1", "p1", 1)]).unwrap();
    }

    #[test]
    fn repeated_line_in_one_cart_is_claimed_once() {
        let guard = DuplicateGuard::new(Duration::from_secs(60));
        let keys = guard
            .acquire(&[line("b1", "p1", 1), line("b1", "p1", 1)])
            .unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn expired_entries_do_not_block() {
        let guard = DuplicateGuard::new(Duration::from_millis(20));
        guard.acquire(&[line("b1", "p1", 1)]).unwrap();
        std::thread::sleep(Duration::from_millis(40));
        guard.acquire(&[line("b1", "p1", 1)]).unwrap();
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn zero_window_disables_the_guard() {
        let guard = DuplicateGuard::new(Duration::ZERO);
        guard.acquire(&[line("b1", "p1", 1)]).unwrap();
        guard.acquire(&[line("b1", "p1", 1)]).unwrap();
    }
}
