//! Slot registry: free-slot counter and the authorized-ID table.
//!
//! Single source of truth for occupancy and authorization. Between two state
//! handler executions `0 <= free_slots <= NO_OF_SLOTS` always holds.

use crate::config::{NO_OF_SLOTS, USERS_COUNT};

/// Result of looking an identifier up in the authorized table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdCheck {
    Found,
    NotFound,
}

#[derive(Debug)]
pub struct SlotRegistry {
    free_slots: u8,
    authorized: [u8; USERS_COUNT],
    enrolled: bool,
}

impl SlotRegistry {
    /// Empty lot, no IDs enrolled yet.
    pub const fn new() -> Self {
        Self {
            free_slots: NO_OF_SLOTS,
            authorized: [0; USERS_COUNT],
            enrolled: false,
        }
    }

    /// Registry with some slots already taken, clamped to the lot size.
    pub fn with_free_slots(free_slots: u8) -> Self {
        Self {
            free_slots: free_slots.min(NO_OF_SLOTS),
            ..Self::new()
        }
    }

    pub fn free_slots(&self) -> u8 {
        self.free_slots
    }

    pub fn capacity(&self) -> u8 {
        NO_OF_SLOTS
    }

    pub fn is_full(&self) -> bool {
        self.free_slots == 0
    }

    /// No vehicle is parked.
    pub fn is_vacant(&self) -> bool {
        self.free_slots == NO_OF_SLOTS
    }

    /// Stores the enrollment result. Duplicates are kept as entered.
    pub fn enroll(&mut self, ids: [u8; USERS_COUNT]) {
        self.authorized = ids;
        self.enrolled = true;
    }

    pub fn authorized_ids(&self) -> Option<&[u8; USERS_COUNT]> {
        self.enrolled.then_some(&self.authorized)
    }

    /// Linear scan of the authorized table, first match wins.
    pub fn check_id(&self, id: u8) -> IdCheck {
        if self.enrolled && self.authorized.iter().any(|&known| known == id) {
            IdCheck::Found
        } else {
            IdCheck::NotFound
        }
    }

    /// A vehicle entered. Only reachable with free slots left.
    pub fn occupy(&mut self) {
        debug_assert!(self.free_slots > 0);
        self.free_slots = self.free_slots.saturating_sub(1);
    }

    /// A vehicle left. Only reachable with at least one vehicle parked.
    pub fn release(&mut self) {
        debug_assert!(self.free_slots < NO_OF_SLOTS);
        self.free_slots = (self.free_slots + 1).min(NO_OF_SLOTS);
    }
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_vacant() {
        let registry = SlotRegistry::new();
        assert_eq!(registry.free_slots(), NO_OF_SLOTS);
        assert!(registry.is_vacant());
        assert!(!registry.is_full());
        assert!(registry.authorized_ids().is_none());
    }

    #[test]
    fn test_check_id_before_enrollment() {
        let registry = SlotRegistry::new();
        // The zeroed table must not authorize ID 0
        assert_eq!(registry.check_id(0), IdCheck::NotFound);
    }

    #[test]
    fn test_check_id_matches_enrolled_set() {
        let mut registry = SlotRegistry::new();
        registry.enroll([1, 2, 3]);

        for id in [1, 2, 3] {
            assert_eq!(registry.check_id(id), IdCheck::Found);
        }
        for id in [0, 4, 9, b'F', 255] {
            assert_eq!(registry.check_id(id), IdCheck::NotFound);
        }
    }

    #[test]
    fn test_check_id_is_idempotent() {
        let mut registry = SlotRegistry::new();
        registry.enroll([7, 8, 9]);

        assert_eq!(registry.check_id(8), IdCheck::Found);
        assert_eq!(registry.check_id(8), IdCheck::Found);
        assert_eq!(registry.authorized_ids(), Some(&[7, 8, 9]));
    }

    #[test]
    fn test_duplicate_ids_are_accepted() {
        let mut registry = SlotRegistry::new();
        registry.enroll([5, 5, 6]);

        assert_eq!(registry.check_id(5), IdCheck::Found);
        assert_eq!(registry.check_id(6), IdCheck::Found);
    }

    #[test]
    fn test_occupy_until_full() {
        let mut registry = SlotRegistry::new();
        for expected in (0..NO_OF_SLOTS).rev() {
            registry.occupy();
            assert_eq!(registry.free_slots(), expected);
        }
        assert!(registry.is_full());
    }

    #[test]
    fn test_release_from_full() {
        let mut registry = SlotRegistry::with_free_slots(0);
        registry.release();
        assert_eq!(registry.free_slots(), 1);
        assert!(!registry.is_full());
    }

    #[test]
    fn test_with_free_slots_clamps_to_capacity() {
        let registry = SlotRegistry::with_free_slots(NO_OF_SLOTS + 5);
        assert_eq!(registry.free_slots(), registry.capacity());
    }
}
