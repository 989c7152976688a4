/// Inventory management for rooms and characters
use std::collections::BTreeMap;

use super::errors::{AdventureError, AdventureResult};
use super::types::Item;

// ============================================================================
// Slots
// ============================================================================

/// One item bound to a quantity inside an inventory. Quantity is never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSlot {
    item: Item,
    quantity: u32,
}

impl ItemSlot {
    fn new(item: Item, quantity: u32) -> Self {
        Self { item, quantity }
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

// ============================================================================
// Inventory Operations
// ============================================================================

/// Item slots keyed by item id.
///
/// Units of a non-stackable item share the single slot of their id; the
/// slot quantity counts units, so transfers always conserve quantity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    slots: BTreeMap<String, ItemSlot>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of `item`, returning the slot's new quantity.
    pub fn add_item(&mut self, item: &Item, quantity: u32) -> AdventureResult<u32> {
        if quantity == 0 {
            return Err(AdventureError::InvalidQuantity);
        }
        if !item.carriable {
            return Err(AdventureError::NotCarriable(item.id.clone()));
        }
        let total = self.total_after(&item.id, quantity)?;

        let slot = self
            .slots
            .entry(item.id.clone())
            .or_insert_with(|| ItemSlot::new(item.clone(), 0));
        slot.quantity = total;
        Ok(total)
    }

    /// Quantity `item_id` would have after adding `quantity` units.
    pub fn total_after(&self, item_id: &str, quantity: u32) -> AdventureResult<u32> {
        self.quantity_of(item_id)
            .checked_add(quantity)
            .ok_or_else(|| AdventureError::QuantityOverflow(item_id.to_string()))
    }

    /// Remove `quantity` units of `item_id`. Nothing changes on failure.
    pub fn remove_item(&mut self, item_id: &str, quantity: u32) -> AdventureResult<Item> {
        if quantity == 0 {
            return Err(AdventureError::InvalidQuantity);
        }
        let slot = self
            .slots
            .get_mut(item_id)
            .ok_or_else(|| AdventureError::ItemNotFound(item_id.to_string()))?;

        if quantity > slot.quantity {
            return Err(AdventureError::InsufficientQuantity {
                item_id: item_id.to_string(),
                available: slot.quantity,
                requested: quantity,
            });
        }

        if quantity == slot.quantity {
            let slot = self
                .slots
                .remove(item_id)
                .ok_or_else(|| AdventureError::ItemNotFound(item_id.to_string()))?;
            Ok(slot.item)
        } else {
            slot.quantity -= quantity;
            Ok(slot.item.clone())
        }
    }

    /// Move every slot of `other` into this inventory, leaving `other` empty.
    /// When any merged slot would overflow, neither inventory changes.
    pub fn import_inventory(&mut self, other: &mut Inventory) -> AdventureResult<()> {
        for (id, incoming) in &other.slots {
            self.total_after(id, incoming.quantity)?;
        }
        for (id, incoming) in std::mem::take(&mut other.slots) {
            match self.slots.get_mut(&id) {
                Some(slot) => slot.quantity += incoming.quantity,
                None => {
                    self.slots.insert(id, incoming);
                }
            }
        }
        Ok(())
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.slots.contains_key(item_id)
    }

    pub fn item_slot(&self, item_id: &str) -> Option<&ItemSlot> {
        self.slots.get(item_id)
    }

    /// Quantity held for `item_id`, zero when absent.
    pub fn quantity_of(&self, item_id: &str) -> u32 {
        self.slots.get(item_id).map(|s| s.quantity).unwrap_or(0)
    }

    /// Number of occupied slots.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots in item id order.
    pub fn slots(&self) -> impl Iterator<Item = &ItemSlot> {
        self.slots.values()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adventure::types::ItemType;

    fn test_item(id: &str, carriable: bool, stackable: bool) -> Item {
        Item::new(id, id, ItemType::Misc, "short", "long")
            .carriable(carriable)
            .stackable(stackable)
    }

    #[test]
    fn add_item_creates_then_stacks() {
        let mut inv = Inventory::new();
        let coin = test_item("coin", true, true);

        assert_eq!(inv.add_item(&coin, 3).unwrap(), 3);
        assert_eq!(inv.add_item(&coin, 2).unwrap(), 5);
        assert_eq!(inv.size(), 1);
        assert_eq!(inv.item_slot("coin").unwrap().quantity(), 5);
    }

    #[test]
    fn add_non_carriable_leaves_inventory_unchanged() {
        let mut inv = Inventory::new();
        inv.add_item(&test_item("coin", true, true), 1).unwrap();
        let before = inv.clone();

        let err = inv.add_item(&test_item("statue", false, false), 1).unwrap_err();
        assert!(matches!(err, AdventureError::NotCarriable(id) if id == "statue"));
        assert_eq!(inv, before);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut inv = Inventory::new();
        let coin = test_item("coin", true, true);
        assert!(matches!(inv.add_item(&coin, 0), Err(AdventureError::InvalidQuantity)));
        inv.add_item(&coin, 1).unwrap();
        assert!(matches!(inv.remove_item("coin", 0), Err(AdventureError::InvalidQuantity)));
        assert_eq!(inv.quantity_of("coin"), 1);
    }

    #[test]
    fn non_stackable_units_share_one_slot() {
        let mut inv = Inventory::new();
        let sword = test_item("sword", true, false);
        inv.add_item(&sword, 1).unwrap();
        inv.add_item(&sword, 1).unwrap();
        assert_eq!(inv.size(), 1);
        assert_eq!(inv.quantity_of("sword"), 2);
    }

    #[test]
    fn remove_partial_and_exact() {
        let mut inv = Inventory::new();
        let arrow = test_item("arrow", true, true);
        inv.add_item(&arrow, 10).unwrap();

        let item = inv.remove_item("arrow", 3).unwrap();
        assert_eq!(item.id, "arrow");
        assert_eq!(inv.quantity_of("arrow"), 7);

        inv.remove_item("arrow", 7).unwrap();
        assert!(!inv.contains_item("arrow"));
        assert!(inv.is_empty());
    }

    #[test]
    fn remove_too_many_fails_without_change() {
        let mut inv = Inventory::new();
        inv.add_item(&test_item("gem", true, true), 5).unwrap();

        match inv.remove_item("gem", 6) {
            Err(AdventureError::InsufficientQuantity {
                item_id,
                available,
                requested,
            }) => {
                assert_eq!(item_id, "gem");
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("expected InsufficientQuantity, got {:?}", other),
        }
        assert_eq!(inv.quantity_of("gem"), 5);
    }

    #[test]
    fn remove_missing_item() {
        let mut inv = Inventory::new();
        assert!(matches!(
            inv.remove_item("ghost", 1),
            Err(AdventureError::ItemNotFound(id)) if id == "ghost"
        ));
    }

    #[test]
    fn add_then_remove_same_quantity_restores_inventory() {
        let mut inv = Inventory::new();
        inv.add_item(&test_item("rope", true, false), 1).unwrap();
        let before = inv.clone();

        for (item, qty) in [
            (test_item("coin", true, true), 4),
            (test_item("rope", true, false), 2),
            (test_item("torch", true, false), 1),
        ] {
            inv.add_item(&item, qty).unwrap();
            inv.remove_item(&item.id, qty).unwrap();
            assert_eq!(inv, before);
        }
    }

    #[test]
    fn import_conserves_quantities_and_empties_source() {
        let mut a = Inventory::new();
        let mut b = Inventory::new();
        let coin = test_item("coin", true, true);
        let key = test_item("key", true, false);
        let map = test_item("map", true, false);

        a.add_item(&coin, 2).unwrap();
        a.add_item(&key, 1).unwrap();
        b.add_item(&coin, 5).unwrap();
        b.add_item(&key, 1).unwrap();
        b.add_item(&map, 1).unwrap();

        a.import_inventory(&mut b).unwrap();

        assert!(b.is_empty());
        assert_eq!(a.quantity_of("coin"), 7);
        assert_eq!(a.quantity_of("key"), 2);
        assert_eq!(a.quantity_of("map"), 1);
        assert_eq!(a.size(), 3);
    }

    #[test]
    fn add_past_u32_max_fails_without_change() {
        let mut inv = Inventory::new();
        let coin = test_item("coin", true, true);
        inv.add_item(&coin, u32::MAX).unwrap();
        let before = inv.clone();

        assert!(matches!(
            inv.add_item(&coin, 1),
            Err(AdventureError::QuantityOverflow(id)) if id == "coin"
        ));
        assert_eq!(inv, before);
        assert_eq!(inv.quantity_of("coin"), u32::MAX);
    }

    #[test]
    fn overflowing_import_leaves_both_sides_intact() {
        let mut a = Inventory::new();
        let mut b = Inventory::new();
        let coin = test_item("coin", true, true);
        let map = test_item("map", true, false);

        a.add_item(&coin, u32::MAX - 2).unwrap();
        b.add_item(&map, 1).unwrap();
        b.add_item(&coin, 3).unwrap();
        let (a_before, b_before) = (a.clone(), b.clone());

        assert!(matches!(
            a.import_inventory(&mut b),
            Err(AdventureError::QuantityOverflow(id)) if id == "coin"
        ));
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }
}
