// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The open-addressed hash table backing user-facing `table` values, the
//! symbol intern table, and environments (through prototype chaining).
//!
//! Per the specification's component C, this is linear-probed, sized to a
//! power of two, and grown by doubling whenever the load factor would exceed
//! 0.7. A single implementation serves all three roles; `symbols.rs` and the
//! evaluator's environment lookups are thin callers on top of it.

use crate::value::Value;

const INITIAL_CAPACITY: usize = 8;
const MAX_LOAD_FACTOR_NUM: usize = 7;
const MAX_LOAD_FACTOR_DEN: usize = 10;

/// A single slot in the open-addressed backing array.
#[derive(Clone, Copy, Debug, Default)]
enum Slot {
    #[default]
    Empty,
    /// A key removed after having occupied this slot. Probing must continue
    /// through tombstones; insertion may reuse them.
    Tombstone,
    Occupied(Value, Value),
}

/// An open-addressed table. `prototype` is `Value::Nil` for a table with no
/// fallback, or another `Table`-bearing `Value` to chain lookups through —
/// the mechanism an environment's enclosing scope is built from.
///
/// Hashing and equality are supplied per call rather than stored on the
/// table itself: a plain `fn(&Value) -> Option<u64>` cannot hash a symbol by
/// its interned contents without reaching into the heap that contains the
/// table doing the hashing. Callers (`symbols::intern`, environment lookup,
/// the `table` intrinsics) pass closures that close over whatever context
/// they need — typically `&Heap` for content hashing, or nothing at all for
/// the identity hashing that symbols and integers use once interned.
#[derive(Clone, Debug)]
pub struct Table {
    slots: Vec<Slot>,
    count: usize,
    pub prototype: Value,
}

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![Slot::default(); INITIAL_CAPACITY],
            count: 0,
            prototype: Value::Nil,
        }
    }

    #[must_use]
    pub fn with_prototype(prototype: Value) -> Self {
        let mut table = Self::new();
        table.prototype = prototype;
        table
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn would_exceed_load_factor(&self, extra: usize) -> bool {
        (self.count + extra) * MAX_LOAD_FACTOR_DEN > self.slots.len() * MAX_LOAD_FACTOR_NUM
    }

    /// Look up `key` in this table alone, not following `prototype`.
    #[must_use]
    pub fn get_own(
        &self,
        key: Value,
        hash: impl Fn(Value) -> Option<u64>,
        eq: impl Fn(Value, Value) -> bool,
    ) -> Option<Value> {
        let Some(h) = hash(key) else {
            return None;
        };
        let mask = self.slots.len() - 1;
        let mut index = (h as usize) & mask;
        for _ in 0..self.slots.len() {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Occupied(k, v) => {
                    if eq(*k, key) {
                        return Some(*v);
                    }
                }
            }
            index = (index + 1) & mask;
        }
        None
    }

    /// Insert or overwrite `key`, growing the table first if the load factor
    /// after insertion would exceed 0.7.
    pub fn insert(
        &mut self,
        key: Value,
        value: Value,
        hash: impl Fn(Value) -> Option<u64> + Copy,
        eq: impl Fn(Value, Value) -> bool + Copy,
    ) {
        if self.would_exceed_load_factor(1) {
            self.grow(hash, eq);
        }
        self.insert_no_grow(key, value, hash, eq);
    }

    fn insert_no_grow(
        &mut self,
        key: Value,
        value: Value,
        hash: impl Fn(Value) -> Option<u64>,
        eq: impl Fn(Value, Value) -> bool,
    ) {
        let Some(h) = hash(key) else {
            return;
        };
        let mask = self.slots.len() - 1;
        let mut index = (h as usize) & mask;
        let mut first_tombstone = None;
        for _ in 0..self.slots.len() {
            match &self.slots[index] {
                Slot::Empty => {
                    let target = first_tombstone.unwrap_or(index);
                    self.slots[target] = Slot::Occupied(key, value);
                    self.count += 1;
                    return;
                }
                Slot::Tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(index);
                    }
                }
                Slot::Occupied(k, _) => {
                    if eq(*k, key) {
                        self.slots[index] = Slot::Occupied(key, value);
                        return;
                    }
                }
            }
            index = (index + 1) & mask;
        }
        unreachable!("load factor invariant guarantees an empty or tombstone slot");
    }

    /// Remove `key`, leaving a tombstone in its place so later probes still
    /// reach entries that collided with it.
    pub fn remove(
        &mut self,
        key: Value,
        hash: impl Fn(Value) -> Option<u64>,
        eq: impl Fn(Value, Value) -> bool,
    ) -> Option<Value> {
        let h = hash(key)?;
        let mask = self.slots.len() - 1;
        let mut index = (h as usize) & mask;
        for _ in 0..self.slots.len() {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Tombstone => {}
                Slot::Occupied(k, v) => {
                    if eq(*k, key) {
                        let removed = *v;
                        self.slots[index] = Slot::Tombstone;
                        self.count -= 1;
                        return Some(removed);
                    }
                }
            }
            index = (index + 1) & mask;
        }
        None
    }

    fn grow(
        &mut self,
        hash: impl Fn(Value) -> Option<u64> + Copy,
        eq: impl Fn(Value, Value) -> bool + Copy,
    ) {
        let new_capacity = self.slots.len() * 2;
        let old = std::mem::replace(&mut self.slots, vec![Slot::default(); new_capacity]);
        self.count = 0;
        for slot in old {
            if let Slot::Occupied(k, v) = slot {
                self.insert_no_grow(k, v, hash, eq);
            }
        }
    }

    /// Iterate this table's own entries (not `prototype`'s), in slot order.
    pub fn entries(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied(k, v) => Some((*k, *v)),
            Slot::Empty | Slot::Tombstone => None,
        })
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod table_test {
    use super::*;

    fn int_hash(v: Value) -> Option<u64> {
        match v {
            Value::Integer(n) => Some(n as u64),
            _ => None,
        }
    }

    fn int_eq(a: Value, b: Value) -> bool {
        matches!((a, b), (Value::Integer(x), Value::Integer(y)) if x == y)
    }

    #[test]
    fn insert_and_get_round_trips() {
        let mut t = Table::new();
        t.insert(Value::Integer(1), Value::Integer(100), int_hash, int_eq);
        t.insert(Value::Integer(2), Value::Integer(200), int_hash, int_eq);
        assert_eq!(t.get_own(Value::Integer(1), int_hash, int_eq), Some(Value::Integer(100)));
        assert_eq!(t.get_own(Value::Integer(2), int_hash, int_eq), Some(Value::Integer(200)));
        assert_eq!(t.get_own(Value::Integer(3), int_hash, int_eq), None);
    }

    #[test]
    fn grows_before_load_factor_exceeds_seven_tenths() {
        let mut t = Table::new();
        let start_capacity = t.capacity();
        for i in 0..6 {
            t.insert(Value::Integer(i), Value::Integer(i), int_hash, int_eq);
        }
        assert!(t.capacity() > start_capacity);
        for i in 0..6 {
            assert_eq!(t.get_own(Value::Integer(i), int_hash, int_eq), Some(Value::Integer(i)));
        }
    }

    #[test]
    fn remove_leaves_a_tombstone_that_does_not_break_later_probes() {
        let mut t = Table::new();
        t.insert(Value::Integer(1), Value::Integer(1), int_hash, int_eq);
        t.insert(Value::Integer(9), Value::Integer(9), int_hash, int_eq);
        t.remove(Value::Integer(1), int_hash, int_eq);
        assert_eq!(t.get_own(Value::Integer(9), int_hash, int_eq), Some(Value::Integer(9)));
        assert_eq!(t.get_own(Value::Integer(1), int_hash, int_eq), None);
    }

    #[test]
    fn overwrite_replaces_existing_entry_without_growing() {
        let mut t = Table::new();
        t.insert(Value::Integer(1), Value::Integer(1), int_hash, int_eq);
        let cap = t.capacity();
        t.insert(Value::Integer(1), Value::Integer(2), int_hash, int_eq);
        assert_eq!(t.capacity(), cap);
        assert_eq!(t.get_own(Value::Integer(1), int_hash, int_eq), Some(Value::Integer(2)));
    }

    proptest::proptest! {
        /// Testable property from the specification: after any sequence of
        /// inserts, `count/capacity <= 0.7`.
        #[test]
        fn load_factor_never_exceeds_seven_tenths(keys in proptest::collection::vec(0i64..1000, 0..500)) {
            let mut t = Table::new();
            for k in keys {
                t.insert(Value::Integer(k), Value::Integer(k), int_hash, int_eq);
            }
            proptest::prop_assert!(t.len() * 10 <= t.capacity() * 7);
        }
    }
}
