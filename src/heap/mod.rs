// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The garbage-collected cell pool.
//!
//! Per `SPEC_FULL.md` §3's resolution of the original's raw-pointer, flag-
//! stealing arena, cells live in slabs of fixed size and are addressed by
//! the stable `HeapRef` index rather than by address. Collection is
//! mark-and-sweep (component D), triggered only at top-level-form
//! boundaries (`Heap::collect`) — never while a Rust call frame is holding a
//! `Value` that has not yet been rooted, which is the policy that lets this
//! crate skip conservative stack/register scanning entirely.

pub mod cell;

use crate::value::{HeapRef, Value};
use cell::Cell;

const SLAB_SIZE: usize = 512;

#[derive(Clone)]
struct CellSlot {
    cell: Option<Cell>,
    marked: bool,
    /// Set at allocation time for cells the interpreter must never collect
    /// (the null module, constants, …) in addition to the kinds that are
    /// always pinned regardless of this bit (see `Cell::always_pinned`).
    pinned: bool,
}

impl Default for CellSlot {
    fn default() -> Self {
        Self { cell: None, marked: false, pinned: false }
    }
}

type Slab = Vec<CellSlot>;

/// The cell pool: a growable list of fixed-size slabs plus a free list of
/// indices into them.
pub struct Heap {
    slabs: Vec<Slab>,
    free_list: Vec<u32>,
    /// Cell count at the last collection, used to decide whether the next
    /// allocation should trigger one (the specification names no particular
    /// trigger policy beyond "mark-and-sweep runs between top-level forms";
    /// this crate runs it unconditionally at that boundary instead of
    /// second-guessing a heuristic).
    allocations_since_collect: usize,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self { slabs: Vec::new(), free_list: Vec::new(), allocations_since_collect: 0 }
    }

    fn index_to_ref(index: usize) -> HeapRef {
        HeapRef(u32::try_from(index).expect("heap index fits in u32"))
    }

    fn slot(&self, r: HeapRef) -> &CellSlot {
        let index = r.index();
        &self.slabs[index / SLAB_SIZE][index % SLAB_SIZE]
    }

    fn slot_mut(&mut self, r: HeapRef) -> &mut CellSlot {
        let index = r.index();
        &mut self.slabs[index / SLAB_SIZE][index % SLAB_SIZE]
    }

    fn grow(&mut self) {
        let base = self.slabs.len() * SLAB_SIZE;
        self.slabs.push(vec![CellSlot::default(); SLAB_SIZE]);
        let new_slab_start = base;
        self.free_list.extend(
            (new_slab_start..new_slab_start + SLAB_SIZE)
                .rev()
                .map(|i| u32::try_from(i).expect("heap index fits in u32")),
        );
    }

    /// Allocate `cell`, returning the `HeapRef` that now addresses it.
    pub fn alloc_cell(&mut self, cell: Cell, pinned: bool) -> HeapRef {
        if self.free_list.is_empty() {
            self.grow();
        }
        let index = self.free_list.pop().expect("grow() ensures a free slot");
        let r = Self::index_to_ref(index as usize);
        *self.slot_mut(r) = CellSlot { cell: Some(cell), marked: false, pinned };
        self.allocations_since_collect += 1;
        r
    }

    /// Borrow the cell a `Value` refers to.
    ///
    /// # Panics
    /// Panics if `value` carries no heap reference, or the reference
    /// addresses a slot that has been swept — both are evaluator bugs, not
    /// conditions a caller can sensibly recover from.
    #[must_use]
    pub fn get(&self, value: Value) -> &Cell {
        let r = value.heap_ref().expect("get() called on a non-heap value");
        self.slot(r).cell.as_ref().expect("dangling HeapRef")
    }

    pub fn get_mut(&mut self, value: Value) -> &mut Cell {
        let r = value.heap_ref().expect("get_mut() called on a non-heap value");
        self.slot_mut(r).cell.as_mut().expect("dangling HeapRef")
    }

    /// Run mark-and-sweep, rooted at `roots`.
    ///
    /// Every cell reachable from `roots`, plus every cell whose kind is
    /// unconditionally pinned (`Cell::always_pinned`) or whose slot carries
    /// the `pinned` bit, survives. Everything else is freed and its index
    /// returned to the free list.
    pub fn collect(&mut self, roots: &[Value]) {
        let mut stack: Vec<Value> = roots.to_vec();
        while let Some(value) = stack.pop() {
            let Some(r) = value.heap_ref() else { continue };
            let already_marked = self.slot(r).marked;
            if already_marked {
                continue;
            }
            self.slot_mut(r).marked = true;
            let mut children = Vec::new();
            if let Some(cell) = &self.slot(r).cell {
                cell.for_each_child(|child| children.push(child));
            }
            stack.extend(children);
        }

        for slab_index in 0..self.slabs.len() {
            for slot_index in 0..SLAB_SIZE {
                let global_index = slab_index * SLAB_SIZE + slot_index;
                let slot = &mut self.slabs[slab_index][slot_index];
                let keep = slot.marked
                    || slot.pinned
                    || slot.cell.as_ref().is_some_and(Cell::always_pinned);
                if slot.cell.is_some() && !keep {
                    slot.cell = None;
                    self.free_list
                        .push(u32::try_from(global_index).expect("heap index fits in u32"));
                }
                slot.marked = false;
            }
        }
        self.allocations_since_collect = 0;
    }

    #[must_use]
    pub fn allocations_since_collect(&self) -> usize {
        self.allocations_since_collect
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod heap_test {
    use super::*;
    use crate::heap::cell::{HeapSymbol, Pair};
    use crate::heap::cell::ByteStore;

    #[test]
    fn alloc_then_get_round_trips() {
        let mut heap = Heap::new();
        let r = heap.alloc_cell(
            Cell::Pair(Pair { first: Value::Integer(1), rest: Value::Nil }),
            false,
        );
        match heap.get(Value::List(r)) {
            Cell::Pair(p) => assert_eq!(p.first, Value::Integer(1)),
            _ => panic!("expected a pair"),
        }
    }

    #[test]
    fn collect_frees_unreachable_cells_and_keeps_reachable_ones() {
        let mut heap = Heap::new();
        let kept = heap.alloc_cell(
            Cell::Pair(Pair { first: Value::Integer(1), rest: Value::Nil }),
            false,
        );
        let dropped = heap.alloc_cell(
            Cell::Pair(Pair { first: Value::Integer(2), rest: Value::Nil }),
            false,
        );
        heap.collect(&[Value::List(kept)]);
        assert!(heap.slot(kept).cell.is_some());
        assert!(heap.slot(dropped).cell.is_none());
    }

    #[test]
    fn symbols_survive_collection_even_when_unreachable() {
        let mut heap = Heap::new();
        let sym = heap.alloc_cell(
            Cell::Symbol(HeapSymbol { bytes: ByteStore::owned(b"truth") }),
            false,
        );
        heap.collect(&[]);
        assert!(heap.slot(sym).cell.is_some());
    }

    #[test]
    fn growth_reuses_freed_slots_before_adding_new_slabs() {
        let mut heap = Heap::new();
        let mut refs = Vec::new();
        for i in 0..SLAB_SIZE {
            refs.push(heap.alloc_cell(
                Cell::Pair(Pair { first: Value::Integer(i as i64), rest: Value::Nil }),
                false,
            ));
        }
        heap.collect(&[]);
        assert_eq!(heap.slabs.len(), 1);
        let r = heap.alloc_cell(
            Cell::Pair(Pair { first: Value::Integer(99), rest: Value::Nil }),
            false,
        );
        assert_eq!(heap.slabs.len(), 1);
        let _ = r;
    }

    proptest::proptest! {
        /// Testable property from the specification: after GC, every value
        /// reachable from roots is still live, and every unreachable
        /// non-pinned value is not.
        #[test]
        fn collection_keeps_exactly_what_is_reachable(kept_count in 0usize..30, garbage_count in 0usize..30) {
            let mut heap = Heap::new();
            let mut roots = Vec::new();
            for i in 0..kept_count {
                let r = heap.alloc_cell(
                    Cell::Pair(Pair { first: Value::Integer(i as i64), rest: Value::Nil }),
                    false,
                );
                roots.push(Value::List(r));
            }
            let mut garbage = Vec::new();
            for i in 0..garbage_count {
                garbage.push(heap.alloc_cell(
                    Cell::Pair(Pair { first: Value::Integer(-(i as i64) - 1), rest: Value::Nil }),
                    false,
                ));
            }
            heap.collect(&roots);
            for root in &roots {
                let r = root.heap_ref().unwrap();
                proptest::prop_assert!(heap.slot(r).cell.is_some());
            }
            for r in &garbage {
                proptest::prop_assert!(heap.slot(*r).cell.is_none());
            }
        }
    }
}
