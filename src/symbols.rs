// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Symbol interning.
//!
//! Symbols are deduplicated by byte content so that `identical?` (pointer
//! equality on the underlying `HeapRef`) doubles as content equality for
//! symbols — the specification's universal invariant that symbol identity
//! implies content equality, and the converse.
//!
//! The intern table is itself an open-addressed [`crate::table::Table`]
//! (component C, reused for its second purpose), but hashing a prospective
//! symbol means hashing its *bytes* before it has a `Value` to hash at all.
//! `Symbols` therefore keeps its own small index from content hash to
//! `HeapRef`, consulted before falling through to the heap allocation that
//! the `Table` wraps.

use crate::error::LoneResult;
use crate::hash::FnvState;
use crate::heap::cell::{ByteStore, Cell, HeapSymbol};
use crate::heap::Heap;
use crate::value::{HeapRef, Value};

pub struct Symbols {
    fnv: FnvState,
    /// `(content hash, ref)` pairs, linearly scanned. Kept as a flat `Vec`
    /// rather than the generic `Table` because lookups here key on raw
    /// bytes, not on a `Value` the hasher can dispatch on by heap kind.
    interned: Vec<(u64, HeapRef)>,
}

impl Symbols {
    pub fn new() -> LoneResult<Self> {
        Ok(Self { fnv: FnvState::from_kernel_entropy()?, interned: Vec::new() })
    }

    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        self.fnv.hash_bytes(bytes)
    }

    /// Intern `bytes`, returning the canonical `Value::Symbol` for it.
    /// Allocates a new, pinned `HeapSymbol` cell only the first time a given
    /// byte sequence is seen.
    pub fn intern(&mut self, heap: &mut Heap, bytes: &[u8]) -> Value {
        let h = self.hash_bytes(bytes);
        for &(existing_hash, r) in &self.interned {
            if existing_hash != h {
                continue;
            }
            if let Cell::Symbol(s) = heap.get(Value::Symbol(r)) {
                if s.bytes.as_slice() == bytes {
                    return Value::Symbol(r);
                }
            }
        }
        let r = heap.alloc_cell(
            Cell::Symbol(HeapSymbol { bytes: ByteStore::owned(bytes) }),
            true,
        );
        self.interned.push((h, r));
        Value::Symbol(r)
    }
}

#[cfg(test)]
mod symbols_test {
    use super::*;

    #[test]
    fn same_text_interns_to_the_same_reference() {
        let mut heap = Heap::new();
        let mut symbols = Symbols::new().unwrap();
        let a = symbols.intern(&mut heap, b"foo");
        let b = symbols.intern(&mut heap, b"foo");
        assert_eq!(a.heap_ref(), b.heap_ref());
    }

    #[test]
    fn different_text_interns_to_different_references() {
        let mut heap = Heap::new();
        let mut symbols = Symbols::new().unwrap();
        let a = symbols.intern(&mut heap, b"foo");
        let b = symbols.intern(&mut heap, b"bar");
        assert_ne!(a.heap_ref(), b.heap_ref());
    }

    #[test]
    fn interned_symbols_survive_collection_with_no_roots() {
        let mut heap = Heap::new();
        let mut symbols = Symbols::new().unwrap();
        let r = symbols.intern(&mut heap, b"truth").heap_ref().unwrap();
        heap.collect(&[]);
        assert!(matches!(heap.get(Value::Symbol(r)), Cell::Symbol(_)));
    }
}
