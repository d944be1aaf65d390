// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Hashing and equality for table keys, plus the three equality tiers
//! `identical? ⇒ equivalent? ⇒ equal?` exposed to interpreted code as
//! `lone` primitives.
//!
//! Per the specification's equality tiers, keys are compared by identity for
//! heap kinds with reference semantics (symbols, functions, …) and by value
//! for immediates. Interning guarantees two symbols with the same text share
//! a `HeapRef`, so identity hashing (the ref index) and identity equality
//! suffice for symbols without ever touching the heap — the property
//! [`crate::symbols::Symbols::intern`] exists to provide.

use crate::error::{LoneError, LoneResult};
use crate::heap::cell::Cell;
use crate::interp::Interp;
use crate::value::Value;

/// Hash `key` for use in a [`crate::table::Table`], or report that its kind
/// cannot be hashed at all (functions, primitives, modules, vectors, tables).
pub fn hash_key(key: Value) -> LoneResult<u64> {
    match key {
        Value::Nil => Ok(0),
        Value::Integer(n) => Ok(n as u64),
        Value::Pointer(p) => Ok(p.addr as u64),
        Value::Symbol(r) | Value::List(r) | Value::Text(r) | Value::Bytes(r)
        | Value::Continuation(r) => Ok(u64::from(r.index() as u32)),
        Value::Vector(_) | Value::Table(_) | Value::Module(_) | Value::Function(_)
        | Value::Primitive(_) => Err(LoneError::Unhashable(key.type_name())),
    }
}

/// Equality for table keys: value equality for immediates, identity (`HeapRef`
/// equality) for everything on the heap.
#[must_use]
pub fn keys_equal(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Pointer(x), Value::Pointer(y)) => x == y,
        _ => a.heap_ref().is_some() && a.heap_ref() == b.heap_ref(),
    }
}

/// Tier 1: same variant, same bits; for heap kinds, the same `HeapRef`.
/// Table keys already use exactly this relation, so it is `keys_equal`
/// under another name for the primitives that call it `identical?`.
#[must_use]
pub fn is_identical(a: Value, b: Value) -> bool {
    keys_equal(a, b)
}

/// Tier 2: structural equality up to one level. Lists compare their `first`
/// and `rest` by identity rather than recursing; vectors compare elements
/// pairwise by identity; tables compare same-sized entry sets by identity
/// of the values. Every other kind has no one-level decomposition to offer
/// and falls back to `identical?`.
#[must_use]
pub fn is_equivalent(interp: &Interp, a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::List(_), Value::List(_)) => {
            let Cell::Pair(pa) = interp.heap.get(a) else { unreachable!() };
            let Cell::Pair(pb) = interp.heap.get(b) else { unreachable!() };
            is_identical(pa.first, pb.first) && is_identical(pa.rest, pb.rest)
        }
        (Value::Vector(_), Value::Vector(_)) => {
            let Cell::Vector(va) = interp.heap.get(a) else { unreachable!() };
            let Cell::Vector(vb) = interp.heap.get(b) else { unreachable!() };
            va.items.len() == vb.items.len()
                && va.items.iter().zip(vb.items.iter()).all(|(x, y)| is_identical(*x, *y))
        }
        (Value::Table(_), Value::Table(_)) => {
            let Cell::Table(ta) = interp.heap.get(a) else { unreachable!() };
            let Cell::Table(tb) = interp.heap.get(b) else { unreachable!() };
            ta.len() == tb.len()
                && ta.entries().all(|(k, v)| {
                    tb.get_own(k, |key| hash_key(key).ok(), keys_equal).is_some_and(|v2| is_identical(v, v2))
                })
        }
        _ => is_identical(a, b),
    }
}

/// Tier 3: full recursive structural equality. Texts and Bytes compare
/// their byte contents; Lists and Vectors walk their elements; Tables
/// compare by entry-set equality (keys matched by `equal?`, not identity,
/// since two structurally equal but distinct keys must still line up).
/// Symbols, being interned, reduce to identity like every other kind with
/// no structure of its own to recurse into.
#[must_use]
pub fn is_equal(interp: &Interp, a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::List(_), Value::List(_)) => {
            let Cell::Pair(pa) = interp.heap.get(a) else { unreachable!() };
            let Cell::Pair(pb) = interp.heap.get(b) else { unreachable!() };
            is_equal(interp, pa.first, pb.first) && is_equal(interp, pa.rest, pb.rest)
        }
        (Value::Vector(_), Value::Vector(_)) => {
            let Cell::Vector(va) = interp.heap.get(a) else { unreachable!() };
            let Cell::Vector(vb) = interp.heap.get(b) else { unreachable!() };
            va.items.len() == vb.items.len()
                && va.items.iter().zip(vb.items.iter()).all(|(x, y)| is_equal(interp, *x, *y))
        }
        (Value::Table(_), Value::Table(_)) => {
            let Cell::Table(ta) = interp.heap.get(a) else { unreachable!() };
            let Cell::Table(tb) = interp.heap.get(b) else { unreachable!() };
            ta.len() == tb.len()
                && ta.entries().all(|(k, v)| {
                    tb.entries().any(|(k2, v2)| is_equal(interp, k, k2) && is_equal(interp, v, v2))
                })
        }
        (Value::Text(_), Value::Text(_)) => {
            let Cell::Text(ta) = interp.heap.get(a) else { unreachable!() };
            let Cell::Text(tb) = interp.heap.get(b) else { unreachable!() };
            ta.bytes.as_slice() == tb.bytes.as_slice()
        }
        (Value::Bytes(_), Value::Bytes(_)) => {
            let Cell::Bytes(ba) = interp.heap.get(a) else { unreachable!() };
            let Cell::Bytes(bb) = interp.heap.get(b) else { unreachable!() };
            ba.bytes.as_slice() == bb.bytes.as_slice()
        }
        _ => is_identical(a, b),
    }
}

#[cfg(test)]
mod equality_test {
    use super::*;
    use crate::value::HeapRef;

    #[test]
    fn integers_hash_and_compare_by_value() {
        assert_eq!(hash_key(Value::Integer(5)).unwrap(), hash_key(Value::Integer(5)).unwrap());
        assert!(keys_equal(Value::Integer(5), Value::Integer(5)));
        assert!(!keys_equal(Value::Integer(5), Value::Integer(6)));
    }

    #[test]
    fn heap_values_compare_by_reference_not_hash_collision() {
        let a = Value::List(HeapRef(1));
        let b = Value::List(HeapRef(2));
        assert!(!keys_equal(a, b));
        assert!(keys_equal(a, Value::List(HeapRef(1))));
    }

    #[test]
    fn vectors_and_tables_are_unhashable() {
        assert!(hash_key(Value::Vector(HeapRef(0))).is_err());
        assert!(hash_key(Value::Table(HeapRef(0))).is_err());
    }
}
