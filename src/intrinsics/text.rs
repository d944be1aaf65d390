// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Text primitives: length, concatenation, and the two conversions that tie
//! text into symbol interning (`to-symbol`) and printed form (`of`).

use super::args_to_vec;
use crate::error::LoneError;
use crate::eval::EvalResult;
use crate::heap::cell::{ByteStore, Cell, HeapText};
use crate::interp::Interp;
use crate::value::{Flags, Value};

fn text_bytes<'a>(interp: &'a Interp, value: Value) -> Result<&'a [u8], LoneError> {
    match interp.heap.get(value) {
        Cell::Text(t) => Ok(t.bytes.as_slice()),
        _ => Err(LoneError::TypeMismatch { expected: "text", got: value.type_name() }),
    }
}

fn length(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [text] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "1", got: items.len() }.into());
    };
    Ok(Value::Integer(text_bytes(interp, *text)?.len() as i64))
}

fn append(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let mut combined = Vec::new();
    for item in &items {
        combined.extend_from_slice(text_bytes(interp, *item)?);
    }
    let r = interp.heap.alloc_cell(Cell::Text(HeapText { bytes: ByteStore::owned(&combined) }), false);
    Ok(Value::Text(r))
}

fn to_symbol(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [text] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "1", got: items.len() }.into());
    };
    let bytes = text_bytes(interp, *text)?.to_vec();
    Ok(interp.symbols.intern(&mut interp.heap, &bytes))
}

fn of(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [value] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "1", got: items.len() }.into());
    };
    let printed = crate::printer::print_to_string(interp, *value);
    let r = interp
        .heap
        .alloc_cell(Cell::Text(HeapText { bytes: ByteStore::owned(printed.as_bytes()) }), false);
    Ok(Value::Text(r))
}

pub fn install(interp: &mut Interp, module: Value) {
    super::define(interp, module, "length", Flags::lambda(), length);
    super::define(interp, module, "append", Flags::lambda(), append);
    super::define(interp, module, "to-symbol", Flags::lambda(), to_symbol);
    super::define(interp, module, "of", Flags::lambda(), of);
}
