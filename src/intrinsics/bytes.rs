// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Opaque byte buffer primitives, distinct from `text` in that there is no
//! encoding assumed and no interning.

use super::args_to_vec;
use crate::error::LoneError;
use crate::eval::EvalResult;
use crate::heap::cell::{ByteStore, Cell, HeapBytes};
use crate::interp::Interp;
use crate::value::{Flags, Value};

fn make(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Integer(n) if (0..=255).contains(&n) => out.push(n as u8),
            Value::Integer(_) => {
                return Err(LoneError::TypeMismatch { expected: "byte (0..=255)", got: "integer" }.into())
            }
            other => return Err(LoneError::TypeMismatch { expected: "integer", got: other.type_name() }.into()),
        }
    }
    let r = interp.heap.alloc_cell(Cell::Bytes(HeapBytes { bytes: ByteStore::owned(&out) }), false);
    Ok(Value::Bytes(r))
}

fn get(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [buffer, index] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let Cell::Bytes(b) = interp.heap.get(*buffer) else {
        return Err(LoneError::TypeMismatch { expected: "bytes", got: buffer.type_name() }.into());
    };
    let Value::Integer(i) = index else {
        return Err(LoneError::TypeMismatch { expected: "integer", got: index.type_name() }.into());
    };
    let slice = b.bytes.as_slice();
    let value = usize::try_from(*i).ok().and_then(|idx| slice.get(idx)).copied();
    Ok(value.map_or(Value::Nil, |byte| Value::Integer(i64::from(byte))))
}

fn length(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [buffer] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "1", got: items.len() }.into());
    };
    let Cell::Bytes(b) = interp.heap.get(*buffer) else {
        return Err(LoneError::TypeMismatch { expected: "bytes", got: buffer.type_name() }.into());
    };
    Ok(Value::Integer(b.bytes.as_slice().len() as i64))
}

pub fn install(interp: &mut Interp, module: Value) {
    super::define(interp, module, "make", Flags::lambda(), make);
    super::define(interp, module, "get", Flags::lambda(), get);
    super::define(interp, module, "length", Flags::lambda(), length);
}

#[cfg(test)]
mod bytes_test {
    use super::*;
    use crate::reader::Parser;

    fn run(interp: &mut Interp, module: Value, source: &str) -> Value {
        let form = Parser::new(source).read(interp).unwrap().unwrap();
        let env = interp.module_environment(module).unwrap();
        crate::eval::evaluate(interp, module, env, form).unwrap()
    }

    #[test]
    fn make_and_get_round_trip_each_byte() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        assert_eq!(run(&mut interp, module, "(get (make 1 2 3) 1)"), Value::Integer(2));
    }

    #[test]
    fn out_of_bounds_get_is_nil() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        assert_eq!(run(&mut interp, module, "(get (make 1 2 3) 9)"), Value::Nil);
    }
}
