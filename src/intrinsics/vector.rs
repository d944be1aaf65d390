// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Vector primitives. Out-of-bounds reads return `nil` (per the
//! specification's edge case for vectors); `vector/set!` grows the backing
//! store to fit rather than erroring.

use super::args_to_vec;
use crate::error::LoneError;
use crate::eval::EvalResult;
use crate::heap::cell::{Cell, HeapVector};
use crate::interp::Interp;
use crate::value::{Flags, Value};

fn index_of(v: Value) -> Result<usize, LoneError> {
    match v {
        Value::Integer(n) if n >= 0 => Ok(n as usize),
        Value::Integer(_) => Err(LoneError::TypeMismatch { expected: "non-negative integer", got: "integer" }),
        other => Err(LoneError::TypeMismatch { expected: "integer", got: other.type_name() }),
    }
}

fn make(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let r = interp.heap.alloc_cell(Cell::Vector(HeapVector { items }), false);
    Ok(Value::Vector(r))
}

fn get(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [vector, index] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let Cell::Vector(v) = interp.heap.get(*vector) else {
        return Err(LoneError::TypeMismatch { expected: "vector", got: vector.type_name() }.into());
    };
    Ok(v.get(index_of(*index)?))
}

fn set(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [vector, index, value] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "3", got: items.len() }.into());
    };
    let idx = index_of(*index)?;
    if !matches!(vector, Value::Vector(_)) {
        return Err(LoneError::TypeMismatch { expected: "vector", got: vector.type_name() }.into());
    }
    let Cell::Vector(v) = interp.heap.get_mut(*vector) else { unreachable!() };
    v.set(idx, *value);
    Ok(*value)
}

fn length(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [vector] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "1", got: items.len() }.into());
    };
    let Cell::Vector(v) = interp.heap.get(*vector) else {
        return Err(LoneError::TypeMismatch { expected: "vector", got: vector.type_name() }.into());
    };
    Ok(Value::Integer(v.items.len() as i64))
}

fn slice(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [vector, start, end] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "3", got: items.len() }.into());
    };
    let Cell::Vector(v) = interp.heap.get(*vector) else {
        return Err(LoneError::TypeMismatch { expected: "vector", got: vector.type_name() }.into());
    };
    let start = index_of(*start)?;
    let end = index_of(*end)?;
    if start > end || end > v.items.len() {
        return Err(LoneError::TypeMismatch { expected: "in-bounds range", got: "out of range" }.into());
    }
    let copied = v.items[start..end].to_vec();
    let r = interp.heap.alloc_cell(Cell::Vector(HeapVector { items: copied }), false);
    Ok(Value::Vector(r))
}

pub fn install(interp: &mut Interp, module: Value) {
    super::define(interp, module, "make", Flags::lambda(), make);
    super::define(interp, module, "get", Flags::lambda(), get);
    super::define(interp, module, "set!", Flags::lambda(), set);
    super::define(interp, module, "length", Flags::lambda(), length);
    super::define(interp, module, "slice", Flags::lambda(), slice);
}

#[cfg(test)]
mod vector_test {
    use super::*;
    use crate::reader::Parser;

    fn run(interp: &mut Interp, module: Value, source: &str) -> Value {
        let form = Parser::new(source).read(interp).unwrap().unwrap();
        let env = interp.module_environment(module).unwrap();
        crate::eval::evaluate(interp, module, env, form).unwrap()
    }

    #[test]
    fn out_of_bounds_read_is_nil() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        assert_eq!(run(&mut interp, module, "(get (make 1 2) 9)"), Value::Nil);
    }

    #[test]
    fn set_grows_the_vector_to_fit() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        let env = interp.module_environment(module).unwrap();
        let form = Parser::new("(set! (make) 3 9)").read(&mut interp).unwrap().unwrap();
        let v = crate::eval::evaluate(&mut interp, module, env, form).unwrap();
        assert_eq!(v, Value::Integer(9));
    }

    #[test]
    fn slice_copies_a_half_open_range() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        let result = run(&mut interp, module, "(slice (make 1 2 3 4 5) 1 3)");
        let Cell::Vector(v) = interp.heap.get(result) else { panic!("expected vector") };
        assert_eq!(v.items, vec![Value::Integer(2), Value::Integer(3)]);
    }

    #[test]
    fn slice_rejects_an_out_of_range_end() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        let form = Parser::new("(slice (make 1 2) 0 9)").read(&mut interp).unwrap().unwrap();
        let env = interp.module_environment(module).unwrap();
        assert!(crate::eval::evaluate(&mut interp, module, env, form).is_err());
    }

    proptest::proptest! {
        /// Testable property from the specification: for any `i >= count`,
        /// `vector_get(v, i) = nil`.
        #[test]
        fn out_of_bounds_index_is_always_nil(len in 0usize..20, extra in 0usize..50) {
            let mut interp = Interp::new().unwrap();
            let module = interp.null_module;
            install(&mut interp, module);
            let items: Vec<Value> = (0..len as i64).map(Value::Integer).collect();
            let r = interp.heap.alloc_cell(Cell::Vector(HeapVector { items }), false);
            let v = Value::Vector(r);
            let env = interp.module_environment(module).unwrap();
            let index = Value::Integer((len + extra) as i64);
            let args = crate::eval::vec_to_list(&mut interp, &[v, index]);
            proptest::prop_assert_eq!(get(&mut interp, module, env, args, Value::Nil).unwrap(), Value::Nil);
        }
    }
}
