// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Table primitives, exposing the open-addressed [`crate::table::Table`]
//! to interpreted code.

use super::args_to_vec;
use crate::equality::{hash_key, keys_equal};
use crate::error::LoneError;
use crate::eval::EvalResult;
use crate::heap::cell::Cell;
use crate::interp::Interp;
use crate::value::{Flags, Value};

fn make(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let prototype = items.first().copied().unwrap_or(Value::Nil);
    let r = interp
        .heap
        .alloc_cell(Cell::Table(crate::table::Table::with_prototype(prototype)), false);
    Ok(Value::Table(r))
}

fn get(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [table, key] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let mut current = *table;
    loop {
        let Cell::Table(t) = interp.heap.get(current) else {
            return Err(LoneError::TypeMismatch { expected: "table", got: current.type_name() }.into());
        };
        if let Some(v) = t.get_own(*key, |v| hash_key(v).ok(), keys_equal) {
            return Ok(v);
        }
        if t.prototype.is_nil() {
            return Ok(Value::Nil);
        }
        current = t.prototype;
    }
}

fn set(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [table, key, value] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "3", got: items.len() }.into());
    };
    hash_key(*key)?;
    let Cell::Table(t) = interp.heap.get_mut(*table) else {
        return Err(LoneError::TypeMismatch { expected: "table", got: table.type_name() }.into());
    };
    t.insert(*key, *value, |v| hash_key(v).ok(), keys_equal);
    Ok(*value)
}

fn length(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [table] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "1", got: items.len() }.into());
    };
    let Cell::Table(t) = interp.heap.get(*table) else {
        return Err(LoneError::TypeMismatch { expected: "table", got: table.type_name() }.into());
    };
    Ok(Value::Integer(t.len() as i64))
}

fn delete(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [table, key] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let Cell::Table(t) = interp.heap.get_mut(*table) else {
        return Err(LoneError::TypeMismatch { expected: "table", got: table.type_name() }.into());
    };
    Ok(t.remove(*key, |v| hash_key(v).ok(), keys_equal).unwrap_or(Value::Nil))
}

fn key_at(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [table, index] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let Cell::Table(t) = interp.heap.get(*table) else {
        return Err(LoneError::TypeMismatch { expected: "table", got: table.type_name() }.into());
    };
    let Value::Integer(i) = index else {
        return Err(LoneError::TypeMismatch { expected: "integer", got: index.type_name() }.into());
    };
    Ok(t.entries().nth(*i as usize).map(|(k, _)| k).unwrap_or(Value::Nil))
}

fn value_at(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [table, index] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let Cell::Table(t) = interp.heap.get(*table) else {
        return Err(LoneError::TypeMismatch { expected: "table", got: table.type_name() }.into());
    };
    let Value::Integer(i) = index else {
        return Err(LoneError::TypeMismatch { expected: "integer", got: index.type_name() }.into());
    };
    Ok(t.entries().nth(*i as usize).map(|(_, v)| v).unwrap_or(Value::Nil))
}

pub fn install(interp: &mut Interp, module: Value) {
    super::define(interp, module, "make", Flags::lambda(), make);
    super::define(interp, module, "get", Flags::lambda(), get);
    super::define(interp, module, "set!", Flags::lambda(), set);
    super::define(interp, module, "length", Flags::lambda(), length);
    super::define(interp, module, "delete", Flags::lambda(), delete);
    super::define(interp, module, "key_at", Flags::lambda(), key_at);
    super::define(interp, module, "value_at", Flags::lambda(), value_at);
}

#[cfg(test)]
mod table_intrinsic_test {
    use super::*;
    use crate::reader::Parser;

    fn run(interp: &mut Interp, module: Value, source: &str) -> Value {
        let form = Parser::new(source).read(interp).unwrap().unwrap();
        let env = interp.module_environment(module).unwrap();
        crate::eval::evaluate(interp, module, env, form).unwrap()
    }

    #[test]
    fn missing_key_falls_back_to_the_prototype() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        let v = run(
            &mut interp,
            module,
            "(let ((base (make))) (set! base 1 100) (let ((child (make base))) (get child 1)))",
        );
        assert_eq!(v, Value::Integer(100));
    }

    #[test]
    fn missing_key_with_no_prototype_is_nil() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        assert_eq!(run(&mut interp, module, "(get (make) 1)"), Value::Nil);
    }

    #[test]
    fn delete_removes_a_key_and_returns_its_former_value() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        let v = run(
            &mut interp,
            module,
            "(let ((t (make))) (set! t 1 100) (delete t 1))",
        );
        assert_eq!(v, Value::Integer(100));
        assert_eq!(
            run(&mut interp, module, "(let ((t (make))) (set! t 1 100) (delete t 1) (get t 1))"),
            Value::Nil
        );
    }

    #[test]
    fn key_at_and_value_at_expose_bounded_iteration() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        assert_eq!(
            run(&mut interp, module, "(let ((t (make))) (set! t 1 100) (key_at t 0))"),
            Value::Integer(1)
        );
        assert_eq!(
            run(&mut interp, module, "(let ((t (make))) (set! t 1 100) (value_at t 0))"),
            Value::Integer(100)
        );
    }
}
