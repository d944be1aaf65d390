// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Pair and list primitives: `cons`, `first`, `rest`, `list`, `length`,
//! `map`, `reduce`, `flatten`.

use super::args_to_vec;
use crate::error::LoneError;
use crate::eval::{apply, list_to_vec, vec_to_list, EvalResult, Unwind};
use crate::heap::cell::{Cell, Pair};
use crate::interp::Interp;
use crate::value::{Flags, Value};

fn cons(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [first, rest] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let r = interp.heap.alloc_cell(Cell::Pair(Pair { first: *first, rest: *rest }), false);
    Ok(Value::List(r))
}

fn first(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    match items.as_slice() {
        [Value::List(_)] => {
            let Cell::Pair(p) = interp.heap.get(items[0]) else { unreachable!() };
            Ok(p.first)
        }
        [Value::Nil] => Ok(Value::Nil),
        [other] => Err(LoneError::TypeMismatch { expected: "list", got: other.type_name() }.into()),
        _ => Err(LoneError::ArityMismatch { expected: "1", got: items.len() }.into()),
    }
}

fn rest(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    match items.as_slice() {
        [Value::List(_)] => {
            let Cell::Pair(p) = interp.heap.get(items[0]) else { unreachable!() };
            Ok(p.rest)
        }
        [Value::Nil] => Ok(Value::Nil),
        [other] => Err(LoneError::TypeMismatch { expected: "list", got: other.type_name() }.into()),
        _ => Err(LoneError::ArityMismatch { expected: "1", got: items.len() }.into()),
    }
}

fn list(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    Ok(args)
}

fn length(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [value] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "1", got: items.len() }.into());
    };
    let mut count: i64 = 0;
    let mut current = *value;
    loop {
        match current {
            Value::Nil => break,
            Value::List(_) => {
                let Cell::Pair(p) = interp.heap.get(current) else { unreachable!() };
                count += 1;
                current = p.rest;
            }
            other => {
                return Err(LoneError::TypeMismatch { expected: "list", got: other.type_name() }.into())
            }
        }
    }
    Ok(Value::Integer(count))
}

/// Wrap an already-evaluated value in a synthetic `(quote value)` form so
/// `apply`'s own argument-evaluation step (run whenever the callee's
/// `evaluate_arguments` flag is set) hands it to the callee unchanged. Without
/// this, a data element that happens to be a symbol or list would be looked
/// up or called instead of passed through.
fn quoted(interp: &mut Interp, value: Value) -> Value {
    let quote = interp.constants.quote;
    let rest = interp.heap.alloc_cell(Cell::Pair(Pair { first: value, rest: Value::Nil }), false);
    let r = interp.heap.alloc_cell(Cell::Pair(Pair { first: quote, rest: Value::List(rest) }), false);
    Value::List(r)
}

fn map(interp: &mut Interp, module: Value, env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [f, xs] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let (f, xs) = (*f, *xs);
    let elements = list_to_vec(interp, xs)?;
    let mut mapped = Vec::with_capacity(elements.len());
    for x in elements {
        let arg = quoted(interp, x);
        mapped.push(apply(interp, module, env, f, &[arg])?);
    }
    Ok(vec_to_list(interp, &mapped))
}

fn reduce(interp: &mut Interp, module: Value, env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [f, init, xs] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "3", got: items.len() }.into());
    };
    let (f, mut acc, xs) = (*f, *init, *xs);
    for x in list_to_vec(interp, xs)? {
        let acc_arg = quoted(interp, acc);
        let x_arg = quoted(interp, x);
        acc = apply(interp, module, env, f, &[acc_arg, x_arg])?;
    }
    Ok(acc)
}

fn flatten(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [xxs] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "1", got: items.len() }.into());
    };
    let mut out = Vec::new();
    flatten_into(interp, *xxs, &mut out)?;
    Ok(vec_to_list(interp, &out))
}

fn flatten_into(interp: &Interp, value: Value, out: &mut Vec<Value>) -> Result<(), Unwind> {
    match value {
        Value::Nil => Ok(()),
        Value::List(_) => {
            for item in list_to_vec(interp, value)? {
                match item {
                    Value::List(_) | Value::Nil => flatten_into(interp, item, out)?,
                    other => out.push(other),
                }
            }
            Ok(())
        }
        other => Err(LoneError::TypeMismatch { expected: "list", got: other.type_name() }.into()),
    }
}

pub fn install(interp: &mut Interp, module: Value) {
    super::define(interp, module, "cons", Flags::lambda(), cons);
    super::define(interp, module, "first", Flags::lambda(), first);
    super::define(interp, module, "rest", Flags::lambda(), rest);
    super::define(interp, module, "list", Flags::lambda(), list);
    super::define(interp, module, "length", Flags::lambda(), length);
    super::define(interp, module, "map", Flags::lambda(), map);
    super::define(interp, module, "reduce", Flags::lambda(), reduce);
    super::define(interp, module, "flatten", Flags::lambda(), flatten);
}

#[cfg(test)]
mod list_test {
    use super::*;
    use crate::reader::Parser;

    fn run(interp: &mut Interp, module: Value, source: &str) -> Value {
        let form = Parser::new(source).read(interp).unwrap().unwrap();
        let env = interp.module_environment(module).unwrap();
        crate::eval::evaluate(interp, module, env, form).unwrap()
    }

    #[test]
    fn cons_first_rest_round_trip() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        assert_eq!(run(&mut interp, module, "(first (cons 1 2))"), Value::Integer(1));
        assert_eq!(run(&mut interp, module, "(rest (cons 1 2))"), Value::Integer(2));
    }

    #[test]
    fn length_counts_proper_list_elements() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        assert_eq!(run(&mut interp, module, "(length (list 1 2 3))"), Value::Integer(3));
    }

    #[test]
    fn map_applies_a_function_to_each_element() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        crate::intrinsics::math::install(&mut interp, module);
        let result = run(&mut interp, module, "(map (lambda (x) (+ x 1)) (list 1 2 3))");
        let Cell::Pair(p) = interp.heap.get(result) else { panic!("expected list") };
        assert_eq!(p.first, Value::Integer(2));
    }

    #[test]
    fn reduce_folds_with_an_initial_value() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        crate::intrinsics::math::install(&mut interp, module);
        let result = run(&mut interp, module, "(reduce + 0 (list 1 2 3 4))");
        assert_eq!(result, Value::Integer(10));
    }

    #[test]
    fn flatten_collapses_nested_lists() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        let result = run(&mut interp, module, "(length (flatten (list (list 1 2) (list) (list 3))))");
        assert_eq!(result, Value::Integer(3));
    }

    #[test]
    fn map_passes_symbols_and_lists_through_as_data() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        let result = run(&mut interp, module, "(map (lambda (x) x) (list (quote a) (quote (1 2))))");
        let Cell::Pair(p) = interp.heap.get(result).clone() else { panic!("expected list") };
        assert!(matches!(p.first, Value::Symbol(_)));
        let Cell::Pair(rest) = interp.heap.get(p.rest) else { panic!("expected list") };
        assert!(matches!(rest.first, Value::List(_)));
    }
}
