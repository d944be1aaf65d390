// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The `lone` module: the handful of primitives that don't belong to any
//! one data type — `type-of`, the three equality tiers `identical?`,
//! `equivalent?`, `equal?`, `print`, and `exit`.

use super::args_to_vec;
use crate::error::LoneError;
use crate::eval::EvalResult;
use crate::interp::Interp;
use crate::value::{Flags, Value};
use std::io::Write as _;

fn type_of(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [value] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "1", got: items.len() }.into());
    };
    Ok(interp.intern(value.type_name()))
}

fn identical(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [a, b] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let equal = crate::equality::is_identical(*a, *b);
    Ok(if equal { interp.constants.truth } else { Value::Nil })
}

fn equivalent(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [a, b] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let equal = crate::equality::is_equivalent(interp, *a, *b);
    Ok(if equal { interp.constants.truth } else { Value::Nil })
}

fn equal(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [a, b] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let equal = crate::equality::is_equal(interp, *a, *b);
    Ok(if equal { interp.constants.truth } else { Value::Nil })
}

fn print(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let mut out = std::io::stdout().lock();
    for item in &items {
        let text = crate::printer::print_to_string(interp, *item);
        let _ = out.write_all(text.as_bytes());
    }
    let _ = out.write_all(b"\n");
    Ok(Value::Nil)
}

fn exit(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let code = match items.first() {
        Some(Value::Integer(n)) => *n as i32,
        Some(other) => return Err(LoneError::TypeMismatch { expected: "integer", got: other.type_name() }.into()),
        None => 0,
    };
    crate::mem::exit(code)
}

pub fn install(interp: &mut Interp, module: Value) {
    super::define(interp, module, "type-of", Flags::lambda(), type_of);
    super::define(interp, module, "identical?", Flags::lambda(), identical);
    super::define(interp, module, "equivalent?", Flags::lambda(), equivalent);
    super::define(interp, module, "equal?", Flags::lambda(), equal);
    super::define(interp, module, "print", Flags::lambda(), print);
    super::define(interp, module, "exit", Flags::lambda(), exit);
}

#[cfg(test)]
mod lone_test {
    use super::*;
    use crate::reader::Parser;

    fn run(interp: &mut Interp, module: Value, source: &str) -> Value {
        let form = Parser::new(source).read(interp).unwrap().unwrap();
        let env = interp.module_environment(module).unwrap();
        crate::eval::evaluate(interp, module, env, form).unwrap()
    }

    #[test]
    fn type_of_reports_the_runtime_kind() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        let v = run(&mut interp, module, "(type-of 1)");
        assert_eq!(v.heap_ref(), interp.intern("integer").heap_ref());
    }

    #[test]
    fn identical_uses_identity_for_heap_values() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        assert_eq!(run(&mut interp, module, "(identical? 1 1)"), interp.constants.truth);
        assert_eq!(
            run(&mut interp, module, "(identical? (quote (1 2)) (quote (1 2)))"),
            Value::Nil
        );
    }

    #[test]
    fn equivalent_compares_one_level_by_identity() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        // Distinct (1 2) lists are not equivalent: their `first`/`rest`
        // cells are not identical, only structurally alike one level down.
        assert_eq!(
            run(&mut interp, module, "(equivalent? (quote (1 2)) (quote (1 2)))"),
            Value::Nil
        );
        assert_eq!(
            run(&mut interp, module, "(equivalent? (quote (1)) (quote (1)))"),
            interp.constants.truth
        );
    }

    #[test]
    fn equal_recurses_through_nested_structure() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        assert_eq!(
            run(&mut interp, module, "(equal? (quote (1 (2 3))) (quote (1 (2 3))))"),
            interp.constants.truth
        );
        assert_eq!(
            run(&mut interp, module, "(equal? (quote (1 2)) (quote (1 3)))"),
            Value::Nil
        );
    }
}
