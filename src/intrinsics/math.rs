// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Integer arithmetic and comparison primitives.

use super::args_to_vec;
use crate::error::LoneError;
use crate::eval::EvalResult;
use crate::interp::Interp;
use crate::value::{Flags, Value};

fn integer(v: Value) -> Result<i64, LoneError> {
    match v {
        Value::Integer(n) => Ok(n),
        other => Err(LoneError::TypeMismatch { expected: "integer", got: other.type_name() }),
    }
}

fn add(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let mut total: i64 = 0;
    for item in items {
        total = total.wrapping_add(integer(item)?);
    }
    Ok(Value::Integer(total))
}

fn sub(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    match items.as_slice() {
        [] => Ok(Value::Integer(0)),
        [only] => Ok(Value::Integer(-integer(*only)?)),
        [first, rest @ ..] => {
            let mut total = integer(*first)?;
            for item in rest {
                total = total.wrapping_sub(integer(*item)?);
            }
            Ok(Value::Integer(total))
        }
    }
}

fn mul(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let mut total: i64 = 1;
    for item in items {
        total = total.wrapping_mul(integer(item)?);
    }
    Ok(Value::Integer(total))
}

fn div(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [first, rest @ ..] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "at least 1", got: 0 }.into());
    };
    let mut total = integer(*first)?;
    for item in rest {
        let divisor = integer(*item)?;
        if divisor == 0 {
            return Err(LoneError::DivisionByZero.into());
        }
        total /= divisor;
    }
    Ok(Value::Integer(total))
}

fn modulo(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [a, b] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "2", got: items.len() }.into());
    };
    let divisor = integer(*b)?;
    if divisor == 0 {
        return Err(LoneError::DivisionByZero.into());
    }
    Ok(Value::Integer(integer(*a)? % divisor))
}

fn compare(
    interp: &mut Interp,
    args: Value,
    op: impl Fn(i64, i64) -> bool,
) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    for pair in items.windows(2) {
        if !op(integer(pair[0])?, integer(pair[1])?) {
            return Ok(Value::Nil);
        }
    }
    Ok(items.first().copied().unwrap_or(Value::Nil))
}

fn equal(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    compare(interp, args, |a, b| a == b)
}

fn less_than(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    compare(interp, args, |a, b| a < b)
}

fn less_or_equal(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    compare(interp, args, |a, b| a <= b)
}

fn greater_than(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    compare(interp, args, |a, b| a > b)
}

fn greater_or_equal(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    compare(interp, args, |a, b| a >= b)
}

pub fn install(interp: &mut Interp, module: Value) {
    super::define(interp, module, "+", Flags::lambda(), add);
    super::define(interp, module, "-", Flags::lambda(), sub);
    super::define(interp, module, "*", Flags::lambda(), mul);
    super::define(interp, module, "/", Flags::lambda(), div);
    super::define(interp, module, "%", Flags::lambda(), modulo);
    super::define(interp, module, "=", Flags::lambda(), equal);
    super::define(interp, module, "<", Flags::lambda(), less_than);
    super::define(interp, module, "<=", Flags::lambda(), less_or_equal);
    super::define(interp, module, ">", Flags::lambda(), greater_than);
    super::define(interp, module, ">=", Flags::lambda(), greater_or_equal);
}

#[cfg(test)]
mod math_test {
    use super::*;
    use crate::reader::Parser;

    fn run(interp: &mut Interp, module: Value, source: &str) -> Value {
        let form = Parser::new(source).read(interp).unwrap().unwrap();
        let env = interp.module_environment(module).unwrap();
        crate::eval::evaluate(interp, module, env, form).unwrap()
    }

    #[test]
    fn addition_sums_every_argument() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        assert_eq!(run(&mut interp, module, "(+ 1 2 3)"), Value::Integer(6));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        install(&mut interp, module);
        let env = interp.module_environment(module).unwrap();
        let form = Parser::new("(/ 1 0)").read(&mut interp).unwrap().unwrap();
        let err = crate::eval::evaluate(&mut interp, module, env, form);
        assert!(matches!(err, Err(crate::eval::Unwind::Error(LoneError::DivisionByZero))));
    }
}
