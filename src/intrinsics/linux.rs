// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The `linux` module: the raw syscall escape hatch, plus `argv`/`envp`
//! bound as vectors once `main` knows what they are.
//!
//! `system-call` is deliberately thin: it forwards its arguments straight
//! to [`crate::mem::raw_syscall`] with no validation, exactly mirroring the
//! specification's framing of the kernel as "an external collaborator"
//! rather than something this crate wraps safely.

use super::args_to_vec;
use crate::error::LoneError;
use crate::eval::EvalResult;
use crate::heap::cell::{ByteStore, Cell, HeapText, HeapVector};
use crate::interp::Interp;
use crate::value::{Flags, Value};

fn integer_arg(v: Value) -> Result<i64, LoneError> {
    match v {
        Value::Integer(n) => Ok(n),
        Value::Pointer(p) => Ok(p.addr as i64),
        other => Err(LoneError::TypeMismatch { expected: "integer or pointer", got: other.type_name() }),
    }
}

fn system_call(interp: &mut Interp, _module: Value, _env: Value, args: Value, _closure: Value) -> EvalResult {
    let items = args_to_vec(interp, args)?;
    let [number, rest @ ..] = items.as_slice() else {
        return Err(LoneError::ArityMismatch { expected: "at least 1", got: 0 }.into());
    };
    if rest.len() > 6 {
        return Err(LoneError::ArityMismatch { expected: "at most 7", got: items.len() }.into());
    }
    let mut call_args = [0i64; 6];
    for (slot, arg) in call_args.iter_mut().zip(rest) {
        *slot = integer_arg(*arg)?;
    }
    let n = integer_arg(*number)?;
    // SAFETY: the specification places argument validity entirely on the
    // interpreted caller; this primitive is the raw escape hatch.
    let result = unsafe { crate::mem::raw_syscall(n, call_args) };
    Ok(Value::Integer(result))
}

pub fn install(interp: &mut Interp, module: Value) {
    super::define(interp, module, "system-call", Flags::lambda(), system_call);
}

/// Bind `argv` and `envp` into `module`'s environment as vectors of `text`
/// values, and export both names. Called once from `main` with the
/// process's actual command line, since the intrinsic modules themselves
/// have no access to it at registration time.
pub fn populate_environment(interp: &mut Interp, module: Value, argv: &[String], envp: &[String]) {
    let argv_value = make_text_vector(interp, argv);
    let envp_value = make_text_vector(interp, envp);
    bind_export(interp, module, "argv", argv_value);
    bind_export(interp, module, "envp", envp_value);
}

fn make_text_vector(interp: &mut Interp, strings: &[String]) -> Value {
    let items: Vec<Value> = strings
        .iter()
        .map(|s| {
            let r = interp.heap.alloc_cell(Cell::Text(HeapText { bytes: ByteStore::owned(s.as_bytes()) }), false);
            Value::Text(r)
        })
        .collect();
    let r = interp.heap.alloc_cell(Cell::Vector(HeapVector { items }), false);
    Value::Vector(r)
}

fn bind_export(interp: &mut Interp, module: Value, name: &str, value: Value) {
    let symbol = interp.intern(name);
    let env = interp.module_environment(module).expect("module has an environment");
    if let Cell::Table(t) = interp.heap.get_mut(env) {
        t.insert(symbol, value, |v| crate::equality::hash_key(v).ok(), crate::equality::keys_equal);
    }
    if let Cell::Module(m) = interp.heap.get_mut(module) {
        m.exports.push(symbol);
    }
}

#[cfg(test)]
mod linux_test {
    use super::*;

    #[test]
    fn populate_environment_binds_argv_as_a_vector_of_text() {
        let mut interp = Interp::new().unwrap();
        let module = interp.null_module;
        populate_environment(&mut interp, module, &["lone".to_string(), "a.lone".to_string()], &[]);
        let symbol = interp.intern("argv");
        let env = interp.module_environment(module).unwrap();
        let Cell::Table(t) = interp.heap.get(env) else { panic!("expected table") };
        let argv = t
            .get_own(symbol, |v| crate::equality::hash_key(v).ok(), crate::equality::keys_equal)
            .unwrap();
        let Cell::Vector(v) = interp.heap.get(argv) else { panic!("expected vector") };
        assert_eq!(v.items.len(), 2);
    }
}
