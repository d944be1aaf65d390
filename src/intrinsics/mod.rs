// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Native primitives wired into the intrinsic modules (component K):
//! `lone`, `math`, `list`, `vector`, `table`, `text`, `bytes`, and `linux`.
//!
//! Every primitive has the same native signature, [`PrimitiveFn`], and is
//! installed with [`define`] into a module's environment table, exported by
//! name. A primitive's [`crate::value::Flags`] are almost always
//! `Flags::lambda()` (evaluate arguments, don't re-evaluate the result);
//! the few exceptions are noted where they are defined.

pub mod bytes;
pub mod linux;
pub mod list;
pub mod lone;
pub mod math;
pub mod table;
pub mod text;
pub mod vector;

use crate::eval::EvalResult;
use crate::heap::cell::{Cell, HeapPrimitive};
use crate::interp::Interp;
use crate::value::{Flags, Value};

/// Native code backing a primitive: interpreter, calling module, calling
/// environment, the argument list (already evaluated or not, per
/// `Flags::evaluate_arguments`), and the primitive's own closure value.
pub type PrimitiveFn = fn(&mut Interp, Value, Value, Value, Value) -> EvalResult;

/// Install `func` as `name` in `module`'s environment, with `flags`, and add
/// it to the module's export list.
pub fn define(interp: &mut Interp, module: Value, name: &str, flags: Flags, func: PrimitiveFn) {
    let symbol = interp.intern(name);
    let r = interp.heap.alloc_cell(
        Cell::Primitive(HeapPrimitive { name: symbol, func, closure: Value::Nil, flags }),
        true,
    );
    let env = interp.module_environment(module).expect("module has an environment");
    if let Cell::Table(t) = interp.heap.get_mut(env) {
        t.insert(
            symbol,
            Value::Primitive(r),
            |v| crate::equality::hash_key(v).ok(),
            crate::equality::keys_equal,
        );
    }
    if let Cell::Module(m) = interp.heap.get_mut(module) {
        m.exports.push(symbol);
    }
}

/// Create a fresh named module, registered with `interp`.
pub fn new_module(interp: &mut Interp, name: &str) -> Value {
    let name_symbol = interp.intern(name);
    let env_table = interp.heap.alloc_cell(crate::heap::cell::Cell::Table(crate::table::Table::new()), true);
    let module_ref = interp.heap.alloc_cell(
        Cell::Module(crate::heap::cell::HeapModule {
            name: name_symbol,
            environment: Value::Table(env_table),
            exports: Vec::new(),
        }),
        true,
    );
    let module = Value::Module(module_ref);
    interp.register_module(name_symbol, module);
    module
}

/// Register every intrinsic module into `interp`.
pub fn install_all(interp: &mut Interp) {
    let lone_module = new_module(interp, "lone");
    lone::install(interp, lone_module);

    let math_module = new_module(interp, "math");
    math::install(interp, math_module);

    let list_module = new_module(interp, "list");
    list::install(interp, list_module);

    let vector_module = new_module(interp, "vector");
    vector::install(interp, vector_module);

    let table_module = new_module(interp, "table");
    table::install(interp, table_module);

    let text_module = new_module(interp, "text");
    text::install(interp, text_module);

    let bytes_module = new_module(interp, "bytes");
    bytes::install(interp, bytes_module);

    let linux_module = new_module(interp, "linux");
    linux::install(interp, linux_module);
}

/// Collect a proper argument list into a `Vec`, used by nearly every
/// primitive below before matching on arity.
pub(crate) fn args_to_vec(interp: &Interp, mut args: Value) -> crate::error::LoneResult<Vec<Value>> {
    let mut items = Vec::new();
    loop {
        match args {
            Value::Nil => return Ok(items),
            Value::List(_) => {
                let Cell::Pair(p) = interp.heap.get(args) else { unreachable!() };
                items.push(p.first);
                args = p.rest;
            }
            _ => {
                return Err(crate::error::LoneError::TypeMismatch {
                    expected: "list",
                    got: args.type_name(),
                })
            }
        }
    }
}

#[cfg(test)]
mod intrinsics_test {
    use super::*;

    #[test]
    fn install_all_registers_every_module_by_name() {
        let mut interp = Interp::new().unwrap();
        install_all(&mut interp);
        for name in ["lone", "math", "list", "vector", "table", "text", "bytes", "linux"] {
            let symbol = interp.intern(name);
            assert!(interp.find_module(symbol).is_some(), "missing module {name}");
        }
    }
}
