// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Module loading and the `import`/`export` mechanism (component J).
//!
//! A module is loaded by name: first checked against the registry (which
//! also holds the intrinsic modules and the embedded descriptor's
//! preloaded modules, if any), then searched for on disk along
//! `Interp::module_search_path` as `<name>.lone`.
//!
//! The registry entry is inserted *before* the module's forms are
//! evaluated, with an empty environment. A `module` form that (directly or
//! transitively) imports itself therefore finds an already-registered,
//! partially-populated module rather than recursing forever — the
//! mechanism the specification calls "insert-before-evaluate" termination
//! for cyclic imports. Names not yet bound at the time of the cycle stay
//! unbound, which surfaces as an ordinary `Unbound` error at first use
//! rather than a loader hang.

use crate::error::{LoneError, LoneResult};
use crate::eval::{evaluate, Unwind};
use crate::heap::cell::{Cell, HeapModule};
use crate::interp::Interp;
use crate::reader::Parser;
use crate::table::Table;
use crate::value::Value;

fn new_empty_module(interp: &mut Interp, name: Value) -> Value {
    let env = interp.heap.alloc_cell(Cell::Table(Table::new()), true);
    let r = interp.heap.alloc_cell(
        Cell::Module(HeapModule { name, environment: Value::Table(env), exports: Vec::new() }),
        true,
    );
    Value::Module(r)
}

/// Find or load the module named `name` (an interned symbol).
pub fn module_for_name(interp: &mut Interp, name: Value) -> LoneResult<Value> {
    if let Some(module) = interp.find_module(name) {
        return Ok(module);
    }

    let module = new_empty_module(interp, name);
    interp.register_module(name, module);

    let Cell::Symbol(sym) = interp.heap.get(name) else {
        return Err(LoneError::TypeMismatch { expected: "symbol", got: name.type_name() });
    };
    let filename = format!("{}.lone", String::from_utf8_lossy(sym.bytes.as_slice()));

    let source = interp
        .module_search_path
        .iter()
        .find_map(|dir| std::fs::read_to_string(dir.join(&filename)).ok());

    let source = match source {
        Some(source) => source,
        None => match crate::embedded::load_from_embedded(interp, name)? {
            Some(source) => source,
            None => {
                return Err(LoneError::Unbound(format!(
                    "module {filename} not found on search path or embedded segment"
                )))
            }
        },
    };

    load_source_into(interp, module, &source)?;
    Ok(module)
}

/// Parse and evaluate every top-level form in `source` against `module`'s
/// own environment, running a collection between forms (the GC-at-
/// top-level-boundaries policy).
pub fn load_source_into(interp: &mut Interp, module: Value, source: &str) -> LoneResult<()> {
    let mut parser = Parser::new(source);
    let env = interp.module_environment(module)?;
    loop {
        let Some(form) = parser.read(interp)? else { break };
        match evaluate(interp, module, env, form) {
            Ok(_) => {}
            Err(Unwind::Error(e)) => return Err(e),
            Err(Unwind::Escape(..)) => {
                return Err(LoneError::NotApplicable("continuation escaped past top level"))
            }
        }
        interp.collect(&[module, env]);
    }
    Ok(())
}

/// Copy `source_module`'s exported bindings into `target_module`'s
/// environment, optionally restricted to `names`.
pub fn import(
    interp: &mut Interp,
    target_module: Value,
    source_module: Value,
    names: Option<&[Value]>,
) -> LoneResult<()> {
    let (source_env, exports) = match interp.heap.get(source_module) {
        Cell::Module(m) => (m.environment, m.exports.clone()),
        _ => return Err(LoneError::TypeMismatch { expected: "module", got: source_module.type_name() }),
    };
    let target_env = interp.module_environment(target_module)?;
    for export in exports {
        if let Some(allowed) = names {
            if !allowed.iter().any(|n| n.heap_ref() == export.heap_ref()) {
                continue;
            }
        }
        let Cell::Table(source_table) = interp.heap.get(source_env) else {
            return Err(LoneError::TypeMismatch { expected: "table", got: "non-table" });
        };
        let Some(value) = source_table.get_own(
            export,
            |v| crate::equality::hash_key(v).ok(),
            crate::equality::keys_equal,
        ) else {
            continue;
        };
        let Cell::Table(target_table) = interp.heap.get_mut(target_env) else {
            return Err(LoneError::TypeMismatch { expected: "table", got: "non-table" });
        };
        target_table.insert(export, value, |v| crate::equality::hash_key(v).ok(), crate::equality::keys_equal);
    }
    Ok(())
}

/// Export `name` from `module`: add it to the export list if not already
/// present. Does not check that `name` is actually bound yet, matching the
/// cyclic-import tolerance described above.
pub fn export(interp: &mut Interp, module: Value, name: Value) -> LoneResult<()> {
    let Cell::Module(m) = interp.heap.get_mut(module) else {
        return Err(LoneError::TypeMismatch { expected: "module", got: module.type_name() });
    };
    if !m.exports.iter().any(|e| e.heap_ref() == name.heap_ref()) {
        m.exports.push(name);
    }
    Ok(())
}
