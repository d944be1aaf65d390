// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The interpreter's root state: the heap, the symbol table, well-known
//! interned constants, the module registry, and the module search path.
//!
//! Every other component (the evaluator, the reader, the intrinsic modules)
//! takes `&mut Interp` rather than reaching for ambient globals, matching
//! the teacher's preference for an explicit `Process`/`ProcessPool` handle
//! threaded through every call instead of thread-local or static state.

use crate::equality::{hash_key, keys_equal};
use crate::error::{LoneError, LoneResult};
use crate::heap::cell::{Cell, HeapModule};
use crate::heap::Heap;
use crate::symbols::Symbols;
use crate::table::Table;
use crate::value::Value;

/// Symbols looked up often enough, or compared against often enough, that
/// interning them once at startup is worth a named field.
pub struct Constants {
    pub truth: Value,
    pub quote: Value,
    pub quasiquote: Value,
    pub unquote: Value,
    pub unquote_splice: Value,
}

impl Constants {
    fn new(interp_symbols: &mut Symbols, heap: &mut Heap) -> Self {
        Self {
            truth: interp_symbols.intern(heap, b"truth"),
            quote: interp_symbols.intern(heap, b"quote"),
            quasiquote: interp_symbols.intern(heap, b"quasiquote"),
            unquote: interp_symbols.intern(heap, b"unquote"),
            unquote_splice: interp_symbols.intern(heap, b"unquote-splice"),
        }
    }
}

/// Root interpreter state.
pub struct Interp {
    pub heap: Heap,
    pub symbols: Symbols,
    pub constants: Constants,
    /// Name (interned symbol) -> `Value::Module`.
    pub modules: Table,
    /// Directories searched, in order, when a named module has no embedded
    /// or already-loaded definition.
    pub module_search_path: Vec<std::path::PathBuf>,
    /// The anonymous module new top-level forms not inside any `module`
    /// form are evaluated against.
    pub null_module: Value,
    /// The embedded segment's `data` payload (the bytes following its
    /// descriptor table), shared so a (start, size) pair can be sliced out
    /// of it without copying. `None` when this binary carries no embedded
    /// segment.
    pub embedded_data: Option<std::rc::Rc<[u8]>>,
    /// The embedded descriptor's `modules` table: module-name symbol to a
    /// `(start . size)` pair into `embedded_data`, consulted by
    /// `module::module_for_name` when a name is not found on disk.
    pub embedded_modules: Option<Value>,
}

impl Interp {
    pub fn new() -> LoneResult<Self> {
        let mut heap = Heap::new();
        let mut symbols = Symbols::new()?;
        let constants = Constants::new(&mut symbols, &mut heap);

        let null_env = heap.alloc_cell(Cell::Table(Table::new()), true);
        let null_name = symbols.intern(&mut heap, b"");
        let null_module = heap.alloc_cell(
            Cell::Module(HeapModule {
                name: null_name,
                environment: Value::Table(null_env),
                exports: Vec::new(),
            }),
            true,
        );

        Ok(Self {
            heap,
            symbols,
            constants,
            modules: Table::new(),
            module_search_path: Vec::new(),
            null_module: Value::Module(null_module),
            embedded_data: None,
            embedded_modules: None,
        })
    }

    /// Intern `text` as a symbol.
    pub fn intern(&mut self, text: &str) -> Value {
        self.symbols.intern(&mut self.heap, text.as_bytes())
    }

    /// Look up a named module, returning `None` if it has not been loaded.
    #[must_use]
    pub fn find_module(&self, name: Value) -> Option<Value> {
        self.modules.get_own(name, |v| hash_key(v).ok(), keys_equal)
    }

    /// Register `module` under `name`, overwriting any previous registration
    /// — the mechanism `module.rs`'s insert-before-evaluate cycle guard
    /// relies on.
    pub fn register_module(&mut self, name: Value, module: Value) {
        self.modules.insert(name, module, |v| hash_key(v).ok(), keys_equal);
    }

    /// The table backing `module`'s environment.
    pub fn module_environment(&self, module: Value) -> LoneResult<Value> {
        match self.heap.get(module) {
            Cell::Module(m) => Ok(m.environment),
            _ => Err(LoneError::TypeMismatch { expected: "module", got: module.type_name() }),
        }
    }

    /// Run a collection, rooting at everything this struct keeps alive
    /// itself plus whatever transient roots the caller supplies (e.g. the
    /// evaluator's current environment and the value under construction).
    pub fn collect(&mut self, extra_roots: &[Value]) {
        let mut roots = vec![self.null_module];
        roots.extend(self.modules.entries().flat_map(|(k, v)| [k, v]));
        if let Some(modules) = self.embedded_modules {
            roots.push(modules);
        }
        roots.extend_from_slice(extra_roots);
        self.heap.collect(&roots);
    }
}

#[cfg(test)]
mod interp_test {
    use super::*;

    #[test]
    fn fresh_interpreter_has_a_null_module_with_an_empty_environment() {
        let interp = Interp::new().unwrap();
        let env = interp.module_environment(interp.null_module).unwrap();
        match interp.heap.get(env) {
            Cell::Table(t) => assert_eq!(t.len(), 0),
            _ => panic!("expected a table"),
        }
    }

    #[test]
    fn registering_a_module_makes_it_findable_by_name() {
        let mut interp = Interp::new().unwrap();
        let name = interp.intern("demo");
        interp.register_module(name, interp.null_module);
        assert!(interp.find_module(name).is_some());
        let other = interp.intern("missing");
        assert!(interp.find_module(other).is_none());
    }
}
