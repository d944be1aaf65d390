// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The evaluator: a recursive tree-walker over [`Value`] forms.
//!
//! Special forms are matched by interned symbol identity against the head
//! of a list. Everything else goes through `apply`, which dispatches on the
//! callee's [`crate::value::Flags`] triple (`evaluate_arguments`,
//! `evaluate_result`, `variable_arguments`) exactly as the specification's
//! `lambda`/`lambda!`/`lambda*` family describes.
//!
//! Continuations are escape-only and one-shot: `control` reifies the
//! dynamic extent up to its own call as a [`HeapContinuation`], and invoking
//! one later unwinds the Rust call stack back to that point via
//! [`Unwind::Escape`] rather than a re-entrant frame trampoline. Per
//! `SPEC_FULL.md` §3, this is safe specifically because garbage collection
//! never runs mid-evaluation (see `Interp::collect`'s callers in `main.rs`),
//! so no GC root bookkeeping is needed across the unwind.

use crate::error::{LoneError, LoneResult};
use crate::equality::{hash_key, keys_equal};
use crate::heap::cell::{Cell, HeapContinuation, HeapFunction, Pair};
use crate::interp::Interp;
use crate::table::Table;
use crate::value::{Flags, Value};

/// A non-local transfer of control triggered by invoking a continuation.
/// Propagated as the error side of a `Result` so ordinary `?` plumbing
/// carries it back to the matching `control` frame.
pub enum Unwind {
    Escape(u64, Value),
    Error(LoneError),
}

impl From<LoneError> for Unwind {
    fn from(e: LoneError) -> Self {
        Self::Error(e)
    }
}

pub type EvalResult = Result<Value, Unwind>;

fn list_parts(interp: &Interp, value: Value) -> Option<(Value, Value)> {
    if let Value::List(_) = value {
        if let Cell::Pair(p) = interp.heap.get(value) {
            return Some((p.first, p.rest));
        }
    }
    None
}

/// Collect a proper list into a `Vec`, erroring if it is improper.
pub(crate) fn list_to_vec(interp: &Interp, mut value: Value) -> LoneResult<Vec<Value>> {
    let mut items = Vec::new();
    loop {
        match value {
            Value::Nil => return Ok(items),
            Value::List(_) => {
                let Cell::Pair(p) = interp.heap.get(value) else { unreachable!() };
                items.push(p.first);
                value = p.rest;
            }
            _ => return Err(LoneError::TypeMismatch { expected: "list", got: value.type_name() }),
        }
    }
}

pub(crate) fn vec_to_list(interp: &mut Interp, items: &[Value]) -> Value {
    let mut list = Value::Nil;
    for item in items.iter().rev() {
        let r = interp.heap.alloc_cell(Cell::Pair(Pair { first: *item, rest: list }), false);
        list = Value::List(r);
    }
    list
}

fn is_named(interp: &Interp, value: Value, name: Value) -> bool {
    value.heap_ref().is_some() && value.heap_ref() == name.heap_ref()
}

/// Look up `symbol` in `env`, following the prototype chain.
fn lookup(interp: &Interp, env: Value, symbol: Value) -> LoneResult<Value> {
    let mut current = env;
    loop {
        let Cell::Table(t) = interp.heap.get(current) else {
            return Err(LoneError::TypeMismatch { expected: "table", got: current.type_name() });
        };
        if let Some(v) = t.get_own(symbol, |v| hash_key(v).ok(), keys_equal) {
            return Ok(v);
        }
        if t.prototype.is_nil() {
            let name = crate::printer::print_to_string(interp, symbol);
            return Err(LoneError::Unbound(name));
        }
        current = t.prototype;
    }
}

fn bind(interp: &mut Interp, env: Value, symbol: Value, value: Value) -> LoneResult<()> {
    let Cell::Table(t) = interp.heap.get_mut(env) else {
        return Err(LoneError::TypeMismatch { expected: "table", got: env.type_name() });
    };
    t.insert(symbol, value, |v| hash_key(v).ok(), keys_equal);
    Ok(())
}

/// Rebind `symbol` in the nearest environment in the chain that already
/// binds it (`set`'s mutation semantics), or the current environment if
/// none does.
fn set(interp: &mut Interp, env: Value, symbol: Value, value: Value) -> LoneResult<()> {
    let mut current = env;
    loop {
        let has_own = match interp.heap.get(current) {
            Cell::Table(t) => t.get_own(symbol, |v| hash_key(v).ok(), keys_equal).is_some(),
            _ => return Err(LoneError::TypeMismatch { expected: "table", got: current.type_name() }),
        };
        if has_own {
            return bind(interp, current, symbol, value);
        }
        let prototype = match interp.heap.get(current) {
            Cell::Table(t) => t.prototype,
            _ => unreachable!(),
        };
        if prototype.is_nil() {
            return bind(interp, env, symbol, value);
        }
        current = prototype;
    }
}

fn child_environment(interp: &mut Interp, parent: Value) -> Value {
    let r = interp.heap.alloc_cell(Cell::Table(Table::with_prototype(parent)), false);
    Value::Table(r)
}

/// Evaluate `form` in `module`'s namespace, under `env`.
pub fn evaluate(interp: &mut Interp, module: Value, env: Value, form: Value) -> EvalResult {
    match form {
        Value::Symbol(_) => Ok(lookup(interp, env, form)?),
        Value::List(_) => evaluate_list(interp, module, env, form),
        Value::Nil | Value::Integer(_) | Value::Pointer(_) | Value::Vector(_) | Value::Table(_)
        | Value::Text(_) | Value::Bytes(_) | Value::Module(_) | Value::Function(_)
        | Value::Primitive(_) | Value::Continuation(_) => Ok(form),
    }
}

fn evaluate_list(interp: &mut Interp, module: Value, env: Value, form: Value) -> EvalResult {
    let Some((head, rest)) = list_parts(interp, form) else {
        return Ok(Value::Nil);
    };

    if let Value::Symbol(_) = head {
        if is_named(interp, head, interp.constants.quote) {
            let (first, _) = list_parts(interp, rest).ok_or(LoneError::DestructureMismatch)?;
            return Ok(first);
        }
        if is_named(interp, head, interp.constants.quasiquote) {
            let (first, _) = list_parts(interp, rest).ok_or(LoneError::DestructureMismatch)?;
            return Ok(quasiquote(interp, module, env, first, 1)?);
        }
        if let Some(special) = special_form_name(interp, head) {
            return eval_special(interp, module, env, special, rest);
        }
    }

    let callee = evaluate(interp, module, env, head)?;
    let arguments = list_to_vec(interp, rest)?;
    apply(interp, module, env, callee, &arguments)
}

#[derive(Clone, Copy)]
enum Special {
    If,
    When,
    Unless,
    Let,
    Set,
    Begin,
    Lambda,
    LambdaBang,
    LambdaStar,
    Return,
    Control,
    Module,
    Import,
    Export,
}

fn special_form_name(interp: &mut Interp, head: Value) -> Option<Special> {
    let names: &[(&str, Special)] = &[
        ("if", Special::If),
        ("when", Special::When),
        ("unless", Special::Unless),
        ("let", Special::Let),
        ("set", Special::Set),
        ("begin", Special::Begin),
        ("lambda", Special::Lambda),
        ("lambda!", Special::LambdaBang),
        ("lambda*", Special::LambdaStar),
        ("return", Special::Return),
        ("control", Special::Control),
        ("module", Special::Module),
        ("import", Special::Import),
        ("export", Special::Export),
    ];
    for (name, special) in names {
        let symbol = interp.intern(name);
        if is_named(interp, head, symbol) {
            return Some(*special);
        }
    }
    None
}

fn eval_special(
    interp: &mut Interp,
    module: Value,
    env: Value,
    special: Special,
    rest: Value,
) -> EvalResult {
    match special {
        Special::If => {
            let items = list_to_vec(interp, rest)?;
            let [cond, then, ..] = items.as_slice() else {
                return Err(Unwind::Error(LoneError::DestructureMismatch));
            };
            let cond_value = evaluate(interp, module, env, *cond)?;
            if !cond_value.is_nil_like() {
                evaluate(interp, module, env, *then)
            } else if let Some(else_branch) = items.get(2) {
                evaluate(interp, module, env, *else_branch)
            } else {
                Ok(Value::Nil)
            }
        }
        Special::When => {
            let items = list_to_vec(interp, rest)?;
            let [cond, body @ ..] = items.as_slice() else {
                return Err(Unwind::Error(LoneError::DestructureMismatch));
            };
            if evaluate(interp, module, env, *cond)?.is_nil_like() {
                Ok(Value::Nil)
            } else {
                eval_body(interp, module, env, body)
            }
        }
        Special::Unless => {
            let items = list_to_vec(interp, rest)?;
            let [cond, body @ ..] = items.as_slice() else {
                return Err(Unwind::Error(LoneError::DestructureMismatch));
            };
            if evaluate(interp, module, env, *cond)?.is_nil_like() {
                eval_body(interp, module, env, body)
            } else {
                Ok(Value::Nil)
            }
        }
        Special::Let => eval_let(interp, module, env, rest),
        Special::Set => {
            let items = list_to_vec(interp, rest)?;
            let [symbol, value_form] = items.as_slice() else {
                return Err(Unwind::Error(LoneError::DestructureMismatch));
            };
            let value = evaluate(interp, module, env, *value_form)?;
            set(interp, env, *symbol, value)?;
            Ok(value)
        }
        Special::Begin => {
            let items = list_to_vec(interp, rest)?;
            eval_body(interp, module, env, &items)
        }
        Special::Lambda => make_lambda(interp, env, rest, Flags::lambda()),
        Special::LambdaBang => make_lambda(interp, env, rest, Flags::lambda_bang()),
        Special::LambdaStar => make_lambda(interp, env, rest, Flags::lambda_star()),
        Special::Return => {
            let items = list_to_vec(interp, rest)?;
            let value = match items.first() {
                Some(form) => evaluate(interp, module, env, *form)?,
                None => Value::Nil,
            };
            Ok(value)
        }
        Special::Control => eval_control(interp, module, env, rest),
        Special::Module => eval_module_form(interp, rest),
        Special::Import => eval_import(interp, module, rest),
        Special::Export => eval_export(interp, module, env, rest),
    }
}

fn eval_module_form(interp: &mut Interp, rest: Value) -> EvalResult {
    let items = list_to_vec(interp, rest)?;
    let [name, body @ ..] = items.as_slice() else {
        return Err(Unwind::Error(LoneError::DestructureMismatch));
    };
    let module = match interp.find_module(*name) {
        Some(existing) => existing,
        None => crate::intrinsics::new_module(interp, &crate::printer::print_to_string(interp, *name)),
    };
    let env = interp.module_environment(module)?;
    eval_body(interp, module, env, body)?;
    Ok(module)
}

fn eval_import(interp: &mut Interp, module: Value, rest: Value) -> EvalResult {
    let items = list_to_vec(interp, rest)?;
    let [source_name, selectors @ ..] = items.as_slice() else {
        return Err(Unwind::Error(LoneError::DestructureMismatch));
    };
    let source_module = crate::module::module_for_name(interp, *source_name)?;
    let names: Option<Vec<Value>> = if selectors.is_empty() {
        None
    } else {
        Some(selectors.to_vec())
    };
    crate::module::import(interp, module, source_module, names.as_deref())?;
    Ok(Value::Nil)
}

fn eval_export(interp: &mut Interp, module: Value, env: Value, rest: Value) -> EvalResult {
    let names = list_to_vec(interp, rest)?;
    for name in names {
        let _ = lookup(interp, env, name);
        crate::module::export(interp, module, name)?;
    }
    Ok(Value::Nil)
}

fn eval_body(interp: &mut Interp, module: Value, env: Value, body: &[Value]) -> EvalResult {
    let mut result = Value::Nil;
    for form in body {
        result = evaluate(interp, module, env, *form)?;
    }
    Ok(result)
}

fn eval_let(interp: &mut Interp, module: Value, env: Value, rest: Value) -> EvalResult {
    let items = list_to_vec(interp, rest)?;
    let [bindings_form, body @ ..] = items.as_slice() else {
        return Err(Unwind::Error(LoneError::DestructureMismatch));
    };
    let bindings = list_to_vec(interp, *bindings_form)?;
    let child = child_environment(interp, env);
    for binding in bindings {
        let pair = list_to_vec(interp, binding)?;
        let [symbol, value_form] = pair.as_slice() else {
            return Err(Unwind::Error(LoneError::DestructureMismatch));
        };
        let value = evaluate(interp, module, child, *value_form)?;
        bind(interp, child, *symbol, value)?;
    }
    eval_body(interp, module, child, body)
}

fn make_lambda(interp: &mut Interp, env: Value, rest: Value, flags: Flags) -> EvalResult {
    let (parameters, body) = list_parts(interp, rest).ok_or(LoneError::DestructureMismatch)?;
    let r = interp.heap.alloc_cell(
        Cell::Function(HeapFunction { parameters, code: body, environment: env, flags }),
        false,
    );
    Ok(Value::Function(r))
}

fn eval_control(interp: &mut Interp, module: Value, env: Value, rest: Value) -> EvalResult {
    let items = list_to_vec(interp, rest)?;
    let [symbol, body @ ..] = items.as_slice() else {
        return Err(Unwind::Error(LoneError::DestructureMismatch));
    };
    static NEXT_TAG: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
    let tag = NEXT_TAG.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let r = interp.heap.alloc_cell(Cell::Continuation(HeapContinuation { tag }), false);
    let child = child_environment(interp, env);
    bind(interp, child, *symbol, Value::Continuation(r))?;
    match eval_body(interp, module, child, body) {
        Ok(value) => Ok(value),
        Err(Unwind::Escape(escape_tag, value)) if escape_tag == tag => Ok(value),
        Err(other) => Err(other),
    }
}

/// Quasiquote expansion: `unquote` evaluates its argument in place,
/// `unquote-splice` evaluates to a list and splices its elements, and
/// everything else is copied structurally. `depth` tracks nested
/// quasiquotes so only unquotes at the matching depth fire.
fn quasiquote(interp: &mut Interp, module: Value, env: Value, form: Value, depth: u32) -> EvalResult {
    let Some((head, rest)) = list_parts(interp, form) else {
        return Ok(form);
    };
    if let Value::Symbol(_) = head {
        if is_named(interp, head, interp.constants.unquote) {
            let (inner, _) = list_parts(interp, rest).ok_or(LoneError::DestructureMismatch)?;
            return if depth == 1 {
                evaluate(interp, module, env, inner)
            } else {
                let expanded = quasiquote(interp, module, env, inner, depth - 1)?;
                let tail = vec_to_list(interp, &[expanded]);
                let unquote_symbol = interp.constants.unquote;
                Ok(cons(interp, unquote_symbol, tail))
            };
        }
        if is_named(interp, head, interp.constants.quasiquote) {
            let (inner, _) = list_parts(interp, rest).ok_or(LoneError::DestructureMismatch)?;
            let expanded = quasiquote(interp, module, env, inner, depth + 1)?;
            let tail = vec_to_list(interp, &[expanded]);
            let quasiquote_symbol = interp.constants.quasiquote;
            return Ok(cons(interp, quasiquote_symbol, tail));
        }
    }

    let mut results: Vec<Value> = Vec::new();
    let mut current = form;
    loop {
        match current {
            Value::Nil => break,
            Value::List(_) => {
                let Cell::Pair(p) = interp.heap.get(current) else { unreachable!() };
                let (item, next) = (p.first, p.rest);
                if let Some((inner_head, inner_rest)) = list_parts(interp, item) {
                    if matches!(inner_head, Value::Symbol(_))
                        && is_named(interp, inner_head, interp.constants.unquote_splice)
                    {
                        let (spliced_form, _) =
                            list_parts(interp, inner_rest).ok_or(LoneError::DestructureMismatch)?;
                        let spliced = if depth == 1 {
                            evaluate(interp, module, env, spliced_form)?
                        } else {
                            spliced_form
                        };
                        results.extend(list_to_vec(interp, spliced)?);
                        current = next;
                        continue;
                    }
                }
                results.push(quasiquote(interp, module, env, item, depth)?);
                current = next;
            }
            other => {
                results.push(quasiquote(interp, module, env, other, depth)?);
                break;
            }
        }
    }
    Ok(vec_to_list(interp, &results))
}

fn cons(interp: &mut Interp, first: Value, rest: Value) -> Value {
    let r = interp.heap.alloc_cell(Cell::Pair(Pair { first, rest }), false);
    Value::List(r)
}

/// Apply `callee` to `arguments`, honoring its `Flags` triple.
///
/// - `evaluate_arguments`: if false (`lambda!`), arguments arrive
///   unevaluated, as the caller's own forms.
/// - `variable_arguments`: if true, all arguments are bound as a single
///   list to the function's one declared parameter, rather than
///   positionally.
/// - `evaluate_result`: if true (`lambda*`), the function's result is
///   itself evaluated again in the caller's environment — the mechanism
///   behind Lone's macro-like forms.
pub fn apply(
    interp: &mut Interp,
    module: Value,
    env: Value,
    callee: Value,
    arguments: &[Value],
) -> EvalResult {
    match callee {
        Value::Primitive(r) => {
            let Cell::Primitive(p) = interp.heap.get(Value::Primitive(r)) else { unreachable!() };
            let flags = p.flags;
            let func = p.func;
            let closure = p.closure;
            let evaluated = if flags.evaluate_arguments {
                let mut out = Vec::with_capacity(arguments.len());
                for a in arguments {
                    out.push(evaluate(interp, module, env, *a)?);
                }
                out
            } else {
                arguments.to_vec()
            };
            let args_list = vec_to_list(interp, &evaluated);
            let result = func(interp, module, env, args_list, closure)?;
            if flags.evaluate_result {
                evaluate(interp, module, env, result)
            } else {
                Ok(result)
            }
        }
        Value::Function(r) => {
            let Cell::Function(f) = interp.heap.get(Value::Function(r)) else { unreachable!() };
            let f = f.clone();
            let evaluated = if f.flags.evaluate_arguments {
                let mut out = Vec::with_capacity(arguments.len());
                for a in arguments {
                    out.push(evaluate(interp, module, env, *a)?);
                }
                out
            } else {
                arguments.to_vec()
            };
            let call_env = child_environment(interp, f.environment);
            bind_parameters(interp, call_env, f.parameters, &evaluated, f.flags.variable_arguments)?;
            let body = list_to_vec(interp, f.code)?;
            let result = eval_body(interp, module, call_env, &body)?;
            if f.flags.evaluate_result {
                evaluate(interp, module, env, result)
            } else {
                Ok(result)
            }
        }
        Value::Continuation(r) => {
            let Cell::Continuation(c) = interp.heap.get(Value::Continuation(r)) else {
                unreachable!()
            };
            let tag = c.tag;
            let value = match arguments.first() {
                Some(form) => evaluate(interp, module, env, *form)?,
                None => Value::Nil,
            };
            Err(Unwind::Escape(tag, value))
        }
        other => Err(Unwind::Error(LoneError::NotApplicable(other.type_name()))),
    }
}

fn bind_parameters(
    interp: &mut Interp,
    env: Value,
    parameters: Value,
    arguments: &[Value],
    variable_arguments: bool,
) -> LoneResult<()> {
    if variable_arguments {
        let symbol = parameters;
        let list = vec_to_list(interp, arguments);
        return bind(interp, env, symbol, list);
    }
    let names = list_to_vec(interp, parameters)?;
    if names.len() != arguments.len() {
        return Err(LoneError::ArityMismatch { expected: "matching parameter count", got: arguments.len() });
    }
    for (name, value) in names.iter().zip(arguments.iter()) {
        bind(interp, env, *name, *value)?;
    }
    Ok(())
}

#[cfg(test)]
mod eval_test {
    use super::*;
    use crate::reader::Parser;

    fn run(interp: &mut Interp, source: &str) -> Value {
        let form = Parser::new(source).read(interp).unwrap().unwrap();
        let env = interp.module_environment(interp.null_module).unwrap();
        match evaluate(interp, interp.null_module, env, form) {
            Ok(v) => v,
            Err(Unwind::Error(e)) => panic!("eval error: {e}"),
            Err(Unwind::Escape(..)) => panic!("unexpected escape at top level"),
        }
    }

    #[test]
    fn evaluates_quote_without_evaluating_its_argument() {
        let mut interp = Interp::new().unwrap();
        let v = run(&mut interp, "(quote (a b))");
        assert_eq!(v.type_name(), "list");
    }

    #[test]
    fn if_picks_the_matching_branch() {
        let mut interp = Interp::new().unwrap();
        assert_eq!(run(&mut interp, "(if 1 2 3)"), Value::Integer(2));
        assert_eq!(run(&mut interp, "(if () 2 3)"), Value::Integer(3));
    }

    #[test]
    fn let_introduces_a_child_scope() {
        let mut interp = Interp::new().unwrap();
        assert_eq!(run(&mut interp, "(let ((x 1) (y 2)) (set x 3) x)"), Value::Integer(3));
    }

    #[test]
    fn lambda_closes_over_its_defining_environment() {
        let mut interp = Interp::new().unwrap();
        let v = run(&mut interp, "(let ((adder (lambda (x) x))) (adder 42))");
        assert_eq!(v, Value::Integer(42));
    }

    #[test]
    fn control_captures_an_escape_continuation() {
        let mut interp = Interp::new().unwrap();
        let v = run(&mut interp, "(control k (begin (k 1) 2))");
        assert_eq!(v, Value::Integer(1));
    }

    #[test]
    fn quasiquote_splices_unquote_splice_lists() {
        let mut interp = Interp::new().unwrap();
        let v = run(&mut interp, "(let ((xs (quote (2 3)))) `(1 ,@xs 4))");
        let items = list_to_vec(&interp, v).unwrap();
        assert_eq!(items, vec![Value::Integer(1), Value::Integer(2), Value::Integer(3), Value::Integer(4)]);
    }
}
