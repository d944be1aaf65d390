// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The printer: renders a [`Value`] back to text.
//!
//! Lists print as `(a b c)`, improper lists as `(a b . c)`, vectors as
//! `[a b c]`, tables as `{k v k v}`, text double-quoted with its bytes
//! copied through verbatim (the lexeme has no escapes, so none are needed
//! on write), symbols bare, and `quote`/`quasiquote`/`unquote`/
//! `unquote-splice` two-element lists collapse back to their leading-
//! character shorthand.

use crate::heap::cell::Cell;
use crate::interp::Interp;
use crate::value::Value;
use std::fmt::Write as _;

fn shorthand_for(interp: &Interp, head: Value) -> Option<char> {
    if head == interp.constants.quote {
        Some('\'')
    } else if head == interp.constants.quasiquote {
        Some('`')
    } else if head == interp.constants.unquote {
        Some(',')
    } else {
        None
    }
}

/// Render `value` to a freshly allocated `String`.
#[must_use]
pub fn print_to_string(interp: &Interp, value: Value) -> String {
    let mut out = String::new();
    write_value(interp, value, &mut out);
    out
}

fn write_value(interp: &Interp, value: Value, out: &mut String) {
    match value {
        Value::Nil => out.push_str("()"),
        Value::Integer(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Pointer(p) => {
            let _ = write!(out, "#<pointer {:#x}>", p.addr);
        }
        Value::List(_) => write_list(interp, value, out),
        Value::Vector(r) => {
            let Cell::Vector(v) = interp.heap.get(Value::Vector(r)) else { unreachable!() };
            out.push('[');
            for (i, item) in v.items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(interp, *item, out);
            }
            out.push(']');
        }
        Value::Table(r) => {
            let Cell::Table(t) = interp.heap.get(Value::Table(r)) else { unreachable!() };
            out.push('{');
            for (i, (k, v)) in t.entries().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(interp, k, out);
                out.push(' ');
                write_value(interp, v, out);
            }
            out.push('}');
        }
        Value::Symbol(r) => {
            let Cell::Symbol(s) = interp.heap.get(Value::Symbol(r)) else { unreachable!() };
            out.push_str(&String::from_utf8_lossy(s.bytes.as_slice()));
        }
        Value::Text(r) => {
            let Cell::Text(t) = interp.heap.get(Value::Text(r)) else { unreachable!() };
            out.push('"');
            out.push_str(&String::from_utf8_lossy(t.bytes.as_slice()));
            out.push('"');
        }
        Value::Bytes(r) => {
            let Cell::Bytes(b) = interp.heap.get(Value::Bytes(r)) else { unreachable!() };
            out.push_str("#[");
            for (i, byte) in b.bytes.as_slice().iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{byte:02x}");
            }
            out.push(']');
        }
        Value::Module(r) => {
            let Cell::Module(m) = interp.heap.get(Value::Module(r)) else { unreachable!() };
            out.push_str("#<module ");
            write_value(interp, m.name, out);
            out.push('>');
        }
        Value::Function(_) => out.push_str("#<function>"),
        Value::Primitive(r) => {
            let Cell::Primitive(p) = interp.heap.get(Value::Primitive(r)) else { unreachable!() };
            out.push_str("#<primitive ");
            write_value(interp, p.name, out);
            out.push('>');
        }
        Value::Continuation(_) => out.push_str("#<continuation>"),
    }
}

fn write_list(interp: &Interp, value: Value, out: &mut String) {
    let Cell::Pair(first_pair) = interp.heap.get(value) else { unreachable!() };
    if first_pair.rest.type_name() == "list" || first_pair.rest.is_nil() {
        if let Some(ch) = shorthand_for(interp, first_pair.first) {
            if let Cell::Pair(inner) = interp.heap.get(first_pair.rest) {
                if inner.rest.is_nil() {
                    out.push(ch);
                    write_value(interp, inner.first, out);
                    return;
                }
            }
        }
    }

    out.push('(');
    let mut current = value;
    let mut first = true;
    loop {
        match current {
            Value::Nil => break,
            Value::List(_) => {
                let Cell::Pair(p) = interp.heap.get(current) else { unreachable!() };
                if !first {
                    out.push(' ');
                }
                first = false;
                write_value(interp, p.first, out);
                current = p.rest;
            }
            other => {
                out.push_str(" . ");
                write_value(interp, other, out);
                break;
            }
        }
    }
    out.push(')');
}

#[cfg(test)]
mod printer_test {
    use super::*;
    use crate::reader::Parser;

    fn round_trip(source: &str) -> String {
        let mut interp = Interp::new().unwrap();
        let value = Parser::new(source).read(&mut interp).unwrap().unwrap();
        print_to_string(&interp, value)
    }

    #[test]
    fn prints_a_simple_list() {
        assert_eq!(round_trip("(1 2 3)"), "(1 2 3)");
    }

    #[test]
    fn prints_nil_as_empty_parens() {
        assert_eq!(round_trip("()"), "()");
    }

    #[test]
    fn prints_a_vector() {
        assert_eq!(round_trip("[1 2 3]"), "[1 2 3]");
    }

    #[test]
    fn collapses_quote_to_its_shorthand() {
        assert_eq!(round_trip("'x"), "'x");
    }

    #[test]
    fn prints_text_bytes_verbatim_including_backslashes() {
        assert_eq!(round_trip(r#""a\nb""#), r#""a\nb""#);
    }

    #[test]
    fn prints_an_improper_list_with_a_dot() {
        let mut interp = Interp::new().unwrap();
        let a = Value::Integer(1);
        let b = Value::Integer(2);
        let r = interp
            .heap
            .alloc_cell(crate::heap::cell::Cell::Pair(crate::heap::cell::Pair { first: a, rest: b }), false);
        assert_eq!(print_to_string(&interp, Value::List(r)), "(1 . 2)");
    }
}
