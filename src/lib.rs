// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! A freestanding Lisp interpreter.
//!
//! `lone` reads and evaluates a small Lisp dialect: lists, vectors, and
//! tables as data; symbols interned and compared by identity; mark-and-sweep
//! garbage collection running only between top-level forms; a module
//! system with lazy loading along a search path; and a `linux` module
//! exposing raw syscalls to interpreted code. See [`interp::Interp`] for the
//! root of the object graph every other module operates on.

pub mod embedded;
pub mod equality;
pub mod error;
pub mod eval;
pub mod hash;
pub mod heap;
pub mod intrinsics;
pub mod interp;
pub mod mem;
pub mod module;
pub mod printer;
pub mod reader;
pub mod symbols;
pub mod table;
pub mod value;

/// The crate version, as set by Cargo at build time.
pub const VERSION: &str = match option_env!("CARGO_PKG_VERSION") {
    Some(v) => v,
    None => "unknown",
};
