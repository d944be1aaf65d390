// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Error postures for the Lone interpreter.
//!
//! The specification distinguishes three postures (§7): reader-recoverable,
//! evaluator-fatal, and system-fatal. The original reports the latter two by
//! calling `exit(-1)` directly from wherever the fault is detected. Per the
//! redesign note in `SPEC_FULL.md` §3, this crate instead propagates a typed
//! [`LoneError`] with `?` all the way to `main`, which performs the exit —
//! preserving the user-visible behavior (non-zero exit, no unwinding) while
//! admitting testability.

use core::fmt;
use std::string::String;

/// Something went wrong while running Lone code.
///
/// `Reader` errors are recoverable in principle (a caller may choose to
/// treat end-of-input as "stop reading" rather than abort); every other
/// variant is fatal per the specification and causes the process to exit
/// non-zero once it reaches `main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoneError {
    /// Malformed or incomplete input from the reader.
    Reader(crate::reader::ReadError),
    /// Reference to a name with no binding in scope.
    Unbound(String),
    /// Applied a value that is not a function or primitive.
    NotApplicable(&'static str),
    /// Wrong number of arguments for a function/primitive call.
    ArityMismatch { expected: &'static str, got: usize },
    /// A value did not have the type an operation required.
    TypeMismatch { expected: &'static str, got: &'static str },
    /// Division or remainder by zero.
    DivisionByZero,
    /// Dereferenced a `Pointer` whose subtype is `Unknown`.
    UnknownPointerSubtype,
    /// Attempted to hash a function, primitive, module, vector, or table.
    Unhashable(&'static str),
    /// A destructuring pattern did not match the shape of its input.
    DestructureMismatch,
    /// Arena/slab growth would overflow `usize`.
    ArenaOverflow,
    /// The embedded "lone" segment's descriptor did not parse, or a `run`
    /// slice's bounds exceeded the segment's `data` payload.
    EmbeddedSegment(String),
    /// A required syscall for setup failed.
    Syscall(&'static str, i64),
    /// Out of heap memory.
    OutOfMemory,
    /// A filesystem operation (reading a source file, stdin, or a module
    /// along the search path) failed.
    Io(String),
}

impl fmt::Display for LoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader(e) => write!(f, "read error: {e}"),
            Self::Unbound(name) => write!(f, "unbound symbol: {name}"),
            Self::NotApplicable(kind) => write!(f, "not applicable: {kind}"),
            Self::ArityMismatch { expected, got } => {
                write!(f, "arity mismatch: expected {expected}, got {got}")
            }
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::UnknownPointerSubtype => write!(f, "dereferenced pointer of unknown subtype"),
            Self::Unhashable(kind) => write!(f, "value of type {kind} is not hashable"),
            Self::DestructureMismatch => write!(f, "destructuring pattern did not match"),
            Self::ArenaOverflow => write!(f, "arena size arithmetic overflowed"),
            Self::EmbeddedSegment(msg) => write!(f, "embedded segment error: {msg}"),
            Self::Syscall(name, rc) => write!(f, "syscall {name} failed: {rc}"),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for LoneError {}

impl From<crate::reader::ReadError> for LoneError {
    fn from(e: crate::reader::ReadError) -> Self {
        Self::Reader(e)
    }
}

/// Posture classification, used by `main` to pick an exit code and by tests
/// that assert §7's three-way split without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posture {
    ReaderRecoverable,
    EvaluatorFatal,
    SystemFatal,
}

impl LoneError {
    #[must_use]
    pub const fn posture(&self) -> Posture {
        match self {
            Self::Reader(_) => Posture::ReaderRecoverable,
            Self::Unbound(_)
            | Self::NotApplicable(_)
            | Self::ArityMismatch { .. }
            | Self::TypeMismatch { .. }
            | Self::DivisionByZero
            | Self::UnknownPointerSubtype
            | Self::Unhashable(_)
            | Self::DestructureMismatch => Posture::EvaluatorFatal,
            Self::ArenaOverflow
            | Self::EmbeddedSegment(_)
            | Self::Syscall(_, _)
            | Self::OutOfMemory
            | Self::Io(_) => Posture::SystemFatal,
        }
    }
}

pub type LoneResult<T> = Result<T, LoneError>;
