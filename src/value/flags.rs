// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The function/primitive application flag triple.
//!
//! Per the specification, the flag triple is the *entire* macro story: there
//! is no separate macro expander. `lambda!` and `lambda*` are just sugar for
//! setting `evaluate_arguments = false` and `evaluate_result = true`
//! respectively. Encoded as a small struct rather than bit fields, per the
//! redesign note in `SPEC_FULL.md` §3.

/// Controls how a `Function` or `Primitive` value is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flags {
    /// Evaluate each argument expression before binding/calling.
    pub evaluate_arguments: bool,
    /// Evaluate the function's/primitive's return value one more time.
    pub evaluate_result: bool,
    /// The last parameter collects any remaining arguments into a list.
    pub variable_arguments: bool,
}

impl Flags {
    /// `lambda`: evaluate arguments, evaluate body once, no varargs.
    #[must_use]
    pub const fn lambda() -> Self {
        Self {
            evaluate_arguments: true,
            evaluate_result: false,
            variable_arguments: false,
        }
    }

    /// `lambda!`: unevaluated arguments (fexpr-style).
    #[must_use]
    pub const fn lambda_bang() -> Self {
        Self {
            evaluate_arguments: false,
            evaluate_result: false,
            variable_arguments: false,
        }
    }

    /// `lambda*`: evaluate arguments, then evaluate the result once more.
    #[must_use]
    pub const fn lambda_star() -> Self {
        Self {
            evaluate_arguments: true,
            evaluate_result: true,
            variable_arguments: false,
        }
    }

    #[must_use]
    pub const fn with_variable_arguments(mut self, v: bool) -> Self {
        self.variable_arguments = v;
        self
    }
}
