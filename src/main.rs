// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `lone`: a freestanding Lisp interpreter.
//!
//! With no arguments, source is read from standard input. With one or more
//! file arguments, each is loaded as a top-level program into the null
//! module, in order. If the running executable carries an embedded `lone`
//! segment (see [`lone::embedded`]), that takes priority over both: the
//! embedded descriptor's `modules` and `run` forms are evaluated and
//! command-line arguments are left for the embedded program itself to read
//! via `linux/argv`.
//!
//! Every fallible step propagates a [`lone::error::LoneError`] with `?` up
//! to here, which is the only place that decides an exit code and the only
//! place that actually terminates the process — matching the
//! specification's three-posture error model (§7) while keeping every
//! layer below testable.

use lone::error::{LoneError, LoneResult, Posture};
use lone::interp::Interp;

fn exit_code_for(error: &LoneError) -> i32 {
    match error.posture() {
        Posture::ReaderRecoverable | Posture::EvaluatorFatal => 1,
        Posture::SystemFatal => 2,
    }
}

fn run() -> LoneResult<()> {
    let argv: Vec<String> = std::env::args().collect();
    let envp: Vec<String> = std::env::vars().map(|(k, v)| format!("{k}={v}")).collect();

    let mut interp = Interp::new()?;
    lone::intrinsics::install_all(&mut interp);
    let linux_module_name = interp.intern("linux");
    let linux_module = interp.find_module(linux_module_name).expect("linux module installed above");
    lone::intrinsics::linux::populate_environment(&mut interp, linux_module, &argv, &envp);

    if let Some(segment) = lone::embedded::find_embedded_segment()? {
        return lone::embedded::run_embedded(&mut interp, &segment);
    }

    let files = &argv[1..];
    if files.is_empty() {
        let mut source = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut source)
            .map_err(|e| LoneError::Io(format!("stdin: {e}")))?;
        lone::module::load_source_into(&mut interp, interp.null_module, &source)?;
    } else {
        for path in files {
            let source = std::fs::read_to_string(path)
                .map_err(|e| LoneError::Io(format!("{path}: {e}")))?;
            lone::module::load_source_into(&mut interp, interp.null_module, &source)?;
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("lone: {e}");
        lone::mem::exit(exit_code_for(&e));
    }
}
