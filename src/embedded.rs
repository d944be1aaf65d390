// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The embedded-segment loader (component L).
//!
//! A `lone` binary can carry its own Lone source embedded as a PT_LONE
//! program header (type `0x6c6f6e65`, the ASCII bytes "lone"). At startup,
//! the auxiliary vector is consulted for `AT_PHDR`/`AT_PHNUM`/`AT_PHENT` to
//! walk the running executable's own program headers and find that
//! segment, the same way the kernel itself locates `PT_INTERP` and
//! `PT_LOAD`. The segment's bytes are a reader-parseable descriptor table
//! (keyed by the symbols `data`, `modules`, `run`) followed directly by an
//! opaque byte payload: everything after the descriptor form is `data`.
//! `modules` maps module names to `(start . size)` pairs into `data`, kept
//! on `Interp` for on-demand loading (`module::module_for_name`'s fallback)
//! rather than eagerly evaluated; `run`, if present, is itself a
//! `(start . size)` pair whose slice is evaluated as the body of the null
//! module at startup.

use crate::error::{LoneError, LoneResult};
use crate::heap::cell::{ByteStore, Cell, HeapBytes};
use crate::interp::Interp;
use crate::value::Value;
use linux_libc_auxv::AuxVarType;
use std::fs;
use std::rc::Rc;

/// ELF program header type for Lone's embedded segment: the bytes "lone"
/// read as a little-endian `u32`.
const PT_LONE: u32 = 0x656e_6f6c;

#[derive(Clone, Copy)]
struct ProgramHeader {
    p_type: u32,
    p_offset: u64,
    p_filesz: u64,
}

fn read_auxv() -> LoneResult<Vec<(usize, usize)>> {
    let bytes = fs::read("/proc/self/auxv")
        .map_err(|e| LoneError::Io(format!("/proc/self/auxv: {e}")))?;
    let word = std::mem::size_of::<usize>();
    let mut pairs = Vec::new();
    let mut i = 0;
    while i + 2 * word <= bytes.len() {
        let key = usize::from_ne_bytes(bytes[i..i + word].try_into().expect("word-sized slice"));
        let value = usize::from_ne_bytes(
            bytes[i + word..i + 2 * word].try_into().expect("word-sized slice"),
        );
        if key == AuxVarType::Null.val() {
            break;
        }
        pairs.push((key, value));
        i += 2 * word;
    }
    Ok(pairs)
}

fn auxv_lookup(pairs: &[(usize, usize)], key: AuxVarType) -> Option<usize> {
    pairs.iter().find(|(k, _)| *k == key.val()).map(|(_, v)| *v)
}

fn read_program_headers(phdr_addr: usize, phent: usize, phnum: usize) -> LoneResult<Vec<ProgramHeader>> {
    // SAFETY: `phdr_addr` comes from the kernel-supplied auxiliary vector
    // and points at `phnum` headers of `phent` bytes each, guaranteed
    // mapped and readable for the lifetime of the process.
    let mut headers = Vec::with_capacity(phnum);
    for i in 0..phnum {
        let base = phdr_addr + i * phent;
        unsafe {
            let p_type = *(base as *const u32);
            let p_offset = *((base + 8) as *const u64);
            let p_filesz = *((base + 32) as *const u64);
            headers.push(ProgramHeader { p_type, p_offset, p_filesz });
        }
    }
    Ok(headers)
}

/// Locate the embedded segment, if this executable was built with one.
///
/// Returns `Ok(None)` when no `PT_LONE` segment is present — running a
/// plain interpreter binary with source on the command line is the common
/// case, not an error.
pub fn find_embedded_segment() -> LoneResult<Option<Vec<u8>>> {
    let pairs = read_auxv()?;
    let Some(phdr) = auxv_lookup(&pairs, AuxVarType::Phdr) else {
        return Ok(None);
    };
    let phent = auxv_lookup(&pairs, AuxVarType::Phent).unwrap_or(56);
    let phnum = auxv_lookup(&pairs, AuxVarType::Phnum).unwrap_or(0);
    let headers = read_program_headers(phdr, phent, phnum)?;
    let Some(segment) = headers.iter().find(|h| h.p_type == PT_LONE) else {
        return Ok(None);
    };

    let exe_path = fs::read_link("/proc/self/exe")
        .map_err(|e| LoneError::Io(format!("/proc/self/exe: {e}")))?;
    let image = fs::read(&exe_path).map_err(|e| LoneError::Io(format!("{}: {e}", exe_path.display())))?;
    let start = segment.p_offset as usize;
    let end = start
        .checked_add(segment.p_filesz as usize)
        .ok_or(LoneError::EmbeddedSegment("segment size overflows file offset".to_string()))?;
    if end > image.len() {
        return Err(LoneError::EmbeddedSegment("segment exceeds executable image size".to_string()));
    }
    Ok(Some(image[start..end].to_vec()))
}

/// Parse the embedded segment's descriptor table, install `data` in the
/// null module's environment, remember `modules` on `interp` for on-demand
/// loading, and evaluate `run` (if present) as the null module's body.
pub fn run_embedded(interp: &mut Interp, bytes: &[u8]) -> LoneResult<()> {
    let source = String::from_utf8(bytes.to_vec())
        .map_err(|_| LoneError::EmbeddedSegment("embedded segment is not valid UTF-8".to_string()))?;

    let mut parser = crate::reader::Parser::new(&source);
    let descriptor = parser.read_one_form(interp)?;
    // `byte_position` is only meaningful immediately after `read_one_form`,
    // before any further lookahead peeking — exactly the case here.
    let data_start = parser.byte_position();

    let Value::Table(_) = descriptor else {
        return Err(LoneError::EmbeddedSegment("embedded descriptor is not a table".to_string()));
    };
    if data_start > bytes.len() {
        return Err(LoneError::EmbeddedSegment("descriptor form exceeds segment size".to_string()));
    }
    let data: Rc<[u8]> = Rc::from(&bytes[data_start..]);

    let data_key = interp.intern("data");
    let modules_key = interp.intern("modules");
    let run_key = interp.intern("run");

    let data_value = {
        let r = interp
            .heap
            .alloc_cell(Cell::Bytes(HeapBytes { bytes: ByteStore::Shared(data.clone()) }), false);
        Value::Bytes(r)
    };
    let null_env = interp.module_environment(interp.null_module)?;
    let Cell::Table(t) = interp.heap.get_mut(null_env) else { unreachable!("module_environment returns a table") };
    t.insert(data_key, data_value, |v| crate::equality::hash_key(v).ok(), crate::equality::keys_equal);

    interp.embedded_data = Some(data.clone());

    let modules_value = table_get(interp, descriptor, modules_key);
    if let Value::Table(_) = modules_value {
        interp.embedded_modules = Some(modules_value);
    }

    let run_value = table_get(interp, descriptor, run_key);
    if !run_value.is_nil() {
        let (start, size) = start_size_pair(interp, run_value)?;
        let slice = slice_data(&data, start, size)?;
        let run_source = String::from_utf8(slice.to_vec())
            .map_err(|_| LoneError::EmbeddedSegment("run slice is not valid UTF-8".to_string()))?;
        crate::module::load_source_into(interp, interp.null_module, &run_source)?;
    }

    Ok(())
}

/// Consult the embedded descriptor's `modules` table for `name`, returning
/// its decoded source if present. `Ok(None)` means this binary has no
/// embedded fallback for `name`, which `module::module_for_name` turns into
/// an ordinary `Unbound` error, same as a name missing from the search path.
pub fn load_from_embedded(interp: &Interp, name: Value) -> LoneResult<Option<String>> {
    let Some(modules) = interp.embedded_modules else { return Ok(None) };
    let Some(data) = &interp.embedded_data else { return Ok(None) };
    let Cell::Table(t) = interp.heap.get(modules) else { return Ok(None) };
    let Some(pair) = t.get_own(name, |v| crate::equality::hash_key(v).ok(), crate::equality::keys_equal) else {
        return Ok(None);
    };
    let (start, size) = start_size_pair(interp, pair)?;
    let slice = slice_data(data, start, size)?;
    let source = String::from_utf8(slice.to_vec())
        .map_err(|_| LoneError::EmbeddedSegment("embedded module is not valid UTF-8".to_string()))?;
    Ok(Some(source))
}

fn start_size_pair(interp: &Interp, value: Value) -> LoneResult<(usize, usize)> {
    let Cell::Pair(p) = interp.heap.get(value) else {
        return Err(LoneError::EmbeddedSegment("expected a (start . size) pair".to_string()));
    };
    let (Value::Integer(start), Value::Integer(size)) = (p.first, p.rest) else {
        return Err(LoneError::EmbeddedSegment("(start . size) pair must hold integers".to_string()));
    };
    if start < 0 || size < 0 {
        return Err(LoneError::EmbeddedSegment("(start . size) pair must be non-negative".to_string()));
    }
    Ok((start as usize, size as usize))
}

fn slice_data(data: &[u8], start: usize, size: usize) -> LoneResult<&[u8]> {
    let end = start
        .checked_add(size)
        .ok_or_else(|| LoneError::EmbeddedSegment("(start . size) pair overflows".to_string()))?;
    data.get(start..end)
        .ok_or_else(|| LoneError::EmbeddedSegment("slice exceeds embedded data payload".to_string()))
}

fn table_get(interp: &Interp, table: Value, key: Value) -> Value {
    match interp.heap.get(table) {
        Cell::Table(t) => t
            .get_own(key, |v| crate::equality::hash_key(v).ok(), crate::equality::keys_equal)
            .unwrap_or(Value::Nil),
        _ => Value::Nil,
    }
}
