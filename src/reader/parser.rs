// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Parser: turns a token stream into [`Value`]s.

use super::lexer::{LexError, Lexer, Token};
use crate::heap::cell::{ByteStore, Cell, HeapText, Pair};
use crate::interp::Interp;
use crate::value::Value;

/// A parse error, reported with enough of the original token to be useful
/// in a diagnostic without keeping the whole lexer around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    Lex(LexError),
    UnexpectedToken(Token),
    UnexpectedEnd,
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lex(e) => write!(f, "{e}"),
            Self::UnexpectedToken(t) => write!(f, "unexpected token {t:?}"),
            Self::UnexpectedEnd => write!(f, "unexpected end of input"),
        }
    }
}

impl From<LexError> for ReadError {
    fn from(e: LexError) -> Self {
        Self::Lex(e)
    }
}

/// Reads one form at a time from `source` against `interp`'s heap and
/// symbol table, so that symbols read from source are already interned by
/// the time the evaluator sees them.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<Token>,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self { lexer: Lexer::new(source), lookahead: None }
    }

    fn peek(&mut self) -> Result<Option<&Token>, ReadError> {
        if self.lookahead.is_none() {
            self.lookahead = self.lexer.next_token()?;
        }
        Ok(self.lookahead.as_ref())
    }

    fn next(&mut self) -> Result<Option<Token>, ReadError> {
        if let Some(token) = self.lookahead.take() {
            return Ok(Some(token));
        }
        Ok(self.lexer.next_token()?)
    }

    /// Read the next top-level form, or `None` at end of input.
    pub fn read(&mut self, interp: &mut Interp) -> Result<Option<Value>, ReadError> {
        if self.peek()?.is_none() {
            return Ok(None);
        }
        self.read_form(interp).map(Some)
    }

    /// Read exactly one form with no end-of-input peek ahead, so the byte
    /// offset reported by [`Self::byte_position`] immediately afterward is
    /// the end of that form and not whatever token follows it. Used by the
    /// embedded-segment loader to split a descriptor form from the opaque
    /// payload bytes that follow it in the same buffer.
    pub fn read_one_form(&mut self, interp: &mut Interp) -> Result<Value, ReadError> {
        self.read_form(interp)
    }

    /// Byte offset into the source just past the last token consumed.
    /// Meaningless if a token has been buffered as lookahead without being
    /// consumed by a `read_form` call yet; see [`Self::read_one_form`].
    #[must_use]
    pub fn byte_position(&self) -> usize {
        self.lexer.position()
    }

    fn read_form(&mut self, interp: &mut Interp) -> Result<Value, ReadError> {
        let token = self.next()?.ok_or(ReadError::UnexpectedEnd)?;
        match token {
            Token::LParen => self.read_list(interp),
            Token::LBracket => self.read_vector(interp),
            Token::LBrace => self.read_table(interp),
            Token::Quote => self.read_wrapped(interp, "quote"),
            Token::Quasiquote => self.read_wrapped(interp, "quasiquote"),
            Token::Unquote => self.read_wrapped(interp, "unquote"),
            Token::UnquoteSplice => self.read_wrapped(interp, "unquote-splice"),
            Token::Int(n) => Ok(Value::Integer(n)),
            Token::Text(s) => {
                let r = interp.heap.alloc_cell(
                    Cell::Text(HeapText { bytes: ByteStore::owned(s.as_bytes()) }),
                    false,
                );
                Ok(Value::Text(r))
            }
            Token::Symbol(s) => Ok(interp.intern(&s)),
            other @ (Token::RParen | Token::RBracket | Token::RBrace) => {
                Err(ReadError::UnexpectedToken(other))
            }
        }
    }

    fn read_wrapped(&mut self, interp: &mut Interp, head: &str) -> Result<Value, ReadError> {
        let inner = self.read_form(interp)?;
        let head_symbol = interp.intern(head);
        let tail = self.cons(interp, inner, Value::Nil);
        Ok(self.cons(interp, head_symbol, tail))
    }

    fn cons(&self, interp: &mut Interp, first: Value, rest: Value) -> Value {
        let r = interp.heap.alloc_cell(Cell::Pair(Pair { first, rest }), false);
        Value::List(r)
    }

    fn read_list(&mut self, interp: &mut Interp) -> Result<Value, ReadError> {
        let mut items = Vec::new();
        loop {
            match self.peek()? {
                Some(Token::RParen) => {
                    self.next()?;
                    break;
                }
                None => return Err(ReadError::UnexpectedEnd),
                _ => items.push(self.read_form(interp)?),
            }
        }
        let mut list = Value::Nil;
        for item in items.into_iter().rev() {
            list = self.cons(interp, item, list);
        }
        Ok(list)
    }

    fn read_vector(&mut self, interp: &mut Interp) -> Result<Value, ReadError> {
        let mut items = Vec::new();
        loop {
            match self.peek()? {
                Some(Token::RBracket) => {
                    self.next()?;
                    break;
                }
                None => return Err(ReadError::UnexpectedEnd),
                _ => items.push(self.read_form(interp)?),
            }
        }
        let r = interp.heap.alloc_cell(
            Cell::Vector(crate::heap::cell::HeapVector { items }),
            false,
        );
        Ok(Value::Vector(r))
    }

    fn read_table(&mut self, interp: &mut Interp) -> Result<Value, ReadError> {
        let mut table = crate::table::Table::new();
        loop {
            match self.peek()? {
                Some(Token::RBrace) => {
                    self.next()?;
                    break;
                }
                None => return Err(ReadError::UnexpectedEnd),
                _ => {
                    let key = self.read_form(interp)?;
                    let value = match self.peek()? {
                        Some(Token::RBrace) | None => Value::Nil,
                        _ => self.read_form(interp)?,
                    };
                    let hash = crate::equality::hash_key(key)
                        .map_err(|_| ReadError::UnexpectedToken(Token::Symbol("invalid table key".to_string())))?;
                    table.insert(key, value, move |_| Some(hash), crate::equality::keys_equal);
                }
            }
        }
        let r = interp.heap.alloc_cell(Cell::Table(table), false);
        Ok(Value::Table(r))
    }
}

#[cfg(test)]
mod parser_test {
    use super::*;
    use crate::heap::cell::Cell;

    fn read_one(interp: &mut Interp, source: &str) -> Value {
        Parser::new(source).read(interp).unwrap().unwrap()
    }

    #[test]
    fn reads_an_integer() {
        let mut interp = Interp::new().unwrap();
        assert_eq!(read_one(&mut interp, "42"), Value::Integer(42));
    }

    #[test]
    fn reads_a_list_of_integers() {
        let mut interp = Interp::new().unwrap();
        let v = read_one(&mut interp, "(1 2 3)");
        let Cell::Pair(p) = interp.heap.get(v) else { panic!("expected list") };
        assert_eq!(p.first, Value::Integer(1));
    }

    #[test]
    fn reads_quote_as_a_two_element_list() {
        let mut interp = Interp::new().unwrap();
        let v = read_one(&mut interp, "'x");
        let Cell::Pair(p) = interp.heap.get(v) else { panic!("expected list") };
        assert_eq!(p.first.type_name(), "symbol");
    }

    #[test]
    fn reads_a_vector() {
        let mut interp = Interp::new().unwrap();
        let v = read_one(&mut interp, "[1 2 3]");
        let Cell::Vector(vec) = interp.heap.get(v) else { panic!("expected vector") };
        assert_eq!(vec.items.len(), 3);
    }

    #[test]
    fn symbols_read_from_source_are_interned() {
        let mut interp = Interp::new().unwrap();
        let a = read_one(&mut interp, "foo");
        let b = read_one(&mut interp, "foo");
        assert_eq!(a.heap_ref(), b.heap_ref());
    }

    #[test]
    fn unbalanced_list_is_an_error() {
        let mut interp = Interp::new().unwrap();
        assert!(Parser::new("(1 2").read(&mut interp).is_err());
    }
}
