//! A cursor-based byte parser in the cooperative-combinator style: every
//! combinator except [`Parser::word`] leaves the cursor untouched when it
//! fails, so callers can try alternatives with [`Parser::attempt`] without
//! having to save/restore position themselves. `word` is the one
//! unconditional exception — it always advances, consuming up to the next
//! delimiter or the end of input, because the wire format uses it purely to
//! *classify* what comes next (a command tag), and classification has to
//! make progress even when nothing recognisable was found.
//!
//! No direct teacher analogue exists for this module (the teacher's wire
//! work is all driven by `fe2o3_syntax`/`fe2o3_jdat`); it is grounded in
//! *style* on `fe2o3_core::byte`'s `Outcome`-returning, tag-classified
//! decoding idiom.
use crate::prelude::*;
use crate::byte::from_base64;

pub struct Parser<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn pos(&self) -> usize { self.pos }

    pub fn is_empty(&self) -> bool { self.pos >= self.buf.len() }

    pub fn remaining(&self) -> &'a [u8] { &self.buf[self.pos..] }

    /// Consume exactly `n` bytes. Non-consuming on failure.
    pub fn take(&mut self, n: usize) -> Outcome<&'a [u8]> {
        if self.buf.len() - self.pos < n {
            return Err(err!(
                "Expected {} more bytes at position {}, only {} remain.",
                n, self.pos, self.buf.len() - self.pos;
                Parse, Missing, Input
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consume one or more bytes matching `pred`. Non-consuming on failure.
    pub fn take_while1<F: Fn(u8) -> bool>(&mut self, pred: F) -> Outcome<&'a [u8]> {
        let start = self.pos;
        let mut end = self.pos;
        while end < self.buf.len() && pred(self.buf[end]) {
            end += 1;
        }
        if end == start {
            return Err(err!(
                "Expected at least one matching byte at position {}.", start;
                Parse, Input
            ));
        }
        self.pos = end;
        Ok(&self.buf[start..end])
    }

    pub fn take_while0<F: Fn(u8) -> bool>(&mut self, pred: F) -> &'a [u8] {
        let start = self.pos;
        let mut end = self.pos;
        while end < self.buf.len() && pred(self.buf[end]) {
            end += 1;
        }
        self.pos = end;
        &self.buf[start..end]
    }

    /// Consume up to (not including) the next space or the end of input.
    /// Always advances, even if the result is empty.
    pub fn word(&mut self) -> &'a [u8] {
        self.take_while0(|b| b != b' ')
    }

    /// Consume a single space byte. Non-consuming on failure.
    pub fn space(&mut self) -> Outcome<()> {
        match self.buf.get(self.pos) {
            Some(b' ') => { self.pos += 1; Ok(()) },
            _ => Err(err!(
                "Expected a space at position {}.", self.pos;
                Parse, Input
            )),
        }
    }

    /// Consume a literal tag string. Non-consuming on failure.
    pub fn str_tag(&mut self, tag: &str) -> Outcome<()> {
        let tb = tag.as_bytes();
        if self.buf.len() - self.pos < tb.len() || &self.buf[self.pos..self.pos + tb.len()] != tb {
            return Err(err!(
                "Expected literal '{}' at position {}.", tag, self.pos;
                Parse, Syntax
            ));
        }
        self.pos += tb.len();
        Ok(())
    }

    /// Try each candidate in order, returning the first literal that
    /// matches at the current position. Non-consuming on failure.
    pub fn one_of_str(&mut self, candidates: &[&'static str]) -> Outcome<&'static str> {
        for c in candidates {
            if self.str_tag(c).is_ok() {
                return Ok(c);
            }
        }
        Err(err!(
            "None of the expected tags matched at position {}.", self.pos;
            Parse, Syntax
        ))
    }

    /// Consume a base64 field (ASCII base64 alphabet run) and decode it.
    pub fn base64_field(&mut self) -> Outcome<Vec<u8>> {
        let start = self.pos;
        let raw = res!(self.take_while1(|b| {
            b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'='
        }));
        match from_base64(res!(std::str::from_utf8(raw); Decode, Input)) {
            Ok(v) => Ok(v),
            Err(e) => {
                self.pos = start;
                Err(e)
            },
        }
    }

    /// Consume a run of unsigned decimal digits and parse it. The wire
    /// format never carries a negative count or counter, so a leading `-`
    /// is left unconsumed and rejected like any other non-digit.
    pub fn decimal(&mut self) -> Outcome<i64> {
        let start = self.pos;
        match self.take_while1(|b| b.is_ascii_digit()) {
            Ok(digits) => {
                let s = res!(std::str::from_utf8(digits); Decode);
                match s.parse::<i64>() {
                    Ok(n) => Ok(n),
                    Err(e) => { self.pos = start; Err(err!(e, "Invalid decimal '{}'.", s; Decode, Parse)) },
                }
            },
            Err(e) => { self.pos = start; Err(e) },
        }
    }

    /// Consume an ISO-8601-shaped timestamp token (non-space run). The
    /// actual date parsing/validation belongs to the caller (`smp_protocol`
    /// owns the `chrono` dependency); this just isolates the token.
    pub fn date_token(&mut self) -> Outcome<&'a str> {
        let raw = res!(self.take_while1(|b| b != b' '));
        Ok(res!(std::str::from_utf8(raw); Decode, Input))
    }

    /// Assert there is no more input.
    pub fn end(&self) -> Outcome<()> {
        if self.pos != self.buf.len() {
            return Err(err!(
                "Expected end of input at position {}, {} bytes remain.",
                self.pos, self.buf.len() - self.pos;
                Parse, Unexpected
            ));
        }
        Ok(())
    }

    /// Run `f`, restoring the cursor to its pre-call position if it fails.
    pub fn attempt<T, F: FnOnce(&mut Self) -> Outcome<T>>(&mut self, f: F) -> Outcome<T> {
        let start = self.pos;
        match f(self) {
            Ok(v) => Ok(v),
            Err(e) => { self.pos = start; Err(e) },
        }
    }
}
