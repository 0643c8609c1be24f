//! The template lexer.
//!
//! One cursor walks the source line by line. Each non-blank line becomes a
//! `Line` token holding one payload; the [`TreeBuilder`] reparents lines by
//! indentation level.

mod attrs;
mod cursor;
mod indent;
mod keywords;
mod lines;
pub mod positions;
mod tag;
mod text;
mod tree_builder;

pub use indent::IndentUnit;

use crate::Options;
use crate::error::{ErrorKind, LexError};
use crate::expr::{ExprMode, ExpressionParser};
use crate::token::{Embedded, Span, Token, TokenKind};
use cursor::Cursor;
use indent::IndentTracker;
use lines::Verbatim;
use tree_builder::TreeBuilder;

/// Lexer for one template buffer
pub struct Lexer<'src, P: ExpressionParser> {
    cur: Cursor<'src>,
    exprs: P,
    options: Options,
    indent: IndentTracker,
    /// Open `#[...]` tag interpolations
    nesting: usize,
}

impl<'src, P: ExpressionParser> Lexer<'src, P> {
    pub fn new(source: &'src str, exprs: P, options: Options) -> Self {
        Self {
            cur: Cursor::new(source),
            exprs,
            options,
            indent: IndentTracker::new(),
            nesting: 0,
        }
    }

    /// Lex the whole buffer. On failure the formatted diagnostic is passed to
    /// `sink` before the error is returned.
    pub fn perform(
        self,
        mut sink: impl FnMut(&str),
    ) -> Result<Token<'src, P::Expr>, LexError> {
        let source = self.cur.source();
        self.tokenize().inspect_err(|err| sink(&err.render(source)))
    }

    /// Lex the whole buffer into a tree rooted at `Root`
    pub fn tokenize(mut self) -> Result<Token<'src, P::Expr>, LexError> {
        let mut tree = TreeBuilder::new(self.options.max_depth);
        let mut verbatim: Option<Verbatim> = None;

        while !self.cur.at_eof() {
            if let Err(err) = self.lex_physical_line(&mut tree, &mut verbatim) {
                tracing::debug!(kind = ?err.kind, offset = err.offset, "lex failed");
                return Err(err);
            }
        }

        Ok(tree.finish())
    }

    /// Indentation unit inferred so far
    pub fn indent_unit(&self) -> Option<IndentUnit> {
        self.indent.unit()
    }

    fn token(&self, kind: TokenKind, start: usize, end: usize) -> Token<'src, P::Expr> {
        Token::new(kind, self.cur.slice(start, end), Span::new(start, end))
    }

    /// Hand the remainder of the input to the expression parser and advance
    /// past whatever it consumed. Failure is reported as `kind` at the
    /// expression start.
    fn expression(
        &mut self,
        mode: ExprMode<'_>,
        kind: ErrorKind,
    ) -> Result<Embedded<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        let rest = self.cur.rest();
        let Some((handle, consumed)) = self.exprs.parse(rest, mode) else {
            return Err(LexError::new(kind, start));
        };
        if consumed == 0 || consumed > rest.len() || !rest.is_char_boundary(consumed) {
            return Err(LexError::new(kind, start));
        }

        let raw = &rest[..consumed];
        let lead = raw.len() - raw.trim_start().len();
        let text = raw.trim();
        self.cur.bump(consumed);
        tracing::trace!(text, "expression");

        let expr_start = start + lead;
        Ok(Embedded {
            handle,
            text,
            span: Span::new(expr_start, expr_start + text.len()),
        })
    }

    /// Only spaces may follow before the end of the line (or the closing `]`
    /// of a tag interpolation)
    fn expect_line_end(&mut self, interpolated: bool) -> Result<(), LexError> {
        self.cur.skip_spaces();
        if self.at_run_end(interpolated) {
            Ok(())
        } else {
            Err(LexError::new(ErrorKind::DataAfterEndlineTag, self.cur.pos()))
        }
    }

    fn at_run_end(&self, interpolated: bool) -> bool {
        self.cur.at_eol() || (interpolated && self.cur.peek() == Some(b']'))
    }
}
