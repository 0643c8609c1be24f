//! Lexer for indentation-sensitive Pug/Jade templates.
//!
//! [`lex`] turns a template into a tree of [`Token`]s rooted at
//! [`TokenKind::Root`]. Every token borrows its text from the source buffer.
//! Embedded expressions are delegated to an [`ExpressionParser`]: the
//! structural [`LooseExpressions`] by default, or [`ScriptExpressions`] to
//! validate them as JavaScript.

pub mod error;
pub mod expr;
pub mod parser;
pub mod token;

pub use error::{ErrorKind, ExprContext, LexError};
pub use expr::{
    ExprMode, ExprShape, ExpressionParser, LooseExpressions, ScannedExpr, ScriptExpr,
    ScriptExpressions,
};
pub use parser::positions::LineCol;
pub use parser::{IndentUnit, Lexer};
pub use token::{Embedded, Span, Token, TokenKind};

/// Maximum nesting depth when none is configured
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Configuration for lexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Deepest indentation level accepted; deeper lines fail with
    /// [`ErrorKind::IndentationTooDeep`]
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Lex a template with the structural expression scanner and default options
pub fn lex(source: &str) -> Result<Token<'_, ScannedExpr>, LexError> {
    lex_with(source, LooseExpressions, &Options::default())
}

/// Lex a template with a custom expression parser and options
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn lex_with<'src, P: ExpressionParser>(
    source: &'src str,
    exprs: P,
    options: &Options,
) -> Result<Token<'src, P::Expr>, LexError> {
    Lexer::new(source, exprs, *options).tokenize()
}
