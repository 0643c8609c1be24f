//! Embedded expression collaborator.
//!
//! The lexer never interprets expression syntax. Wherever an expression is
//! expected it hands the unconsumed remainder of the input to an
//! [`ExpressionParser`] and advances by exactly the number of bytes the
//! parser reports consuming.

mod javascript;
mod scan;

pub use javascript::{ScriptExpr, ScriptExpressions};
pub use scan::{LooseExpressions, ScannedExpr, extent, shape_of};

use serde::Serialize;

/// How far an expression may extend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprMode<'a> {
    /// A single expression ending at an unbalanced closer, the end of the
    /// line, or a top-level `:` that is not part of a ternary
    Inline,
    /// Like `Inline`, but also ends at a top-level `,` and at whitespace
    /// that does not sit next to an operator. May span lines inside brackets.
    AttributeValue,
    /// One statement ending at a top-level `;` or line end. Inside brackets a
    /// line break is allowed when it matches `newline`.
    Statement { newline: &'a str },
}

/// Coarse syntactic shape of a parsed expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExprShape {
    /// `name`
    Identifier,
    /// `name(...)`
    CallOnIdentifier,
    Other,
}

/// Parser for the expression sub-grammar.
pub trait ExpressionParser {
    /// Opaque handle stored on the token that embeds the expression
    type Expr;

    /// Parse an expression at the start of `remaining`.
    ///
    /// Returns the handle and the number of bytes consumed, or `None` if no
    /// valid expression starts here. Leading whitespace may be consumed.
    fn parse(&mut self, remaining: &str, mode: ExprMode<'_>) -> Option<(Self::Expr, usize)>;

    fn shape(&self, expr: &Self::Expr) -> ExprShape;
}

impl<P: ExpressionParser + ?Sized> ExpressionParser for &mut P {
    type Expr = P::Expr;

    fn parse(&mut self, remaining: &str, mode: ExprMode<'_>) -> Option<(Self::Expr, usize)> {
        (**self).parse(remaining, mode)
    }

    fn shape(&self, expr: &Self::Expr) -> ExprShape {
        (**self).shape(expr)
    }
}
