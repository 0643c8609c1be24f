use crate::parser::positions::{self, LineCol};
use std::fmt;

/// Where an embedded expression failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprContext {
    /// `tag= expr` / `tag!= expr`
    TagOutput,
    /// `= expr` / `!= expr` on its own line
    Output,
    /// `&attributes(expr)`
    SpreadAttributes,
    MixinCall,
    MixinDefinition,
    ControlCondition,
    EachLoop,
    Code,
    Interpolation,
}

impl ExprContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExprContext::TagOutput => "tag output",
            ExprContext::Output => "output",
            ExprContext::SpreadAttributes => "&attributes",
            ExprContext::MixinCall => "mixin call",
            ExprContext::MixinDefinition => "mixin definition",
            ExprContext::ControlCondition => "control condition",
            ExprContext::EachLoop => "each loop",
            ExprContext::Code => "code",
            ExprContext::Interpolation => "interpolation",
        }
    }
}

/// Kind of lex error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MixedIndentation,
    InvalidIndentationJump,
    IndentationTooDeep,
    UnknownLineType,
    UnexpectedCharacter,
    InvalidAttributeName,
    InvalidAttributeValue,
    InvalidAttributeList,
    InvalidExpression(ExprContext),
    InvalidMixinDefinition,
    InvalidTagInterpolation,
    MissingIncludePath,
    DataAfterEndlineTag,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MixedIndentation => "Mixed indentation",
            ErrorKind::InvalidIndentationJump => "Invalid indentation jump",
            ErrorKind::IndentationTooDeep => "Indentation too deep",
            ErrorKind::UnknownLineType => "Unknown line type",
            ErrorKind::UnexpectedCharacter => "Unexpected character",
            ErrorKind::InvalidAttributeName => "Invalid attribute name",
            ErrorKind::InvalidAttributeValue => "Invalid attribute value",
            ErrorKind::InvalidAttributeList => "Invalid attribute list",
            ErrorKind::InvalidExpression(_) => "Invalid expression",
            ErrorKind::InvalidMixinDefinition => "Invalid mixin definition",
            ErrorKind::InvalidTagInterpolation => "Invalid tag interpolation",
            ErrorKind::MissingIncludePath => "Missing include path",
            ErrorKind::DataAfterEndlineTag => "Data after end-of-line marker",
        }
    }

    /// Stable snake_case identifier, used to name error fixtures
    pub fn slug(&self) -> &'static str {
        match self {
            ErrorKind::MixedIndentation => "mixed_indentation",
            ErrorKind::InvalidIndentationJump => "invalid_indentation_jump",
            ErrorKind::IndentationTooDeep => "indentation_too_deep",
            ErrorKind::UnknownLineType => "unknown_line_type",
            ErrorKind::UnexpectedCharacter => "unexpected_character",
            ErrorKind::InvalidAttributeName => "invalid_attribute_name",
            ErrorKind::InvalidAttributeValue => "invalid_attribute_value",
            ErrorKind::InvalidAttributeList => "invalid_attribute_list",
            ErrorKind::InvalidExpression(_) => "invalid_expression",
            ErrorKind::InvalidMixinDefinition => "invalid_mixin_definition",
            ErrorKind::InvalidTagInterpolation => "invalid_tag_interpolation",
            ErrorKind::MissingIncludePath => "missing_include_path",
            ErrorKind::DataAfterEndlineTag => "data_after_endline_tag",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidExpression(ctx) => write!(f, "Invalid {} expression", ctx.as_str()),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Error during lexing. The first error aborts the run.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub kind: ErrorKind,
    /// Byte offset of the failure in the source
    pub offset: usize,
    pub help: Option<String>,
}

impl LexError {
    pub fn new(kind: ErrorKind, offset: usize) -> Self {
        Self {
            kind,
            offset,
            help: None,
        }
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// 1-based line and column of the failure
    pub fn location(&self, source: &str) -> LineCol {
        positions::line_col(source, self.offset)
    }

    /// Render the error with the offending line and a caret under the column
    pub fn render(&self, source: &str) -> String {
        self.render_inner(source, false)
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str) -> String {
        self.render_inner(source, true)
    }

    fn render_inner(&self, source: &str, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let loc = self.location(source);
        let line_text = positions::line_text(source, self.offset);
        let prefix = format!("-> {}: ", loc.line);

        let mut output = format!("{}{}{}{}\n", dim, prefix, reset, line_text);

        // Pad with the same whitespace characters so tabs keep the caret aligned
        let mut pad = " ".repeat(prefix.len());
        for ch in line_text.chars().take(loc.col - 1) {
            pad.push(if ch == '\t' { '\t' } else { ' ' });
        }
        output.push_str(&format!("{}{}^ {}{}\n", pad, red, self, reset));

        if let Some(ref help) = self.help {
            output.push_str(&format!("{}help:{} {}\n", cyan, reset, help));
        }

        output
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for LexError {}
