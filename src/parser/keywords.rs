use super::Lexer;
use super::lines::LineMeta;
use crate::error::{ErrorKind, ExprContext, LexError};
use crate::expr::{ExprMode, ExprShape, ExpressionParser};
use crate::token::{Span, Token, TokenKind};

/// Reserved words recognised at the start of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Keyword {
    Include,
    Mixin,
    Doctype,
    Case,
    When,
    Default,
    If,
    Unless,
    ElseIf,
    Else,
    While,
    Each,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        let keyword = match word {
            "include" => Keyword::Include,
            "mixin" => Keyword::Mixin,
            "doctype" => Keyword::Doctype,
            "case" => Keyword::Case,
            "when" => Keyword::When,
            "default" => Keyword::Default,
            "if" => Keyword::If,
            "unless" => Keyword::Unless,
            "elseif" => Keyword::ElseIf,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "each" | "for" => Keyword::Each,
            _ => return None,
        };
        Some(keyword)
    }

    /// Keywords that may also follow `-`
    pub fn is_control(self) -> bool {
        !matches!(self, Keyword::Include | Keyword::Mixin | Keyword::Doctype)
    }

    /// Directive kind for keywords that take a condition
    fn condition_kind(self) -> Option<TokenKind> {
        let kind = match self {
            Keyword::If => TokenKind::ControlIf,
            Keyword::Unless => TokenKind::ControlUnless,
            Keyword::ElseIf => TokenKind::ControlElseIf,
            Keyword::While => TokenKind::ControlWhile,
            Keyword::Case => TokenKind::ControlCase,
            Keyword::When => TokenKind::ControlWhen,
            _ => return None,
        };
        Some(kind)
    }
}

impl<'src, P: ExpressionParser> Lexer<'src, P> {
    /// A keyword must be followed by spacing, `:` or the end of the line;
    /// anything else makes the word a tag name
    pub(super) fn at_keyword_boundary(&self) -> bool {
        self.cur.at_eol() || matches!(self.cur.peek(), Some(b' ' | b'\t' | b':'))
    }

    /// Build the directive for `keyword`, whose word starts at `start` and
    /// has just been consumed
    pub(super) fn read_keyword(
        &mut self,
        keyword: Keyword,
        start: usize,
    ) -> Result<(Token<'src, P::Expr>, LineMeta), LexError> {
        let word_end = self.cur.pos();
        if let Some(kind) = keyword.condition_kind() {
            return self.read_condition(kind, start, word_end);
        }

        match keyword {
            Keyword::Include => {
                self.cur.skip_spaces();
                let from = self.cur.pos();
                let path = self.cur.rest_of_line().trim_end();
                if path.is_empty() {
                    return Err(LexError::new(ErrorKind::MissingIncludePath, from));
                }
                self.cur.skip_to_eol();
                Ok((self.token(TokenKind::Include, from, from + path.len()), LineMeta::default()))
            }
            Keyword::Doctype => {
                self.cur.skip_spaces();
                let from = self.cur.pos();
                let value = self.cur.rest_of_line().trim_end();
                self.cur.skip_to_eol();
                Ok((self.token(TokenKind::Doctype, from, from + value.len()), LineMeta::default()))
            }
            Keyword::Mixin => self.read_mixin_definition(),
            Keyword::Else => {
                self.cur.skip_spaces();
                let resume = self.cur.pos();
                if self.cur.take_tag_name() == "if" && self.at_keyword_boundary() {
                    let if_end = self.cur.pos();
                    return self.read_condition(TokenKind::ControlElseIf, start, if_end);
                }
                self.cur.set_pos(resume);
                self.read_bare(TokenKind::ControlElse, start, word_end)
            }
            Keyword::Default => self.read_bare(TokenKind::ControlDefault, start, word_end),
            Keyword::Each => self.read_each(start, word_end),
            _ => Err(LexError::new(ErrorKind::UnknownLineType, start)),
        }
    }

    fn read_condition(
        &mut self,
        kind: TokenKind,
        start: usize,
        word_end: usize,
    ) -> Result<(Token<'src, P::Expr>, LineMeta), LexError> {
        let expr = self.expression(
            ExprMode::Inline,
            ErrorKind::InvalidExpression(ExprContext::ControlCondition),
        )?;
        let directive = self.token(kind, start, word_end).with_expr(expr);
        Ok((directive, self.read_control_tail()?))
    }

    /// `else`/`default`: nothing but an optional `:` may follow
    fn read_bare(
        &mut self,
        kind: TokenKind,
        start: usize,
        word_end: usize,
    ) -> Result<(Token<'src, P::Expr>, LineMeta), LexError> {
        let directive = self.token(kind, start, word_end);
        Ok((directive, self.read_control_tail()?))
    }

    fn read_control_tail(&mut self) -> Result<LineMeta, LexError> {
        self.cur.skip_spaces();
        if self.cur.eat(":") {
            return Ok(LineMeta::follow());
        }
        self.expect_line_end(false)?;
        Ok(LineMeta::default())
    }

    /// `each value[, key] in iterable`
    fn read_each(
        &mut self,
        start: usize,
        word_end: usize,
    ) -> Result<(Token<'src, P::Expr>, LineMeta), LexError> {
        let context = ErrorKind::InvalidExpression(ExprContext::EachLoop);

        self.cur.skip_spaces();
        let mut variables = vec![self.read_each_variable(context)?];
        self.cur.skip_spaces();
        if self.cur.eat(",") {
            self.cur.skip_spaces();
            variables.push(self.read_each_variable(context)?);
            self.cur.skip_spaces();
        }

        if !(self.cur.starts_with("in") && matches!(self.cur.peek_at(2), Some(b' ' | b'\t'))) {
            return Err(LexError::new(context, self.cur.pos()));
        }
        self.cur.bump(2);
        let expr = self.expression(ExprMode::Inline, context)?;

        let kind = if variables.len() == 2 {
            TokenKind::ControlEachPair
        } else {
            TokenKind::ControlEach
        };
        let mut directive = self.token(kind, start, word_end).with_expr(expr);
        directive.children = variables;
        Ok((directive, self.read_control_tail()?))
    }

    fn read_each_variable(&mut self, context: ErrorKind) -> Result<Token<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        let name = self.cur.take_ident();
        if name.is_empty() {
            return Err(LexError::new(context, start));
        }
        Ok(Token::new(TokenKind::EachVariable, name, Span::new(start, start + name.len())))
    }

    /// `mixin name` or `mixin name(params)`
    fn read_mixin_definition(&mut self) -> Result<(Token<'src, P::Expr>, LineMeta), LexError> {
        let expr = self.expression(
            ExprMode::Inline,
            ErrorKind::InvalidExpression(ExprContext::MixinDefinition),
        )?;
        if !matches!(
            self.exprs.shape(&expr.handle),
            ExprShape::Identifier | ExprShape::CallOnIdentifier
        ) {
            return Err(LexError::new(ErrorKind::InvalidMixinDefinition, expr.span.start));
        }

        let name = expr.text.split('(').next().unwrap_or(expr.text).trim_end();
        let start = expr.span.start;
        let definition =
            Token::new(TokenKind::MixinDefinition, name, Span::new(start, start + name.len()));
        Ok((definition.with_expr(expr), self.read_control_tail()?))
    }
}
