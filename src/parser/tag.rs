use super::Lexer;
use super::cursor::is_name_char;
use super::lines::LineMeta;
use crate::error::{ErrorKind, ExprContext, LexError};
use crate::expr::{ExprMode, ExpressionParser};
use crate::token::{Token, TokenKind};

const SPREAD: &str = "&attributes(";

impl<'src, P: ExpressionParser> Lexer<'src, P> {
    /// Tag line payload: `LineData > Tag`, with modifiers and text under the tag
    pub(super) fn read_tag_line(
        &mut self,
        mut tag: Token<'src, P::Expr>,
    ) -> Result<(Token<'src, P::Expr>, LineMeta), LexError> {
        let start = tag.span.start;
        let meta = self.read_tag_info(&mut tag, false)?;
        Ok((self.wrap_tag(tag, start), meta))
    }

    pub(super) fn wrap_tag(&self, tag: Token<'src, P::Expr>, start: usize) -> Token<'src, P::Expr> {
        let mut data = self.token(TokenKind::LineData, start, self.cur.pos());
        data.push(tag);
        data
    }

    /// Consume modifiers following a tag name, then any text on the rest of
    /// the run.
    ///
    /// In `interpolated` mode (inside `#[...]`) the run ends at `]`, and
    /// neither `:` nor a trailing `.` is accepted.
    pub(super) fn read_tag_info(
        &mut self,
        tag: &mut Token<'src, P::Expr>,
        interpolated: bool,
    ) -> Result<LineMeta, LexError> {
        loop {
            if self.at_run_end(interpolated) {
                return Ok(LineMeta::default());
            }
            let start = self.cur.pos();
            match self.cur.peek() {
                Some(b'.') if self.cur.peek_at(1).is_some_and(is_name_char) => {
                    self.cur.bump(1);
                    tag.push(self.read_note(TokenKind::TagClassNote));
                }
                Some(b'#') if self.cur.peek_at(1).is_some_and(is_name_char) => {
                    self.cur.bump(1);
                    tag.push(self.read_note(TokenKind::TagIdNote));
                }
                Some(b'.') if !interpolated => {
                    self.cur.bump(1);
                    tag.push(self.token(TokenKind::TagDotBlock, start, start + 1));
                    self.expect_line_end(false)?;
                    return Ok(LineMeta::verbatim(true));
                }
                Some(b'(') => {
                    let list = self.read_attr_list()?;
                    tag.push(list);
                }
                Some(b'&') if self.cur.starts_with(SPREAD) => {
                    let context = ErrorKind::InvalidExpression(ExprContext::SpreadAttributes);
                    self.cur.bump(SPREAD.len());
                    let expr = self.expression(ExprMode::Inline, context)?;
                    self.cur.skip_spaces();
                    if !self.cur.eat(")") {
                        return Err(LexError::new(context, self.cur.pos()));
                    }
                    let spread = self.token(TokenKind::TagAttributes, start, self.cur.pos());
                    tag.push(spread.with_expr(expr));
                }
                Some(b'/') => {
                    self.cur.bump(1);
                    tag.push(self.token(TokenKind::TagSelfClose, start, start + 1));
                    self.expect_line_end(interpolated)?;
                    return Ok(LineMeta::default());
                }
                Some(b'=') => {
                    return self.read_tag_output(tag, TokenKind::OutputEscaped, 1, interpolated);
                }
                Some(b'!') if self.cur.starts_with("!=") => {
                    return self.read_tag_output(tag, TokenKind::OutputUnescaped, 2, interpolated);
                }
                Some(b':') if !interpolated => {
                    self.cur.bump(1);
                    return Ok(LineMeta::follow());
                }
                Some(b' ' | b'\t') => {
                    self.cur.bump(1);
                    if !interpolated && self.cur.at_blank_rest() {
                        self.cur.skip_to_eol();
                    } else {
                        let text = self.read_text_run(interpolated)?;
                        if !text.children.is_empty() {
                            tag.push(text);
                        }
                    }
                    return Ok(LineMeta::default());
                }
                _ => return Err(LexError::new(ErrorKind::UnexpectedCharacter, start)),
            }
        }
    }

    /// `.name` or `#name`, with the marker already consumed
    fn read_note(&mut self, kind: TokenKind) -> Token<'src, P::Expr> {
        let start = self.cur.pos();
        let name = self.cur.take_while(is_name_char);
        self.token(kind, start, start + name.len())
    }

    /// `tag= expr` / `tag!= expr`: the output ends the run
    fn read_tag_output(
        &mut self,
        tag: &mut Token<'src, P::Expr>,
        kind: TokenKind,
        marker: usize,
        interpolated: bool,
    ) -> Result<LineMeta, LexError> {
        let start = self.cur.pos();
        self.cur.bump(marker);
        let expr = self.expression(
            ExprMode::Inline,
            ErrorKind::InvalidExpression(ExprContext::TagOutput),
        )?;
        tag.push(self.token(kind, start, self.cur.pos()).with_expr(expr));
        self.expect_line_end(interpolated)?;
        Ok(LineMeta::default())
    }
}
