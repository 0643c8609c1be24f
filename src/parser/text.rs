use super::Lexer;
use crate::error::{ErrorKind, ExprContext, LexError};
use crate::expr::{ExprMode, ExpressionParser};
use crate::token::{Span, Token, TokenKind};

/// Literal text not yet emitted, as a byte range of the source
type Pending = Option<(usize, usize)>;

impl<'src, P: ExpressionParser> Lexer<'src, P> {
    /// Scan a text run into a `LinePlainText` container
    pub(super) fn read_text_run(&mut self, interpolated: bool) -> Result<Token<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        let mut run = Token::new(TokenKind::LinePlainText, "", Span::new(start, start));
        self.scan_text(&mut run, interpolated)?;

        let end = self.cur.pos();
        run.text = self.cur.slice(start, end);
        run.span = Span::new(start, end);
        Ok(run)
    }

    /// Split a text run into `PlainText`, output and inline tag tokens under
    /// `parent`. Stops at the end of the line, or at an unescaped `]` when
    /// `interpolated`.
    pub(super) fn scan_text(
        &mut self,
        parent: &mut Token<'src, P::Expr>,
        interpolated: bool,
    ) -> Result<(), LexError> {
        let mut pending: Pending = None;

        loop {
            let at = self.cur.pos();
            match self.cur.peek() {
                None | Some(b'\n' | b'\r') => break,
                Some(b']') if interpolated => break,
                Some(b'\\') => {
                    let rest = &self.cur.rest()[1..];
                    if rest.starts_with("#{") || rest.starts_with("#[") || rest.starts_with("!{") {
                        self.cur.bump(3);
                        self.extend(parent, &mut pending, at + 1, at + 3);
                    } else {
                        self.cur.bump(1);
                        if !self.cur.at_eol() {
                            self.cur.advance();
                        }
                        self.extend(parent, &mut pending, at, self.cur.pos());
                    }
                }
                Some(b'#' | b'!') if self.cur.peek_at(1) == Some(b'{') => {
                    self.flush(parent, &mut pending);
                    let kind = if self.cur.peek() == Some(b'#') {
                        TokenKind::OutputEscaped
                    } else {
                        TokenKind::OutputUnescaped
                    };
                    parent.push(self.read_interpolated_output(kind)?);
                }
                Some(b'#') if self.cur.peek_at(1) == Some(b'[') => {
                    self.flush(parent, &mut pending);
                    parent.push(self.read_tag_interpolation()?);
                }
                Some(_) => {
                    self.cur.advance();
                    self.extend(parent, &mut pending, at, self.cur.pos());
                }
            }
        }

        self.flush(parent, &mut pending);
        Ok(())
    }

    /// Grow the pending literal when `start` continues it; otherwise emit it
    /// and start a new one
    fn extend(&self, parent: &mut Token<'src, P::Expr>, pending: &mut Pending, start: usize, end: usize) {
        if let Some((_, pending_end)) = pending {
            if *pending_end == start {
                *pending_end = end;
                return;
            }
        }
        self.flush(parent, pending);
        *pending = Some((start, end));
    }

    fn flush(&self, parent: &mut Token<'src, P::Expr>, pending: &mut Pending) {
        if let Some((start, end)) = pending.take() {
            if end > start {
                parent.push(self.token(TokenKind::PlainText, start, end));
            }
        }
    }

    /// `#{expr}` / `!{expr}`
    fn read_interpolated_output(&mut self, kind: TokenKind) -> Result<Token<'src, P::Expr>, LexError> {
        let context = ErrorKind::InvalidExpression(ExprContext::Interpolation);
        let start = self.cur.pos();
        self.cur.bump(2);
        let expr = self.expression(ExprMode::Inline, context)?;
        if !self.cur.eat("}") {
            return Err(LexError::new(context, self.cur.pos()));
        }
        Ok(self.token(kind, start, self.cur.pos()).with_expr(expr))
    }

    /// `#[tag.class(attrs) text]`, wrapped as `LineData > Tag`. Nesting is
    /// capped at `max_depth`.
    fn read_tag_interpolation(&mut self) -> Result<Token<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        if self.nesting >= self.options.max_depth {
            return Err(LexError::new(ErrorKind::IndentationTooDeep, start).with_help(format!(
                "tag interpolations nest deeper than {} levels",
                self.options.max_depth
            )));
        }
        self.nesting += 1;
        let tag = self.read_interpolated_tag(start);
        self.nesting -= 1;
        tag
    }

    fn read_interpolated_tag(&mut self, start: usize) -> Result<Token<'src, P::Expr>, LexError> {
        self.cur.bump(2);
        let name_start = self.cur.pos();
        let name = self.cur.take_tag_name();
        let mut tag = Token::new(TokenKind::Tag, name, Span::new(name_start, name_start + name.len()));

        self.read_tag_info(&mut tag, true)?;
        // An unnamed tag is only written through a class, id or attributes
        let shorthand = tag.children.first().is_some_and(|first| {
            matches!(
                first.kind,
                TokenKind::TagClassNote
                    | TokenKind::TagIdNote
                    | TokenKind::TagAttrList
                    | TokenKind::TagAttributes
            )
        });
        if name.is_empty() && !shorthand {
            return Err(LexError::new(ErrorKind::InvalidTagInterpolation, start));
        }
        if !self.cur.eat("]") {
            return Err(LexError::new(ErrorKind::InvalidTagInterpolation, self.cur.pos()));
        }
        Ok(self.wrap_tag(tag, start))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, ExprContext};
    use crate::expr::LooseExpressions;
    use crate::token::TokenKind;
    use crate::{Options, lex, lex_with};

    fn piped(source: &str) -> Vec<(TokenKind, String)> {
        let root = lex(source).unwrap();
        root.children[0]
            .payload()
            .unwrap()
            .children
            .iter()
            .map(|c| (c.kind, c.expr_text().unwrap_or(c.text).to_string()))
            .collect()
    }

    #[test]
    fn test_plain_run_is_one_token() {
        let root = lex("| just words, no markers\n").unwrap();
        let run = root.children[0].payload().unwrap();
        assert_eq!(run.children.len(), 1);
        assert_eq!(run.children[0].span, run.span);
    }

    #[test]
    fn test_interpolations() {
        let got = piped("| a #{b} c !{d}\n");
        assert_eq!(
            got,
            [
                (TokenKind::PlainText, "a ".to_string()),
                (TokenKind::OutputEscaped, "b".to_string()),
                (TokenKind::PlainText, " c ".to_string()),
                (TokenKind::OutputUnescaped, "d".to_string()),
            ]
        );
    }

    #[test]
    fn test_escaped_interpolation_is_literal() {
        let got = piped("| cost \\#{price} ok\n");
        assert_eq!(
            got,
            [
                (TokenKind::PlainText, "cost ".to_string()),
                (TokenKind::PlainText, "#{price} ok".to_string()),
            ]
        );
    }

    #[test]
    fn test_other_backslashes_are_kept() {
        let got = piped("| a\\nb\\\n");
        assert_eq!(got, [(TokenKind::PlainText, "a\\nb\\".to_string())]);
    }

    #[test]
    fn test_tag_interpolation() {
        let root = lex("p Click #[a.btn(href=\"/\") here #[b now]]!\n").unwrap();
        let tag = &root.children[0].payload().unwrap().children[0];
        let run = &tag.children[0];
        let kinds: Vec<_> = run.children.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, [TokenKind::PlainText, TokenKind::LineData, TokenKind::PlainText]);

        let link = &run.children[1].children[0];
        assert_eq!(link.text, "a");
        let link_kinds: Vec<_> = link.children.iter().map(|c| c.kind).collect();
        assert_eq!(
            link_kinds,
            [TokenKind::TagClassNote, TokenKind::TagAttrList, TokenKind::LinePlainText]
        );
        let inner = &link.children[2].children;
        assert_eq!(inner[0].text, "here ");
        assert_eq!(inner[1].children[0].text, "b");
    }

    #[test]
    fn test_tag_interpolation_output() {
        let root = lex("p #[em= name] said\n").unwrap();
        let run = &root.children[0].payload().unwrap().children[0].children[0];
        let em = &run.children[0].children[0];
        assert_eq!(em.children[0].kind, TokenKind::OutputEscaped);
        assert_eq!(em.children[0].expr_text(), Some("name"));
        assert_eq!(run.children[1].text, " said");
    }

    #[test]
    fn test_unclosed_interpolations() {
        let err = lex("p #{name\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidExpression(ExprContext::Interpolation));
        let err = lex("p #[b bold\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTagInterpolation);
        let err = lex("p #[]\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTagInterpolation);
    }

    #[test]
    fn test_unnamed_tag_interpolation_needs_modifier() {
        let err = lex("p #[ b]\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTagInterpolation);
        assert_eq!(err.offset, 2);
        assert_eq!(lex("p #[= x]\n").unwrap_err().kind, ErrorKind::InvalidTagInterpolation);

        let root = lex("p #[.note hi]\n").unwrap();
        let run = &root.children[0].payload().unwrap().children[0].children[0];
        let tag = &run.children[0].children[0];
        assert_eq!(tag.text, "");
        assert_eq!(tag.children[0].kind, TokenKind::TagClassNote);
    }

    #[test]
    fn test_tag_interpolation_depth_is_capped() {
        let opts = Options { max_depth: 2 };
        assert!(lex_with("p #[b #[i x]]\n", LooseExpressions, &opts).is_ok());
        let err = lex_with("p #[b #[i #[u x]]]\n", LooseExpressions, &opts).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndentationTooDeep);
        assert_eq!(err.offset, 10);

        let deep = format!("p {}x{}\n", "#[b ".repeat(100_000), "]".repeat(100_000));
        assert_eq!(lex(&deep).unwrap_err().kind, ErrorKind::IndentationTooDeep);
    }
}
