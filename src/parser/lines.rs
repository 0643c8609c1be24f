use super::Lexer;
use super::cursor::is_name_char;
use super::keywords::Keyword;
use super::tree_builder::{NodeId, TreeBuilder};
use crate::error::{ErrorKind, ExprContext, LexError};
use crate::expr::{ExprMode, ExpressionParser};
use crate::token::{Span, Token, TokenKind};

/// An open verbatim block: deeper lines become text under `owner`
#[derive(Debug, Clone, Copy)]
pub(super) struct Verbatim {
    owner: NodeId,
    level: usize,
    interpolate: bool,
}

/// What a payload asks of the lines that follow it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct LineMeta {
    /// Ended in `:`; the rest of the line is a nested pseudo-line
    pub follow: bool,
    /// Deeper lines are verbatim text, interpolated if `Some(true)`
    pub verbatim: Option<bool>,
}

impl LineMeta {
    pub fn follow() -> Self {
        Self {
            follow: true,
            verbatim: None,
        }
    }

    pub fn verbatim(interpolate: bool) -> Self {
        Self {
            follow: false,
            verbatim: Some(interpolate),
        }
    }
}

type Payload<'src, E> = (Token<'src, E>, LineMeta);

impl<'src, P: ExpressionParser> Lexer<'src, P> {
    /// Lex one physical line (or a code block spanning several) and place
    /// it in the tree
    pub(super) fn lex_physical_line(
        &mut self,
        tree: &mut TreeBuilder<'src, P::Expr>,
        verbatim: &mut Option<Verbatim>,
    ) -> Result<(), LexError> {
        let line_start = self.cur.pos();
        let ws = self.cur.take_while(|b| b == b' ' || b == b'\t');
        if self.cur.at_eol() {
            self.cur.consume_newline();
            return Ok(());
        }

        if let Some(block) = *verbatim {
            if let Some(prefix) = self.indent.prefix_len(ws, block.level + 1) {
                self.cur.set_pos(line_start + prefix);
                let line = self.read_verbatim_line(block.interpolate)?;
                tree.append(block.owner, line);
                self.cur.consume_newline();
                return Ok(());
            }
            *verbatim = None;
        }

        let level = self.indent.level(ws).map_err(|mixed| {
            LexError::new(ErrorKind::MixedIndentation, line_start + mixed.at).with_help(mixed.help)
        })?;
        let content = self.cur.pos();
        tree.check_level(level)
            .map_err(|kind| LexError::new(kind, content))?;

        let (line, mut meta) = self.read_line(level)?;
        let mut owner = tree
            .open_line(level, line)
            .map_err(|kind| LexError::new(kind, content))?;

        let mut depth = level + 1;
        while meta.follow {
            self.cur.skip_spaces();
            if self.cur.at_eol() {
                break;
            }
            depth += 1;
            if depth > self.options.max_depth {
                return Err(LexError::new(ErrorKind::IndentationTooDeep, self.cur.pos()).with_help(
                    format!("followed-by lines nest deeper than {} levels", self.options.max_depth),
                ));
            }
            let (line, next) = self.read_line(level)?;
            owner = tree.expand(owner, line);
            meta = next;
        }

        if let Some(interpolate) = meta.verbatim {
            *verbatim = Some(Verbatim {
                owner,
                level,
                interpolate,
            });
        }

        self.expect_line_end(false)?;
        self.cur.consume_newline();
        Ok(())
    }

    /// Wrap one payload in a `Line` token
    fn read_line(&mut self, level: usize) -> Result<Payload<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        let (payload, meta) = self.read_payload(level)?;
        tracing::debug!(kind = ?payload.kind, level, "line");

        let text = self.cur.slice(start, self.cur.pos()).trim_end();
        let mut line = Token::new(TokenKind::Line, text, Span::new(start, start + text.len()));
        line.push(payload);
        Ok((line, meta))
    }

    /// Indentation beyond the block's first level is kept as text
    fn read_verbatim_line(&mut self, interpolate: bool) -> Result<Token<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        let body = if interpolate {
            self.read_text_run(false)?
        } else {
            let end = start + self.cur.rest_of_line().len();
            self.cur.set_pos(end);
            let mut run = self.token(TokenKind::LinePlainText, start, end);
            run.push(self.token(TokenKind::PlainText, start, end));
            run
        };

        let text = self.cur.slice(start, self.cur.pos()).trim_end();
        let mut line = Token::new(TokenKind::Line, text, Span::new(start, start + text.len()));
        line.push(body);
        Ok(line)
    }

    /// Pick the grammar for a line by its first significant character
    fn read_payload(&mut self, level: usize) -> Result<Payload<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        let shorthand = match self.cur.peek() {
            Some(b'.' | b'#') => self.cur.peek_at(1).is_some_and(is_name_char),
            Some(b'(') => true,
            Some(b'&') => self.cur.starts_with("&attributes("),
            _ => false,
        };
        if shorthand {
            let tag = Token::new(TokenKind::Tag, "", Span::new(start, start));
            return self.read_tag_line(tag);
        }

        match self.cur.peek() {
            Some(b'/') if self.cur.starts_with("//") => self.read_comment(),
            Some(b) if b.is_ascii_alphabetic() => self.read_word_line(),
            Some(b'.') => {
                self.cur.bump(1);
                let dot = self.token(TokenKind::LineDot, start, start + 1);
                self.expect_line_end(false)?;
                Ok((dot, LineMeta::verbatim(true)))
            }
            Some(b'|') => {
                self.cur.bump(1);
                self.cur.skip_spaces();
                Ok((self.read_text_run(false)?, LineMeta::default()))
            }
            Some(b'=') => self.read_output_line(TokenKind::OutputEscaped, 1),
            Some(b'!') if self.cur.starts_with("!=") => {
                self.read_output_line(TokenKind::OutputUnescaped, 2)
            }
            Some(b'-') => self.read_code(level),
            Some(b'+') => self.read_mixin_call(),
            Some(b'<') => {
                let text = self.cur.rest_of_line().trim_end();
                self.cur.skip_to_eol();
                let raw = self.token(TokenKind::LineRaw, start, start + text.len());
                Ok((raw, LineMeta::default()))
            }
            _ => Err(LexError::new(ErrorKind::UnknownLineType, start)),
        }
    }

    fn read_comment(&mut self) -> Result<Payload<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        if self.cur.eat("//-") {
            let mut comment = self.token(TokenKind::LineComment, start, self.cur.pos());
            let body = self.cur.rest_of_line().trim_end();
            if !body.is_empty() {
                let from = self.cur.pos();
                comment.push(self.token(TokenKind::PlainText, from, from + body.len()));
            }
            self.cur.skip_to_eol();
            return Ok((comment, LineMeta::verbatim(false)));
        }

        self.cur.bump(2);
        let mut comment = self.token(TokenKind::LineCommentHtml, start, self.cur.pos());
        self.scan_text(&mut comment, false)?;
        Ok((comment, LineMeta::verbatim(true)))
    }

    fn read_output_line(
        &mut self,
        kind: TokenKind,
        marker: usize,
    ) -> Result<Payload<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        self.cur.bump(marker);
        let expr = self.expression(
            ExprMode::Inline,
            ErrorKind::InvalidExpression(ExprContext::Output),
        )?;
        let output = self.token(kind, start, self.cur.pos()).with_expr(expr);
        self.expect_line_end(false)?;
        Ok((output, LineMeta::default()))
    }

    /// A keyword or a tag name at the start of the line
    fn read_word_line(&mut self) -> Result<Payload<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        let word = self.cur.take_tag_name();
        if let Some(keyword) = Keyword::from_word(word) {
            if self.at_keyword_boundary() {
                return self.read_keyword(keyword, start);
            }
        }
        let tag = Token::new(TokenKind::Tag, word, Span::new(start, start + word.len()));
        self.read_tag_line(tag)
    }

    /// `- statement`, `- keyword ...`, or a bare `-` opening a code block
    fn read_code(&mut self, level: usize) -> Result<Payload<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        self.cur.bump(1);
        if self.cur.at_blank_rest() {
            self.cur.skip_to_eol();
            return Ok((self.read_code_block(start, level)?, LineMeta::default()));
        }

        self.cur.skip_spaces();
        let word_start = self.cur.pos();
        let word = self.cur.take_tag_name();
        if let Some(keyword) = Keyword::from_word(word).filter(|k| k.is_control()) {
            if self.at_keyword_boundary() {
                return self.read_keyword(keyword, word_start);
            }
        }
        self.cur.set_pos(word_start);

        let statement = self.read_statement("")?;
        Ok((statement, LineMeta::default()))
    }

    /// One statement, optionally ended by `;`
    fn read_statement(&mut self, newline: &str) -> Result<Token<'src, P::Expr>, LexError> {
        let expr = self.expression(
            ExprMode::Statement { newline },
            ErrorKind::InvalidExpression(ExprContext::Code),
        )?;
        self.cur.skip_spaces();
        self.cur.eat(";");
        let start = expr.span.start;
        Ok(self.token(TokenKind::CodeLine, start, self.cur.pos()).with_expr(expr))
    }

    /// Statements on the following lines. The first one must sit exactly one
    /// level below the `-` line; the rest must repeat its line break and
    /// indentation.
    fn read_code_block(
        &mut self,
        start: usize,
        level: usize,
    ) -> Result<Token<'src, P::Expr>, LexError> {
        let mut block = self.token(TokenKind::CodeBlock, start, start + 1);

        let break_start = self.cur.pos();
        let after_break = break_start + self.cur.newline_len();
        let indent = self.cur.source()[after_break..]
            .bytes()
            .take_while(|&b| b == b' ' || b == b'\t')
            .count();
        let content = self.cur.source().as_bytes().get(after_break + indent);
        if after_break == break_start || matches!(content, None | Some(b'\n' | b'\r')) {
            return Ok(block);
        }
        let ws = self.cur.slice(after_break, after_break + indent);
        if self.indent.level(ws) != Ok(level + 1) {
            return Ok(block);
        }
        let newline = self.cur.slice(break_start, after_break + indent);

        while self.cur.starts_with(newline) {
            let resume = self.cur.pos();
            self.cur.bump(newline.len());
            if self.cur.at_blank_rest() {
                self.cur.set_pos(resume);
                break;
            }
            loop {
                block.push(self.read_statement(newline)?);
                self.cur.skip_spaces();
                if self.cur.at_eol() {
                    break;
                }
            }
        }

        tracing::trace!(statements = block.children.len(), "code block");
        Ok(block)
    }

    /// `+name`, `+name(args)`, then tag modifiers and text
    fn read_mixin_call(&mut self) -> Result<Payload<'src, P::Expr>, LexError> {
        self.cur.bump(1);
        let name_start = self.cur.pos();
        let name = self.cur.take_tag_name();
        if name.is_empty() {
            return Err(LexError::new(ErrorKind::UnexpectedCharacter, name_start));
        }
        let mut call = Token::new(
            TokenKind::MixinCall,
            name,
            Span::new(name_start, name_start + name.len()),
        );

        if self.cur.eat("(") {
            let context = ErrorKind::InvalidExpression(ExprContext::MixinCall);
            self.cur.skip_spaces();
            if !self.cur.eat(")") {
                let expr = self.expression(ExprMode::Inline, context)?;
                self.cur.skip_spaces();
                if !self.cur.eat(")") {
                    return Err(LexError::new(context, self.cur.pos()));
                }
                let args = Token::new(TokenKind::MixinArgs, expr.text, expr.span);
                call.push(args.with_expr(expr));
            }
        }

        let meta = self.read_tag_info(&mut call, false)?;
        Ok((call, meta))
    }
}
