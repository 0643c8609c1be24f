use super::Lexer;
use super::cursor::is_attr_name_char;
use crate::error::{ErrorKind, LexError};
use crate::expr::{ExprMode, ExpressionParser};
use crate::token::{Span, Token, TokenKind};

impl<'src, P: ExpressionParser> Lexer<'src, P> {
    /// `( name [= value] [,] ... )`. Entries may be separated by commas,
    /// spaces or line breaks.
    pub(super) fn read_attr_list(&mut self) -> Result<Token<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        self.cur.bump(1);

        let mut pairs = Vec::new();
        loop {
            self.cur.skip_blank();
            match self.cur.peek() {
                None => return Err(LexError::new(ErrorKind::InvalidAttributeList, start)),
                Some(b')') => {
                    self.cur.bump(1);
                    break;
                }
                Some(_) => {
                    pairs.push(self.read_attr_pair()?);
                    self.cur.skip_blank();
                    self.cur.eat(",");
                }
            }
        }

        tracing::trace!(pairs = pairs.len(), "attribute list");
        let mut list = self.token(TokenKind::TagAttrList, start, self.cur.pos());
        list.children = pairs;
        Ok(list)
    }

    fn read_attr_pair(&mut self) -> Result<Token<'src, P::Expr>, LexError> {
        let start = self.cur.pos();
        let (name, span) = match self.cur.peek() {
            Some(quote @ (b'"' | b'\'')) => self.read_quoted_name(quote)?,
            _ => self.read_bare_name()?,
        };
        if name.is_empty() {
            return Err(LexError::new(ErrorKind::InvalidAttributeName, start));
        }

        let name_end = self.cur.pos();
        self.cur.skip_spaces();
        let kind = if self.cur.eat("!=") {
            TokenKind::AttrPairUnescaped
        } else if self.cur.eat("=") {
            TokenKind::AttrPairEscaped
        } else {
            self.cur.set_pos(name_end);
            return match self.cur.peek() {
                None | Some(b' ' | b'\t' | b'\n' | b'\r' | b',' | b')') => {
                    Ok(Token::new(TokenKind::AttrPairEscaped, name, span))
                }
                Some(_) => Err(LexError::new(ErrorKind::InvalidAttributeName, name_end)),
            };
        };

        let value = self.expression(ExprMode::AttributeValue, ErrorKind::InvalidAttributeValue)?;
        Ok(Token::new(kind, name, span).with_expr(value))
    }

    /// Quoted name; escapes stay in the slice and are resolved by
    /// `Token::attr_name`
    fn read_quoted_name(&mut self, quote: u8) -> Result<(&'src str, Span), LexError> {
        let open = self.cur.pos();
        self.cur.bump(1);
        let start = self.cur.pos();
        loop {
            match self.cur.peek() {
                None | Some(b'\n' | b'\r') => {
                    return Err(LexError::new(ErrorKind::InvalidAttributeName, open));
                }
                Some(b'\\') => {
                    self.cur.bump(1);
                    if !self.cur.at_eol() {
                        self.cur.advance();
                    }
                }
                Some(b) if b == quote => break,
                Some(_) => self.cur.advance(),
            }
        }
        let end = self.cur.pos();
        self.cur.bump(1);
        Ok((self.cur.slice(start, end), Span::new(start, end)))
    }

    /// Bare name; parentheses inside it must balance, as in `(click)`
    fn read_bare_name(&mut self) -> Result<(&'src str, Span), LexError> {
        let start = self.cur.pos();
        let mut depth = 0usize;
        loop {
            match self.cur.peek() {
                Some(b'(') => depth += 1,
                Some(b')') if depth > 0 => depth -= 1,
                Some(b) if is_attr_name_char(b) => {}
                _ => break,
            }
            self.cur.bump(1);
        }
        if depth > 0 {
            return Err(LexError::new(ErrorKind::InvalidAttributeName, start));
        }
        let end = self.cur.pos();
        Ok((self.cur.slice(start, end), Span::new(start, end)))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::lex;
    use crate::token::TokenKind;

    fn pairs(source: &str) -> Vec<(String, TokenKind, Option<String>)> {
        let root = lex(source).unwrap();
        let tag = &root.children[0].payload().unwrap().children[0];
        let list = tag.children_of(TokenKind::TagAttrList).next().unwrap();
        list.children
            .iter()
            .map(|p| (p.attr_name().into_owned(), p.kind, p.expr_text().map(String::from)))
            .collect()
    }

    #[test]
    fn test_separators() {
        let got = pairs("a(x=1 y=2,z=3\n  w=4)\n");
        let names: Vec<_> = got.iter().map(|p| p.0.as_str()).collect();
        assert_eq!(names, ["x", "y", "z", "w"]);
    }

    #[test]
    fn test_bare_and_unescaped() {
        let got = pairs("input(checked, value!=raw disabled)\n");
        assert_eq!(got[0], ("checked".to_string(), TokenKind::AttrPairEscaped, None));
        assert_eq!(
            got[1],
            ("value".to_string(), TokenKind::AttrPairUnescaped, Some("raw".to_string()))
        );
        assert_eq!(got[2].0, "disabled");
    }

    #[test]
    fn test_values_hide_commas() {
        let got = pairs("a(title='a, b' data=f(1, 2) style={a: 1, b: 2})\n");
        let values: Vec<_> = got.iter().map(|p| p.2.clone().unwrap()).collect();
        assert_eq!(values, ["'a, b'", "f(1, 2)", "{a: 1, b: 2}"]);
    }

    #[test]
    fn test_quoted_names() {
        let got = pairs(r#"div("(click)"="go()" 'a\'b'=1)"#);
        assert_eq!(got[0].0, "(click)");
        assert_eq!(got[1].0, "a'b");
    }

    #[test]
    fn test_bare_name_with_parens() {
        let got = pairs("div((click)=\"go()\")\n");
        assert_eq!(got[0].0, "(click)");
        assert_eq!(got[0].2.as_deref(), Some("\"go()\""));
    }

    #[test]
    fn test_spaces_around_equals() {
        let got = pairs("a(href = \"/\")\n");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].2.as_deref(), Some("\"/\""));
    }

    #[test]
    fn test_unclosed_list() {
        let err = lex("a(href=\"/\"\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidAttributeList);
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(lex("a(=1)\n").unwrap_err().kind, ErrorKind::InvalidAttributeName);
        assert_eq!(lex("a(\"x=1)\n").unwrap_err().kind, ErrorKind::InvalidAttributeName);
        assert_eq!(lex("a(x%=1)\n").unwrap_err().kind, ErrorKind::InvalidAttributeName);
    }

    #[test]
    fn test_invalid_value() {
        let err = lex("a(x=)\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidAttributeValue);
        assert_eq!(err.offset, 4);
    }
}
