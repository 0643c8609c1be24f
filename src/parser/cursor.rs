/// Byte cursor over the template source.
///
/// Every structurally significant character is ASCII, so the cursor works on
/// bytes and only steps whole characters when copying through text.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'src> {
    source: &'src str,
    bytes: &'src [u8],
    pos: usize,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.bytes.len());
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// At end of file or at a line break
    pub fn at_eol(&self) -> bool {
        matches!(self.peek(), None | Some(b'\n' | b'\r'))
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    pub fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    /// Remainder of the current line, without the line break
    pub fn rest_of_line(&self) -> &'src str {
        let rest = self.rest();
        let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
        &rest[..end]
    }

    pub fn slice(&self, start: usize, end: usize) -> &'src str {
        &self.source[start..end]
    }

    /// Step over one character
    pub fn advance(&mut self) {
        if let Some(ch) = self.rest().chars().next() {
            self.pos += ch.len_utf8();
        }
    }

    /// Step over `n` bytes; callers only pass ASCII widths
    pub fn bump(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.bytes.len());
    }

    pub fn eat(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Skip spaces and tabs
    pub fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    /// Skip spaces, tabs and line breaks
    pub fn skip_blank(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    pub fn skip_to_eol(&mut self) {
        self.pos += self.rest_of_line().len();
    }

    /// Consume one `\n`, `\r\n` or `\r`
    pub fn consume_newline(&mut self) {
        if self.peek() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek() == Some(b'\n') {
            self.pos += 1;
        }
    }

    /// Length of the line break at the cursor (0 if none)
    pub fn newline_len(&self) -> usize {
        match (self.peek(), self.peek_at(1)) {
            (Some(b'\r'), Some(b'\n')) => 2,
            (Some(b'\r' | b'\n'), _) => 1,
            _ => 0,
        }
    }

    /// Consume ASCII bytes while `pred` holds
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'src str {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii() && pred(b)) {
            self.pos += 1;
        }
        &self.source[start..self.pos]
    }

    /// Consume a tag word: `[A-Za-z0-9_-]`, with inner `:` for namespaces
    pub fn take_tag_name(&mut self) -> &'src str {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b) if is_name_char(b) => self.pos += 1,
                Some(b':') if self.pos > start && self.peek_at(1).is_some_and(is_name_char) => {
                    self.pos += 1;
                }
                _ => break,
            }
        }
        &self.source[start..self.pos]
    }

    /// Consume a plain identifier: `[A-Za-z_$][A-Za-z0-9_$]*`
    pub fn take_ident(&mut self) -> &'src str {
        if !self.peek().is_some_and(|b| b.is_ascii_alphabetic() || b == b'_' || b == b'$') {
            return "";
        }
        self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
    }

    /// Only spaces and tabs remain before the end of the line
    pub fn at_blank_rest(&self) -> bool {
        self.rest_of_line().bytes().all(|b| b == b' ' || b == b'\t')
    }
}

/// Tag, class, id and mixin name characters
pub(crate) fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Characters of a bare attribute name; parentheses are balanced separately
pub(crate) fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.' | b'@')
}
