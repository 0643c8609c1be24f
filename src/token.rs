use serde::Serialize;
use std::borrow::Cow;
use std::fmt::{self, Write};

/// Byte range into the template source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Token kinds produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // === Structural ===
    /// Document root, created once per run
    Root,
    /// One physical source line (first child is the payload)
    Line,
    /// Wrapper around a single `Tag`
    LineData,
    /// Container for one text run: piped text, verbatim lines, inline tag text
    LinePlainText,
    /// `<...` passthrough, captured without interpolation
    LineRaw,
    /// Bare `.` line opening a verbatim block
    LineDot,
    /// `//-` template-only comment
    LineComment,
    /// `//` comment rendered into the output
    LineCommentHtml,

    // === Tags ===
    /// Tag name (empty for `.class` / `#id` shorthands)
    Tag,
    /// `.class`
    TagClassNote,
    /// `#id`
    TagIdNote,
    /// `( ... )`
    TagAttrList,
    /// `&attributes(expr)`
    TagAttributes,
    /// Trailing `/`
    TagSelfClose,
    /// Trailing `.`: descendants are verbatim text
    TagDotBlock,

    // === Attribute pairs ===
    /// `name=expr`, or a bare `name` with no value
    AttrPairEscaped,
    /// `name!=expr`
    AttrPairUnescaped,

    // === Text and output ===
    PlainText,
    /// `#{expr}` or `= expr`
    OutputEscaped,
    /// `!{expr}` or `!= expr`
    OutputUnescaped,

    // === Control flow ===
    ControlIf,
    ControlUnless,
    ControlElseIf,
    ControlElse,
    ControlWhile,
    /// `each value in expr`
    ControlEach,
    /// `each value, key in expr`
    ControlEachPair,
    /// Loop variable of `ControlEach` / `ControlEachPair`
    EachVariable,
    ControlCase,
    ControlWhen,
    ControlDefault,
    /// Single `- statement`
    CodeLine,
    /// `-` followed by an indented block of statements
    CodeBlock,

    // === Declarations ===
    /// `+name`
    MixinCall,
    /// `+name(args)` argument list
    MixinArgs,
    /// `mixin name(params)`
    MixinDefinition,
    Include,
    Doctype,
}

impl TokenKind {
    /// Kinds whose text is fully covered by their children
    pub fn is_container(self) -> bool {
        matches!(
            self,
            TokenKind::Root
                | TokenKind::Line
                | TokenKind::LineData
                | TokenKind::LinePlainText
                | TokenKind::TagAttrList
        )
    }
}

/// An expression embedded in the template, as handed back by the
/// expression collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embedded<'src, E> {
    pub handle: E,
    /// Expression source, trimmed
    pub text: &'src str,
    pub span: Span,
}

/// One node of the token tree.
///
/// `text` always borrows from the template buffer, so a tree never
/// outlives the source it was lexed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token<'src, E> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<Embedded<'src, E>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Token<'src, E>>,
}

impl<'src, E> Token<'src, E> {
    pub fn new(kind: TokenKind, text: &'src str, span: Span) -> Self {
        Self {
            kind,
            text,
            span,
            expr: None,
            children: Vec::new(),
        }
    }

    pub fn with_expr(mut self, expr: Embedded<'src, E>) -> Self {
        self.expr = Some(expr);
        self
    }

    pub fn push(&mut self, child: Token<'src, E>) {
        self.children.push(child);
    }

    /// First child of a `Line`
    pub fn payload(&self) -> Option<&Token<'src, E>> {
        match self.kind {
            TokenKind::Line => self.children.first(),
            _ => None,
        }
    }

    /// Child tokens of a given kind
    pub fn children_of(&self, kind: TokenKind) -> impl Iterator<Item = &Token<'src, E>> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Nested `Line` children
    pub fn lines(&self) -> impl Iterator<Item = &Token<'src, E>> {
        self.children_of(TokenKind::Line)
    }

    pub fn expr_text(&self) -> Option<&'src str> {
        self.expr.as_ref().map(|e| e.text)
    }

    /// Attribute name with quote escapes resolved.
    ///
    /// Bare names borrow; quoted names containing `\` are unescaped into
    /// an owned string.
    pub fn attr_name(&self) -> Cow<'src, str> {
        unescape_quoted(self.text)
    }

    /// Depth of the deepest node below this one (a leaf has depth 0)
    pub fn depth(&self) -> usize {
        self.children.iter().map(|c| c.depth() + 1).max().unwrap_or(0)
    }

    /// Depth counted in `Line` nodes only
    pub fn line_depth(&self) -> usize {
        let below = self
            .children
            .iter()
            .map(Token::line_depth)
            .max()
            .unwrap_or(0);
        if self.kind == TokenKind::Line { below + 1 } else { below }
    }

    /// Pre-order walk over this token and all descendants
    pub fn walk(&self, f: &mut impl FnMut(&Token<'src, E>)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Indented, one-token-per-line rendering of the tree
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        let _ = write!(out, "{:?}", self.kind);
        if !self.kind.is_container() && !self.text.is_empty() {
            let _ = write!(out, " {:?}", self.text);
        }
        if let Some(expr) = &self.expr {
            let _ = write!(out, " expr={:?}", expr.text);
        }
        out.push('\n');
        for child in &self.children {
            child.dump_into(out, depth + 1);
        }
    }
}

impl<E> fmt::Display for Token<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

/// Resolve backslash escapes inside quoted content: the backslash is dropped
/// and the following character kept.
pub fn unescape_quoted(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}
