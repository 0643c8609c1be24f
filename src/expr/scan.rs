use super::{ExprMode, ExprShape, ExpressionParser};
use serde::Serialize;

/// Word operators that join the expressions on either side of a space
const KEYWORD_OPERATORS: &[&str] = &[
    "in", "of", "instanceof", "typeof", "new", "void", "delete", "await",
];

/// Handle produced by [`LooseExpressions`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedExpr {
    pub shape: ExprShape,
}

/// Structural expression scanner.
///
/// Balances brackets and skips quoted strings but checks no grammar, so any
/// expression language with C-like delimiters is accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct LooseExpressions;

impl ExpressionParser for LooseExpressions {
    type Expr = ScannedExpr;

    fn parse(&mut self, remaining: &str, mode: ExprMode<'_>) -> Option<(ScannedExpr, usize)> {
        let len = extent(remaining, mode)?;
        let shape = shape_of(remaining[..len].trim());
        Some((ScannedExpr { shape }, len))
    }

    fn shape(&self, expr: &ScannedExpr) -> ExprShape {
        expr.shape
    }
}

/// Length of the expression at the start of `input`, excluding trailing
/// whitespace. `None` when the input is blank, a string or bracket is left
/// open, or brackets are mismatched.
pub fn extent(input: &str, mode: ExprMode<'_>) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut closers: Vec<u8> = Vec::new();
    let mut quote: Option<u8> = None;
    let mut ternaries = 0usize;
    let mut end = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if let Some(q) = quote {
            match b {
                b'\\' => {
                    i = (i + 2).min(bytes.len());
                    end = i;
                    continue;
                }
                b'\n' | b'\r' if q != b'`' => return None,
                _ if b == q => quote = None,
                _ => {}
            }
            i += 1;
            end = i;
            continue;
        }

        let top_level = closers.is_empty();
        match b {
            b'\n' | b'\r' => {
                if top_level {
                    break;
                }
                match mode {
                    ExprMode::AttributeValue => {
                        i += 1;
                        continue;
                    }
                    ExprMode::Statement { newline }
                        if !newline.is_empty() && input[i..].starts_with(newline) =>
                    {
                        i += newline.len();
                        continue;
                    }
                    _ => return None,
                }
            }
            b' ' | b'\t' => {
                if top_level
                    && mode == ExprMode::AttributeValue
                    && end > 0
                    && !joins_across_space(input, end, i)
                {
                    break;
                }
                i += 1;
                continue;
            }
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'(' => closers.push(b')'),
            b'[' => closers.push(b']'),
            b'{' => closers.push(b'}'),
            b')' | b']' | b'}' => match closers.last() {
                None => break,
                Some(&c) if c == b => {
                    closers.pop();
                }
                Some(_) => return None,
            },
            b',' if top_level && mode == ExprMode::AttributeValue => break,
            b';' if top_level && matches!(mode, ExprMode::Statement { .. }) => break,
            b'?' if top_level => match bytes.get(i + 1) {
                // `??` and `?.` are not ternaries
                Some(b'?') => {
                    i += 2;
                    end = i;
                    continue;
                }
                Some(b'.') => {}
                _ => ternaries += 1,
            },
            b':' if top_level && !matches!(mode, ExprMode::Statement { .. }) => {
                if ternaries == 0 {
                    break;
                }
                ternaries -= 1;
            }
            _ => {}
        }
        i += 1;
        end = i;
    }

    if quote.is_some() || !closers.is_empty() || end == 0 {
        return None;
    }
    Some(end)
}

/// Whether the whitespace starting at `space` continues the expression that
/// so far ends at `end`
fn joins_across_space(input: &str, end: usize, space: usize) -> bool {
    let bytes = input.as_bytes();
    let next = input[space..].trim_start_matches([' ', '\t']);
    let prev = bytes[end - 1];

    if is_operator(prev) || next.bytes().next().is_some_and(is_operator) {
        return true;
    }

    let prev_word_start = input[..end]
        .rfind(|c: char| !is_word_char(c))
        .map_or(0, |i| i + 1);
    let prev_word = &input[prev_word_start..end];
    let next_word = next.split(|c: char| !is_word_char(c)).next().unwrap_or("");
    KEYWORD_OPERATORS.contains(&prev_word) || KEYWORD_OPERATORS.contains(&next_word)
}

fn is_operator(b: u8) -> bool {
    matches!(
        b,
        b'+' | b'-' | b'*' | b'/' | b'%' | b'&' | b'|' | b'^' | b'<' | b'>' | b'=' | b'!'
            | b'?' | b':' | b'~' | b'.'
    )
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Classify an expression as a bare name, a call on a bare name, or
/// anything else. Names may contain `-` so that mixin names qualify.
pub fn shape_of(text: &str) -> ExprShape {
    let name_len = text
        .bytes()
        .take_while(|&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'-'))
        .count();
    if name_len == 0 || text.as_bytes()[0].is_ascii_digit() || text.starts_with('-') {
        return ExprShape::Other;
    }

    let rest = text[name_len..].trim_start();
    if rest.is_empty() {
        return ExprShape::Identifier;
    }
    if rest.starts_with('(') && matching_paren(rest) == Some(rest.len() - 1) {
        return ExprShape::CallOnIdentifier;
    }
    ExprShape::Other
}

/// Index of the `)` closing the `(` at the start of `text`
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, b) in text.bytes().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
