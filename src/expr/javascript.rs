use super::scan::extent;
use super::{ExprMode, ExprShape, ExpressionParser};
use serde::Serialize;
use tree_sitter::{Node, Parser};

/// Handle produced by [`ScriptExpressions`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptExpr {
    /// tree-sitter node kind of the expression or statement
    pub kind: &'static str,
    pub shape: ExprShape,
}

/// Expression parser that validates embedded code as JavaScript.
///
/// The extent of each expression is found with the structural scanner;
/// the text is then parsed with tree-sitter and rejected on any syntax error.
pub struct ScriptExpressions {
    parser: Parser,
}

impl ScriptExpressions {
    pub fn new() -> Result<Self, tree_sitter::LanguageError> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_javascript::LANGUAGE.into())?;
        Ok(Self { parser })
    }
}

impl ExpressionParser for ScriptExpressions {
    type Expr = ScriptExpr;

    fn parse(&mut self, remaining: &str, mode: ExprMode<'_>) -> Option<(ScriptExpr, usize)> {
        let len = extent(remaining, mode)?;
        let text = remaining[..len].trim();

        let statement = matches!(mode, ExprMode::Statement { .. });
        // Parenthesize so that object literals and bare names parse as expressions
        let source = if statement {
            text.to_string()
        } else {
            format!("({})", text)
        };

        let tree = self.parser.parse(&source, None)?;
        let root = tree.root_node();
        if root.has_error() {
            tracing::trace!(text, "rejected by javascript grammar");
            return None;
        }

        let node = if statement {
            root.named_child(0)?
        } else {
            // program > expression_statement > parenthesized_expression > expr
            root.named_child(0)?.named_child(0)?.named_child(0)?
        };

        Some((
            ScriptExpr {
                kind: node.kind(),
                shape: shape_of_node(node),
            },
            len,
        ))
    }

    fn shape(&self, expr: &ScriptExpr) -> ExprShape {
        expr.shape
    }
}

fn shape_of_node(node: Node<'_>) -> ExprShape {
    match node.kind() {
        "identifier" => ExprShape::Identifier,
        "call_expression" => match node.child_by_field_name("function") {
            Some(callee) if callee.kind() == "identifier" => ExprShape::CallOnIdentifier,
            _ => ExprShape::Other,
        },
        _ => ExprShape::Other,
    }
}
