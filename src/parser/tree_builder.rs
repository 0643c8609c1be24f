use crate::error::ErrorKind;
use crate::token::{Span, Token, TokenKind};

pub(crate) type NodeId = usize;

const ROOT: NodeId = 0;

/// Where nested lines of a node end up when the tree is folded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attach {
    /// Directly under the `Line`
    Line,
    /// Under the line's tag (or payload, for non-tag lines)
    Payload,
}

#[derive(Debug)]
struct Node<'src, E> {
    token: Token<'src, E>,
    parent: Option<NodeId>,
    nested: usize,
    attach: Attach,
}

/// Builds the token tree from lines as they are lexed.
///
/// Lines live in an arena while the run is in progress, so reparenting only
/// moves indices. `finish` folds the arena into an owned tree.
#[derive(Debug)]
pub(crate) struct TreeBuilder<'src, E> {
    nodes: Vec<Node<'src, E>>,
    /// `open[0]` is the root; `open[k]` is the current line at level `k - 1`
    open: Vec<NodeId>,
    max_depth: usize,
}

impl<'src, E> TreeBuilder<'src, E> {
    pub fn new(max_depth: usize) -> Self {
        let root = Node {
            token: Token::new(TokenKind::Root, "", Span::default()),
            parent: None,
            nested: 0,
            attach: Attach::Line,
        };
        Self {
            nodes: vec![root],
            open: vec![ROOT],
            max_depth,
        }
    }

    /// A line at `level` may close any number of open levels but open at
    /// most one new level
    pub fn check_level(&self, level: usize) -> Result<(), ErrorKind> {
        if level >= self.max_depth {
            return Err(ErrorKind::IndentationTooDeep);
        }
        if level >= self.open.len() {
            return Err(ErrorKind::InvalidIndentationJump);
        }
        Ok(())
    }

    /// Add a physical line at `level` and make it the innermost open line
    pub fn open_line(&mut self, level: usize, line: Token<'src, E>) -> Result<NodeId, ErrorKind> {
        self.check_level(level)?;
        let parent = self.open[level];
        let id = self.add(parent, line);
        self.open.truncate(level + 1);
        self.open.push(id);
        Ok(id)
    }

    /// Attach a followed-by line under the payload of `owner`. It takes over
    /// the owner's level, so deeper lines nest inside it.
    pub fn expand(&mut self, owner: NodeId, line: Token<'src, E>) -> NodeId {
        self.nodes[owner].attach = Attach::Payload;
        let id = self.add(owner, line);
        if let Some(innermost) = self.open.last_mut() {
            if *innermost == owner {
                *innermost = id;
            }
        }
        id
    }

    /// Attach a verbatim line under `owner` without touching the open levels
    pub fn append(&mut self, owner: NodeId, line: Token<'src, E>) -> NodeId {
        self.add(owner, line)
    }

    fn add(&mut self, parent: NodeId, token: Token<'src, E>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            token,
            parent: Some(parent),
            nested: 0,
            attach: Attach::Line,
        });
        self.nodes[parent].nested += 1;
        id
    }

    /// Fold the arena into the owned tree rooted at `Root`.
    ///
    /// Children always have larger ids than their parents, so walking the
    /// arena backwards completes every node before its parent is reached.
    pub fn finish(self) -> Token<'src, E> {
        let mut folded: Vec<Vec<Token<'src, E>>> = self
            .nodes
            .iter()
            .map(|node| Vec::with_capacity(node.nested))
            .collect();
        let mut root = Token::new(TokenKind::Root, "", Span::default());

        for (id, node) in self.nodes.into_iter().enumerate().rev() {
            let mut children = std::mem::take(&mut folded[id]);
            children.reverse();
            let mut token = node.token;
            attach(&mut token, node.attach, children);
            match node.parent {
                Some(parent) => folded[parent].push(token),
                None => root = token,
            }
        }
        root
    }
}

fn attach<'src, E>(line: &mut Token<'src, E>, mode: Attach, children: Vec<Token<'src, E>>) {
    if children.is_empty() {
        return;
    }
    let target = match mode {
        Attach::Line => None,
        Attach::Payload => line.children.first_mut().map(|payload| {
            if payload.kind == TokenKind::LineData && !payload.children.is_empty() {
                &mut payload.children[0]
            } else {
                payload
            }
        }),
    };
    match target {
        Some(target) => target.children.extend(children),
        None => line.children.extend(children),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> Token<'_, ()> {
        Token::new(TokenKind::Line, text, Span::new(0, text.len()))
    }

    fn tag_line(name: &str) -> Token<'_, ()> {
        let mut data = Token::new(TokenKind::LineData, "", Span::default());
        data.push(Token::new(TokenKind::Tag, name, Span::new(0, name.len())));
        let mut l = line(name);
        l.push(data);
        l
    }

    #[test]
    fn test_nesting_and_dedent() {
        let mut tree = TreeBuilder::new(32);
        tree.open_line(0, line("ul")).unwrap();
        tree.open_line(1, line("li")).unwrap();
        tree.open_line(1, line("li")).unwrap();
        tree.open_line(0, line("p")).unwrap();
        let root = tree.finish();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].lines().count(), 2);
        assert_eq!(root.children[1].text, "p");
    }

    #[test]
    fn test_jump_rejected() {
        let mut tree: TreeBuilder<'_, ()> = TreeBuilder::new(32);
        assert_eq!(tree.check_level(1), Err(ErrorKind::InvalidIndentationJump));
        tree.open_line(0, line("a")).unwrap();
        assert_eq!(tree.check_level(2), Err(ErrorKind::InvalidIndentationJump));
        assert_eq!(tree.check_level(1), Ok(()));
    }

    #[test]
    fn test_depth_cap() {
        let mut tree = TreeBuilder::new(2);
        tree.open_line(0, line("a")).unwrap();
        tree.open_line(1, line("b")).unwrap();
        assert_eq!(tree.check_level(2), Err(ErrorKind::IndentationTooDeep));
    }

    #[test]
    fn test_expand_attaches_under_tag_and_takes_level() {
        let mut tree = TreeBuilder::new(32);
        let li = tree.open_line(0, tag_line("li")).unwrap();
        tree.expand(li, tag_line("a"));
        tree.open_line(1, line("span")).unwrap();
        let root = tree.finish();

        let li = &root.children[0];
        assert_eq!(li.children.len(), 1);
        let li_tag = &li.children[0].children[0];
        let a_line = &li_tag.children[0];
        assert_eq!(a_line.text, "a");
        assert_eq!(a_line.lines().next().map(|l| l.text), Some("span"));
    }
}
