//! The parse tree: a flat post-order array of nodes.
//!
//! Each node records its kind, anchor token, subtree size, and error
//! bit in 12 bytes. A node's children occupy the contiguous index
//! range just below it; `subtree_size` is the jump to the next
//! non-descendant in reverse post-order. Nodes are append-only, so the
//! layout invariant holds by construction.

use basalt_common::define_index_type;
use basalt_common::diagnostics::DiagnosticConsumer;
use basalt_lexer::{Token, TokenDiagnosticEmitter, TokenLocationTranslator, TokenizedBuffer};

use crate::context::Context;
use crate::grammar;
use crate::node_kind::NodeKind;
use crate::state::State;

define_index_type! {
    /// A lightweight handle for a node in a [`ParseTree`].
    pub struct Node
}

/// The in-memory record for one node.
#[derive(Clone, Copy, Debug)]
pub(crate) struct NodeImpl {
    pub(crate) kind: NodeKind,
    /// Whether this node is or contains a parse error. When set, the
    /// subtree may not have the structure its kind promises.
    pub(crate) has_error: bool,
    pub(crate) token: Token,
    /// The number of nodes this node covers in post-order, including
    /// itself. Always at least 1.
    pub(crate) subtree_size: u32,
}

/// A parse tree over a tokenized buffer.
///
/// Purely syntactic: no name lookup or semantics. Once built the tree
/// is immutable. Depth-first traversal needs no extra state: post-order
/// is index order, and reverse post-order steps by `subtree_size`.
pub struct ParseTree<'t, 's> {
    pub(crate) node_impls: Vec<NodeImpl>,
    pub(crate) tokens: &'t TokenizedBuffer<'s>,
    pub(crate) has_errors: bool,
}

impl<'t, 's> ParseTree<'t, 's> {
    /// Parses a tokenized buffer into a tree.
    pub fn parse(
        tokens: &'t TokenizedBuffer<'s>,
        consumer: &mut dyn DiagnosticConsumer,
    ) -> ParseTree<'t, 's> {
        let translator = TokenLocationTranslator::new(tokens);
        let emitter = TokenDiagnosticEmitter::new(&translator, consumer);
        let mut context = Context::new(tokens, emitter);

        context.push_state(State::DeclarationScopeLoop);
        while let Some(state) = context.current_state() {
            grammar::dispatch(state, &mut context);
        }

        let (node_impls, nodes_have_errors) = context.finish();
        let tree = ParseTree {
            node_impls,
            tokens,
            has_errors: nodes_have_errors || tokens.has_errors(),
        };
        debug_assert!(
            tree.verify().is_ok(),
            "parse tree built but does not verify: {:?}",
            tree.verify()
        );
        tree
    }

    /// Whether any parse error was encountered, or the underlying
    /// buffer had lexing errors.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// The number of nodes in the tree.
    pub fn size(&self) -> usize {
        self.node_impls.len()
    }

    /// All nodes in depth-first post-order.
    pub fn postorder(&self) -> impl DoubleEndedIterator<Item = Node> + ExactSizeIterator
    {
        (0..self.node_impls.len()).map(Node::new)
    }

    /// The subtree rooted at `n`, in post-order.
    pub fn postorder_for(
        &self,
        n: Node,
    ) -> impl DoubleEndedIterator<Item = Node> + ExactSizeIterator {
        let end = n.index() + 1;
        let start = end - self.node_impls[n.index()].subtree_size as usize;
        (start..end).map(Node::new)
    }

    /// The direct children of `n`, in source order.
    pub fn children(&self, n: Node) -> impl Iterator<Item = Node> + '_ {
        let end = n.index() as i64 - self.node_impls[n.index()].subtree_size as i64;
        SiblingIter { tree: self, current: n.index() as i64 - 1, end }
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
    }

    /// The roots of the tree, in source order.
    pub fn roots(&self) -> impl Iterator<Item = Node> + '_ {
        SiblingIter {
            tree: self,
            current: self.node_impls.len() as i64 - 1,
            end: -1,
        }
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
    }

    pub fn node_has_error(&self, n: Node) -> bool {
        self.node_impls[n.index()].has_error
    }

    pub fn node_kind(&self, n: Node) -> NodeKind {
        self.node_impls[n.index()].kind
    }

    /// The token the node's source position is anchored on.
    pub fn node_token(&self, n: Node) -> Token {
        self.node_impls[n.index()].token
    }

    pub fn node_subtree_size(&self, n: Node) -> usize {
        self.node_impls[n.index()].subtree_size as usize
    }

    /// The text of the node's anchor token.
    pub fn node_text(&self, n: Node) -> &'s str {
        self.tokens.token_text(self.node_impls[n.index()].token)
    }

    /// Renders the tree as nested `{node_index, kind, text, ...}`
    /// entries.
    pub fn print(&self, out: &mut impl std::fmt::Write) -> std::fmt::Result {
        writeln!(out, "[")?;

        // Stack of (node, depth); roots pushed in reverse source order
        // so the pops come out in source order.
        let mut node_stack: Vec<(Node, usize)> = Vec::new();
        let mut roots: Vec<Node> = self.roots().collect();
        roots.reverse();
        for root in roots {
            node_stack.push((root, 0));
        }

        while let Some((n, depth)) = node_stack.pop() {
            let n_impl = &self.node_impls[n.index()];

            for _ in 0..depth {
                write!(out, "  ")?;
            }

            write!(
                out,
                "{{node_index: {}, kind: '{}', text: '{}'",
                n.index(),
                n_impl.kind.name(),
                self.node_text(n)
            )?;

            if n_impl.has_error {
                write!(out, ", has_error: yes")?;
            }

            if n_impl.subtree_size > 1 {
                write!(out, ", subtree_size: {}", n_impl.subtree_size)?;
                writeln!(out, ", children: [")?;
                let mut children: Vec<Node> = self.children(n).collect();
                children.reverse();
                for child in children {
                    node_stack.push((child, depth + 1));
                }
                continue;
            }

            write!(out, "}}")?;

            let next_depth = node_stack.last().map_or(0, |&(_, d)| d);
            debug_assert!(next_depth <= depth, "cannot have the next depth increase");
            for _ in 0..(depth - next_depth) {
                write!(out, "]}}")?;
            }
            writeln!(out, ",")?;
        }
        writeln!(out, "]")
    }

    /// Checks the tree's structural invariants: subtree sizes are
    /// positive, nest within their parents, and the roots partition the
    /// node range.
    pub fn verify(&self) -> Result<(), String> {
        let mut ancestors: Vec<Node> = Vec::new();
        for n in self.postorder().rev() {
            let n_impl = &self.node_impls[n.index()];

            if n_impl.has_error && !self.has_errors {
                return Err(format!(
                    "node #{} has errors, but the tree is not marked as having any",
                    n.index()
                ));
            }

            if n_impl.subtree_size > 1 {
                if let Some(&parent) = ancestors.last() {
                    let parent_impl = &self.node_impls[parent.index()];
                    let end_index = n.index() as i64 - n_impl.subtree_size as i64;
                    let parent_end_index =
                        parent.index() as i64 - parent_impl.subtree_size as i64;
                    if parent_end_index > end_index {
                        return Err(format!(
                            "node #{} has a subtree size of {} which extends beyond its parent's (node #{}) subtree (size {})",
                            n.index(),
                            n_impl.subtree_size,
                            parent.index(),
                            parent_impl.subtree_size
                        ));
                    }
                }
                ancestors.push(n);
                continue;
            }

            if n_impl.subtree_size < 1 {
                return Err(format!(
                    "node #{} has an invalid subtree size of {}",
                    n.index(),
                    n_impl.subtree_size
                ));
            }

            let next_index = n.index() as i64 - 1;
            while let Some(&parent) = ancestors.last() {
                let parent_impl = &self.node_impls[parent.index()];
                if parent.index() as i64 - parent_impl.subtree_size as i64 != next_index
                {
                    break;
                }
                ancestors.pop();
            }
        }
        if !ancestors.is_empty() {
            return Err(format!(
                "finished walking the parse tree and {} ancestors remain",
                ancestors.len()
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for ParseTree<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut rendered = String::new();
        self.print(&mut rendered)?;
        f.write_str(&rendered)
    }
}

/// Iterates siblings in reverse source order by stepping over whole
/// subtrees.
struct SiblingIter<'a, 't, 's> {
    tree: &'a ParseTree<'t, 's>,
    current: i64,
    end: i64,
}

impl Iterator for SiblingIter<'_, '_, '_> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        if self.current <= self.end {
            return None;
        }
        let n = Node::new(self.current as usize);
        self.current -= self.tree.node_impls[n.index()].subtree_size as i64;
        Some(n)
    }
}
