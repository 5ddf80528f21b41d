//! Shared context and helpers for the parser's state handlers.

use basalt_common::diagnostics::DiagnosticKind;
use basalt_lexer::{Token, TokenDiagnosticEmitter, TokenKind, TokenizedBuffer};

use crate::node_kind::NodeKind;
use crate::precedence::PrecedenceGroup;
use crate::state::State;
use crate::tree::NodeImpl;

/// The outcome of consuming one delimiter position in a
/// comma-separated list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ListTokenKind {
    /// A comma; more elements follow.
    Comma,
    /// The closing bracket is at the current position.
    Close,
    /// A trailing comma directly before the close.
    CommaClose,
}

/// The pattern contexts, which share one set of handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PatternKind {
    DeducedParameter,
    Parameter,
    Variable,
    Let,
}

/// One frame on the state stack.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StateStackEntry {
    pub(crate) state: State,
    /// Set when an error was found; contextual recovery may be needed.
    pub(crate) has_error: bool,
    /// How tightly the surrounding context binds: expression states
    /// stop at operators the ambient context should consume.
    pub(crate) ambient_precedence: PrecedenceGroup,
    /// The precedence of the most recently parsed left-hand subtree,
    /// for associativity and ambiguity checks on the next operator.
    pub(crate) lhs_precedence: PrecedenceGroup,
    /// The token giving the subtree its context, usually its first
    /// token and usually the eventual node's anchor.
    pub(crate) token: Token,
    /// Where this frame's subtree starts in the node vector.
    pub(crate) subtree_start: u32,
}

/// Context and shared functionality for the state handlers.
pub(crate) struct Context<'e, 't, 's> {
    tokens: &'t TokenizedBuffer<'s>,
    emitter: TokenDiagnosticEmitter<'e, 'e>,
    nodes: Vec<NodeImpl>,
    has_errors: bool,
    /// Index of the current token.
    position: usize,
    /// Index of the `EndOfFile` token.
    end: usize,
    state_stack: Vec<StateStackEntry>,
}

impl<'e, 't, 's> Context<'e, 't, 's> {
    pub(crate) fn new(
        tokens: &'t TokenizedBuffer<'s>,
        emitter: TokenDiagnosticEmitter<'e, 'e>,
    ) -> Self {
        let end = tokens.size().saturating_sub(1);
        debug_assert!(
            tokens.size() > 0 && tokens.kind(Token::new(end)) == TokenKind::EndOfFile,
            "tokenized buffer must end with EndOfFile"
        );
        Self {
            tokens,
            emitter,
            nodes: Vec::with_capacity(tokens.expected_parse_tree_size()),
            has_errors: false,
            position: 0,
            end,
            state_stack: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> (Vec<NodeImpl>, bool) {
        (self.nodes, self.has_errors)
    }

    pub(crate) fn tokens(&self) -> &'t TokenizedBuffer<'s> {
        self.tokens
    }

    pub(crate) fn emit(&mut self, token: Token, kind: DiagnosticKind, message: String) {
        self.emitter.emit(token, kind, message);
    }

    // ── Position management ────────────────────────────────────────────

    /// The current token.
    pub(crate) fn position(&self) -> Token {
        Token::new(self.position)
    }

    pub(crate) fn position_kind(&self) -> TokenKind {
        self.tokens.kind(self.position())
    }

    pub(crate) fn position_is(&self, kind: TokenKind) -> bool {
        self.position_kind() == kind
    }

    /// Returns the current token and moves past it.
    pub(crate) fn consume(&mut self) -> Token {
        debug_assert!(self.position < self.end, "cannot consume past EndOfFile");
        let token = self.position();
        self.position += 1;
        token
    }

    pub(crate) fn consume_checked(&mut self, kind: TokenKind) -> Token {
        debug_assert_eq!(self.position_kind(), kind, "current token is the wrong kind");
        self.consume()
    }

    pub(crate) fn consume_if(&mut self, kind: TokenKind) -> Option<Token> {
        if !self.position_is(kind) {
            return None;
        }
        Some(self.consume())
    }

    /// Moves the position to the given token.
    pub(crate) fn skip_to(&mut self, token: Token) {
        debug_assert!(token.index() >= self.position, "can only skip forward");
        self.position = token.index();
    }

    /// Finds the next token of one of the given kinds at this nesting
    /// level, skipping over matched groups. Stops without a result at
    /// the end of the enclosing group or file.
    pub(crate) fn find_next_of(&self, kinds: &[TokenKind]) -> Option<Token> {
        let mut index = self.position;
        loop {
            let token = Token::new(index);
            let kind = self.tokens.kind(token);
            if kinds.contains(&kind) {
                return Some(token);
            }
            match kind {
                TokenKind::EndOfFile => return None,
                kind if kind.is_closing_symbol() => return None,
                kind if kind.is_opening_symbol() => {
                    index = self.tokens.matched_closing_token(token).index() + 1;
                }
                _ => index += 1,
            }
        }
    }

    // ── Node emission ──────────────────────────────────────────────────

    /// Appends a childless node.
    pub(crate) fn add_leaf_node(&mut self, kind: NodeKind, token: Token, has_error: bool) {
        self.nodes.push(NodeImpl { kind, has_error, token, subtree_size: 1 });
        if has_error {
            self.has_errors = true;
        }
    }

    /// Appends a node covering everything since `subtree_start`.
    pub(crate) fn add_node(
        &mut self,
        kind: NodeKind,
        token: Token,
        subtree_start: u32,
        has_error: bool,
    ) {
        let subtree_size = self.nodes.len() as u32 - subtree_start + 1;
        self.nodes.push(NodeImpl { kind, has_error, token, subtree_size });
        if has_error {
            self.has_errors = true;
        }
    }

    /// Consumes the current token into a leaf node when it has the
    /// given kind.
    pub(crate) fn consume_and_add_leaf_node_if(
        &mut self,
        token_kind: TokenKind,
        node_kind: NodeKind,
    ) -> bool {
        let Some(token) = self.consume_if(token_kind) else {
            return false;
        };
        self.add_leaf_node(node_kind, token, false);
        true
    }

    /// The number of nodes so far: the subtree start for a state pushed
    /// now.
    pub(crate) fn tree_size(&self) -> u32 {
        self.nodes.len() as u32
    }

    // ── State stack management ─────────────────────────────────────────

    pub(crate) fn current_state(&self) -> Option<State> {
        self.state_stack.last().map(|entry| entry.state)
    }

    pub(crate) fn push_state(&mut self, state: State) {
        let entry = StateStackEntry {
            state,
            has_error: false,
            ambient_precedence: PrecedenceGroup::for_top_level_expression(),
            lhs_precedence: PrecedenceGroup::for_postfix_expression(),
            token: self.position(),
            subtree_start: self.tree_size(),
        };
        self.push_entry(entry);
    }

    /// Pushes a state frame anchored on a specific token and subtree
    /// start.
    pub(crate) fn push_state_with(&mut self, state: State, token: Token, subtree_start: u32) {
        let entry = StateStackEntry {
            state,
            has_error: false,
            ambient_precedence: PrecedenceGroup::for_top_level_expression(),
            lhs_precedence: PrecedenceGroup::for_postfix_expression(),
            token,
            subtree_start,
        };
        self.push_entry(entry);
    }

    /// Begins parsing an expression in the given ambient context.
    pub(crate) fn push_state_for_expression(&mut self, ambient_precedence: PrecedenceGroup) {
        let entry = StateStackEntry {
            state: State::Expression,
            has_error: false,
            ambient_precedence,
            lhs_precedence: PrecedenceGroup::for_postfix_expression(),
            token: self.position(),
            subtree_start: self.tree_size(),
        };
        self.push_entry(entry);
    }

    pub(crate) fn push_entry(&mut self, entry: StateStackEntry) {
        debug_assert!(
            self.state_stack.len() < self.tokens.size() * 4 + 16,
            "runaway state stack"
        );
        self.state_stack.push(entry);
    }

    pub(crate) fn pop_state(&mut self) -> StateStackEntry {
        match self.state_stack.pop() {
            Some(entry) => entry,
            None => unreachable!("handlers only run with their state on the stack"),
        }
    }

    pub(crate) fn pop_and_discard_state(&mut self) {
        self.state_stack.pop();
    }

    /// Marks the state that will resume after the current handler as
    /// erroneous.
    pub(crate) fn return_error_on_state(&mut self) {
        if let Some(entry) = self.state_stack.last_mut() {
            entry.has_error = true;
        }
    }

    // ── Shared parsing helpers ─────────────────────────────────────────

    /// Consumes the delimiter position of a comma-separated list,
    /// recovering past unexpected tokens to the next comma or close.
    pub(crate) fn consume_list_token(
        &mut self,
        comma_kind: NodeKind,
        close_kind: TokenKind,
        already_has_error: bool,
    ) -> ListTokenKind {
        if !self.position_is(TokenKind::Comma) && !self.position_is(close_kind) {
            if !already_has_error {
                let position = self.position();
                self.emit(
                    position,
                    DiagnosticKind::UnexpectedTokenAfterListElement,
                    format!(
                        "Expected `,` or `{}`.",
                        close_kind.fixed_spelling()
                    ),
                );
            }
            self.return_error_on_state();

            // The matched close is guaranteed to exist ahead of us, so
            // this always lands on a comma or the close.
            if let Some(next) = self.find_next_of(&[TokenKind::Comma, close_kind]) {
                self.skip_to(next);
            }
        }

        if self.position_is(close_kind) {
            return ListTokenKind::Close;
        }
        let Some(comma) = self.consume_if(TokenKind::Comma) else {
            return ListTokenKind::Close;
        };
        self.add_leaf_node(comma_kind, comma, false);
        if self.position_is(close_kind) {
            ListTokenKind::CommaClose
        } else {
            ListTokenKind::Comma
        }
    }

    /// Consumes the closing symbol matched with `state.token` (an
    /// opening symbol), skipping any junk before it, then adds the end
    /// leaf and the bracketed node.
    pub(crate) fn consume_and_add_close_symbol(
        &mut self,
        mut state: StateStackEntry,
        end_leaf_kind: NodeKind,
        node_kind: NodeKind,
    ) {
        let close = self.tokens.matched_closing_token(state.token);
        if self.position() != close {
            if !state.has_error {
                let position = self.position();
                let close_spelling =
                    self.tokens.kind(state.token).closing_symbol().fixed_spelling();
                self.emit(
                    position,
                    DiagnosticKind::ExpectedCloseSymbol,
                    format!("Expected `{close_spelling}`."),
                );
            }
            state.has_error = true;
            self.skip_to(close);
        }
        let close_token = self.consume();
        self.add_leaf_node(end_leaf_kind, close_token, false);
        self.add_node(node_kind, state.token, state.subtree_start, state.has_error);
    }

    /// Skips forward to a token that likely ends the current
    /// declaration or statement: a `;` at this nesting level, stopping
    /// short of a closing brace or a dedent back past the root's
    /// indentation. Returns the consumed `;`, if one was found.
    pub(crate) fn skip_past_likely_end(&mut self, skip_root: Token) -> Option<Token> {
        if self.position == self.end {
            return None;
        }

        let root_line = self.tokens.line(skip_root);
        let root_indent = self.tokens.indent_column_number(root_line);

        loop {
            match self.position_kind() {
                TokenKind::CloseCurlyBrace => return None,
                TokenKind::Semi => return Some(self.consume()),
                kind if kind.is_opening_symbol() => {
                    let close = self.tokens.matched_closing_token(self.position());
                    self.position = close.index() + 1;
                }
                _ => self.position += 1,
            }

            if self.position == self.end {
                return None;
            }
            let line = self.tokens.line(self.position());
            let same_line_or_indented = line == root_line
                || self.tokens.indent_column_number(line) > root_indent;
            if !same_line_or_indented {
                return None;
            }
        }
    }

    /// Finishes a failed declaration: optionally skips to its likely
    /// end, then adds the declaration node marked as erroneous.
    pub(crate) fn recover_from_declaration_error(
        &mut self,
        state: StateStackEntry,
        kind: NodeKind,
        skip_past_likely_end: bool,
    ) {
        if skip_past_likely_end {
            if let Some(semi) = self.skip_past_likely_end(state.token) {
                self.add_node(kind, semi, state.subtree_start, true);
                return;
            }
        }
        self.add_node(kind, state.token, state.subtree_start, true);
    }

    pub(crate) fn emit_expected_declaration_semi(&mut self, introducer: TokenKind) {
        let position = self.position();
        self.emit(
            position,
            DiagnosticKind::ExpectedDeclarationSemi,
            format!("`{}` declarations must end with a `;`.", introducer.fixed_spelling()),
        );
    }
}
