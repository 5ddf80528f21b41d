//! Handlers for statements, code blocks, and parenthesised conditions.

use basalt_common::diagnostics::DiagnosticKind;
use basalt_lexer::TokenKind;

use crate::context::Context;
use crate::node_kind::NodeKind;
use crate::precedence::PrecedenceGroup;
use crate::state::State;

/// Dispatches one statement.
pub(crate) fn handle_statement(context: &mut Context<'_, '_, '_>) {
    context.pop_and_discard_state();

    match context.position_kind() {
        TokenKind::Var => context.push_state(State::VariableIntroducer),
        TokenKind::Let => context.push_state(State::LetIntroducer),
        TokenKind::If => context.push_state(State::StatementIf),
        TokenKind::While => context.push_state(State::StatementWhile),
        TokenKind::Match => context.push_state(State::StatementMatch),
        TokenKind::OpenCurlyBrace => context.push_state(State::CodeBlock),
        TokenKind::Return => {
            let subtree_start = context.tree_size();
            let return_token = context.consume();
            if let Some(semi) = context.consume_if(TokenKind::Semi) {
                context.add_leaf_node(NodeKind::StatementEnd, semi, false);
                context.add_node(
                    NodeKind::ReturnStatement,
                    return_token,
                    subtree_start,
                    false,
                );
            } else {
                context.push_state_with(
                    State::ReturnStatementFinish,
                    return_token,
                    subtree_start,
                );
                context.push_state_for_expression(
                    PrecedenceGroup::for_top_level_expression(),
                );
            }
        }
        TokenKind::Break => {
            handle_loop_control(context, TokenKind::Break, NodeKind::BreakStatement)
        }
        TokenKind::Continue => {
            handle_loop_control(context, TokenKind::Continue, NodeKind::ContinueStatement)
        }
        _ => {
            let subtree_start = context.tree_size();
            let token = context.position();
            context.push_state_with(State::ExpressionStatementFinish, token, subtree_start);
            context.push_state_for_expression(
                PrecedenceGroup::for_expression_statement(),
            );
        }
    }
}

/// `break;` and `continue;` have no operands and need no extra state.
fn handle_loop_control(
    context: &mut Context<'_, '_, '_>,
    keyword: TokenKind,
    node_kind: NodeKind,
) {
    let subtree_start = context.tree_size();
    let keyword_token = context.consume_checked(keyword);
    if let Some(semi) = context.consume_if(TokenKind::Semi) {
        context.add_leaf_node(NodeKind::StatementEnd, semi, false);
        context.add_node(node_kind, keyword_token, subtree_start, false);
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedSemiAfterExpression,
            format!("Expected `;` after `{}`.", keyword.fixed_spelling()),
        );
        context.add_node(node_kind, keyword_token, subtree_start, true);
    }
}

pub(crate) fn handle_statement_scope_loop(context: &mut Context<'_, '_, '_>) {
    if context.position_is(TokenKind::CloseCurlyBrace)
        || context.position_is(TokenKind::EndOfFile)
    {
        context.pop_and_discard_state();
    } else {
        context.push_state(State::Statement);
    }
}

pub(crate) fn handle_code_block(context: &mut Context<'_, '_, '_>) {
    context.pop_and_discard_state();

    let subtree_start = context.tree_size();
    if let Some(open) = context.consume_if(TokenKind::OpenCurlyBrace) {
        context.push_state_with(State::CodeBlockFinish, open, subtree_start);
        context.push_state(State::StatementScopeLoop);
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedCodeBlock,
            "Expected braced code block.".to_string(),
        );
        context.push_state_with(State::CodeBlockFinish, position, subtree_start);
        context.return_error_on_state();
        // Recover by parsing a single statement.
        context.push_state(State::Statement);
    }
}

pub(crate) fn handle_code_block_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();

    // When the block started with an open curly, the close is next.
    if context.tokens().kind(state.token) == TokenKind::OpenCurlyBrace {
        context.consume_and_add_close_symbol(state, NodeKind::CodeBlockEnd, NodeKind::CodeBlock);
    } else {
        context.add_node(NodeKind::CodeBlock, state.token, state.subtree_start, true);
    }
}

pub(crate) fn handle_expression_statement_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();

    if let Some(semi) = context.consume_if(TokenKind::Semi) {
        context.add_leaf_node(NodeKind::StatementEnd, semi, false);
        context.add_node(
            NodeKind::ExpressionStatement,
            state.token,
            state.subtree_start,
            state.has_error,
        );
        return;
    }

    let position = context.position();
    context.emit(
        position,
        DiagnosticKind::ExpectedSemiAfterExpression,
        "Expected `;` after expression statement.".to_string(),
    );
    if let Some(semi) = context.skip_past_likely_end(state.token) {
        context.add_leaf_node(NodeKind::StatementEnd, semi, false);
    }
    context.add_node(
        NodeKind::ExpressionStatement,
        state.token,
        state.subtree_start,
        true,
    );
}

pub(crate) fn handle_return_statement_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();

    if let Some(semi) = context.consume_if(TokenKind::Semi) {
        context.add_leaf_node(NodeKind::StatementEnd, semi, false);
        context.add_node(
            NodeKind::ReturnStatement,
            state.token,
            state.subtree_start,
            state.has_error,
        );
        return;
    }

    let position = context.position();
    context.emit(
        position,
        DiagnosticKind::ExpectedSemiAfterExpression,
        "Expected `;` after `return` statement.".to_string(),
    );
    if let Some(semi) = context.skip_past_likely_end(state.token) {
        context.add_leaf_node(NodeKind::StatementEnd, semi, false);
    }
    context.add_node(NodeKind::ReturnStatement, state.token, state.subtree_start, true);
}

// ── If statements ──────────────────────────────────────────────────────

pub(crate) fn handle_statement_if(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    let if_token = context.consume_checked(TokenKind::If);
    context.push_state_with(State::StatementIfThenBlock, if_token, state.subtree_start);
    context.push_state(State::ParenConditionAsIf);
}

pub(crate) fn handle_statement_if_then_block(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    state.state = State::StatementIfElse;
    context.push_entry(state);
    context.push_state(State::CodeBlock);
}

pub(crate) fn handle_statement_if_else(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();

    if let Some(else_token) = context.consume_if(TokenKind::Else) {
        state.state = State::StatementIfFinish;
        context.push_entry(state);
        let subtree_start = context.tree_size();
        context.push_state_with(State::StatementIfElseFinish, else_token, subtree_start);
        if context.position_is(TokenKind::If) {
            context.push_state(State::StatementIf);
        } else {
            context.push_state(State::CodeBlock);
        }
    } else {
        context.add_node(
            NodeKind::IfStatement,
            state.token,
            state.subtree_start,
            state.has_error,
        );
    }
}

pub(crate) fn handle_statement_if_else_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::IfStatementElse,
        state.token,
        state.subtree_start,
        state.has_error,
    );
}

pub(crate) fn handle_statement_if_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::IfStatement,
        state.token,
        state.subtree_start,
        state.has_error,
    );
}

// ── While statements ───────────────────────────────────────────────────

pub(crate) fn handle_statement_while(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    let while_token = context.consume_checked(TokenKind::While);
    context.push_state_with(State::StatementWhileBlock, while_token, state.subtree_start);
    context.push_state(State::ParenConditionAsWhile);
}

pub(crate) fn handle_statement_while_block(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    state.state = State::StatementWhileFinish;
    context.push_entry(state);
    context.push_state(State::CodeBlock);
}

pub(crate) fn handle_statement_while_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::WhileStatement,
        state.token,
        state.subtree_start,
        state.has_error,
    );
}

// ── Match statements ───────────────────────────────────────────────────

pub(crate) fn handle_statement_match(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    let match_token = context.consume_checked(TokenKind::Match);
    context.push_state_with(State::StatementMatchBlock, match_token, state.subtree_start);
    context.push_state(State::ParenConditionAsMatch);
}

pub(crate) fn handle_statement_match_block(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();

    if let Some(open) = context.consume_if(TokenKind::OpenCurlyBrace) {
        state.state = State::StatementMatchFinish;
        context.push_entry(state);
        let subtree_start = context.tree_size();
        context.push_state_with(State::MatchCaseLoop, open, subtree_start);
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedCodeBlock,
            "Expected `{` after `match` condition.".to_string(),
        );
        context.add_node(
            NodeKind::MatchStatement,
            state.token,
            state.subtree_start,
            true,
        );
    }
}

pub(crate) fn handle_statement_match_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::MatchStatement,
        state.token,
        state.subtree_start,
        state.has_error,
    );
}

/// Loops over `case`/`default` arms until the closing brace.
pub(crate) fn handle_match_case_loop(context: &mut Context<'_, '_, '_>) {
    match context.position_kind() {
        TokenKind::Case => context.push_state(State::MatchCase),
        TokenKind::Default => context.push_state(State::MatchDefault),
        TokenKind::CloseCurlyBrace => {
            let state = context.pop_state();
            context.consume_and_add_close_symbol(
                state,
                NodeKind::MatchBlockEnd,
                NodeKind::MatchBlock,
            );
        }
        _ => {
            let position = context.position();
            context.emit(
                position,
                DiagnosticKind::UnexpectedTokenInMatchBlock,
                "Expected `case`, `default`, or `}` in `match` block.".to_string(),
            );
            context.return_error_on_state();
            // Skip the rest of the block; the matched close is ahead.
            let state = context.pop_state();
            let close = context.tokens().matched_closing_token(state.token);
            context.push_entry(state);
            context.skip_to(close);
        }
    }
}

pub(crate) fn handle_match_case(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    let case_token = context.consume_checked(TokenKind::Case);
    context.push_state_with(State::MatchCaseArrow, case_token, state.subtree_start);
    context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
}

pub(crate) fn handle_match_case_arrow(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    if context.consume_if(TokenKind::EqualGreater).is_none() {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedMatchCaseArrow,
            "Expected `=>` after `case` pattern.".to_string(),
        );
        state.has_error = true;
    }
    state.state = State::MatchCaseFinish;
    context.push_entry(state);
    context.push_state(State::CodeBlock);
}

pub(crate) fn handle_match_case_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(NodeKind::MatchCase, state.token, state.subtree_start, state.has_error);
    if state.has_error {
        context.return_error_on_state();
    }
}

pub(crate) fn handle_match_default(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    let default_token = context.consume_checked(TokenKind::Default);
    state.token = default_token;
    if context.consume_if(TokenKind::EqualGreater).is_none() {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedMatchCaseArrow,
            "Expected `=>` after `default`.".to_string(),
        );
        state.has_error = true;
    }
    state.state = State::MatchDefaultFinish;
    context.push_entry(state);
    context.push_state(State::CodeBlock);
}

pub(crate) fn handle_match_default_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::MatchDefault,
        state.token,
        state.subtree_start,
        state.has_error,
    );
    if state.has_error {
        context.return_error_on_state();
    }
}

// ── Parenthesised conditions ───────────────────────────────────────────

struct ConditionKinds {
    keyword: &'static str,
    finish: State,
    condition: NodeKind,
    condition_end: NodeKind,
}

fn condition_kinds_for(state: State) -> ConditionKinds {
    match state {
        State::ParenConditionAsIf | State::ParenConditionFinishAsIf => ConditionKinds {
            keyword: "if",
            finish: State::ParenConditionFinishAsIf,
            condition: NodeKind::IfCondition,
            condition_end: NodeKind::IfConditionEnd,
        },
        State::ParenConditionAsWhile | State::ParenConditionFinishAsWhile => {
            ConditionKinds {
                keyword: "while",
                finish: State::ParenConditionFinishAsWhile,
                condition: NodeKind::WhileCondition,
                condition_end: NodeKind::WhileConditionEnd,
            }
        }
        _ => ConditionKinds {
            keyword: "match",
            finish: State::ParenConditionFinishAsMatch,
            condition: NodeKind::MatchCondition,
            condition_end: NodeKind::MatchConditionEnd,
        },
    }
}

pub(crate) fn handle_paren_condition(context: &mut Context<'_, '_, '_>, state_kind: State) {
    let kinds = condition_kinds_for(state_kind);
    let mut state = context.pop_state();

    let open = context.consume_if(TokenKind::OpenParen);
    if let Some(open) = open {
        state.token = open;
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedParenAfter,
            format!("Expected `(` after `{}`.", kinds.keyword),
        );
        state.has_error = true;
    }
    state.state = kinds.finish;
    context.push_entry(state);

    if open.is_none() && context.position_is(TokenKind::OpenCurlyBrace) {
        // With an open curly right here, assume the condition was
        // omitted entirely rather than parsing the block as a struct
        // literal.
        let position = context.position();
        context.add_leaf_node(NodeKind::InvalidParse, position, true);
    } else {
        context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
    }
}

pub(crate) fn handle_paren_condition_finish(
    context: &mut Context<'_, '_, '_>,
    state_kind: State,
) {
    let kinds = condition_kinds_for(state_kind);
    let state = context.pop_state();

    if context.tokens().kind(state.token) == TokenKind::OpenParen {
        context.consume_and_add_close_symbol(state, kinds.condition_end, kinds.condition);
    } else {
        context.add_node(kinds.condition, state.token, state.subtree_start, true);
    }
}
