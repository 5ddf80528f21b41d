//! Handlers for expressions.
//!
//! Expression parsing is precedence-climbing spread across states: a
//! leading-operator check, a postfix primary with its suffix loop, and
//! a trailing-operator loop that consults the priority table against
//! both the ambient context and the left-hand subtree.

use basalt_common::diagnostics::DiagnosticKind;
use basalt_lexer::TokenKind;

use crate::context::{Context, ListTokenKind, StateStackEntry};
use crate::node_kind::NodeKind;
use crate::precedence::{OperatorPriority, PrecedenceGroup};
use crate::state::State;

/// Whether a token could begin an operand expression.
fn can_start_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::IntegerLiteral
            | TokenKind::RealLiteral
            | TokenKind::StringLiteral
            | TokenKind::IntegerTypeLiteral
            | TokenKind::UnsignedIntegerTypeLiteral
            | TokenKind::FloatingPointTypeLiteral
            | TokenKind::StringTypeLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Bool
            | TokenKind::Type
            | TokenKind::Auto
            | TokenKind::SelfValueIdentifier
            | TokenKind::SelfTypeIdentifier
            | TokenKind::OpenParen
            | TokenKind::OpenCurlyBrace
            | TokenKind::OpenSquareBracket
            | TokenKind::If
    ) || PrecedenceGroup::for_leading(kind).is_some()
}

/// Whether the trailing operator at the current position is infix: its
/// leading and trailing whitespace must agree (`a * b` and `a*b` are
/// infix, `T*` is not), and an operand must follow.
fn is_trailing_operator_infix(context: &Context<'_, '_, '_>) -> bool {
    let position = context.position();
    if context.tokens().has_leading_whitespace(position)
        != context.tokens().has_trailing_whitespace(position)
    {
        return false;
    }
    let next = basalt_lexer::Token::new(position.index() + 1);
    next.index() < context.tokens().size() && can_start_operand(context.tokens().kind(next))
}

pub(crate) fn handle_expression(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();

    // `if` expressions have their own then/else plumbing.
    if context.position_is(TokenKind::If) {
        state.token = context.consume();
        state.state = State::IfExpressionFinishCondition;
        context.push_entry(state);
        context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
        return;
    }

    if let Some(operator) = PrecedenceGroup::for_leading(context.position_kind()) {
        if PrecedenceGroup::priority(state.ambient_precedence, operator)
            != OperatorPriority::RightFirst
        {
            let position = context.position();
            context.emit(
                position,
                DiagnosticKind::UnaryOperatorRequiresParentheses,
                format!(
                    "Parentheses are required around this unary `{}` operator.",
                    context.tokens().token_text(position)
                ),
            );
            state.has_error = true;
        }
        state.token = context.consume();
        state.lhs_precedence = operator;
        state.state = State::ExpressionLoopForPrefix;
        context.push_entry(state);
        context.push_state_for_expression(operator);
    } else {
        state.state = State::ExpressionInPostfix;
        context.push_entry(state);
    }
}

pub(crate) fn handle_expression_in_postfix(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();

    match context.position_kind() {
        TokenKind::Identifier => {
            let token = context.consume();
            context.add_leaf_node(NodeKind::NameReference, token, false);
        }
        TokenKind::IntegerLiteral
        | TokenKind::RealLiteral
        | TokenKind::StringLiteral
        | TokenKind::IntegerTypeLiteral
        | TokenKind::UnsignedIntegerTypeLiteral
        | TokenKind::FloatingPointTypeLiteral
        | TokenKind::StringTypeLiteral
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Bool
        | TokenKind::Type
        | TokenKind::Auto
        | TokenKind::SelfValueIdentifier
        | TokenKind::SelfTypeIdentifier => {
            let token = context.consume();
            context.add_leaf_node(NodeKind::Literal, token, false);
        }
        TokenKind::OpenParen => {
            let open = context.consume();
            if let Some(close) = context.consume_if(TokenKind::CloseParen) {
                // `()` is the empty tuple.
                context.add_leaf_node(NodeKind::TupleLiteralEnd, close, false);
                context.add_node(
                    NodeKind::TupleLiteral,
                    open,
                    state.subtree_start,
                    false,
                );
            } else {
                state.state = State::ExpressionInPostfixLoop;
                let subtree_start = state.subtree_start;
                context.push_entry(state);
                context.push_state_with(State::ParenExpressionFinish, open, subtree_start);
                context.push_state(State::ParenExpressionParameterFinishAsUnknown);
                context.push_state_for_expression(
                    PrecedenceGroup::for_top_level_expression(),
                );
                return;
            }
        }
        TokenKind::OpenCurlyBrace => {
            let open = context.consume();
            if let Some(close) = context.consume_if(TokenKind::CloseCurlyBrace) {
                context.add_leaf_node(NodeKind::StructLiteralEnd, close, false);
                context.add_node(
                    NodeKind::StructLiteral,
                    open,
                    state.subtree_start,
                    false,
                );
            } else {
                state.state = State::ExpressionInPostfixLoop;
                let subtree_start = state.subtree_start;
                context.push_entry(state);
                context.push_state_with(State::StructLiteralFinish, open, subtree_start);
                context.push_state(State::StructLiteralElementFinish);
                context.push_state(State::StructField);
                return;
            }
        }
        TokenKind::OpenSquareBracket => {
            // `[ElementType; Bound]` array type.
            let open = context.consume();
            state.state = State::ExpressionInPostfixLoop;
            let subtree_start = state.subtree_start;
            context.push_entry(state);
            context.push_state_with(State::ArrayExpressionSemi, open, subtree_start);
            context.push_state_for_expression(PrecedenceGroup::for_type());
            return;
        }
        _ => {
            let position = context.position();
            context.emit(
                position,
                DiagnosticKind::ExpectedExpression,
                "Expected expression.".to_string(),
            );
            context.add_leaf_node(NodeKind::InvalidParse, position, true);
            context.return_error_on_state();
            return;
        }
    }

    state.state = State::ExpressionInPostfixLoop;
    context.push_entry(state);
}

pub(crate) fn handle_expression_in_postfix_loop(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();

    match context.position_kind() {
        TokenKind::Period => {
            let period = context.consume();
            if context.position_is(TokenKind::Identifier) {
                let name = context.consume();
                context.add_leaf_node(NodeKind::NameReference, name, false);
            } else {
                let position = context.position();
                context.emit(
                    position,
                    DiagnosticKind::ExpectedIdentifierAfterPeriod,
                    "Expected identifier after `.`.".to_string(),
                );
                context.add_leaf_node(NodeKind::InvalidParse, position, true);
                state.has_error = true;
            }
            context.add_node(
                NodeKind::MemberAccessExpression,
                period,
                state.subtree_start,
                state.has_error,
            );
            context.push_entry(state);
        }
        TokenKind::MinusGreater => {
            let arrow = context.consume();
            if context.position_is(TokenKind::Identifier) {
                let name = context.consume();
                context.add_leaf_node(NodeKind::NameReference, name, false);
            } else {
                let position = context.position();
                context.emit(
                    position,
                    DiagnosticKind::ExpectedIdentifierAfterPeriod,
                    "Expected identifier after `->`.".to_string(),
                );
                context.add_leaf_node(NodeKind::InvalidParse, position, true);
                state.has_error = true;
            }
            context.add_node(
                NodeKind::PointerMemberAccessExpression,
                arrow,
                state.subtree_start,
                state.has_error,
            );
            context.push_entry(state);
        }
        TokenKind::OpenParen => {
            let open = context.consume();
            let subtree_start = state.subtree_start;
            let has_error = state.has_error;
            context.push_entry(state);
            context.push_entry(StateStackEntry {
                state: State::CallExpressionFinish,
                has_error,
                ambient_precedence: PrecedenceGroup::for_top_level_expression(),
                lhs_precedence: PrecedenceGroup::for_postfix_expression(),
                token: open,
                subtree_start,
            });
            if !context.position_is(TokenKind::CloseParen) {
                context.push_state(State::CallExpressionParameterFinish);
                context.push_state_for_expression(
                    PrecedenceGroup::for_top_level_expression(),
                );
            }
        }
        TokenKind::OpenSquareBracket => {
            let open = context.consume();
            let subtree_start = state.subtree_start;
            context.push_entry(state);
            context.push_state_with(State::IndexExpressionFinish, open, subtree_start);
            context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
        }
        _ => {
            state.state = State::ExpressionLoop;
            context.push_entry(state);
        }
    }
}

pub(crate) fn handle_expression_loop(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();

    let Some(trailing) = PrecedenceGroup::for_trailing(
        context.position_kind(),
        is_trailing_operator_infix(context),
    ) else {
        return;
    };

    // An operator the ambient context binds tighter than is left for
    // the outer expression to consume.
    if PrecedenceGroup::priority(state.ambient_precedence, trailing.level)
        != OperatorPriority::RightFirst
    {
        return;
    }

    // The left-hand subtree must bind tighter than the operator;
    // otherwise the pairing is ambiguous.
    if PrecedenceGroup::priority(state.lhs_precedence, trailing.level)
        != OperatorPriority::LeftFirst
    {
        if !state.has_error {
            let position = context.position();
            context.emit(
                position,
                DiagnosticKind::OperatorRequiresParentheses,
                "Parentheses are required to disambiguate operator precedence."
                    .to_string(),
            );
        }
        state.has_error = true;
    }

    state.token = context.consume();
    if trailing.is_binary {
        state.state = State::ExpressionLoopForBinary;
        context.push_entry(state);
        context.push_state_for_expression(trailing.level);
    } else {
        context.add_node(
            NodeKind::PostfixOperator,
            state.token,
            state.subtree_start,
            state.has_error,
        );
        state.lhs_precedence = trailing.level;
        state.state = State::ExpressionLoop;
        context.push_entry(state);
    }
}

pub(crate) fn handle_expression_loop_for_binary(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    context.add_node(
        NodeKind::InfixOperator,
        state.token,
        state.subtree_start,
        state.has_error,
    );
    state.lhs_precedence = PrecedenceGroup::for_trailing(
        context.tokens().kind(state.token),
        true,
    )
    .map(|trailing| trailing.level)
    .unwrap_or_else(PrecedenceGroup::for_postfix_expression);
    state.state = State::ExpressionLoop;
    context.push_entry(state);
}

pub(crate) fn handle_expression_loop_for_prefix(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    context.add_node(
        NodeKind::PrefixOperator,
        state.token,
        state.subtree_start,
        state.has_error,
    );
    state.state = State::ExpressionLoop;
    context.push_entry(state);
}

// ── If expressions ─────────────────────────────────────────────────────

pub(crate) fn handle_if_expression_finish_condition(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    if context.consume_if(TokenKind::Then).is_none() {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedThenAfterIf,
            "Expected `then` after `if` condition.".to_string(),
        );
        state.has_error = true;
    }
    state.state = State::IfExpressionFinishThen;
    context.push_entry(state);
    context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
}

pub(crate) fn handle_if_expression_finish_then(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    if context.consume_if(TokenKind::Else).is_none() {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedElseAfterIf,
            "Expected `else` after `if ... then ...`.".to_string(),
        );
        state.has_error = true;
    }
    state.state = State::IfExpressionFinish;
    context.push_entry(state);
    context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
}

pub(crate) fn handle_if_expression_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::IfExpression,
        state.token,
        state.subtree_start,
        state.has_error,
    );
    if state.has_error {
        context.return_error_on_state();
    }
}

// ── Calls and indexing ─────────────────────────────────────────────────

pub(crate) fn handle_call_expression_parameter_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    if state.has_error {
        context.return_error_on_state();
    }
    if context.consume_list_token(
        NodeKind::CallExpressionComma,
        TokenKind::CloseParen,
        state.has_error,
    ) == ListTokenKind::Comma
    {
        context.push_state(State::CallExpressionParameterFinish);
        context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
    }
}

pub(crate) fn handle_call_expression_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.consume_and_add_close_symbol(
        state,
        NodeKind::CallExpressionEnd,
        NodeKind::CallExpression,
    );
}

pub(crate) fn handle_index_expression_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.consume_and_add_close_symbol(
        state,
        NodeKind::IndexExpressionEnd,
        NodeKind::IndexExpression,
    );
}

// ── Parenthesised expressions and tuples ───────────────────────────────

pub(crate) fn handle_paren_expression_parameter_finish_as_unknown(
    context: &mut Context<'_, '_, '_>,
) {
    let state = context.pop_state();
    if state.has_error {
        context.return_error_on_state();
    }

    match context.consume_list_token(
        NodeKind::TupleLiteralComma,
        TokenKind::CloseParen,
        state.has_error,
    ) {
        ListTokenKind::Close => {}
        list_token => {
            // A comma makes this a tuple; retarget the finish state.
            let mut finish = context.pop_state();
            debug_assert_eq!(finish.state, State::ParenExpressionFinish);
            finish.state = State::TupleLiteralFinish;
            context.push_entry(finish);
            if list_token == ListTokenKind::Comma {
                context.push_state(State::ParenExpressionParameterFinishAsTuple);
                context.push_state_for_expression(
                    PrecedenceGroup::for_top_level_expression(),
                );
            }
        }
    }
}

pub(crate) fn handle_paren_expression_parameter_finish_as_tuple(
    context: &mut Context<'_, '_, '_>,
) {
    let state = context.pop_state();
    if state.has_error {
        context.return_error_on_state();
    }
    if context.consume_list_token(
        NodeKind::TupleLiteralComma,
        TokenKind::CloseParen,
        state.has_error,
    ) == ListTokenKind::Comma
    {
        context.push_state(State::ParenExpressionParameterFinishAsTuple);
        context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
    }
}

pub(crate) fn handle_paren_expression_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.consume_and_add_close_symbol(
        state,
        NodeKind::ParenExpressionEnd,
        NodeKind::ParenExpression,
    );
}

pub(crate) fn handle_tuple_literal_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.consume_and_add_close_symbol(
        state,
        NodeKind::TupleLiteralEnd,
        NodeKind::TupleLiteral,
    );
}

// ── Struct literals ────────────────────────────────────────────────────

pub(crate) fn handle_struct_field(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();

    let Some(period) = context.consume_if(TokenKind::Period) else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedStructLiteralField,
            "Expected `.field = value` or `.field: type`.".to_string(),
        );
        context.add_leaf_node(NodeKind::InvalidParse, position, true);
        context.return_error_on_state();
        return;
    };

    if context.position_is(TokenKind::Identifier) {
        let name = context.consume();
        context.add_leaf_node(NodeKind::NameReference, name, false);
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedIdentifierAfterPeriod,
            "Expected identifier after `.`.".to_string(),
        );
        context.add_leaf_node(NodeKind::InvalidParse, position, true);
        state.has_error = true;
    }
    context.add_node(
        NodeKind::StructFieldDesignator,
        period,
        state.subtree_start,
        state.has_error,
    );

    if let Some(equal) = context.consume_if(TokenKind::Equal) {
        context.push_state_with(State::StructFieldValueFinish, equal, state.subtree_start);
        context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
    } else if let Some(colon) = context.consume_if(TokenKind::Colon) {
        context.push_state_with(State::StructFieldTypeFinish, colon, state.subtree_start);
        context.push_state_for_expression(PrecedenceGroup::for_type());
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedStructLiteralField,
            "Expected `=` or `:` after designator.".to_string(),
        );
        context.return_error_on_state();
    }
}

pub(crate) fn handle_struct_field_value_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::StructFieldValue,
        state.token,
        state.subtree_start,
        state.has_error,
    );
    if state.has_error {
        context.return_error_on_state();
    }
}

pub(crate) fn handle_struct_field_type_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::StructFieldType,
        state.token,
        state.subtree_start,
        state.has_error,
    );
    if state.has_error {
        context.return_error_on_state();
    }
}

pub(crate) fn handle_struct_literal_element_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    if state.has_error {
        context.return_error_on_state();
    }
    if context.consume_list_token(
        NodeKind::StructComma,
        TokenKind::CloseCurlyBrace,
        state.has_error,
    ) == ListTokenKind::Comma
    {
        context.push_state(State::StructLiteralElementFinish);
        context.push_state(State::StructField);
    }
}

pub(crate) fn handle_struct_literal_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.consume_and_add_close_symbol(
        state,
        NodeKind::StructLiteralEnd,
        NodeKind::StructLiteral,
    );
}

// ── Array types ────────────────────────────────────────────────────────

pub(crate) fn handle_array_expression_semi(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();

    if let Some(semi) = context.consume_if(TokenKind::Semi) {
        context.add_leaf_node(NodeKind::ArrayExpressionSemi, semi, false);
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedArraySemi,
            "Expected `;` in array type.".to_string(),
        );
        context.add_leaf_node(NodeKind::ArrayExpressionSemi, position, true);
        state.has_error = true;
    }

    state.state = State::ArrayExpressionFinish;
    context.push_entry(state);
    if !context.position_is(TokenKind::CloseSquareBracket) {
        context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
    }
}

pub(crate) fn handle_array_expression_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.consume_and_add_close_symbol(
        state,
        NodeKind::ArrayExpressionEnd,
        NodeKind::ArrayExpression,
    );
}
