//! Handlers for binding patterns.
//!
//! A pattern is `name: Type`, optionally wrapped by `addr` or
//! `template` modifiers. The same handlers serve deduced parameters,
//! regular parameters, `var`, and `let`.

use basalt_common::diagnostics::DiagnosticKind;
use basalt_lexer::TokenKind;

use crate::context::{Context, PatternKind};
use crate::node_kind::NodeKind;
use crate::precedence::PrecedenceGroup;
use crate::state::State;

fn pattern_kind_for(state: State) -> PatternKind {
    match state {
        State::PatternAsDeducedParameter => PatternKind::DeducedParameter,
        State::PatternAsParameter => PatternKind::Parameter,
        State::PatternAsVariable => PatternKind::Variable,
        _ => PatternKind::Let,
    }
}

pub(crate) fn handle_pattern(context: &mut Context<'_, '_, '_>, state_kind: State) {
    let state = context.pop_state();
    let kind = pattern_kind_for(state_kind);

    // Modifier wrappers close over the binding once it is parsed, so
    // their finish states go beneath the binding state.
    if matches!(kind, PatternKind::DeducedParameter | PatternKind::Parameter) {
        if let Some(addr) = context.consume_if(TokenKind::Addr) {
            context.push_state_with(State::AddressFinish, addr, state.subtree_start);
        }
        if let Some(template) = context.consume_if(TokenKind::Template) {
            context.push_state_with(
                State::TemplateMarkerFinish,
                template,
                state.subtree_start,
            );
        }
    }

    context.push_state(State::PatternBinding);
}

pub(crate) fn handle_pattern_binding(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();

    if !context.position_is(TokenKind::Identifier) {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedParameterName,
            "Expected name in binding pattern.".to_string(),
        );
        context.add_leaf_node(NodeKind::InvalidParse, position, true);
        context.return_error_on_state();
        return;
    }

    let name = context.consume();
    context.add_leaf_node(NodeKind::DeclaredName, name, false);

    if let Some(colon) = context.consume_if(TokenKind::Colon) {
        context.push_state_with(State::PatternBindingFinish, colon, state.subtree_start);
        context.push_state_for_expression(PrecedenceGroup::for_type());
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedBindingColon,
            "Expected `:` in binding pattern.".to_string(),
        );
        context.add_node(NodeKind::PatternBinding, state.token, state.subtree_start, true);
        context.return_error_on_state();
    }
}

pub(crate) fn handle_pattern_binding_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::PatternBinding,
        state.token,
        state.subtree_start,
        state.has_error,
    );
    if state.has_error {
        context.return_error_on_state();
    }
}

pub(crate) fn handle_address_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(NodeKind::Address, state.token, state.subtree_start, state.has_error);
    if state.has_error {
        context.return_error_on_state();
    }
}

pub(crate) fn handle_template_marker_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::TemplateMarker,
        state.token,
        state.subtree_start,
        state.has_error,
    );
    if state.has_error {
        context.return_error_on_state();
    }
}
