//! Handlers for file-scope and type-scope declarations.

use basalt_common::diagnostics::DiagnosticKind;
use basalt_lexer::TokenKind;

use crate::context::{Context, ListTokenKind};
use crate::node_kind::NodeKind;
use crate::precedence::PrecedenceGroup;
use crate::state::State;

/// The declaration loop: dispatches one declaration per iteration and
/// pops at the end of the scope.
pub(crate) fn handle_declaration_scope_loop(context: &mut Context<'_, '_, '_>) {
    match context.position_kind() {
        TokenKind::EndOfFile | TokenKind::CloseCurlyBrace => {
            context.pop_and_discard_state();
        }
        TokenKind::Semi => {
            let semi = context.consume();
            context.add_leaf_node(NodeKind::EmptyDeclaration, semi, false);
        }
        TokenKind::Fn => context.push_state(State::FunctionIntroducer),
        TokenKind::Namespace => context.push_state(State::Namespace),
        TokenKind::Package => context.push_state(State::Package),
        TokenKind::Class => context.push_state(State::TypeIntroducerAsClass),
        TokenKind::Interface => context.push_state(State::TypeIntroducerAsInterface),
        TokenKind::Constraint => {
            context.push_state(State::TypeIntroducerAsNamedConstraint)
        }
        TokenKind::Var => context.push_state(State::VariableIntroducer),
        TokenKind::Let => context.push_state(State::LetIntroducer),
        _ => {
            let token = context.position();
            context.emit(
                token,
                DiagnosticKind::UnrecognizedDeclaration,
                format!(
                    "Unrecognized declaration introducer `{}`.",
                    context.tokens().token_text(token)
                ),
            );
            if let Some(semi) = context.skip_past_likely_end(token) {
                context.add_leaf_node(NodeKind::EmptyDeclaration, semi, true);
            } else {
                context.add_leaf_node(NodeKind::InvalidParse, token, true);
                // Make sure the loop advances past whatever this was.
                if context.position() == token {
                    context.consume();
                }
            }
        }
    }
}

/// Parses a possibly qualified declared name: `A` or `A.B.C`.
pub(crate) fn handle_declaration_name(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();

    if !context.position_is(TokenKind::Identifier) {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedDeclarationName,
            "Expected name in declaration.".to_string(),
        );
        context.add_leaf_node(NodeKind::InvalidParse, position, true);
        context.return_error_on_state();
        return;
    }
    let name = context.consume();
    context.add_leaf_node(NodeKind::DeclaredName, name, false);

    while let Some(period) = context.consume_if(TokenKind::Period) {
        if !context.position_is(TokenKind::Identifier) {
            let position = context.position();
            context.emit(
                position,
                DiagnosticKind::ExpectedIdentifierAfterPeriod,
                "Expected identifier after `.`.".to_string(),
            );
            context.add_leaf_node(NodeKind::InvalidParse, position, true);
            context.add_node(NodeKind::QualifiedName, period, state.subtree_start, true);
            context.return_error_on_state();
            return;
        }
        let name = context.consume();
        context.add_leaf_node(NodeKind::DeclaredName, name, false);
        context.add_node(NodeKind::QualifiedName, period, state.subtree_start, false);
    }
}

// ── Functions ──────────────────────────────────────────────────────────

pub(crate) fn handle_function_introducer(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    context.consume_checked(TokenKind::Fn);

    if context.position_is(TokenKind::Identifier) {
        let name = context.consume();
        context.add_leaf_node(NodeKind::DeclaredName, name, false);
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedDeclarationName,
            "Expected function name after `fn`.".to_string(),
        );
        state.has_error = true;
    }

    state.state = State::FunctionParameterList;
    context.push_entry(state);
    if context.position_is(TokenKind::OpenSquareBracket) {
        context.push_state(State::DeducedParameterList);
    }
}

pub(crate) fn handle_function_parameter_list(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    if context.position_is(TokenKind::OpenParen) {
        state.state = State::FunctionSignature;
        context.push_entry(state);
        context.push_state(State::ParameterList);
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedParenAfter,
            "Expected `(` in function declaration.".to_string(),
        );
        state.has_error = true;
        state.state = State::FunctionSignature;
        context.push_entry(state);
    }
}

pub(crate) fn handle_function_signature(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    state.state = State::FunctionBody;
    if let Some(arrow) = context.consume_if(TokenKind::MinusGreater) {
        context.push_entry(state);
        let subtree_start = context.tree_size();
        context.push_state_with(State::ReturnTypeFinish, arrow, subtree_start);
        context.push_state_for_expression(PrecedenceGroup::for_type());
    } else {
        context.push_entry(state);
    }
}

pub(crate) fn handle_return_type_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(NodeKind::ReturnType, state.token, state.subtree_start, state.has_error);
    if state.has_error {
        context.return_error_on_state();
    }
}

pub(crate) fn handle_function_body(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();

    if let Some(semi) = context.consume_if(TokenKind::Semi) {
        context.add_leaf_node(NodeKind::DeclarationEnd, semi, false);
        context.add_node(
            NodeKind::FunctionDeclaration,
            state.token,
            state.subtree_start,
            state.has_error,
        );
        return;
    }

    if context.position_is(TokenKind::OpenCurlyBrace) {
        state.state = State::FunctionDefinitionFinish;
        context.push_entry(state);
        context.push_state(State::CodeBlock);
        return;
    }

    let position = context.position();
    context.emit(
        position,
        DiagnosticKind::ExpectedDeclarationSemiOrDefinition,
        "Expected `;` or `{` after function signature.".to_string(),
    );
    // Only skip ahead when the stray token shares the signature's final
    // line; a dedented token likely starts the next declaration.
    let skip = position.index() > 0 && {
        let previous = basalt_lexer::Token::new(position.index() - 1);
        context.tokens().line(position) == context.tokens().line(previous)
    };
    context.recover_from_declaration_error(state, NodeKind::FunctionDeclaration, skip);
}

pub(crate) fn handle_function_definition_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::FunctionDefinition,
        state.token,
        state.subtree_start,
        state.has_error,
    );
}

// ── Parameter lists ────────────────────────────────────────────────────

pub(crate) fn handle_deduced_parameter_list(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    let open = context.consume_checked(TokenKind::OpenSquareBracket);
    state.token = open;
    state.state = State::DeducedParameterListFinish;
    context.push_entry(state);
    if !context.position_is(TokenKind::CloseSquareBracket) {
        context.push_state(State::DeducedParameterListElementFinish);
        context.push_state(State::PatternAsDeducedParameter);
    }
}

pub(crate) fn handle_deduced_parameter_list_element_finish(
    context: &mut Context<'_, '_, '_>,
) {
    let state = context.pop_state();
    if state.has_error {
        context.return_error_on_state();
    }
    if context.consume_list_token(
        NodeKind::DeducedParameterListComma,
        TokenKind::CloseSquareBracket,
        state.has_error,
    ) == ListTokenKind::Comma
    {
        context.push_state(State::DeducedParameterListElementFinish);
        context.push_state(State::PatternAsDeducedParameter);
    }
}

pub(crate) fn handle_deduced_parameter_list_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.consume_and_add_close_symbol(
        state,
        NodeKind::DeducedParameterListEnd,
        NodeKind::DeducedParameterList,
    );
}

pub(crate) fn handle_parameter_list(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    let open = context.consume_checked(TokenKind::OpenParen);
    state.token = open;
    state.state = State::ParameterListFinish;
    context.push_entry(state);
    if !context.position_is(TokenKind::CloseParen) {
        context.push_state(State::ParameterListElementFinish);
        context.push_state(State::PatternAsParameter);
    }
}

pub(crate) fn handle_parameter_list_element_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    if state.has_error {
        context.return_error_on_state();
    }
    if context.consume_list_token(
        NodeKind::ParameterListComma,
        TokenKind::CloseParen,
        state.has_error,
    ) == ListTokenKind::Comma
    {
        context.push_state(State::ParameterListElementFinish);
        context.push_state(State::PatternAsParameter);
    }
}

pub(crate) fn handle_parameter_list_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.consume_and_add_close_symbol(
        state,
        NodeKind::ParameterListEnd,
        NodeKind::ParameterList,
    );
}

// ── Namespaces and packages ────────────────────────────────────────────

pub(crate) fn handle_namespace(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    context.consume_checked(TokenKind::Namespace);
    state.state = State::NamespaceFinish;
    context.push_entry(state);
    context.push_state(State::DeclarationName);
}

pub(crate) fn handle_namespace_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();

    if state.has_error {
        context.recover_from_declaration_error(state, NodeKind::NamespaceDeclaration, true);
        return;
    }

    if let Some(semi) = context.consume_if(TokenKind::Semi) {
        context.add_leaf_node(NodeKind::DeclarationEnd, semi, false);
        context.add_node(
            NodeKind::NamespaceDeclaration,
            state.token,
            state.subtree_start,
            state.has_error,
        );
    } else {
        context.emit_expected_declaration_semi(TokenKind::Namespace);
        context.recover_from_declaration_error(state, NodeKind::NamespaceDeclaration, true);
    }
}

pub(crate) fn handle_package(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    context.consume_checked(TokenKind::Package);

    if context.position_is(TokenKind::Identifier) {
        let name = context.consume();
        context.add_leaf_node(NodeKind::DeclaredName, name, false);
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedDeclarationName,
            "Expected package name after `package`.".to_string(),
        );
        state.has_error = true;
    }

    if let Some(api) = context.consume_if(TokenKind::Api) {
        context.add_leaf_node(NodeKind::PackageApi, api, false);
    } else if let Some(impl_token) = context.consume_if(TokenKind::Impl) {
        context.add_leaf_node(NodeKind::PackageImpl, impl_token, false);
    }

    state.state = State::PackageFinish;
    context.push_entry(state);
}

pub(crate) fn handle_package_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();

    if let Some(semi) = context.consume_if(TokenKind::Semi) {
        context.add_leaf_node(NodeKind::DeclarationEnd, semi, false);
        context.add_node(
            NodeKind::PackageDeclaration,
            state.token,
            state.subtree_start,
            state.has_error,
        );
    } else {
        context.emit_expected_declaration_semi(TokenKind::Package);
        context.recover_from_declaration_error(state, NodeKind::PackageDeclaration, true);
    }
}

// ── Classes, interfaces, named constraints ─────────────────────────────

struct TypeKinds {
    introducer: TokenKind,
    after_name: State,
    body_finish: State,
    definition_finish: State,
    declaration: NodeKind,
    definition: NodeKind,
    body: NodeKind,
    body_end: NodeKind,
}

fn type_kinds_for(state: State) -> TypeKinds {
    match state {
        State::TypeIntroducerAsClass
        | State::TypeAfterNameAsClass
        | State::TypeBodyFinishAsClass
        | State::TypeDefinitionFinishAsClass => TypeKinds {
            introducer: TokenKind::Class,
            after_name: State::TypeAfterNameAsClass,
            body_finish: State::TypeBodyFinishAsClass,
            definition_finish: State::TypeDefinitionFinishAsClass,
            declaration: NodeKind::ClassDeclaration,
            definition: NodeKind::ClassDefinition,
            body: NodeKind::ClassBody,
            body_end: NodeKind::ClassBodyEnd,
        },
        State::TypeIntroducerAsInterface
        | State::TypeAfterNameAsInterface
        | State::TypeBodyFinishAsInterface
        | State::TypeDefinitionFinishAsInterface => TypeKinds {
            introducer: TokenKind::Interface,
            after_name: State::TypeAfterNameAsInterface,
            body_finish: State::TypeBodyFinishAsInterface,
            definition_finish: State::TypeDefinitionFinishAsInterface,
            declaration: NodeKind::InterfaceDeclaration,
            definition: NodeKind::InterfaceDefinition,
            body: NodeKind::InterfaceBody,
            body_end: NodeKind::InterfaceBodyEnd,
        },
        _ => TypeKinds {
            introducer: TokenKind::Constraint,
            after_name: State::TypeAfterNameAsNamedConstraint,
            body_finish: State::TypeBodyFinishAsNamedConstraint,
            definition_finish: State::TypeDefinitionFinishAsNamedConstraint,
            declaration: NodeKind::NamedConstraintDeclaration,
            definition: NodeKind::NamedConstraintDefinition,
            body: NodeKind::NamedConstraintBody,
            body_end: NodeKind::NamedConstraintBodyEnd,
        },
    }
}

pub(crate) fn handle_type_introducer(context: &mut Context<'_, '_, '_>, state_kind: State) {
    let kinds = type_kinds_for(state_kind);
    let mut state = context.pop_state();
    context.consume_checked(kinds.introducer);

    if context.position_is(TokenKind::Identifier) {
        let name = context.consume();
        context.add_leaf_node(NodeKind::DeclaredName, name, false);
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedDeclarationName,
            format!(
                "Expected name after `{}`.",
                kinds.introducer.fixed_spelling()
            ),
        );
        state.has_error = true;
    }

    state.state = kinds.after_name;
    context.push_entry(state);
}

pub(crate) fn handle_type_after_name(context: &mut Context<'_, '_, '_>, state_kind: State) {
    let kinds = type_kinds_for(state_kind);
    let mut state = context.pop_state();

    if let Some(semi) = context.consume_if(TokenKind::Semi) {
        context.add_leaf_node(NodeKind::DeclarationEnd, semi, false);
        context.add_node(kinds.declaration, state.token, state.subtree_start, state.has_error);
        return;
    }

    if context.position_is(TokenKind::OpenCurlyBrace) {
        let open = context.consume();
        state.state = kinds.definition_finish;
        context.push_entry(state);
        let subtree_start = context.tree_size();
        context.push_state_with(kinds.body_finish, open, subtree_start);
        context.push_state(State::DeclarationScopeLoop);
        return;
    }

    let position = context.position();
    context.emit(
        position,
        DiagnosticKind::ExpectedDeclarationSemiOrDefinition,
        format!(
            "Expected `;` or `{{` after `{}` name.",
            kinds.introducer.fixed_spelling()
        ),
    );
    context.recover_from_declaration_error(state, kinds.declaration, true);
}

pub(crate) fn handle_type_body_finish(context: &mut Context<'_, '_, '_>, state_kind: State) {
    let kinds = type_kinds_for(state_kind);
    let state = context.pop_state();
    context.consume_and_add_close_symbol(state, kinds.body_end, kinds.body);
}

pub(crate) fn handle_type_definition_finish(
    context: &mut Context<'_, '_, '_>,
    state_kind: State,
) {
    let kinds = type_kinds_for(state_kind);
    let state = context.pop_state();
    context.add_node(kinds.definition, state.token, state.subtree_start, state.has_error);
}

// ── Variable and let declarations ──────────────────────────────────────

pub(crate) fn handle_variable_introducer(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    context.consume_checked(TokenKind::Var);
    state.state = State::VariableAfterPattern;
    context.push_entry(state);
    context.push_state(State::PatternAsVariable);
}

pub(crate) fn handle_variable_after_pattern(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();

    if let Some(equal) = context.consume_if(TokenKind::Equal) {
        state.state = State::VariableFinish;
        context.push_entry(state);
        let subtree_start = context.tree_size();
        context.push_state_with(State::VariableInitializerFinish, equal, subtree_start);
        context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
    } else {
        state.state = State::VariableFinish;
        context.push_entry(state);
    }
}

pub(crate) fn handle_variable_initializer_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::VariableInitializer,
        state.token,
        state.subtree_start,
        state.has_error,
    );
    if state.has_error {
        context.return_error_on_state();
    }
}

pub(crate) fn handle_variable_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();

    if let Some(semi) = context.consume_if(TokenKind::Semi) {
        context.add_leaf_node(NodeKind::DeclarationEnd, semi, false);
        context.add_node(
            NodeKind::VariableDeclaration,
            state.token,
            state.subtree_start,
            state.has_error,
        );
    } else {
        context.emit_expected_declaration_semi(TokenKind::Var);
        context.recover_from_declaration_error(state, NodeKind::VariableDeclaration, true);
    }
}

pub(crate) fn handle_let_introducer(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();
    context.consume_checked(TokenKind::Let);
    state.state = State::LetAfterPattern;
    context.push_entry(state);
    context.push_state(State::PatternAsLet);
}

pub(crate) fn handle_let_after_pattern(context: &mut Context<'_, '_, '_>) {
    let mut state = context.pop_state();

    if let Some(equal) = context.consume_if(TokenKind::Equal) {
        state.state = State::LetFinish;
        context.push_entry(state);
        let subtree_start = context.tree_size();
        context.push_state_with(State::LetInitializerFinish, equal, subtree_start);
        context.push_state_for_expression(PrecedenceGroup::for_top_level_expression());
    } else {
        let position = context.position();
        context.emit(
            position,
            DiagnosticKind::ExpectedLetInitializer,
            "`let` declarations require an `=` initializer.".to_string(),
        );
        state.has_error = true;
        state.state = State::LetFinish;
        context.push_entry(state);
    }
}

pub(crate) fn handle_let_initializer_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();
    context.add_node(
        NodeKind::LetInitializer,
        state.token,
        state.subtree_start,
        state.has_error,
    );
    if state.has_error {
        context.return_error_on_state();
    }
}

pub(crate) fn handle_let_finish(context: &mut Context<'_, '_, '_>) {
    let state = context.pop_state();

    if let Some(semi) = context.consume_if(TokenKind::Semi) {
        context.add_leaf_node(NodeKind::DeclarationEnd, semi, false);
        context.add_node(
            NodeKind::LetDeclaration,
            state.token,
            state.subtree_start,
            state.has_error,
        );
    } else {
        context.emit_expected_declaration_semi(TokenKind::Let);
        context.recover_from_declaration_error(state, NodeKind::LetDeclaration, true);
    }
}
