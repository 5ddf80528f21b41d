//! State handlers, grouped by construct.

mod declarations;
mod expressions;
mod patterns;
mod statements;

use crate::context::Context;
use crate::state::State;

/// Runs the handler for the state on top of the stack.
pub(crate) fn dispatch(state: State, context: &mut Context<'_, '_, '_>) {
    use State::*;
    match state {
        DeclarationScopeLoop => declarations::handle_declaration_scope_loop(context),
        DeclarationName => declarations::handle_declaration_name(context),

        FunctionIntroducer => declarations::handle_function_introducer(context),
        FunctionParameterList => declarations::handle_function_parameter_list(context),
        FunctionSignature => declarations::handle_function_signature(context),
        FunctionBody => declarations::handle_function_body(context),
        FunctionDefinitionFinish => {
            declarations::handle_function_definition_finish(context)
        }
        ReturnTypeFinish => declarations::handle_return_type_finish(context),
        DeducedParameterList => declarations::handle_deduced_parameter_list(context),
        DeducedParameterListElementFinish => {
            declarations::handle_deduced_parameter_list_element_finish(context)
        }
        DeducedParameterListFinish => {
            declarations::handle_deduced_parameter_list_finish(context)
        }
        ParameterList => declarations::handle_parameter_list(context),
        ParameterListElementFinish => {
            declarations::handle_parameter_list_element_finish(context)
        }
        ParameterListFinish => declarations::handle_parameter_list_finish(context),

        Namespace => declarations::handle_namespace(context),
        NamespaceFinish => declarations::handle_namespace_finish(context),
        Package => declarations::handle_package(context),
        PackageFinish => declarations::handle_package_finish(context),

        TypeIntroducerAsClass
        | TypeIntroducerAsInterface
        | TypeIntroducerAsNamedConstraint => {
            declarations::handle_type_introducer(context, state)
        }
        TypeAfterNameAsClass | TypeAfterNameAsInterface
        | TypeAfterNameAsNamedConstraint => {
            declarations::handle_type_after_name(context, state)
        }
        TypeBodyFinishAsClass | TypeBodyFinishAsInterface
        | TypeBodyFinishAsNamedConstraint => {
            declarations::handle_type_body_finish(context, state)
        }
        TypeDefinitionFinishAsClass
        | TypeDefinitionFinishAsInterface
        | TypeDefinitionFinishAsNamedConstraint => {
            declarations::handle_type_definition_finish(context, state)
        }

        VariableIntroducer => declarations::handle_variable_introducer(context),
        VariableAfterPattern => declarations::handle_variable_after_pattern(context),
        VariableInitializerFinish => {
            declarations::handle_variable_initializer_finish(context)
        }
        VariableFinish => declarations::handle_variable_finish(context),
        LetIntroducer => declarations::handle_let_introducer(context),
        LetAfterPattern => declarations::handle_let_after_pattern(context),
        LetInitializerFinish => declarations::handle_let_initializer_finish(context),
        LetFinish => declarations::handle_let_finish(context),

        PatternAsParameter | PatternAsDeducedParameter | PatternAsVariable
        | PatternAsLet => patterns::handle_pattern(context, state),
        PatternBinding => patterns::handle_pattern_binding(context),
        PatternBindingFinish => patterns::handle_pattern_binding_finish(context),
        AddressFinish => patterns::handle_address_finish(context),
        TemplateMarkerFinish => patterns::handle_template_marker_finish(context),

        Expression => expressions::handle_expression(context),
        ExpressionInPostfix => expressions::handle_expression_in_postfix(context),
        ExpressionInPostfixLoop => {
            expressions::handle_expression_in_postfix_loop(context)
        }
        ExpressionLoop => expressions::handle_expression_loop(context),
        ExpressionLoopForBinary => {
            expressions::handle_expression_loop_for_binary(context)
        }
        ExpressionLoopForPrefix => {
            expressions::handle_expression_loop_for_prefix(context)
        }
        IfExpressionFinishCondition => {
            expressions::handle_if_expression_finish_condition(context)
        }
        IfExpressionFinishThen => expressions::handle_if_expression_finish_then(context),
        IfExpressionFinish => expressions::handle_if_expression_finish(context),
        CallExpressionParameterFinish => {
            expressions::handle_call_expression_parameter_finish(context)
        }
        CallExpressionFinish => expressions::handle_call_expression_finish(context),
        IndexExpressionFinish => expressions::handle_index_expression_finish(context),
        ParenExpressionParameterFinishAsUnknown => {
            expressions::handle_paren_expression_parameter_finish_as_unknown(context)
        }
        ParenExpressionParameterFinishAsTuple => {
            expressions::handle_paren_expression_parameter_finish_as_tuple(context)
        }
        ParenExpressionFinish => expressions::handle_paren_expression_finish(context),
        TupleLiteralFinish => expressions::handle_tuple_literal_finish(context),
        StructField => expressions::handle_struct_field(context),
        StructFieldValueFinish => expressions::handle_struct_field_value_finish(context),
        StructFieldTypeFinish => expressions::handle_struct_field_type_finish(context),
        StructLiteralElementFinish => {
            expressions::handle_struct_literal_element_finish(context)
        }
        StructLiteralFinish => expressions::handle_struct_literal_finish(context),
        ArrayExpressionSemi => expressions::handle_array_expression_semi(context),
        ArrayExpressionFinish => expressions::handle_array_expression_finish(context),

        Statement => statements::handle_statement(context),
        StatementScopeLoop => statements::handle_statement_scope_loop(context),
        CodeBlock => statements::handle_code_block(context),
        CodeBlockFinish => statements::handle_code_block_finish(context),
        ExpressionStatementFinish => {
            statements::handle_expression_statement_finish(context)
        }
        ReturnStatementFinish => statements::handle_return_statement_finish(context),
        StatementIf => statements::handle_statement_if(context),
        StatementIfThenBlock => statements::handle_statement_if_then_block(context),
        StatementIfElse => statements::handle_statement_if_else(context),
        StatementIfElseFinish => statements::handle_statement_if_else_finish(context),
        StatementIfFinish => statements::handle_statement_if_finish(context),
        StatementWhile => statements::handle_statement_while(context),
        StatementWhileBlock => statements::handle_statement_while_block(context),
        StatementWhileFinish => statements::handle_statement_while_finish(context),
        StatementMatch => statements::handle_statement_match(context),
        StatementMatchBlock => statements::handle_statement_match_block(context),
        StatementMatchFinish => statements::handle_statement_match_finish(context),
        MatchCaseLoop => statements::handle_match_case_loop(context),
        MatchCase => statements::handle_match_case(context),
        MatchCaseArrow => statements::handle_match_case_arrow(context),
        MatchCaseFinish => statements::handle_match_case_finish(context),
        MatchDefault => statements::handle_match_default(context),
        MatchDefaultFinish => statements::handle_match_default_finish(context),

        ParenConditionAsIf | ParenConditionAsWhile | ParenConditionAsMatch => {
            statements::handle_paren_condition(context, state)
        }
        ParenConditionFinishAsIf
        | ParenConditionFinishAsWhile
        | ParenConditionFinishAsMatch => {
            statements::handle_paren_condition_finish(context, state)
        }
    }
}
