//! The parser's state inventory.
//!
//! One variant per handler. Handlers pop their own frame from the
//! state stack and push successors; the names describe where in a
//! construct the parse has gotten to when the handler runs.

/// A parser state, dispatched by `grammar::dispatch`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum State {
    // ── File scope ─────────────────────────────────────────────────────
    DeclarationScopeLoop,
    DeclarationName,

    // ── Functions ──────────────────────────────────────────────────────
    FunctionIntroducer,
    FunctionParameterList,
    FunctionSignature,
    FunctionBody,
    FunctionDefinitionFinish,
    ReturnTypeFinish,
    DeducedParameterList,
    DeducedParameterListElementFinish,
    DeducedParameterListFinish,
    ParameterList,
    ParameterListElementFinish,
    ParameterListFinish,

    // ── Namespaces and packages ────────────────────────────────────────
    Namespace,
    NamespaceFinish,
    Package,
    PackageFinish,

    // ── Classes, interfaces, named constraints ─────────────────────────
    TypeIntroducerAsClass,
    TypeIntroducerAsInterface,
    TypeIntroducerAsNamedConstraint,
    TypeAfterNameAsClass,
    TypeAfterNameAsInterface,
    TypeAfterNameAsNamedConstraint,
    TypeBodyFinishAsClass,
    TypeBodyFinishAsInterface,
    TypeBodyFinishAsNamedConstraint,
    TypeDefinitionFinishAsClass,
    TypeDefinitionFinishAsInterface,
    TypeDefinitionFinishAsNamedConstraint,

    // ── Variable and let declarations ──────────────────────────────────
    VariableIntroducer,
    VariableAfterPattern,
    VariableInitializerFinish,
    VariableFinish,
    LetIntroducer,
    LetAfterPattern,
    LetInitializerFinish,
    LetFinish,

    // ── Patterns ───────────────────────────────────────────────────────
    PatternAsParameter,
    PatternAsDeducedParameter,
    PatternAsVariable,
    PatternAsLet,
    PatternBinding,
    PatternBindingFinish,
    AddressFinish,
    TemplateMarkerFinish,

    // ── Expressions ────────────────────────────────────────────────────
    Expression,
    ExpressionInPostfix,
    ExpressionInPostfixLoop,
    ExpressionLoop,
    ExpressionLoopForBinary,
    ExpressionLoopForPrefix,
    IfExpressionFinishCondition,
    IfExpressionFinishThen,
    IfExpressionFinish,
    CallExpressionParameterFinish,
    CallExpressionFinish,
    IndexExpressionFinish,
    ParenExpressionParameterFinishAsUnknown,
    ParenExpressionParameterFinishAsTuple,
    ParenExpressionFinish,
    TupleLiteralFinish,
    StructField,
    StructFieldValueFinish,
    StructFieldTypeFinish,
    StructLiteralElementFinish,
    StructLiteralFinish,
    ArrayExpressionSemi,
    ArrayExpressionFinish,

    // ── Statements ─────────────────────────────────────────────────────
    Statement,
    StatementScopeLoop,
    CodeBlock,
    CodeBlockFinish,
    ExpressionStatementFinish,
    ReturnStatementFinish,
    StatementIf,
    StatementIfThenBlock,
    StatementIfElse,
    StatementIfElseFinish,
    StatementIfFinish,
    StatementWhile,
    StatementWhileBlock,
    StatementWhileFinish,
    StatementMatch,
    StatementMatchBlock,
    StatementMatchFinish,
    MatchCaseLoop,
    MatchCase,
    MatchCaseArrow,
    MatchCaseFinish,
    MatchDefault,
    MatchDefaultFinish,

    // ── Parenthesised conditions ───────────────────────────────────────
    ParenConditionAsIf,
    ParenConditionAsWhile,
    ParenConditionAsMatch,
    ParenConditionFinishAsIf,
    ParenConditionFinishAsWhile,
    ParenConditionFinishAsMatch,
}
