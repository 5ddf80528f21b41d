//! The closed parse node kind catalogue.
//!
//! Every kind either is *bracketed*, with its subtree bounded by a
//! node of a paired kind (for `*Declaration` kinds the pair is the
//! final `DeclarationEnd`/body child; for expression kinds it is the
//! `*End` leaf at the closing bracket), or has a fixed child count.

macro_rules! define_node_kinds {
    (
        bracketed { $($bk:ident => $pair:ident,)* }
        counted { $($ck:ident = $count:literal,)* }
    ) => {
        /// Every kind of node in a Basalt parse tree.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum NodeKind {
            $($bk,)*
            $($ck,)*
        }

        impl NodeKind {
            /// The enumerator name, used in dumps.
            pub const fn name(self) -> &'static str {
                match self {
                    $(NodeKind::$bk => stringify!($bk),)*
                    $(NodeKind::$ck => stringify!($ck),)*
                }
            }

            /// Whether the kind delimits its subtree with a paired
            /// node kind rather than a fixed child count.
            pub const fn has_bracket(self) -> bool {
                matches!(self, $(NodeKind::$bk)|*)
            }

            /// The paired kind bounding this kind's subtree. Only
            /// meaningful when `has_bracket()`.
            pub const fn bracket(self) -> NodeKind {
                match self {
                    $(NodeKind::$bk => NodeKind::$pair,)*
                    _ => {
                        debug_assert!(false, "kind uses child_count");
                        self
                    }
                }
            }

            /// The fixed number of children. Only meaningful when
            /// `!has_bracket()`.
            pub const fn child_count(self) -> usize {
                match self {
                    $(NodeKind::$ck => $count,)*
                    _ => {
                        debug_assert!(false, "kind uses bracket");
                        0
                    }
                }
            }
        }
    };
}

define_node_kinds! {
    bracketed {
        FunctionDeclaration => DeclarationEnd,
        FunctionDefinition => CodeBlock,
        ParameterList => ParameterListEnd,
        DeducedParameterList => DeducedParameterListEnd,
        CodeBlock => CodeBlockEnd,
        NamespaceDeclaration => DeclarationEnd,
        PackageDeclaration => DeclarationEnd,
        VariableDeclaration => DeclarationEnd,
        LetDeclaration => DeclarationEnd,
        ClassDeclaration => DeclarationEnd,
        InterfaceDeclaration => DeclarationEnd,
        NamedConstraintDeclaration => DeclarationEnd,
        ClassDefinition => ClassBody,
        InterfaceDefinition => InterfaceBody,
        NamedConstraintDefinition => NamedConstraintBody,
        ClassBody => ClassBodyEnd,
        InterfaceBody => InterfaceBodyEnd,
        NamedConstraintBody => NamedConstraintBodyEnd,
        CallExpression => CallExpressionEnd,
        IndexExpression => IndexExpressionEnd,
        ParenExpression => ParenExpressionEnd,
        TupleLiteral => TupleLiteralEnd,
        StructLiteral => StructLiteralEnd,
        ArrayExpression => ArrayExpressionEnd,
        IfCondition => IfConditionEnd,
        WhileCondition => WhileConditionEnd,
        MatchCondition => MatchConditionEnd,
        IfStatement => IfCondition,
        WhileStatement => WhileCondition,
        MatchStatement => MatchCondition,
        MatchBlock => MatchBlockEnd,
        ExpressionStatement => StatementEnd,
        ReturnStatement => StatementEnd,
        BreakStatement => StatementEnd,
        ContinueStatement => StatementEnd,
    }
    counted {
        EmptyDeclaration = 0,
        InvalidParse = 0,
        DeclaredName = 0,
        DeclarationEnd = 0,
        StatementEnd = 0,
        ParameterListEnd = 0,
        ParameterListComma = 0,
        DeducedParameterListEnd = 0,
        DeducedParameterListComma = 0,
        CodeBlockEnd = 0,
        ClassBodyEnd = 0,
        InterfaceBodyEnd = 0,
        NamedConstraintBodyEnd = 0,
        CallExpressionEnd = 0,
        CallExpressionComma = 0,
        IndexExpressionEnd = 0,
        ParenExpressionEnd = 0,
        TupleLiteralEnd = 0,
        TupleLiteralComma = 0,
        StructLiteralEnd = 0,
        StructComma = 0,
        ArrayExpressionEnd = 0,
        ArrayExpressionSemi = 0,
        IfConditionEnd = 0,
        WhileConditionEnd = 0,
        MatchConditionEnd = 0,
        MatchBlockEnd = 0,
        PackageApi = 0,
        PackageImpl = 0,
        Literal = 0,
        NameReference = 0,
        QualifiedName = 2,
        PatternBinding = 2,
        Address = 1,
        TemplateMarker = 1,
        VariableInitializer = 1,
        LetInitializer = 1,
        ReturnType = 1,
        PrefixOperator = 1,
        InfixOperator = 2,
        PostfixOperator = 1,
        MemberAccessExpression = 2,
        PointerMemberAccessExpression = 2,
        StructFieldDesignator = 1,
        StructFieldValue = 2,
        StructFieldType = 2,
        IfExpression = 3,
        IfStatementElse = 1,
        MatchCase = 2,
        MatchDefault = 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracketed_kinds_pair_up() {
        assert!(NodeKind::ParameterList.has_bracket());
        assert_eq!(NodeKind::ParameterList.bracket(), NodeKind::ParameterListEnd);
        assert_eq!(NodeKind::CodeBlock.bracket(), NodeKind::CodeBlockEnd);
        assert_eq!(NodeKind::FunctionDeclaration.bracket(), NodeKind::DeclarationEnd);
        assert_eq!(NodeKind::CallExpression.bracket(), NodeKind::CallExpressionEnd);
    }

    #[test]
    fn counted_kinds_report_children() {
        assert!(!NodeKind::DeclaredName.has_bracket());
        assert_eq!(NodeKind::DeclaredName.child_count(), 0);
        assert_eq!(NodeKind::InfixOperator.child_count(), 2);
        assert_eq!(NodeKind::IfExpression.child_count(), 3);
        assert_eq!(NodeKind::PrefixOperator.child_count(), 1);
    }

    #[test]
    fn names_match_enumerators() {
        assert_eq!(NodeKind::FunctionDeclaration.name(), "FunctionDeclaration");
        assert_eq!(NodeKind::InvalidParse.name(), "InvalidParse");
    }
}
