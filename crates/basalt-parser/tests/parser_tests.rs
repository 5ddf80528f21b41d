use basalt_common::diagnostics::{
    Diagnostic, DiagnosticConsumer, DiagnosticKind, NullDiagnosticConsumer,
};
use basalt_common::source::SourceBuffer;
use basalt_lexer::TokenizedBuffer;
use basalt_parser::{NodeKind, ParseTree};

#[derive(Default)]
struct CollectingConsumer {
    collected: Vec<Diagnostic>,
}

impl DiagnosticConsumer for CollectingConsumer {
    fn handle_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.collected.push(diagnostic);
    }
}

fn parse_ok(text: &str) -> Vec<(NodeKind, String, usize)> {
    let source = SourceBuffer::from_text("test.bas", text.to_string());
    let mut consumer = CollectingConsumer::default();
    let tokens = TokenizedBuffer::lex(&source, &mut consumer);
    let tree = ParseTree::parse(&tokens, &mut consumer);
    assert!(
        consumer.collected.is_empty(),
        "unexpected diagnostics for {text:?}: {:?}",
        consumer.collected
    );
    assert!(!tree.has_errors(), "unexpected errors for {text:?}");
    assert!(tree.verify().is_ok());
    tree.postorder()
        .map(|n| {
            (
                tree.node_kind(n),
                tree.node_text(n).to_string(),
                tree.node_subtree_size(n),
            )
        })
        .collect()
}

fn parse_with_errors(text: &str) -> (bool, Vec<DiagnosticKind>) {
    let source = SourceBuffer::from_text("test.bas", text.to_string());
    let mut consumer = CollectingConsumer::default();
    let tokens = TokenizedBuffer::lex(&source, &mut consumer);
    let tree = ParseTree::parse(&tokens, &mut consumer);
    assert!(tree.verify().is_ok(), "tree must verify even for {text:?}");
    (
        tree.has_errors(),
        consumer.collected.iter().map(|d| d.kind).collect(),
    )
}

#[test]
fn function_declaration_shape() {
    let nodes = parse_ok("fn F();");
    assert_eq!(
        nodes,
        vec![
            (NodeKind::DeclaredName, "F".to_string(), 1),
            (NodeKind::ParameterListEnd, ")".to_string(), 1),
            (NodeKind::ParameterList, "(".to_string(), 2),
            (NodeKind::DeclarationEnd, ";".to_string(), 1),
            (NodeKind::FunctionDeclaration, "fn".to_string(), 5),
        ]
    );
}

#[test]
fn function_with_return_type_parses_cleanly() {
    let nodes = parse_ok("fn A() -> int;");
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::DeclaredName,
            NodeKind::ParameterListEnd,
            NodeKind::ParameterList,
            NodeKind::NameReference,
            NodeKind::ReturnType,
            NodeKind::DeclarationEnd,
            NodeKind::FunctionDeclaration,
        ]
    );
}

#[test]
fn foreign_declaration_introducer_is_an_error() {
    let (has_errors, diagnostics) = parse_with_errors("auto A() -> int;");
    assert!(has_errors);
    assert_eq!(diagnostics, vec![DiagnosticKind::UnrecognizedDeclaration]);

    // The diagnostic points at the `auto` introducer.
    let source = SourceBuffer::from_text("test.bas", "auto A() -> int;");
    let mut consumer = CollectingConsumer::default();
    let tokens = TokenizedBuffer::lex(&source, &mut consumer);
    let _tree = ParseTree::parse(&tokens, &mut consumer);
    let location = &consumer.collected[0].location;
    assert_eq!((location.line_number, location.column_number), (1, 1));
}

#[test]
fn function_definition_with_parameters() {
    let nodes = parse_ok("fn Add(a: i32, b: i32) -> i32 { return a + b; }");
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::DeclaredName,
            NodeKind::DeclaredName,
            NodeKind::Literal,
            NodeKind::PatternBinding,
            NodeKind::ParameterListComma,
            NodeKind::DeclaredName,
            NodeKind::Literal,
            NodeKind::PatternBinding,
            NodeKind::ParameterListEnd,
            NodeKind::ParameterList,
            NodeKind::Literal,
            NodeKind::ReturnType,
            NodeKind::NameReference,
            NodeKind::NameReference,
            NodeKind::InfixOperator,
            NodeKind::StatementEnd,
            NodeKind::ReturnStatement,
            NodeKind::CodeBlockEnd,
            NodeKind::CodeBlock,
            NodeKind::FunctionDefinition,
        ]
    );
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let nodes = parse_ok("var x: i32 = 1 + 2 * 3;");
    let kinds: Vec<(NodeKind, String)> = nodes
        .iter()
        .map(|(k, t, _)| (*k, t.clone()))
        .collect();
    // Post-order: 1, 2, 3, `*`, `+`.
    let operators: Vec<&(NodeKind, String)> = kinds
        .iter()
        .filter(|(k, _)| *k == NodeKind::InfixOperator)
        .collect();
    assert_eq!(operators[0].1, "*");
    assert_eq!(operators[1].1, "+");
}

#[test]
fn chained_assignment_requires_parentheses() {
    let (has_errors, diagnostics) =
        parse_with_errors("fn F() { a = b = c; }");
    assert!(has_errors);
    assert!(diagnostics.contains(&DiagnosticKind::OperatorRequiresParentheses));
}

#[test]
fn mixed_bitwise_operators_require_parentheses() {
    let (has_errors, diagnostics) = parse_with_errors("fn F() { var x: i32 = a & b | c; }");
    assert!(has_errors);
    assert!(diagnostics.contains(&DiagnosticKind::OperatorRequiresParentheses));
}

#[test]
fn call_index_and_member_chains() {
    let nodes = parse_ok("fn F() { g(1, 2).h[3]->k; }");
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert!(kinds.contains(&NodeKind::CallExpression));
    assert!(kinds.contains(&NodeKind::CallExpressionComma));
    assert!(kinds.contains(&NodeKind::MemberAccessExpression));
    assert!(kinds.contains(&NodeKind::IndexExpression));
    assert!(kinds.contains(&NodeKind::PointerMemberAccessExpression));
}

#[test]
fn array_type_with_semi_node() {
    let nodes = parse_ok("var x: [i32; 4] = y;");
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert!(kinds.contains(&NodeKind::ArrayExpression));
    assert!(kinds.contains(&NodeKind::ArrayExpressionSemi));
    assert!(kinds.contains(&NodeKind::ArrayExpressionEnd));
}

#[test]
fn missing_array_semi_is_diagnosed() {
    let (has_errors, diagnostics) = parse_with_errors("var x: [i32 4] = y;");
    assert!(has_errors);
    assert!(diagnostics.contains(&DiagnosticKind::ExpectedArraySemi));
}

#[test]
fn tuples_and_parens_are_distinguished() {
    let nodes = parse_ok("fn F() { var t: T = (1, 2); var p: T = (1); var e: T = (); }");
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert_eq!(
        kinds.iter().filter(|&&k| k == NodeKind::TupleLiteral).count(),
        2,
        "(1, 2) and () are tuples"
    );
    assert_eq!(
        kinds.iter().filter(|&&k| k == NodeKind::ParenExpression).count(),
        1,
        "(1) stays a parenthesised expression"
    );
}

#[test]
fn struct_literals() {
    let nodes = parse_ok("fn F() { var s: auto = {.a = 1, .b = 2}; }");
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert!(kinds.contains(&NodeKind::StructLiteral));
    assert!(kinds.contains(&NodeKind::StructFieldDesignator));
    assert_eq!(
        kinds.iter().filter(|&&k| k == NodeKind::StructFieldValue).count(),
        2
    );
}

#[test]
fn if_else_chains() {
    let nodes = parse_ok("fn F() { if (a) { } else if (b) { } else { } }");
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert_eq!(
        kinds.iter().filter(|&&k| k == NodeKind::IfStatement).count(),
        2
    );
    assert_eq!(
        kinds.iter().filter(|&&k| k == NodeKind::IfStatementElse).count(),
        2
    );
    assert_eq!(
        kinds.iter().filter(|&&k| k == NodeKind::IfCondition).count(),
        2
    );
}

#[test]
fn if_with_missing_condition_recovers() {
    let (has_errors, diagnostics) = parse_with_errors("fn F() { if { } }");
    assert!(has_errors);
    assert!(diagnostics.contains(&DiagnosticKind::ExpectedParenAfter));

    let source = SourceBuffer::from_text("test.bas", "fn F() { if { } }");
    let mut consumer = NullDiagnosticConsumer;
    let tokens = TokenizedBuffer::lex(&source, &mut consumer);
    let tree = ParseTree::parse(&tokens, &mut consumer);
    // The omitted condition becomes an InvalidParse leaf and the `{`
    // still parses as a code block, not a struct literal.
    let kinds: Vec<NodeKind> = tree.postorder().map(|n| tree.node_kind(n)).collect();
    assert!(kinds.contains(&NodeKind::InvalidParse));
    assert!(kinds.contains(&NodeKind::CodeBlock));
    assert!(!kinds.contains(&NodeKind::StructLiteral));
}

#[test]
fn while_and_control_statements() {
    let nodes = parse_ok("fn F() { while (c) { break; continue; } return; }");
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert!(kinds.contains(&NodeKind::WhileStatement));
    assert!(kinds.contains(&NodeKind::WhileCondition));
    assert!(kinds.contains(&NodeKind::BreakStatement));
    assert!(kinds.contains(&NodeKind::ContinueStatement));
    assert!(kinds.contains(&NodeKind::ReturnStatement));
}

#[test]
fn match_statements() {
    let nodes = parse_ok(
        "fn F() { match (x) { case 1 => { } case 2 => { } default => { } } }",
    );
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert!(kinds.contains(&NodeKind::MatchStatement));
    assert!(kinds.contains(&NodeKind::MatchCondition));
    assert_eq!(kinds.iter().filter(|&&k| k == NodeKind::MatchCase).count(), 2);
    assert_eq!(kinds.iter().filter(|&&k| k == NodeKind::MatchDefault).count(), 1);
}

#[test]
fn if_then_else_expression() {
    let nodes = parse_ok("var x: i32 = if c then 1 else 2;");
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert!(kinds.contains(&NodeKind::IfExpression));
}

#[test]
fn namespace_and_package_declarations() {
    let nodes = parse_ok("package Geometry api;\nnamespace A.B;\n");
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert!(kinds.contains(&NodeKind::PackageDeclaration));
    assert!(kinds.contains(&NodeKind::PackageApi));
    assert!(kinds.contains(&NodeKind::NamespaceDeclaration));
    assert!(kinds.contains(&NodeKind::QualifiedName));
}

#[test]
fn class_interface_and_constraint_declarations() {
    let nodes = parse_ok(
        "class Point { var x: i32; var y: i32; }\ninterface Drawable;\nconstraint Ordered;\n",
    );
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert!(kinds.contains(&NodeKind::ClassDefinition));
    assert!(kinds.contains(&NodeKind::ClassBody));
    assert!(kinds.contains(&NodeKind::InterfaceDeclaration));
    assert!(kinds.contains(&NodeKind::NamedConstraintDeclaration));
    assert_eq!(
        kinds.iter().filter(|&&k| k == NodeKind::VariableDeclaration).count(),
        2
    );
}

#[test]
fn deduced_parameters_and_modifiers() {
    let nodes = parse_ok("fn F[template T: type](addr p: T*);");
    let kinds: Vec<NodeKind> = nodes.iter().map(|(k, _, _)| *k).collect();
    assert!(kinds.contains(&NodeKind::DeducedParameterList));
    assert!(kinds.contains(&NodeKind::TemplateMarker));
    assert!(kinds.contains(&NodeKind::Address));
    assert!(kinds.contains(&NodeKind::PostfixOperator));
}

#[test]
fn let_requires_initializer() {
    assert!(parse_ok("let x: i32 = 5;")
        .iter()
        .any(|(k, _, _)| *k == NodeKind::LetDeclaration));

    let (has_errors, diagnostics) = parse_with_errors("let x: i32;");
    assert!(has_errors);
    assert!(diagnostics.contains(&DiagnosticKind::ExpectedLetInitializer));
}

#[test]
fn missing_semi_recovers_to_next_declaration() {
    let (has_errors, diagnostics) = parse_with_errors("fn F() -> i32\nfn G();");
    assert!(has_errors);
    assert!(diagnostics.contains(&DiagnosticKind::ExpectedDeclarationSemiOrDefinition));

    // The second declaration still parses.
    let source = SourceBuffer::from_text("test.bas", "fn F() -> i32\nfn G();");
    let mut consumer = NullDiagnosticConsumer;
    let tokens = TokenizedBuffer::lex(&source, &mut consumer);
    let tree = ParseTree::parse(&tokens, &mut consumer);
    let roots: Vec<NodeKind> = tree.roots().map(|n| tree.node_kind(n)).collect();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[1], NodeKind::FunctionDeclaration);
    assert!(!tree.node_has_error(tree.roots().nth(1).unwrap()));
}

#[test]
fn subtree_sizes_nest_within_parents() {
    let source = SourceBuffer::from_text(
        "test.bas",
        "fn F(a: i32) -> i32 { if (a) { return a; } else { return 0; } }",
    );
    let mut consumer = NullDiagnosticConsumer;
    let tokens = TokenizedBuffer::lex(&source, &mut consumer);
    let tree = ParseTree::parse(&tokens, &mut consumer);
    assert!(!tree.has_errors());

    for n in tree.postorder() {
        let size = tree.node_subtree_size(n);
        assert!(size >= 1);
        for child in tree.children(n) {
            assert!(tree.node_subtree_size(child) <= size - 1);
        }
    }

    // The children of a node cover exactly its subtree below itself.
    for n in tree.postorder() {
        let total: usize = tree.children(n).map(|c| tree.node_subtree_size(c)).sum();
        assert_eq!(total, tree.node_subtree_size(n) - 1);
    }
}

#[test]
fn tree_size_within_expected_reservation() {
    for text in [
        "fn F();",
        "fn Add(a: i32, b: i32) -> i32 { return a + b; }",
        "class Point { var x: i32; }",
        "fn F() { while (c) { g(1, 2); } }",
        "var t: auto = (1, 2);",
    ] {
        let source = SourceBuffer::from_text("test.bas", text.to_string());
        let mut consumer = NullDiagnosticConsumer;
        let tokens = TokenizedBuffer::lex(&source, &mut consumer);
        let tree = ParseTree::parse(&tokens, &mut consumer);
        assert!(!tree.has_errors(), "errors for {text:?}");
        assert!(
            tree.size() <= tokens.expected_parse_tree_size(),
            "{text:?}: {} nodes > {} expected",
            tree.size(),
            tokens.expected_parse_tree_size()
        );
    }
}

#[test]
fn lexer_errors_propagate_to_tree() {
    let source = SourceBuffer::from_text("test.bas", "var x: i32 = $;");
    let mut consumer = NullDiagnosticConsumer;
    let tokens = TokenizedBuffer::lex(&source, &mut consumer);
    assert!(tokens.has_errors());
    let tree = ParseTree::parse(&tokens, &mut consumer);
    assert!(tree.has_errors());
}

#[test]
fn parse_tree_dump_format() {
    let source = SourceBuffer::from_text("test.bas", "fn F();");
    let mut consumer = NullDiagnosticConsumer;
    let tokens = TokenizedBuffer::lex(&source, &mut consumer);
    let tree = ParseTree::parse(&tokens, &mut consumer);

    let mut dump = String::new();
    tree.print(&mut dump).unwrap();
    insta::assert_snapshot!(dump, @r"
[
{node_index: 4, kind: 'FunctionDeclaration', text: 'fn', subtree_size: 5, children: [
  {node_index: 0, kind: 'DeclaredName', text: 'F'},
  {node_index: 2, kind: 'ParameterList', text: '(', subtree_size: 2, children: [
    {node_index: 1, kind: 'ParameterListEnd', text: ')'}]},
  {node_index: 3, kind: 'DeclarationEnd', text: ';'}]},
]
");
}

#[test]
fn error_subtrees_are_annotated_in_dumps() {
    let source = SourceBuffer::from_text("test.bas", "fn F() { if { } }");
    let mut consumer = NullDiagnosticConsumer;
    let tokens = TokenizedBuffer::lex(&source, &mut consumer);
    let tree = ParseTree::parse(&tokens, &mut consumer);

    let mut dump = String::new();
    tree.print(&mut dump).unwrap();
    assert!(dump.contains("has_error: yes"));
}
