//! Tests for declaration parsing.

use bine_ast::Ast;
use bine_ast::nodes::{AnyNode, NodeId};
use bine_parser::parse_file;
use bine_source::{FileId, SourceFile};

/// Helper to parse source text into a fresh arena.
fn parse(source: &str) -> (Ast, NodeId) {
    let file = SourceFile::new(FileId::new(1), "test.bi".to_string(), source.to_string());
    let mut ast = Ast::new();
    let root = parse_file(&mut ast, &file).expect("parse failed");
    (ast, root)
}

fn parse_err(source: &str) -> bine_parser::ParseError {
    let file = SourceFile::new(FileId::new(1), "test.bi".to_string(), source.to_string());
    let mut ast = Ast::new();
    parse_file(&mut ast, &file).expect_err("parse unexpectedly succeeded")
}

#[test]
fn parses_a_basic_type_declaration() {
    let (ast, root) = parse("type Real;\ntype Integer < Real;\n");
    let stmts = ast.children(root);
    assert_eq!(stmts.len(), 2);

    let AnyNode::BasicDecl(first) = &ast[stmts[0]].data else { panic!("not a basic decl") };
    assert_eq!(first.name, "Real");
    assert!(first.base.is_none());

    let AnyNode::BasicDecl(second) = &ast[stmts[1]].data else { panic!("not a basic decl") };
    assert_eq!(second.name, "Integer");
    assert!(second.base.is_some());
}

#[test]
fn parses_a_function_with_return_type() {
    let (ast, root) = parse("type Integer;\nfunction f(x:Integer) -> Integer { return x; }\n");
    let stmts = ast.children(root);

    let AnyNode::FunctionDecl(f) = &ast[stmts[1]].data else { panic!("not a function") };
    assert_eq!(f.name, "f");
    assert_eq!(f.params.len(), 1);
    assert!(f.return_type.is_some());
    assert!(f.body.is_some());
    assert!(!f.member);
}

#[test]
fn parses_a_class_with_base_and_members() {
    let (ast, root) = parse(
        "class A { x:Real; }\nclass B < A(1.0) { function f() -> Real { return this.x; } }\n",
    );
    let stmts = ast.children(root);

    let AnyNode::ClassDecl(a) = &ast[stmts[0]].data else { panic!("not a class") };
    assert_eq!(a.name, "A");
    assert!(a.base.is_none());
    assert_eq!(a.body.len(), 1);

    let AnyNode::ClassDecl(b) = &ast[stmts[1]].data else { panic!("not a class") };
    assert_eq!(b.name, "B");
    assert!(b.base.is_some());
    assert_eq!(b.base_args.len(), 1);
    let AnyNode::FunctionDecl(f) = &ast[b.body[0]].data else { panic!("not a member fn") };
    assert!(f.member);
}

#[test]
fn class_type_parameters_do_not_shadow_base_clauses() {
    let (ast, root) = parse("class Box<T> { x:T; }\nclass D < Box<T> { }\n");
    let stmts = ast.children(root);

    let AnyNode::ClassDecl(boxed) = &ast[stmts[0]].data else { panic!("not a class") };
    assert_eq!(boxed.type_params.len(), 1);
    assert!(boxed.base.is_none());

    let AnyNode::ClassDecl(derived) = &ast[stmts[1]].data else { panic!("not a class") };
    assert!(derived.type_params.is_empty());
    assert!(derived.base.is_some());
}

#[test]
fn parses_class_annotations() {
    let (ast, root) = parse("final class A { }\nabstract class B { }\nclass C { }\n");
    let stmts = ast.children(root);

    let AnyNode::ClassDecl(a) = &ast[stmts[0]].data else { panic!("not a class") };
    assert!(a.annotations.contains(bine_ast::nodes::Annotations::FINAL));

    let AnyNode::ClassDecl(b) = &ast[stmts[1]].data else { panic!("not a class") };
    assert!(b.annotations.contains(bine_ast::nodes::Annotations::ABSTRACT));

    let AnyNode::ClassDecl(c) = &ast[stmts[2]].data else { panic!("not a class") };
    assert!(c.annotations.is_empty());
}

#[test]
fn parses_a_fiber_and_wraps_its_return_type() {
    let (ast, root) = parse("type Integer;\nfiber f() -> Integer! { yield 1; }\n");
    let stmts = ast.children(root);

    let AnyNode::FiberDecl(f) = &ast[stmts[1]].data else { panic!("not a fiber") };
    let AnyNode::FiberType(_) = &ast[f.return_type].data else {
        panic!("fiber return type is not a fiber wrapper");
    };
}

#[test]
fn parses_operator_declarations() {
    let (ast, root) = parse(
        "type Real;\noperator (x:Real + y:Real) -> Real;\noperator (-x:Real) -> Real;\n",
    );
    let stmts = ast.children(root);

    let AnyNode::BinaryOperatorDecl(binary) = &ast[stmts[1]].data else {
        panic!("not a binary operator");
    };
    assert_eq!(binary.name, "+");
    assert!(binary.body.is_none());

    let AnyNode::UnaryOperatorDecl(unary) = &ast[stmts[2]].data else {
        panic!("not a unary operator");
    };
    assert_eq!(unary.name, "-");
}

#[test]
fn parses_conversion_and_assignment_operators() {
    let (ast, root) = parse(
        "type Real;\nclass Random { operator -> Real { return 1.0; }\noperator <- x:Real { } }\n",
    );
    let stmts = ast.children(root);
    let AnyNode::ClassDecl(class) = &ast[stmts[1]].data else { panic!("not a class") };
    assert_eq!(class.body.len(), 2);
    assert!(matches!(ast[class.body[0]].data, AnyNode::ConversionOperatorDecl(_)));
    assert!(matches!(ast[class.body[1]].data, AnyNode::AssignmentOperatorDecl(_)));
}

#[test]
fn attaches_doc_comments_to_declarations() {
    let (ast, root) = parse("/** The model. */\nclass Model { }\n");
    let stmts = ast.children(root);
    assert_eq!(ast.loc(stmts[0]).doc.as_deref(), Some("The model."));
}

#[test]
fn parses_raw_passthrough_blocks() {
    let (ast, root) = parse("hpp{{ #include <vector> }}\ncpp{{ static int x = 0; }}\n");
    let stmts = ast.children(root);
    let AnyNode::RawStmt(hpp) = &ast[stmts[0]].data else { panic!("not raw") };
    assert!(hpp.text.contains("#include <vector>"));
}

#[test]
fn rejects_a_stray_token() {
    let error = parse_err("class C { ? }\n");
    assert!(format!("{error}").contains("expected"));
}
