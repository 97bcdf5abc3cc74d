//! Tests for expression and statement parsing.

use bine_ast::Ast;
use bine_ast::nodes::{AnyNode, AssignOp, NodeId};
use bine_parser::parse_file;
use bine_source::{FileId, SourceFile};

/// Parses a statement list inside a probe function body.
fn parse_body(body: &str) -> (Ast, Vec<NodeId>) {
    let source = format!("function probe() {{\n{body}\n}}\n");
    let file = SourceFile::new(FileId::new(1), "test.bi".to_string(), source);
    let mut ast = Ast::new();
    let root = parse_file(&mut ast, &file).expect("parse failed");

    let stmts = ast.children(root);
    let AnyNode::FunctionDecl(f) = &ast[stmts[0]].data else { panic!("not a function") };
    let body = f.body.expect("no body");
    let AnyNode::BracesStmt(braces) = &ast[body].data else { panic!("no braces") };
    let stmts = braces.stmts.clone();
    (ast, stmts)
}

/// The expression inside a single expression statement.
fn single_expr(ast: &Ast, stmts: &[NodeId]) -> NodeId {
    assert_eq!(stmts.len(), 1, "expected a single statement");
    let AnyNode::ExpressionStmt(stmt) = &ast[stmts[0]].data else {
        panic!("not an expression statement");
    };
    stmt.expr
}

#[test]
fn parses_the_assignment_family() {
    for (text, op) in [
        ("x <- y;", AssignOp::Assign),
        ("x <~ y;", AssignOp::Simulate),
        ("x ~ y;", AssignOp::Distribute),
        ("x ~> y;", AssignOp::Observe),
    ] {
        let (ast, stmts) = parse_body(text);
        let expr = single_expr(&ast, &stmts);
        let AnyNode::AssignExpr(assign) = &ast[expr].data else { panic!("not an assign") };
        assert_eq!(assign.op, op, "for {text}");
    }
}

#[test]
fn precedence_nests_arithmetic_under_comparison() {
    let (ast, stmts) = parse_body("a < b + c * d;");
    let expr = single_expr(&ast, &stmts);
    let AnyNode::BinaryCallExpr(cmp) = &ast[expr].data else { panic!("not binary") };
    assert_eq!(cmp.name, "<");
    let AnyNode::BinaryCallExpr(add) = &ast[cmp.right].data else { panic!("not binary") };
    assert_eq!(add.name, "+");
    let AnyNode::BinaryCallExpr(mul) = &ast[add.right].data else { panic!("not binary") };
    assert_eq!(mul.name, "*");
}

#[test]
fn postfix_query_and_get_chain() {
    let (ast, stmts) = parse_body("x?;");
    let expr = single_expr(&ast, &stmts);
    assert!(matches!(ast[expr].data, AnyNode::QueryExpr(_)));

    let (ast, stmts) = parse_body("x!.y;");
    let expr = single_expr(&ast, &stmts);
    let AnyNode::MemberExpr(member) = &ast[expr].data else { panic!("not a member") };
    assert!(matches!(ast[member.object].data, AnyNode::GetExpr(_)));
}

#[test]
fn ranges_parse_inside_slices() {
    let (ast, stmts) = parse_body("a[1..n, 2];");
    let expr = single_expr(&ast, &stmts);
    let AnyNode::SliceExpr(slice) = &ast[expr].data else { panic!("not a slice") };
    assert_eq!(slice.indexes.len(), 2);
    assert!(matches!(ast[slice.indexes[0]].data, AnyNode::RangeExpr(_)));
}

#[test]
fn explicit_generic_arguments_need_a_call() {
    // With a following call this is a generic call...
    let (ast, stmts) = parse_body("f<Real>(x);");
    let expr = single_expr(&ast, &stmts);
    let AnyNode::CallExpr(call) = &ast[expr].data else { panic!("not a call") };
    let AnyNode::NamedExpr(callee) = &ast[call.callee].data else { panic!("not named") };
    assert_eq!(callee.type_args.len(), 1);

    // ...without one it is a pair of comparisons.
    let (ast, stmts) = parse_body("f < g > h;");
    let expr = single_expr(&ast, &stmts);
    let AnyNode::BinaryCallExpr(cmp) = &ast[expr].data else { panic!("not binary") };
    assert_eq!(cmp.name, ">");
}

#[test]
fn parses_local_variable_forms() {
    let (ast, stmts) = parse_body("x:Real <- 1.0;\nauto y <- x;\nz:Real[n];\nw:Gaussian(0.0, 1.0);");
    assert_eq!(stmts.len(), 4);

    let AnyNode::ExpressionStmt(stmt) = &ast[stmts[2]].data else { panic!("not expr stmt") };
    let AnyNode::LocalVariableExpr(z) = &ast[stmt.expr].data else { panic!("not a local") };
    assert_eq!(z.brackets.len(), 1);

    let AnyNode::ExpressionStmt(stmt) = &ast[stmts[3]].data else { panic!("not expr stmt") };
    let AnyNode::LocalVariableExpr(w) = &ast[stmt.expr].data else { panic!("not a local") };
    assert_eq!(w.args.len(), 2);
}

#[test]
fn parses_control_flow() {
    let (ast, stmts) = parse_body(
        "if (a) { } else if (b) { } else { }\nwhile (a) { }\ndo { } while (a);\nfor (i:Integer in 1..10) { }\nparallel for (auto i in 1..10) { }",
    );
    assert_eq!(stmts.len(), 5);
    assert!(matches!(ast[stmts[0]].data, AnyNode::IfStmt(_)));
    assert!(matches!(ast[stmts[1]].data, AnyNode::WhileStmt(_)));
    assert!(matches!(ast[stmts[2]].data, AnyNode::DoWhileStmt(_)));
    assert!(matches!(ast[stmts[3]].data, AnyNode::ForStmt(_)));
    let AnyNode::ForStmt(parallel) = &ast[stmts[4]].data else { panic!("not a for") };
    assert!(parallel.annotations.contains(bine_ast::nodes::Annotations::PARALLEL));
}

#[test]
fn parses_lambdas_and_sequences() {
    let (ast, stmts) = parse_body("f <- function (x:Real) -> Real { return x; };\ns <- [1, 2, 3];");
    assert_eq!(stmts.len(), 2);

    let AnyNode::ExpressionStmt(stmt) = &ast[stmts[0]].data else { panic!("not expr stmt") };
    let AnyNode::AssignExpr(assign) = &ast[stmt.expr].data else { panic!("not assign") };
    assert!(matches!(ast[assign.right].data, AnyNode::LambdaExpr(_)));

    let AnyNode::ExpressionStmt(stmt) = &ast[stmts[1]].data else { panic!("not expr stmt") };
    let AnyNode::AssignExpr(assign) = &ast[stmt.expr].data else { panic!("not assign") };
    let AnyNode::SequenceExpr(seq) = &ast[assign.right].data else { panic!("not sequence") };
    assert_eq!(seq.elements.len(), 3);
}

#[test]
fn parses_casts_and_global_access() {
    let (ast, stmts) = parse_body("y <- x @ Derived;\nz <- global::x;");
    assert_eq!(stmts.len(), 2);

    let AnyNode::ExpressionStmt(stmt) = &ast[stmts[0]].data else { panic!("not expr stmt") };
    let AnyNode::AssignExpr(assign) = &ast[stmt.expr].data else { panic!("not assign") };
    assert!(matches!(ast[assign.right].data, AnyNode::CastExpr(_)));

    let AnyNode::ExpressionStmt(stmt) = &ast[stmts[1]].data else { panic!("not expr stmt") };
    let AnyNode::AssignExpr(assign) = &ast[stmt.expr].data else { panic!("not assign") };
    assert!(matches!(ast[assign.right].data, AnyNode::GlobalExpr(_)));
}

#[test]
fn type_expressions_wrap_postfix() {
    let (ast, stmts) = parse_body("x:Real?;\ny:Node&;\nz:Real[_, _];\nf:(Real) -> Real;");
    assert_eq!(stmts.len(), 4);

    let local = |i: usize| {
        let AnyNode::ExpressionStmt(stmt) = &ast[stmts[i]].data else { panic!("not stmt") };
        let AnyNode::LocalVariableExpr(local) = &ast[stmt.expr].data else {
            panic!("not local");
        };
        local.ty.expect("no type")
    };
    assert!(matches!(ast[local(0)].data, AnyNode::OptionalType(_)));
    assert!(matches!(ast[local(1)].data, AnyNode::WeakType(_)));
    let AnyNode::ArrayType(array) = &ast[local(2)].data else { panic!("not array") };
    assert_eq!(array.dims, 2);
    assert!(matches!(ast[local(3)].data, AnyNode::FunctionType(_)));
}
