//! Tests for the resolver pipeline: scope registration, overload
//! selection, the error taxonomy, and the probabilistic rewrites.

use bine_analyzer::{Analysis, CompileError, analyze};
use bine_ast::Ast;
use bine_ast::nodes::{AnyNode, NodeId};
use bine_parser::parse_file;
use bine_source::{FileId, SourceFile};

/// The basic declarations every probe program needs.
const PRELUDE: &str = "type Boolean;\ntype Real;\ntype Integer < Real;\ntype String;\n";

/// Parses and analyzes a single file with the prelude prepended.
fn analyze_source(body: &str) -> Result<(Ast, Analysis), CompileError> {
    let source = format!("{PRELUDE}{body}");
    let file = SourceFile::new(FileId::new(1), "test.bi".to_string(), source);
    let mut ast = Ast::new();
    let root = parse_file(&mut ast, &file).expect("parse failed");
    let analysis = analyze(&mut ast, &[root])?;
    Ok((ast, analysis))
}

fn analyze_err(body: &str) -> CompileError {
    analyze_source(body).map(|_| ()).expect_err("analysis unexpectedly succeeded")
}

/// Finds the call target selected for the only overloaded call in the
/// tree, rendered by its parameter tuple.
fn selected_signature(ast: &Ast, analysis: &Analysis) -> Vec<bine_analyzer::Type> {
    for id in ast.ids() {
        if let AnyNode::OverloadedRef(node) = &ast[id].data
            && let Some(target) = node.target
        {
            return analysis.registry.signatures.get(&target).cloned().unwrap_or_default();
        }
    }
    panic!("no resolved overloaded call in tree");
}

#[test]
fn trivial_function_type_checks() {
    let result = analyze_source("function f() -> Integer { return 1; }\n");
    assert!(result.is_ok(), "trivial function should resolve: {result:?}");
}

#[test]
fn every_expression_gets_a_type() {
    let (ast, analysis) =
        analyze_source("function f(x:Real) -> Real { y:Real <- x; return y; }\n")
            .expect("analysis failed");

    for id in ast.ids() {
        if let AnyNode::VarRef(_) = &ast[id].data {
            assert!(
                !analysis.registry.type_of(id).is_unknown(),
                "unresolved reference type at {id}"
            );
        }
    }
}

#[test]
fn duplicate_class_is_a_previous_declaration_error() {
    let error = analyze_err("class C { }\nclass C { }\n");
    let CompileError::PreviousDeclaration { name, loc, previous } = error else {
        panic!("wrong error: {error}");
    };
    assert_eq!(name, "C");
    assert_ne!(loc.first_line, previous.first_line);
}

#[test]
fn overload_selection_prefers_the_most_specific() {
    let (ast, analysis) = analyze_source(
        "function g(x:Real) -> Real { return x; }\n\
         function g(x:Integer) -> Integer { return x; }\n\
         function probe() -> Integer { return g(1); }\n",
    )
    .expect("analysis failed");

    let signature = selected_signature(&ast, &analysis);
    assert_eq!(signature.len(), 1);
    // The Integer overload wins: Integer is below Real in the
    // specialization order and matches the literal argument.
    let rendered = bine_analyzer::type_to_string(&ast, &signature[0]);
    assert_eq!(rendered, "Integer");
}

#[test]
fn ambiguous_calls_list_both_candidates() {
    let error = analyze_err(
        "function h(x:Integer, y:Real) { }\n\
         function h(x:Real, y:Integer) { }\n\
         function probe() { h(1, 1); }\n",
    );
    let CompileError::AmbiguousCall { candidates, .. } = error else {
        panic!("wrong error: {error}");
    };
    assert_eq!(candidates.len(), 2);
}

#[test]
fn a_call_with_no_match_lists_the_set() {
    let error = analyze_err(
        "class C { }\n\
         function g(x:C) { }\n\
         function probe() { g(1); }\n",
    );
    let CompileError::Call { candidates, .. } = error else {
        panic!("wrong error: {error}");
    };
    assert_eq!(candidates.len(), 1);
}

#[test]
fn unresolved_identifiers_are_reported() {
    let error = analyze_err("function probe() { x <- 1; }\n");
    assert!(matches!(error, CompileError::UnresolvedReference { .. }));
}

#[test]
fn conditions_must_be_boolean() {
    let error = analyze_err("function probe() { if (1) { } }\n");
    assert!(matches!(error, CompileError::Condition { .. }));
}

#[test]
fn returns_are_checked_against_the_declared_type() {
    let error = analyze_err("class C { }\nfunction probe() -> Integer { return C(); }\n");
    assert!(matches!(error, CompileError::ReturnType { .. }));
}

#[test]
fn yield_outside_a_fiber_is_an_error() {
    let error = analyze_err("function probe() { yield 1; }\n");
    assert!(matches!(error, CompileError::Yield { .. }));
}

#[test]
fn yield_types_are_checked() {
    let error = analyze_err("class C { }\nfiber f() -> Integer! { yield C(); }\n");
    assert!(matches!(error, CompileError::YieldType { .. }));
}

#[test]
fn assignment_subtyping_goes_one_way() {
    // Integer flows to Real...
    assert!(
        analyze_source("function probe(x:Integer) { y:Real <- x; }\n").is_ok(),
        "widening assignment should resolve"
    );
    // ...but Real does not flow to Integer.
    let error = analyze_err("function probe(x:Real) { y:Integer <- x; }\n");
    assert!(matches!(error, CompileError::InitialValue { .. }));
}

#[test]
fn assignment_operators_extend_assignability() {
    let result = analyze_source(
        "class Random { operator <- x:Real { } }\n\
         function probe(r:Random) { r2:Random <- r; r2 <- 1.0; }\n",
    );
    assert!(result.is_ok(), "class assignment operator should apply: {result:?}");
}

#[test]
fn nil_flows_only_to_optionals() {
    assert!(analyze_source("function probe() { x:Real? <- nil; }\n").is_ok());
    let error = analyze_err("function probe() { x:Real <- nil; }\n");
    assert!(matches!(error, CompileError::InitialValue { .. }));
}

#[test]
fn query_and_get_require_optionals_or_fibers() {
    assert!(analyze_source(
        "function probe(x:Integer?) -> Integer { if (x?) { return x!; } return 0; }\n"
    )
    .is_ok());

    let error = analyze_err("function probe(x:Integer) { y:Boolean <- x?; }\n");
    assert!(matches!(error, CompileError::Query { .. }));

    let error = analyze_err("function probe(x:Integer) { y:Integer <- x!; }\n");
    assert!(matches!(error, CompileError::Get { .. }));
}

#[test]
fn this_and_super_require_a_class() {
    let error = analyze_err("function probe() { x:Real <- this.y; }\n");
    assert!(matches!(error, CompileError::This { .. }));

    let error = analyze_err(
        "class C { function f() -> Real { return super.x; } }\n",
    );
    assert!(matches!(error, CompileError::SuperBase { .. }));
}

#[test]
fn member_access_requires_a_class_instance() {
    let error = analyze_err("function probe(x:Integer) { y:Real <- x.z; }\n");
    assert!(matches!(error, CompileError::Member { .. }));
}

#[test]
fn final_classes_cannot_be_extended() {
    let error = analyze_err("final class A { }\nclass B < A { }\n");
    let CompileError::FinalBase { class, .. } = error else {
        panic!("wrong error: {error}");
    };
    assert_eq!(class, "A");
}

#[test]
fn abstract_classes_cannot_be_constructed() {
    // An explicit construction is rejected...
    let error = analyze_err("abstract class A { }\nfunction probe() { a:A? <- A(); }\n");
    assert!(matches!(error, CompileError::AbstractConstructor { .. }));

    // ...and so is the implicit default construction of a plain
    // class-typed local.
    let error = analyze_err("abstract class A { }\nfunction probe() { a:A; }\n");
    assert!(matches!(error, CompileError::AbstractConstructor { .. }));

    // A concrete subclass still flows to the abstract static type.
    let result = analyze_source(
        "abstract class A { }\nclass B < A { }\nfunction probe() { a:A <- B(); }\n",
    );
    assert!(result.is_ok(), "subclass construction should resolve: {result:?}");
}

#[test]
fn base_scope_is_inherited() {
    let result = analyze_source(
        "class A { x:Real; }\n\
         class B < A { function f() -> Real { return x; } }\n",
    );
    assert!(result.is_ok(), "member of base should resolve in derived: {result:?}");
}

#[test]
fn conversion_operators_feed_the_subtype_relation() {
    let result = analyze_source(
        "class Random { operator -> Real { return 1.0; } }\n\
         function probe(r:Random) { x:Real <- r; }\n",
    );
    assert!(result.is_ok(), "conversion should permit the flow: {result:?}");
}

#[test]
fn simulate_sugar_rewrites_to_a_simulate_call() {
    let (ast, _analysis) = analyze_source(
        "class Gaussian { function simulate() -> Real { return 0.0; } }\n\
         function probe(d:Gaussian) { x:Real <- 0.0; x <~ d; }\n",
    )
    .expect("analysis failed");

    // Somewhere in the resolved tree there is a member call to
    // `simulate`.
    let mut found = false;
    for id in ast.ids() {
        if let AnyNode::OverloadedRef(node) = &ast[id].data
            && node.name == "simulate"
            && node.target.is_some()
        {
            found = true;
        }
    }
    assert!(found, "x <~ d did not rewrite to d.simulate()");
}

#[test]
fn fiber_calls_in_statement_position_reyield() {
    let (ast, _analysis) = analyze_source(
        "fiber inner() -> Integer! { yield 1; }\n\
         fiber outer() -> Integer! { inner(); }\n",
    )
    .expect("analysis failed");

    // The discarded call re-yields through a while loop: the resolved
    // tree gains a loop whose body holds a yield of a get expression.
    let mut reyielded = false;
    for id in ast.ids() {
        if let AnyNode::WhileStmt(node) = &ast[id].data
            && let AnyNode::BracesStmt(body) = &ast[node.body].data
            && body.stmts.iter().any(|&stmt| {
                matches!(&ast[stmt].data, AnyNode::YieldStmt(y)
                    if matches!(ast[y.value].data, AnyNode::GetExpr(_)))
            })
        {
            reyielded = true;
        }
    }
    assert!(reyielded, "inner() was not rewritten to a re-yield loop");
}

#[test]
fn yield_inside_a_lambda_is_rejected() {
    let error = analyze_err(
        "fiber f() -> Integer! { auto h <- function () { yield 1; }; yield 0; }\n",
    );
    assert!(matches!(error, CompileError::Yield { .. }));
}

#[test]
fn distribute_sugar_rewrites_to_observe_or_assume() {
    let (ast, _analysis) = analyze_source(
        "class Gaussian {\n\
         function observe(x:Real) -> Real { return 0.0; }\n\
         function assume(x:Random) { }\n\
         }\n\
         class Random { operator -> Real? { return nil; } operator <- x:Real { } }\n\
         function probe(x:Random, d:Gaussian) { x ~ d; }\n",
    )
    .expect("analysis failed");

    let mut observe = false;
    let mut assume = false;
    for id in ast.ids() {
        if let AnyNode::OverloadedRef(node) = &ast[id].data
            && node.target.is_some()
        {
            observe |= node.name == "observe";
            assume |= node.name == "assume";
        }
    }
    assert!(observe && assume, "x ~ d did not rewrite to both branches");
}
