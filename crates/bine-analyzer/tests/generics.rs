//! Tests for generic instantiation.

use bine_analyzer::{Analysis, analyze};
use bine_ast::Ast;
use bine_ast::nodes::AnyNode;
use bine_parser::parse_file;
use bine_source::{FileId, SourceFile};

const PRELUDE: &str = "type Boolean;\ntype Real;\ntype Integer < Real;\ntype String;\n";

fn analyze_source(body: &str) -> (Ast, Analysis) {
    let source = format!("{PRELUDE}{body}");
    let file = SourceFile::new(FileId::new(1), "test.bi".to_string(), source);
    let mut ast = Ast::new();
    let root = parse_file(&mut ast, &file).expect("parse failed");
    let analysis = analyze(&mut ast, &[root]).expect("analysis failed");
    (ast, analysis)
}

/// The instantiation count of the named generic class.
fn class_instantiations(ast: &Ast, name: &str) -> usize {
    for id in ast.ids() {
        if let AnyNode::ClassDecl(node) = &ast[id].data
            && node.name == name
            && node.instantiation_of.is_none()
        {
            return node.instantiations.len();
        }
    }
    panic!("no class named {name}");
}

#[test]
fn one_instantiation_per_argument_tuple() {
    let (ast, _) = analyze_source(
        "class Box<T> { x:T; }\n\
         program one() { b:Box<Integer>; }\n\
         program two() { b:Box<Integer>; }\n",
    );
    assert_eq!(class_instantiations(&ast, "Box"), 1);
}

#[test]
fn distinct_argument_tuples_get_distinct_instantiations() {
    let (ast, _) = analyze_source(
        "class Box<T> { x:T; }\n\
         program one() { b:Box<Integer>; c:Box<Real>; }\n",
    );
    assert_eq!(class_instantiations(&ast, "Box"), 2);
}

#[test]
fn instantiated_members_come_out_concrete() {
    let (ast, analysis) = analyze_source(
        "class Box<T> { x:T; }\n\
         program one() { b:Box<Integer>; }\n",
    );

    // Find the instantiation and its member's resolved type.
    for id in ast.ids() {
        if let AnyNode::ClassDecl(node) = &ast[id].data
            && node.instantiation_of.is_some()
        {
            let member = node.body[0];
            let ty = analysis.registry.var_types.get(&member).expect("no member type");
            let ty = analysis.registry.substitute(ty);
            assert_eq!(bine_analyzer::type_to_string(&ast, &ty), "Integer");
            return;
        }
    }
    panic!("no instantiation found");
}

#[test]
fn generic_functions_infer_their_arguments_from_the_call() {
    let (ast, analysis) = analyze_source(
        "function id<T>(x:T) -> T { return x; }\n\
         function probe() -> Integer { return id(2); }\n",
    );

    // The call retargeted to an instantiation whose signature is
    // concrete.
    let mut found = false;
    for id in ast.ids() {
        if let AnyNode::OverloadedRef(node) = &ast[id].data
            && node.name == "id"
            && let Some(target) = node.target
        {
            let sig = analysis.registry.signatures.get(&target).expect("no signature");
            let rendered = bine_analyzer::type_to_string(
                &ast,
                &analysis.registry.substitute(&sig[0]),
            );
            assert_eq!(rendered, "Integer");
            found = true;
        }
    }
    assert!(found, "call to id did not resolve");
}

#[test]
fn generic_functions_accept_explicit_arguments() {
    let (ast, _) = analyze_source(
        "function id<T>(x:T) -> T { return x; }\n\
         function probe() -> Real { return id<Real>(2); }\n",
    );

    for id in ast.ids() {
        if let AnyNode::FunctionDecl(node) = &ast[id].data
            && node.name == "id"
            && node.instantiation_of.is_none()
        {
            assert_eq!(node.instantiations.len(), 1);
            return;
        }
    }
    panic!("no generic function found");
}

#[test]
fn nested_generic_arguments_instantiate_recursively() {
    let (ast, _) = analyze_source(
        "class Box<T> { x:T; }\n\
         program one() { b:Box<Box<Integer>>; }\n",
    );
    // Box<Integer> and Box<Box<Integer>>.
    assert_eq!(class_instantiations(&ast, "Box"), 2);
}

#[test]
fn explicit_instantiation_directives_materialize_the_type() {
    let (ast, _) = analyze_source("class Box<T> { x:T; }\ninstantiated Box<Real>;\n");
    assert_eq!(class_instantiations(&ast, "Box"), 1);
}
