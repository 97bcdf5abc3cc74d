//! Tests for the type lattice relations.

use bine_analyzer::{Analysis, Type, analyze};
use bine_ast::Ast;
use bine_ast::nodes::{AnyNode, NodeId};
use bine_parser::parse_file;
use bine_source::{FileId, SourceFile};

const SOURCE: &str = "type Boolean;\n\
type Real;\n\
type Integer < Real;\n\
type String;\n\
class A { }\n\
class B < A { }\n\
class C < B { }\n\
class D { }\n";

fn setup() -> (Ast, Analysis) {
    let file = SourceFile::new(FileId::new(1), "test.bi".to_string(), SOURCE.to_string());
    let mut ast = Ast::new();
    let root = parse_file(&mut ast, &file).expect("parse failed");
    let analysis = analyze(&mut ast, &[root]).expect("analysis failed");
    (ast, analysis)
}

fn named(ast: &Ast, name: &str) -> NodeId {
    for id in ast.ids() {
        match &ast[id].data {
            AnyNode::BasicDecl(node) if node.name == name => return id,
            AnyNode::ClassDecl(node) if node.name == name => return id,
            _ => {}
        }
    }
    panic!("no declaration named {name}");
}

fn class(ast: &Ast, name: &str) -> Type {
    Type::Class { decl: named(ast, name), args: Vec::new() }
}

#[test]
fn definitely_is_reflexive() {
    let (ast, analysis) = setup();
    let real = Type::Basic(named(&ast, "Real"));
    let a = class(&ast, "A");

    let samples = [
        real.clone(),
        a.clone(),
        Type::Optional(Box::new(real.clone())),
        Type::Weak(Box::new(a.clone())),
        Type::Fiber(Box::new(real.clone())),
        Type::Array { element: Box::new(real.clone()), dims: 2 },
        Type::Tuple(vec![real.clone(), a.clone()]),
        Type::Function { params: vec![real.clone()], ret: Box::new(real) },
        Type::Nil,
        Type::Empty,
    ];
    for ty in samples {
        assert!(analysis.registry.definitely(&ty, &ty), "not reflexive: {ty:?}");
    }
}

#[test]
fn basics_follow_their_inheritance_chain() {
    let (ast, analysis) = setup();
    let real = Type::Basic(named(&ast, "Real"));
    let integer = Type::Basic(named(&ast, "Integer"));

    assert!(analysis.registry.definitely(&integer, &real));
    assert!(!analysis.registry.definitely(&real, &integer));
}

#[test]
fn classes_follow_their_transitive_supers() {
    let (ast, analysis) = setup();
    let a = class(&ast, "A");
    let c = class(&ast, "C");
    let d = class(&ast, "D");

    assert!(analysis.registry.definitely(&c, &a));
    assert!(!analysis.registry.definitely(&a, &c));
    assert!(!analysis.registry.definitely(&c, &d));
}

#[test]
fn optionals_absorb_their_value_type_and_nil() {
    let (ast, analysis) = setup();
    let real = Type::Basic(named(&ast, "Real"));
    let optional = Type::Optional(Box::new(real.clone()));

    assert!(analysis.registry.definitely(&real, &optional));
    assert!(analysis.registry.definitely(&Type::Nil, &optional));
    assert!(!analysis.registry.definitely(&optional, &real));
}

#[test]
fn weak_pointers_never_flow_back_to_owning_types() {
    let (ast, analysis) = setup();
    let a = class(&ast, "A");
    let b = class(&ast, "B");
    let weak_a = Type::Weak(Box::new(a.clone()));
    let weak_b = Type::Weak(Box::new(b));

    // Weak wrappers are covariant and accept owning values.
    assert!(analysis.registry.definitely(&weak_b, &weak_a));
    assert!(analysis.registry.definitely(&a, &weak_a));
    assert!(
        analysis
            .registry
            .definitely(&weak_a, &Type::Optional(Box::new(weak_a.clone())))
    );
    // But they never become owning again.
    assert!(!analysis.registry.definitely(&weak_a, &a));
}

#[test]
fn arrays_need_equal_dimension_counts() {
    let (ast, analysis) = setup();
    let real = Type::Basic(named(&ast, "Real"));
    let integer = Type::Basic(named(&ast, "Integer"));

    let vector_i = Type::Array { element: Box::new(integer), dims: 1 };
    let vector_r = Type::Array { element: Box::new(real.clone()), dims: 1 };
    let matrix_r = Type::Array { element: Box::new(real), dims: 2 };

    assert!(analysis.registry.definitely(&vector_i, &vector_r));
    assert!(!analysis.registry.definitely(&vector_r, &matrix_r));
}

#[test]
fn functions_are_contravariant_in_parameters() {
    let (ast, analysis) = setup();
    let real = Type::Basic(named(&ast, "Real"));
    let integer = Type::Basic(named(&ast, "Integer"));

    let takes_real = Type::Function {
        params: vec![real.clone()],
        ret: Box::new(integer.clone()),
    };
    let takes_integer = Type::Function { params: vec![integer], ret: Box::new(real) };

    // A function taking the wider Real serves where one taking Integer
    // is expected; not the other way around.
    assert!(analysis.registry.definitely(&takes_real, &takes_integer));
    assert!(!analysis.registry.definitely(&takes_integer, &takes_real));
}

#[test]
fn common_finds_the_least_shared_super() {
    let (ast, analysis) = setup();
    let real = Type::Basic(named(&ast, "Real"));
    let integer = Type::Basic(named(&ast, "Integer"));
    let b = class(&ast, "B");
    let c = class(&ast, "C");
    let d = class(&ast, "D");

    assert_eq!(analysis.registry.common(&integer, &real), Some(real.clone()));
    assert_eq!(analysis.registry.common(&c, &b), Some(b.clone()));
    assert_eq!(analysis.registry.common(&b, &d), None);
    assert_eq!(
        analysis.registry.common(&Type::Nil, &real),
        Some(Type::Optional(Box::new(real)))
    );
}

#[test]
fn possibly_is_weaker_than_definitely() {
    let (ast, analysis) = setup();
    let real = Type::Basic(named(&ast, "Real"));
    let integer = Type::Basic(named(&ast, "Integer"));
    let a = class(&ast, "A");

    // Overlap holds in both directions where subtyping holds in one.
    assert!(analysis.registry.possibly(&real, &integer));
    assert!(analysis.registry.possibly(&integer, &real));
    assert!(!analysis.registry.possibly(&a, &real));

    // Optionals overlap with their value type.
    let optional = Type::Optional(Box::new(real.clone()));
    assert!(analysis.registry.possibly(&optional, &real));
}
