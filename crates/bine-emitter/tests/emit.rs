//! End-to-end emission tests: parse, analyze, emit, and inspect the
//! generated text.

use bine_analyzer::analyze;
use bine_ast::Ast;
use bine_emitter::{Emitted, emit_package};
use bine_parser::parse_file;
use bine_source::{FileId, SourceFile};

const PRELUDE: &str = "type Boolean;\ntype Real;\ntype Integer < Real;\ntype String;\n";

/// Runs the full pipeline over one source file.
fn emit(body: &str) -> Emitted {
    let source = format!("{PRELUDE}{body}");
    let file = SourceFile::new(FileId::new(1), "test.bi".to_string(), source);
    let mut ast = Ast::new();
    let root = parse_file(&mut ast, &file).expect("parse failed");
    let analysis = analyze(&mut ast, &[root]).expect("analysis failed");
    emit_package(&ast, &analysis, "test", &[("test".to_string(), root)])
}

#[test]
fn a_trivial_function_emits_its_mangled_form() {
    let emitted = emit("function f() -> Integer { return 1; }\n");
    let (_, cpp) = &emitted.sources[0];

    assert!(emitted.header.contains("std::int64_t f_();"), "header:\n{}", emitted.header);
    assert!(cpp.contains("std::int64_t bine::f_() {"), "source:\n{cpp}");
    assert!(cpp.contains("return 1;"), "source:\n{cpp}");
}

#[test]
fn emission_is_deterministic() {
    let body = "class A { x:Real; }\nfunction f(a:A) -> Real { return a.x; }\n";
    let first = emit(body);
    let second = emit(body);

    assert_eq!(first.header, second.header);
    assert_eq!(first.interface, second.interface);
    assert_eq!(first.sources, second.sources);
}

#[test]
fn classes_emit_with_base_and_members() {
    let emitted = emit(
        "class A { x:Real; }\n\
         class B < A { function f() -> Real { return x; } }\n",
    );

    assert!(emitted.header.contains("class A_ : public bine::Object {"));
    assert!(emitted.header.contains("class B_ : public A_ {"));
    assert!(emitted.header.contains("double x_;"));

    let (_, cpp) = &emitted.sources[0];
    assert!(cpp.contains("double bine::B_::f_() {"), "source:\n{cpp}");
    assert!(cpp.contains("return this->x_;"), "source:\n{cpp}");
}

#[test]
fn final_classes_emit_with_the_final_specifier() {
    let emitted = emit("final class A { }\nabstract class B { }\n");

    assert!(
        emitted.header.contains("class A_ final : public bine::Object {"),
        "header:\n{}",
        emitted.header
    );
    assert!(
        emitted.header.contains("class B_ : public bine::Object {"),
        "header:\n{}",
        emitted.header
    );

    // The interface carries the annotations for downstream packages.
    assert!(emitted.interface.contains("final class A {"), "{}", emitted.interface);
    assert!(emitted.interface.contains("abstract class B {"), "{}", emitted.interface);
}

#[test]
fn fibers_lower_to_a_labelled_state_machine() {
    let emitted = emit(
        "operator (x:Integer + y:Integer) -> Integer;\n\
         fiber counter() -> Integer! {\n\
         auto i <- 0;\n\
         while (true) { yield i; i <- i + 1; }\n\
         }\n",
    );
    let (_, cpp) = &emitted.sources[0];

    // One yield: labels 0 and 1 in the dispatch switch, finished = 2.
    assert!(cpp.contains("case 0: goto LABEL0_;"), "source:\n{cpp}");
    assert!(cpp.contains("case 1: goto LABEL1_;"), "source:\n{cpp}");
    assert!(!cpp.contains("case 2:"), "source:\n{cpp}");
    assert!(cpp.contains("label_ = 2;"), "source:\n{cpp}");

    // The local is a state member and the yield stores into value_.
    assert!(cpp.contains("std::int64_t i_;"), "source:\n{cpp}");
    assert!(cpp.contains("value_ = i_;"), "source:\n{cpp}");
    assert!(cpp.contains("return true;"), "source:\n{cpp}");

    // The initialisation function allocates the state.
    assert!(cpp.contains("bine::Fiber<std::int64_t> bine::counter_() {"), "source:\n{cpp}");
    assert!(cpp.contains("return bine::make_fiber<"), "source:\n{cpp}");
}

#[test]
fn fiber_locals_with_shared_names_get_unique_members() {
    let emitted = emit(
        "fiber f(flip:Boolean) -> Integer! {\n\
         if (flip) { x:Integer <- 1; yield x; } else { x:Integer <- 2; yield x; }\n\
         }\n",
    );
    let (_, cpp) = &emitted.sources[0];

    // Two differently-scoped locals named x: one keeps the name, the
    // other gains a numeric suffix.
    assert!(cpp.contains("std::int64_t x_;"), "source:\n{cpp}");
    assert!(cpp.contains("std::int64_t x_1_;"), "source:\n{cpp}");
}

#[test]
fn generic_classes_instantiate_exactly_once() {
    let emitted = emit(
        "class Box<T> { x:T; }\n\
         program one() { b:Box<Integer>; }\n\
         program two() { b:Box<Integer>; }\n",
    );

    let definitions = emitted.header.matches("class Box").count();
    // One forward declaration plus one definition.
    assert_eq!(definitions, 2, "header:\n{}", emitted.header);
}

#[test]
fn operators_translate_to_native_forms() {
    let emitted = emit(
        "operator (x:Real + y:Real) -> Real { return x; }\n\
         function probe(a:Real, b:Real) -> Real { return a + b; }\n",
    );
    let (_, cpp) = &emitted.sources[0];

    assert!(emitted.header.contains("double operator+(double x_, double y_);"));
    assert!(cpp.contains("return (a_ + b_);"), "source:\n{cpp}");
}

#[test]
fn the_interface_lists_signatures_in_surface_syntax() {
    let emitted = emit(
        "class A { x:Real; function f(y:Integer) -> Real { return x; } }\n\
         function g(a:A) { }\n",
    );

    assert!(emitted.interface.contains("type Integer < Real;"), "{}", emitted.interface);
    assert!(emitted.interface.contains("class A {"), "{}", emitted.interface);
    assert!(emitted.interface.contains("x:Real;"), "{}", emitted.interface);
    assert!(
        emitted.interface.contains("function f(y:Integer) -> Real;"),
        "{}",
        emitted.interface
    );
    assert!(emitted.interface.contains("function g(a:A);"), "{}", emitted.interface);
}

#[test]
fn member_fibers_capture_the_enclosing_object() {
    let emitted = emit("class A { x:Integer; fiber f() -> Integer! { yield x; } }\n");
    let (_, cpp) = &emitted.sources[0];

    assert!(cpp.contains("bine::SharedPtr<bine::A_> self_;"), "source:\n{cpp}");
    assert!(cpp.contains("value_ = self_->x_;"), "source:\n{cpp}");
    assert!(
        cpp.contains("bine::Fiber<std::int64_t> bine::A_::f_() {"),
        "source:\n{cpp}"
    );
    assert!(cpp.contains("bine::self_(this)"), "source:\n{cpp}");
}

#[test]
fn the_interface_reparses_as_a_bodiless_package() {
    let emitted = emit(
        "class A { x:Real; function f(y:Integer) -> Real { return x; } }\n\
         function g(a:A) { }\n",
    );

    let file = SourceFile::new(
        FileId::new(1),
        "test.bih".to_string(),
        emitted.interface.clone(),
    );
    let mut ast = Ast::new();
    let root = parse_file(&mut ast, &file).expect("interface failed to parse");
    analyze(&mut ast, &[root]).expect("interface failed to analyze");
}

#[test]
fn optionals_and_weak_pointers_wrap_in_the_runtime_types() {
    let emitted = emit(
        "class Node { }\n\
         class Holder { strong:Node; weak:Node&; maybe:Node?; }\n",
    );

    assert!(emitted.header.contains("bine::SharedPtr<bine::Node_> strong_;"));
    assert!(emitted.header.contains("bine::WeakPtr<bine::Node_> weak_;"));
    assert!(
        emitted.header.contains("bine::Optional<bine::SharedPtr<bine::Node_>> maybe_;"),
        "header:\n{}",
        emitted.header
    );
}
