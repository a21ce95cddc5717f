// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Typing of individual language constructs.

mod common;

use common::{error, module, program, type_of};
use tarn_analyze::{ClosureId, ErrorKind};
use tarn_ast::build::*;
use tarn_ast::Node;

fn println(arg: Node) -> Node {
    apply(sym("println"), arg)
}

/// `name = value; println name`
fn shown(name: &str, value: Node) -> Node {
    seq(vec![bind(name, value), println(sym(name))])
}

#[test]
fn let_bound_function_is_polymorphic() {
    let tree = seq(vec![
        bind("id", lambda(sym("x"), sym("x"))),
        println(apply(sym("id"), num(1))),
        println(apply(sym("id"), string("s"))),
    ]);
    let unit = program(tree).unwrap();
    assert_eq!(type_of(&unit, "id"), "'a -> 'a");
}

#[test]
fn var_bound_function_is_not_generalized() {
    let tree = seq(vec![
        var_bind("f", lambda(sym("x"), sym("x"))),
        println(apply(sym("f"), num(1))),
        println(apply(sym("f"), string("s"))),
    ]);
    let err = error(program(tree));
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
    assert!(err.message.starts_with("Cannot apply string to number -> number"), "{}", err.message);
}

#[test]
fn captured_application_result_stays_monomorphic() {
    // r comes from an application, so every use shares one element type,
    // including uses through a closure that captures it.
    let tree = seq(vec![
        bind("r", apply(sym("id"), list(vec![]))),
        bind("g", placeholder_lambda(sym("r"))),
        println(op("^", apply(sym("head"), apply(sym("g"), unit())), string("!"))),
        println(op("+", apply(sym("head"), sym("r")), num(1))),
    ]);
    let err = error(program(tree));
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
}

#[test]
fn captured_var_stays_monomorphic() {
    let tree = seq(vec![
        var_bind("v", list(vec![])),
        bind("g", placeholder_lambda(sym("v"))),
        println(op("^", apply(sym("head"), apply(sym("g"), unit())), string("!"))),
        assign(sym("v"), list(vec![num(1)])),
    ]);
    let err = error(program(tree));
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
}

#[test]
fn captured_polymorphic_value_is_still_generalized() {
    let tree = seq(vec![
        bind("xs", list(vec![])),
        bind("g", placeholder_lambda(sym("xs"))),
        println(op("^", apply(sym("head"), apply(sym("g"), unit())), string("!"))),
        println(op("+", apply(sym("head"), apply(sym("g"), unit())), num(1))),
    ]);
    let unit = program(tree).unwrap();
    assert_eq!(type_of(&unit, "g"), "'a -> list<'b>");
}

#[test]
fn struct_literal_and_selection() {
    let point = struct_(vec![bind("a", num(1)), bind("b", string("x"))]);
    let tree = seq(vec![bind("p", point), println(field(sym("p"), "a"))]);
    let unit = program(tree).unwrap();
    assert_eq!(type_of(&unit, "p"), "{a is number, b is string}");
}

#[test]
fn selecting_a_missing_field() {
    let point = struct_(vec![bind("a", num(1))]);
    let tree = seq(vec![bind("p", point), println(field(sym("p"), "c"))]);
    let err = error(program(tree));
    assert!(err.message.contains("do not have .c field"), "{}", err.message);
}

#[test]
fn empty_and_malformed_structs() {
    let err = error(program(println(struct_(vec![]))));
    assert_eq!(err.message, "No sense in empty struct");
    let err = error(program(println(struct_(vec![num(1)]))));
    assert!(err.message.starts_with("Unexpected beast in the structure"), "{}", err.message);
}

#[test]
fn mutually_recursive_struct_functions() {
    let n = || sym("n");
    let even = lambda(
        n(),
        cond(vec![(op("==", n(), num(0)), sym("true"))], apply(sym("odd"), op("-", n(), num(1)))),
    );
    let odd = lambda(
        n(),
        cond(vec![(op("==", n(), num(0)), sym("false"))], apply(sym("even"), op("-", n(), num(1)))),
    );
    let unit = module(struct_(vec![bind("even", even), bind("odd", odd)])).unwrap();
    assert_eq!(
        unit.type_description(),
        "{even is number -> boolean, odd is number -> boolean}"
    );
}

#[test]
fn assignment_to_mutable_places() {
    let tree = seq(vec![
        var_bind("n", num(1)),
        assign(sym("n"), num(2)),
        println(sym("n")),
    ]);
    let unit = program(tree).unwrap();
    let n = unit.find_binding("n").unwrap();
    assert!(n.mutable);

    let tree = seq(vec![
        bind("p", struct_(vec![var_bind("a", num(1))])),
        assign(field(sym("p"), "a"), num(2)),
        println(sym("p")),
    ]);
    let unit = program(tree).unwrap();
    assert_eq!(type_of(&unit, "p"), "{var a is number}");
}

#[test]
fn assignment_to_immutable_places() {
    let expected = "Non-mutable expression on the left of the assign operator :=";
    let tree = seq(vec![bind("n", num(1)), assign(sym("n"), num(2)), println(sym("n"))]);
    assert_eq!(error(program(tree)).message, expected);

    let tree = seq(vec![
        bind("p", struct_(vec![bind("a", num(1))])),
        assign(field(sym("p"), "a"), num(2)),
        println(sym("p")),
    ]);
    assert_eq!(error(program(tree)).message, expected);
}

#[test]
fn assignment_type_must_match() {
    let tree = seq(vec![
        var_bind("n", num(1)),
        assign(sym("n"), string("s")),
        println(sym("n")),
    ]);
    assert_eq!(error(program(tree)).kind, ErrorKind::TypeMismatch);
}

#[test]
fn assigning_a_field_of_an_argument_requires_it_mutable() {
    let set = lambda(sym("r"), assign(field(sym("r"), "a"), num(1)));
    let unit = program(shown("set", set)).unwrap();
    assert_eq!(type_of(&unit, "set"), "{var .a is number} -> ()");
}

#[test]
fn conditional_guards_and_branches() {
    let err = error(program(println(cond(vec![(num(1), num(2))], num(3)))));
    assert_eq!(err.message, "if condition must have a boolean type (but here was number)");

    let err = error(program(println(cond(vec![(sym("true"), num(1))], string("s")))));
    assert_eq!(err.message, "This if branch has a string type, while another was a number");

    let unit = program(shown("v", cond(vec![(sym("true"), num(1))], num(2)))).unwrap();
    assert_eq!(type_of(&unit, "v"), "number");
}

#[test]
fn loops() {
    let err = error(program(loop_(sym("true"), Some(num(1)))));
    assert_eq!(err.message, "Loop body must have a unit type, not number");

    let err = error(program(loop_(num(1), None)));
    assert_eq!(err.message, "Loop condition must have a boolean type (but here was number)");

    assert!(program(loop_(sym("false"), Some(println(num(1))))).is_ok());
}

#[test]
fn statements_must_be_unit() {
    let err = error(program(seq(vec![num(1), println(num(2))])));
    assert_eq!(err.message, "Unit type expected here, not a number");
}

#[test]
fn standalone_binding_must_be_a_function() {
    let err = error(program(println(bind("x", num(1)))));
    assert_eq!(err.kind, ErrorKind::MalformedConstruct);
    assert_eq!(err.message, "Closed binding must be a function binding");
}

#[test]
fn standalone_recursive_function() {
    let n = || sym("n");
    let body = cond(vec![(op("==", n(), num(0)), num(0))], apply(sym("f"), op("-", n(), num(1))));
    let tree = println(apply(bind("f", lambda(n(), body)), num(3)));
    let unit = program(tree).unwrap();
    assert_eq!(type_of(&unit, "f"), "number -> number");

    let tree = println(apply(bind("g", lambda(n(), n())), num(3)));
    assert_eq!(error(program(tree)).message, "Unused binding: g");
}

#[test]
fn bad_lambda_argument() {
    let err = error(program(println(lambda(num(1), num(2)))));
    assert!(err.message.starts_with("Bad argument: "), "{}", err.message);
}

#[test]
fn curried_lambda() {
    let add = lambda_n(&["a", "b"], op("+", sym("a"), sym("b")));
    let unit = program(shown("add", add)).unwrap();
    assert_eq!(type_of(&unit, "add"), "number -> number -> number");
}

#[test]
fn annotated_function_binding() {
    let sig = tarn_ast::parse_signature("number -> number").unwrap();
    let tree = seq(vec![
        typed_bind("f", sig, lambda(sym("x"), sym("x"))),
        println(apply(sym("f"), num(1))),
    ]);
    let unit = program(tree).unwrap();
    assert_eq!(type_of(&unit, "f"), "number -> number");

    let sig = tarn_ast::parse_signature("string -> number").unwrap();
    let tree = seq(vec![
        typed_bind("f", sig, lambda(sym("x"), sym("x"))),
        println(apply(sym("f"), string("s"))),
    ]);
    assert_eq!(error(program(tree)).kind, ErrorKind::TypeMismatch);
}

#[test]
fn placeholder_lambda_ignores_its_argument() {
    let unit = program(shown("k", placeholder_lambda(num(1)))).unwrap();
    assert_eq!(type_of(&unit, "k"), "'a -> number");
}

#[test]
fn list_literals() {
    let unit = program(shown("l", list(vec![num(1), num(2)]))).unwrap();
    assert_eq!(type_of(&unit, "l"), "list<number>");

    let unit = program(shown("l", list(vec![]))).unwrap();
    assert_eq!(type_of(&unit, "l"), "list<'a>");

    let err = error(program(println(list(vec![num(1), string("s")]))));
    assert_eq!(err.message, "This list element is string, but others have been number");
}

#[test]
fn hash_literals() {
    let hash = list(vec![pair(string("a"), num(1)), pair(string("b"), num(2))]);
    let unit = program(shown("h", hash)).unwrap();
    assert_eq!(type_of(&unit, "h"), "hash<string, number>");

    let unit = program(shown("h", empty_map())).unwrap();
    assert_eq!(type_of(&unit, "h"), "hash<'a, 'b>");

    let hash = list(vec![pair(string("a"), num(1)), pair(num(2), num(2))]);
    let err = error(program(println(hash)));
    assert_eq!(err.message, "This map element has number key, but others have had string");

    let hash = list(vec![pair(string("a"), num(1)), pair(string("b"), string("c"))]);
    let err = error(program(println(hash)));
    assert_eq!(err.message, "This map element is string, but others have been number");
}

#[test]
fn keyed_access() {
    let hash = || list(vec![pair(string("a"), num(1))]);
    let tree = seq(vec![bind("h", hash()), println(key_ref(sym("h"), vec![string("a")]))]);
    assert!(program(tree).is_ok());

    let tree = seq(vec![bind("h", hash()), println(key_ref(sym("h"), vec![num(1)]))]);
    let err = error(program(tree));
    assert!(err.message.contains("cannot be referenced by number key"), "{}", err.message);

    let err = error(program(println(key_ref(hash(), vec![]))));
    assert_eq!(err.message, ".[] - missing key expression");

    let err = error(program(println(key_ref(hash(), vec![num(1), num(2)]))));
    assert_eq!(err.message, "Unexpected , inside .[]");
}

#[test]
fn keyed_access_is_assignable() {
    let tree = seq(vec![
        bind("h", list(vec![pair(string("a"), num(1))])),
        assign(key_ref(sym("h"), vec![string("a")]), num(5)),
        println(sym("h")),
    ]);
    assert!(program(tree).is_ok());
}

#[test]
fn ranges() {
    let unit = program(shown("r", list(vec![range(num(1), num(5))]))).unwrap();
    assert_eq!(type_of(&unit, "r"), "list<number>");

    let unit = program(shown("r", range(num(1), num(5)))).unwrap();
    assert_eq!(type_of(&unit, "r"), "list<number>");

    let err = error(program(println(list(vec![range(string("a"), num(1))]))));
    assert_eq!(err.message, ".. range expects limit to be number, not a string");
}

#[test]
fn selector_function_builds_open_structs() {
    let tree = seq(vec![
        bind("get", field_section(&["a", "b"])),
        println(apply(
            sym("get"),
            struct_(vec![bind("a", struct_(vec![bind("b", num(1))]))]),
        )),
    ]);
    let unit = program(tree).unwrap();
    assert_eq!(type_of(&unit, "get"), "{.a is {.b is 'a}} -> 'a");
}

#[test]
fn operator_section_fixes_second_argument() {
    let tree = seq(vec![
        bind("dec", section("-", num(1))),
        println(apply(sym("dec"), num(5))),
    ]);
    let unit = program(tree).unwrap();
    assert_eq!(type_of(&unit, "dec"), "number -> number");
}

#[test]
fn unary_minus() {
    let unit = program(shown("n", neg(num(3)))).unwrap();
    assert_eq!(type_of(&unit, "n"), "number");
    let err = error(program(println(neg(string("s")))));
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
}

#[test]
fn string_concatenation() {
    let unit = program(shown("s", concat(vec![string("n = "), num(1)]))).unwrap();
    assert_eq!(type_of(&unit, "s"), "string");
}

#[test]
fn case_over_variants() {
    let tree = case(
        apply(sym("Some"), num(1)),
        vec![
            choice("Some", sym("x"), sym("x")),
            choice("None", unit(), num(0)),
        ],
    );
    let unit = program(shown("v", tree)).unwrap();
    assert_eq!(type_of(&unit, "v"), "number");
    assert_eq!(type_of(&unit, "x"), "number");
}

#[test]
fn case_function_accepts_closed_variant() {
    let fun = lambda(
        sym("o"),
        case(
            sym("o"),
            vec![
                choice("Some", sym("x"), sym("x")),
                choice("None", unit(), num(0)),
            ],
        ),
    );
    let unit = program(shown("get", fun)).unwrap();
    assert_eq!(type_of(&unit, "get"), "(Some number | None ()) -> number");
}

#[test]
fn malformed_case() {
    let err = error(program(println(case(num(1), vec![]))));
    assert_eq!(err.message, "case expects some option!");
    let err = error(program(println(case(num(1), vec![num(2)]))));
    assert!(err.message.starts_with("Expecting option, not a "), "{}", err.message);
}

#[test]
fn misplaced_constructs() {
    let err = error(program(println(pair(num(1), num(2)))));
    assert!(err.message.starts_with("I think that this "), "{}", err.message);
    assert!(err.message.ends_with(" should not be here."), "{}", err.message);
}

#[test]
fn closures_record_captures() {
    let tree = seq(vec![
        bind("k", num(1)),
        bind("f", lambda(sym("x"), op("+", sym("x"), sym("k")))),
        println(apply(sym("f"), num(2))),
    ]);
    let unit = program(tree).unwrap();
    let f = unit
        .closures
        .iter()
        .find(|c| c.bind_name.as_deref() == Some("f"))
        .unwrap();
    let captured: Vec<&str> = f.captures.iter().map(|id| unit.binding(*id).name.as_str()).collect();
    assert_eq!(captured, ["k"]);
    assert!(f.body.as_ref().unwrap().tail);
    assert!(unit.closure(ClosureId::ROOT).captures.is_empty());
}

#[test]
fn mutable_bindings_are_registered_with_their_closure() {
    let tree = seq(vec![
        var_bind("v", num(1)),
        assign(sym("v"), num(2)),
        println(sym("v")),
    ]);
    let unit = program(tree).unwrap();
    let vars: Vec<&str> = unit
        .closure(ClosureId::ROOT)
        .vars
        .iter()
        .map(|id| unit.binding(*id).name.as_str())
        .collect();
    assert_eq!(vars, ["v"]);
}
