// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Module loading, preloading and the compile context.

mod common;

use std::rc::Rc;

use common::{error, program, type_of, TreeParser};
use tarn_analyze::{
    compile, ClassTable, CodeKind, CompileContext, CompileOptions, CompileRequest, CompiledUnit,
    CompileError, ErrorKind, ModuleRegistry,
};
use tarn_ast::build::*;
use tarn_ast::Node;

fn println(arg: Node) -> Node {
    apply(sym("println"), arg)
}

fn registry(modules: &[(&str, &str)]) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    for (name, signature) in modules {
        registry.register_signature(name, signature).unwrap();
    }
    registry
}

fn compile_in(modules: ModuleRegistry, root: Node) -> Result<CompiledUnit, CompileError> {
    let parser = TreeParser::default().with("main.tarn", root, false);
    let mut ctx = CompileContext::new(Rc::new(parser), Rc::new(ClassTable::new())).with_modules(modules);
    compile(&mut ctx, CompileRequest::new("main.tarn", "main", ""))
}

#[test]
fn std_is_preloaded() {
    let tree = seq(vec![
        bind("xs", apply(apply(sym("map"), lambda(sym("x"), op("+", sym("x"), num(1)))), list(vec![num(1)]))),
        println(apply(sym("length"), sym("xs"))),
    ]);
    let unit = program(tree).unwrap();
    assert_eq!(type_of(&unit, "xs"), "list<number>");
    assert_eq!(unit.preload, ["std"]);
}

#[test]
fn preloaded_std_keeps_builtins() {
    let modules = registry(&[("std", "{not is number -> number, double is number -> number}")]);
    let tree = seq(vec![
        println(apply(sym("not"), sym("true"))),
        println(apply(sym("double"), num(2))),
    ]);
    assert!(compile_in(modules, tree).is_ok());

    let modules = registry(&[("std", "{not is number -> number}")]);
    let err = error(compile_in(modules, println(apply(sym("not"), num(1)))));
    assert_eq!(err.kind, ErrorKind::TypeMismatch);
}

#[test]
fn explicit_load_may_shadow_builtins() {
    let modules = registry(&[("std", "{not is number -> number}")]);
    let tree = seq(vec![load("std"), println(apply(sym("not"), num(1)))]);
    assert!(compile_in(modules, tree).is_ok());
}

#[test]
fn loaded_module_fields() {
    let modules = registry(&[
        ("std", "{abs is number -> number}"),
        ("m", "{inc is number -> number, var counter is number, id is 'a -> 'a}"),
    ]);
    let tree = seq(vec![
        load("m"),
        assign(sym("counter"), apply(sym("inc"), num(1))),
        println(apply(sym("id"), sym("counter"))),
        println(apply(sym("id"), string("s"))),
    ]);
    let unit = compile_in(modules, tree).unwrap();
    let CodeKind::Seq { statements, .. } = &unit.root.kind else {
        panic!("expected a sequence");
    };
    assert_eq!(statements.len(), 3);
}

#[test]
fn non_mutable_module_field() {
    let modules = registry(&[("std", "{abs is number -> number}"), ("m", "{limit is number}")]);
    let tree = seq(vec![load("m"), assign(sym("limit"), num(1)), println(sym("limit"))]);
    let err = error(compile_in(modules, tree));
    assert_eq!(err.message, "Non-mutable expression on the left of the assign operator :=");
}

#[test]
fn module_as_a_value() {
    let modules = registry(&[("std", "{abs is number -> number}"), ("m", "{inc is number -> number}")]);
    let tree = seq(vec![
        bind("f", field(load("m"), "inc")),
        println(apply(sym("f"), num(1))),
    ]);
    let unit = compile_in(modules, tree).unwrap();
    assert_eq!(type_of(&unit, "f"), "number -> number");
}

#[test]
fn only_structs_can_be_exploded() {
    let modules = registry(&[("std", "{abs is number -> number}"), ("u", "number"), ("e", "()")]);
    let tree = seq(vec![load("u"), println(num(1))]);
    let err = error(compile_in(modules, tree));
    assert_eq!(
        err.message,
        "Expected module with struct or unit type here (u has type number, but only structs can be exploded)"
    );

    let modules = registry(&[("std", "{abs is number -> number}"), ("e", "()")]);
    let tree = seq(vec![load("e"), println(num(1))]);
    assert!(compile_in(modules, tree).is_ok());
}

#[test]
fn unknown_module() {
    let err = error(program(seq(vec![load("nope"), println(num(1))])));
    assert_eq!(err.kind, ErrorKind::UnresolvedName);
    assert_eq!(err.message, "Unknown module: nope");
}

#[test]
fn missing_preload_is_reported() {
    let tree = println(num(1));
    let err = error(compile_in(ModuleRegistry::new(), tree));
    assert_eq!(err.message, "Unknown module: std");
}

#[test]
fn no_preload() {
    let parser = TreeParser::default().with("main.tarn", println(num(1)), false);
    let mut ctx = CompileContext::new(Rc::new(parser), Rc::new(ClassTable::new()));
    let options = CompileOptions::default().with_preload(Vec::<String>::new());
    let request = CompileRequest::new("main.tarn", "main", "").with_options(options);
    let unit = compile(&mut ctx, request).unwrap();
    assert!(unit.preload.is_empty());
}

fn library() -> Node {
    struct_(vec![bind("twice", lambda(sym("x"), op("*", sym("x"), num(2))))])
}

#[test]
fn module_sources_compile_on_demand() {
    let main = seq(vec![load("lib"), println(apply(sym("twice"), num(2)))]);
    let parser = TreeParser::default()
        .with("lib.tarn", library(), true)
        .with("main.tarn", main, false);
    let mut ctx = CompileContext::new(Rc::new(parser), Rc::new(ClassTable::new()))
        .with_modules(ModuleRegistry::standard().unwrap());
    ctx.add_module_source("lib", "lib.tarn", "twice x = x * 2");

    let unit = compile(&mut ctx, CompileRequest::new("main.tarn", "main", "load lib; println (twice 2)")).unwrap();
    assert!(!unit.is_module);
    assert!(ctx.has_unit("lib"));
    assert!(ctx.has_unit("main"));
    assert_eq!(ctx.units().collect::<Vec<_>>(), ["lib", "main"]);
    assert!(ctx.modules().contains("lib"));
    assert_eq!(ctx.current_source(), None);
}

#[test]
fn errors_in_loaded_modules_name_their_source() {
    let broken = struct_(vec![bind("a", sym("nowhere"))]);
    let main = seq(vec![load("lib"), println(sym("a"))]);
    let parser = TreeParser::default()
        .with("lib.tarn", broken, true)
        .with("main.tarn", main, false);
    let mut ctx = CompileContext::new(Rc::new(parser), Rc::new(ClassTable::new()))
        .with_modules(ModuleRegistry::standard().unwrap());
    ctx.add_module_source("lib", "lib.tarn", "a = nowhere");

    let err = error(compile(&mut ctx, CompileRequest::new("main.tarn", "main", "")));
    assert_eq!(err.source_name.as_deref(), Some("lib.tarn"));
    assert_eq!(err.message, "Unknown identifier: nowhere");
    assert_eq!(ctx.current_source(), None);
    assert!(!ctx.has_unit("lib"));
}

#[test]
fn compiled_modules_register_their_signature() {
    let parser = TreeParser::default().with("lib.tarn", library(), true);
    let mut ctx = CompileContext::new(Rc::new(parser), Rc::new(ClassTable::new()))
        .with_modules(ModuleRegistry::standard().unwrap());
    let unit = compile(&mut ctx, CompileRequest::new("lib.tarn", "lib", "")).unwrap();
    assert!(unit.is_module);
    assert_eq!(unit.type_description(), "{twice is number -> number}");
    assert_eq!(ctx.modules().get("lib"), Some(&unit.signature()));
}
