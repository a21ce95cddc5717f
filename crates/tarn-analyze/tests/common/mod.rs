// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Shared fixtures: a parser that hands out prebuilt trees by source name.

#![allow(dead_code)]

use std::collections::HashMap;
use std::rc::Rc;

use tarn_analyze::{
    compile, ClassTable, CompileContext, CompileError, CompileOptions, CompileRequest, CompiledUnit,
    ModuleRegistry, ParsedUnit, SourceParser,
};
use tarn_ast::{Node, Span};

#[derive(Default)]
pub struct TreeParser {
    trees: HashMap<String, ParsedUnit>,
}

impl TreeParser {
    pub fn with(mut self, source_name: &str, root: Node, is_module: bool) -> Self {
        self.trees.insert(
            source_name.to_string(),
            ParsedUnit { root, module_name: None, is_module },
        );
        self
    }
}

impl SourceParser for TreeParser {
    fn parse(&self, source_name: &str, _source: &str, _options: &CompileOptions) -> Result<ParsedUnit, CompileError> {
        self.trees
            .get(source_name)
            .cloned()
            .ok_or_else(|| CompileError::malformed(Span::DUMMY, format!("no tree for {}", source_name)))
    }
}

pub fn context(parser: TreeParser, classes: ClassTable) -> CompileContext {
    CompileContext::new(Rc::new(parser), Rc::new(classes)).with_modules(ModuleRegistry::standard().unwrap())
}

pub fn compile_with(root: Node, options: CompileOptions, classes: ClassTable) -> Result<CompiledUnit, CompileError> {
    let mut ctx = context(TreeParser::default().with("test.tarn", root, false), classes);
    compile(&mut ctx, CompileRequest::new("test.tarn", "test", "").with_options(options))
}

pub fn program(root: Node) -> Result<CompiledUnit, CompileError> {
    compile_with(root, CompileOptions::default(), ClassTable::new())
}

pub fn module(root: Node) -> Result<CompiledUnit, CompileError> {
    compile_with(root, CompileOptions::default().module(), ClassTable::new())
}

/// Message of an expected failure.
pub fn error(result: Result<CompiledUnit, CompileError>) -> CompileError {
    match result {
        Ok(unit) => panic!("expected an error, got type {}", unit.type_description()),
        Err(err) => err,
    }
}

pub fn type_of(unit: &CompiledUnit, binding: &str) -> String {
    let b = unit.find_binding(binding).unwrap_or_else(|| panic!("no binding {}", binding));
    unit.store.describe(b.ty)
}
