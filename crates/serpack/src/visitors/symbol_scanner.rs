//! Scope-aware module scan.
//!
//! One source-order walk over a parsed module collects everything the
//! bundler needs to know about it: its import entries, its top-level
//! definitions, the intra-module dependency edges between top-level symbols,
//! and the set of names referenced but defined nowhere in the file (the
//! "unresolved globals" that must be satisfied by an import or a builtin).
//!
//! Scoping is tracked with an explicit stack of defined-name sets. Only
//! function and class definitions that are direct children of module scope
//! become definitions; everything nested merely binds a name in its
//! enclosing scope. Bindings introduced by match-case patterns are
//! best-effort and may under-report.

use ruff_python_ast::{
    self as ast, Expr, ModModule, Stmt,
    visitor::source_order::{self, SourceOrderVisitor},
};
use ruff_text_size::Ranged;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    imports::{ImportEntry, ImportGroup},
    types::FxIndexSet,
};

/// A top-level definition: an owned copy of the defining statement plus its
/// original source position, used to order and annotate emitted chunks.
#[derive(Debug, Clone)]
pub struct Definition {
    pub stmt: Stmt,
    /// 1-based source line.
    pub line: u32,
    /// 0-based source column.
    pub col: u32,
}

/// Everything a single scan extracts from one module.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Import entries in declaration order, duplicates allowed.
    pub imports: Vec<ImportEntry>,
    /// Top-level symbol name to its defining statement; a redefinition
    /// overwrites the earlier entry, matching sequential execution.
    pub definitions: FxHashMap<String, Definition>,
    /// Top-level symbol to the names its body references.
    pub dependencies: FxHashMap<String, FxIndexSet<String>>,
    /// Names referenced by bare module-level statements.
    pub module_scope_refs: FxIndexSet<String>,
    /// Names that resolve to no local binding in any enclosing scope.
    pub unresolved_globals: FxIndexSet<String>,
}

/// Scan a parsed module.
pub fn scan_module<'a>(module: &'a ModModule, source: &'a str) -> ScanResult {
    let mut scanner = SymbolScanner {
        source,
        scopes: vec![FxHashSet::default()],
        current_top: None,
        imports: ImportGroup::new(),
        result: ScanResult::default(),
    };
    scanner.visit_body(&module.body);
    let SymbolScanner {
        imports,
        mut result,
        ..
    } = scanner;
    result.imports = imports.into_entries();
    result
}

struct SymbolScanner<'a> {
    source: &'a str,
    /// Stack of lexical scopes; index 0 is module scope.
    scopes: Vec<FxHashSet<String>>,
    /// The top-level symbol whose body is currently being scanned, if any.
    current_top: Option<String>,
    imports: ImportGroup,
    result: ScanResult,
}

impl<'a> SymbolScanner<'a> {
    fn at_module_scope(&self) -> bool {
        self.scopes.len() == 1
    }

    fn bind(&mut self, name: &str) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.to_owned());
    }

    /// Record a name read: attribute it to the current top-level symbol (or
    /// the module-level bucket) once the search reaches module scope, and
    /// flag it unresolved when no scope binds it. A read of the symbol
    /// currently being scanned is a recursive self-reference and is skipped
    /// entirely, so a recursive function never depends on itself.
    fn read(&mut self, name: &str) {
        if self.current_top.as_deref() == Some(name) {
            return;
        }

        for index in (0..self.scopes.len()).rev() {
            if index == 0 {
                match &self.current_top {
                    Some(top) => {
                        self.result
                            .dependencies
                            .entry(top.clone())
                            .or_default()
                            .insert(name.to_owned());
                    }
                    None => {
                        self.result.module_scope_refs.insert(name.to_owned());
                    }
                }
            }
            if self.scopes[index].contains(name) {
                return;
            }
        }

        self.result.unresolved_globals.insert(name.to_owned());
    }

    fn bind_parameters(&mut self, parameters: &ast::Parameters) {
        for param in parameters
            .posonlyargs
            .iter()
            .chain(&parameters.args)
            .chain(&parameters.kwonlyargs)
        {
            let name = param.parameter.name.to_string();
            self.bind(&name);
        }
        if let Some(vararg) = &parameters.vararg {
            let name = vararg.name.to_string();
            self.bind(&name);
        }
        if let Some(kwarg) = &parameters.kwarg {
            let name = kwarg.name.to_string();
            self.bind(&name);
        }
    }

    fn visit_parameter_exprs(&mut self, parameters: &'a ast::Parameters) {
        for param in parameters
            .posonlyargs
            .iter()
            .chain(&parameters.args)
            .chain(&parameters.kwonlyargs)
        {
            if let Some(annotation) = &param.parameter.annotation {
                self.visit_expr(annotation);
            }
            if let Some(default) = &param.default {
                self.visit_expr(default);
            }
        }
        if let Some(vararg) = &parameters.vararg
            && let Some(annotation) = &vararg.annotation
        {
            self.visit_expr(annotation);
        }
        if let Some(kwarg) = &parameters.kwarg
            && let Some(annotation) = &kwarg.annotation
        {
            self.visit_expr(annotation);
        }
    }

    fn record_definition(&mut self, name: &str, stmt: Stmt) {
        let (line, col) = line_col(self.source, stmt.range().start().to_usize());
        self.result
            .definitions
            .insert(name.to_owned(), Definition { stmt, line, col });
    }

    fn scan_function_def(&mut self, func: &'a ast::StmtFunctionDef) {
        let name = func.name.to_string();
        self.bind(&name);
        let at_top = self.at_module_scope();
        if at_top {
            self.record_definition(&name, Stmt::FunctionDef(func.clone()));
            self.current_top = Some(name);
        }

        self.scopes.push(FxHashSet::default());
        self.bind_parameters(&func.parameters);
        for decorator in &func.decorator_list {
            self.visit_expr(&decorator.expression);
        }
        self.visit_parameter_exprs(&func.parameters);
        if let Some(returns) = &func.returns {
            self.visit_expr(returns);
        }
        self.visit_body(&func.body);
        self.scopes.pop();

        if at_top {
            self.current_top = None;
        }
    }

    fn scan_class_def(&mut self, class: &'a ast::StmtClassDef) {
        let name = class.name.to_string();
        self.bind(&name);
        let at_top = self.at_module_scope();
        if at_top {
            self.record_definition(&name, Stmt::ClassDef(class.clone()));
            self.current_top = Some(name);
        }

        self.scopes.push(FxHashSet::default());
        for decorator in &class.decorator_list {
            self.visit_expr(&decorator.expression);
        }
        for base in class.bases() {
            self.visit_expr(base);
        }
        for keyword in class.keywords() {
            self.visit_expr(&keyword.value);
        }
        self.visit_body(&class.body);
        self.scopes.pop();

        if at_top {
            self.current_top = None;
        }
    }

    /// Fold an attribute chain (`a.b.c`) down to its root identifier; only
    /// the root can resolve to a local binding or an imported module. A
    /// chain whose base is not a plain name is opaque: the base expression
    /// is walked normally and the chain itself is not tracked.
    fn scan_attribute(&mut self, attribute: &'a ast::ExprAttribute) {
        let mut base = attribute.value.as_ref();
        loop {
            match base {
                Expr::Name(name) => {
                    self.read(name.id.as_str());
                    return;
                }
                Expr::Attribute(inner) => base = inner.value.as_ref(),
                other => {
                    self.visit_expr(other);
                    return;
                }
            }
        }
    }
}

impl<'a> SourceOrderVisitor<'a> for SymbolScanner<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Import(import) => self.imports.add_import(import),
            Stmt::ImportFrom(import_from) => self.imports.add_import_from(import_from),
            Stmt::FunctionDef(func) => self.scan_function_def(func),
            Stmt::ClassDef(class) => self.scan_class_def(class),
            _ => source_order::walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Name(name) => match name.ctx {
                ast::ExprContext::Store => self.bind(name.id.as_str()),
                ast::ExprContext::Load => self.read(name.id.as_str()),
                ast::ExprContext::Del | ast::ExprContext::Invalid => {}
            },
            Expr::Attribute(attribute) => self.scan_attribute(attribute),
            Expr::Lambda(lambda) => {
                self.scopes.push(FxHashSet::default());
                if let Some(parameters) = &lambda.parameters {
                    self.bind_parameters(parameters);
                    self.visit_parameter_exprs(parameters);
                }
                self.visit_expr(&lambda.body);
                self.scopes.pop();
            }
            _ => source_order::walk_expr(self, expr),
        }
    }
}

/// 1-based line and 0-based column of a byte offset.
fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let prefix = &source[..offset.min(source.len())];
    let line = prefix.bytes().filter(|byte| *byte == b'\n').count() as u32 + 1;
    let col = prefix
        .rfind('\n')
        .map_or(offset, |newline| offset - newline - 1) as u32;
    (line, col)
}

#[cfg(test)]
mod tests {
    use ruff_python_parser::parse_module;

    use super::*;

    fn scan(source: &str) -> ScanResult {
        let parsed = parse_module(source).expect("source should parse");
        scan_module(parsed.syntax(), source)
    }

    fn deps(result: &ScanResult, symbol: &str) -> Vec<String> {
        result
            .dependencies
            .get(symbol)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn collects_top_level_definitions() {
        let result = scan(
            r"
def first():
    pass

class Widget:
    def method(self):
        pass

def outer():
    def inner():
        pass
",
        );
        assert!(result.definitions.contains_key("first"));
        assert!(result.definitions.contains_key("Widget"));
        assert!(result.definitions.contains_key("outer"));
        assert!(!result.definitions.contains_key("method"));
        assert!(!result.definitions.contains_key("inner"));
    }

    #[test]
    fn last_definition_wins() {
        let result = scan(
            r"
def f():
    return 1

def f():
    return 2
",
        );
        let definition = &result.definitions["f"];
        assert_eq!(definition.line, 5);
    }

    #[test]
    fn tracks_dependencies_between_top_level_symbols() {
        let result = scan(
            r"
def helper():
    pass

def caller():
    helper()
",
        );
        assert_eq!(deps(&result, "caller"), vec!["helper".to_owned()]);
        // `helper` is defined at module scope, so it is not unresolved.
        assert!(!result.unresolved_globals.contains("helper"));
    }

    #[test]
    fn recursion_is_not_a_self_dependency() {
        let result = scan(
            r"
def fact(n):
    return 1 if n <= 1 else n * fact(n - 1)
",
        );
        assert!(deps(&result, "fact").is_empty());
        assert!(!result.unresolved_globals.contains("fact"));
    }

    #[test]
    fn unresolved_globals_cover_builtins_and_imports() {
        let result = scan(
            r"
def shout(text):
    print(text.upper())

total = len([1, 2])
",
        );
        assert!(result.unresolved_globals.contains("print"));
        assert!(result.unresolved_globals.contains("len"));
        assert_eq!(deps(&result, "shout"), vec!["print".to_owned()]);
        assert!(result.module_scope_refs.contains("len"));
    }

    #[test]
    fn parameters_and_locals_do_not_leak() {
        let result = scan(
            r"
def f(a, b=1, *args, **kwargs):
    c = a + b
    return c + len(args) + len(kwargs)
",
        );
        for name in ["a", "b", "c", "args", "kwargs"] {
            assert!(
                !result.unresolved_globals.contains(name),
                "{name} should be local"
            );
        }
        assert!(result.unresolved_globals.contains("len"));
    }

    #[test]
    fn attribute_chains_fold_to_root() {
        let result = scan(
            r"
def report():
    return config.server.port
",
        );
        assert_eq!(deps(&result, "report"), vec!["config".to_owned()]);
        assert!(result.unresolved_globals.contains("config"));
        assert!(!result.unresolved_globals.contains("server"));
        assert!(!result.unresolved_globals.contains("port"));
    }

    #[test]
    fn lambda_parameters_are_scoped() {
        let result = scan("apply = lambda x: x + offset\n");
        assert!(!result.unresolved_globals.contains("x"));
        assert!(result.unresolved_globals.contains("offset"));
    }

    #[test]
    fn class_bases_are_dependencies() {
        let result = scan(
            r"
class Base:
    pass

class Child(Base):
    pass
",
        );
        assert_eq!(deps(&result, "Child"), vec!["Base".to_owned()]);
    }

    #[test]
    fn imports_collected_in_order_at_any_depth() {
        let result = scan(
            r"
import os

def lazy():
    import json
    return json
",
        );
        assert_eq!(
            result.imports,
            vec![
                ImportEntry::Module {
                    module: "os".into(),
                    alias: "os".into()
                },
                ImportEntry::Module {
                    module: "json".into(),
                    alias: "json".into()
                },
            ]
        );
    }

    #[test]
    fn module_scope_assignment_binds_before_read() {
        let result = scan("x = 1\ny = x + 1\n");
        assert!(!result.unresolved_globals.contains("x"));
        assert!(result.module_scope_refs.contains("x"));
    }

    #[test]
    fn line_col_is_one_based_lines() {
        let source = "a = 1\nb = 2\n";
        assert_eq!(line_col(source, 0), (1, 0));
        assert_eq!(line_col(source, 6), (2, 0));
        assert_eq!(line_col(source, 10), (2, 4));
    }
}
