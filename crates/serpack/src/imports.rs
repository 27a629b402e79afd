//! Import statement model.
//!
//! Every Python import statement is decomposed into flat [`ImportEntry`]
//! values, one per bound name, so that the rest of the bundler never pattern
//! matches on raw AST import nodes. Declaration order is preserved within a
//! module; [`ImportGroup`] accumulates entries across modules and merges them
//! into one deduplicated header for the bundle.

use std::fmt::Write;

use ruff_python_ast::{self as ast};

use crate::types::{FxIndexMap, FxIndexSet};

/// One name binding introduced by an import statement.
///
/// The `module` string keeps its relative-level dots: `from ..pkg import x`
/// is stored with `module == "..pkg"`, and `from . import x` with
/// `module == "."`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImportEntry {
    /// `import {module} as {alias}`; plain `import {module}` has
    /// `alias == module`. Binds the module object itself, never a bare name.
    Module { module: String, alias: String },
    /// `from {module} import *` — binds a statically unenumerable set of
    /// names.
    Star { module: String },
    /// `from {module} import {name} as {alias}`; `alias == name` when no
    /// `as` clause is present.
    From {
        module: String,
        name: String,
        alias: String,
    },
}

impl ImportEntry {
    /// The imported module's name as written, dots included.
    pub fn module_name(&self) -> &str {
        match self {
            Self::Module { module, .. } | Self::Star { module } | Self::From { module, .. } => {
                module
            }
        }
    }
}

/// An ordered collection of import entries, with duplicates allowed.
#[derive(Debug, Default)]
pub struct ImportGroup {
    entries: Vec<ImportEntry>,
}

impl ImportGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: ImportEntry) {
        self.entries.push(entry);
    }

    /// Decompose an `import a.b, c as d` statement into entries.
    pub fn add_import(&mut self, stmt: &ast::StmtImport) {
        for alias in &stmt.names {
            let module = alias.name.to_string();
            let local = alias
                .asname
                .as_ref()
                .map_or_else(|| module.clone(), ToString::to_string);
            self.entries.push(ImportEntry::Module {
                module,
                alias: local,
            });
        }
    }

    /// Decompose a `from x import ...` statement into entries, folding the
    /// relative level into leading dots on the module name.
    pub fn add_import_from(&mut self, stmt: &ast::StmtImportFrom) {
        let mut module = ".".repeat(stmt.level as usize);
        if let Some(name) = &stmt.module {
            module.push_str(name.as_str());
        }
        for alias in &stmt.names {
            if alias.name.as_str() == "*" {
                self.entries.push(ImportEntry::Star {
                    module: module.clone(),
                });
            } else {
                let name = alias.name.to_string();
                let local = alias
                    .asname
                    .as_ref()
                    .map_or_else(|| name.clone(), ToString::to_string);
                self.entries.push(ImportEntry::From {
                    module: module.clone(),
                    name,
                    alias: local,
                });
            }
        }
    }

    pub fn extend(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<ImportEntry> {
        self.entries
    }

    /// Render the merged import header.
    ///
    /// Plain imports are deduplicated by `(module, alias)` and combined into
    /// a single statement; star imports are deduplicated by module, one
    /// statement each; named imports are grouped by source module with the
    /// first-seen exported name winning per alias. First-seen order is
    /// preserved throughout.
    pub fn render(&self) -> Vec<String> {
        let mut plain: FxIndexSet<(&str, &str)> = FxIndexSet::default();
        let mut stars: FxIndexSet<&str> = FxIndexSet::default();
        let mut froms: FxIndexMap<&str, FxIndexMap<&str, &str>> = FxIndexMap::default();

        for entry in &self.entries {
            match entry {
                ImportEntry::Module { module, alias } => {
                    plain.insert((module, alias));
                }
                ImportEntry::Star { module } => {
                    stars.insert(module);
                }
                ImportEntry::From {
                    module,
                    name,
                    alias,
                } => {
                    froms
                        .entry(module)
                        .or_default()
                        .entry(alias)
                        .or_insert(name);
                }
            }
        }

        let mut statements = Vec::new();

        if !plain.is_empty() {
            let mut line = String::from("import ");
            for (i, (module, alias)) in plain.iter().enumerate() {
                if i > 0 {
                    line.push_str(", ");
                }
                line.push_str(module);
                if alias != module {
                    let _ = write!(line, " as {alias}");
                }
            }
            statements.push(line);
        }

        for module in &stars {
            statements.push(format!("from {module} import *"));
        }

        for (module, names) in &froms {
            let mut line = format!("from {module} import ");
            for (i, (alias, name)) in names.iter().enumerate() {
                if i > 0 {
                    line.push_str(", ");
                }
                line.push_str(name);
                if alias != name {
                    let _ = write!(line, " as {alias}");
                }
            }
            statements.push(line);
        }

        statements
    }
}

#[cfg(test)]
mod tests {
    use ruff_python_parser::parse_module;

    use super::*;

    fn group_from(source: &str) -> ImportGroup {
        let parsed = parse_module(source).expect("source should parse");
        let mut group = ImportGroup::new();
        for stmt in &parsed.syntax().body {
            match stmt {
                ast::Stmt::Import(import) => group.add_import(import),
                ast::Stmt::ImportFrom(import_from) => group.add_import_from(import_from),
                _ => {}
            }
        }
        group
    }

    #[test]
    fn decomposes_imports_in_order() {
        let group = group_from("import os, sys as system\nfrom pathlib import Path\n");
        let entries: Vec<_> = group.iter().cloned().collect();
        assert_eq!(
            entries,
            vec![
                ImportEntry::Module {
                    module: "os".into(),
                    alias: "os".into()
                },
                ImportEntry::Module {
                    module: "sys".into(),
                    alias: "system".into()
                },
                ImportEntry::From {
                    module: "pathlib".into(),
                    name: "Path".into(),
                    alias: "Path".into()
                },
            ]
        );
    }

    #[test]
    fn relative_level_folds_into_dots() {
        let group = group_from("from ..pkg import helper\nfrom . import sibling\n");
        let entries: Vec<_> = group.iter().cloned().collect();
        assert_eq!(
            entries,
            vec![
                ImportEntry::From {
                    module: "..pkg".into(),
                    name: "helper".into(),
                    alias: "helper".into()
                },
                ImportEntry::From {
                    module: ".".into(),
                    name: "sibling".into(),
                    alias: "sibling".into()
                },
            ]
        );
    }

    #[test]
    fn render_merges_and_dedupes() {
        let mut group = group_from("import math\nimport math\nfrom util import helper\n");
        group.extend(group_from(
            "import math\nfrom util import helper as h\nfrom other import *\n",
        ));
        assert_eq!(
            group.render(),
            vec![
                "import math".to_owned(),
                "from other import *".to_owned(),
                "from util import helper, helper as h".to_owned(),
            ]
        );
    }

    #[test]
    fn render_keeps_first_seen_name_per_alias() {
        let mut group = ImportGroup::new();
        group.push(ImportEntry::From {
            module: "m".into(),
            name: "original".into(),
            alias: "x".into(),
        });
        group.push(ImportEntry::From {
            module: "m".into(),
            name: "shadowed".into(),
            alias: "x".into(),
        });
        assert_eq!(group.render(), vec!["from m import original as x".to_owned()]);
    }

    #[test]
    fn star_imports_dedupe_by_module() {
        let group = group_from("from a import *\nfrom a import *\nfrom b import *\n");
        assert_eq!(
            group.render(),
            vec!["from a import *".to_owned(), "from b import *".to_owned()]
        );
    }
}
