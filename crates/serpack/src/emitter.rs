//! Bundle assembly: walks the import graph depth-first and produces ordered
//! code chunks plus the merged import header.
//!
//! Chunks for an imported module are spliced in before the chunk of the
//! module importing it: top-level statements execute in textual order, so a
//! definition must appear before any module-level statement that uses it.
//! A visited set keyed by module id makes import cycles contribute each
//! module exactly once.

use log::debug;
use ruff_python_ast::{
    AtomicNodeIndex, Expr, ExprContext, ExprName, Stmt, StmtAssign, name::Name,
};
use ruff_python_codegen::Generator;
use ruff_text_size::TextRange;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    error::BundleError,
    imports::{ImportEntry, ImportGroup},
    module_graph::{ModuleGraph, ModuleId},
    tree_shaking::Requirements,
    types::FxIndexSet,
    visitors::{Definition, is_string_literal_stmt, strip_docstrings},
};

/// One contiguous unit of output code with known provenance.
#[derive(Debug)]
pub struct CodeChunk {
    module: ModuleId,
    comment: String,
    stmts: Vec<Stmt>,
}

impl CodeChunk {
    /// Drop docstrings from this chunk's statements.
    pub fn strip_docstrings(&mut self) {
        self.stmts.retain(|stmt| !is_string_literal_stmt(stmt));
        for stmt in &mut self.stmts {
            strip_docstrings(stmt);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Serialize the chunk back to source text, optionally prefixed with its
    /// provenance comment.
    pub fn render(&self, graph: &ModuleGraph, with_comment: bool) -> String {
        let module = graph.module(self.module);
        let stylist = module.stylist();
        let code = self
            .stmts
            .iter()
            .map(|stmt| Generator::from(&stylist).stmt(stmt))
            .collect::<Vec<_>>()
            .join("\n");
        if with_comment && !self.comment.is_empty() {
            format!("# {}\n{code}", self.comment)
        } else {
            code
        }
    }
}

/// `alias = name` — the local rebinding left behind when a `from X import
/// name as alias` statement is elided from an inlined module body.
fn alias_binding(alias: &str, name: &str) -> Stmt {
    Stmt::Assign(StmtAssign {
        targets: vec![Expr::Name(ExprName {
            id: Name::new(alias),
            ctx: ExprContext::Store,
            range: TextRange::default(),
            node_index: AtomicNodeIndex::NONE,
        })],
        value: Box::new(Expr::Name(ExprName {
            id: Name::new(name),
            ctx: ExprContext::Load,
            range: TextRange::default(),
            node_index: AtomicNodeIndex::NONE,
        })),
        range: TextRange::default(),
        node_index: AtomicNodeIndex::NONE,
    })
}

/// Recursive bundle walk over the module graph.
#[derive(Debug)]
pub struct Assembler<'a> {
    graph: &'a mut ModuleGraph,
    records: &'a FxHashMap<ModuleId, Requirements>,
    /// When false, every reachable module's full body is emitted.
    shake: bool,
}

impl<'a> Assembler<'a> {
    pub fn new(
        graph: &'a mut ModuleGraph,
        records: &'a FxHashMap<ModuleId, Requirements>,
        shake: bool,
    ) -> Self {
        Self {
            graph,
            records,
            shake,
        }
    }

    pub fn assemble(&mut self, entry: ModuleId) -> Result<(Vec<CodeChunk>, ImportGroup), BundleError> {
        let mut visited = FxHashSet::default();
        self.pack_from(entry, &mut visited)
    }

    fn pack_from(
        &mut self,
        module_id: ModuleId,
        visited: &mut FxHashSet<ModuleId>,
    ) -> Result<(Vec<CodeChunk>, ImportGroup), BundleError> {
        let is_root = visited.is_empty();
        visited.insert(module_id);
        debug!("packing {}", self.graph.module(module_id).name);

        let mut chunks = Vec::new();
        let mut group = ImportGroup::new();

        // With shaking on, only externally-required names justify keeping an
        // import; with shaking off every import survives.
        let externals: Option<FxIndexSet<String>> = self.shake.then(|| {
            self.records
                .get(&module_id)
                .map(|record| record.external.clone())
                .unwrap_or_default()
        });

        let imports = self.graph.module(module_id).imports.clone();
        for entry in &imports {
            match entry {
                ImportEntry::Module { alias, .. } => {
                    let keep = externals
                        .as_ref()
                        .is_none_or(|external| external.contains(alias));
                    if keep {
                        group.push(entry.clone());
                    }
                }
                ImportEntry::Star { module } | ImportEntry::From { module, .. } => {
                    if let Some(target) = self.graph.resolve_import(module_id, module)? {
                        if !visited.contains(&target) {
                            let (sub_chunks, sub_group) = self.pack_from(target, visited)?;
                            chunks.extend(sub_chunks);
                            group.extend(sub_group);
                        }
                    } else {
                        let keep = match (&externals, entry) {
                            (None, _) => true,
                            (Some(external), ImportEntry::From { alias, .. }) => {
                                external.contains(alias)
                            }
                            // A wildcard binds no alias to filter on; keep it
                            // while the module still needs anything external.
                            (Some(external), _) => !external.is_empty(),
                        };
                        if keep {
                            group.push(entry.clone());
                        }
                    }
                }
            }
        }

        let module = self.graph.module(module_id);
        let display = if is_root {
            "main code".to_owned()
        } else {
            module.name.clone()
        };

        if is_root || !self.shake {
            // Full body: import statements were folded into the merged
            // header; an aliased from-import leaves a local rebinding.
            let mut stmts = Vec::new();
            for stmt in module.body() {
                match stmt {
                    Stmt::Import(_) => {}
                    Stmt::ImportFrom(import_from) => {
                        for alias in &import_from.names {
                            if let Some(asname) = &alias.asname {
                                stmts.push(alias_binding(asname.as_str(), alias.name.as_str()));
                            }
                        }
                    }
                    other => stmts.push(other.clone()),
                }
            }
            if !stmts.is_empty() {
                chunks.push(CodeChunk {
                    module: module_id,
                    comment: format!("From {display}"),
                    stmts,
                });
            }
        } else if let Some(record) = self.records.get(&module_id) {
            // Only required definitions, in original declaration order.
            let mut definitions: Vec<(&str, &Definition)> = record
                .required
                .iter()
                .filter_map(|name| {
                    module
                        .definitions
                        .get(name)
                        .map(|definition| (name.as_str(), definition))
                })
                .collect();
            definitions.sort_by_key(|(_, definition)| (definition.line, definition.col));
            for (name, definition) in definitions {
                chunks.push(CodeChunk {
                    module: module_id,
                    comment: format!("{name} | from {display}, line {}", definition.line),
                    stmts: vec![definition.stmt.clone()],
                });
            }
        }

        Ok((chunks, group))
    }
}
