//! Module arena and caches.
//!
//! Every discovered source file becomes one [`ModuleSource`] in an arena,
//! addressed by a [`ModuleId`] handle; identity is the file's canonical path,
//! so the same module reached through relative and absolute imports parses
//! once and import cycles terminate. Import resolution per module is
//! memoized alongside.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use ruff_python_ast::{ModModule, Stmt};
use ruff_python_codegen::Stylist;
use ruff_python_parser::{Parsed, parse_module};
use rustc_hash::FxHashMap;

use crate::{
    error::BundleError,
    imports::ImportEntry,
    resolver::ModuleResolver,
    types::FxIndexSet,
    visitors::{Definition, scan_module},
};

/// Arena handle for a module. All cross-module bookkeeping is keyed on this
/// instead of object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(u32);

/// One source file plus the metadata extracted by the symbol scan.
#[derive(Debug)]
pub struct ModuleSource {
    /// Canonical absolute path; the module's identity.
    pub path: PathBuf,
    /// File name, used in provenance comments.
    pub name: String,
    source: String,
    parsed: Parsed<ModModule>,
    /// Import entries in declaration order.
    pub imports: Vec<ImportEntry>,
    /// Top-level symbol definitions; last definition wins.
    pub definitions: FxHashMap<String, Definition>,
    /// Per-symbol references to other names.
    pub dependencies: FxHashMap<String, FxIndexSet<String>>,
    /// Names referenced by bare module-level statements.
    pub module_scope_refs: FxIndexSet<String>,
    /// Names satisfied by no local binding: imports or builtins.
    pub unresolved_globals: FxIndexSet<String>,
}

impl ModuleSource {
    pub fn body(&self) -> &[Stmt] {
        &self.parsed.syntax().body
    }

    /// Code-style probe for re-serializing this module's statements.
    pub fn stylist(&self) -> Stylist<'_> {
        Stylist::from_tokens(self.parsed.tokens(), &self.source)
    }
}

/// The graph of discovered modules: arena + path cache + resolution memo.
#[derive(Debug)]
pub struct ModuleGraph {
    resolver: ModuleResolver,
    modules: Vec<ModuleSource>,
    by_path: FxHashMap<PathBuf, ModuleId>,
    import_memo: FxHashMap<(ModuleId, String), Option<ModuleId>>,
}

impl ModuleGraph {
    pub fn new(resolver: ModuleResolver) -> Self {
        Self {
            resolver,
            modules: Vec::new(),
            by_path: FxHashMap::default(),
            import_memo: FxHashMap::default(),
        }
    }

    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    pub fn module(&self, id: ModuleId) -> &ModuleSource {
        &self.modules[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Load the entry file, registering its directory as the primary search
    /// root. A read failure here is `EntryRead`, the fatal-for-everything
    /// variant.
    pub fn load_entry(&mut self, path: &Path) -> Result<ModuleId, BundleError> {
        self.resolver.set_entry_file(path);
        self.load(path, true)
    }

    fn load(&mut self, path: &Path, is_entry: bool) -> Result<ModuleId, BundleError> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if let Some(id) = self.by_path.get(&canonical) {
            return Ok(*id);
        }

        let source = fs::read_to_string(&canonical).map_err(|error| {
            if is_entry {
                BundleError::EntryRead {
                    path: canonical.clone(),
                    source: error,
                }
            } else {
                BundleError::Read {
                    path: canonical.clone(),
                    source: error,
                }
            }
        })?;
        let parsed = parse_module(&source).map_err(|error| BundleError::Parse {
            path: canonical.clone(),
            source: error,
        })?;

        let scan = scan_module(parsed.syntax(), &source);
        let name = canonical
            .file_name()
            .map_or_else(|| canonical.display().to_string(), |n| n.to_string_lossy().into_owned());
        debug!(
            "loaded {} ({} definitions, {} imports, {} unresolved globals)",
            canonical.display(),
            scan.definitions.len(),
            scan.imports.len(),
            scan.unresolved_globals.len()
        );

        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(ModuleSource {
            path: canonical.clone(),
            name,
            source,
            parsed,
            imports: scan.imports,
            definitions: scan.definitions,
            dependencies: scan.dependencies,
            module_scope_refs: scan.module_scope_refs,
            unresolved_globals: scan.unresolved_globals,
        });
        self.by_path.insert(canonical, id);
        Ok(id)
    }

    /// Resolve an import named from within `from`, loading the target module
    /// on first sight. `Ok(None)` means the import stays external.
    pub fn resolve_import(
        &mut self,
        from: ModuleId,
        module_name: &str,
    ) -> Result<Option<ModuleId>, BundleError> {
        let key = (from, module_name.to_owned());
        if let Some(cached) = self.import_memo.get(&key) {
            return Ok(*cached);
        }

        let from_path = self.module(from).path.clone();
        let resolved = match self.resolver.resolve(&from_path, module_name) {
            Some(path) => Some(self.load(&path, false)?),
            None => None,
        };
        self.import_memo.insert(key, resolved);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::config::Config;

    fn graph() -> ModuleGraph {
        ModuleGraph::new(ModuleResolver::new(&Config::default()))
    }

    #[test]
    fn same_file_loads_once() {
        let dir = TempDir::new().expect("tempdir");
        let entry = dir.path().join("main.py");
        fs::write(&entry, "import util\n").expect("write");
        fs::write(dir.path().join("util.py"), "def helper():\n    pass\n").expect("write");

        let mut graph = graph();
        let entry_id = graph.load_entry(&entry).expect("entry loads");
        let first = graph
            .resolve_import(entry_id, "util")
            .expect("resolution works")
            .expect("util is local");
        let second = graph
            .resolve_import(entry_id, "util")
            .expect("resolution works")
            .expect("util is local");
        assert_eq!(first, second);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn missing_entry_is_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let mut graph = graph();
        let error = graph
            .load_entry(&dir.path().join("nope.py"))
            .expect_err("missing entry should fail");
        assert!(matches!(error, BundleError::EntryRead { .. }));
    }

    #[test]
    fn unparsable_module_is_fatal() {
        let dir = TempDir::new().expect("tempdir");
        let entry = dir.path().join("main.py");
        fs::write(&entry, "import broken\n").expect("write");
        fs::write(dir.path().join("broken.py"), "def (:\n").expect("write");

        let mut graph = graph();
        let entry_id = graph.load_entry(&entry).expect("entry loads");
        let error = graph
            .resolve_import(entry_id, "broken")
            .expect_err("broken module should fail");
        assert!(matches!(error, BundleError::Parse { .. }));
    }

    #[test]
    fn unresolved_imports_are_none_not_errors() {
        let dir = TempDir::new().expect("tempdir");
        let entry = dir.path().join("main.py");
        fs::write(&entry, "import math\n").expect("write");

        let mut graph = graph();
        let entry_id = graph.load_entry(&entry).expect("entry loads");
        assert_eq!(
            graph.resolve_import(entry_id, "math").expect("no error"),
            None
        );
    }
}
