//! Requirement propagation: the tree-shaking core.
//!
//! Starting from the entry module's unresolved globals, decides for every
//! reachable module the minimal set of top-level symbols that must be
//! emitted (`required`) and the names that must keep coming from outside the
//! bundle (`external`). Propagation is strictly consumer to producer: a name
//! never referenced, transitively, from the entry module is never emitted.
//!
//! Both sets grow monotonically and double as the memo that guarantees
//! termination on cyclic module graphs.

use log::{debug, trace};
use rustc_hash::FxHashMap;

use crate::{
    error::BundleError,
    imports::ImportEntry,
    module_graph::{ModuleGraph, ModuleId},
    types::FxIndexSet,
};

/// Per-module requirement record; created lazily, never shrinks.
#[derive(Debug, Default)]
pub struct Requirements {
    /// Top-level symbols whose definition must be emitted.
    pub required: FxIndexSet<String>,
    /// Names this module needs from outside itself: satisfied by an import
    /// of another bundled module, or genuinely external (builtins, packages
    /// that did not resolve locally).
    pub external: FxIndexSet<String>,
}

/// Walks requirements through the module graph, loading imported modules on
/// demand.
#[derive(Debug)]
pub struct TreeShaker<'a> {
    graph: &'a mut ModuleGraph,
    records: FxHashMap<ModuleId, Requirements>,
}

impl<'a> TreeShaker<'a> {
    pub fn new(graph: &'a mut ModuleGraph) -> Self {
        Self {
            graph,
            records: FxHashMap::default(),
        }
    }

    /// Seed propagation with the entry module's unresolved globals and run
    /// it to fixpoint.
    pub fn analyze(&mut self, entry: ModuleId) -> Result<(), BundleError> {
        let seed = self.graph.module(entry).unresolved_globals.clone();
        debug!(
            "tree shaking from {}: seeding {} unresolved globals",
            self.graph.module(entry).name,
            seed.len()
        );
        self.records
            .entry(entry)
            .or_default()
            .external
            .extend(seed.iter().cloned());
        self.gather_from_imports(entry, seed)
    }

    pub fn into_records(self) -> FxHashMap<ModuleId, Requirements> {
        self.records
    }

    /// Mark `names` as needed from `module`: defined names become required
    /// and pull in their intra-module dependency closure; the rest are newly
    /// external and are pushed through the module's imports.
    fn mark_requires(
        &mut self,
        module: ModuleId,
        names: FxIndexSet<String>,
    ) -> Result<(), BundleError> {
        if names.is_empty() {
            return Ok(());
        }
        trace!(
            "inspecting {} for {:?}",
            self.graph.module(module).name,
            names
        );

        let mut new_externals = FxIndexSet::default();
        let mut pending = names;
        while !pending.is_empty() {
            let mut next = FxIndexSet::default();
            let module_data = self.graph.module(module);
            let record = self.records.entry(module).or_default();
            for name in pending {
                if record.required.contains(&name)
                    || record.external.contains(&name)
                    || new_externals.contains(&name)
                {
                    continue;
                }
                if module_data.definitions.contains_key(&name) {
                    if let Some(deps) = module_data.dependencies.get(&name) {
                        next.extend(deps.iter().cloned());
                    }
                    record.required.insert(name);
                } else {
                    new_externals.insert(name);
                }
            }
            pending = next;
        }

        if new_externals.is_empty() {
            return Ok(());
        }
        self.records
            .entry(module)
            .or_default()
            .external
            .extend(new_externals.iter().cloned());
        self.gather_from_imports(module, new_externals)
    }

    /// Resolve pending external names against the module's imports, walked
    /// in reverse declaration order so later imports shadow earlier ones. A
    /// named import whose alias matches resolves to its exported name in the
    /// target module; a wildcard import conservatively forwards every still
    /// pending name, since its export set is not statically enumerable; a
    /// plain module import never satisfies a bare name. Whatever survives
    /// the walk stays external for good.
    fn gather_from_imports(
        &mut self,
        module: ModuleId,
        mut pending: FxIndexSet<String>,
    ) -> Result<(), BundleError> {
        let imports = self.graph.module(module).imports.clone();
        for entry in imports.iter().rev() {
            if pending.is_empty() {
                return Ok(());
            }
            match entry {
                ImportEntry::Module { .. } => {}
                ImportEntry::Star { module: target } => {
                    if let Some(target_id) = self.graph.resolve_import(module, target)? {
                        self.mark_requires(target_id, pending.clone())?;
                    }
                }
                ImportEntry::From {
                    module: target,
                    name,
                    alias,
                } => {
                    if pending.contains(alias)
                        && let Some(target_id) = self.graph.resolve_import(module, target)?
                    {
                        pending.shift_remove(alias);
                        let mut wanted = FxIndexSet::default();
                        wanted.insert(name.clone());
                        self.mark_requires(target_id, wanted)?;
                    }
                }
            }
        }
        Ok(())
    }
}
