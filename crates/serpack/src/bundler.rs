//! Top-level bundling pipeline: load the entry module, propagate symbol
//! requirements across the import graph, then assemble the output text.

use std::path::Path;

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::{
    config::Config,
    emitter::Assembler,
    error::BundleError,
    module_graph::ModuleGraph,
    resolver::ModuleResolver,
    tree_shaking::TreeShaker,
};

/// Knobs for a single bundling run.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    /// Emit only the definitions transitively required by the entry module.
    pub shake_tree: bool,
    /// Prefix each emitted chunk with a comment naming its origin.
    pub include_source_locations: bool,
    /// Remove docstrings from emitted code.
    pub strip_docstrings: bool,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            shake_tree: true,
            include_source_locations: true,
            strip_docstrings: false,
        }
    }
}

/// Bundles a Python entry module and everything it imports from the source
/// roots into a single self-contained file.
#[derive(Debug)]
pub struct Bundler {
    graph: ModuleGraph,
    options: BundleOptions,
}

impl Bundler {
    pub fn new(config: &Config, options: BundleOptions) -> Self {
        Self {
            graph: ModuleGraph::new(ModuleResolver::new(config)),
            options,
        }
    }

    /// Produce the bundled source text for `entry_path`.
    pub fn pack(&mut self, entry_path: &Path) -> Result<String, BundleError> {
        let entry = self.graph.load_entry(entry_path)?;

        let records = if self.options.shake_tree {
            let mut shaker = TreeShaker::new(&mut self.graph);
            shaker.analyze(entry)?;
            shaker.into_records()
        } else {
            FxHashMap::default()
        };

        for (id, record) in &records {
            let module = self.graph.module(*id);
            debug!(
                "{}: kept {} of {} symbols",
                module.name,
                record.required.len(),
                module.definitions.len()
            );
        }

        let mut assembler = Assembler::new(&mut self.graph, &records, self.options.shake_tree);
        let (mut chunks, group) = assembler.assemble(entry)?;

        if self.options.strip_docstrings {
            for chunk in &mut chunks {
                chunk.strip_docstrings();
            }
            chunks.retain(|chunk| !chunk.is_empty());
        }

        info!(
            "bundled {} module(s) into {} chunk(s)",
            self.graph.len(),
            chunks.len()
        );
        for entry in group.iter() {
            debug!(
                "retained {} import: {}",
                self.graph.resolver().classify(entry.module_name()),
                entry.module_name()
            );
        }

        let mut sections = Vec::new();
        let header = group.render().join("\n");
        if !header.is_empty() {
            sections.push(header);
        }
        for chunk in &chunks {
            sections.push(chunk.render(&self.graph, self.options.include_source_locations));
        }
        let mut output = sections.join("\n\n");
        output.push('\n');
        Ok(output)
    }
}
