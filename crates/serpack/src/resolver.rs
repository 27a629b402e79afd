//! Module resolver: maps an import name to the source file it refers to.
//!
//! Mirrors Python's hierarchical import search over an explicit, ordered set
//! of roots: the importing file's own directory first, then the entry file's
//! directory, then the configured `src` roots. A lookup that fails is not an
//! error; it means the import is external and must be preserved verbatim in
//! the bundle.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use ruff_python_stdlib::sys;

use crate::config::Config;

/// Classification of an import that stays external, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    StandardLibrary,
    ThirdParty,
}

impl std::fmt::Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StandardLibrary => write!(f, "stdlib"),
            Self::ThirdParty => write!(f, "third-party"),
        }
    }
}

/// Split a possibly-relative module name into its level (count of leading
/// dots) and the remaining dotted path.
pub fn split_module_name(module: &str) -> (usize, &str) {
    let level = module.chars().take_while(|c| *c == '.').count();
    (level, &module[level..])
}

#[derive(Debug)]
pub struct ModuleResolver {
    /// Ordered search roots for absolute imports, after the importing
    /// module's own directory.
    search_roots: Vec<PathBuf>,
    /// Python minor version for stdlib classification.
    python_minor: u8,
}

impl ModuleResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            search_roots: config.src.iter().map(|dir| canonicalize(dir)).collect(),
            python_minor: config.python_minor,
        }
    }

    /// Put the entry file's directory at the front of the search roots.
    pub fn set_entry_file(&mut self, entry_path: &Path) {
        if let Some(parent) = entry_path.parent() {
            let dir = canonicalize(parent);
            debug!("entry directory added to search roots: {}", dir.display());
            self.search_roots.insert(0, dir);
        }
    }

    /// Resolve `module` as imported from `importing_file`.
    ///
    /// Returns `None` when the import does not point at a local source file;
    /// the caller treats it as an external dependency and never inlines it.
    pub fn resolve(&self, importing_file: &Path, module: &str) -> Option<PathBuf> {
        let (level, dotted) = split_module_name(module);
        if level == 0 {
            self.resolve_absolute(importing_file, dotted)
        } else {
            resolve_relative(importing_file, level, dotted)
        }
    }

    fn resolve_absolute(&self, importing_file: &Path, dotted: &str) -> Option<PathBuf> {
        let from_dir = importing_file.parent()?;

        if let Some(found) = self.find_in_roots(from_dir, dotted) {
            return Some(found);
        }

        // Fallback heuristic: an absolute-looking import whose full path
        // does not resolve, but whose first segment does, is reinterpreted
        // as a one-level relative import rooted at that segment. An
        // approximation, not a guaranteed-correct resolution rule.
        let (root, rest) = dotted.split_once('.')?;
        let root_path = self.find_in_roots(from_dir, root)?;
        debug!("resolving '{dotted}' as '.{rest}' relative to {}", root_path.display());
        resolve_relative(&root_path, 1, rest)
    }

    fn find_in_roots(&self, from_dir: &Path, dotted: &str) -> Option<PathBuf> {
        std::iter::once(from_dir)
            .chain(self.search_roots.iter().map(PathBuf::as_path))
            .find_map(|root| resolve_in_dir(root, dotted))
    }

    /// Classify an external import for diagnostics.
    pub fn classify(&self, module: &str) -> ImportKind {
        let top_level = module.split('.').next().unwrap_or(module);
        if sys::is_known_standard_library(self.python_minor, top_level) {
            ImportKind::StandardLibrary
        } else {
            ImportKind::ThirdParty
        }
    }
}

/// Climb `level` directories from the importing file, then resolve the
/// remaining dotted path under that directory. An empty remainder resolves
/// to the directory's package-init file.
fn resolve_relative(importing_file: &Path, level: usize, dotted: &str) -> Option<PathBuf> {
    let mut dir = importing_file;
    for _ in 0..level {
        dir = dir.parent()?;
    }

    if dotted.is_empty() {
        let init = dir.join("__init__.py");
        return init.is_file().then(|| canonicalize(&init));
    }

    resolve_in_dir(dir, dotted)
}

/// Resolve a dotted path under one directory: each intermediate segment is a
/// subdirectory; the final segment matches either `name.py` or
/// `name/__init__.py`, in that order.
fn resolve_in_dir(root: &Path, dotted: &str) -> Option<PathBuf> {
    let segments: Vec<&str> = dotted.split('.').collect();
    let mut dir = root.to_path_buf();
    for segment in &segments[..segments.len() - 1] {
        dir.push(segment);
    }
    let last = segments[segments.len() - 1];

    let module_file = dir.join(format!("{last}.py"));
    if module_file.is_file() {
        debug!("resolved '{dotted}' to {}", module_file.display());
        return Some(canonicalize(&module_file));
    }

    let package_init = dir.join(last).join("__init__.py");
    if package_init.is_file() {
        debug!("resolved '{dotted}' to {}", package_init.display());
        return Some(canonicalize(&package_init));
    }

    None
}

fn canonicalize(path: &Path) -> PathBuf {
    match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(error) => {
            warn!("failed to canonicalize {}: {error}", path.display());
            path.to_path_buf()
        }
    }
}
