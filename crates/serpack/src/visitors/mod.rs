//! AST walks used by the bundler.
//!
//! `symbol_scanner` extracts a module's symbol table, import entries and
//! unresolved globals in one scope-aware pass; `docstring_stripper` is the
//! optional output post-pass.

mod docstring_stripper;
mod symbol_scanner;

pub use docstring_stripper::{is_string_literal_stmt, strip_docstrings};
pub use symbol_scanner::{Definition, ScanResult, scan_module};
