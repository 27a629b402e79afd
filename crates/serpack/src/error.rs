//! Error types for bundling failures.
//!
//! Only hard failures get a variant: an entry file that cannot be loaded, or
//! a transitively-imported module that cannot be read or parsed. An import
//! that does not resolve to a local file is *not* an error; it is reported as
//! `None` by the resolver and retained as an external import in the output.

use std::{io, path::PathBuf};

use ruff_python_parser::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    /// The entry file could not be read. Aborts the whole run.
    #[error("cannot read entry file '{path}'")]
    EntryRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A discovered module could not be read. Fatal for the run: silently
    /// dropping an importable module would change program semantics.
    #[error("cannot read module '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A discovered module could not be parsed.
    #[error("cannot parse '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}
