//! Serpack bundles a Python entry module and everything it imports from the
//! configured source roots into a single self-contained `.py` file, keeping
//! only the definitions the entry module transitively requires.

pub mod bundler;
pub mod config;
pub mod emitter;
pub mod error;
pub mod imports;
pub mod module_graph;
pub mod resolver;
pub mod tree_shaking;
pub mod types;
pub mod visitors;

pub use bundler::{BundleOptions, Bundler};
pub use config::Config;
pub use error::BundleError;
