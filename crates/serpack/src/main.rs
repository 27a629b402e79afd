use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use serpack::{BundleOptions, Bundler, Config};

#[derive(Parser, Debug)]
#[command(name = "serpack")]
#[command(about = "Bundle a Python module and its imports into one file")]
#[command(version)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable tree shaking and inline every reachable module in full
    #[arg(long = "no-tree-shake")]
    no_tree_shake: bool,

    /// Strip docstrings and source-location comments from the output
    #[arg(short = 's', long = "strip")]
    strip: bool,

    /// Strip docstrings only
    #[arg(long = "strip-docstrings")]
    strip_docstrings: bool,

    /// Omit source-location comments only
    #[arg(long = "no-source-locations")]
    no_source_locations: bool,

    /// Path to a serpack.toml configuration file
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Entry Python file
    input: PathBuf,

    /// Output bundle path
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let options = BundleOptions {
        shake_tree: !args.no_tree_shake,
        include_source_locations: !(args.strip || args.no_source_locations),
        strip_docstrings: args.strip || args.strip_docstrings,
    };

    let mut bundler = Bundler::new(&config, options);
    let output = bundler.pack(&args.input)?;
    fs::write(&args.output, output)
        .with_context(|| format!("cannot write bundle to '{}'", args.output.display()))?;

    Ok(())
}
