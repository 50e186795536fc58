use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use json_config_diff::{DiffConfig, MatchedItemPolicy};
use serde::de::DeserializeOwned;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compare old and new JSON document, and print differences
#[derive(Parser)]
#[clap(about, version)]
struct Args {
    /// The old document
    lhs: PathBuf,
    /// The new document
    rhs: PathBuf,
    /// JSON file with a diff configuration. Flags below override it.
    #[clap(long)]
    config: Option<PathBuf>,
    /// Field identifying elements of record lists, most preferred first. Can be repeated.
    #[clap(long = "identity-field")]
    identity_fields: Vec<String>,
    /// Fail instead of using the first string field when no identity field is present
    #[clap(long)]
    no_fallback: bool,
    /// Diff record list elements sharing an identity field by field
    #[clap(long)]
    recurse_matched: bool,
    /// Print debug logs to stderr
    #[clap(short, long)]
    verbose: bool,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn setup_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let mut config: DiffConfig = match args.config {
        Some(ref path) => read_json(path)?,
        None => DiffConfig::default(),
    };
    if !args.identity_fields.is_empty() {
        config.identity.fields = args.identity_fields;
    }
    if args.no_fallback {
        config.identity.fallback_to_first_string = false;
    }
    if args.recurse_matched {
        config.matched_items = MatchedItemPolicy::Recurse;
    }

    let lhs: serde_json::Value = read_json(&args.lhs)?;
    let rhs: serde_json::Value = read_json(&args.rhs)?;

    let changes = json_config_diff::diff_with_config(&lhs, &rhs, &config)?;

    for change in changes {
        println!("{}", serde_json::to_string(&change)?);
    }
    Ok(())
}
