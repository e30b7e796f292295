//! Binary entrypoint: read a snapshot, write one JSON line per issue.
//!
//! Output lines are either:
//! - A MetricsRecord (one per issue that could be loaded)
//! - An ErrorOutput (one per issue that could not)
//!
//! Logs go to stderr so stdout stays pure JSON lines.

use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fix_distance::types::ErrorOutput;
use fix_distance::{run_batch, run_batch_parallel, Catalog, Config, EngineError, MemoryStore, Snapshot};

#[derive(Debug, Parser)]
#[command(name = "fix-distance", about = "Estimate defect fix distances from tracker and vcs data")]
struct Args {
  /// Snapshot JSON file (stdin when omitted).
  #[arg(long)]
  input: Option<PathBuf>,

  /// Project catalog TOML; overrides the snapshot's embedded projects.
  #[arg(long)]
  catalog: Option<PathBuf>,

  /// Fan issues out across worker threads.
  #[arg(long)]
  parallel: bool,
}

fn main() {
  let args = Args::parse();

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fix_distance=info"));
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(io::stderr))
    .with(filter)
    .init();

  if let Err(e) = run(&args) {
    let _ = writeln!(io::stderr(), "fix-distance: {}", e);
    std::process::exit(1);
  }
}

fn run(args: &Args) -> Result<(), EngineError> {
  let raw = match &args.input {
    Some(path) => fs::read_to_string(path)?,
    None => {
      let mut buf = String::new();
      io::stdin().lock().read_to_string(&mut buf)?;
      buf
    }
  };

  let mut snapshot = Snapshot::from_json(&raw)?;
  let catalog = match &args.catalog {
    Some(path) => Catalog::load(path)?,
    None => Catalog {
      projects: std::mem::take(&mut snapshot.projects),
    },
  };
  let projects = catalog.compile()?;
  let store = MemoryStore::new(snapshot)?;
  let config = Config::default();

  let outcome = if args.parallel {
    run_batch_parallel(&store, &projects, &config)
  } else {
    run_batch(&store, &projects, &config)
  };

  let stdout = io::stdout();
  let mut out = BufWriter::new(stdout.lock());
  for record in &outcome.records {
    serde_json::to_writer(&mut out, record)?;
    writeln!(out)?;
  }
  for failure in &outcome.failures {
    serde_json::to_writer(&mut out, &ErrorOutput::from(failure))?;
    writeln!(out)?;
  }
  out.flush()?;
  Ok(())
}
