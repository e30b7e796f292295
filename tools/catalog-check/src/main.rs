//! catalog-check: validate a project catalog and preview tag classification
//!
//! Usage:
//!   catalog-check <catalog.toml>                  # compile every release pattern
//!   catalog-check <catalog.toml> v1.0 1.2-rc1     # show which projects accept each name
//!   catalog-check <catalog.toml> v1.0 -q          # quiet: exit 0 if every name is accepted somewhere, 1 otherwise
//!
//! Use before a batch run to catch broken patterns and to see which tag names
//! a project will treat as noise.

use std::process;

use clap::Parser;
use fix_distance::{Catalog, Project, Source};

#[derive(Parser)]
#[command(name = "catalog-check")]
struct Args {
    /// Project catalog TOML file.
    catalog: String,

    /// Candidate tag names to classify.
    names: Vec<String>,

    /// Quiet: only exit code (0=all accepted, 1=some rejected).
    #[arg(short, long)]
    quiet: bool,
}

fn load_projects(path: &str) -> Vec<Project> {
    let catalog = Catalog::load(path).unwrap_or_else(|e| {
        eprintln!("catalog-check: cannot load {}: {}", path, e);
        process::exit(2);
    });
    catalog.compile().unwrap_or_else(|e| {
        eprintln!("catalog-check: invalid catalog {}: {}", path, e);
        process::exit(2);
    })
}

/// Per name, the ids of projects whose vcs pattern accepts it.
fn classify(projects: &[Project], names: &[String]) -> Vec<(String, Vec<String>)> {
    names
        .iter()
        .map(|name| {
            let accepted = projects
                .iter()
                .filter(|p| p.classifies_name(Source::Vcs, name))
                .map(|p| p.id().to_string())
                .collect();
            (name.clone(), accepted)
        })
        .collect()
}

fn main() {
    let args = Args::parse();
    let projects = load_projects(&args.catalog);
    let results = classify(&projects, &args.names);
    let all_accepted = results.iter().all(|(_, accepted)| !accepted.is_empty());

    if args.quiet {
        process::exit(if all_accepted { 0 } else { 1 });
    }

    for p in &projects {
        println!(
            "{} ({}): {}",
            p.id(),
            p.config.project_key.as_deref().unwrap_or("-"),
            p.config.release_name_pattern
        );
    }

    for (name, accepted) in &results {
        if accepted.is_empty() {
            println!("- {}: noise", name);
        } else {
            println!("+ {}: {}", name, accepted.join(", "));
        }
    }

    process::exit(if all_accepted { 0 } else { 1 });
}
