//! KEYSTONE CLI
//!
//! Assembles the stack of the enclosing project and writes its manifest.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use keystone_assets::{AssetLoader, MARKER_FILE, ProjectRoot};
use keystone_core::OperationType;
use keystone_stack::resolver::discover_template_fields;
use keystone_stack::{Stack, StackConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keystone")]
#[command(about = "KEYSTONE - GraphQL backend assembly", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the stack and write its manifest
    Synth {
        /// Project root, discovered from the current directory if absent
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Manifest path, stdout if absent
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List template resolvers per operation type
    Resolvers {
        /// Project root, discovered from the current directory if absent
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
    /// Print the project root
    Root,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keystone=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Synth { root, output } => {
            let root = locate(root)?;
            let manifest = Stack::from_root(&root)?.synth()?;
            let json = manifest.to_json()?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .wrap_err_with(|| format!("writing manifest to {}", path.display()))?,
                None => println!("{}", json),
            }
            eprintln!("fingerprint: {}", manifest.fingerprint);
            Ok(())
        }
        Commands::Resolvers { root } => {
            let root = locate(root)?;
            for (operation, fields) in template_resolvers(&root)? {
                for field in fields {
                    println!("{}.{}", operation, field);
                }
            }
            Ok(())
        }
        Commands::Root => {
            println!("{}", ProjectRoot::discover_from_cwd()?.path().display());
            Ok(())
        }
    }
}

/// Use `explicit` as the root, or walk up from the current directory
fn locate(explicit: Option<PathBuf>) -> Result<ProjectRoot> {
    let root = match explicit {
        Some(path) => {
            if !path.join(MARKER_FILE).is_file() {
                color_eyre::eyre::bail!("{} has no {}", path.display(), MARKER_FILE);
            }
            ProjectRoot::new(path)
        }
        None => ProjectRoot::discover_from_cwd()?,
    };
    tracing::debug!(root = %root.path().display(), "using project root");
    Ok(root)
}

/// Discovered template resolver fields, per operation type
fn template_resolvers(root: &ProjectRoot) -> Result<Vec<(OperationType, Vec<String>)>> {
    let config = StackConfig::load(root)?;
    let loader = AssetLoader::filesystem(root, &config.assets_dir);

    let mut out = Vec::with_capacity(OperationType::ALL.len());
    for operation in OperationType::ALL {
        let pattern = match operation {
            OperationType::Query => config.query_resolver_pattern.as_deref(),
            OperationType::Mutation => config.mutation_resolver_pattern.as_deref(),
        };
        out.push((operation, discover_template_fields(&loader, operation, pattern)?));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let query = dir.path().join("src/template_resolvers/query");
        std::fs::create_dir_all(&query).unwrap();
        std::fs::write(dir.path().join(MARKER_FILE), "{}").unwrap();
        std::fs::write(query.join("getUser_request.vtl"), "{}").unwrap();
        std::fs::write(query.join("getUser_response.vtl"), "{}").unwrap();
        dir
    }

    #[test]
    fn test_locate_explicit_root() {
        let dir = project();
        let root = locate(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(root.path(), dir.path());
    }

    #[test]
    fn test_locate_rejects_root_without_marker() {
        let dir = TempDir::new().unwrap();
        assert!(locate(Some(dir.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_template_resolvers_listing() {
        let dir = project();
        let listing = template_resolvers(&ProjectRoot::new(dir.path())).unwrap();
        assert_eq!(
            listing,
            vec![
                (OperationType::Query, vec!["getUser".to_string()]),
                (OperationType::Mutation, Vec::new()),
            ]
        );
    }

    #[test]
    fn test_cli_parses_synth() {
        let cli = Cli::try_parse_from(["keystone", "synth", "--root", "/tmp/p", "-o", "out.json"])
            .unwrap();
        let Commands::Synth { root, output } = cli.command else {
            panic!("expected synth");
        };
        assert_eq!(root, Some(PathBuf::from("/tmp/p")));
        assert_eq!(output, Some(PathBuf::from("out.json")));
    }
}
