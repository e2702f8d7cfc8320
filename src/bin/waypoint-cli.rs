use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use waypoint::routing::matcher::MatchOutcome;

#[derive(Parser)]
#[command(name = "waypoint-cli")]
#[command(about = "Inspect and resolve declarative route tables", long_about = None)]
struct Cli {
    /// Route table file (TOML).
    #[arg(short, long, default_value = "routes.toml")]
    routes: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the route table
    Check,
    /// Resolve a path against the route table
    Resolve {
        /// Request path, e.g. /contacts/42
        path: String,
    },
    /// List every leaf route's pattern path
    Paths,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    waypoint::observability::logging::init_logging(&Default::default());

    let tree = match waypoint::config::load_routes(&cli.routes) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("Error: {}: {}", cli.routes.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Check => {
            println!("ok: {} route nodes compiled", tree.len());
        }
        Commands::Resolve { path } => match tree.resolve(&path) {
            MatchOutcome::Matched(result) => {
                let chain: Vec<&str> = result.matches.iter().map(|m| m.path.as_str()).collect();
                let params: serde_json::Map<String, serde_json::Value> = result
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_string(), json!(v)))
                    .collect();
                let out = json!({ "matches": chain, "params": params });
                match serde_json::to_string_pretty(&out) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        eprintln!("Error: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            }
            MatchOutcome::NoMatch => {
                eprintln!("no match: {path}");
                return ExitCode::FAILURE;
            }
        },
        Commands::Paths => {
            for path in tree.leaf_paths() {
                println!("{path}");
            }
        }
    }

    ExitCode::SUCCESS
}
