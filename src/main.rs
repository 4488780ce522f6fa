use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod data_dir;
pub mod error;
pub mod ingestion;
pub mod lemma;
pub mod record;
pub mod search;
pub mod tantivy_index;
pub mod token_cursor;
pub mod transducer;
pub mod vote;

use std::path::{Path, PathBuf};

use cli::{Cli, Command, IndexAction};
use data_dir::DataDir;
use tantivy_index::SearchIndex;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SCENEDEX_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let data_dir = cli.data_dir.as_deref();

    match cli.command {
        Command::Index { action } => match action {
            IndexAction::Attributes(args) => {
                let index_dir = resolve_index_dir(data_dir, args.index_dir)?;
                let count =
                    ingestion::index_attributes(&args.inputs, &index_dir)?;
                println!(
                    "Indexed {count} attribute records into {}",
                    index_dir.display()
                );
            }
            IndexAction::Relationships(args) => {
                let index_dir = resolve_index_dir(data_dir, args.index_dir)?;
                let count =
                    ingestion::index_relationships(&args.inputs, &index_dir)?;
                println!(
                    "Indexed {count} relationship records into {}",
                    index_dir.display()
                );
            }
        },
        Command::Search(args) => {
            let index_dir =
                resolve_index_dir(data_dir, args.index_dir.clone())?;
            let index = SearchIndex::open(&index_dir)?;
            let hits = search::execute_search(&args, &index)?;

            if args.json {
                search::format_json(&hits, &args.query);
            } else {
                search::format_human(&hits);
            }
        }
        Command::Vote(args) => {
            let index_dir =
                resolve_index_dir(data_dir, args.index_dir.clone())?;
            let index = SearchIndex::open(&index_dir)?;
            let votes =
                vote::count_support(&index, args.field.name(), &args.terms)?;

            if args.json {
                let payload = serde_json::json!({
                    "field": args.field.name(),
                    "terms": args.terms,
                    "votes": votes,
                });
                println!("{payload}");
            } else {
                println!("{votes}");
            }
        }
        Command::Eval(args) => {
            let index_dir =
                resolve_index_dir(data_dir, args.index_dir.clone())?;
            let index = SearchIndex::open(&index_dir)?;
            let evaluated =
                vote::evaluate_truth_file(&index, &args.truth, &args.output)?;
            println!(
                "Evaluated {evaluated} triple(s) into {}",
                args.output.display()
            );
        }
        Command::Status(args) => {
            let index_dir =
                resolve_index_dir(data_dir, args.index_dir.clone())?;
            cmd_status(&index_dir, args.json)?;
        }
        Command::Completions(args) => {
            args.generate();
        }
    }

    Ok(())
}

/// An explicit --index-dir wins; otherwise the index lives under the
/// resolved data directory.
fn resolve_index_dir(
    data_dir: Option<&Path>,
    explicit: Option<PathBuf>,
) -> error::Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => DataDir::resolve(data_dir)?.index_dir(),
    }
}

fn cmd_status(index_dir: &Path, json: bool) -> error::Result<()> {
    let index = SearchIndex::open(index_dir)?;
    let documents = index.num_docs()?;

    if json {
        let payload = serde_json::json!({
            "index_dir": index_dir.display().to_string(),
            "documents": documents,
        });
        println!("{payload}");
    } else {
        println!("Index directory: {}", index_dir.display());
        println!("Documents: {documents}");
    }
    Ok(())
}
