use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "scenedex",
    about = "A searchable index over Visual Genome region annotations"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert annotation dumps into the search index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Search indexed records by term
    Search(SearchArgs),
    /// Count index support for a term combination
    Vote(VoteArgs),
    /// Batch-evaluate a truth file of relationship triples
    Eval(EvalArgs),
    /// Show index statistics
    Status(StatusArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Index subcommands --

#[derive(Debug, Subcommand)]
pub enum IndexAction {
    /// Index per-region attribute dumps (attributes.json)
    Attributes(IndexArgs),
    /// Index relationship dumps (relationships.json)
    Relationships(IndexArgs),
}

#[derive(Debug, Parser)]
pub struct IndexArgs {
    /// Input JSON dump files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory holding the search index (defaults to the data dir)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

// -- Terms field selector --

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TermsField {
    Attribute,
    Relationship,
}

impl TermsField {
    pub fn name(self) -> &'static str {
        match self {
            TermsField::Attribute => crate::tantivy_index::fields::ATTRIBUTE,
            TermsField::Relationship => {
                crate::tantivy_index::fields::RELATIONSHIP
            }
        }
    }
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Which record field to search
    #[arg(short = 'f', long, value_enum, default_value = "attribute")]
    pub field: TermsField,

    /// Number of results to return
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory holding the search index (defaults to the data dir)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

// -- Vote --

#[derive(Debug, Parser)]
pub struct VoteArgs {
    /// Terms that must all match one record
    #[arg(required = true)]
    pub terms: Vec<String>,

    /// Which record field to count in
    #[arg(short = 'f', long, value_enum, default_value = "relationship")]
    pub field: TermsField,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory holding the search index (defaults to the data dir)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

// -- Eval --

#[derive(Debug, Parser)]
pub struct EvalArgs {
    /// Truth file with one subject,predicate,object triple per line
    pub truth: PathBuf,

    /// Output file receiving one a,b,c,vote line per triple
    pub output: PathBuf,

    /// Directory holding the search index (defaults to the data dir)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

// -- Status --

#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Directory holding the search index (defaults to the data dir)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "scenedex",
            &mut std::io::stdout(),
        );
    }
}
