//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::search::MatchType;

/// Metadata catalog over a tree of YAML files
#[derive(Parser, Debug)]
#[command(name = "tame")]
#[command(about = "Track, validate and search YAML metadata attached to files")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================
// Main Commands Enum
// ============================================

/// Available subcommands for tame
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that parents resolve and tracked files exist
    #[command(visible_alias = "v")]
    Validate(ValidateArgs),

    /// Find records by key/value, including inherited values
    #[command(visible_alias = "s")]
    Search(SearchArgs),

    /// Show one record, its parents and everything it inherits
    Describe(DescribeArgs),

    /// Show the strongly connected components of the parent graph
    Graph(GraphArgs),
}

// ============================================
// Validate Subcommand
// ============================================

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// File or directory to validate (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Only check metadata, skip tracked-file existence checks
    #[arg(short, long)]
    pub metadata_only: bool,
}

// ============================================
// Search Subcommand
// ============================================

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search terms, either `key=value` or a bare `value` matching any key
    #[arg(value_name = "TERMS")]
    pub terms: Vec<String>,

    /// How values are compared
    #[arg(long, value_enum, default_value = "eq")]
    pub op: MatchOp,

    /// Match records satisfying any term instead of all terms
    #[arg(long)]
    pub any: bool,

    /// Ignore values inherited from parents
    #[arg(long)]
    pub no_parents: bool,

    /// Only report records under this file or directory
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,
}

/// Comparison used by search terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MatchOp {
    /// Equality (wildcard match for text)
    #[default]
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    /// Regular expression anchored at the start
    Regex,
}

impl From<MatchOp> for MatchType {
    fn from(op: MatchOp) -> Self {
        match op {
            MatchOp::Eq => MatchType::Equal,
            MatchOp::Lt => MatchType::Less,
            MatchOp::Le => MatchType::LessEqual,
            MatchOp::Gt => MatchType::Greater,
            MatchOp::Ge => MatchType::GreaterEqual,
            MatchOp::Regex => MatchType::Regex,
        }
    }
}

// ============================================
// Describe / Graph Subcommands
// ============================================

/// Arguments for the describe command
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Metadata file to describe
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for the graph command
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Directory inside the catalog (defaults to the current directory)
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Include single-record components
    #[arg(long)]
    pub all: bool,
}

// ============================================
// Output Format
// ============================================

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default for terminal)
    #[default]
    #[value(alias = "pretty")]
    Text,
    /// TOON (Token-Oriented Object Notation)
    Toon,
    /// JSON - standard JSON output for machine parsing
    Json,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl SearchArgs {
    /// Split a term into an optional key and a value
    pub fn split_term(term: &str) -> (Option<&str>, &str) {
        match term.split_once('=') {
            Some((key, value)) if !key.is_empty() => (Some(key), value),
            _ => (None, term),
        }
    }
}
