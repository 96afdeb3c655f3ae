use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::formats::ParsingError;

#[derive(Debug, Error, Diagnostic)]
pub enum TaxaError {
    #[error(
        "Merge conflict occurred: name \"{name}\" already exists. Import aborted. This may be caused by two clades having the same name in the phylogeny file or by a clade having the same name as an existing taxon. Please change the name of the existing taxon or change the name of the taxon in the import file."
    )]
    #[diagnostic(code(taxatree::merge_conflict))]
    MergeConflict { name: String },

    #[error("unsupported export root assignment: {0}")]
    #[diagnostic(code(taxatree::unsupported_assignment))]
    UnsupportedAssignment(String),

    #[error(transparent)]
    #[diagnostic(
        code(taxatree::parse),
        help("check that the file is valid and matches the requested format")
    )]
    Parse(#[from] ParsingError),

    #[error("unknown tree format: {0}")]
    UnknownFormat(String),

    #[error("taxon not found: {0}")]
    TaxonNotFound(String),

    #[error("cannot move taxon {taxon} under {parent}: target is the taxon itself or one of its descendants")]
    InvalidMove { taxon: String, parent: String },

    #[error("slug already taken: {0}")]
    DuplicateSlug(String),

    #[error("invalid taxon rank: {0}")]
    InvalidRank(String),

    #[error("invalid merge strategy: {0}")]
    InvalidMergeStrategy(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to write {format} output: {message}")]
    Serialize { format: String, message: String },

    #[error("store catalog is unreadable: {0}")]
    StoreCorrupt(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
