//! Readers and writers for phylogenetic tree formats.
//!
//! Every supported [`TreeFormat`] maps to one [`PhyloCodec`]. The mapping is
//! fixed at compile time; see [`codec_for`].

pub mod byte_parser;
pub mod labels;
pub mod newick;
pub mod nexus;
pub mod phyloxml;

use std::fmt;

use thiserror::Error;

use crate::clade::Phylogeny;
use crate::domain::TreeFormat;
use crate::error::TaxaError;

/// Default length of context attached to a [`ParsingError`].
pub(crate) const DEFAULT_CONTEXT_LENGTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParsingErrorType {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("missing #NEXUS header")]
    MissingNexusHeader,
    #[error("invalid block start")]
    InvalidBlockName,
    #[error("invalid TRANSLATE command")]
    InvalidTranslateCommand,
    #[error("invalid TREES block: {0}")]
    InvalidTreesBlock(String),
    #[error("unclosed comment")]
    UnclosedComment,
    #[error("unclosed quoted label")]
    UnclosedQuote,
    #[error("invalid Newick string: {0}")]
    InvalidNewickString(String),
    #[error("invalid PhyloXML: {0}")]
    InvalidXml(String),
    #[error("no trees found")]
    NoTrees,
}

/// A parse failure with the byte position and the text surrounding it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} (at byte {position}, near `{context}`)")]
pub struct ParsingError {
    kind: ParsingErrorType,
    position: usize,
    context: String,
}

impl ParsingError {
    pub fn new(kind: ParsingErrorType, position: usize, context: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            context: context.into(),
        }
    }

    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

/// Reads and writes one tree format.
pub trait PhyloCodec: Send + Sync {
    fn format(&self) -> TreeFormat;

    fn parse(&self, input: &str) -> Result<Vec<Phylogeny>, TaxaError>;

    fn write(&self, trees: &[Phylogeny]) -> Result<String, TaxaError>;
}

impl fmt::Debug for dyn PhyloCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhyloCodec({})", self.format())
    }
}

static PHYLOXML: phyloxml::PhyloXmlCodec = phyloxml::PhyloXmlCodec;
static NEXUS: nexus::NexusCodec = nexus::NexusCodec;
static NEWICK: newick::NewickCodec = newick::NewickCodec;

pub fn codec_for(format: TreeFormat) -> &'static dyn PhyloCodec {
    match format {
        TreeFormat::Phyloxml => &PHYLOXML,
        TreeFormat::Nexus => &NEXUS,
        TreeFormat::Newick => &NEWICK,
    }
}

pub fn read_str(format: TreeFormat, input: &str) -> Result<Vec<Phylogeny>, TaxaError> {
    codec_for(format).parse(input)
}

pub fn write_str(format: TreeFormat, trees: &[Phylogeny]) -> Result<String, TaxaError> {
    codec_for(format).write(trees)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_format_has_a_codec() {
        for format in TreeFormat::ALL {
            assert_eq!(codec_for(format).format(), format);
        }
    }
}
