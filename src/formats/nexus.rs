//! Nexus reader and writer.
//!
//! Only `TREES` blocks are interpreted. A `TRANSLATE` command maps tokens
//! used in the tree strings to full labels; other commands and blocks are
//! skipped.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::clade::{Clade, Phylogeny};
use crate::domain::TreeFormat;
use crate::error::TaxaError;

use super::byte_parser::ByteParser;
use super::labels::escape_label;
use super::newick::{parse_tree, to_newick};
use super::{ParsingError, ParsingErrorType, PhyloCodec};

/// Bytes that end an unquoted Nexus token.
const NEXUS_LABEL_DELIMITERS: &[u8] = b" ,;=\t\n\r[";

const NEXUS_HEADER: &str = "#NEXUS";

#[derive(Debug, PartialEq, Clone)]
pub enum NexusBlock {
    Taxa,
    Trees,
    Data,
    Characters,
    Distances,
    Sets,
    Assumptions,
    UnknownBlock(String),
}

impl NexusBlock {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "taxa" => NexusBlock::Taxa,
            "trees" => NexusBlock::Trees,
            "data" => NexusBlock::Data,
            "characters" => NexusBlock::Characters,
            "distances" => NexusBlock::Distances,
            "sets" => NexusBlock::Sets,
            "assumptions" => NexusBlock::Assumptions,
            _ => NexusBlock::UnknownBlock(name.to_string()),
        }
    }
}

pub struct NexusCodec;

impl PhyloCodec for NexusCodec {
    fn format(&self) -> TreeFormat {
        TreeFormat::Nexus
    }

    fn parse(&self, input: &str) -> Result<Vec<Phylogeny>, TaxaError> {
        Ok(parse_str(input)?)
    }

    fn write(&self, trees: &[Phylogeny]) -> Result<String, TaxaError> {
        Ok(write_str(trees))
    }
}

pub fn parse_str(input: &str) -> Result<Vec<Phylogeny>, ParsingError> {
    let mut parser = ByteParser::for_str(input);
    parser.skip_comment_and_whitespace()?;
    if !parser.consume_if_word(NEXUS_HEADER) {
        return Err(parser.error(ParsingErrorType::MissingNexusHeader));
    }

    let mut trees = Vec::new();
    loop {
        parser.skip_comment_and_whitespace()?;
        if parser.is_eof() {
            break;
        }
        if !parser.consume_if_word("begin") {
            return Err(parser.error(ParsingErrorType::InvalidBlockName));
        }
        parser.skip_comment_and_whitespace()?;
        let name = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
        parser.skip_comment_and_whitespace()?;
        if name.is_empty() || !parser.consume_if(b';') {
            return Err(parser.error(ParsingErrorType::InvalidBlockName));
        }

        match NexusBlock::from_name(&name) {
            NexusBlock::Trees => parse_trees_block(&mut parser, &mut trees)?,
            _ => skip_block(&mut parser)?,
        }
    }

    if trees.is_empty() {
        return Err(parser.error(ParsingErrorType::NoTrees));
    }
    Ok(trees)
}

/// Consumes `END;` or `ENDBLOCK;` if it comes next.
fn consume_block_end(parser: &mut ByteParser<'_>) -> Result<bool, ParsingError> {
    if parser.consume_if_word("endblock") || parser.consume_if_word("end") {
        parser.skip_comment_and_whitespace()?;
        if !parser.consume_if(b';') {
            return Err(parser.error(ParsingErrorType::InvalidTreesBlock(
                "expected ';' after END".to_string(),
            )));
        }
        return Ok(true);
    }
    Ok(false)
}

fn skip_block(parser: &mut ByteParser<'_>) -> Result<(), ParsingError> {
    loop {
        parser.skip_comment_and_whitespace()?;
        if parser.is_eof() {
            return Err(parser.error(ParsingErrorType::UnexpectedEof));
        }
        if consume_block_end(parser)? {
            return Ok(());
        }
        parser.skip_command()?;
    }
}

fn parse_trees_block(
    parser: &mut ByteParser<'_>,
    trees: &mut Vec<Phylogeny>,
) -> Result<(), ParsingError> {
    let mut translation = HashMap::new();
    loop {
        parser.skip_comment_and_whitespace()?;
        if parser.is_eof() {
            return Err(parser.error(ParsingErrorType::UnexpectedEof));
        }
        if consume_block_end(parser)? {
            return Ok(());
        }
        if parser.consume_if_word("translate") {
            parse_translate(parser, &mut translation)?;
        } else if parser.consume_if_word("tree") || parser.consume_if_word("utree") {
            trees.push(parse_tree_command(parser, &translation)?);
        } else {
            parser.skip_command()?;
        }
    }
}

fn parse_translate(
    parser: &mut ByteParser<'_>,
    translation: &mut HashMap<String, String>,
) -> Result<(), ParsingError> {
    loop {
        parser.skip_comment_and_whitespace()?;
        let key = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
        parser.skip_comment_and_whitespace()?;
        let label = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
        if key.is_empty() || label.is_empty() {
            return Err(parser.error(ParsingErrorType::InvalidTranslateCommand));
        }
        translation.insert(key, label);
        parser.skip_comment_and_whitespace()?;
        if parser.consume_if(b',') {
            continue;
        }
        if parser.consume_if(b';') {
            return Ok(());
        }
        return Err(parser.error(ParsingErrorType::InvalidTranslateCommand));
    }
}

fn parse_tree_command(
    parser: &mut ByteParser<'_>,
    translation: &HashMap<String, String>,
) -> Result<Phylogeny, ParsingError> {
    parser.skip_comment_and_whitespace()?;
    parser.consume_if(b'*');
    parser.skip_comment_and_whitespace()?;
    let name = parser.parse_label(NEXUS_LABEL_DELIMITERS)?;
    parser.skip_comment_and_whitespace()?;
    if !parser.consume_if(b'=') {
        return Err(parser.error(ParsingErrorType::InvalidTreesBlock(format!(
            "expected '=' after tree name {name:?}"
        ))));
    }
    parser.skip_whitespace();
    let rooted = !parser.peek_is_sequence(b"[&U]");

    let mut root = parse_tree(parser)?;
    if !translation.is_empty() {
        translate_names(&mut root, translation);
    }

    Ok(Phylogeny {
        name: (!name.is_empty()).then_some(name),
        rooted,
        root,
    })
}

fn translate_names(clade: &mut Clade, translation: &HashMap<String, String>) {
    if let Some(label) = clade.name.as_ref().and_then(|name| translation.get(name)) {
        clade.name = Some(label.clone());
    }
    for child in &mut clade.clades {
        translate_names(child, translation);
    }
}

/// Writes a `TAXA` block listing terminal labels and a `TREES` block.
pub fn write_str(trees: &[Phylogeny]) -> String {
    let mut labels: Vec<&str> = Vec::new();
    for tree in trees {
        for terminal in tree.root.terminals() {
            if let Some(name) = terminal.name.as_deref() {
                if !labels.contains(&name) {
                    labels.push(name);
                }
            }
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{NEXUS_HEADER}");
    let _ = writeln!(out, "Begin Taxa;");
    let _ = writeln!(out, "\tDimensions ntax={};", labels.len());
    let _ = write!(out, "\tTaxlabels");
    for label in &labels {
        let _ = write!(out, " {}", escape_label(label));
    }
    let _ = writeln!(out, ";");
    let _ = writeln!(out, "End;");
    let _ = writeln!(out, "Begin Trees;");
    for (index, tree) in trees.iter().enumerate() {
        let name = tree
            .name
            .as_deref()
            .map(escape_label)
            .unwrap_or_else(|| format!("tree{}", index + 1));
        let rooting = if tree.rooted { "[&R]" } else { "[&U]" };
        let _ = writeln!(out, "\tTree {name} = {rooting} {}", to_newick(&tree.root));
    }
    let _ = writeln!(out, "End;");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "#NEXUS
[written by hand]
BEGIN TAXA;
    DIMENSIONS NTAX=3;
    TAXLABELS A B C;
END;
BEGIN TREES;
    TRANSLATE
        1 Vespa_crabro,
        2 'Vespula germanica',
        3 Polistes;
    TREE one = [&R] ((1:1,2:1)Vespinae:1,3:2)Vespidae;
    TREE two = [&U] (1,3);
END;
";

    #[test]
    fn reads_translated_trees() {
        let trees = parse_str(SAMPLE).unwrap();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].name.as_deref(), Some("one"));
        assert!(trees[0].rooted);
        assert!(!trees[1].rooted);
        let names: Vec<_> = trees[0]
            .root
            .iter()
            .filter_map(|clade| clade.name.as_deref())
            .collect();
        assert_eq!(
            names,
            vec!["Vespidae", "Vespinae", "Vespa crabro", "Vespula germanica", "Polistes"]
        );
    }

    #[test]
    fn header_is_required() {
        let err = parse_str("BEGIN TREES; END;").unwrap_err();
        assert_eq!(err.kind(), &ParsingErrorType::MissingNexusHeader);
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = parse_str("#NEXUS\nBEGIN DATA;\n DIMENSIONS NCHAR=3;").unwrap_err();
        assert_eq!(err.kind(), &ParsingErrorType::UnexpectedEof);
    }

    #[test]
    fn written_output_reads_back() {
        let tree = Phylogeny::new(
            Clade::named("Vespidae")
                .with_child(Clade::named("Vespa crabro").with_branch_length(1.0))
                .with_child(Clade::named("Polistes").with_branch_length(2.0)),
        )
        .with_name("Vespidae");
        let text = write_str(std::slice::from_ref(&tree));
        assert!(text.starts_with("#NEXUS\n"));
        assert!(text.contains("Taxlabels Vespa_crabro Polistes;"));
        let parsed = parse_str(&text).unwrap();
        assert_eq!(parsed, vec![tree]);
    }
}
