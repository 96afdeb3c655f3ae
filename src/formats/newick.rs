//! Newick reader and writer.
//!
//! Grammar accepted by the reader:
//! * `tree ::= subtree ';'`
//! * `subtree ::= ( '(' subtree (',' subtree)* ')' )? [label] [':' number]`
//!
//! Whitespace and `[...]` comments may appear between tokens. Trees are
//! n-ary and internal vertices may carry labels. Several trees may follow
//! each other in one input.

use crate::clade::{Clade, Phylogeny};
use crate::domain::TreeFormat;
use crate::error::TaxaError;

use super::byte_parser::ByteParser;
use super::labels::escape_label;
use super::{ParsingError, ParsingErrorType, PhyloCodec};

/// Bytes that end an unquoted Newick label.
pub(crate) const NEWICK_LABEL_DELIMITERS: &[u8] = b" \t\n\r(),:;[]";

pub struct NewickCodec;

impl PhyloCodec for NewickCodec {
    fn format(&self) -> TreeFormat {
        TreeFormat::Newick
    }

    fn parse(&self, input: &str) -> Result<Vec<Phylogeny>, TaxaError> {
        Ok(parse_str(input)?)
    }

    fn write(&self, trees: &[Phylogeny]) -> Result<String, TaxaError> {
        Ok(write_str(trees))
    }
}

/// Parses every `;`-terminated tree in `input`.
pub fn parse_str(input: &str) -> Result<Vec<Phylogeny>, ParsingError> {
    let mut parser = ByteParser::for_str(input);
    let mut trees = Vec::new();
    loop {
        parser.skip_comment_and_whitespace()?;
        if parser.is_eof() {
            break;
        }
        trees.push(Phylogeny::new(parse_tree(&mut parser)?));
    }
    if trees.is_empty() {
        return Err(parser.error(ParsingErrorType::NoTrees));
    }
    Ok(trees)
}

/// Parses one tree including its terminating semicolon.
pub(crate) fn parse_tree(parser: &mut ByteParser<'_>) -> Result<Clade, ParsingError> {
    let root = parse_subtree(parser)?;
    parser.skip_comment_and_whitespace()?;
    if !parser.consume_if(b';') {
        let next_char = parser.peek().map(char::from);
        return Err(parser.error(ParsingErrorType::InvalidNewickString(format!(
            "expected ';' at end of tree but found {next_char:?}"
        ))));
    }
    Ok(root)
}

fn parse_subtree(parser: &mut ByteParser<'_>) -> Result<Clade, ParsingError> {
    parser.skip_comment_and_whitespace()?;
    let mut clade = Clade::default();

    if parser.consume_if(b'(') {
        loop {
            clade.clades.push(parse_subtree(parser)?);
            parser.skip_comment_and_whitespace()?;
            if parser.consume_if(b',') {
                continue;
            }
            if parser.consume_if(b')') {
                break;
            }
            let next_char = parser.peek().map(char::from);
            return Err(parser.error(match next_char {
                None => ParsingErrorType::UnexpectedEof,
                Some(_) => ParsingErrorType::InvalidNewickString(format!(
                    "expected ',' or ')' after child but found {next_char:?}"
                )),
            }));
        }
        parser.skip_comment_and_whitespace()?;
    }

    if let Some(b) = parser.peek() {
        if !NEWICK_LABEL_DELIMITERS.contains(&b) {
            let label = parser.parse_label(NEWICK_LABEL_DELIMITERS)?;
            if !label.is_empty() {
                clade.name = Some(label);
            }
        }
    }

    clade.branch_length = parse_branch_length(parser)?;
    Ok(clade)
}

fn parse_branch_length(parser: &mut ByteParser<'_>) -> Result<Option<f64>, ParsingError> {
    parser.skip_comment_and_whitespace()?;
    if !parser.consume_if(b':') {
        return Ok(None);
    }
    parser.skip_comment_and_whitespace()?;

    let mut branch_length_str = String::new();
    while let Some(b) = parser.peek() {
        if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
            branch_length_str.push(b as char);
            parser.next_byte();
        } else {
            break;
        }
    }

    let value: f64 = branch_length_str.parse().map_err(|_| {
        parser.error(ParsingErrorType::InvalidNewickString(format!(
            "invalid branch length: {branch_length_str:?}"
        )))
    })?;
    Ok(Some(value))
}

/// Writes each tree on its own line.
pub fn write_str(trees: &[Phylogeny]) -> String {
    let mut out = String::new();
    for tree in trees {
        out.push_str(&to_newick(&tree.root));
        out.push('\n');
    }
    out
}

/// Returns the Newick string of `root` including the closing semicolon.
pub fn to_newick(root: &Clade) -> String {
    fn build(clade: &Clade, newick: &mut String) {
        if !clade.is_terminal() {
            newick.push('(');
            for (index, child) in clade.clades.iter().enumerate() {
                if index > 0 {
                    newick.push(',');
                }
                build(child, newick);
            }
            newick.push(')');
        }
        if let Some(name) = &clade.name {
            newick.push_str(&escape_label(name));
        }
        if let Some(branch_length) = clade.branch_length {
            newick.push(':');
            newick.push_str(&branch_length.to_string());
        }
    }

    let mut newick = String::new();
    build(root, &mut newick);
    newick.push(';');
    newick
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_internal_labels_and_lengths() {
        let trees = parse_str("((A:1,B:2.5e-1)Inner:0.5,C)Root;").unwrap();
        assert_eq!(trees.len(), 1);
        let root = &trees[0].root;
        assert_eq!(root.name.as_deref(), Some("Root"));
        assert_eq!(root.clades.len(), 2);
        assert_eq!(root.clades[0].name.as_deref(), Some("Inner"));
        assert_eq!(root.clades[0].branch_length, Some(0.5));
        assert_eq!(root.clades[0].clades[1].branch_length, Some(0.25));
        assert_eq!(root.clades[1].branch_length, None);
    }

    #[test]
    fn single_child_chains_survive() {
        let trees = parse_str("(((Vespa_crabro:1)Vespa:1)Vespidae:1)Hymenoptera:1;").unwrap();
        assert_eq!(trees[0].root.count(), 4);
        let leaf = trees[0].root.terminals().next().unwrap();
        assert_eq!(leaf.name.as_deref(), Some("Vespa crabro"));
    }

    #[test]
    fn writer_output_reads_back() {
        let tree = Clade::named("Root")
            .with_branch_length(1.0)
            .with_child(Clade::named("Baillon's Crake").with_branch_length(0.5))
            .with_child(Clade::named("Vespa crabro"));
        let newick = to_newick(&tree);
        assert_eq!(newick, "('Baillon''s Crake':0.5,Vespa_crabro)Root:1;");
        let parsed = parse_str(&newick).unwrap();
        assert_eq!(parsed[0].root, tree);
    }

    #[test]
    fn missing_semicolon_is_an_error() {
        let err = parse_str("(A,B)").unwrap_err();
        assert!(matches!(err.kind(), ParsingErrorType::InvalidNewickString(_)));
    }

    #[test]
    fn unterminated_children_report_eof() {
        let err = parse_str("(A,B").unwrap_err();
        assert_eq!(err.kind(), &ParsingErrorType::UnexpectedEof);
    }
}
