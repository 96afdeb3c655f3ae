//! Label escaping for Newick and Nexus output.

/// Bytes that cannot appear in an unquoted label.
const SPECIAL: &[char] = &[
    ',', ';', '\t', '\n', '\r', '(', ')', ':', '[', ']', '\'', '=', '_',
];

/// Escapes a label so that reading it back yields the same text.
///
/// Labels with delimiters, quotes or underscores are wrapped in single
/// quotes with internal quotes doubled. Otherwise blanks become underscores.
///
/// ```
/// # use taxatree::formats::labels::escape_label;
/// assert_eq!(escape_label("Vespa crabro"), "Vespa_crabro");
/// assert_eq!(escape_label("Baillon's Crake"), "'Baillon''s Crake'");
/// assert_eq!(escape_label("snake_case"), "'snake_case'");
/// ```
pub fn escape_label(label: &str) -> String {
    if label.is_empty() {
        return String::new();
    }
    if label.contains(SPECIAL) {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.replace(' ', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::byte_parser::ByteParser;

    #[test]
    fn escaped_labels_read_back_verbatim() {
        for label in ["Pukeko", "Australasian Swamphen", "Pu[ke]ko", "a_b c", "x'y"] {
            let escaped = escape_label(label);
            let mut parser = ByteParser::for_str(&escaped);
            assert_eq!(parser.parse_label(b",;:()[]").unwrap(), label);
        }
    }
}
