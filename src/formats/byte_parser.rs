//! Byte cursor shared by the Newick and Nexus readers.
//!
//! Delimiters are ASCII, so multi-byte UTF-8 sequences inside labels pass
//! through untouched.

use super::{DEFAULT_CONTEXT_LENGTH, ParsingError, ParsingErrorType};

pub struct ByteParser<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteParser<'a> {
    pub fn for_str(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            position: 0,
        }
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    #[inline]
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.bytes.len()
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.position += 1;
            } else {
                break;
            }
        }
    }

    /// Skips a `[...]` comment if one starts here.
    pub fn skip_comment(&mut self) -> Result<bool, ParsingError> {
        if !self.consume_if(b'[') {
            return Ok(false);
        }
        let start = self.position;
        while let Some(b) = self.next_byte() {
            if b == b']' {
                return Ok(true);
            }
        }
        Err(ParsingError::new(
            ParsingErrorType::UnclosedComment,
            start,
            self.context_at(start),
        ))
    }

    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        self.skip_whitespace();
        while self.skip_comment()? {
            self.skip_whitespace();
        }
        Ok(())
    }

    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek()
            .map(|b| b.eq_ignore_ascii_case(&ch))
            .unwrap_or(false)
    }

    pub fn peek_is_sequence(&self, sequence: &[u8]) -> bool {
        let end = self.position + sequence.len();
        end <= self.bytes.len() && self.bytes[self.position..end].eq_ignore_ascii_case(sequence)
    }

    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consumes `word` (case-insensitive) when it is followed by a
    /// non-alphanumeric byte or the end of input.
    pub fn consume_if_word(&mut self, word: &str) -> bool {
        if !self.peek_is_sequence(word.as_bytes()) {
            return false;
        }
        let after = self.bytes.get(self.position + word.len());
        let bounded = after
            .map(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
            .unwrap_or(true);
        if bounded {
            self.position += word.len();
        }
        bounded
    }

    /// Parses a quoted or unquoted label and returns it unescaped.
    ///
    /// Quoted labels keep their content verbatim except for `''`, which
    /// becomes `'`. In unquoted labels `_` stands for a blank.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        if self.peek() == Some(b'\'') {
            return self.parse_quoted_label();
        }
        let start = self.position;
        while let Some(b) = self.peek() {
            if delimiters.contains(&b) {
                break;
            }
            self.position += 1;
        }
        let raw = String::from_utf8_lossy(&self.bytes[start..self.position]);
        Ok(raw.replace('_', " "))
    }

    fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        let start = self.position;
        self.position += 1;
        let mut label = Vec::new();
        loop {
            match self.next_byte() {
                Some(b'\'') => {
                    if self.peek() == Some(b'\'') {
                        self.position += 1;
                        label.push(b'\'');
                    } else {
                        break;
                    }
                }
                Some(b) => label.push(b),
                None => {
                    return Err(ParsingError::new(
                        ParsingErrorType::UnclosedQuote,
                        start,
                        self.context_at(start),
                    ));
                }
            }
        }
        Ok(String::from_utf8_lossy(&label).into_owned())
    }

    /// Skips to just past the next `;` outside quotes and comments.
    pub fn skip_command(&mut self) -> Result<(), ParsingError> {
        loop {
            self.skip_comment_and_whitespace()?;
            match self.peek() {
                None => return Err(self.error(ParsingErrorType::UnexpectedEof)),
                Some(b';') => {
                    self.position += 1;
                    return Ok(());
                }
                Some(b'\'') => {
                    self.parse_quoted_label()?;
                }
                Some(_) => self.position += 1,
            }
        }
    }

    pub fn context(&self) -> String {
        self.context_at(self.position)
    }

    fn context_at(&self, position: usize) -> String {
        let start = position.min(self.bytes.len());
        let end = (start + DEFAULT_CONTEXT_LENGTH).min(self.bytes.len());
        String::from_utf8_lossy(&self.bytes[start..end]).into_owned()
    }

    pub fn error(&self, kind: ParsingErrorType) -> ParsingError {
        ParsingError::new(kind, self.position, self.context())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unescaped() {
        let mut parser = ByteParser::for_str("'Baillon''s Crake',Vespa_crabro:1");
        assert_eq!(parser.parse_label(b",:;").unwrap(), "Baillon's Crake");
        assert!(parser.consume_if(b','));
        assert_eq!(parser.parse_label(b",:;").unwrap(), "Vespa crabro");
    }

    #[test]
    fn comments_are_skipped() {
        let mut parser = ByteParser::for_str("  [a comment] [&R] x");
        parser.skip_comment_and_whitespace().unwrap();
        assert_eq!(parser.peek(), Some(b'x'));
    }

    #[test]
    fn unclosed_comment_is_reported() {
        let mut parser = ByteParser::for_str("[never closed");
        let err = parser.skip_comment_and_whitespace().unwrap_err();
        assert_eq!(err.kind(), &ParsingErrorType::UnclosedComment);
    }

    #[test]
    fn words_respect_boundaries() {
        let mut parser = ByteParser::for_str("ENDBLOCK;");
        assert!(!parser.consume_if_word("end"));
        assert!(parser.consume_if_word("endblock"));
    }
}
