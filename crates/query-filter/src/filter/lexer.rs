//! Quote-aware splitter for filter strings.

use crate::error::{FilterError, FilterResult, SyntaxErrorKind};

/// A comma-delimited piece of a filter string with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece<'a> {
    /// The raw text of the piece, untrimmed, quotes included.
    pub text: &'a str,
    /// The byte position where the piece starts (0-indexed).
    pub position: usize,
}

impl Piece<'_> {
    /// Returns true if the trimmed piece opens with a quote character.
    pub fn starts_quoted(&self) -> bool {
        self.text.trim_start().starts_with(['"', '\''])
    }
}

/// Splits filter text on commas that are outside quoted values.
///
/// A quote only opens a quoted run at the start of a value or list item,
/// that is, right after the start of input, a `,` or an `=` (ignoring
/// whitespace). Inside a quoted run a backslash escapes the next character;
/// the escape is kept verbatim.
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Splits the input into pieces.
    ///
    /// # Errors
    ///
    /// Returns a `SyntaxErrorKind::UnterminatedQuote` error if a quoted run
    /// is never closed.
    pub fn split(&self) -> FilterResult<Vec<Piece<'a>>> {
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut at_item_start = true;
        let mut chars = self.input.char_indices();

        while let Some((pos, c)) = chars.next() {
            match c {
                ',' => {
                    pieces.push(self.piece(start, pos));
                    start = pos + 1;
                    at_item_start = true;
                }
                '=' => at_item_start = true,
                '"' | '\'' if at_item_start => {
                    let mut closed = false;
                    while let Some((_, inner)) = chars.next() {
                        if inner == '\\' {
                            chars.next();
                        } else if inner == c {
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(FilterError::syntax(
                            SyntaxErrorKind::UnterminatedQuote(pos),
                            &self.input[start..],
                        ));
                    }
                    at_item_start = false;
                }
                c if c.is_whitespace() => {}
                _ => at_item_start = false,
            }
        }
        pieces.push(self.piece(start, self.input.len()));

        Ok(pieces)
    }

    fn piece(&self, start: usize, end: usize) -> Piece<'a> {
        Piece {
            text: &self.input[start..end],
            position: start,
        }
    }
}

/// Returns the text between matching outer quotes, if `token` is quoted.
pub fn unquote(token: &str) -> Option<&str> {
    let mut chars = token.chars();
    let first = chars.next()?;
    let last = chars.next_back()?;
    if matches!(first, '"' | '\'') && first == last {
        Some(&token[1..token.len() - 1])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<&str> {
        Lexer::new(input)
            .split()
            .unwrap()
            .into_iter()
            .map(|p| p.text)
            .collect()
    }

    #[test]
    fn test_split_simple() {
        assert_eq!(
            texts("status__eq=active,age__gt=18"),
            vec!["status__eq=active", "age__gt=18"]
        );
    }

    #[test]
    fn test_split_positions() {
        let pieces = Lexer::new("a__eq=1, b__eq=2").split().unwrap();
        assert_eq!(pieces[0].position, 0);
        assert_eq!(pieces[1].position, 8);
        assert_eq!(pieces[1].text, " b__eq=2");
    }

    #[test]
    fn test_commas_inside_quotes_are_kept() {
        assert_eq!(
            texts(r#"name__eq="Doe, John",age__gt=1"#),
            vec![r#"name__eq="Doe, John""#, "age__gt=1"]
        );
        assert_eq!(
            texts("name__in='a,b','c'"),
            vec!["name__in='a,b'", "'c'"]
        );
    }

    #[test]
    fn test_escaped_quote_does_not_close() {
        assert_eq!(
            texts(r#"name__eq="John \"Doe\"",x__eq=1"#),
            vec![r#"name__eq="John \"Doe\"""#, "x__eq=1"]
        );
    }

    #[test]
    fn test_apostrophe_inside_unquoted_value_is_literal() {
        assert_eq!(
            texts("name__eq=O'Brien,age__gt=3"),
            vec!["name__eq=O'Brien", "age__gt=3"]
        );
    }

    #[test]
    fn test_quote_after_whitespace_opens_run() {
        assert_eq!(texts(r#"name__eq= "a,b""#), vec![r#"name__eq= "a,b""#]);
    }

    #[test]
    fn test_unterminated_quote() {
        let err = Lexer::new(r#"name__eq="John"#).split().unwrap_err();
        assert_eq!(
            err,
            FilterError::syntax(SyntaxErrorKind::UnterminatedQuote(9), r#"name__eq="John"#)
        );
    }

    #[test]
    fn test_empty_input_yields_one_empty_piece() {
        assert_eq!(texts(""), vec![""]);
        assert_eq!(texts("a__eq=1,"), vec!["a__eq=1", ""]);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""abc""#), Some("abc"));
        assert_eq!(unquote("'a\"b'"), Some("a\"b"));
        assert_eq!(unquote(r#""""#), Some(""));
        assert_eq!(unquote("\"abc'"), None);
        assert_eq!(unquote("\""), None);
        assert_eq!(unquote("abc"), None);
    }

    #[test]
    fn test_starts_quoted() {
        let piece = Piece { text: "  'x'", position: 0 };
        assert!(piece.starts_quoted());
        let piece = Piece { text: "x'", position: 0 };
        assert!(!piece.starts_quoted());
    }
}
