//! Decoder for the `options` column: a bracketed list of quoted strings,
//! e.g. `["TCP", "UDP"]` or `['TCP', 'UDP',]`.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("expected `[` at start of list")]
    MissingOpenBracket,
    #[error("expected a quoted string at offset {0}")]
    ExpectedString(usize),
    #[error("expected `,` or `]` at offset {0}")]
    ExpectedSeparator(usize),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("list is not closed with `]`")]
    UnterminatedList,
    #[error("unexpected input after list at offset {0}")]
    TrailingInput(usize),
}

type Cursor<'a> = Peekable<CharIndices<'a>>;

/// Parses a list literal whose elements must all be quoted strings.
///
/// # Errors
///
/// Returns `LiteralError` on any syntax error or non-string element.
pub fn parse_string_list(input: &str) -> Result<Vec<String>, LiteralError> {
    let mut cursor = input.trim().char_indices().peekable();
    if !matches!(cursor.next(), Some((_, '['))) {
        return Err(LiteralError::MissingOpenBracket);
    }

    let mut items = Vec::new();
    loop {
        skip_whitespace(&mut cursor);
        match cursor.next() {
            Some((_, ']')) => break,
            Some((_, quote @ ('"' | '\''))) => items.push(read_quoted(&mut cursor, quote)?),
            Some((offset, _)) => return Err(LiteralError::ExpectedString(offset)),
            None => return Err(LiteralError::UnterminatedList),
        }

        skip_whitespace(&mut cursor);
        match cursor.next() {
            Some((_, ',')) => {}
            Some((_, ']')) => break,
            Some((offset, _)) => return Err(LiteralError::ExpectedSeparator(offset)),
            None => return Err(LiteralError::UnterminatedList),
        }
    }

    skip_whitespace(&mut cursor);
    if let Some((offset, _)) = cursor.next() {
        return Err(LiteralError::TrailingInput(offset));
    }
    Ok(items)
}

fn skip_whitespace(cursor: &mut Cursor<'_>) {
    while cursor.next_if(|(_, c)| c.is_whitespace()).is_some() {}
}

fn read_quoted(cursor: &mut Cursor<'_>, quote: char) -> Result<String, LiteralError> {
    let mut out = String::new();
    loop {
        match cursor.next() {
            None => return Err(LiteralError::UnterminatedString),
            Some((_, c)) if c == quote => return Ok(out),
            Some((_, '\\')) => match cursor.next() {
                None => return Err(LiteralError::UnterminatedString),
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, c @ ('\\' | '\'' | '"'))) => out.push(c),
                // unknown escapes are kept verbatim
                Some((_, other)) => {
                    out.push('\\');
                    out.push(other);
                }
            },
            Some((_, c)) => out.push(c),
        }
    }
}
