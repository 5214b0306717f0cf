/**
Recovers the character offsets of a tokenized sentence.

The tagger returns tokens without their position in the original text. Offsets are rebuilt by
assuming a single whitespace between tokens, except for the few tokens that are glued to the
previous one (`.`, `,`, elisions such as `l'` and degree marks). Texts using several spaces or
tabs between tokens are not supported and are reported as misaligned by [`Sentence::align`].

[`Sentence::align`]: crate::Sentence::align
*/
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Tokens made of at most one word char followed by an opening parenthesis, an apostrophe or a
/// degree mark.
static ATTACHED_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w?[('°]$").expect("the attached token pattern is valid"));

/// A token and its half-open char offsets in the text of its sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    pub(crate) text: String,
    pub(crate) start_pos: usize,
    pub(crate) end_pos: usize,
}

impl Token {
    pub(crate) fn new(text: String, start_pos: usize) -> Self {
        let end_pos = start_pos + text.chars().count();
        Token {
            text,
            start_pos,
            end_pos,
        }
    }
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn start_pos(&self) -> usize {
        self.start_pos
    }
    pub fn end_pos(&self) -> usize {
        self.end_pos
    }
}

/// Returns true if the token is written directly after the previous one, without a space.
pub fn attaches_to_previous(token: &str) -> bool {
    token == "." || token == "," || ATTACHED_TOKEN.is_match(token)
}

/// Assigns offsets to a sequence of tokens. The first token starts at 0; the others start one
/// char after the end of the previous token, or right at its end when they attach to it.
pub fn align_offsets<S: AsRef<str>>(tokens: &[S]) -> Vec<Token> {
    let mut aligned: Vec<Token> = Vec::with_capacity(tokens.len());
    for raw in tokens {
        let text = raw.as_ref();
        let start_pos = match aligned.last() {
            None => 0,
            Some(prev) if attaches_to_previous(text) => prev.end_pos,
            Some(prev) => prev.end_pos + 1,
        };
        aligned.push(Token::new(String::from(text), start_pos));
    }
    aligned
}

/// Rebuilds the text implied by the offsets of `tokens`. Gaps are filled with single spaces.
pub fn reconstruct_text(tokens: &[Token]) -> String {
    let mut text = String::new();
    let mut cursor = 0;
    for token in tokens {
        for _ in cursor..token.start_pos {
            text.push(' ');
        }
        text.push_str(&token.text);
        cursor = token.end_pos;
    }
    text
}

/// Byte offset of every char of `text`, plus `text.len()` for the end position.
pub(crate) fn byte_offsets(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}

/// Slices `text` with char offsets. Returns `None` when the range falls outside the text.
pub(crate) fn char_slice<'a>(
    text: &'a str,
    offsets: &[usize],
    start: usize,
    end: usize,
) -> Option<&'a str> {
    if start > end {
        return None;
    }
    let start_byte = *offsets.get(start)?;
    let end_byte = *offsets.get(end)?;
    text.get(start_byte..end_byte)
}
