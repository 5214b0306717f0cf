/**
Lenient chunking of BIO-style tag sequences into token ranges. It accepts the usual prefixes
(`B`, `I`, `O`, `E`, `S`, `U`, `L`) and never checks the validity of a transition: an `I-` tag
following an `O` simply starts a new chunk.
*/
use std::iter::Chain;
use std::iter::Once;
use std::ops::Range;
use std::slice::Iter;
use thiserror::Error;

#[derive(Debug, PartialEq, Hash, Clone, Copy, Eq)]
/// Prefixes that can be supplied in front of a tag. All of them are a single char.
enum UserPrefix {
    I,
    O,
    B,
    E,
    S,
    U,
    L,
}

impl TryFrom<char> for UserPrefix {
    type Error = ChunkError;
    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'I' => Ok(Self::I),
            'O' => Ok(Self::O),
            'B' => Ok(Self::B),
            'E' => Ok(Self::E),
            'S' => Ok(Self::S),
            'U' => Ok(Self::U),
            'L' => Ok(Self::L),
            _ => Err(ChunkError::PrefixError(String::from(value))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("Could not parse the following string into a Prefix: {0}")]
    PrefixError(String),
    #[error("Received an empty tag")]
    EmptyTag,
}

/// A tag split into its prefix and its entity type, such as `B` and `PER`.
#[derive(Debug, PartialEq)]
struct InnerTag<'a> {
    prefix: UserPrefix,
    kind: &'a str,
}

impl<'a> InnerTag<'a> {
    fn try_new(tag: &'a str, delimiter: char) -> Result<Self, ChunkError> {
        let first = tag.chars().next().ok_or(ChunkError::EmptyTag)?;
        let prefix = UserPrefix::try_from(first).map_err(|_| ChunkError::PrefixError(tag.into()))?;
        let rest = &tag[first.len_utf8()..];
        let kind = rest.strip_prefix(delimiter).unwrap_or(rest);
        Ok(InnerTag { prefix, kind })
    }
}

/// A contiguous run of tokens sharing one entity type. `tokens` is half-open.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chunk<'a> {
    pub kind: &'a str,
    pub tokens: Range<usize>,
}

/// Leniently retrieves the chunks of a single sequence of tags.
///
/// * `tags`: One tag per token, such as `["B-PER", "I-PER", "O"]`.
/// * `delimiter`: Char separating the prefix from the entity type.
pub fn get_chunks_lenient<'a>(
    tags: &'a [&'a str],
    delimiter: char,
) -> Result<Vec<Chunk<'a>>, ChunkError> {
    LenientChunkIter::new(tags, delimiter).collect()
}

/// This struct iterates over a *single* sequence and returns the chunks associated with it. A
/// trailing `"O"` is appended so the last chunk is always closed.
struct LenientChunkIter<'a> {
    inner: Chain<Iter<'a, &'a str>, Once<&'a &'a str>>,
    /// The prefix of the previous tag (e.g. 'I')
    prev_prefix: UserPrefix,
    /// The type of the previous tag (e.g. `"PER"`)
    prev_type: Option<&'a str>,
    begin_offset: usize,
    delimiter: char,
    index: usize,
}

impl<'a> LenientChunkIter<'a> {
    fn new(tags: &'a [&'a str], delimiter: char) -> Self {
        LenientChunkIter {
            inner: tags.iter().chain(std::iter::once(&"O")),
            prev_prefix: UserPrefix::O,
            prev_type: None,
            begin_offset: 0,
            delimiter,
            index: 0,
        }
    }

    /// Checks if a chunk ended between the previous and current tag.
    fn end_of_chunk(&self, current_prefix: UserPrefix, current_type: &str) -> bool {
        match (self.prev_prefix, current_prefix) {
            (UserPrefix::E, _) => true,
            (UserPrefix::S, _) => true,
            (UserPrefix::U, _) => true,
            (UserPrefix::L, _) => true,
            (UserPrefix::B, UserPrefix::B) => true,
            (UserPrefix::B, UserPrefix::S) => true,
            (UserPrefix::B, UserPrefix::O) => true,
            (UserPrefix::I, UserPrefix::B) => true,
            (UserPrefix::I, UserPrefix::S) => true,
            (UserPrefix::I, UserPrefix::O) => true,
            (prev_prefix, _) => {
                !matches!(prev_prefix, UserPrefix::O) && self.prev_type != Some(current_type)
            }
        }
    }

    /// Checks if a chunk started between the previous and current tag.
    fn start_of_chunk(&self, current_prefix: UserPrefix, current_type: &str) -> bool {
        match (self.prev_prefix, current_prefix) {
            (_, UserPrefix::B) => true,
            (_, UserPrefix::S) => true,
            (_, UserPrefix::U) => true,
            (UserPrefix::E, UserPrefix::E) => true,
            (UserPrefix::E, UserPrefix::I) => true,
            (UserPrefix::S, UserPrefix::E) => true,
            (UserPrefix::S, UserPrefix::I) => true,
            (UserPrefix::O, UserPrefix::E) => true,
            (UserPrefix::O, UserPrefix::I) => true,
            (_, curr_prefix) => {
                !matches!(curr_prefix, UserPrefix::O) && self.prev_type != Some(current_type)
            }
        }
    }
}

impl<'a> Iterator for LenientChunkIter<'a> {
    type Item = Result<Chunk<'a>, ChunkError>;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.inner.next()?; // no more tags. We are done
            let tag = match InnerTag::try_new(current, self.delimiter) {
                Ok(v) => v,
                Err(e) => {
                    self.index += 1;
                    return Some(Err(e));
                }
            };
            let ended = if self.end_of_chunk(tag.prefix, tag.kind) {
                self.prev_type.map(|kind| Chunk {
                    kind,
                    tokens: self.begin_offset..self.index,
                })
            } else {
                None
            };
            if self.start_of_chunk(tag.prefix, tag.kind) {
                self.begin_offset = self.index;
            }
            self.prev_prefix = tag.prefix;
            self.prev_type = Some(tag.kind);
            self.index += 1;
            if let Some(chunk) = ended {
                return Some(Ok(chunk));
            }
        }
    }
}
