/**
Token-level representation of a tagged document: sentences with their aligned tokens and the
entity spans laid over them.
*/
use crate::align::{align_offsets, byte_offsets, char_slice, reconstruct_text, Token};
use crate::entity::{EntityKind, UnknownEntityKind};
use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum AlignmentError {
    #[error("Token {index} ({token:?}) does not match the sentence text at {start}..{end} (found {found:?})")]
    Misaligned {
        index: usize,
        token: String,
        start: usize,
        end: usize,
        found: Option<String>,
    },
    #[error("The sentence text has {0} unaligned trailing chars")]
    TrailingText(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpanError {
    #[error(transparent)]
    UnknownEntityKind(#[from] UnknownEntityKind),
    #[error("The span {start}..{end} is empty")]
    Empty { start: usize, end: usize },
    #[error("The span {start}..{end} goes past the end of the sentence ({len} tokens)")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("The span {start}..{end} overlaps another span")]
    Overlapping { start: usize, end: usize },
}

/// An entity laid over a contiguous range of tokens. `start_pos` and `end_pos` are the envelope of
/// those tokens in the sentence text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntitySpan {
    kind: EntityKind,
    tokens: Range<usize>,
    start_pos: usize,
    end_pos: usize,
}

impl EntitySpan {
    /// Builds the span over `tokens`, which must be a non-empty valid range of `sentence_tokens`.
    fn over(kind: EntityKind, tokens: Range<usize>, sentence_tokens: &[Token]) -> Self {
        let start_pos = sentence_tokens[tokens.start].start_pos;
        let end_pos = sentence_tokens[tokens.end - 1].end_pos;
        EntitySpan {
            kind,
            tokens,
            start_pos,
            end_pos,
        }
    }
    pub fn kind(&self) -> EntityKind {
        self.kind
    }
    /// Index range of the tokens covered by this span.
    pub fn tokens(&self) -> Range<usize> {
        self.tokens.clone()
    }
    pub fn start_pos(&self) -> usize {
        self.start_pos
    }
    pub fn end_pos(&self) -> usize {
        self.end_pos
    }
}

/// A sentence whose tokens are aligned with its text. It can only be built through
/// [`Sentence::align`] or [`Sentence::from_tokens`], so every token offset is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sentence {
    text: String,
    tokens: Vec<Token>,
    spans: Vec<EntitySpan>,
}

impl Sentence {
    /// Aligns `tokens` against `text` and checks that every token is found where the offsets
    /// say it is. Only whitespace may remain after the last token.
    pub fn align<S: AsRef<str>>(
        text: impl Into<String>,
        tokens: &[S],
    ) -> Result<Self, AlignmentError> {
        let text = text.into();
        let aligned = align_offsets(tokens);
        let offsets = byte_offsets(&text);
        for (index, token) in aligned.iter().enumerate() {
            let found = char_slice(&text, &offsets, token.start_pos, token.end_pos);
            if found != Some(token.text.as_str()) {
                return Err(AlignmentError::Misaligned {
                    index,
                    token: token.text.clone(),
                    start: token.start_pos,
                    end: token.end_pos,
                    found: found.map(String::from),
                });
            }
        }
        let last_end = aligned.last().map(|t| t.end_pos).unwrap_or(0);
        let trailing = &text[offsets[last_end]..];
        if !trailing.chars().all(char::is_whitespace) {
            return Err(AlignmentError::TrailingText(trailing.chars().count()));
        }
        Ok(Sentence {
            text,
            tokens: aligned,
            spans: vec![],
        })
    }

    /// Builds a sentence from its tokens alone; the text is rebuilt from the aligned offsets.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let aligned = align_offsets(tokens);
        let text = reconstruct_text(&aligned);
        Sentence {
            text,
            tokens: aligned,
            spans: vec![],
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
    pub fn spans(&self) -> &[EntitySpan] {
        &self.spans
    }

    /// Lays an entity over the token range `tokens`.
    pub fn add_span(
        &mut self,
        kind: EntityKind,
        tokens: Range<usize>,
    ) -> Result<&EntitySpan, SpanError> {
        let (start, end) = (tokens.start, tokens.end);
        if start >= end {
            return Err(SpanError::Empty { start, end });
        }
        if end > self.tokens.len() {
            return Err(SpanError::OutOfBounds {
                start,
                end,
                len: self.tokens.len(),
            });
        }
        let overlaps = self
            .spans
            .iter()
            .any(|s| s.tokens.start < end && start < s.tokens.end);
        if overlaps {
            return Err(SpanError::Overlapping { start, end });
        }
        self.spans.push(EntitySpan::over(kind, tokens, &self.tokens));
        Ok(&self.spans[self.spans.len() - 1])
    }

    /// Same as [`Sentence::add_span`], with the kind given as written by the tagger.
    pub fn add_tagged_span(
        &mut self,
        tag: &str,
        tokens: Range<usize>,
    ) -> Result<&EntitySpan, SpanError> {
        let kind: EntityKind = tag.parse()?;
        self.add_span(kind, tokens)
    }

    /// Returns a copy of this sentence where the text of every token is replaced by the matching
    /// element of `texts`. Whitespace between tokens is kept as is and the offsets of the tokens
    /// and spans are recomputed.
    pub(crate) fn with_token_texts(&self, texts: Vec<String>) -> Sentence {
        let offsets = byte_offsets(&self.text);
        let byte_at = |pos: usize| offsets.get(pos).copied().unwrap_or(self.text.len());
        let mut text = String::with_capacity(self.text.len());
        let mut tokens = Vec::with_capacity(self.tokens.len());
        let mut cursor = 0;
        let mut new_pos = 0;
        for (token, replacement) in self.tokens.iter().zip(texts) {
            let gap = &self.text[byte_at(cursor)..byte_at(token.start_pos)];
            text.push_str(gap);
            new_pos += gap.chars().count();
            text.push_str(&replacement);
            let new_token = Token::new(replacement, new_pos);
            new_pos = new_token.end_pos;
            tokens.push(new_token);
            cursor = token.end_pos;
        }
        text.push_str(&self.text[byte_at(cursor)..]);
        let spans = self
            .spans
            .iter()
            .map(|s| EntitySpan::over(s.kind, s.tokens.clone(), &tokens))
            .collect();
        Sentence {
            text,
            tokens,
            spans,
        }
    }
}

/// A document is an ordered list of sentences. A sentence that could not be aligned is kept with
/// its error so the rest of the document can still be rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sentences: Vec<Result<Sentence, AlignmentError>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sentence: Sentence) {
        self.sentences.push(Ok(sentence))
    }

    /// Aligns the sentence and records the outcome, whatever it is.
    pub fn push_aligned<S: AsRef<str>>(
        &mut self,
        text: impl Into<String>,
        tokens: &[S],
    ) -> Result<&mut Sentence, &AlignmentError> {
        self.sentences.push(Sentence::align(text, tokens));
        match self.sentences.last_mut() {
            Some(Ok(sentence)) => Ok(sentence),
            Some(Err(e)) => Err(e),
            None => unreachable!("a sentence was just pushed"),
        }
    }

    pub fn sentences(&self) -> &[Result<Sentence, AlignmentError>] {
        &self.sentences
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

impl FromIterator<Sentence> for Document {
    fn from_iter<T: IntoIterator<Item = Sentence>>(iter: T) -> Self {
        Document {
            sentences: iter.into_iter().map(Ok).collect(),
        }
    }
}

impl FromIterator<Result<Sentence, AlignmentError>> for Document {
    fn from_iter<T: IntoIterator<Item = Result<Sentence, AlignmentError>>>(iter: T) -> Self {
        Document {
            sentences: iter.into_iter().collect(),
        }
    }
}
