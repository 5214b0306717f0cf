/**
Reader for CoNLL-like prediction dumps: one token per line with its tags in whitespace separated
columns, and a blank line between sentences. The text of every sentence is rebuilt from its tokens
and the BIO tags of the selected column become entity spans.
*/
use crate::document::{Document, Sentence, SpanError};
use crate::entity::{get_chunks_lenient, ChunkError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConllError {
    #[error("Line {line} has no column {column}")]
    MissingColumn { line: usize, column: usize },
    #[error("Sentence ending at line {line}: {source}")]
    Chunk { line: usize, source: ChunkError },
    #[error("Sentence ending at line {line}: {source}")]
    Span { line: usize, source: SpanError },
}

/// Reads `content`, using `column` (0 is the token itself) as the tag column.
pub fn read_conll(content: &str, column: usize) -> Result<Document, ConllError> {
    let mut document = Document::new();
    let mut tokens: Vec<&str> = vec![];
    let mut tags: Vec<&str> = vec![];
    let mut last_line = 0;
    for (i, line) in content.lines().enumerate() {
        last_line = i + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            flush_sentence(&mut document, &mut tokens, &mut tags, last_line)?;
            continue;
        }
        let tag = fields.get(column).ok_or(ConllError::MissingColumn {
            line: last_line,
            column,
        })?;
        tokens.push(fields[0]);
        tags.push(*tag);
    }
    flush_sentence(&mut document, &mut tokens, &mut tags, last_line)?;
    debug!("Read {} CoNLL sentences", document.len());
    Ok(document)
}

fn flush_sentence(
    document: &mut Document,
    tokens: &mut Vec<&str>,
    tags: &mut Vec<&str>,
    line: usize,
) -> Result<(), ConllError> {
    if tokens.is_empty() {
        return Ok(());
    }
    let mut sentence = Sentence::from_tokens(tokens.as_slice());
    let chunks = get_chunks_lenient(tags.as_slice(), '-')
        .map_err(|source| ConllError::Chunk { line, source })?;
    for chunk in chunks {
        sentence
            .add_tagged_span(chunk.kind, chunk.tokens)
            .map_err(|source| ConllError::Span { line, source })?;
    }
    document.push(sentence);
    tokens.clear();
    tags.clear();
    Ok(())
}
