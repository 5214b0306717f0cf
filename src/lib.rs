/*!
Core of a pseudonymization demo: it turns the output of a named entity tagger back into
highlighted text and measures the errors of the tagger on annotated files.

# Rendering
The pseudonymization service answers with a tagged markup, one `<sentence>` per sentence and one
element per entity (`<PER_NOM>`, `<LOC>`, ...). [`render_tagged_text`] parses it into plain and
entity segments. Token-level predictions (such as a CoNLL dump, see [`read_conll`]) are rendered
with [`render_document`] once the offsets of the tokens are recovered by [`Sentence::align`] or
[`Sentence::from_tokens`]. [`render_redacted_document`] first replaces addresses by a placeholder
and names by pseudonyms (`A…`, `B…`, ..., `AB…`, ...).

In every case, the segments of a sentence concatenate back to the exact sentence text.

# Errors of the tagger
An evaluation file lists `token\ttrue_tag\tpred_tag`. [`evaluate_batch`] classifies every token
as correct, under (an entity predicted as `O`), miss (an entity predicted as another entity, also
counted as under) or over (an `O` predicted as an entity) and counts them per file.

# Terminology
* A token is a word or a punctuation mark, with its char offsets in the text of its sentence.
* An entity kind is one of `PER_PRENOM`, `PER_NOM`, `LOC`, `PER` and `ORG`. Any other tag is an
    error.
* A span is a contiguous range of tokens tagged with an entity kind.
*/

mod align;
mod classify;
mod config;
mod conll;
mod document;
mod entity;
mod html;
mod pseudonym;
mod render;
mod reporter;
mod tagged;

pub use align::{align_offsets, attaches_to_previous, reconstruct_text, Token};
pub use classify::{
    classify, display_col, evaluate_batch, evaluate_rows, parse_evaluation, BatchEvaluation,
    Classification, DisplayRow, EvalError, EvalRow, FileEvaluation, FileFailure, FileStats,
    TaggedToken, OUTSIDE_TAG,
};
pub use config::{RenderConfig, RenderConfigBuilder, DEFAULT_ADDRESS_PLACEHOLDER};
pub use conll::{read_conll, ConllError};
pub use document::{AlignmentError, Document, EntitySpan, Sentence, SpanError};
pub use entity::{get_chunks_lenient, Chunk, ChunkError, EntityKind, UnknownEntityKind};
pub use html::{
    document_to_html, evaluation_to_html, legend_html, pseudonymized_to_html, sentence_to_html,
};
pub use pseudonym::{pool_size, PseudonymMemo, PseudonymPoolExhausted, DEFAULT_PSEUDONYM_SUFFIX};
pub use render::{
    redact_document, redact_sentence, render_document, render_redacted_document,
    render_sentence, render_tagged_document, render_tagged_text, RenderError, RenderedDocument,
    RenderedSentence, Segment,
};
pub use reporter::StatsReporter;
pub use tagged::{TaggedDocument, TaggedNode, TaggedSentence};
