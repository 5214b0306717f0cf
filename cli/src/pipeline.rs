use crate::cache::ContentCache;
use anyhow::{Context, Result};
use nerview::{
    document_to_html, legend_html, pseudonymized_to_html, read_conll, render_document,
    render_redacted_document, render_tagged_text, Document, RenderConfig, RenderedDocument,
};
use pseudo_io::{DocumentIngestor, Pseudonymizer, Tagger};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// What the user sees after an upload: the highlighted document and its pseudonymized version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutput {
    pub tagged: RenderedDocument,
    pub pseudo_text: String,
}

impl UploadOutput {
    pub fn to_html(&self) -> String {
        format!(
            "<section class=\"tagged\">\n{}\n{}\n</section>\n<section class=\"pseudo\">\n{}\n</section>\n",
            legend_html(),
            document_to_html(&self.tagged),
            pseudonymized_to_html(&self.pseudo_text)
        )
    }
}

/// Upload pipeline: ingestion, tagging and rendering. Identical contents are only processed once.
pub struct Pipeline<'a> {
    tagger: &'a dyn Tagger,
    ingestor: &'a dyn DocumentIngestor,
    cache: ContentCache<UploadOutput>,
}

impl<'a> Pipeline<'a> {
    pub fn new(tagger: &'a dyn Tagger, ingestor: &'a dyn DocumentIngestor) -> Self {
        Pipeline {
            tagger,
            ingestor,
            cache: ContentCache::default(),
        }
    }

    pub fn process_text(&mut self, text: &str) -> Result<UploadOutput> {
        let tagger = self.tagger;
        self.cache
            .get_or_try_insert_with(text.as_bytes(), || tag_and_render(tagger, text))
    }

    pub fn process_file(&mut self, path: &Path) -> Result<UploadOutput> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
        let (tagger, ingestor) = (self.tagger, self.ingestor);
        self.cache.get_or_try_insert_with(&bytes, || {
            let text = ingestor
                .extract_text(path)
                .with_context(|| format!("Cannot extract the text of {}", path.display()))?;
            info!("Extracted {} chars from {}", text.chars().count(), path.display());
            tag_and_render(tagger, &text)
        })
    }

    pub fn cache_hits(&self) -> usize {
        self.cache.hits()
    }

    pub fn cached_documents(&self) -> usize {
        self.cache.len()
    }
}

fn tag_and_render(tagger: &dyn Tagger, text: &str) -> Result<UploadOutput> {
    let prediction = tagger.tag(text)?;
    let tagged = render_tagged_text(&prediction.tagged_text)?;
    debug!("{} entities found", tagged.entity_count());
    Ok(UploadOutput {
        tagged,
        pseudo_text: prediction.pseudo_text,
    })
}

/// Pseudonymized text of a document, without the entity highlighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PseudoOutput {
    pub file: String,
    pub pseudo_text: String,
}

pub fn pseudonymize_file(
    pseudonymizer: &dyn Pseudonymizer,
    ingestor: &dyn DocumentIngestor,
    path: &Path,
) -> Result<PseudoOutput> {
    let text = ingestor
        .extract_text(path)
        .with_context(|| format!("Cannot extract the text of {}", path.display()))?;
    let pseudo_text = pseudonymizer
        .pseudonymize(&text)
        .with_context(|| format!("Cannot pseudonymize {}", path.display()))?;
    Ok(PseudoOutput {
        file: path.display().to_string(),
        pseudo_text,
    })
}

/// A sentence of a JSON lines prediction dump. Spans are half-open token ranges.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonlRecord {
    pub text: String,
    pub tokens: Vec<String>,
    #[serde(default)]
    pub spans: Vec<JsonlSpan>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonlSpan {
    pub start: usize,
    pub end: usize,
    pub kind: String,
}

/// Builds a document from JSON lines records. Misaligned sentences are kept so they can be
/// rendered empty, a bad span is an error.
pub fn document_from_records<I>(records: I) -> Result<Document>
where
    I: IntoIterator<Item = JsonlRecord>,
{
    let mut document = Document::new();
    for (i, record) in records.into_iter().enumerate() {
        if let Ok(sentence) = document.push_aligned(record.text, &record.tokens) {
            for span in record.spans {
                sentence
                    .add_tagged_span(&span.kind, span.start..span.end)
                    .with_context(|| format!("Invalid span in record {}", i + 1))?;
            }
        }
    }
    Ok(document)
}

pub fn render_with(
    document: &Document,
    redact: bool,
    config: &RenderConfig,
) -> Result<RenderedDocument> {
    if redact {
        Ok(render_redacted_document(document, config)?)
    } else {
        Ok(render_document(document))
    }
}

pub fn render_conll(
    content: &str,
    column: usize,
    redact: bool,
    config: &RenderConfig,
) -> Result<RenderedDocument> {
    let document = read_conll(content, column)?;
    render_with(&document, redact, config)
}
