/**
Turns tagged sentences into display segments.

Two input shapes are supported: the tagged markup returned by the pseudonymization service
([`render_tagged_text`]) and sentences carrying token-level spans ([`render_document`]). In both
cases the concatenation of the segments of a sentence is exactly the sentence text.
*/
use crate::align::byte_offsets;
use crate::config::RenderConfig;
use crate::document::{AlignmentError, Document, Sentence};
use crate::entity::{EntityKind, UnknownEntityKind};
use crate::pseudonym::{PseudonymMemo, PseudonymPoolExhausted};
use crate::tagged::{TaggedDocument, TaggedNode, TaggedSentence};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error(transparent)]
    UnknownEntityKind(#[from] UnknownEntityKind),
    #[error("The tagged text could not be parsed: {0}")]
    MalformedTaggedText(String),
    #[error(transparent)]
    PseudonymPoolExhausted(#[from] PseudonymPoolExhausted),
}

/// A piece of a rendered sentence. `span_index` numbers the entities of a whole document, in
/// reading order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Plain {
        text: String,
    },
    Entity {
        text: String,
        kind: EntityKind,
        span_index: usize,
    },
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text } => text,
            Self::Entity { text, .. } => text,
        }
    }
    /// Display label of the entity, `None` for plain text.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Plain { .. } => None,
            Self::Entity { kind, .. } => Some(kind.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RenderedSentence {
    pub segments: Vec<Segment>,
}

impl RenderedSentence {
    pub fn text(&self) -> String {
        self.segments.iter().map(Segment::text).collect()
    }
    pub fn entities(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Entity { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RenderedDocument {
    pub sentences: Vec<RenderedSentence>,
}

impl RenderedDocument {
    pub fn entity_count(&self) -> usize {
        self.sentences.iter().map(|s| s.entities().count()).sum()
    }
}

/// Accumulates the segments of one sentence. Consecutive plain texts are merged and empty plain
/// texts are skipped.
struct SegmentsBuilder<'a> {
    segments: Vec<Segment>,
    next_span: &'a mut usize,
}

impl<'a> SegmentsBuilder<'a> {
    fn new(next_span: &'a mut usize) -> Self {
        SegmentsBuilder {
            segments: vec![],
            next_span,
        }
    }

    fn plain(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Plain { text: last }) => last.push_str(text),
            _ => self.segments.push(Segment::Plain {
                text: String::from(text),
            }),
        }
    }

    fn entity(&mut self, text: &str, kind: EntityKind) {
        self.segments.push(Segment::Entity {
            text: String::from(text),
            kind,
            span_index: *self.next_span,
        });
        *self.next_span += 1;
    }

    fn finish(mut self) -> RenderedSentence {
        if self.segments.is_empty() {
            self.segments.push(Segment::Plain {
                text: String::new(),
            });
        }
        RenderedSentence {
            segments: self.segments,
        }
    }
}

/// Parses and renders the tagged text returned by the service.
pub fn render_tagged_text(tagged: &str) -> Result<RenderedDocument, RenderError> {
    let document: TaggedDocument = tagged.parse()?;
    Ok(render_tagged_document(&document))
}

pub fn render_tagged_document(document: &TaggedDocument) -> RenderedDocument {
    let mut next_span = 0;
    let sentences = document
        .sentences
        .iter()
        .map(|sentence| render_tagged_sentence(sentence, &mut next_span))
        .collect();
    RenderedDocument { sentences }
}

fn render_tagged_sentence(sentence: &TaggedSentence, next_span: &mut usize) -> RenderedSentence {
    let mut builder = SegmentsBuilder::new(next_span);
    for node in sentence.nodes.iter() {
        match node {
            TaggedNode::Plain(text) => builder.plain(text),
            TaggedNode::Entity { kind, text } => builder.entity(text, *kind),
        }
    }
    builder.finish()
}

/// Renders a single sentence. Its entities are numbered from 0.
pub fn render_sentence(sentence: &Sentence) -> RenderedSentence {
    let mut next_span = 0;
    render_spans(sentence, &mut next_span)
}

fn render_spans(sentence: &Sentence, next_span: &mut usize) -> RenderedSentence {
    let text = sentence.text();
    let offsets = byte_offsets(text);
    let byte_at = |pos: usize| offsets.get(pos).copied().unwrap_or(text.len());
    let mut spans: Vec<_> = sentence.spans().iter().collect();
    spans.sort_by_key(|s| s.start_pos());
    let mut builder = SegmentsBuilder::new(next_span);
    let mut cursor = 0;
    for span in spans {
        builder.plain(&text[byte_at(cursor)..byte_at(span.start_pos())]);
        builder.entity(
            &text[byte_at(span.start_pos())..byte_at(span.end_pos())],
            span.kind(),
        );
        cursor = span.end_pos();
    }
    builder.plain(&text[byte_at(cursor)..]);
    builder.finish()
}

/// Renders every sentence of `document`. A sentence that could not be aligned is rendered empty.
pub fn render_document(document: &Document) -> RenderedDocument {
    let mut next_span = 0;
    let sentences = document
        .sentences()
        .iter()
        .enumerate()
        .map(|(i, sentence)| match sentence {
            Ok(sentence) => render_spans(sentence, &mut next_span),
            Err(e) => {
                warn!("Sentence {} is rendered empty: {}", i, e);
                SegmentsBuilder::new(&mut next_span).finish()
            }
        })
        .collect();
    debug!("Rendered {} sentences", document.len());
    RenderedDocument { sentences }
}

/// Replaces the tokens of every entity of `sentence`: address tokens become the placeholder,
/// other tokens become pseudonyms taken from `memo`.
pub fn redact_sentence(
    sentence: &Sentence,
    memo: &mut PseudonymMemo,
    config: &RenderConfig,
) -> Result<Sentence, RenderError> {
    let mut texts: Vec<String> = sentence
        .tokens()
        .iter()
        .map(|t| String::from(t.text()))
        .collect();
    for span in sentence.spans() {
        for index in span.tokens() {
            texts[index] = if span.kind().is_address() {
                String::from(config.address_placeholder())
            } else {
                memo.pseudonym_for(sentence.tokens()[index].text())?
            };
        }
    }
    Ok(sentence.with_token_texts(texts))
}

/// Redacts a whole document with a single pseudonym memo. Misaligned sentences are kept as is.
pub fn redact_document(
    document: &Document,
    config: &RenderConfig,
) -> Result<Document, RenderError> {
    let mut memo = PseudonymMemo::new(config.pseudonym_suffix());
    let sentences = document
        .sentences()
        .iter()
        .map(|sentence| match sentence {
            Ok(sentence) => redact_sentence(sentence, &mut memo, config).map(Ok),
            Err(e) => Ok(Err(e.clone())),
        })
        .collect::<Result<Vec<Result<Sentence, AlignmentError>>, RenderError>>()?;
    debug!("Assigned {} pseudonyms", memo.len());
    Ok(sentences.into_iter().collect())
}

pub fn render_redacted_document(
    document: &Document,
    config: &RenderConfig,
) -> Result<RenderedDocument, RenderError> {
    Ok(render_document(&redact_document(document, config)?))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::RenderConfigBuilder;
    use quickcheck::TestResult;

    fn plain(text: &str) -> Segment {
        Segment::Plain {
            text: String::from(text),
        }
    }

    fn entity(text: &str, kind: EntityKind, span_index: usize) -> Segment {
        Segment::Entity {
            text: String::from(text),
            kind,
            span_index,
        }
    }

    #[test]
    fn test_render_tagged_text() {
        let tagged = "<root><sentence><a>Monsieur </a><PER_NOM>Dupont</PER_NOM><a> habite </a>\
                      <a>à </a><LOC>Lyon</LOC></sentence><sentence><a>M. </a>\
                      <PER_NOM>Martin</PER_NOM></sentence></root>";
        let rendered = render_tagged_text(tagged).unwrap();
        assert_eq!(
            rendered.sentences[0].segments,
            vec![
                plain("Monsieur "),
                entity("Dupont", EntityKind::PerNom, 0),
                plain(" habite à "),
                entity("Lyon", EntityKind::Loc, 1),
            ]
        );
        assert_eq!(
            rendered.sentences[1].segments,
            vec![plain("M. "), entity("Martin", EntityKind::PerNom, 2)]
        );
        assert_eq!(rendered.entity_count(), 3);
        assert_eq!(rendered.sentences[0].segments[3].label(), Some("ADRESSE"));
    }

    #[test]
    fn test_render_tagged_text_errors() {
        assert_eq!(render_tagged_text(""), Ok(RenderedDocument::default()));
        let unknown = render_tagged_text("<root><sentence><XYZ>a</XYZ></sentence></root>");
        assert_eq!(
            unknown,
            Err(RenderError::UnknownEntityKind(UnknownEntityKind(
                String::from("XYZ")
            )))
        );
        assert!(matches!(
            render_tagged_text("<root><sentence>"),
            Err(RenderError::MalformedTaggedText(_))
        ));
    }

    #[test]
    fn test_sentence_without_spans_is_one_plain_segment() {
        let sentence = Sentence::from_tokens(&["Il", "pleut", "."]);
        let rendered = render_sentence(&sentence);
        assert_eq!(rendered.segments, vec![plain("Il pleut.")]);
        let empty = Sentence::from_tokens::<&str>(&[]);
        assert_eq!(render_sentence(&empty).segments, vec![plain("")]);
    }

    #[test]
    fn test_render_spans() {
        let text = "Mme Hélène Roux habite à Lyon.";
        let tokens = ["Mme", "Hélène", "Roux", "habite", "à", "Lyon", "."];
        let mut sentence = Sentence::align(text, &tokens).unwrap();
        sentence.add_span(EntityKind::Loc, 5..6).unwrap();
        sentence.add_span(EntityKind::PerPrenom, 1..2).unwrap();
        sentence.add_span(EntityKind::PerNom, 2..3).unwrap();
        let rendered = render_sentence(&sentence);
        assert_eq!(
            rendered.segments,
            vec![
                plain("Mme "),
                entity("Hélène", EntityKind::PerPrenom, 0),
                plain(" "),
                entity("Roux", EntityKind::PerNom, 1),
                plain(" habite à "),
                entity("Lyon", EntityKind::Loc, 2),
                plain("."),
            ]
        );
        assert_eq!(rendered.text(), text);
    }

    #[test]
    fn test_misaligned_sentence_is_rendered_empty() {
        let mut document = Document::new();
        document
            .push_aligned("Jean Dupont", &["Jean", "Dupont"])
            .unwrap()
            .add_span(EntityKind::PerNom, 1..2)
            .unwrap();
        let _ = document.push_aligned("Jean  Martin", &["Jean", "Martin"]);
        document
            .push_aligned("Paul Durand", &["Paul", "Durand"])
            .unwrap()
            .add_span(EntityKind::PerNom, 1..2)
            .unwrap();
        let rendered = render_document(&document);
        assert_eq!(rendered.sentences.len(), 3);
        assert_eq!(rendered.sentences[1].text(), "");
        assert_eq!(
            rendered.sentences[2].segments[1],
            entity("Durand", EntityKind::PerNom, 1)
        );
    }

    #[test]
    fn test_redact_document() {
        let mut document = Document::new();
        let sentence = document
            .push_aligned(
                "Hélène Roux habite 3 rue Neuve.",
                &["Hélène", "Roux", "habite", "3", "rue", "Neuve", "."],
            )
            .unwrap();
        sentence.add_span(EntityKind::PerPrenom, 0..1).unwrap();
        sentence.add_span(EntityKind::PerNom, 1..2).unwrap();
        sentence.add_span(EntityKind::Loc, 3..6).unwrap();
        document
            .push_aligned("Mme ROUX est partie.", &["Mme", "ROUX", "est", "partie", "."])
            .unwrap()
            .add_span(EntityKind::PerNom, 1..2)
            .unwrap();
        let rendered = render_redacted_document(&document, &RenderConfig::default()).unwrap();
        assert_eq!(rendered.sentences[0].text(), "A… B… habite … … ….");
        assert_eq!(rendered.sentences[1].text(), "Mme B… est partie.");
        assert_eq!(
            rendered.sentences[0].segments[4],
            entity("… … …", EntityKind::Loc, 2)
        );
    }

    #[test]
    fn test_redact_with_custom_config() {
        let sentence = {
            let mut s = Sentence::from_tokens(&["Jean", "vit", "à", "Nice"]);
            s.add_span(EntityKind::PerPrenom, 0..1).unwrap();
            s.add_span(EntityKind::Loc, 3..4).unwrap();
            s
        };
        let config = RenderConfigBuilder::new()
            .address_placeholder("[ADRESSE]")
            .pseudonym_suffix(".")
            .build();
        let mut memo = PseudonymMemo::new(config.pseudonym_suffix());
        let redacted = redact_sentence(&sentence, &mut memo, &config).unwrap();
        assert_eq!(redacted.text(), "A. vit à [ADRESSE]");
    }

    #[test]
    fn test_propertie_segments_cover_the_sentence() {
        fn propertie_concatenated_segments_equal_text(
            words: Vec<String>,
            starts: Vec<u8>,
        ) -> TestResult {
            let tokens: Vec<String> = words
                .into_iter()
                .filter(|w| !w.is_empty() && !w.chars().any(char::is_whitespace))
                .collect();
            if tokens.is_empty() {
                return TestResult::discard();
            }
            let mut sentence = Sentence::from_tokens(&tokens);
            for start in starts {
                let start = start as usize % tokens.len();
                // Overlapping spans are refused, which is fine here.
                let _ = sentence.add_span(EntityKind::Org, start..start + 1);
            }
            let rendered = render_sentence(&sentence);
            if rendered.text() != sentence.text() {
                return TestResult::failed();
            }
            if rendered.entities().count() != sentence.spans().len() {
                return TestResult::failed();
            }
            TestResult::passed()
        }
        let mut qc = quickcheck::QuickCheck::new().tests(1000);
        qc.quickcheck(
            propertie_concatenated_segments_equal_text as fn(Vec<String>, Vec<u8>) -> TestResult,
        )
    }

    #[test]
    fn test_propertie_tagged_segments_cover_the_sentence() {
        fn propertie_tagged_text_round_trip(nodes: Vec<(u8, String)>) -> TestResult {
            let kinds: Vec<EntityKind> = EntityKind::iter().collect();
            let mut markup = String::from("<root><sentence>");
            let mut expected = String::new();
            let mut nb_entities = 0;
            for (choice, text) in nodes.iter() {
                // Most control chars, U+FFFE and U+FFFF are not valid XML.
                let text: String = text
                    .chars()
                    .filter(|c| !c.is_control() && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
                    .collect();
                let escaped = html_escape::encode_text(&text);
                match *choice as usize % (kinds.len() + 2) {
                    0 => markup.push_str(&escaped),
                    1 => markup.push_str(&format!("<a>{}</a>", escaped)),
                    k => {
                        markup.push_str(&format!("<{0}>{1}</{0}>", kinds[k - 2].tag(), escaped));
                        nb_entities += 1;
                    }
                }
                expected.push_str(&text);
            }
            markup.push_str("</sentence></root>");
            let document: TaggedDocument = match markup.parse() {
                Ok(document) => document,
                Err(_) => return TestResult::failed(),
            };
            let rendered = render_tagged_document(&document);
            if rendered.sentences.len() != 1 {
                return TestResult::failed();
            }
            let sentence = &rendered.sentences[0];
            TestResult::from_bool(
                sentence.text() == expected
                    && sentence.text() == document.sentences[0].text()
                    && sentence.entities().count() == nb_entities,
            )
        }
        let mut qc = quickcheck::QuickCheck::new().tests(1000);
        qc.quickcheck(propertie_tagged_text_round_trip as fn(Vec<(u8, String)>) -> TestResult)
    }
}
