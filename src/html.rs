/**
HTML fragments for the rendered values. Entities are wrapped in
`<mark data-entity="LABEL" data-index="N">` so a stylesheet can color them; every text is escaped.
*/
use crate::classify::{FileEvaluation, OUTSIDE_TAG};
use crate::entity::EntityKind;
use crate::render::{RenderedDocument, RenderedSentence, Segment};
use html_escape::{encode_double_quoted_attribute, encode_text};

fn mark(text: &str, entity: &str, index: Option<usize>) -> String {
    let index = index.map(|i| i.to_string()).unwrap_or_default();
    format!(
        r#"<mark data-entity="{}" data-index="{}">{}</mark>"#,
        encode_double_quoted_attribute(entity),
        index,
        encode_text(text)
    )
}

pub fn sentence_to_html(sentence: &RenderedSentence) -> String {
    let mut html = String::from("<p>");
    for segment in sentence.segments.iter() {
        match segment {
            Segment::Plain { text } => html.push_str(&encode_text(text)),
            Segment::Entity {
                text,
                kind,
                span_index,
            } => html.push_str(&mark(text, kind.label(), Some(*span_index))),
        }
    }
    html.push_str("</p>");
    html
}

/// One paragraph per sentence.
pub fn document_to_html(document: &RenderedDocument) -> String {
    document
        .sentences
        .iter()
        .map(sentence_to_html)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The pseudonymized text returned by the service, as a single paragraph.
pub fn pseudonymized_to_html(pseudo: &str) -> String {
    format!("<p>{}</p>", encode_text(pseudo))
}

/// One mark per entity label, in declaration order.
pub fn legend_html() -> String {
    let marks: Vec<String> = EntityKind::iter()
        .map(|kind| mark(kind.label(), kind.label(), None))
        .collect();
    format!(r#"<div class="legend">{}</div>"#, marks.join(" "))
}

/// Tokens of an evaluation file, one paragraph per sentence, under a caption holding the counters.
pub fn evaluation_to_html(name: &str, evaluation: &FileEvaluation) -> String {
    let stats = &evaluation.stats;
    let mut html = format!(
        "<figure><figcaption>{}: {} noms, {} prénoms, {} adresses; {} correct, {} under, {} miss, {} over</figcaption>\n",
        encode_text(name),
        stats.nb_noms,
        stats.nb_prenoms,
        stats.nb_loc,
        stats.correct_classifications,
        stats.under_classifications,
        stats.miss_classifications,
        stats.over_classifications
    );
    fn flush(sentence: &mut Vec<String>, html: &mut String) {
        if !sentence.is_empty() {
            html.push_str(&format!("<p>{}</p>\n", sentence.join(" ")));
            sentence.clear();
        }
    }
    let mut sentence: Vec<String> = vec![];
    for row in evaluation.rows.iter() {
        match row.display_col.as_str() {
            "" => flush(&mut sentence, &mut html),
            OUTSIDE_TAG => sentence.push(encode_text(&row.token).into_owned()),
            display => sentence.push(mark(&row.token, display, None)),
        }
    }
    flush(&mut sentence, &mut html);
    html.push_str("</figure>");
    html
}
