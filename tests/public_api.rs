use nerview::{
    document_to_html, evaluate_batch, read_conll, render_document, render_redacted_document,
    render_tagged_text, Document, EntityKind, RenderConfig, RenderConfigBuilder, RenderError,
    Segment, StatsReporter, UnknownEntityKind,
};

const TAGGED: &str = "<root>\
    <sentence><a>Le </a><PER_PRENOM>Jean</PER_PRENOM><a> </a><PER_NOM>Dupont</PER_NOM>\
    <a> demeurant </a><LOC>12 rue des Lilas</LOC><a> a signé.</a></sentence>\
    <sentence><a>Aucune entité ici.</a></sentence>\
    </root>";

#[test]
fn tagged_text_renders_back_to_the_original_text() {
    let rendered = render_tagged_text(TAGGED).unwrap();
    assert_eq!(rendered.sentences.len(), 2);
    assert_eq!(
        rendered.sentences[0].text(),
        "Le Jean Dupont demeurant 12 rue des Lilas a signé."
    );
    let labels: Vec<_> = rendered.sentences[0]
        .entities()
        .filter_map(Segment::label)
        .collect();
    assert_eq!(labels, vec!["PRENOM", "NOM", "ADRESSE"]);
    assert_eq!(
        rendered.sentences[1].segments,
        vec![Segment::Plain {
            text: String::from("Aucune entité ici.")
        }]
    );
}

#[test]
fn unknown_tags_halt_the_document() {
    let tagged = "<root><sentence><a>Le </a><XYZ>Jean</XYZ></sentence></root>";
    assert_eq!(
        render_tagged_text(tagged),
        Err(RenderError::UnknownEntityKind(UnknownEntityKind(
            String::from("XYZ")
        )))
    );
}

#[test]
fn segments_serialize_for_the_presentation_layer() {
    let rendered = render_tagged_text(TAGGED).unwrap();
    let json = serde_json::to_value(&rendered.sentences[0].segments[1]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"type": "entity", "text": "Jean", "kind": "PER_PRENOM", "span_index": 0})
    );
}

#[test]
fn aligned_spans_render_and_redact() {
    let mut document = Document::new();
    let sentence = document
        .push_aligned(
            "Mme Hélène Roux, née le 3 mai, vit à Nice.",
            &[
                "Mme", "Hélène", "Roux", ",", "née", "le", "3", "mai", ",", "vit", "à", "Nice", ".",
            ],
        )
        .unwrap();
    sentence.add_span(EntityKind::PerPrenom, 1..2).unwrap();
    sentence.add_span(EntityKind::PerNom, 2..3).unwrap();
    sentence.add_span(EntityKind::Loc, 11..12).unwrap();

    let rendered = render_document(&document);
    assert_eq!(
        rendered.sentences[0].text(),
        "Mme Hélène Roux, née le 3 mai, vit à Nice."
    );
    assert_eq!(rendered.entity_count(), 3);

    let redacted = render_redacted_document(&document, &RenderConfig::default()).unwrap();
    assert_eq!(redacted.sentences[0].text(), "Mme A… B…, née le 3 mai, vit à ….");

    let config = RenderConfigBuilder::new()
        .address_placeholder("[…]")
        .build();
    let redacted = render_redacted_document(&document, &config).unwrap();
    assert_eq!(
        redacted.sentences[0].text(),
        "Mme A… B…, née le 3 mai, vit à […]."
    );
}

#[test]
fn conll_dump_to_html() {
    let dump = "Jean B-PER_PRENOM\nDupont B-PER_NOM\nest O\nà O\nLyon B-LOC\n. O\n";
    let document = read_conll(dump, 1).unwrap();
    let html = document_to_html(&render_document(&document));
    assert_eq!(
        html,
        "<p><mark data-entity=\"PRENOM\" data-index=\"0\">Jean</mark> \
         <mark data-entity=\"NOM\" data-index=\"1\">Dupont</mark> est à \
         <mark data-entity=\"ADRESSE\" data-index=\"2\">Lyon</mark>.</p>"
    );
}

#[test]
fn evaluation_batch_report() {
    let files = vec![
        (
            "decision_1.txt",
            "Le\tO\tO\nJean\tB-PER_PRENOM\tB-PER_PRENOM\nDupont\tB-PER_NOM\tO\n\n\
             Lyon\tB-LOC\tB-PER_NOM\nsigne\tO\tB-ORG\n",
        ),
        ("decision_2.txt", "Le\tO\n"),
    ];
    let batch = evaluate_batch(files);
    assert_eq!(batch.failures.len(), 1);
    let stats = batch.files["decision_1.txt"].stats;
    assert_eq!(
        (
            stats.correct_classifications,
            stats.under_classifications,
            stats.miss_classifications,
            stats.over_classifications
        ),
        (1, 2, 1, 1)
    );
    let report = StatsReporter::from(&batch).to_string();
    assert_eq!(
        report,
        "File, Noms, Prenoms, Loc, Under, Over, Miss, Correct\n\
         decision_1.txt, 1, 1, 1, 2, 1, 1, 1\n\
         Total, 1, 1, 1, 2, 1, 1, 1\n"
    );
}
