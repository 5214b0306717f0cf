/**
Token-level diff between the true and the predicted tags of an evaluation file.

An evaluation file has one `token\ttrue_tag\tpred_tag` line per token and a blank line between
sentences. Every token row is classified as correct, under, miss, over or outside:

| true tag | predicted tag      | classification | display      |
|----------|--------------------|----------------|--------------|
| `X`      | `X` (`X` != `O`)   | correct        | `{pred}_C`   |
| not `O`  | `O`                | under          | `{pred}_E`   |
| not `O`  | other entity       | miss           | `{pred}_E`   |
| `O`      | entity             | over           | `{pred}_E`   |
| `O`      | `O`                | outside        | `O`          |

A miss is also counted as an under classification.
*/
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use thiserror::Error;
use tracing::{debug, warn};

/// Tag of the tokens outside of any entity.
pub const OUTSIDE_TAG: &str = "O";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TaggedToken {
    pub token: String,
    pub true_tag: String,
    pub pred_tag: String,
}

impl TaggedToken {
    pub fn new(
        token: impl Into<String>,
        true_tag: impl Into<String>,
        pred_tag: impl Into<String>,
    ) -> Self {
        TaggedToken {
            token: token.into(),
            true_tag: true_tag.into(),
            pred_tag: pred_tag.into(),
        }
    }
}

/// A line of an evaluation file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum EvalRow {
    /// Blank line.
    Boundary,
    Token(TaggedToken),
}

impl EvalRow {
    /// A blank line, or a line whose token is empty. Its tags still count as entity instances.
    pub fn is_boundary(&self) -> bool {
        match self {
            EvalRow::Boundary => true,
            EvalRow::Token(token) => token.token.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Classification {
    Correct,
    /// An entity predicted as `O`.
    Under,
    /// An entity predicted as another entity.
    Miss,
    /// An `O` predicted as an entity.
    Over,
    Outside,
}

impl Classification {
    pub fn is_under(&self) -> bool {
        matches!(self, Self::Under | Self::Miss)
    }
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Under | Self::Miss | Self::Over)
    }
}

pub fn classify(token: &TaggedToken) -> Classification {
    let is_outside = token.true_tag == OUTSIDE_TAG;
    match (token.true_tag == token.pred_tag, is_outside) {
        (true, false) => Classification::Correct,
        (false, false) if token.pred_tag == OUTSIDE_TAG => Classification::Under,
        (false, false) => Classification::Miss,
        (false, true) => Classification::Over,
        (true, true) => Classification::Outside,
    }
}

/// Display class of a row: `""` for a boundary, `O` outside of any entity, or the predicted tag
/// followed by `_C` (correct) or `_E` (error).
pub fn display_col(row: &EvalRow) -> String {
    match row {
        EvalRow::Token(token) if !token.token.is_empty() => match classify(token) {
            Classification::Correct => format!("{}_C", token.pred_tag),
            Classification::Outside => String::from(OUTSIDE_TAG),
            _ => format!("{}_E", token.pred_tag),
        },
        _ => String::new(),
    }
}

/// Counters of a single evaluation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub struct FileStats {
    pub nb_noms: usize,
    pub nb_prenoms: usize,
    pub nb_loc: usize,
    pub under_classifications: usize,
    pub over_classifications: usize,
    pub miss_classifications: usize,
    pub correct_classifications: usize,
}

impl FileStats {
    fn record(&mut self, token: &TaggedToken) {
        self.count_instance(&token.true_tag);
        if token.token.is_empty() {
            return;
        }
        match classify(token) {
            Classification::Correct => self.correct_classifications += 1,
            Classification::Under => self.under_classifications += 1,
            Classification::Miss => {
                self.under_classifications += 1;
                self.miss_classifications += 1;
            }
            Classification::Over => self.over_classifications += 1,
            Classification::Outside => (),
        }
    }

    fn count_instance(&mut self, tag: &str) {
        if tag.starts_with("B-PER_NOM") {
            self.nb_noms += 1;
        }
        if tag.starts_with("B-PER_PRENOM") {
            self.nb_prenoms += 1;
        }
        if tag.starts_with("B-LOC") {
            self.nb_loc += 1;
        }
    }
}

impl Display for FileStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}, {}",
            self.nb_noms,
            self.nb_prenoms,
            self.nb_loc,
            self.under_classifications,
            self.over_classifications,
            self.miss_classifications,
            self.correct_classifications
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DisplayRow {
    pub token: String,
    pub display_col: String,
}

/// The two column table of a file and its counters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FileEvaluation {
    pub rows: Vec<DisplayRow>,
    pub stats: FileStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum EvalError {
    #[error("Line {line} has {found} tab separated fields, expected 3 (token, true tag, predicted tag)")]
    MissingColumns { line: usize, found: usize },
}

/// Parses the content of an evaluation file. A blank line, or a line whose token is empty, is a
/// sentence boundary (see [`EvalRow::is_boundary`]).
pub fn parse_evaluation(content: &str) -> Result<Vec<EvalRow>, EvalError> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if line.trim().is_empty() {
                return Ok(EvalRow::Boundary);
            }
            let fields: Vec<&str> = line.split('\t').collect();
            match fields.as_slice() {
                [token, true_tag, pred_tag] => {
                    Ok(EvalRow::Token(TaggedToken::new(*token, *true_tag, *pred_tag)))
                }
                _ => Err(EvalError::MissingColumns {
                    line: i + 1,
                    found: fields.len(),
                }),
            }
        })
        .collect()
}

pub fn evaluate_rows(rows: &[EvalRow]) -> FileEvaluation {
    let mut stats = FileStats::default();
    let rows = rows
        .iter()
        .map(|row| {
            let token = match row {
                EvalRow::Boundary => String::new(),
                EvalRow::Token(token) => {
                    stats.record(token);
                    token.token.clone()
                }
            };
            DisplayRow {
                token,
                display_col: display_col(row),
            }
        })
        .collect();
    FileEvaluation { rows, stats }
}

/// Why a file of a batch was not evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum FileFailure {
    #[error(transparent)]
    Parse(#[from] EvalError),
    #[error("Could not read the file: {0}")]
    Io(String),
    #[error("The file is not valid UTF-8: {0}")]
    Encoding(String),
}

/// Evaluations of several files, keyed by file name. A file that cannot be read or parsed is
/// recorded in `failures` and does not prevent the others from being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BatchEvaluation {
    pub files: BTreeMap<String, FileEvaluation>,
    pub failures: BTreeMap<String, FileFailure>,
}

impl BatchEvaluation {
    /// Parses and evaluates `content`, or records why it could not be.
    pub fn add_file(&mut self, name: impl Into<String>, content: &str) {
        let name = name.into();
        match parse_evaluation(content) {
            Ok(rows) => {
                let evaluation = evaluate_rows(&rows);
                debug!("{}: {}", name, evaluation.stats);
                self.files.insert(name, evaluation);
            }
            Err(e) => self.add_failure(name, e.into()),
        }
    }

    pub fn add_failure(&mut self, name: impl Into<String>, failure: FileFailure) {
        let name = name.into();
        warn!("Could not evaluate {}: {}", name, failure);
        self.failures.insert(name, failure);
    }
}

pub fn evaluate_batch<I, K, C>(files: I) -> BatchEvaluation
where
    I: IntoIterator<Item = (K, C)>,
    K: Into<String>,
    C: AsRef<str>,
{
    let mut batch = BatchEvaluation::default();
    for (name, content) in files {
        batch.add_file(name, content.as_ref());
    }
    batch
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("B-PER_NOM", "B-PER_NOM", Classification::Correct, "B-PER_NOM_C")]
    #[case("B-LOC", "O", Classification::Under, "O_E")]
    #[case("B-LOC", "B-PER", Classification::Miss, "B-PER_E")]
    #[case("I-LOC", "B-LOC", Classification::Miss, "B-LOC_E")]
    #[case("O", "B-ORG", Classification::Over, "B-ORG_E")]
    #[case("O", "O", Classification::Outside, "O")]
    fn test_classify(
        #[case] true_tag: &str,
        #[case] pred_tag: &str,
        #[case] expected: Classification,
        #[case] expected_display: &str,
    ) {
        let token = TaggedToken::new("Dupont", true_tag, pred_tag);
        assert_eq!(classify(&token), expected);
        assert_eq!(display_col(&EvalRow::Token(token)), expected_display);
    }

    #[test]
    fn test_parse_evaluation() {
        let content = "Jean\tB-PER_PRENOM\tB-PER_PRENOM\nDupont\tB-PER_NOM\tO\n\n.\tO\tO\n\tO\tO\n";
        let rows = parse_evaluation(content).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2], EvalRow::Boundary);
        assert!(rows[4].is_boundary());
        assert_eq!(rows[4], EvalRow::Token(TaggedToken::new("", "O", "O")));
        assert_eq!(
            rows[3],
            EvalRow::Token(TaggedToken::new(".", "O", "O"))
        );
    }

    #[rstest]
    #[case("Jean\tB-PER_PRENOM\n", 1, 2)]
    #[case("Jean\tO\tO\nDupont\n", 2, 1)]
    #[case("a\tO\tO\tO\n", 1, 4)]
    fn test_missing_columns(#[case] content: &str, #[case] line: usize, #[case] found: usize) {
        assert_eq!(
            parse_evaluation(content),
            Err(EvalError::MissingColumns { line, found })
        );
    }

    #[test]
    fn test_evaluate_rows() {
        let content = "M.\tO\tO\nJean\tB-PER_PRENOM\tB-PER_PRENOM\nDupont\tB-PER_NOM\tB-LOC\n\n\
                       Lyon\tB-LOC\tO\nest\tO\tB-ORG\n";
        let rows = parse_evaluation(content).unwrap();
        let evaluation = evaluate_rows(&rows);
        let expected = FileStats {
            nb_noms: 1,
            nb_prenoms: 1,
            nb_loc: 1,
            under_classifications: 2,
            over_classifications: 1,
            miss_classifications: 1,
            correct_classifications: 1,
        };
        assert_eq!(evaluation.stats, expected);
        let display: Vec<&str> = evaluation
            .rows
            .iter()
            .map(|r| r.display_col.as_str())
            .collect();
        assert_eq!(
            display,
            vec!["O", "B-PER_PRENOM_C", "B-LOC_E", "", "O_E", "B-ORG_E"]
        );
        assert_eq!(evaluation.rows[3].token, "");
        assert_eq!(evaluation.stats.to_string(), "1, 1, 1, 2, 1, 1, 1");
    }

    #[test]
    fn test_empty_token_rows_count_entity_instances() {
        let content = "Lyon\tB-LOC\tB-LOC\n\tB-LOC\tO\n\tO\tB-PER_NOM\n";
        let evaluation = evaluate_rows(&parse_evaluation(content).unwrap());
        assert_eq!(evaluation.stats.nb_loc, 2);
        assert_eq!(evaluation.stats.correct_classifications, 1);
        assert_eq!(evaluation.stats.under_classifications, 0);
        assert_eq!(evaluation.stats.over_classifications, 0);
        let display: Vec<&str> = evaluation
            .rows
            .iter()
            .map(|r| r.display_col.as_str())
            .collect();
        assert_eq!(display, vec!["B-LOC_C", "", ""]);
    }

    #[test]
    fn test_evaluate_batch_keeps_going_after_a_failure() {
        let files = vec![
            ("b.txt", "Lyon\tB-LOC\tB-LOC\n"),
            ("a.txt", "Lyon\tB-LOC\n"),
        ];
        let mut batch = evaluate_batch(files);
        assert_eq!(batch.files.len(), 1);
        assert_eq!(batch.files["b.txt"].stats.correct_classifications, 1);
        assert_eq!(
            batch.failures.get("a.txt"),
            Some(&FileFailure::Parse(EvalError::MissingColumns {
                line: 1,
                found: 2
            }))
        );
        batch.add_failure("c.txt", FileFailure::Encoding(String::from("invalid utf-8")));
        assert_eq!(batch.failures.len(), 2);
        assert_eq!(batch.files.len(), 1);
    }
}
