/**
This modules prettyprints the statistics of a batch of evaluation files, as if they were collected
into a dataframe.
*/
use crate::classify::{BatchEvaluation, FileStats};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::ops::AddAssign;

impl AddAssign<&FileStats> for FileStats {
    fn add_assign(&mut self, rhs: &FileStats) {
        self.nb_noms += rhs.nb_noms;
        self.nb_prenoms += rhs.nb_prenoms;
        self.nb_loc += rhs.nb_loc;
        self.under_classifications += rhs.under_classifications;
        self.over_classifications += rhs.over_classifications;
        self.miss_classifications += rhs.miss_classifications;
        self.correct_classifications += rhs.correct_classifications;
    }
}

/// The reporter holds the statistics of every evaluated file, sorted by file name. Displaying it
/// gives one line per file followed by the total.
///
/// # Example
///
/// ```rust
/// use nerview::{evaluate_batch, StatsReporter};
///
/// let files = vec![
///     ("a.txt", "Jean\tB-PER_PRENOM\tB-PER_PRENOM\nLyon\tB-LOC\tO\n"),
///     ("b.txt", "est\tO\tB-ORG\n"),
/// ];
/// let reporter = StatsReporter::from(&evaluate_batch(files));
/// let expected_report = "File, Noms, Prenoms, Loc, Under, Over, Miss, Correct
/// a.txt, 0, 1, 1, 1, 0, 0, 1
/// b.txt, 0, 0, 0, 0, 1, 0, 0
/// Total, 0, 1, 1, 1, 1, 0, 1\n";
/// assert_eq!(expected_report, reporter.to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsReporter {
    files: BTreeMap<String, FileStats>,
}

impl StatsReporter {
    pub fn total(&self) -> FileStats {
        let mut total = FileStats::default();
        for stats in self.files.values() {
            total += stats;
        }
        total
    }
    pub fn get(&self, file: &str) -> Option<&FileStats> {
        self.files.get(file)
    }
    pub fn len(&self) -> usize {
        self.files.len()
    }
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl From<&BatchEvaluation> for StatsReporter {
    fn from(value: &BatchEvaluation) -> Self {
        let files = value
            .files
            .iter()
            .map(|(name, evaluation)| (name.clone(), evaluation.stats))
            .collect();
        StatsReporter { files }
    }
}

impl Display for StatsReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "File, Noms, Prenoms, Loc, Under, Over, Miss, Correct")?;
        for (name, stats) in self.files.iter() {
            writeln!(f, "{}, {}", name, stats)?
        }
        writeln!(f, "Total, {}", self.total())
    }
}
