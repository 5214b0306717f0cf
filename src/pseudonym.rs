/**
Deterministic pseudonyms. Names are replaced by `A…`, `B…`, ..., `Z…`, then by every pair of
distinct letters (`AB…`, `AC…`, ..., `YZ…`), in this order. The same name, ignoring case, always
gets the same pseudonym inside one [`PseudonymMemo`].
*/
use ahash::AHashMap;
use itertools::Itertools;
use once_cell::sync::Lazy;
use thiserror::Error;

/// Suffix appended to every pseudonym by default.
pub const DEFAULT_PSEUDONYM_SUFFIX: &str = "…";

/// Single letters first, then the unordered pairs of distinct letters in lexicographic order.
static LABELS: Lazy<Vec<String>> = Lazy::new(|| {
    let letters = 'A'..='Z';
    letters
        .clone()
        .map(String::from)
        .chain(letters.combinations(2).map(|pair| pair.into_iter().collect()))
        .collect()
});

/// Number of distinct pseudonyms available to one document.
pub fn pool_size() -> usize {
    LABELS.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("All {0} pseudonyms are already used by this document")]
pub struct PseudonymPoolExhausted(pub usize);

/// Assigns pseudonyms to original names. A memo must never outlive the document it was created
/// for.
#[derive(Debug, Clone)]
pub struct PseudonymMemo {
    suffix: String,
    assigned: AHashMap<String, String>,
}

impl Default for PseudonymMemo {
    fn default() -> Self {
        Self::new(DEFAULT_PSEUDONYM_SUFFIX)
    }
}

impl PseudonymMemo {
    pub fn new(suffix: impl Into<String>) -> Self {
        PseudonymMemo {
            suffix: suffix.into(),
            assigned: AHashMap::default(),
        }
    }

    /// Returns the pseudonym of `original`, assigning the next free one if the name was never
    /// seen.
    pub fn pseudonym_for(&mut self, original: &str) -> Result<String, PseudonymPoolExhausted> {
        let key = original.to_lowercase();
        if let Some(pseudonym) = self.assigned.get(&key) {
            return Ok(pseudonym.clone());
        }
        // Every assignment consumes exactly one label.
        let label = LABELS
            .get(self.assigned.len())
            .ok_or(PseudonymPoolExhausted(LABELS.len()))?;
        let pseudonym = format!("{}{}", label, self.suffix);
        self.assigned.insert(key, pseudonym.clone());
        Ok(pseudonym)
    }

    /// Pseudonym already assigned to `original`, if any.
    pub fn get(&self, original: &str) -> Option<&str> {
        self.assigned
            .get(&original.to_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ahash::AHashSet;
    use quickcheck::TestResult;

    #[test]
    fn test_sequence_order() {
        let mut memo = PseudonymMemo::default();
        let pseudonyms: Vec<String> = (0..30)
            .map(|i| memo.pseudonym_for(&format!("name{}", i)).unwrap())
            .collect();
        assert_eq!(pseudonyms[0], "A…");
        assert_eq!(pseudonyms[25], "Z…");
        assert_eq!(pseudonyms[26], "AB…");
        assert_eq!(pseudonyms[27], "AC…");
        assert_eq!(pseudonyms[29], "AE…");
    }

    #[test]
    fn test_pool_size() {
        assert_eq!(pool_size(), 26 + 325);
        assert_eq!(LABELS.last().map(String::as_str), Some("YZ"));
    }

    #[test]
    fn test_same_name_ignoring_case() {
        let mut memo = PseudonymMemo::default();
        let first = memo.pseudonym_for("Dupont").unwrap();
        let other = memo.pseudonym_for("Martin").unwrap();
        let again = memo.pseudonym_for("DUPONT").unwrap();
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(memo.len(), 2);
        assert_eq!(memo.get("dupont"), Some("A…"));
    }

    #[test]
    fn test_custom_suffix() {
        let mut memo = PseudonymMemo::new("...");
        assert_eq!(memo.pseudonym_for("Jean").unwrap(), "A...");
    }

    #[test]
    fn test_exhausted_pool() {
        let mut memo = PseudonymMemo::default();
        for i in 0..pool_size() {
            memo.pseudonym_for(&format!("name{}", i)).unwrap();
        }
        assert!(memo.pseudonym_for("name0").is_ok());
        assert_eq!(
            memo.pseudonym_for("one too many"),
            Err(PseudonymPoolExhausted(pool_size()))
        );
    }

    #[test]
    fn test_propertie_distinct_names_get_distinct_pseudonyms() {
        fn propertie_memo_is_injective(names: Vec<String>) -> TestResult {
            let distinct: AHashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
            if distinct.len() > pool_size() {
                return TestResult::discard();
            }
            let mut memo = PseudonymMemo::default();
            let mut seen: AHashSet<String> = AHashSet::default();
            for name in distinct.iter() {
                let pseudonym = memo.pseudonym_for(name).unwrap();
                if !seen.insert(pseudonym) {
                    return TestResult::failed();
                }
            }
            for name in names.iter() {
                let again = memo.pseudonym_for(name).unwrap();
                if memo.get(name) != Some(again.as_str()) {
                    return TestResult::failed();
                }
            }
            if memo.len() != distinct.len() {
                return TestResult::failed();
            }
            TestResult::passed()
        }
        let mut qc = quickcheck::QuickCheck::new().tests(500);
        qc.quickcheck(propertie_memo_is_injective as fn(Vec<String>) -> TestResult)
    }
}
