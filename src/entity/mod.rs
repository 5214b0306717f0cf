/**
Entity kinds emitted by the pseudonymization tagger. Each kind has the tag used on the wire
(`PER_NOM`, `LOC`, ...) and the French label shown to the user (`NOM`, `ADRESSE`, ...).
*/
use enum_iterator::{all, Sequence};
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

mod chunks;

pub use chunks::{get_chunks_lenient, Chunk, ChunkError};

/// The closed set of entities the tagger knows about. Any other tag is an error, it is never
/// silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize)]
pub enum EntityKind {
    #[serde(rename = "PER_PRENOM")]
    PerPrenom,
    #[serde(rename = "PER_NOM")]
    PerNom,
    #[serde(rename = "LOC")]
    Loc,
    #[serde(rename = "PER")]
    Per,
    #[serde(rename = "ORG")]
    Org,
}

impl EntityKind {
    /// Tag as written by the tagger, such as `PER_NOM`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PerPrenom => "PER_PRENOM",
            Self::PerNom => "PER_NOM",
            Self::Loc => "LOC",
            Self::Per => "PER",
            Self::Org => "ORG",
        }
    }

    /// Display label, such as `NOM`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PerPrenom => "PRENOM",
            Self::PerNom => "NOM",
            Self::Loc => "ADRESSE",
            Self::Per => "PERSONNE",
            Self::Org => "ORGANISATION",
        }
    }

    /// Addresses are masked instead of pseudonymized.
    pub fn is_address(&self) -> bool {
        matches!(self, Self::Loc)
    }

    /// Every kind, in declaration order.
    pub fn iter() -> impl Iterator<Item = EntityKind> {
        all::<EntityKind>()
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize)]
#[error("Unknown entity kind: {0}")]
pub struct UnknownEntityKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PER_PRENOM" => Ok(Self::PerPrenom),
            "PER_NOM" => Ok(Self::PerNom),
            "LOC" => Ok(Self::Loc),
            "PER" => Ok(Self::Per),
            "ORG" => Ok(Self::Org),
            _ => Err(UnknownEntityKind(String::from(s))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("PER_PRENOM", "PRENOM")]
    #[case("PER_NOM", "NOM")]
    #[case("LOC", "ADRESSE")]
    #[case("PER", "PERSONNE")]
    #[case("ORG", "ORGANISATION")]
    fn test_tag_to_label(#[case] tag: &str, #[case] label: &str) {
        let kind: EntityKind = tag.parse().unwrap();
        assert_eq!(kind.label(), label);
        assert_eq!(kind.tag(), tag);
        assert_eq!(kind.to_string(), tag);
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let actual = "XYZ".parse::<EntityKind>();
        assert_eq!(actual, Err(UnknownEntityKind(String::from("XYZ"))));
    }

    #[test]
    fn test_only_loc_is_an_address() {
        let addresses: Vec<_> = EntityKind::iter().filter(|k| k.is_address()).collect();
        assert_eq!(addresses, vec![EntityKind::Loc]);
        assert_eq!(EntityKind::iter().count(), 5);
    }
}
