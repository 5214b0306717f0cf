/**
Tagged text as returned by the pseudonymization service.

```xml
<root>
  <sentence><a>Monsieur </a><PER_NOM>Dupont</PER_NOM><a> habite à </a><LOC>Lyon</LOC></sentence>
</root>
```

The markup is parsed once into [`TaggedDocument`]. Rendering then walks plain Rust values and
never looks at tag names again.
*/
use crate::entity::EntityKind;
use crate::render::RenderError;
use std::str::FromStr;
use tracing::debug;

const SENTENCE_TAG: &str = "sentence";
const UNTAGGED_TAG: &str = "a";

/// A leaf of a tagged sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaggedNode {
    Plain(String),
    Entity { kind: EntityKind, text: String },
}

impl TaggedNode {
    pub fn text(&self) -> &str {
        match self {
            Self::Plain(text) => text,
            Self::Entity { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaggedSentence {
    pub nodes: Vec<TaggedNode>,
}

impl TaggedSentence {
    /// The sentence text, without markup.
    pub fn text(&self) -> String {
        self.nodes.iter().map(TaggedNode::text).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaggedDocument {
    pub sentences: Vec<TaggedSentence>,
}

impl FromStr for TaggedDocument {
    type Err = RenderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(TaggedDocument::default());
        }
        let xml = roxmltree::Document::parse(s)
            .map_err(|e| RenderError::MalformedTaggedText(e.to_string()))?;
        let sentences = xml
            .root_element()
            .children()
            .filter(|child| child.has_tag_name(SENTENCE_TAG))
            .map(parse_sentence)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Parsed {} tagged sentences", sentences.len());
        Ok(TaggedDocument { sentences })
    }
}

fn parse_sentence(sentence: roxmltree::Node) -> Result<TaggedSentence, RenderError> {
    let mut nodes = Vec::new();
    for child in sentence.children() {
        if child.is_text() {
            if let Some(text) = child.text() {
                nodes.push(TaggedNode::Plain(String::from(text)));
            }
        } else if child.is_element() {
            let name = child.tag_name().name();
            let text = node_text(child);
            if name == UNTAGGED_TAG {
                nodes.push(TaggedNode::Plain(text));
            } else {
                let kind: EntityKind = name.parse()?;
                nodes.push(TaggedNode::Entity { kind, text });
            }
        }
    }
    Ok(TaggedSentence { nodes })
}

/// Concatenation of every text node below `node`.
fn node_text(node: roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}
