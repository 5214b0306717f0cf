/*
 * This module contains the `RenderConfig` struct, which implements the default trait. It holds
 * the replacement texts used when rendering a redacted document and can be customized with the
 * `RenderConfigBuilder`.
*/
use crate::pseudonym::DEFAULT_PSEUDONYM_SUFFIX;
use either::Either as LeftOrRight;
use std::fmt::{Debug, Display};

/// Text replacing every token of an address.
pub const DEFAULT_ADDRESS_PLACEHOLDER: &str = "…";

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
/// Config struct used when redacting a document before rendering it. It implements the default
/// trait.
pub struct RenderConfig {
    /// Every token of an address entity is replaced by this text.
    address_placeholder: String,
    /// Appended to the pseudonyms (`A`, `B`, ..., `AB`, ...) replacing the other entities.
    pseudonym_suffix: String,
}

impl RenderConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn address_placeholder(&self) -> &str {
        &self.address_placeholder
    }
    pub fn pseudonym_suffix(&self) -> &str {
        &self.pseudonym_suffix
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            address_placeholder: String::from(DEFAULT_ADDRESS_PLACEHOLDER),
            pseudonym_suffix: String::from(DEFAULT_PSEUDONYM_SUFFIX),
        }
    }
}

impl Display for RenderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Address placeholder: {:?}\n Pseudonym suffix: {:?}",
            self.address_placeholder, self.pseudonym_suffix
        )
    }
}

impl From<RenderConfigBuilder> for RenderConfig {
    fn from(value: RenderConfigBuilder) -> Self {
        Self {
            address_placeholder: value.address_placeholder.either_into(),
            pseudonym_suffix: value.pseudonym_suffix.either_into(),
        }
    }
}

/// This builder can be used to build and customize a `RenderConfig` structure. Fields left
/// untouched keep their default value.
#[derive(Clone, Debug)]
pub struct RenderConfigBuilder {
    address_placeholder: LeftOrRight<String, &'static str>,
    pseudonym_suffix: LeftOrRight<String, &'static str>,
}

impl Default for RenderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderConfigBuilder {
    pub fn new() -> Self {
        Self {
            address_placeholder: LeftOrRight::Right(DEFAULT_ADDRESS_PLACEHOLDER),
            pseudonym_suffix: LeftOrRight::Right(DEFAULT_PSEUDONYM_SUFFIX),
        }
    }
    pub fn address_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.address_placeholder = LeftOrRight::Left(placeholder.into());
        self
    }
    pub fn pseudonym_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.pseudonym_suffix = LeftOrRight::Left(suffix.into());
        self
    }
    pub fn build(self) -> RenderConfig {
        RenderConfig::from(self)
    }
}
