//! Token producer seam and the explicit producer registry.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec;

use crate::error::HighlightError;
use crate::stream::CharSource;
use crate::token::TokenInfo;

/// External lexer contract.
///
/// Given a pull-style character source, yields successive tokens with
/// absolute offsets into the decoded stream, or `None` as the end marker.
/// Producers are selected externally by source-language identifier; the core
/// only consumes this contract and never parses a language grammar itself.
pub trait TokenProducer {
    /// Advances the lexer, pulling input as needed, and returns the next
    /// discovered token.
    ///
    /// # Errors
    ///
    /// Propagates source failures; producers themselves do not fail.
    fn next_token(
        &mut self,
        input: &mut dyn CharSource,
    ) -> Result<Option<TokenInfo>, HighlightError>;
}

/// Trivial producer that drains all input and emits no tokens.
///
/// Substituted when no real producer is registered for a language, so the
/// request degrades to plain escaped text instead of failing.
#[derive(Debug, Default)]
pub struct DrainProducer;

impl TokenProducer for DrainProducer {
    fn next_token(
        &mut self,
        input: &mut dyn CharSource,
    ) -> Result<Option<TokenInfo>, HighlightError> {
        let mut buffer = vec!['\0'; 256];
        while input.read(&mut buffer)? > 0 {}
        Ok(None)
    }
}

/// Source languages a producer may be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[non_exhaustive]
pub enum SourceLanguage {
    /// Java sources.
    Java,
    /// XML documents.
    Xml,
}

/// Factory producing a fresh lexer for one stream.
pub type ProducerFactory = fn() -> Box<dyn TokenProducer>;

/// Explicit registry mapping a [`SourceLanguage`] to a producer factory.
///
/// Built once at startup from a literal entry list. Absence of an entry maps
/// to [`DrainProducer`], decided here at lookup time rather than through any
/// runtime loading machinery.
#[derive(Debug, Default)]
pub struct ProducerRegistry {
    entries: BTreeMap<SourceLanguage, ProducerFactory>,
}

impl ProducerRegistry {
    /// Builds a registry from `(language, factory)` pairs. A language listed
    /// twice keeps the last factory.
    #[must_use]
    pub fn from_entries(entries: &[(SourceLanguage, ProducerFactory)]) -> Self {
        Self {
            entries: entries.iter().copied().collect(),
        }
    }

    /// Creates a producer for `language`, falling back to [`DrainProducer`]
    /// when none is registered.
    #[must_use]
    pub fn producer(&self, language: SourceLanguage) -> Box<dyn TokenProducer> {
        match self.entries.get(&language) {
            Some(factory) => factory(),
            None => Box::new(DrainProducer),
        }
    }
}
