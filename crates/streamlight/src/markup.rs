//! Markup schemes and the escaping output writer.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use crate::error::HighlightError;
use crate::stream::CharSink;
use crate::token::{Category, TokenInfo, TokenType};

/// Lookup from token type name to markup attribute text.
///
/// Styling rules are supplied externally per rendering profile; the core
/// never embeds them. Schemes are built by composition from a literal rule
/// list, e.g.:
///
/// ```
/// use streamlight::MarkupScheme;
///
/// let scheme = MarkupScheme::from_rules(&[
///     ("comment", "style=\"color:#808080;font-style:italic;\""),
///     ("keyword", "style=\"color:#000080;font-weight:bold;\""),
/// ]);
/// assert!(scheme.markup_for_name("keyword").is_some());
/// assert!(scheme.markup_for_name("string").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MarkupScheme {
    rules: BTreeMap<&'static str, String>,
}

impl MarkupScheme {
    /// A scheme with no rules; every run renders as plain escaped text.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a scheme from `(token type name, attribute text)` pairs.
    #[must_use]
    pub fn from_rules(rules: &[(&'static str, &str)]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|&(name, attrs)| (name, attrs.to_string()))
                .collect(),
        }
    }

    /// Markup attribute text registered for `token_type`, if any.
    #[must_use]
    pub fn markup(&self, token_type: &TokenType) -> Option<&str> {
        self.markup_for_name(token_type.name())
    }

    /// Markup attribute text registered under `name`, if any.
    #[must_use]
    pub fn markup_for_name(&self, name: &str) -> Option<&str> {
        self.rules.get(name).map(String::as_str)
    }
}

/// Escapes reserved markup characters and wraps runs in open/close tags
/// according to the token's category and the configured [`MarkupScheme`].
#[derive(Debug)]
pub struct OutputWriter<W> {
    sink: W,
    scheme: MarkupScheme,
    /// Number of emitted open tags not yet closed. Closing tags are only
    /// emitted while this is positive, so a scheme that covers a token's
    /// start type but not its end type can never produce a stray close.
    open_depth: usize,
}

impl<W: CharSink> OutputWriter<W> {
    /// Creates a writer emitting to `sink` with markup from `scheme`.
    pub fn new(sink: W, scheme: MarkupScheme) -> Self {
        Self {
            sink,
            scheme,
            open_depth: 0,
        }
    }

    /// Writes one run of characters, annotated by `token` when present.
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub fn write(&mut self, run: &[char], token: Option<&TokenInfo>) -> Result<(), HighlightError> {
        let Some(token_type) = token.and_then(|info| info.token_type) else {
            return self.escape(run);
        };
        match token_type.category() {
            Category::End => {
                self.escape(run)?;
                self.close_tag()
            }
            Category::EndLookAhead => {
                // The looked-ahead character is not part of the span.
                self.close_tag()?;
                self.escape(run)
            }
            category @ (Category::Start | Category::Complete) => {
                let opened = {
                    // Split borrows: the attrs borrow the scheme while the
                    // tag goes out through the sink.
                    let Self {
                        sink,
                        scheme,
                        open_depth,
                    } = self;
                    match scheme.markup(&token_type) {
                        None => false,
                        Some(attrs) => {
                            sink.write_str("<span ")?;
                            sink.write_str(attrs)?;
                            sink.write_str(">")?;
                            *open_depth += 1;
                            true
                        }
                    }
                };
                self.escape(run)?;
                if opened && category == Category::Complete {
                    self.close_tag()?;
                }
                Ok(())
            }
        }
    }

    /// Consumes the writer, returning the sink.
    pub fn into_sink(self) -> W {
        self.sink
    }

    fn close_tag(&mut self) -> Result<(), HighlightError> {
        if self.open_depth == 0 {
            return Ok(());
        }
        self.open_depth -= 1;
        self.sink.write_str("</span>")
    }

    /// Escapes `<`, `>` and `&` to their entity forms, copying the longest
    /// contiguous unreserved run per sink call.
    fn escape(&mut self, run: &[char]) -> Result<(), HighlightError> {
        let mut plain_from = 0;
        for (i, &c) in run.iter().enumerate() {
            let entity = match c {
                '<' => "&lt;",
                '>' => "&gt;",
                '&' => "&amp;",
                _ => continue,
            };
            if plain_from < i {
                self.sink.write(&run[plain_from..i])?;
            }
            self.sink.write_str(entity)?;
            plain_from = i + 1;
        }
        if plain_from < run.len() {
            self.sink.write(&run[plain_from..])?;
        }
        Ok(())
    }
}
