//! Token model: categories, types, offset ranges, and the open-span state
//! machine.

use alloc::vec::Vec;

/// How a token relates to the markup span it belongs to.
///
/// Producers are not required to lex complete tokens; a string literal, for
/// example, may be reported as a start token and an end token so the lexer
/// never has to hold the whole literal. The category tells the output layer
/// which side of the span a token carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Category {
    /// Opens a markup span without closing it.
    Start,
    /// Closes the most recently opened span *before* its own text; the
    /// looked-ahead character is not part of the span.
    EndLookAhead,
    /// Closes the most recently opened span, including its own text region.
    End,
    /// Opens and closes within one token.
    Complete,
}

/// An immutable token type: a stable name plus its [`Category`].
///
/// The name is the key markup schemes are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TokenType {
    name: &'static str,
    category: Category,
}

impl TokenType {
    /// Creates a token type.
    #[must_use]
    pub const fn new(name: &'static str, category: Category) -> Self {
        Self { name, category }
    }

    /// Stable name used for markup lookup.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Span category.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }
}

/// Distinguished end token used to close spans, including the synthetic
/// closes generated at end of stream.
pub const CLOSE_MARKER: TokenType = TokenType::new("close", Category::End);

/// A labeled half-open offset range in the decoded character stream.
///
/// Offsets are absolute. `token_type == None` denotes an unannotated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TokenInfo {
    /// Type of the discovered token, or `None` for plain text.
    pub token_type: Option<TokenType>,
    /// Absolute offset of the first character (inclusive).
    pub start: usize,
    /// Absolute offset just past the last character (exclusive).
    pub end: usize,
}

impl TokenInfo {
    /// Creates a typed token over `[start, end)`.
    #[must_use]
    pub const fn new(token_type: TokenType, start: usize, end: usize) -> Self {
        Self {
            token_type: Some(token_type),
            start,
            end,
        }
    }

    /// Creates an unannotated run over `[start, end)`.
    #[must_use]
    pub const fn plain(start: usize, end: usize) -> Self {
        Self {
            token_type: None,
            start,
            end,
        }
    }

    pub(crate) fn category(&self) -> Option<Category> {
        self.token_type.map(|t| t.category())
    }
}

/// Guarantees that every opened span is eventually closed.
///
/// Counts opens and closes as tokens stream past; at end of stream it
/// synthesizes the closing markers the producer never supplied, plus one
/// unannotated token for any trailing text past the last reported token.
#[derive(Debug, Default)]
pub(crate) struct SpanTracker {
    pending_opens: usize,
    last_token_end: usize,
}

impl SpanTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn observe(&mut self, info: &TokenInfo) {
        match info.category() {
            Some(Category::Start) => self.pending_opens += 1,
            Some(Category::End | Category::EndLookAhead) => {
                self.pending_opens = self.pending_opens.saturating_sub(1);
            }
            Some(Category::Complete) | None => {}
        }
        self.last_token_end = self.last_token_end.max(info.end);
    }

    /// Tokens to replay at end of stream, where `final_offset` is the total
    /// number of decoded characters.
    pub(crate) fn finish(&mut self, final_offset: usize) -> Vec<TokenInfo> {
        let mut synthesized = Vec::new();
        if self.pending_opens > 0 {
            for _ in 0..self.pending_opens {
                synthesized.push(TokenInfo::new(CLOSE_MARKER, final_offset, final_offset));
            }
            self.pending_opens = 0;
        } else if self.last_token_end < final_offset {
            synthesized.push(TokenInfo::plain(self.last_token_end, final_offset));
        }
        synthesized
    }
}
