//! Streaming syntax-highlight rendering core.
//!
//! Renders syntax-highlighted markup for source text submitted as a live
//! character stream, without ever materializing the whole input in memory.
//! Two pieces make that possible:
//!
//! - a family of bounded-lookahead decoding transforms that turn
//!   percent-encoded and HTML-entity-encoded input into plain text on the
//!   fly ([`decode`]), and
//! - a dual rolling-buffer reconciler that matches token boundaries reported
//!   by an external lexer against the raw character windows still in flight,
//!   so markup is emitted correctly even when a token, or an escape
//!   sequence, spans a buffer refill boundary.
//!
//! The pipeline is single-threaded, synchronous, and pull-based; the only
//! suspension point is the windowed reader's refill, which reaches back into
//! the decoder chain on the same stack. Output is identical to what a
//! non-streaming implementation would produce, for every window capacity.
//!
//! Lexers, per-profile color tables, and the request layer are external
//! collaborators: the core consumes the [`TokenProducer`] contract and a
//! [`MarkupScheme`] lookup, nothing more.

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod decode;
mod error;
mod highlight;
mod markup;
mod producer;
mod reconcile;
mod stream;
mod token;
mod window;

#[cfg(test)]
mod tests;

pub use decode::{Charset, DecodingReader, EntityDecoder, PercentDecoder};
pub use error::{EncodingError, HighlightError};
pub use highlight::{HighlightOptions, highlight};
pub use markup::{MarkupScheme, OutputWriter};
pub use producer::{DrainProducer, ProducerFactory, ProducerRegistry, SourceLanguage, TokenProducer};
pub use stream::{CharSink, CharSource, StrSource};
pub use token::{CLOSE_MARKER, Category, TokenInfo, TokenType};
