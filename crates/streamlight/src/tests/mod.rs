//! End-to-end pipeline tests driving [`highlight`] with scripted producers.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use quickcheck_macros::quickcheck;
use rstest::rstest;

use crate::{
    Category, CharSource, DrainProducer, EncodingError, HighlightError, HighlightOptions,
    MarkupScheme, ProducerRegistry, SourceLanguage, StrSource, TokenInfo, TokenProducer,
    TokenType, highlight,
};

const KEYWORD: TokenType = TokenType::new("keyword", Category::Complete);
const STRING_START: TokenType = TokenType::new("string", Category::Start);
const STRING_END: TokenType = TokenType::new("string_end", Category::End);
const STRING_END_LOOKAHEAD: TokenType = TokenType::new("string_end", Category::EndLookAhead);

fn scheme() -> MarkupScheme {
    MarkupScheme::from_rules(&[
        ("keyword", "style=\"color:red;\""),
        ("string", "style=\"color:green;\""),
    ])
}

/// One scripted lexer action.
enum Step {
    /// Pull exactly this many characters from the input (or until end of
    /// stream, whichever comes first).
    Read(usize),
    /// Pull input until end of stream.
    Drain,
    /// Report this token.
    Token(TokenInfo),
}

/// Producer replaying a fixed script, standing in for a real lexer.
struct ScriptedProducer {
    steps: VecDeque<Step>,
}

impl ScriptedProducer {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
        }
    }
}

impl TokenProducer for ScriptedProducer {
    fn next_token(
        &mut self,
        input: &mut dyn CharSource,
    ) -> Result<Option<TokenInfo>, HighlightError> {
        while let Some(step) = self.steps.pop_front() {
            match step {
                Step::Read(want) => {
                    let mut buf = vec!['\0'; want];
                    let mut got = 0;
                    while got < want {
                        let n = input.read(&mut buf[got..])?;
                        if n == 0 {
                            break;
                        }
                        got += n;
                    }
                }
                Step::Drain => {
                    let mut buf = ['\0'; 64];
                    while input.read(&mut buf)? > 0 {}
                }
                Step::Token(info) => return Ok(Some(info)),
            }
        }
        Ok(None)
    }
}

fn run(
    input: &str,
    steps: Vec<Step>,
    scheme: MarkupScheme,
    window_capacity: usize,
) -> Result<String, HighlightError> {
    let mut producer = ScriptedProducer::new(steps);
    highlight(
        StrSource::new(input),
        &mut producer,
        scheme,
        HighlightOptions {
            window_capacity,
            ..HighlightOptions::default()
        },
        String::new(),
    )
}

fn strip_markup(html: &str) -> String {
    let mut out = String::new();
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

#[test]
fn plain_text_passes_through() {
    let mut producer = DrainProducer;
    let out = highlight(
        StrSource::new("hello world"),
        &mut producer,
        MarkupScheme::empty(),
        HighlightOptions::default(),
        String::new(),
    )
    .unwrap();
    assert_eq!(out, "hello world");
}

#[test]
fn empty_input_produces_empty_output() {
    let mut producer = DrainProducer;
    let out = highlight(
        StrSource::new(""),
        &mut producer,
        MarkupScheme::empty(),
        HighlightOptions::default(),
        String::new(),
    )
    .unwrap();
    assert_eq!(out, "");
}

#[test]
fn reserved_characters_are_escaped() {
    let mut producer = DrainProducer;
    let out = highlight(
        StrSource::new("if (a < b > c)"),
        &mut producer,
        MarkupScheme::empty(),
        HighlightOptions::default(),
        String::new(),
    )
    .unwrap();
    assert_eq!(out, "if (a &lt; b &gt; c)");
}

#[test]
fn entity_encoded_input_round_trips() {
    // The entity decoder resolves the references; the writer re-escapes the
    // resulting reserved characters on the way out.
    let mut producer = DrainProducer;
    let out = highlight(
        StrSource::new("a&lt;b&amp;c&gt;d"),
        &mut producer,
        MarkupScheme::empty(),
        HighlightOptions::default(),
        String::new(),
    )
    .unwrap();
    assert_eq!(out, "a&lt;b&amp;c&gt;d");
}

#[test]
fn percent_and_entity_decoding_chain() {
    // "a+%26lt%3Bb" percent-decodes to "a &lt;b", which entity-decodes to
    // "a <b", which renders escaped.
    let mut producer = DrainProducer;
    let out = highlight(
        StrSource::new("a+%26lt%3Bb"),
        &mut producer,
        MarkupScheme::empty(),
        HighlightOptions::default(),
        String::new(),
    )
    .unwrap();
    assert_eq!(out, "a &lt;b");
}

#[test]
fn complete_token_is_wrapped_once() {
    let out = run(
        "abcdefgh",
        vec![
            Step::Read(6),
            Step::Token(TokenInfo::new(KEYWORD, 2, 6)),
            Step::Drain,
        ],
        scheme(),
        1024,
    )
    .unwrap();
    assert_eq!(out, "ab<span style=\"color:red;\">cdef</span>gh");
}

#[test]
fn token_spanning_refill_boundary_is_wrapped_once() {
    // With a four-character window the token's range covers the tail of one
    // window and the head of the next; the runs must be reassembled so the
    // markup wraps the token exactly once.
    let out = run(
        "abcdefgh",
        vec![
            Step::Read(6),
            Step::Token(TokenInfo::new(KEYWORD, 2, 6)),
            Step::Drain,
        ],
        scheme(),
        4,
    )
    .unwrap();
    assert_eq!(out, "ab<span style=\"color:red;\">cdef</span>gh");
    assert_eq!(out.matches("<span").count(), 1);
}

#[test]
fn token_starting_at_flush_boundary_is_wrapped_once() {
    // The token's start coincides with the previous window's unflushed start
    // and its span crosses into the active window.
    let out = run(
        "abcdefgh",
        vec![
            Step::Read(6),
            Step::Token(TokenInfo::new(KEYWORD, 0, 6)),
            Step::Drain,
        ],
        scheme(),
        4,
    )
    .unwrap();
    assert_eq!(out, "<span style=\"color:red;\">abcdef</span>gh");
    assert_eq!(out.matches("<span").count(), 1);
    assert_eq!(out.matches("</span>").count(), 1);
}

#[test]
fn start_token_at_flush_boundary_keeps_markup_balanced() {
    let out = run(
        "abcdefgh",
        vec![
            Step::Read(6),
            Step::Token(TokenInfo::new(STRING_START, 0, 6)),
            Step::Drain,
        ],
        scheme(),
        4,
    )
    .unwrap();
    assert_eq!(out, "<span style=\"color:green;\">abcdefgh</span>");
    assert_eq!(out.matches("<span").count(), 1);
    assert_eq!(out.matches("</span>").count(), 1);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(1024)]
fn content_is_preserved_for_any_window_capacity(#[case] window_capacity: usize) {
    let out = run(
        "abcdefgh",
        vec![
            Step::Read(6),
            Step::Token(TokenInfo::new(KEYWORD, 2, 6)),
            Step::Drain,
        ],
        scheme(),
        window_capacity,
    )
    .unwrap();
    assert_eq!(strip_markup(&out), "abcdefgh");
}

#[test]
fn unterminated_span_is_closed_at_end_of_stream() {
    let out = run(
        "0123456789abcdefghij",
        vec![
            Step::Read(10),
            Step::Token(TokenInfo::new(STRING_START, 5, 6)),
            Step::Drain,
        ],
        scheme(),
        1024,
    )
    .unwrap();
    assert_eq!(
        out,
        "01234<span style=\"color:green;\">56789abcdefghij</span>"
    );
}

#[test]
fn end_token_text_stays_inside_the_span() {
    let out = run(
        "abcd",
        vec![
            Step::Read(4),
            Step::Token(TokenInfo::new(STRING_START, 0, 1)),
            Step::Token(TokenInfo::new(STRING_END, 3, 4)),
            Step::Drain,
        ],
        scheme(),
        1024,
    )
    .unwrap();
    assert_eq!(out, "<span style=\"color:green;\">abcd</span>");
}

#[test]
fn end_lookahead_text_stays_outside_the_span() {
    let out = run(
        "abcd",
        vec![
            Step::Read(4),
            Step::Token(TokenInfo::new(STRING_START, 0, 1)),
            Step::Token(TokenInfo::new(STRING_END_LOOKAHEAD, 3, 4)),
            Step::Drain,
        ],
        scheme(),
        1024,
    )
    .unwrap();
    assert_eq!(out, "<span style=\"color:green;\">abc</span>d");
}

#[test]
fn unstyled_token_renders_as_plain_text() {
    const UNSTYLED: TokenType = TokenType::new("whitespace", Category::Complete);
    let out = run(
        "abcd",
        vec![
            Step::Read(4),
            Step::Token(TokenInfo::new(UNSTYLED, 1, 3)),
            Step::Drain,
        ],
        scheme(),
        1024,
    )
    .unwrap();
    assert_eq!(out, "abcd");
}

#[test]
fn stray_end_token_emits_no_close_tag() {
    let out = run(
        "abcd",
        vec![
            Step::Read(4),
            Step::Token(TokenInfo::new(STRING_END, 1, 2)),
            Step::Drain,
        ],
        scheme(),
        1024,
    )
    .unwrap();
    assert_eq!(out, "abcd");
}

#[test]
fn malformed_percent_escape_aborts_with_empty_output() {
    let mut producer = DrainProducer;
    let mut out = String::new();
    let result = highlight(
        StrSource::new("ab%AGcd"),
        &mut producer,
        MarkupScheme::empty(),
        HighlightOptions::default(),
        &mut out,
    );
    assert_eq!(
        result.unwrap_err(),
        EncodingError::InvalidHexDigit('G').into()
    );
    assert!(out.is_empty());
}

#[test]
fn truncated_entity_aborts_with_empty_output() {
    let mut producer = DrainProducer;
    let mut out = String::new();
    let result = highlight(
        StrSource::new("abc&#12"),
        &mut producer,
        MarkupScheme::empty(),
        HighlightOptions::default(),
        &mut out,
    );
    assert_eq!(result.unwrap_err(), EncodingError::TruncatedEscape.into());
    assert!(out.is_empty());
}

#[test]
fn zero_window_capacity_is_rejected() {
    let mut producer = DrainProducer;
    let result = highlight(
        StrSource::new("abc"),
        &mut producer,
        MarkupScheme::empty(),
        HighlightOptions {
            window_capacity: 0,
            ..HighlightOptions::default()
        },
        String::new(),
    );
    assert!(matches!(
        result,
        Err(HighlightError::InvalidConfiguration(_))
    ));
}

fn keyword_producer() -> Box<dyn TokenProducer> {
    Box::new(ScriptedProducer::new(vec![
        Step::Read(4),
        Step::Token(TokenInfo::new(KEYWORD, 0, 4)),
        Step::Drain,
    ]))
}

#[test]
fn registry_dispatches_registered_language() {
    let registry = ProducerRegistry::from_entries(&[(SourceLanguage::Java, keyword_producer)]);
    let mut producer = registry.producer(SourceLanguage::Java);
    let out = highlight(
        StrSource::new("test"),
        producer.as_mut(),
        scheme(),
        HighlightOptions::default(),
        String::new(),
    )
    .unwrap();
    assert_eq!(out, "<span style=\"color:red;\">test</span>");
}

#[test]
fn registry_falls_back_to_plain_rendering() {
    let registry = ProducerRegistry::from_entries(&[(SourceLanguage::Java, keyword_producer)]);
    let mut producer = registry.producer(SourceLanguage::Xml);
    let out = highlight(
        StrSource::new("test"),
        producer.as_mut(),
        scheme(),
        HighlightOptions::default(),
        String::new(),
    )
    .unwrap();
    assert_eq!(out, "test");
}

#[quickcheck]
fn pipeline_is_identity_on_inert_text(input: String) -> bool {
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '%' | '+' | '&' | '<' | '>'))
        .collect();
    let mut producer = DrainProducer;
    let out = highlight(
        StrSource::new(&cleaned),
        &mut producer,
        MarkupScheme::empty(),
        HighlightOptions::default(),
        String::new(),
    )
    .unwrap();
    out == cleaned
}

#[quickcheck]
fn content_survives_markup_for_small_windows(input: String, capacity: u8) -> bool {
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '%' | '+' | '&' | '<' | '>'))
        .collect();
    let total = cleaned.chars().count();
    let mid = total / 2;
    let steps = vec![
        Step::Read(mid),
        Step::Token(TokenInfo::new(KEYWORD, mid / 2, mid)),
        Step::Drain,
    ];
    let capacity = usize::from(capacity).max(1);
    let out = run(&cleaned, steps, scheme(), capacity).unwrap();
    strip_markup(&out) == cleaned
}
