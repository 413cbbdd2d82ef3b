//! Parser for annotated scripts.
//!
//! Scripts are plain text with inline `[[...]]` directives:
//!
//! ```text
//! Hello [[pause:1.5]] [[voice:pt-BR-FranciscaNeural]] [[rate:1.2]] Olá!
//! ```
//!
//! Directives are instructions for everything that follows them, until
//! overridden. The buffered text is always flushed under the state that was
//! active before a directive is applied.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::events::{ConfigState, Event, MAX_PITCH, MAX_RATE, MIN_PITCH, MIN_RATE};
use super::events::{is_valid_pitch, is_valid_rate};

static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([\s\S]*?)\]\]").expect("directive pattern is a valid regex")
});

/// Options controlling directive validation.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Longest pause a single directive may request.
    pub max_pause_ms: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_pause_ms: 10_000,
        }
    }
}

/// Errors raised for malformed or out-of-range directives.
///
/// The `directive` field always holds the full offending span, brackets included.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveError {
    #[error("Invalid directive {directive}: expected \"cmd:value\" or \"break\"")]
    Malformed { directive: String },

    #[error("Unknown directive {directive}")]
    UnknownCommand { directive: String },

    #[error("Empty voice name in {directive}")]
    EmptyVoice { directive: String },

    #[error("Invalid rate in {directive}: allowed range is {MIN_RATE} to {MAX_RATE}")]
    InvalidRate { directive: String },

    #[error("Invalid pitch in {directive}: allowed range is {MIN_PITCH} to {MAX_PITCH}")]
    InvalidPitch { directive: String },

    #[error("Invalid pause in {directive}: {reason}")]
    InvalidPause { directive: String, reason: String },

    #[error("Pause in {directive} exceeds the limit of {max_ms}ms")]
    PauseTooLong { directive: String, max_ms: u64 },
}

impl DirectiveError {
    /// The offending directive text.
    pub fn directive(&self) -> &str {
        match self {
            DirectiveError::Malformed { directive }
            | DirectiveError::UnknownCommand { directive }
            | DirectiveError::EmptyVoice { directive }
            | DirectiveError::InvalidRate { directive }
            | DirectiveError::InvalidPitch { directive }
            | DirectiveError::InvalidPause { directive, .. }
            | DirectiveError::PauseTooLong { directive, .. } => directive,
        }
    }
}

/// Accumulates literal text and emits speak events on flush.
struct Timeline {
    events: Vec<Event>,
    state: ConfigState,
    buffer: String,
}

impl Timeline {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            state: ConfigState::default(),
            buffer: String::new(),
        }
    }

    fn flush(&mut self) {
        let text = std::mem::take(&mut self.buffer);
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.events
                .push(Event::speak(trimmed, self.state.clone()));
        }
    }

    fn push(&mut self, event: Event) {
        self.events.push(event);
    }
}

/// Parses an annotated script into an ordered list of events.
///
/// Empty, whitespace-only and directive-only input yields an empty list;
/// rejecting such scripts is left to the caller.
pub fn parse(input: &str, opts: &ParseOptions) -> Result<Vec<Event>, DirectiveError> {
    let mut timeline = Timeline::new();
    let mut last_index = 0;

    for caps in DIRECTIVE_RE.captures_iter(input) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        timeline.buffer.push_str(&input[last_index..whole.start()]);
        last_index = whole.end();

        apply_directive(&mut timeline, inner.as_str().trim(), opts)?;
    }

    timeline.buffer.push_str(&input[last_index..]);
    timeline.flush();

    Ok(timeline.events)
}

fn apply_directive(
    timeline: &mut Timeline,
    inside: &str,
    opts: &ParseOptions,
) -> Result<(), DirectiveError> {
    let directive = format!("[[{inside}]]");

    if inside.eq_ignore_ascii_case("break") {
        timeline.flush();
        timeline.push(Event::Break);
        return Ok(());
    }

    let Some((cmd, value)) = inside.split_once(':') else {
        return Err(DirectiveError::Malformed { directive });
    };
    let cmd = cmd.trim().to_lowercase();
    let value = value.trim();

    match cmd.as_str() {
        "pause" => {
            timeline.flush();
            let ms = parse_pause_seconds(value, opts.max_pause_ms, &directive)?;
            timeline.push(Event::Pause { ms });
        }
        "pause_ms" => {
            timeline.flush();
            let ms = parse_pause_millis(value, opts.max_pause_ms, &directive)?;
            timeline.push(Event::Pause { ms });
        }
        "voice" => {
            timeline.flush();
            if value.is_empty() {
                return Err(DirectiveError::EmptyVoice { directive });
            }
            timeline.state = timeline.state.with_voice(value);
        }
        "rate" => {
            timeline.flush();
            match parse_number(value) {
                Some(rate) if is_valid_rate(rate) => {
                    timeline.state = timeline.state.with_rate(rate);
                }
                _ => return Err(DirectiveError::InvalidRate { directive }),
            }
        }
        "pitch" => {
            timeline.flush();
            match parse_number(value) {
                Some(pitch) if is_valid_pitch(pitch) => {
                    timeline.state = timeline.state.with_pitch(pitch);
                }
                _ => return Err(DirectiveError::InvalidPitch { directive }),
            }
        }
        _ => return Err(DirectiveError::UnknownCommand { directive }),
    }

    Ok(())
}

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn positive_number(value: &str, directive: &str) -> Result<f64, DirectiveError> {
    match parse_number(value) {
        Some(v) if v > 0.0 => Ok(v),
        _ => Err(DirectiveError::InvalidPause {
            directive: directive.to_string(),
            reason: format!("\"{value}\" is not a positive number"),
        }),
    }
}

fn non_zero_ms(ms: f64, directive: &str) -> Result<u64, DirectiveError> {
    let rounded = ms.round();
    if rounded < 1.0 {
        return Err(DirectiveError::InvalidPause {
            directive: directive.to_string(),
            reason: "duration rounds to zero milliseconds".to_string(),
        });
    }
    Ok(rounded as u64)
}

fn parse_pause_seconds(value: &str, max_ms: u64, directive: &str) -> Result<u64, DirectiveError> {
    let seconds = positive_number(value, directive)?;
    let ms = non_zero_ms(seconds * 1000.0, directive)?;
    if ms > max_ms {
        return Err(DirectiveError::PauseTooLong {
            directive: directive.to_string(),
            max_ms,
        });
    }
    Ok(ms)
}

fn parse_pause_millis(value: &str, max_ms: u64, directive: &str) -> Result<u64, DirectiveError> {
    let ms = positive_number(value, directive)?;
    if ms > max_ms as f64 {
        return Err(DirectiveError::PauseTooLong {
            directive: directive.to_string(),
            max_ms,
        });
    }
    non_zero_ms(ms, directive)
}
