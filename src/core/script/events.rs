//! Event timeline produced by the directive parser.
//!
//! A script is rendered by replaying its events in order: every [`Event::Speak`]
//! carries its own [`ConfigState`] snapshot so no event ever refers to another.

use serde::{Deserialize, Serialize};

/// Lowest accepted speaking rate multiplier.
pub const MIN_RATE: f64 = 0.5;
/// Highest accepted speaking rate multiplier.
pub const MAX_RATE: f64 = 2.0;
/// Lowest accepted pitch offset.
pub const MIN_PITCH: f64 = -20.0;
/// Highest accepted pitch offset.
pub const MAX_PITCH: f64 = 20.0;

/// Voice parameters applied to a span of narrated text.
///
/// An unset field means "use the provider default", which is not the same
/// as zero. Unset fields are left out of the serialized form so that the
/// cache id only depends on what was actually requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
}

impl ConfigState {
    /// Returns a copy with the voice replaced.
    pub fn with_voice(&self, voice: impl Into<String>) -> Self {
        Self {
            voice: Some(voice.into()),
            ..self.clone()
        }
    }

    /// Returns a copy with the rate replaced.
    pub fn with_rate(&self, rate: f64) -> Self {
        Self {
            rate: Some(rate),
            ..self.clone()
        }
    }

    /// Returns a copy with the pitch replaced.
    pub fn with_pitch(&self, pitch: f64) -> Self {
        Self {
            pitch: Some(pitch),
            ..self.clone()
        }
    }

    /// Fills every unset field from `defaults`, keeping fields that are already set.
    pub fn or_defaults(&self, defaults: &ConfigState) -> Self {
        Self {
            lang: self.lang.clone().or_else(|| defaults.lang.clone()),
            voice: self.voice.clone().or_else(|| defaults.voice.clone()),
            rate: self.rate.or(defaults.rate),
            pitch: self.pitch.or(defaults.pitch),
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.lang.is_none() && self.voice.is_none() && self.rate.is_none() && self.pitch.is_none()
    }
}

/// Checks a rate multiplier against the accepted range.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && (MIN_RATE..=MAX_RATE).contains(&rate)
}

/// Checks a pitch offset against the accepted range.
pub fn is_valid_pitch(pitch: f64) -> bool {
    pitch.is_finite() && (MIN_PITCH..=MAX_PITCH).contains(&pitch)
}

/// One unit of the parsed timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    /// Narrated text under a voice configuration snapshot.
    Speak { text: String, state: ConfigState },
    /// Silence of an exact duration in milliseconds.
    Pause { ms: u64 },
    /// Segmentation marker; carries no audio.
    Break,
}

impl Event {
    /// Shorthand for building a speak event.
    pub fn speak(text: impl Into<String>, state: ConfigState) -> Self {
        Event::Speak {
            text: text.into(),
            state,
        }
    }

    /// Voice referenced by a speak event, if any.
    pub fn voice(&self) -> Option<&str> {
        match self {
            Event::Speak { state, .. } => state.voice.as_deref(),
            _ => None,
        }
    }
}
