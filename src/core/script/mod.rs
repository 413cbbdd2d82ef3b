//! Annotated script handling: directive parsing and default merging.

pub mod events;
pub mod merge;
pub mod parser;

pub use events::{
    ConfigState, Event, MAX_PITCH, MAX_RATE, MIN_PITCH, MIN_RATE, is_valid_pitch, is_valid_rate,
};
pub use merge::apply_defaults;
pub use parser::{DirectiveError, ParseOptions, parse};
