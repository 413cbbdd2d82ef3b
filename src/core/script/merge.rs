//! Overlay of request-level voice defaults onto a parsed timeline.

use super::events::{ConfigState, Event};

/// Returns a new timeline where every speak state has its unset fields
/// filled from `defaults`.
///
/// Values set by directives always win. Pause and break events pass through.
pub fn apply_defaults(defaults: &ConfigState, events: &[Event]) -> Vec<Event> {
    if defaults.is_empty() {
        return events.to_vec();
    }

    events
        .iter()
        .map(|event| match event {
            Event::Speak { text, state } => Event::Speak {
                text: text.clone(),
                state: state.or_defaults(defaults),
            },
            other => other.clone(),
        })
        .collect()
}
