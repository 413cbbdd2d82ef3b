//! Content-addressed identifiers for rendered scripts.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::store::Result;
use crate::core::format::AudioFormat;
use crate::core::script::Event;

/// Everything that influences the rendered audio, in canonical field order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyMaterial<'a> {
    provider: &'a str,
    preferred_format: AudioFormat,
    sample_rate_hz: u32,
    events: &'a [Event],
}

/// Derives the 64-character lowercase hex id for a merged timeline.
///
/// Two requests share an id exactly when their provider, output format,
/// sample rate and events (content and order) are identical.
pub fn derive_id(
    provider: &str,
    format: AudioFormat,
    sample_rate_hz: u32,
    events: &[Event],
) -> Result<String> {
    let material = KeyMaterial {
        provider,
        preferred_format: format,
        sample_rate_hz,
        events,
    };

    let canonical = serde_json::to_vec(&material)?;
    let digest = Sha256::digest(&canonical);
    Ok(format!("{digest:x}"))
}
