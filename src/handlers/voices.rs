use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::tts::ProviderVoice;
use crate::errors::AppResult;
use crate::state::AppState;

/// Language used when the query does not name one.
pub const DEFAULT_VOICES_LANG: &str = "pt-BR";
/// Voices per gender in the `recommended` block.
const RECOMMENDED_PER_GENDER: usize = 2;

#[derive(Debug, Deserialize)]
pub struct VoicesQuery {
    pub lang: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// `Male`, `Female` or `Unknown`
    pub gender: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommended {
    pub male: Vec<VoiceEntry>,
    pub female: Vec<VoiceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub provider: String,
    pub lang: String,
    pub count: usize,
    pub recommended: Recommended,
    pub voices: Vec<VoiceEntry>,
}

/// Maps provider gender labels onto `Male`, `Female` or `Unknown`.
pub fn normalize_gender(gender: Option<&str>) -> &'static str {
    match gender.map(|g| g.trim().to_lowercase()).as_deref() {
        Some("male" | "m") => "Male",
        Some("female" | "f") => "Female",
        _ => "Unknown",
    }
}

impl From<ProviderVoice> for VoiceEntry {
    fn from(voice: ProviderVoice) -> Self {
        Self {
            gender: normalize_gender(voice.gender.as_deref()).to_string(),
            name: voice.name,
            lang: voice.lang,
        }
    }
}

/// Lists provider voices for a language with a short recommendation.
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VoicesQuery>,
) -> AppResult<Json<VoicesResponse>> {
    let lang = query
        .lang
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_VOICES_LANG.to_string());

    let voices: Vec<VoiceEntry> = state
        .service
        .voices(Some(&lang))
        .await?
        .into_iter()
        .map(VoiceEntry::from)
        .collect();

    let pick = |gender: &str| -> Vec<VoiceEntry> {
        voices
            .iter()
            .filter(|v| v.gender == gender)
            .take(RECOMMENDED_PER_GENDER)
            .cloned()
            .collect()
    };
    let recommended = Recommended {
        male: pick("Male"),
        female: pick("Female"),
    };

    Ok(Json(VoicesResponse {
        provider: state.service.provider_name().to_string(),
        lang,
        count: voices.len(),
        recommended,
        voices,
    }))
}
