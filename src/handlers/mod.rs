//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `tts` - Rendering endpoint
//! - `audio` - Artifact download endpoint
//! - `voices` - Voice listing endpoint

pub mod api;
pub mod audio;
pub mod tts;
pub mod voices;
