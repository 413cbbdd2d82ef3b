//! # Synthesis pipeline
//!
//! Turns a merged event timeline into one artifact in the audio directory:
//! validate voices, synthesize and normalize each segment, concatenate,
//! transcode, then persist metadata through the cache store.
//!
//! Every intermediate file is tracked by [`ScratchFiles`] and removed when
//! the run ends, whether it succeeded or not.

pub mod errors;
mod runner;
pub mod scratch;

pub use errors::{PipelineError, PipelineResult, ValidationError};
pub use runner::{PipelineJob, PipelineOutput, SynthesisPipeline, UNKNOWN_VOICE_SAMPLE};
pub use scratch::ScratchFiles;
