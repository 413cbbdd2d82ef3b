pub mod cache;
pub mod codec;
pub mod format;
pub mod pipeline;
pub mod script;
pub mod service;
pub mod tts;

// Re-export commonly used types for convenience
pub use format::AudioFormat;
pub use pipeline::{PipelineError, SynthesisPipeline, ValidationError};
pub use script::{ConfigState, DirectiveError, Event, ParseOptions, apply_defaults, parse};
pub use service::{ScriptRequest, ServiceError, SpeechService, SynthesisOutcome};
pub use tts::{
    BoxedSpeechProvider, SpeechProvider, TTSError, TTSResult, create_speech_provider,
};
