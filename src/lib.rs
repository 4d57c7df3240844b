//! speechgate - Real-time utterance endpointing for streaming transcription
//!
//! Decides, frame by frame and with bounded memory, which spans of a raw audio
//! stream are utterances worth sending to a slow external transcription
//! service.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod segment;
pub mod session;
pub mod stt;
pub mod vad;

// Core traits (classify → segment → transcribe)
pub use stt::transcriber::Transcriber;
pub use vad::classifier::SpeechClassifier;

// Segmentation
pub use segment::{Frame, FrameSlicer, Segment, Segmenter, SegmenterConfig, SegmenterState};

// Session lifecycle
pub use session::{Session, SessionHandle, SessionWorker};

// Pipeline
pub use pipeline::{PipelineHandle, SessionPipeline};

// Error handling
pub use error::{Result, SpeechgateError};

// Config
pub use config::Config;
