//! Downstream transcription: the collaborator trait and the fire-and-continue
//! dispatch station that feeds it.

pub mod dispatcher;
pub mod transcriber;

pub use dispatcher::{TranscribeDispatcher, TranscriptEvent};
pub use transcriber::{MockTranscriber, Transcriber};
