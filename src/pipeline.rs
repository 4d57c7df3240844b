//! Per-connection pipeline orchestrator.
//!
//! Wires the stations together for one connection:
//!
//! ```text
//! raw chunks ──▶ session worker thread ──▶ segments ──▶ transcribe dispatch ──▶ events
//!                (slice / classify / endpoint)           (fire-and-continue)
//! ```
//!
//! Segmentation proceeds whether or not the previous segment's transcription
//! has completed; dropping the handle is the single teardown signal and
//! triggers exactly one forced flush.

use crate::config::Config;
use crate::error::Result;
use crate::session::{SessionHandle, SessionWorker};
use crate::stt::{TranscribeDispatcher, Transcriber, TranscriptEvent};
use crate::vad::{Aggressiveness, SpeechClassifier, WebRtcClassifier};
use tokio::sync::mpsc;

/// Handle to one connection's running pipeline.
///
/// Cloneable; the pipeline tears down once every clone is dropped or closed.
#[derive(Clone)]
pub struct PipelineHandle {
    session: SessionHandle,
}

impl PipelineHandle {
    /// Feeds one chunk of raw audio into the pipeline.
    pub async fn feed(&self, chunk: Vec<u8>) -> Result<()> {
        self.session.feed(chunk).await
    }

    /// Closes this handle; the last close ends the session with a final flush.
    pub fn close(self) {
        self.session.close();
    }
}

/// Builds per-connection pipelines from one shared configuration.
pub struct SessionPipeline {
    config: Config,
}

impl SessionPipeline {
    /// Creates a pipeline factory with the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Starts a pipeline for one connection with an arbitrary classifier.
    ///
    /// `make_classifier` runs on the session's worker thread. A classifier
    /// construction failure aborts the start and is returned to the caller;
    /// nothing keeps running.
    pub async fn start<C, F, T>(
        &self,
        session_id: &str,
        make_classifier: F,
        transcriber: T,
    ) -> Result<(PipelineHandle, mpsc::Receiver<TranscriptEvent>)>
    where
        C: SpeechClassifier + 'static,
        F: FnOnce() -> Result<C> + Send + 'static,
        T: Transcriber + 'static,
    {
        let worker = SessionWorker::new(session_id, self.config.clone());
        let (session, segment_rx) = worker.spawn(make_classifier).await?;

        let (event_tx, event_rx) = mpsc::channel(self.config.pipeline.channel_buffer_size);
        let dispatcher = TranscribeDispatcher::new(session_id, transcriber);
        let max_concurrent = self.config.transcribe.max_concurrent;

        tokio::spawn(async move {
            dispatcher.run(segment_rx, event_tx, max_concurrent).await;
        });

        Ok((PipelineHandle { session }, event_rx))
    }

    /// Starts a pipeline using the WebRTC classifier from the configuration.
    pub async fn start_webrtc<T>(
        &self,
        session_id: &str,
        transcriber: T,
    ) -> Result<(PipelineHandle, mpsc::Receiver<TranscriptEvent>)>
    where
        T: Transcriber + 'static,
    {
        let aggressiveness = Aggressiveness::new(self.config.vad.aggressiveness)?;
        let audio = self.config.audio.clone();
        self.start(
            session_id,
            move || WebRtcClassifier::new(aggressiveness, &audio),
            transcriber,
        )
        .await
    }
}
