//! Per-connection segmentation sessions.
//!
//! A session owns one slicer + segmenter + classifier triple for the lifetime
//! of one connection. Frames are processed synchronously, in strict arrival
//! order; nothing in here is shared between sessions.

pub mod worker;

use crate::config::Config;
use crate::error::Result;
use crate::segment::{Frame, FrameSlicer, Segment, Segmenter};
use crate::vad::{Aggressiveness, SpeechClassifier, WebRtcClassifier};
use tracing::{debug, info, trace, warn};

pub use worker::{SessionHandle, SessionWorker};

/// One connection's segmentation state: slicer, endpointing machine, and
/// classifier, keyed by a session id used in every log event.
pub struct Session<C: SpeechClassifier> {
    id: String,
    sample_rate: u32,
    slicer: FrameSlicer,
    segmenter: Segmenter,
    classifier: C,
}

impl Session<WebRtcClassifier> {
    /// Opens a session backed by the WebRTC classifier configured from
    /// `config`.
    ///
    /// A classifier construction failure is fatal for this session and is
    /// returned to the caller; the session must not proceed without one.
    pub fn open(id: impl Into<String>, config: &Config) -> Result<Self> {
        let aggressiveness = Aggressiveness::new(config.vad.aggressiveness)?;
        let classifier = WebRtcClassifier::new(aggressiveness, &config.audio)?;
        Self::new(id, config, classifier)
    }
}

impl<C: SpeechClassifier> Session<C> {
    /// Creates a session with an externally supplied classifier.
    pub fn new(id: impl Into<String>, config: &Config, classifier: C) -> Result<Self> {
        let id = id.into();
        let segmenter_config = config.segmenter_config()?;

        debug!(
            session = %id,
            frame_bytes = segmenter_config.frame_bytes,
            eos_silence_frames = segmenter_config.eos_silence_frames,
            min_speech_frames = segmenter_config.min_speech_frames,
            "session initialized"
        );

        Ok(Self {
            id,
            sample_rate: config.audio.sample_rate,
            slicer: FrameSlicer::new(segmenter_config.frame_bytes),
            segmenter: Segmenter::new(segmenter_config),
            classifier,
        })
    }

    /// Returns the session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns true while an utterance is being accumulated.
    pub fn is_speaking(&self) -> bool {
        self.segmenter.is_speaking()
    }

    /// Feeds one chunk of raw audio, returning any utterances it completes.
    ///
    /// Chunks may be of any size, including empty, with no frame alignment.
    /// A classifier failure never propagates: the session logs it, drops all
    /// buffered audio (residual bytes and in-progress utterance alike), and
    /// keeps accepting chunks.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Segment> {
        if chunk.is_empty() {
            trace!(session = %self.id, "empty chunk ignored");
            return Vec::new();
        }

        // Collected up front so the slicer can be cleared on failure without
        // fighting the borrow held by its draining iterator.
        let frames: Vec<Frame> = self.slicer.feed(chunk).collect();

        let mut segments = Vec::new();
        for frame in frames {
            let verdict = match self.classifier.classify(frame.as_bytes(), self.sample_rate) {
                Ok(verdict) => verdict,
                Err(e) => {
                    warn!(
                        session = %self.id,
                        error = %e,
                        "classifier failed, dropping buffered audio and continuing"
                    );
                    self.slicer.clear();
                    self.segmenter.reset();
                    return segments;
                }
            };

            let was_speaking = self.segmenter.is_speaking();
            let emitted = self.segmenter.observe(&frame, verdict);

            if !was_speaking && self.segmenter.is_speaking() {
                debug!(session = %self.id, "speech started");
            }

            if let Some(segment) = emitted {
                info!(
                    session = %self.id,
                    segment_id = segment.segment_id,
                    bytes = segment.len(),
                    "utterance finalized"
                );
                segments.push(segment);
            } else if was_speaking && !self.segmenter.is_speaking() {
                debug!(session = %self.id, "utterance discarded as too short");
            }
        }

        segments
    }

    /// Forced flush at connection teardown.
    ///
    /// Emits the in-progress utterance, untrimmed, if it is long enough to be
    /// worth transcribing. Always leaves the session empty and idle;
    /// calling again yields nothing.
    pub fn finish(&mut self) -> Option<Segment> {
        self.slicer.clear();
        let segment = self.segmenter.flush();

        match &segment {
            Some(segment) => info!(
                session = %self.id,
                segment_id = segment.segment_id,
                bytes = segment.len(),
                "flushed in-progress utterance at teardown"
            ),
            None => debug!(session = %self.id, "session closed with nothing to flush"),
        }

        segment
    }
}
