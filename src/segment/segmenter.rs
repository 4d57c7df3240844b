//! Utterance endpointing state machine.
//!
//! Consumes classified frames and decides where utterances begin and end.
//! Hysteresis: a short burst of mid-utterance silence (breath, pause) must not
//! fragment one utterance into many; only sustained silence of the configured
//! duration closes it. The silence that triggered the close is acoustic
//! padding, not speech, and is trimmed before emission.

use crate::defaults;
use crate::segment::frame::Frame;

/// Frame-count thresholds the state machine operates on.
///
/// Duration-based options are resolved into these once, at session
/// construction (see [`crate::config::Config::segmenter_config`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmenterConfig {
    /// Size of one classified frame in bytes.
    pub frame_bytes: usize,
    /// Consecutive silent frames that end an utterance.
    pub eos_silence_frames: u32,
    /// Minimum speech frames for an utterance to be worth emitting.
    pub min_speech_frames: u32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            frame_bytes: (defaults::SAMPLE_RATE * defaults::FRAME_DURATION_MS / 1000
                * defaults::BYTES_PER_SAMPLE
                * defaults::CHANNELS) as usize,
            eos_silence_frames: defaults::EOS_SILENCE_DURATION_MS / defaults::FRAME_DURATION_MS,
            min_speech_frames: defaults::MIN_SPEECH_DURATION_MS / defaults::FRAME_DURATION_MS,
        }
    }
}

/// Current endpointing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// No utterance in progress. Silent frames are discarded, never buffered.
    Idle,
    /// An utterance is being accumulated, embedded silence included.
    Speaking,
}

/// One finalized utterance, ready for downstream transcription.
///
/// The buffer is moved out of the segmenter on emission; the segmenter never
/// aliases or mutates it afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Per-session monotonic identifier.
    pub segment_id: u64,
    /// Raw PCM bytes of the utterance, trailing silence trimmed (unless
    /// `flushed_on_close`).
    pub bytes: Vec<u8>,
    /// True when emitted by the teardown flush, where no silence tail exists
    /// to trim.
    pub flushed_on_close: bool,
}

impl Segment {
    /// Number of whole frames in this segment.
    pub fn frame_count(&self, frame_bytes: usize) -> usize {
        self.bytes.len() / frame_bytes
    }

    /// Segment length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the segment holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Endpointing state machine with speaking/silence hysteresis.
///
/// Strictly single-threaded: frames must be observed in arrival order, one at
/// a time. All logging lives with the caller; the machine itself is pure.
#[derive(Debug)]
pub struct Segmenter {
    config: SegmenterConfig,
    state: SegmenterState,
    accumulator: Vec<u8>,
    consecutive_silent_frames: u32,
    next_segment_id: u64,
}

impl Segmenter {
    /// Creates a segmenter in the Idle state with an empty accumulator.
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            state: SegmenterState::Idle,
            accumulator: Vec::new(),
            consecutive_silent_frames: 0,
            next_segment_id: 0,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> SegmenterState {
        self.state
    }

    /// Returns true while an utterance is being accumulated.
    pub fn is_speaking(&self) -> bool {
        self.state == SegmenterState::Speaking
    }

    /// Current silent-frame run length while Speaking.
    pub fn consecutive_silent_frames(&self) -> u32 {
        self.consecutive_silent_frames
    }

    /// Bytes currently buffered for the in-progress utterance.
    pub fn buffered_len(&self) -> usize {
        self.accumulator.len()
    }

    /// Advances the state machine by one classified frame.
    ///
    /// Returns a finalized segment when this frame completes the sustained
    /// silence run that ends an utterance and the utterance survives the
    /// minimum-length check.
    pub fn observe(&mut self, frame: &Frame, is_speech: bool) -> Option<Segment> {
        match (self.state, is_speech) {
            (SegmenterState::Idle, true) => {
                self.state = SegmenterState::Speaking;
                self.accumulator.extend_from_slice(frame.as_bytes());
                self.consecutive_silent_frames = 0;
                None
            }
            (SegmenterState::Idle, false) => None,
            (SegmenterState::Speaking, true) => {
                self.accumulator.extend_from_slice(frame.as_bytes());
                self.consecutive_silent_frames = 0;
                None
            }
            (SegmenterState::Speaking, false) => {
                // Silence is buffered so it can be trimmed as trailing context
                // if this run turns out to end the utterance.
                self.accumulator.extend_from_slice(frame.as_bytes());
                self.consecutive_silent_frames += 1;

                if self.consecutive_silent_frames >= self.config.eos_silence_frames {
                    self.end_of_speech()
                } else {
                    None
                }
            }
        }
    }

    /// Closes the current utterance after sustained silence.
    ///
    /// The trailing silence span is trimmed; utterances shorter than the
    /// minimum are discarded. The machine always returns to Idle with an
    /// empty accumulator, whatever the outcome.
    fn end_of_speech(&mut self) -> Option<Segment> {
        let trailing_silence_bytes =
            self.config.eos_silence_frames as usize * self.config.frame_bytes;

        let emitted = if self.accumulator.len() > trailing_silence_bytes {
            let speech_len = self.accumulator.len() - trailing_silence_bytes;
            if speech_len / self.config.frame_bytes >= self.config.min_speech_frames as usize {
                let mut bytes = std::mem::take(&mut self.accumulator);
                bytes.truncate(speech_len);
                Some(self.finalize(bytes, false))
            } else {
                // Too short: a click or blip, not an utterance.
                None
            }
        } else {
            // Nothing but the silence span itself is buffered.
            None
        };

        self.accumulator.clear();
        self.state = SegmenterState::Idle;
        self.consecutive_silent_frames = 0;
        emitted
    }

    /// Forced flush at teardown.
    ///
    /// There is no guaranteed silence tail at disconnect, so nothing is
    /// trimmed. Idempotent: a second call on the reset machine yields nothing.
    pub fn flush(&mut self) -> Option<Segment> {
        let emitted = if self.state == SegmenterState::Speaking
            && self.accumulator.len() / self.config.frame_bytes
                >= self.config.min_speech_frames as usize
        {
            let bytes = std::mem::take(&mut self.accumulator);
            Some(self.finalize(bytes, true))
        } else {
            None
        };

        self.reset();
        emitted
    }

    /// Discards any in-progress utterance and returns to Idle.
    ///
    /// Segment ids keep counting; a recovered session never reuses one.
    pub fn reset(&mut self) {
        self.accumulator.clear();
        self.state = SegmenterState::Idle;
        self.consecutive_silent_frames = 0;
    }

    fn finalize(&mut self, bytes: Vec<u8>, flushed_on_close: bool) -> Segment {
        let segment_id = self.next_segment_id;
        self.next_segment_id += 1;
        Segment {
            segment_id,
            bytes,
            flushed_on_close,
        }
    }
}
