//! WebRTC VAD backend for frame classification.
//!
//! Wraps the reference WebRTC voice activity detector. The detector only
//! accepts 8/16/32/48 kHz mono 16-bit input in 10/20/30 ms frames, so the
//! session's audio geometry is validated once at construction.
//!
//! `webrtc_vad::Vad` is not `Send`; a session must construct its classifier on
//! the thread that feeds it (see [`crate::session::worker`]).

use crate::config::AudioConfig;
use crate::error::{Result, SpeechgateError};
use crate::vad::classifier::{Aggressiveness, SpeechClassifier};
use webrtc_vad::{SampleRate, Vad, VadMode};

/// Speech classifier backed by the WebRTC voice activity detector.
pub struct WebRtcClassifier {
    vad: Vad,
    sample_rate: u32,
}

impl std::fmt::Debug for WebRtcClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebRtcClassifier")
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl WebRtcClassifier {
    /// Creates a classifier for the given audio geometry.
    ///
    /// Fails when the geometry is outside what the detector supports; a
    /// session must not start without a working classifier.
    pub fn new(aggressiveness: Aggressiveness, audio: &AudioConfig) -> Result<Self> {
        let sample_rate = match audio.sample_rate {
            8000 => SampleRate::Rate8kHz,
            16000 => SampleRate::Rate16kHz,
            32000 => SampleRate::Rate32kHz,
            48000 => SampleRate::Rate48kHz,
            other => {
                return Err(SpeechgateError::ClassifierInit {
                    message: format!(
                        "unsupported sample rate {} (must be 8000, 16000, 32000, or 48000)",
                        other
                    ),
                });
            }
        };

        if !matches!(audio.frame_duration_ms, 10 | 20 | 30) {
            return Err(SpeechgateError::ClassifierInit {
                message: format!(
                    "unsupported frame duration {}ms (must be 10, 20, or 30)",
                    audio.frame_duration_ms
                ),
            });
        }

        if audio.channels != 1 {
            return Err(SpeechgateError::ClassifierInit {
                message: format!("detector is mono-only, got {} channels", audio.channels),
            });
        }

        if audio.bytes_per_sample != 2 {
            return Err(SpeechgateError::ClassifierInit {
                message: format!(
                    "detector expects 16-bit samples, got {} bytes per sample",
                    audio.bytes_per_sample
                ),
            });
        }

        let mode = match aggressiveness.level() {
            0 => VadMode::Quality,
            1 => VadMode::LowBitrate,
            2 => VadMode::Aggressive,
            _ => VadMode::VeryAggressive,
        };

        let mut vad = Vad::new();
        vad.set_mode(mode);
        vad.set_sample_rate(sample_rate);

        Ok(Self {
            vad,
            sample_rate: audio.sample_rate,
        })
    }
}

impl SpeechClassifier for WebRtcClassifier {
    fn classify(&mut self, frame: &[u8], sample_rate: u32) -> Result<bool> {
        if sample_rate != self.sample_rate {
            return Err(SpeechgateError::Classification {
                message: format!(
                    "classifier configured for {} Hz, frame presented at {} Hz",
                    self.sample_rate, sample_rate
                ),
            });
        }

        if frame.len() % 2 != 0 {
            return Err(SpeechgateError::Classification {
                message: format!("frame length {} is not 16-bit aligned", frame.len()),
            });
        }

        let samples: Vec<i16> = frame
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        self.vad
            .is_voice_segment(&samples)
            .map_err(|e| SpeechgateError::Classification {
                message: format!("detector rejected frame of {} samples: {:?}", samples.len(), e),
            })
    }
}
