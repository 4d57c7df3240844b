use crate::defaults;
use crate::error::{Result, SpeechgateError};
use crate::segment::SegmenterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub vad: VadConfig,
    pub transcribe: TranscribeConfig,
    pub pipeline: PipelineConfig,
}

/// Audio frame geometry configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub frame_duration_ms: u32,
    pub bytes_per_sample: u32,
    pub channels: u32,
}

/// Endpointing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VadConfig {
    pub aggressiveness: u8,
    pub eos_silence_duration_ms: u32,
    pub min_speech_duration_ms: u32,
}

/// Downstream transcription configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscribeConfig {
    pub max_concurrent: usize,
}

/// Pipeline plumbing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub channel_buffer_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            frame_duration_ms: defaults::FRAME_DURATION_MS,
            bytes_per_sample: defaults::BYTES_PER_SAMPLE,
            channels: defaults::CHANNELS,
        }
    }
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            aggressiveness: defaults::AGGRESSIVENESS,
            eos_silence_duration_ms: defaults::EOS_SILENCE_DURATION_MS,
            min_speech_duration_ms: defaults::MIN_SPEECH_DURATION_MS,
        }
    }
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::MAX_CONCURRENT_TRANSCRIPTIONS,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: defaults::CHANNEL_BUFFER_SIZE,
        }
    }
}

impl AudioConfig {
    /// Size of one classified frame in bytes.
    pub fn frame_bytes(&self) -> usize {
        (self.sample_rate as u64 * self.frame_duration_ms as u64 / 1000
            * self.bytes_per_sample as u64
            * self.channels as u64) as usize
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SPEECHGATE_SAMPLE_RATE → audio.sample_rate
    /// - SPEECHGATE_AGGRESSIVENESS → vad.aggressiveness
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(rate) = std::env::var("SPEECHGATE_SAMPLE_RATE")
            && let Ok(rate) = rate.parse::<u32>()
        {
            self.audio.sample_rate = rate;
        }

        if let Ok(mode) = std::env::var("SPEECHGATE_AGGRESSIVENESS")
            && let Ok(mode) = mode.parse::<u8>()
        {
            self.vad.aggressiveness = mode;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/speechgate/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("speechgate")
            .join("config.toml")
    }

    /// Validate the configuration and resolve duration-based options into the
    /// frame-count thresholds the segmenter works with.
    ///
    /// Resolution happens once per session; the state machine itself never
    /// sees milliseconds.
    pub fn segmenter_config(&self) -> Result<SegmenterConfig> {
        if self.audio.bytes_per_sample == 0 {
            return Err(SpeechgateError::ConfigInvalidValue {
                key: "audio.bytes_per_sample".to_string(),
                message: "must be non-zero".to_string(),
            });
        }
        if self.audio.channels == 0 {
            return Err(SpeechgateError::ConfigInvalidValue {
                key: "audio.channels".to_string(),
                message: "must be non-zero".to_string(),
            });
        }
        if self.audio.frame_duration_ms == 0 {
            return Err(SpeechgateError::ConfigInvalidValue {
                key: "audio.frame_duration_ms".to_string(),
                message: "must be non-zero".to_string(),
            });
        }

        let frame_bytes = self.audio.frame_bytes();
        if frame_bytes == 0 {
            return Err(SpeechgateError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "frame geometry resolves to zero bytes per frame".to_string(),
            });
        }

        let eos_silence_frames = self.vad.eos_silence_duration_ms / self.audio.frame_duration_ms;
        if eos_silence_frames == 0 {
            return Err(SpeechgateError::ConfigInvalidValue {
                key: "vad.eos_silence_duration_ms".to_string(),
                message: format!(
                    "must cover at least one {}ms frame",
                    self.audio.frame_duration_ms
                ),
            });
        }

        let min_speech_frames = self.vad.min_speech_duration_ms / self.audio.frame_duration_ms;

        Ok(SegmenterConfig {
            frame_bytes,
            eos_silence_frames,
            min_speech_frames,
        })
    }
}
