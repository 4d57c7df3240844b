//! Default configuration constants for speechgate.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and is one of the four rates
/// the frame classifier accepts (8, 16, 32, 48 kHz).
pub const SAMPLE_RATE: u32 = 16000;

/// Default duration of one classified frame in milliseconds.
///
/// The classifier accepts 10, 20, or 30ms frames; 30ms gives the most context
/// per verdict and the fewest classifier calls per second of audio.
pub const FRAME_DURATION_MS: u32 = 30;

/// Bytes per audio sample (16-bit signed PCM).
pub const BYTES_PER_SAMPLE: u32 = 2;

/// Number of audio channels (mono).
pub const CHANNELS: u32 = 1;

/// Default classifier aggressiveness (0-3).
///
/// 0 is most permissive (rarely clips speech, more false positives), 3 is
/// strictest. 1 is a good balance for close-mic input.
pub const AGGRESSIVENESS: u8 = 1;

/// Default sustained silence in milliseconds that ends an utterance.
///
/// 700ms tolerates breaths and mid-sentence pauses without splitting one
/// utterance into several.
pub const EOS_SILENCE_DURATION_MS: u32 = 700;

/// Default minimum utterance duration in milliseconds.
///
/// Anything shorter is treated as a click or blip and discarded instead of
/// being sent to transcription.
pub const MIN_SPEECH_DURATION_MS: u32 = 200;

/// Default maximum number of concurrent downstream transcription calls.
pub const MAX_CONCURRENT_TRANSCRIPTIONS: usize = 2;

/// Default channel buffer size between pipeline stations.
pub const CHANNEL_BUFFER_SIZE: usize = 100;
