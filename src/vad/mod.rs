//! Speech/non-speech classification for fixed-size frames.
//!
//! The trait is the boundary; the WebRTC backend is the reference
//! implementation, the scripted and energy classifiers are substitutes for
//! tests and offline runs.

pub mod classifier;
pub mod webrtc;

pub use classifier::{
    Aggressiveness, EnergyClassifier, ScriptedClassifier, SpeechClassifier, calculate_rms,
};
pub use webrtc::WebRtcClassifier;
