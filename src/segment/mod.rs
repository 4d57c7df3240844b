//! Frame slicing and utterance endpointing.
//!
//! ```text
//! raw byte chunks ──▶ FrameSlicer ──▶ fixed frames ──▶ classifier verdicts
//!                                                           │
//!                     Segment ◀── Segmenter state machine ◀─┘
//! ```
//!
//! The slicer knows nothing about speech; the segmenter knows nothing about
//! byte alignment. The session layer wires them to a classifier.

pub mod frame;
pub mod segmenter;

pub use frame::{Frame, FrameSlicer, Frames};
pub use segmenter::{Segment, Segmenter, SegmenterConfig, SegmenterState};
