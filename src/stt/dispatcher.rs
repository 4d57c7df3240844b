//! Fire-and-continue transcription dispatch.
//!
//! Segments are dispatched to the downstream transcriber in utterance order,
//! each as its own task behind a concurrency limit, so a slow backend never
//! stalls audio ingestion. Completions may interleave; failures are logged per
//! segment and never touch segmentation state.

use crate::segment::Segment;
use crate::stt::transcriber::Transcriber;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, warn};

/// Events emitted for a session's transcription results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TranscriptEvent {
    /// A finalized utterance was transcribed.
    Transcript {
        session_id: String,
        segment_id: u64,
        transcript: String,
        audio_len_bytes: usize,
    },
    /// The utterance flushed at connection teardown was transcribed.
    FinalTranscript {
        session_id: String,
        segment_id: u64,
        transcript: String,
        audio_len_bytes: usize,
    },
    /// Transcription of one segment failed; later segments are unaffected.
    Error {
        session_id: String,
        segment_id: u64,
        message: String,
    },
}

impl TranscriptEvent {
    /// Serialize event to JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Dispatches a session's segments to the downstream transcriber.
pub struct TranscribeDispatcher<T: Transcriber> {
    session_id: String,
    transcriber: Arc<T>,
}

impl<T: Transcriber + 'static> TranscribeDispatcher<T> {
    /// Creates a dispatcher for one session.
    pub fn new(session_id: impl Into<String>, transcriber: T) -> Self {
        Self {
            session_id: session_id.into(),
            transcriber: Arc::new(transcriber),
        }
    }

    /// Creates a dispatcher sharing an existing transcriber.
    pub fn from_arc(session_id: impl Into<String>, transcriber: Arc<T>) -> Self {
        Self {
            session_id: session_id.into(),
            transcriber,
        }
    }

    /// Runs the dispatcher until the segment channel closes and all in-flight
    /// transcriptions finish.
    ///
    /// Segments are picked up strictly in arrival order; at most
    /// `max_concurrent` transcriptions run at once. Each result or failure is
    /// reported as a [`TranscriptEvent`]; a failure never stops the loop.
    pub async fn run(
        self,
        mut input: mpsc::Receiver<Segment>,
        output: mpsc::Sender<TranscriptEvent>,
        max_concurrent: usize,
    ) {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        while let Some(segment) = input.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let transcriber = Arc::clone(&self.transcriber);
            let output = output.clone();
            let session_id = self.session_id.clone();

            tokio::spawn(async move {
                let _permit = permit;

                let segment_id = segment.segment_id;
                let audio_len_bytes = segment.len();
                let event = match transcriber.transcribe(&segment.bytes).await {
                    Ok(transcript) => {
                        debug!(
                            session = %session_id,
                            segment_id,
                            "transcription completed"
                        );
                        if segment.flushed_on_close {
                            TranscriptEvent::FinalTranscript {
                                session_id,
                                segment_id,
                                transcript,
                                audio_len_bytes,
                            }
                        } else {
                            TranscriptEvent::Transcript {
                                session_id,
                                segment_id,
                                transcript,
                                audio_len_bytes,
                            }
                        }
                    }
                    Err(e) => {
                        warn!(
                            session = %session_id,
                            segment_id,
                            error = %e,
                            "transcription failed"
                        );
                        TranscriptEvent::Error {
                            session_id,
                            segment_id,
                            message: e.to_string(),
                        }
                    }
                };

                let _ = output.send(event).await;
            });
        }

        // Wait for in-flight transcriptions before closing the event channel.
        let _ = semaphore.acquire_many(max_concurrent as u32).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::transcriber::MockTranscriber;

    fn make_segment(id: u64, len: usize, flushed_on_close: bool) -> Segment {
        Segment {
            segment_id: id,
            bytes: vec![0u8; len],
            flushed_on_close,
        }
    }

    async fn run_dispatcher(
        transcriber: MockTranscriber,
        segments: Vec<Segment>,
        max_concurrent: usize,
    ) -> Vec<TranscriptEvent> {
        let (segment_tx, segment_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::channel(16);

        let dispatcher = TranscribeDispatcher::new("test", transcriber);
        let task = tokio::spawn(async move {
            dispatcher.run(segment_rx, event_tx, max_concurrent).await;
        });

        for segment in segments {
            segment_tx.send(segment).await.unwrap();
        }
        drop(segment_tx);
        task.await.unwrap();

        let mut events = Vec::new();
        while let Some(event) = event_rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_dispatcher_emits_transcript_events() {
        let events = run_dispatcher(
            MockTranscriber::new().with_response("hello"),
            vec![make_segment(0, 960, false)],
            2,
        )
        .await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            TranscriptEvent::Transcript {
                session_id,
                segment_id,
                transcript,
                audio_len_bytes,
            } => {
                assert_eq!(session_id, "test");
                assert_eq!(*segment_id, 0);
                assert_eq!(transcript, "hello (960 bytes)");
                assert_eq!(*audio_len_bytes, 960);
            }
            other => panic!("expected Transcript, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatcher_marks_teardown_segment_final() {
        let events = run_dispatcher(
            MockTranscriber::new(),
            vec![make_segment(3, 480, true)],
            2,
        )
        .await;

        assert!(matches!(
            events[0],
            TranscriptEvent::FinalTranscript { segment_id: 3, .. }
        ));
    }

    #[tokio::test]
    async fn test_dispatcher_failure_is_isolated_per_segment() {
        let events = run_dispatcher(
            MockTranscriber::new().with_failure(),
            vec![make_segment(0, 100, false), make_segment(1, 100, false)],
            1,
        )
        .await;

        // Both segments produce an error event; neither kills the loop.
        assert_eq!(events.len(), 2);
        assert!(
            events
                .iter()
                .all(|e| matches!(e, TranscriptEvent::Error { .. }))
        );
    }

    #[tokio::test]
    async fn test_dispatcher_sequential_limit_preserves_order() {
        // With max_concurrent = 1 events must come out in segment order even
        // with a slow backend.
        let events = run_dispatcher(
            MockTranscriber::new().with_delay_ms(10),
            (0..4).map(|i| make_segment(i, 100, false)).collect(),
            1,
        )
        .await;

        let ids: Vec<u64> = events
            .iter()
            .map(|e| match e {
                TranscriptEvent::Transcript { segment_id, .. } => *segment_id,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_dispatcher_concurrent_completions_all_arrive() {
        let events = run_dispatcher(
            MockTranscriber::new().with_delay_ms(5),
            (0..6).map(|i| make_segment(i, 100, false)).collect(),
            3,
        )
        .await;

        let mut ids: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                TranscriptEvent::Transcript { segment_id, .. } => Some(*segment_id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_transcript_event_json_shape() {
        let event = TranscriptEvent::Transcript {
            session_id: "client-1".to_string(),
            segment_id: 7,
            transcript: "hello there".to_string(),
            audio_len_bytes: 9600,
        };
        let json = event.to_json().unwrap();
        assert!(json.contains(r#""event":"transcript""#));
        assert!(json.contains(r#""session_id":"client-1""#));
        assert!(json.contains(r#""audio_len_bytes":9600"#));

        let parsed: TranscriptEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
