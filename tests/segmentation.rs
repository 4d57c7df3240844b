//! End-to-end segmentation tests at the default audio geometry:
//! 16kHz mono 16-bit, 30ms frames (960 bytes), end-of-speech after 23 silent
//! frames (700ms), minimum utterance 6 frames (200ms).

use speechgate::SessionPipeline;
use speechgate::config::Config;
use speechgate::segment::Segment;
use speechgate::session::Session;
use speechgate::stt::{MockTranscriber, TranscriptEvent};
use speechgate::vad::ScriptedClassifier;
use tokio::sync::mpsc;

const FRAME_BYTES: usize = 960;
const EOS_FRAMES: usize = 23;

fn speech_then_silence(speech: usize, silence: usize) -> Vec<bool> {
    let mut verdicts = vec![true; speech];
    verdicts.extend(vec![false; silence]);
    verdicts
}

fn stream(frames: usize) -> Vec<u8> {
    vec![0u8; frames * FRAME_BYTES]
}

fn run_session(verdicts: Vec<bool>, chunks: &[Vec<u8>]) -> (Vec<Segment>, Option<Segment>) {
    let mut session = Session::new(
        "it",
        &Config::default(),
        ScriptedClassifier::from_verdicts(verdicts),
    )
    .unwrap();

    let mut segments = Vec::new();
    for chunk in chunks {
        segments.extend(session.feed(chunk));
    }
    let flushed = session.finish();
    (segments, flushed)
}

#[test]
fn silence_only_stream_emits_nothing() {
    let (segments, flushed) = run_session(vec![false; 100], &[stream(100)]);
    assert!(segments.is_empty());
    assert!(flushed.is_none());
}

#[test]
fn ten_speech_frames_with_eos_tail_emit_one_trimmed_segment() {
    let (segments, flushed) = run_session(
        speech_then_silence(10, EOS_FRAMES),
        &[stream(10 + EOS_FRAMES)],
    );
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].len(), 10 * FRAME_BYTES); // 9600 bytes
    assert!(!segments[0].flushed_on_close);
    assert!(flushed.is_none());
}

#[test]
fn four_speech_frames_are_rejected_as_too_short() {
    let (segments, flushed) = run_session(
        speech_then_silence(4, EOS_FRAMES),
        &[stream(4 + EOS_FRAMES)],
    );
    assert!(segments.is_empty());
    assert!(flushed.is_none());
}

#[test]
fn six_speech_frames_meet_the_minimum_exactly() {
    let (segments, _) = run_session(
        speech_then_silence(6, EOS_FRAMES),
        &[stream(6 + EOS_FRAMES)],
    );
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].len(), 6 * FRAME_BYTES);
}

#[test]
fn ten_speech_frames_without_tail_flush_untrimmed_at_cleanup() {
    let (segments, flushed) = run_session(speech_then_silence(10, 0), &[stream(10)]);
    assert!(segments.is_empty());
    let segment = flushed.unwrap();
    assert_eq!(segment.len(), 10 * FRAME_BYTES); // 9600 bytes, no trim
    assert!(segment.flushed_on_close);
}

#[test]
fn silence_shorter_than_eos_threshold_keeps_the_utterance_open() {
    let mut verdicts = speech_then_silence(10, EOS_FRAMES - 1);
    verdicts.extend(speech_then_silence(10, EOS_FRAMES));
    let total = verdicts.len();
    let (segments, flushed) = run_session(verdicts, &[stream(total)]);

    // The sub-threshold pause is embedded; one segment spans both speech runs.
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].len(), (10 + EOS_FRAMES - 1 + 10) * FRAME_BYTES);
    assert!(flushed.is_none());
}

#[test]
fn consecutive_utterances_are_emitted_separately_in_order() {
    let mut verdicts = speech_then_silence(8, EOS_FRAMES);
    verdicts.extend(speech_then_silence(6, EOS_FRAMES));
    let total = verdicts.len();
    let (segments, _) = run_session(verdicts, &[stream(total)]);

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].segment_id, 0);
    assert_eq!(segments[0].len(), 8 * FRAME_BYTES);
    assert_eq!(segments[1].segment_id, 1);
    assert_eq!(segments[1].len(), 6 * FRAME_BYTES);
}

#[test]
fn rechunking_the_stream_yields_identical_segments() {
    let verdicts = speech_then_silence(10, EOS_FRAMES);
    let bytes = stream(10 + EOS_FRAMES);

    let chunkings: Vec<Vec<Vec<u8>>> = vec![
        // One big chunk.
        vec![bytes.clone()],
        // Frame-aligned chunks.
        bytes.chunks(FRAME_BYTES).map(<[u8]>::to_vec).collect(),
        // Awkward prime-sized chunks.
        bytes.chunks(991).map(<[u8]>::to_vec).collect(),
        // Single-byte chunks.
        bytes.chunks(1).map(<[u8]>::to_vec).collect(),
    ];

    let mut results = Vec::new();
    for chunks in &chunkings {
        let (segments, flushed) = run_session(verdicts.clone(), chunks);
        assert!(flushed.is_none());
        results.push(segments);
    }

    for other in &results[1..] {
        assert_eq!(&results[0], other);
    }
}

#[test]
fn cleanup_is_idempotent() {
    let mut session = Session::new(
        "it",
        &Config::default(),
        ScriptedClassifier::from_verdicts(vec![true; 10]),
    )
    .unwrap();
    session.feed(&stream(10));

    assert!(session.finish().is_some());
    assert!(session.finish().is_none());
}

#[test]
fn classifier_failure_discards_utterance_and_session_recovers() {
    // An utterance is under way when frame 5 fails; afterwards a fresh
    // utterance must be detected and emitted on its own.
    let mut verdicts = vec![true; 5]; // interrupted utterance
    verdicts.push(false); // consumed by the injected failure at index 5
    verdicts.extend(speech_then_silence(10, EOS_FRAMES)); // clean utterance
    let mut session = Session::new(
        "it",
        &Config::default(),
        ScriptedClassifier::from_verdicts(verdicts).with_failure_at(5),
    )
    .unwrap();

    // Frames 0-4 accumulate, frame 5 fails and resets everything.
    assert!(session.feed(&stream(6)).is_empty());
    assert!(!session.is_speaking());

    let segments = session.feed(&stream(10 + EOS_FRAMES));
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].len(), 10 * FRAME_BYTES);
    assert!(session.finish().is_none());
}

async fn drain(mut rx: mpsc::Receiver<TranscriptEvent>) -> Vec<TranscriptEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn pipeline_transcribes_utterances_in_order() {
    // One transcription at a time so completion order matches dispatch order.
    let mut config = Config::default();
    config.transcribe.max_concurrent = 1;
    let pipeline = SessionPipeline::new(config);
    let (handle, event_rx) = pipeline
        .start(
            "client-9",
            || {
                let mut verdicts = speech_then_silence(10, EOS_FRAMES);
                verdicts.extend(speech_then_silence(7, EOS_FRAMES));
                Ok(ScriptedClassifier::from_verdicts(verdicts))
            },
            MockTranscriber::new().with_response("ok"),
        )
        .await
        .unwrap();

    let bytes = stream(10 + EOS_FRAMES + 7 + EOS_FRAMES);
    for chunk in bytes.chunks(4096) {
        handle.feed(chunk.to_vec()).await.unwrap();
    }
    handle.close();

    let events = drain(event_rx).await;
    assert_eq!(events.len(), 2);
    match (&events[0], &events[1]) {
        (
            TranscriptEvent::Transcript {
                segment_id: first,
                audio_len_bytes: first_len,
                ..
            },
            TranscriptEvent::Transcript {
                segment_id: second,
                audio_len_bytes: second_len,
                ..
            },
        ) => {
            assert_eq!(*first, 0);
            assert_eq!(*first_len, 10 * FRAME_BYTES);
            assert_eq!(*second, 1);
            assert_eq!(*second_len, 7 * FRAME_BYTES);
        }
        other => panic!("expected two transcripts, got {:?}", other),
    }
}
