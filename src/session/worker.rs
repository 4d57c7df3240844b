//! Dedicated worker thread for one session.
//!
//! The WebRTC classifier is not `Send`, so a session runs on its own OS
//! thread: the classifier is constructed inside the thread and never crosses
//! it. Audio chunks come in over a tokio channel, finalized segments go out
//! over another, so the async side never blocks on classification and
//! different sessions never share state.

use crate::config::Config;
use crate::error::{Result, SpeechgateError};
use crate::segment::Segment;
use crate::session::Session;
use crate::vad::SpeechClassifier;
use std::thread;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Handle for feeding audio into a running session worker.
///
/// Dropping every handle closes the chunk channel, which triggers the
/// worker's single teardown flush and lets the thread exit.
#[derive(Clone)]
pub struct SessionHandle {
    chunks: mpsc::Sender<Vec<u8>>,
    session_id: String,
}

impl SessionHandle {
    /// Sends one chunk of raw audio to the session.
    ///
    /// Fails only when the worker has already shut down.
    pub async fn feed(&self, chunk: Vec<u8>) -> Result<()> {
        self.chunks
            .send(chunk)
            .await
            .map_err(|_| SpeechgateError::SessionWorker {
                session_id: self.session_id.clone(),
                message: "worker is no longer accepting audio".to_string(),
            })
    }

    /// Closes this handle, signalling end of input once all clones are gone.
    pub fn close(self) {}
}

/// Spawns session workers: one thread, one classifier, one connection each.
pub struct SessionWorker {
    session_id: String,
    config: Config,
}

impl SessionWorker {
    /// Creates a worker description for the given session id.
    pub fn new(session_id: impl Into<String>, config: Config) -> Self {
        Self {
            session_id: session_id.into(),
            config,
        }
    }

    /// Starts the worker thread.
    ///
    /// `make_classifier` runs on the worker thread, so the classifier never
    /// has to be `Send`. Construction is awaited: a classifier initialization
    /// failure is returned here, to the caller that tried to start the
    /// session, and no thread is left running.
    ///
    /// Returns a handle for feeding chunks and the receiver of finalized
    /// segments. The segment channel closes after the teardown flush.
    pub async fn spawn<C, F>(
        self,
        make_classifier: F,
    ) -> Result<(SessionHandle, mpsc::Receiver<Segment>)>
    where
        C: SpeechClassifier + 'static,
        F: FnOnce() -> Result<C> + Send + 'static,
    {
        let buffer = self.config.pipeline.channel_buffer_size;
        let (chunk_tx, chunk_rx) = mpsc::channel::<Vec<u8>>(buffer);
        let (segment_tx, segment_rx) = mpsc::channel::<Segment>(buffer);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();

        let session_id = self.session_id.clone();
        let config = self.config;

        thread::Builder::new()
            .name(format!("speechgate-session-{}", session_id))
            .spawn(move || {
                let session = make_classifier()
                    .and_then(|classifier| Session::new(session_id.clone(), &config, classifier));

                let mut session = match session {
                    Ok(session) => {
                        let _ = ready_tx.send(Ok(()));
                        session
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                run_session(&mut session, chunk_rx, segment_tx);
            })
            .map_err(|e| SpeechgateError::SessionWorker {
                session_id: self.session_id.clone(),
                message: format!("failed to spawn worker thread: {}", e),
            })?;

        ready_rx
            .await
            .map_err(|_| SpeechgateError::SessionWorker {
                session_id: self.session_id.clone(),
                message: "worker thread exited before reporting readiness".to_string(),
            })??;

        let handle = SessionHandle {
            chunks: chunk_tx,
            session_id: self.session_id,
        };
        Ok((handle, segment_rx))
    }
}

/// Worker loop: drain chunks until the channel closes, then flush exactly
/// once. Runs on the dedicated thread, blocking on both channels.
fn run_session<C: SpeechClassifier>(
    session: &mut Session<C>,
    mut chunks: mpsc::Receiver<Vec<u8>>,
    segments: mpsc::Sender<Segment>,
) {
    'recv: while let Some(chunk) = chunks.blocking_recv() {
        for segment in session.feed(&chunk) {
            if segments.blocking_send(segment).is_err() {
                // Downstream is gone; stop consuming and fall through to the
                // teardown flush so the session still ends cleanly.
                warn!(session = %session.id(), "segment receiver dropped, shutting down");
                break 'recv;
            }
        }
    }

    if let Some(segment) = session.finish() {
        let _ = segments.blocking_send(segment);
    }

    debug!(session = %session.id(), "worker thread exiting");
}
