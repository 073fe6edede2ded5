//! # Playback Controller
//!
//! Drives the host audio transport through the `Idle → Loading → Playing ⇄
//! Paused` lifecycle. Exactly one transport handle is live at a time; the
//! previous one is paused and released before the next is opened.
//!
//! Completion is a message, not a callback: the transport posts
//! [`TransportEvent`]s on a channel and the controller's own task consumes
//! them, taking the same state lock as user-initiated calls. A completion
//! racing a `play` therefore serializes instead of re-entering.

use std::sync::Arc;
use std::time::Duration;

use subtune_bridge::{AudioSource, AudioTransport, TransportEvent, TransportHandle};
use subtune_catalog::Song;
use subtune_runtime::events::{CoreEvent, PlaybackEvent};
use subtune_runtime::{EventBus, OfflineCoordinator};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::error::{PlaybackError, Result};
use crate::fetch::{DownloadOrchestrator, PlayableUri};
use crate::queue::{PlayQueue, QueueState, RepeatMode};

/// Jump size for the relative seek helpers.
const SEEK_STEP: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Loading,
    Playing,
    Paused,
}

struct State {
    status: PlaybackStatus,
    handle: Option<Box<dyn TransportHandle>>,
    queue: QueueState,
}

struct Inner {
    transport: Arc<dyn AudioTransport>,
    orchestrator: Arc<DownloadOrchestrator>,
    offline: Arc<OfflineCoordinator>,
    events: EventBus,
    state: Mutex<State>,
    transport_events: mpsc::UnboundedSender<TransportEvent>,
}

pub struct PlaybackController {
    inner: Arc<Inner>,
}

impl PlaybackController {
    /// Create the controller and spawn its transport-event task.
    pub fn new(
        transport: Arc<dyn AudioTransport>,
        orchestrator: Arc<DownloadOrchestrator>,
        offline: Arc<OfflineCoordinator>,
        events: EventBus,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            transport,
            orchestrator,
            offline,
            events,
            state: Mutex::new(State {
                status: PlaybackStatus::Idle,
                handle: None,
                queue: QueueState::new(),
            }),
            transport_events: tx,
        });

        let task_inner = Arc::clone(&inner);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    TransportEvent::Finished => task_inner.on_finished().await,
                    TransportEvent::Failed { message } => task_inner.on_failed(message).await,
                }
            }
        });

        Self { inner }
    }

    /// Replace the queue and start playing from `start`.
    pub async fn play_queue(&self, queue: PlayQueue, start: usize) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        state.queue.set_queue(queue, start);
        match state.queue.current_song().cloned() {
            Some(song) => self.inner.play_locked(&mut state, song).await,
            None => {
                self.inner.stop_locked(&mut state).await;
                Ok(())
            }
        }
    }

    /// Skip to the resolved next track; ends playback at a hard boundary.
    pub async fn next(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        self.inner.advance_locked(&mut state, Advance::Forward).await
    }

    /// Skip to the resolved previous track.
    pub async fn previous(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        self.inner.advance_locked(&mut state, Advance::Backward).await
    }

    /// Pause playback. No-op without a live transport.
    pub async fn pause(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.status != PlaybackStatus::Playing {
            return Ok(());
        }
        if let Some(handle) = state.handle.as_mut() {
            handle
                .pause()
                .await
                .map_err(|e| PlaybackError::Transport(e.to_string()))?;
            state.status = PlaybackStatus::Paused;
            self.inner.emit_for_current(&state, |song_id| PlaybackEvent::Paused { song_id });
        }
        Ok(())
    }

    /// Resume paused playback. No-op unless paused.
    pub async fn resume(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.status != PlaybackStatus::Paused {
            return Ok(());
        }
        if let Some(handle) = state.handle.as_mut() {
            handle
                .play()
                .await
                .map_err(|e| PlaybackError::Transport(e.to_string()))?;
            state.status = PlaybackStatus::Playing;
            self.inner.emit_for_current(&state, |song_id| PlaybackEvent::Resumed { song_id });
        }
        Ok(())
    }

    /// Stop playback and release the transport.
    pub async fn stop(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        self.inner.stop_locked(&mut state).await;
        Ok(())
    }

    /// Seek to an absolute position, clamped to `[0, duration]`. Seek
    /// errors are logged, never fatal; no-op without a transport.
    pub async fn seek_to(&self, position: Duration) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        self.inner.seek_locked(&mut state, position).await;
        Ok(())
    }

    /// Jump forward by ten seconds.
    pub async fn seek_forward(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let Some(handle) = state.handle.as_mut() else {
            return Ok(());
        };
        let position = handle.position().await.unwrap_or(Duration::ZERO);
        let target = position + SEEK_STEP;
        self.inner.seek_locked(&mut state, target).await;
        Ok(())
    }

    /// Jump back by ten seconds, stopping at the beginning.
    pub async fn seek_backward(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let Some(handle) = state.handle.as_mut() else {
            return Ok(());
        };
        let position = handle.position().await.unwrap_or(Duration::ZERO);
        let target = position.saturating_sub(SEEK_STEP);
        self.inner.seek_locked(&mut state, target).await;
        Ok(())
    }

    /// Change playback rate. No-op without a transport.
    pub async fn set_rate(&self, rate: f32) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if let Some(handle) = state.handle.as_mut() {
            handle
                .set_rate(rate)
                .await
                .map_err(|e| PlaybackError::Transport(e.to_string()))?;
        }
        Ok(())
    }

    pub async fn set_shuffle(&self, shuffle: bool) {
        self.inner.state.lock().await.queue.set_shuffle(shuffle);
    }

    pub async fn toggle_shuffle(&self) {
        self.inner.state.lock().await.queue.toggle_shuffle();
    }

    pub async fn set_repeat(&self, repeat: RepeatMode) {
        self.inner.state.lock().await.queue.set_repeat(repeat);
    }

    pub async fn cycle_repeat(&self) {
        self.inner.state.lock().await.queue.cycle_repeat();
    }

    pub async fn shuffle(&self) -> bool {
        self.inner.state.lock().await.queue.shuffle()
    }

    pub async fn repeat(&self) -> RepeatMode {
        self.inner.state.lock().await.queue.repeat()
    }

    pub async fn status(&self) -> PlaybackStatus {
        self.inner.state.lock().await.status
    }

    pub async fn current_song(&self) -> Option<Song> {
        self.inner.state.lock().await.queue.current_song().cloned()
    }

    /// Current position, zero without a transport.
    pub async fn position(&self) -> Duration {
        let state = self.inner.state.lock().await;
        match state.handle.as_ref() {
            Some(handle) => handle.position().await.unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        }
    }
}

#[derive(Clone, Copy)]
enum Advance {
    Forward,
    Backward,
}

impl Inner {
    /// Release any live handle. Pause failures are ignored (the handle is
    /// going away), release failures only logged.
    async fn release_handle(&self, state: &mut State) {
        if let Some(mut handle) = state.handle.take() {
            handle.pause().await.ok();
            if let Err(e) = handle.release().await {
                warn!(error = %e, "Transport release failed");
            }
        }
    }

    async fn stop_locked(&self, state: &mut State) {
        self.release_handle(state).await;
        if state.status != PlaybackStatus::Idle {
            state.status = PlaybackStatus::Idle;
            self.emit_for_current(state, |song_id| PlaybackEvent::Stopped { song_id });
        }
    }

    async fn play_locked(&self, state: &mut State, song: Song) -> Result<()> {
        self.release_handle(state).await;
        state.status = PlaybackStatus::Loading;

        // Offline with nothing cached: fail fast, no network attempt.
        let offline = self.offline.effective_offline().await.unwrap_or(true);
        if offline && !self.orchestrator.has_local_audio(&song.id).await {
            state.status = PlaybackStatus::Idle;
            let err = PlaybackError::OfflineRestriction {
                title: song.title.clone(),
            };
            self.events
                .emit(CoreEvent::Playback(PlaybackEvent::Error {
                    song_id: Some(song.id.to_string()),
                    message: err.to_string(),
                    recoverable: true,
                }))
                .ok();
            return Err(err);
        }

        let uri = match self.orchestrator.resolve(&song).await {
            Ok(uri) => uri,
            Err(e) => {
                state.status = PlaybackStatus::Idle;
                self.emit_error(&song, &e, false);
                return Err(e);
            }
        };
        let source = match uri {
            PlayableUri::Local(path) => AudioSource::LocalFile { path },
            PlayableUri::Remote(url) => AudioSource::RemoteStream { url },
        };

        let mut handle = match self
            .transport
            .open(source, self.transport_events.clone())
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                state.status = PlaybackStatus::Idle;
                let err = PlaybackError::Transport(e.to_string());
                self.emit_error(&song, &err, false);
                return Err(err);
            }
        };
        if let Err(e) = handle.play().await {
            state.status = PlaybackStatus::Idle;
            handle.release().await.ok();
            let err = PlaybackError::Transport(e.to_string());
            self.emit_error(&song, &err, false);
            return Err(err);
        }

        state.handle = Some(handle);
        state.status = PlaybackStatus::Playing;
        info!(song_id = %song.id, title = %song.title, "Playback started");
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Started {
                song_id: song.id.to_string(),
                title: song.title.clone(),
            }))
            .ok();
        Ok(())
    }

    async fn advance_locked(&self, state: &mut State, direction: Advance) -> Result<()> {
        let next = {
            let mut rng = rand::thread_rng();
            match direction {
                Advance::Forward => state.queue.next(&mut rng).cloned(),
                Advance::Backward => state.queue.previous(&mut rng).cloned(),
            }
        };
        match next {
            Some(song) => self.play_locked(state, song).await,
            None => {
                debug!("Queue exhausted, stopping");
                self.stop_locked(state).await;
                Ok(())
            }
        }
    }

    async fn seek_locked(&self, state: &mut State, target: Duration) {
        let Some(handle) = state.handle.as_mut() else {
            return;
        };
        let clamped = match handle.duration().await {
            Ok(Some(duration)) => target.min(duration),
            _ => target,
        };
        if let Err(e) = handle.seek(clamped).await {
            warn!(error = %e, "Seek failed");
        }
    }

    async fn on_finished(&self) {
        let mut state = self.state.lock().await;
        if state.status != PlaybackStatus::Playing {
            return;
        }
        self.emit_for_current(&state, |song_id| PlaybackEvent::Completed { song_id });

        if let Err(e) = self.advance_locked(&mut state, Advance::Forward).await {
            debug!(error = %e, "Could not start the next track");
        }
    }

    async fn on_failed(&self, message: String) {
        let mut state = self.state.lock().await;
        if state.handle.is_none() {
            return;
        }
        warn!(%message, "Transport failed mid-stream");
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Error {
                song_id: state.queue.current_song().map(|s| s.id.to_string()),
                message,
                recoverable: false,
            }))
            .ok();
        self.release_handle(&mut state).await;
        state.status = PlaybackStatus::Idle;
    }

    fn emit_for_current(&self, state: &State, build: impl FnOnce(String) -> PlaybackEvent) {
        if let Some(song) = state.queue.current_song() {
            self.events
                .emit(CoreEvent::Playback(build(song.id.to_string())))
                .ok();
        }
    }

    fn emit_error(&self, song: &Song, error: &PlaybackError, recoverable: bool) {
        self.events
            .emit(CoreEvent::Playback(PlaybackEvent::Error {
                song_id: Some(song.id.to_string()),
                message: error.to_string(),
                recoverable,
            }))
            .ok();
    }
}
