use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio device error: {0}")]
    Device(String),
}

/// Playback device. `stop` may be called when nothing plays.
pub trait AudioBackend: Send + Sync {
    fn start(&self, clip: &str) -> Result<(), AudioError>;
    fn stop(&self);
}

/// Identifies one playback; stale releases carry an old id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CueId(u64);

/// Granted by [`AudioCue::play_once`]. The holder must release the cue
/// after `expires_after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueLease {
    pub id: CueId,
    pub expires_after: Duration,
}

/// Bounded, non-reentrant audio cue. While a cue is held further
/// `play_once` calls are ignored.
pub struct AudioCue {
    backend: Arc<dyn AudioBackend>,
    held: Option<CueId>,
    next_id: u64,
}

impl AudioCue {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            held: None,
            next_id: 0,
        }
    }

    /// Start `clip` unless a cue is already held.
    pub fn play_once(&mut self, clip: &str, max_duration: Duration) -> Option<CueLease> {
        if let Some(id) = self.held {
            tracing::debug!(?id, "audio cue already playing, ignoring");
            return None;
        }
        if let Err(e) = self.backend.start(clip) {
            tracing::warn!(clip, error = %e, "failed to start audio cue");
            return None;
        }
        self.next_id += 1;
        let id = CueId(self.next_id);
        self.held = Some(id);
        tracing::info!(clip, max_ms = max_duration.as_millis() as u64, "audio cue started");
        Some(CueLease {
            id,
            expires_after: max_duration,
        })
    }

    /// Release the cue named by `id`. Returns false for stale or unknown ids.
    pub fn release(&mut self, id: CueId) -> bool {
        if self.held != Some(id) {
            return false;
        }
        self.held = None;
        self.backend.stop();
        tracing::debug!(?id, "audio cue released");
        true
    }

    /// Stop whatever is held. No-op when idle.
    pub fn stop(&mut self) {
        if let Some(id) = self.held {
            self.release(id);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.held.is_some()
    }
}
