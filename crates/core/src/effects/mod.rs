//! Side effects of a confirmed fake-charging session.
//!
//! The monitor never renders, notifies or plays anything itself. It drives
//! three collaborators through [`Effects`]:
//!
//! - [`DisplaySink`] shows the fabricated reading,
//! - [`NotifySink`] posts the alert (through [`Notifier`], which owns the
//!   template and the one-time channel registration),
//! - [`AudioBackend`] plays the cue (through [`AudioCue`], which bounds and
//!   de-duplicates playback).

pub mod audio;
pub mod display;
pub mod log;
pub mod notify;

use std::sync::Arc;
use std::time::Duration;

pub use audio::{AudioBackend, AudioCue, AudioError, CueId, CueLease};
pub use display::DisplaySink;
pub use notify::{ChannelSpec, Notifier, NotifyError, NotifySink, NOTIFICATION_ID};

use crate::config::MonitorCfg;
use crate::types::FakeReading;

pub struct Effects {
    display: Arc<dyn DisplaySink>,
    notifier: Notifier,
    audio: AudioCue,
    reading: FakeReading,
    clip: String,
    audio_max: Duration,
}

impl Effects {
    pub fn new(
        cfg: &MonitorCfg,
        display: Arc<dyn DisplaySink>,
        notify: Arc<dyn NotifySink>,
        audio: Arc<dyn AudioBackend>,
    ) -> Self {
        Self {
            display,
            notifier: Notifier::new(notify, cfg),
            audio: AudioCue::new(audio),
            reading: FakeReading {
                level_pct: cfg.fake_level_pct,
                image: cfg.fake_image.clone(),
            },
            clip: cfg.audio_clip.clone(),
            audio_max: Duration::from_millis(cfg.audio_max_ms),
        }
    }

    /// Tracing-backed effects for headless runs.
    pub fn logging(cfg: &MonitorCfg, notifications_granted: bool) -> Self {
        Self::new(
            cfg,
            Arc::new(log::TracingDisplay),
            Arc::new(log::TracingNotifier::new(notifications_granted)),
            Arc::new(log::TracingAudio),
        )
    }

    pub fn show_fake_reading(&self) {
        self.display.show(&self.reading);
    }

    pub fn prepare_channel(&mut self) -> Result<(), NotifyError> {
        self.notifier.ensure_channel()
    }

    pub fn notify(&mut self) -> Result<(), NotifyError> {
        self.notifier.post()
    }

    pub fn start_cue(&mut self) -> Option<CueLease> {
        self.audio.play_once(&self.clip, self.audio_max)
    }

    pub fn release_cue(&mut self, id: CueId) -> bool {
        self.audio.release(id)
    }

    /// Release everything held. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.audio.stop();
    }
}
