use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use chargewatch_core::effects::{AudioBackend, AudioError, ChannelSpec, DisplaySink, NotifyError, NotifySink};
use chargewatch_core::types::{FakeReading, Notification};
use tokio::sync::mpsc;

/// Effects forwarded from the monitor task to the TUI loop.
#[derive(Debug)]
pub enum UiEvent {
    Reading(FakeReading),
    Notification(Notification),
    Cue { clip: Option<String> },
}

pub type UiSender = mpsc::UnboundedSender<UiEvent>;

pub struct TuiDisplay(pub UiSender);

impl DisplaySink for TuiDisplay {
    fn show(&self, reading: &FakeReading) {
        let _ = self.0.send(UiEvent::Reading(reading.clone()));
    }
}

// 0 until the prompt is answered
const GRANTED: u8 = 1;
const DENIED: u8 = 2;

/// Answer to the launch-time permission prompt, shared between the key
/// handler and the notifier.
#[derive(Debug, Clone, Default)]
pub struct PermissionGate(Arc<AtomicU8>);

impl PermissionGate {
    pub fn answer(&self, granted: bool) {
        let v = if granted { GRANTED } else { DENIED };
        self.0.store(v, Ordering::Relaxed);
    }

    pub fn check(&self) -> Result<(), NotifyError> {
        match self.0.load(Ordering::Relaxed) {
            GRANTED => Ok(()),
            DENIED => Err(NotifyError::PermissionDenied),
            _ => Err(NotifyError::PermissionPending),
        }
    }
}

/// Notification surface gated by the permission the user answered at launch.
pub struct TuiNotifier {
    pub tx: UiSender,
    pub gate: PermissionGate,
}

impl NotifySink for TuiNotifier {
    fn create_channel(&self, channel: &ChannelSpec) -> Result<(), NotifyError> {
        tracing::debug!(id = %channel.id, "tui notification channel ready");
        Ok(())
    }

    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.gate.check()?;
        self.tx
            .send(UiEvent::Notification(notification.clone()))
            .map_err(|_| NotifyError::Delivery("terminal closed".into()))
    }
}

/// There is no sound in a terminal; the cue shows as a status marker.
pub struct TuiAudio(pub UiSender);

impl AudioBackend for TuiAudio {
    fn start(&self, clip: &str) -> Result<(), AudioError> {
        self.0
            .send(UiEvent::Cue { clip: Some(clip.to_owned()) })
            .map_err(|_| AudioError::Device("terminal closed".into()))
    }

    fn stop(&self) {
        let _ = self.0.send(UiEvent::Cue { clip: None });
    }
}
