use std::sync::atomic::{AtomicBool, Ordering};

use super::audio::{AudioBackend, AudioError};
use super::display::DisplaySink;
use super::notify::{ChannelSpec, NotifyError, NotifySink};
use crate::types::{FakeReading, Notification};

/// Display sink for headless runs: the reading goes to the log.
#[derive(Debug, Default)]
pub struct TracingDisplay;

impl DisplaySink for TracingDisplay {
    fn show(&self, reading: &FakeReading) {
        tracing::info!(level_pct = reading.level_pct, image = %reading.image, "display: fake battery reading");
    }
}

/// Notify sink for headless runs. Delivery honours the permission flag.
#[derive(Debug)]
pub struct TracingNotifier {
    granted: AtomicBool,
}

impl TracingNotifier {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
        }
    }

    pub fn set_granted(&self, granted: bool) {
        self.granted.store(granted, Ordering::Relaxed);
    }
}

impl NotifySink for TracingNotifier {
    fn create_channel(&self, channel: &ChannelSpec) -> Result<(), NotifyError> {
        tracing::info!(id = %channel.id, name = %channel.name, "notification channel registered");
        Ok(())
    }

    fn notify(&self, n: &Notification) -> Result<(), NotifyError> {
        if !self.granted.load(Ordering::Relaxed) {
            return Err(NotifyError::PermissionDenied);
        }
        tracing::info!(
            id = n.id,
            channel = %n.channel_id,
            title = %n.title,
            body = %n.body,
            action = n.action.intent(),
            "notification"
        );
        Ok(())
    }
}

/// Audio backend for headless runs; there is no device, only log lines.
#[derive(Debug, Default)]
pub struct TracingAudio;

impl AudioBackend for TracingAudio {
    fn start(&self, clip: &str) -> Result<(), AudioError> {
        tracing::info!(clip, "audio: play");
        Ok(())
    }

    fn stop(&self) {
        tracing::info!("audio: stop");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationAction;

    fn sample() -> Notification {
        Notification {
            id: 1,
            channel_id: "charging_channel".into(),
            title: "t".into(),
            body: "b".into(),
            auto_cancel: true,
            action: NotificationAction::ShowDiagnostics,
        }
    }

    #[test]
    fn denied_until_granted() {
        let n = TracingNotifier::new(false);
        assert!(matches!(n.notify(&sample()), Err(NotifyError::PermissionDenied)));
        n.set_granted(true);
        assert!(n.notify(&sample()).is_ok());
    }
}
