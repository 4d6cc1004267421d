use std::sync::Arc;

use crate::config::MonitorCfg;
use crate::types::{Notification, NotificationAction};

/// Id every fake-charging alert is posted under, so reposts replace it.
pub const NOTIFICATION_ID: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("permission denied to show notifications")]
    PermissionDenied,
    #[error("notification permission not answered yet")]
    PermissionPending,
    #[error("notification channel {0} is unavailable")]
    ChannelUnavailable(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Notification channel registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
}

/// Platform notification surface. Delivery is fire-and-forget.
pub trait NotifySink: Send + Sync {
    fn create_channel(&self, channel: &ChannelSpec) -> Result<(), NotifyError>;
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Owns the notification template and creates the channel at most once.
pub struct Notifier {
    sink: Arc<dyn NotifySink>,
    channel: ChannelSpec,
    channel_ready: bool,
    template: Notification,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotifySink>, cfg: &MonitorCfg) -> Self {
        Self {
            sink,
            channel: ChannelSpec {
                id: cfg.notification_channel_id.clone(),
                name: cfg.notification_channel_name.clone(),
            },
            channel_ready: false,
            template: Notification {
                id: NOTIFICATION_ID,
                channel_id: cfg.notification_channel_id.clone(),
                title: cfg.notification_title.clone(),
                body: cfg.notification_body.clone(),
                auto_cancel: true,
                action: NotificationAction::ShowDiagnostics,
            },
        }
    }

    /// Register the channel unless that already succeeded.
    pub fn ensure_channel(&mut self) -> Result<(), NotifyError> {
        if self.channel_ready {
            return Ok(());
        }
        self.sink.create_channel(&self.channel)?;
        self.channel_ready = true;
        tracing::debug!(channel = %self.channel.id, "notification channel created");
        Ok(())
    }

    /// Post the fake-charging alert.
    pub fn post(&mut self) -> Result<(), NotifyError> {
        self.ensure_channel()?;
        self.sink.notify(&self.template)?;
        tracing::info!(id = self.template.id, channel = %self.template.channel_id, "notification posted");
        Ok(())
    }

    pub fn channel_ready(&self) -> bool {
        self.channel_ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Counting {
        channels: Mutex<u32>,
        posts: Mutex<Vec<Notification>>,
        fail_channel: bool,
    }

    impl NotifySink for Counting {
        fn create_channel(&self, channel: &ChannelSpec) -> Result<(), NotifyError> {
            if self.fail_channel {
                return Err(NotifyError::ChannelUnavailable(channel.id.clone()));
            }
            *self.channels.lock().unwrap() += 1;
            Ok(())
        }

        fn notify(&self, n: &Notification) -> Result<(), NotifyError> {
            self.posts.lock().unwrap().push(n.clone());
            Ok(())
        }
    }

    #[test]
    fn channel_created_once_across_posts() {
        let sink = Arc::new(Counting::default());
        let mut notifier = Notifier::new(sink.clone(), &MonitorCfg::default());
        notifier.ensure_channel().unwrap();
        notifier.post().unwrap();
        notifier.post().unwrap();
        assert_eq!(*sink.channels.lock().unwrap(), 1);
        let posts = sink.posts.lock().unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|n| n.id == NOTIFICATION_ID && n.auto_cancel));
        assert_eq!(posts[0].channel_id, "charging_channel");
    }

    #[test]
    fn failed_channel_blocks_post() {
        let sink = Arc::new(Counting { fail_channel: true, ..Default::default() });
        let mut notifier = Notifier::new(sink.clone(), &MonitorCfg::default());
        assert!(matches!(notifier.post(), Err(NotifyError::ChannelUnavailable(_))));
        assert!(!notifier.channel_ready());
        assert!(sink.posts.lock().unwrap().is_empty());
    }
}
