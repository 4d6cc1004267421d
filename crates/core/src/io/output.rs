use std::time::Duration;

use tokio::sync::mpsc;

/// How long a toast stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLength {
    Short,
    Long,
}

impl ToastLength {
    pub fn duration(self) -> Duration {
        match self {
            Self::Short => Duration::from_millis(2_000),
            Self::Long => Duration::from_millis(3_500),
        }
    }
}

/// A transient, dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub content: String,
    pub length: ToastLength,
}

impl Toast {
    pub fn short(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            length: ToastLength::Short,
        }
    }

    pub fn long(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            length: ToastLength::Long,
        }
    }
}

/// Output channel sender that the monitor pushes toasts into.
pub type OutputSender = mpsc::Sender<Toast>;
/// Output channel receiver front ends read from.
pub type OutputReceiver = mpsc::Receiver<Toast>;

/// Create an output channel with the given buffer size.
pub fn channel(buffer: usize) -> (OutputSender, OutputReceiver) {
    mpsc::channel(buffer)
}

/// Queue a toast without waiting. A full or closed channel drops it.
pub fn post(tx: &OutputSender, toast: Toast) {
    if let Err(e) = tx.try_send(toast) {
        tracing::debug!(error = %e, "toast dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_toast() {
        let t = Toast::short("hello");
        assert_eq!(t.content, "hello");
        assert_eq!(t.length, ToastLength::Short);
        assert!(t.length.duration() < ToastLength::Long.duration());
    }

    #[tokio::test]
    async fn post_delivers() {
        let (tx, mut rx) = channel(4);
        post(&tx, Toast::long("test"));
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.content, "test");
    }

    #[tokio::test]
    async fn post_on_full_channel_drops() {
        let (tx, mut rx) = channel(1);
        post(&tx, Toast::short("a"));
        post(&tx, Toast::short("b"));
        assert_eq!(rx.recv().await.unwrap().content, "a");
        assert!(rx.try_recv().is_err());
    }
}
