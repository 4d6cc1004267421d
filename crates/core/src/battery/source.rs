use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::types::BatterySample;

/// Sample channel sender that sources push battery updates into.
pub type SampleSender = mpsc::Sender<BatterySample>;
/// Sample channel receiver the monitor reads from.
pub type SampleReceiver = mpsc::Receiver<BatterySample>;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source already has a subscriber")]
    AlreadySubscribed,
    #[error("no battery found under {0}")]
    NoBattery(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A feed of battery status updates with a subscribe/unsubscribe lifecycle.
pub trait BatterySource: Send {
    /// Start delivering samples. A source has at most one subscriber.
    fn subscribe(&mut self, buffer: usize) -> Result<SampleReceiver, SourceError>;

    /// Stop delivering samples. No-op when not subscribed.
    fn unsubscribe(&mut self);
}

impl<T: BatterySource + ?Sized> BatterySource for Box<T> {
    fn subscribe(&mut self, buffer: usize) -> Result<SampleReceiver, SourceError> {
        (**self).subscribe(buffer)
    }

    fn unsubscribe(&mut self) {
        (**self).unsubscribe()
    }
}

type Slot = Arc<Mutex<Option<SampleSender>>>;

/// In-process source fed by hand through a [`ManualFeed`].
#[derive(Debug)]
pub struct ManualSource {
    slot: Slot,
}

/// Producer half of a [`ManualSource`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ManualFeed {
    slot: Slot,
}

impl ManualSource {
    pub fn new() -> (Self, ManualFeed) {
        let slot: Slot = Arc::new(Mutex::new(None));
        (Self { slot: slot.clone() }, ManualFeed { slot })
    }
}

impl BatterySource for ManualSource {
    fn subscribe(&mut self, buffer: usize) -> Result<SampleReceiver, SourceError> {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        if slot.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(SourceError::AlreadySubscribed);
        }
        let (tx, rx) = mpsc::channel(buffer.max(1));
        *slot = Some(tx);
        Ok(rx)
    }

    fn unsubscribe(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        if slot.take().is_some() {
            tracing::debug!("manual source unsubscribed");
        }
    }
}

impl ManualFeed {
    /// Push a sample. Returns false when nobody is subscribed.
    pub async fn push(&self, sample: BatterySample) -> bool {
        let tx = self
            .slot
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        match tx {
            Some(tx) => tx.send(sample).await.is_ok(),
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn push_without_subscriber_is_dropped() {
        let (_source, feed) = ManualSource::new();
        assert!(!feed.push(BatterySample::charging(50)).await);
        assert!(!feed.is_subscribed());
    }

    #[tokio::test]
    async fn subscribe_then_push() {
        let (mut source, feed) = ManualSource::new();
        let mut rx = source.subscribe(4).unwrap();
        assert!(feed.push(BatterySample::charging(50)).await);
        let s = rx.recv().await.unwrap();
        assert_eq!(s.level, Some(50));
    }

    #[tokio::test]
    async fn double_subscribe_rejected() {
        let (mut source, _feed) = ManualSource::new();
        let _rx = source.subscribe(4).unwrap();
        assert!(matches!(source.subscribe(4), Err(SourceError::AlreadySubscribed)));
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let (mut source, feed) = ManualSource::new();
        source.unsubscribe();
        let _rx = source.subscribe(4).unwrap();
        source.unsubscribe();
        source.unsubscribe();
        assert!(!feed.push(BatterySample::not_charging()).await);
        // resubscribe after unsubscribe works
        assert!(source.subscribe(4).is_ok());
    }
}
