use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::session::ArmTicket;
use crate::effects::CueId;

/// A delayed callback delivered back into the monitor loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    ConfirmationDue(ArmTicket),
    CueExpired(CueId),
}

/// One-shot delayed events. Each scheduled event runs as its own sleeping
/// task and reports back through a channel, so handling stays on the
/// monitor's task. Fired events are never cancelled individually; only
/// [`Timers::cancel_all`] aborts them.
#[derive(Debug)]
pub struct Timers {
    tx: mpsc::UnboundedSender<TimerEvent>,
    rx: mpsc::UnboundedReceiver<TimerEvent>,
    pending: Vec<JoinHandle<()>>,
}

impl Timers {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, delay: Duration, event: TimerEvent) {
        self.pending.retain(|h| !h.is_finished());
        let tx = self.tx.clone();
        self.pending.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // receiver gone means the monitor stopped
            let _ = tx.send(event);
        }));
        tracing::debug!(?event, delay_ms = delay.as_millis() as u64, "timer armed");
    }

    /// Next fired event. Pending forever while nothing is due, since the
    /// struct keeps its own sender alive.
    pub async fn next(&mut self) -> Option<TimerEvent> {
        self.rx.recv().await
    }

    /// Abort every timer that has not fired and discard undelivered events.
    pub fn cancel_all(&mut self) {
        let mut aborted = 0usize;
        for handle in self.pending.drain(..) {
            if !handle.is_finished() {
                aborted += 1;
            }
            handle.abort();
        }
        while self.rx.try_recv().is_ok() {}
        if aborted > 0 {
            tracing::debug!(aborted, "pending timers cancelled");
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
