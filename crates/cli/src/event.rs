use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;

/// Terminal input consumed by the TUI loop.
#[derive(Debug)]
pub enum TermEvent {
    Key(KeyEvent),
    Resize,
}

/// Read crossterm events on a dedicated thread until `stop` is set.
pub fn spawn(stop: Arc<AtomicBool>) -> mpsc::UnboundedReceiver<TermEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            if !event::poll(Duration::from_millis(50)).unwrap_or(false) {
                continue;
            }
            let forwarded = match event::read() {
                // Windows reports releases too
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Some(TermEvent::Key(key)),
                Ok(Event::Resize(..)) => Some(TermEvent::Resize),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "terminal read failed");
                    break;
                }
            };
            if let Some(evt) = forwarded
                && tx.send(evt).is_err()
            {
                break;
            }
        }
    });
    rx
}
