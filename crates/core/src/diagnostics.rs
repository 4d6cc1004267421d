//! Fabricated "specifications" panel.
//!
//! The lines are static placeholder text, revealed one at a time so the panel
//! looks like it is measuring something.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Lines shown by the diagnostics panel, in reveal order.
pub const SPECIFICATIONS: [&str; 3] = [
    "Charging: Fast Charging",
    "Temperature: 30°C",
    "Voltage: 4.2V",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsReel {
    lines: Vec<String>,
    revealed: usize,
}

impl DiagnosticsReel {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            revealed: 0,
        }
    }

    /// Reel over [`SPECIFICATIONS`].
    pub fn specifications() -> Self {
        Self::new(SPECIFICATIONS)
    }

    /// Reveal the next line; `None` once everything is shown.
    pub fn reveal_next(&mut self) -> Option<&str> {
        let line = self.lines.get(self.revealed)?;
        self.revealed += 1;
        Some(line.as_str())
    }

    pub fn revealed(&self) -> &[String] {
        &self.lines[..self.revealed]
    }

    /// Revealed lines joined by newlines.
    pub fn text(&self) -> String {
        self.revealed().join("\n")
    }

    pub fn is_complete(&self) -> bool {
        self.revealed == self.lines.len()
    }

    /// Hide everything again.
    pub fn rewind(&mut self) {
        self.revealed = 0;
    }
}

impl Default for DiagnosticsReel {
    fn default() -> Self {
        Self::specifications()
    }
}

/// Reveal `reel` one line per `cadence`, the first immediately. The task ends
/// when the reel is complete or `token` is cancelled.
pub fn spawn_reveal(
    mut reel: DiagnosticsReel,
    cadence: Duration,
    token: CancellationToken,
) -> watch::Receiver<DiagnosticsReel> {
    reel.rewind();
    let (tx, rx) = watch::channel(reel.clone());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cadence);
        while !reel.is_complete() {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = interval.tick() => {
                    if let Some(line) = reel.reveal_next() {
                        tracing::debug!(line, "diagnostics line revealed");
                    }
                    if tx.send(reel.clone()).is_err() {
                        return;
                    }
                }
            }
        }
    });
    rx
}
