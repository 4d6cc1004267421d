use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use chargewatch_core::battery::ManualFeed;
use chargewatch_core::diagnostics::DiagnosticsReel;
use chargewatch_core::io::output::{OutputReceiver, Toast};
use chargewatch_core::monitor::MonitorHandle;
use chargewatch_core::types::{
    BatterySample, ChargeStatus, FakeReading, MonitorStatus, Notification, NotificationAction,
};

use crate::event::TermEvent;
use crate::sinks::{PermissionGate, UiEvent};
use crate::widgets;

/// Answer to the notification-permission prompt shown at launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Asking,
    Granted,
    Denied,
}

/// Keyboard-driven battery used when no real feed is attached.
#[derive(Debug, Clone, Copy)]
pub struct SimBattery {
    pub level: u8,
    pub plugged: bool,
}

impl SimBattery {
    fn sample(&self) -> BatterySample {
        let status = if self.plugged {
            ChargeStatus::Charging
        } else {
            ChargeStatus::Discharging
        };
        BatterySample::new(status, Some(self.level))
    }
}

/// TUI application state.
pub struct App {
    pub status: MonitorStatus,
    pub reading: Option<FakeReading>,
    pub image_visible: bool,
    pub reel: DiagnosticsReel,
    pub banner: Option<Notification>,
    pub toasts: Vec<(Toast, Instant)>,
    pub cue: Option<String>,
    pub permission: Permission,
    pub sim: Option<SimBattery>,
    pub should_exit: bool,
}

impl App {
    fn new(sim: Option<SimBattery>) -> Self {
        Self {
            status: MonitorStatus::default(),
            reading: None,
            image_visible: false,
            reel: DiagnosticsReel::specifications(),
            banner: None,
            toasts: Vec::new(),
            cue: None,
            permission: Permission::Asking,
            sim,
            should_exit: false,
        }
    }

    fn apply(&mut self, evt: UiEvent) {
        match evt {
            UiEvent::Reading(reading) => {
                self.reading = Some(reading);
                self.image_visible = true;
            }
            UiEvent::Notification(n) => self.banner = Some(n),
            UiEvent::Cue { clip } => self.cue = clip,
        }
    }

    fn push_toast(&mut self, toast: Toast) {
        self.toasts.push((toast, Instant::now()));
    }

    fn expire_toasts(&mut self) {
        self.toasts
            .retain(|(t, shown_at)| shown_at.elapsed() < t.length.duration());
    }
}

/// Everything the TUI loop talks to.
pub struct Wiring {
    pub handle: MonitorHandle,
    pub feed: Option<ManualFeed>,
    pub gate: PermissionGate,
    pub ui_rx: mpsc::UnboundedReceiver<UiEvent>,
    pub output_rx: OutputReceiver,
    pub reel_rx: watch::Receiver<DiagnosticsReel>,
    pub launch_action: Option<NotificationAction>,
    pub shutdown_timeout: Duration,
}

/// Run the TUI event loop until the user quits or `token` is cancelled.
pub async fn run_app(mut w: Wiring, token: CancellationToken) -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let stop = Arc::new(AtomicBool::new(false));
    let mut term_rx = crate::event::spawn(stop.clone());
    let mut status_rx = w.handle.subscribe_status();

    let sim = w.feed.as_ref().map(|_| SimBattery { level: 50, plugged: false });
    let mut app = App::new(sim);

    if let Some(action) = w.launch_action {
        app.image_visible = true;
        w.handle.activate(action).await?;
    }

    let mut housekeeping = tokio::time::interval(Duration::from_millis(250));
    housekeeping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    terminal.draw(|f| widgets::draw(f, &app))?;

    loop {
        if app.should_exit {
            break;
        }
        tokio::select! {
            _ = token.cancelled() => break,
            evt = term_rx.recv() => {
                let Some(evt) = evt else { break };
                if let TermEvent::Key(key) = evt {
                    handle_key(&mut app, key, &w).await;
                }
            }
            Some(evt) = w.ui_rx.recv() => app.apply(evt),
            Some(toast) = w.output_rx.recv() => app.push_toast(toast),
            Ok(()) = status_rx.changed() => {
                app.status = *status_rx.borrow_and_update();
            }
            Ok(()) = w.reel_rx.changed() => {
                app.reel = w.reel_rx.borrow_and_update().clone();
            }
            _ = housekeeping.tick() => app.expire_toasts(),
        }
        terminal.draw(|f| widgets::draw(f, &app))?;
    }

    stop.store(true, Ordering::Relaxed);
    terminal::disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), LeaveAlternateScreen)?;
    match tokio::time::timeout(w.shutdown_timeout, w.handle.stop()).await {
        Ok(Ok(())) => tracing::info!("monitor stopped"),
        Ok(Err(e)) => tracing::warn!(error = %e, "monitor stopped with error"),
        Err(_) => tracing::warn!("monitor did not stop in time"),
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent, w: &Wiring) {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Char('q')) => {
            app.should_exit = true;
        }
        (_, KeyCode::Char('y')) if app.permission == Permission::Asking => {
            app.permission = Permission::Granted;
            w.gate.answer(true);
            report(w.handle.permission_result(true).await);
        }
        (_, KeyCode::Char('n')) if app.permission == Permission::Asking => {
            app.permission = Permission::Denied;
            w.gate.answer(false);
            report(w.handle.permission_result(false).await);
        }
        (_, KeyCode::Char('o')) => {
            // auto-cancel: opening the notification dismisses it
            if let Some(n) = app.banner.take() {
                report(w.handle.activate(n.action).await);
            }
        }
        (_, KeyCode::Char(c)) => {
            if let (Some(sim), Some(feed)) = (app.sim.as_mut(), w.feed.as_ref()) {
                match c {
                    'c' => sim.plugged = true,
                    'u' => sim.plugged = false,
                    '+' => sim.level = sim.level.saturating_add(1).min(100),
                    '-' => sim.level = sim.level.saturating_sub(1),
                    _ => return,
                }
                if !feed.push(sim.sample()).await {
                    tracing::warn!("simulated sample dropped, monitor not subscribed");
                }
            }
        }
        _ => {}
    }
}

fn report(result: Result<(), chargewatch_core::monitor::MonitorError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "monitor command failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_battery_samples_follow_plug_state() {
        let mut sim = SimBattery { level: 42, plugged: false };
        assert_eq!(sim.sample().status, ChargeStatus::Discharging);
        sim.plugged = true;
        let s = sim.sample();
        assert_eq!(s.status, ChargeStatus::Charging);
        assert_eq!(s.level, Some(42));
    }

    #[test]
    fn reading_event_reveals_image() {
        let mut app = App::new(None);
        app.apply(UiEvent::Reading(FakeReading { level_pct: 75, image: "my_image".into() }));
        assert!(app.image_visible);
        assert_eq!(app.reading.as_ref().map(|r| r.level_pct), Some(75));
    }

    #[test]
    fn expired_toasts_are_dropped() {
        let mut app = App::new(None);
        app.toasts.push((Toast::short("old"), Instant::now() - Duration::from_secs(10)));
        app.push_toast(Toast::short("new"));
        app.expire_toasts();
        assert_eq!(app.toasts.len(), 1);
        assert_eq!(app.toasts[0].0.content, "new");
    }
}
