use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::session::{ChargingSession, SampleOutcome};
use super::timer::{TimerEvent, Timers};
use crate::battery::{BatterySource, SampleReceiver, SourceError};
use crate::config::MonitorCfg;
use crate::effects::{Effects, NotifyError};
use crate::io::output::{self, OutputReceiver, OutputSender, Toast};
use crate::types::{BatterySample, ChargeStatus, MonitorStatus, NotificationAction};

/// Message shown when notification delivery is refused.
pub const PERMISSION_DENIED_TOAST: &str = "Permission denied to show notifications";
/// Message shown when the battery feed ends while the monitor keeps running.
pub const FEED_CLOSED_TOAST: &str = "Battery monitoring stopped";

/// Requests from the front end into the running monitor.
#[derive(Debug)]
pub enum MonitorCommand {
    /// The notification's deep link was opened (or the app was launched with it).
    Activate(NotificationAction),
    /// Answer to the runtime notification-permission prompt.
    PermissionResult { granted: bool },
    /// Round-trip marker; answered once every earlier message is handled.
    Sync(oneshot::Sender<MonitorStatus>),
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("monitor loop is not running")]
    NotRunning,
    #[error("monitor task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Fake-charging detector.
///
/// Owns the charging session, the confirmation timers and the effects. All of
/// them are touched only from the monitor task spawned by [`start`](Self::start).
pub struct ChargingMonitor {
    cfg: Arc<MonitorCfg>,
    session: ChargingSession,
    timers: Timers,
    effects: Effects,
    output_tx: OutputSender,
    status_tx: watch::Sender<MonitorStatus>,
    latest_status: ChargeStatus,
    confirmations: u64,
}

impl ChargingMonitor {
    /// Create a monitor. Returns it with the receiver for user-facing toasts.
    pub fn new(cfg: Arc<MonitorCfg>, effects: Effects) -> (Self, OutputReceiver) {
        let (output_tx, output_rx) = output::channel(16);
        let (status_tx, _) = watch::channel(MonitorStatus::default());
        let monitor = Self {
            cfg,
            session: ChargingSession::new(),
            timers: Timers::new(),
            effects,
            output_tx,
            status_tx,
            latest_status: ChargeStatus::Unknown,
            confirmations: 0,
        };
        (monitor, output_rx)
    }

    /// Subscribe to `source` and spawn the monitor loop.
    /// Cancelling `token` has the same effect as [`MonitorHandle::stop`];
    /// so does dropping every [`MonitorHandle`] and command sender.
    pub fn start<S>(mut self, mut source: S, token: CancellationToken) -> Result<MonitorHandle, SourceError>
    where
        S: BatterySource + 'static,
    {
        let samples = source.subscribe(self.cfg.sample_buffer)?;
        if let Err(e) = self.effects.prepare_channel() {
            tracing::warn!(error = %e, "notification channel not created, will retry on first alert");
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let status_rx = self.status_tx.subscribe();
        let window_ms = self.cfg.observation_window_ms;
        let loop_token = token.clone();
        let task = tokio::spawn(async move {
            self.run(samples, cmd_rx, loop_token).await;
            source.unsubscribe();
            tracing::info!("charging monitor stopped");
        });

        tracing::info!(window_ms, "charging monitor started");
        Ok(MonitorHandle {
            token,
            commands: cmd_tx,
            status_rx,
            task,
        })
    }

    async fn run(
        &mut self,
        mut samples: SampleReceiver,
        mut commands: mpsc::Receiver<MonitorCommand>,
        token: CancellationToken,
    ) {
        let mut feed_open = true;
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                sample = samples.recv(), if feed_open => match sample {
                    Some(sample) => self.on_status_sample(sample),
                    None => {
                        tracing::warn!("battery feed closed");
                        output::post(&self.output_tx, Toast::long(FEED_CLOSED_TOAST));
                        feed_open = false;
                    }
                },
                Some(event) = self.timers.next() => self.on_timer(event),
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.on_command(cmd),
                    // every handle dropped
                    None => break,
                },
            }
            self.broadcast();
        }
        self.timers.cancel_all();
        self.effects.shutdown();
    }

    /// Apply one battery sample.
    pub fn on_status_sample(&mut self, sample: BatterySample) {
        self.latest_status = sample.status;
        match self.session.on_sample(&sample) {
            SampleOutcome::Armed(ticket) => {
                let window = Duration::from_millis(self.cfg.observation_window_ms);
                self.timers.schedule(window, TimerEvent::ConfirmationDue(ticket));
            }
            SampleOutcome::Tracked | SampleOutcome::Reset { .. } => {}
        }
    }

    fn on_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::ConfirmationDue(ticket) => {
                if self.session.on_timer(&ticket) {
                    self.confirmations += 1;
                    self.on_fake_confirmed();
                }
            }
            TimerEvent::CueExpired(id) => {
                self.effects.release_cue(id);
            }
        }
    }

    fn on_command(&mut self, cmd: MonitorCommand) {
        match cmd {
            MonitorCommand::Activate(NotificationAction::ShowDiagnostics) => {
                tracing::info!("diagnostics deep link opened");
                self.effects.show_fake_reading();
                if let Some(lease) = self.effects.start_cue() {
                    self.timers
                        .schedule(lease.expires_after, TimerEvent::CueExpired(lease.id));
                }
            }
            MonitorCommand::PermissionResult { granted: true } => {
                tracing::info!("notification permission granted");
                if self.session.is_confirmed() {
                    self.post_notification();
                }
            }
            MonitorCommand::PermissionResult { granted: false } => {
                tracing::info!("notification permission denied");
                output::post(&self.output_tx, Toast::short(PERMISSION_DENIED_TOAST));
            }
            MonitorCommand::Sync(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn on_fake_confirmed(&mut self) {
        self.effects.show_fake_reading();
        self.post_notification();
    }

    fn post_notification(&mut self) {
        match self.effects.notify() {
            Ok(()) => {}
            Err(NotifyError::PermissionDenied) => {
                tracing::warn!("notification suppressed, permission denied");
                output::post(&self.output_tx, Toast::short(PERMISSION_DENIED_TOAST));
            }
            // the answer will repost if it is a grant
            Err(NotifyError::PermissionPending) => {
                tracing::info!("notification held until permission is answered");
            }
            Err(e) => tracing::warn!(error = %e, "notification failed"),
        }
    }

    /// Current snapshot.
    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            state: self.session.state(),
            baseline: self.session.baseline(),
            latest_level: self.session.latest_level(),
            latest_status: self.latest_status,
            confirmations: self.confirmations,
        }
    }

    fn broadcast(&self) {
        let status = self.status();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

/// Control surface of a started monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    token: CancellationToken,
    commands: mpsc::Sender<MonitorCommand>,
    status_rx: watch::Receiver<MonitorStatus>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Last broadcast snapshot.
    pub fn status(&self) -> MonitorStatus {
        *self.status_rx.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<MonitorStatus> {
        self.status_rx.clone()
    }

    pub async fn activate(&self, action: NotificationAction) -> Result<(), MonitorError> {
        self.send(MonitorCommand::Activate(action)).await
    }

    pub async fn permission_result(&self, granted: bool) -> Result<(), MonitorError> {
        self.send(MonitorCommand::PermissionResult { granted }).await
    }

    /// Wait until every command sent so far has been handled, then return the
    /// snapshot at that point.
    pub async fn sync(&self) -> Result<MonitorStatus, MonitorError> {
        let (tx, rx) = oneshot::channel();
        self.send(MonitorCommand::Sync(tx)).await?;
        rx.await.map_err(|_| MonitorError::NotRunning)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the loop, unsubscribe from the feed, cancel armed timers and
    /// release the audio cue. Waits for the loop to finish.
    pub async fn stop(self) -> Result<(), MonitorError> {
        self.token.cancel();
        self.task.await?;
        Ok(())
    }

    async fn send(&self, cmd: MonitorCommand) -> Result<(), MonitorError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| MonitorError::NotRunning)
    }
}
