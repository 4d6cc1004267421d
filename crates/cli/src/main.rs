mod event;
mod sinks;
mod tui;
mod widgets;

use std::sync::Arc;
use std::time::Duration;

use chargewatch_core::battery::{BatterySource, ManualSource, SysfsSource};
use chargewatch_core::config::MonitorCfg;
use chargewatch_core::diagnostics::{self, DiagnosticsReel};
use chargewatch_core::effects::Effects;
use chargewatch_core::monitor::ChargingMonitor;
use chargewatch_core::runtime::ShutdownGuard;
use chargewatch_core::types::NotificationAction;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::sinks::{PermissionGate, TuiAudio, TuiDisplay, TuiNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Panic hook: restore terminal even on panic in raw mode
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen);
        default_hook(info);
    }));

    // Tracing: write to file when RUST_LOG is set (raw mode breaks stderr)
    if std::env::var("RUST_LOG").is_ok() {
        let file = std::fs::File::create("/tmp/chargewatch.log")?;
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(fmt::layer().json().with_target(true).with_writer(file))
            .init();
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cfg = Arc::new(MonitorCfg::from_env());

    // Real battery with --sysfs, keyboard-driven otherwise
    let (source, feed): (Box<dyn BatterySource>, _) = if args.iter().any(|a| a == "--sysfs") {
        let sysfs = SysfsSource::discover(
            &cfg.power_supply_dir,
            Duration::from_millis(cfg.poll_interval_ms),
        )?;
        tracing::info!(dir = %sysfs.battery_dir().display(), "using sysfs battery");
        (Box::new(sysfs) as Box<dyn BatterySource>, None)
    } else {
        let (manual, feed) = ManualSource::new();
        (Box::new(manual) as Box<dyn BatterySource>, Some(feed))
    };

    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let gate = PermissionGate::default();
    let effects = Effects::new(
        &cfg,
        Arc::new(TuiDisplay(ui_tx.clone())),
        Arc::new(TuiNotifier {
            tx: ui_tx.clone(),
            gate: gate.clone(),
        }),
        Arc::new(TuiAudio(ui_tx)),
    );

    let shutdown = ShutdownGuard::new();
    shutdown.spawn_signal_listener();
    let token = shutdown.token();

    let (monitor, output_rx) = ChargingMonitor::new(cfg.clone(), effects);
    let handle = monitor.start(source, token.child_token())?;

    let reel_rx = diagnostics::spawn_reveal(
        DiagnosticsReel::specifications(),
        Duration::from_millis(cfg.diagnostics_interval_ms),
        token.clone(),
    );

    let launch_action = NotificationAction::from_args(&args);

    let wiring = tui::Wiring {
        handle,
        feed,
        gate,
        ui_rx,
        output_rx,
        reel_rx,
        launch_action,
        shutdown_timeout: Duration::from_secs(cfg.shutdown_timeout_secs),
    };

    let result = tui::run_app(wiring, token.clone()).await;
    token.cancel();
    result
}
