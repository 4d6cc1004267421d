use std::sync::Arc;
use std::time::Duration;

use chargewatch_core::battery::SysfsSource;
use chargewatch_core::config::{ENV_PREFIX, MonitorCfg};
use chargewatch_core::diagnostics::{self, DiagnosticsReel};
use chargewatch_core::effects::Effects;
use chargewatch_core::io::output::OutputReceiver;
use chargewatch_core::monitor::ChargingMonitor;
use chargewatch_core::runtime::ShutdownGuard;
use chargewatch_core::types::NotificationAction;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let cfg = MonitorCfg::from_env();
    if args.iter().any(|a| a == "--print-config") {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }
    if args.iter().any(|a| a == "--list-config") {
        for (key, value, desc) in cfg.to_entries() {
            println!("{ENV_PREFIX}{:<28} {value:<24} {desc}", key.to_ascii_uppercase());
        }
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
        .init();

    let granted = std::env::var("CHARGEWATCH_NOTIFICATIONS")
        .map(|v| v != "denied")
        .unwrap_or(true);
    let cfg = Arc::new(cfg);

    let source = SysfsSource::discover(&cfg.power_supply_dir, Duration::from_millis(cfg.poll_interval_ms))?;
    let effects = Effects::logging(&cfg, granted);

    let shutdown = ShutdownGuard::new();
    shutdown.spawn_signal_listener();
    let token = shutdown.token();

    let (monitor, output_rx) = ChargingMonitor::new(cfg.clone(), effects);
    let handle = monitor.start(source, token.child_token())?;
    if !granted {
        handle.permission_result(false).await?;
    }
    if let Some(action) = NotificationAction::from_args(&args) {
        handle.activate(action).await?;
    }

    let reel = diagnostics::spawn_reveal(
        DiagnosticsReel::specifications(),
        Duration::from_millis(cfg.diagnostics_interval_ms),
        token.clone(),
    );
    tokio::spawn(log_reel(reel));
    tokio::spawn(print_toasts(output_rx, token.clone()));

    token.cancelled().await;

    let timeout = Duration::from_secs(cfg.shutdown_timeout_secs);
    match tokio::time::timeout(timeout, handle.stop()).await {
        Ok(Ok(())) => tracing::info!("shutdown complete"),
        Ok(Err(e)) => tracing::warn!(error = %e, "monitor stopped with error"),
        Err(_) => tracing::warn!(timeout_secs = cfg.shutdown_timeout_secs, "monitor did not stop in time"),
    }
    Ok(())
}

async fn log_reel(mut reel: tokio::sync::watch::Receiver<DiagnosticsReel>) {
    while reel.changed().await.is_ok() {
        let text = reel.borrow_and_update().text();
        if let Some(line) = text.lines().last() {
            tracing::info!(line, "specifications");
        }
    }
}

async fn print_toasts(mut output_rx: OutputReceiver, token: CancellationToken) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            toast = output_rx.recv() => {
                let Some(toast) = toast else { break };
                eprintln!("{}", toast.content);
            }
        }
    }
}
