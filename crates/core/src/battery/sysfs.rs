use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::source::{BatterySource, SampleReceiver, SampleSender, SourceError};
use crate::types::{BatterySample, ChargeStatus};

/// Battery feed backed by the Linux power-supply class
/// (`<dir>/<BAT*>/{status,capacity}`).
///
/// Polls at a fixed interval and emits the first reading immediately, then
/// only readings whose status or level changed.
#[derive(Debug)]
pub struct SysfsSource {
    battery_dir: PathBuf,
    poll_interval: Duration,
    poller: Option<CancellationToken>,
}

impl SysfsSource {
    /// Find the first battery under `power_supply_dir`.
    pub fn discover(power_supply_dir: impl AsRef<Path>, poll_interval: Duration) -> Result<Self, SourceError> {
        let root = power_supply_dir.as_ref();
        let entries = std::fs::read_dir(root).map_err(|source| SourceError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| is_battery(p))
            .collect();
        candidates.sort();

        let battery_dir = candidates
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NoBattery(root.to_path_buf()))?;
        tracing::info!(battery = %battery_dir.display(), "battery discovered");
        Ok(Self::at(battery_dir, poll_interval))
    }

    /// Use a specific battery directory.
    pub fn at(battery_dir: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        Self {
            battery_dir: battery_dir.into(),
            poll_interval,
            poller: None,
        }
    }

    pub fn battery_dir(&self) -> &Path {
        &self.battery_dir
    }
}

impl BatterySource for SysfsSource {
    fn subscribe(&mut self, buffer: usize) -> Result<SampleReceiver, SourceError> {
        if self.poller.as_ref().is_some_and(|t| !t.is_cancelled()) {
            return Err(SourceError::AlreadySubscribed);
        }
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let token = CancellationToken::new();
        tokio::spawn(poll_loop(
            self.battery_dir.clone(),
            self.poll_interval,
            tx,
            token.clone(),
        ));
        self.poller = Some(token);
        Ok(rx)
    }

    fn unsubscribe(&mut self) {
        if let Some(token) = self.poller.take() {
            token.cancel();
            tracing::debug!(battery = %self.battery_dir.display(), "sysfs poller stopped");
        }
    }
}

impl Drop for SysfsSource {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

async fn poll_loop(dir: PathBuf, every: Duration, tx: SampleSender, token: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last: Option<(ChargeStatus, Option<u8>)> = None;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tx.closed() => break,
            _ = interval.tick() => {
                let sample = read_sample(&dir).await;
                let key = (sample.status, sample.level);
                if last == Some(key) {
                    continue;
                }
                last = Some(key);
                tracing::debug!(status = %sample.status, level = ?sample.level, "battery changed");
                if tx.send(sample).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Read one sample. Unreadable files degrade to `Unknown` / no level.
pub async fn read_sample(dir: &Path) -> BatterySample {
    let status = match tokio::fs::read_to_string(dir.join("status")).await {
        Ok(s) => ChargeStatus::from_sysfs(&s),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to read battery status");
            ChargeStatus::Unknown
        }
    };
    let level = tokio::fs::read_to_string(dir.join("capacity"))
        .await
        .ok()
        .and_then(|s| s.trim().parse::<u8>().ok());
    BatterySample::new(status, level)
}

fn is_battery(path: &Path) -> bool {
    let by_type = std::fs::read_to_string(path.join("type"))
        .map(|t| t.trim() == "Battery")
        .unwrap_or(false);
    let by_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("BAT"));
    by_type || by_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fake_battery(root: &Path, name: &str, status: &str, capacity: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), "Battery\n").unwrap();
        fs::write(dir.join("status"), format!("{status}\n")).unwrap();
        fs::write(dir.join("capacity"), format!("{capacity}\n")).unwrap();
        dir
    }

    #[test]
    fn discover_skips_mains_adapter() {
        let root = tempfile::tempdir().unwrap();
        let ac = root.path().join("AC");
        fs::create_dir_all(&ac).unwrap();
        fs::write(ac.join("type"), "Mains\n").unwrap();
        let bat = fake_battery(root.path(), "BAT0", "Charging", "50");

        let src = SysfsSource::discover(root.path(), Duration::from_secs(1)).unwrap();
        assert_eq!(src.battery_dir(), bat.as_path());
    }

    #[test]
    fn discover_without_battery_fails() {
        let root = tempfile::tempdir().unwrap();
        let err = SysfsSource::discover(root.path(), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, SourceError::NoBattery(_)));
    }

    #[tokio::test]
    async fn read_sample_parses_files() {
        let root = tempfile::tempdir().unwrap();
        let bat = fake_battery(root.path(), "BAT1", "Charging", "63");
        let s = read_sample(&bat).await;
        assert_eq!(s.status, ChargeStatus::Charging);
        assert_eq!(s.level, Some(63));
    }

    #[tokio::test]
    async fn read_sample_missing_files_is_unknown() {
        let root = tempfile::tempdir().unwrap();
        let s = read_sample(&root.path().join("BAT9")).await;
        assert_eq!(s.status, ChargeStatus::Unknown);
        assert_eq!(s.level, None);
    }

    #[tokio::test]
    async fn subscribe_emits_first_reading_then_changes_only() {
        let root = tempfile::tempdir().unwrap();
        let bat = fake_battery(root.path(), "BAT0", "Charging", "50");
        let mut src = SysfsSource::at(&bat, Duration::from_millis(10));
        let mut rx = src.subscribe(8).unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.level, Some(50));

        fs::write(bat.join("status"), "Discharging\n").unwrap();
        let second = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.status, ChargeStatus::Discharging);

        assert!(matches!(src.subscribe(8), Err(SourceError::AlreadySubscribed)));
        src.unsubscribe();
        // poller exits and drops its sender
        let end = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert!(end.is_none());
    }
}
