use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw sentinel the platform uses for "no value" in status and level fields.
pub const RAW_UNSET: i32 = -1;

// ── Battery feed ────────────────────────────────────────────────

/// Charging status as reported by the battery feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    #[default]
    Unknown,
    Charging,
    Discharging,
    NotCharging,
    Full,
}

impl ChargeStatus {
    /// Map a platform status code (1..=5). Anything else, including the
    /// `-1` sentinel, is `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => Self::Charging,
            3 => Self::Discharging,
            4 => Self::NotCharging,
            5 => Self::Full,
            _ => Self::Unknown,
        }
    }

    /// Parse the text form used by the Linux power-supply class.
    pub fn from_sysfs(text: &str) -> Self {
        match text.trim() {
            "Charging" => Self::Charging,
            "Discharging" => Self::Discharging,
            "Not charging" => Self::NotCharging,
            "Full" => Self::Full,
            _ => Self::Unknown,
        }
    }

    pub fn is_charging(self) -> bool {
        self == Self::Charging
    }
}

impl fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Charging => "charging",
            Self::Discharging => "discharging",
            Self::NotCharging => "not charging",
            Self::Full => "full",
        };
        f.write_str(s)
    }
}

/// One status update from the battery feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatterySample {
    pub status: ChargeStatus,
    /// Charge percentage; `None` when the feed reported no usable level.
    pub level: Option<u8>,
    pub observed_at: DateTime<Utc>,
}

impl BatterySample {
    pub fn new(status: ChargeStatus, level: Option<u8>) -> Self {
        Self {
            status,
            level: level.filter(|l| *l <= 100),
            observed_at: Utc::now(),
        }
    }

    pub fn charging(level: u8) -> Self {
        Self::new(ChargeStatus::Charging, Some(level))
    }

    pub fn discharging(level: u8) -> Self {
        Self::new(ChargeStatus::Discharging, Some(level))
    }

    pub fn not_charging() -> Self {
        Self::new(ChargeStatus::NotCharging, None)
    }

    /// Build a sample from raw platform integers. Out-of-range levels and the
    /// `-1` sentinel become `None`.
    pub fn from_raw(status: i32, level: i32) -> Self {
        let level = u8::try_from(level).ok().filter(|l| *l <= 100);
        Self::new(ChargeStatus::from_code(status), level)
    }

    /// Charging with a usable level. Everything else counts as "not charging".
    pub fn charging_level(&self) -> Option<u8> {
        if self.status.is_charging() { self.level } else { None }
    }
}

// ── Monitor state ───────────────────────────────────────────────

/// Observable state of the charging monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    #[default]
    Idle,
    ChargingPending,
    ConfirmedFake,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::ChargingPending => "charging (observing)",
            Self::ConfirmedFake => "fake charging",
        };
        f.write_str(s)
    }
}

/// Snapshot broadcast after every event the monitor processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub state: MonitorState,
    pub baseline: Option<u8>,
    pub latest_level: Option<u8>,
    pub latest_status: ChargeStatus,
    /// Confirmations since the monitor started.
    pub confirmations: u64,
}

// ── Effects ─────────────────────────────────────────────────────

/// Fabricated reading handed to the display sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeReading {
    pub level_pct: u8,
    /// Image resource shown next to the reading.
    pub image: String,
}

/// Deep-link actions a notification can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    /// Reopen the UI with the diagnostics image visible and play the cue.
    ShowDiagnostics,
}

impl NotificationAction {
    /// Intent string the host UI is launched with.
    pub fn intent(self) -> &'static str {
        match self {
            Self::ShowDiagnostics => "SHOW_IMAGE",
        }
    }

    pub fn from_intent(intent: &str) -> Option<Self> {
        match intent {
            "SHOW_IMAGE" => Some(Self::ShowDiagnostics),
            _ => None,
        }
    }

    /// Action a front end was launched with: `--intent <ACTION>`, or
    /// `--show-image` as shorthand for `--intent SHOW_IMAGE`. Unknown
    /// intents launch normally.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Option<Self> {
        let mut args = args.iter().map(AsRef::as_ref);
        while let Some(arg) = args.next() {
            let intent = match arg {
                "--show-image" => Self::ShowDiagnostics.intent(),
                "--intent" => args.next()?,
                _ => continue,
            };
            match Self::from_intent(intent) {
                Some(action) => return Some(action),
                None => tracing::warn!(intent, "unknown launch intent ignored"),
            }
        }
        None
    }
}

/// A user-facing alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Stable id; posting again with the same id replaces the previous alert.
    pub id: u32,
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub auto_cancel: bool,
    pub action: NotificationAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert_eq!(ChargeStatus::from_code(2), ChargeStatus::Charging);
        assert_eq!(ChargeStatus::from_code(3), ChargeStatus::Discharging);
        assert_eq!(ChargeStatus::from_code(4), ChargeStatus::NotCharging);
        assert_eq!(ChargeStatus::from_code(5), ChargeStatus::Full);
        assert_eq!(ChargeStatus::from_code(1), ChargeStatus::Unknown);
        assert_eq!(ChargeStatus::from_code(RAW_UNSET), ChargeStatus::Unknown);
    }

    #[test]
    fn sysfs_text_parses() {
        assert_eq!(ChargeStatus::from_sysfs("Charging\n"), ChargeStatus::Charging);
        assert_eq!(ChargeStatus::from_sysfs("Not charging"), ChargeStatus::NotCharging);
        assert_eq!(ChargeStatus::from_sysfs("weird"), ChargeStatus::Unknown);
    }

    #[test]
    fn raw_sentinels_become_none() {
        let s = BatterySample::from_raw(2, RAW_UNSET);
        assert_eq!(s.status, ChargeStatus::Charging);
        assert_eq!(s.level, None);
        assert_eq!(s.charging_level(), None);

        let s = BatterySample::from_raw(2, 140);
        assert_eq!(s.level, None);

        let s = BatterySample::from_raw(2, 42);
        assert_eq!(s.charging_level(), Some(42));
    }

    #[test]
    fn only_charging_yields_a_charging_level() {
        assert_eq!(BatterySample::discharging(80).charging_level(), None);
        assert_eq!(BatterySample::new(ChargeStatus::Full, Some(100)).charging_level(), None);
        assert_eq!(BatterySample::charging(80).charging_level(), Some(80));
    }

    #[test]
    fn intent_round_trip() {
        let a = NotificationAction::ShowDiagnostics;
        assert_eq!(NotificationAction::from_intent(a.intent()), Some(a));
        assert_eq!(NotificationAction::from_intent("MAIN"), None);
    }

    #[test]
    fn launch_action_from_args() {
        let show = Some(NotificationAction::ShowDiagnostics);
        assert_eq!(NotificationAction::from_args(&["--show-image"]), show);
        assert_eq!(NotificationAction::from_args(&["--sysfs", "--intent", "SHOW_IMAGE"]), show);
        assert_eq!(NotificationAction::from_args(&["--intent", "MAIN"]), None);
        assert_eq!(NotificationAction::from_args(&["--intent"]), None);
        assert_eq!(NotificationAction::from_args::<&str>(&[]), None);
    }
}
