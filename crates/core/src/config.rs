use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prefix of the environment variables read by [`MonitorCfg::from_env`].
pub const ENV_PREFIX: &str = "CHARGEWATCH_";

/// All chargewatch parameters. Defaults can be overridden per key through
/// `CHARGEWATCH_<KEY>` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorCfg {
    // decision
    pub observation_window_ms: u64,

    // fabricated reading
    pub fake_level_pct: u8,
    pub fake_image: String,

    // audio cue
    pub audio_clip: String,
    pub audio_max_ms: u64,

    // notification
    pub notification_channel_id: String,
    pub notification_channel_name: String,
    pub notification_title: String,
    pub notification_body: String,

    // presentation
    pub diagnostics_interval_ms: u64,

    // battery feed
    pub poll_interval_ms: u64,
    pub power_supply_dir: String,
    pub sample_buffer: usize,

    // shutdown
    pub shutdown_timeout_secs: u64,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            observation_window_ms: 60_000,
            fake_level_pct: 75,
            fake_image: "my_image".into(),
            audio_clip: "alert_clip".into(),
            audio_max_ms: 10_000,
            notification_channel_id: "charging_channel".into(),
            notification_channel_name: "Charging Status".into(),
            notification_title: "Charger check finished".into(),
            notification_body: "Your charger is not charging the battery. Tap for details.".into(),
            diagnostics_interval_ms: 2_000,
            poll_interval_ms: 5_000,
            power_supply_dir: "/sys/class/power_supply".into(),
            sample_buffer: 64,
            shutdown_timeout_secs: 5,
        }
    }
}

impl MonitorCfg {
    /// Load config from `CHARGEWATCH_*` environment variables. Missing or
    /// unparsable keys keep their default.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Same as [`from_env`](Self::from_env) over an explicit variable list.
    /// Only `CHARGEWATCH_`-prefixed names count; the rest of the name is
    /// matched case-insensitively.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let map: HashMap<String, String> = vars
            .into_iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(ENV_PREFIX)
                    .map(|key| (key.to_ascii_lowercase(), v))
            })
            .collect();
        let cfg = Self::from_map(&map);
        tracing::debug!(overrides = map.len(), "config loaded from environment");
        cfg
    }

    pub fn from_map(m: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            observation_window_ms: get_or(m, "observation_window_ms", d.observation_window_ms),
            fake_level_pct: get_or(m, "fake_level_pct", d.fake_level_pct).min(100),
            fake_image: get_or(m, "fake_image", d.fake_image),
            audio_clip: get_or(m, "audio_clip", d.audio_clip),
            audio_max_ms: get_or(m, "audio_max_ms", d.audio_max_ms),
            notification_channel_id: get_or(m, "notification_channel_id", d.notification_channel_id),
            notification_channel_name: get_or(m, "notification_channel_name", d.notification_channel_name),
            notification_title: get_or(m, "notification_title", d.notification_title),
            notification_body: get_or(m, "notification_body", d.notification_body),
            diagnostics_interval_ms: get_or(m, "diagnostics_interval_ms", d.diagnostics_interval_ms),
            poll_interval_ms: get_or(m, "poll_interval_ms", d.poll_interval_ms).max(1),
            power_supply_dir: get_or(m, "power_supply_dir", d.power_supply_dir),
            sample_buffer: get_or(m, "sample_buffer", d.sample_buffer).max(1),
            shutdown_timeout_secs: get_or(m, "shutdown_timeout_secs", d.shutdown_timeout_secs),
        }
    }

    /// `(key, value, description)` for every parameter.
    pub fn to_entries(&self) -> Vec<(&'static str, String, &'static str)> {
        vec![
            ("observation_window_ms", self.observation_window_ms.to_string(), "time a charging level must stay flat before the charger is called fake"),
            ("fake_level_pct", self.fake_level_pct.to_string(), "battery level shown once fake charging is confirmed"),
            ("fake_image", self.fake_image.clone(), "image resource shown with the fake reading"),
            ("audio_clip", self.audio_clip.clone(), "clip played when the notification is opened"),
            ("audio_max_ms", self.audio_max_ms.to_string(), "upper bound on audio cue playback"),
            ("notification_channel_id", self.notification_channel_id.clone(), "stable notification channel id"),
            ("notification_channel_name", self.notification_channel_name.clone(), "user-visible channel name"),
            ("notification_title", self.notification_title.clone(), "notification title"),
            ("notification_body", self.notification_body.clone(), "notification body"),
            ("diagnostics_interval_ms", self.diagnostics_interval_ms.to_string(), "cadence of the diagnostics reel"),
            ("poll_interval_ms", self.poll_interval_ms.to_string(), "sysfs battery poll interval"),
            ("power_supply_dir", self.power_supply_dir.clone(), "power-supply class directory"),
            ("sample_buffer", self.sample_buffer.to_string(), "battery sample channel capacity"),
            ("shutdown_timeout_secs", self.shutdown_timeout_secs.to_string(), "max wait for the monitor to stop"),
        ]
    }
}

fn get_or<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stable() {
        let cfg = MonitorCfg::default();
        assert_eq!(cfg.observation_window_ms, 60_000);
        assert_eq!(cfg.fake_level_pct, 75);
        assert_eq!(cfg.audio_max_ms, 10_000);
        assert_eq!(cfg.notification_channel_id, "charging_channel");
        assert_eq!(cfg.diagnostics_interval_ms, 2_000);
    }

    #[test]
    fn from_map_overrides_and_falls_back() {
        let mut m = HashMap::new();
        m.insert("observation_window_ms".to_string(), "180000".to_string());
        m.insert("fake_level_pct".to_string(), "not-a-number".to_string());
        m.insert("notification_title".to_string(), "Heads up".to_string());
        let cfg = MonitorCfg::from_map(&m);
        assert_eq!(cfg.observation_window_ms, 180_000);
        assert_eq!(cfg.fake_level_pct, 75);
        assert_eq!(cfg.notification_title, "Heads up");
    }

    #[test]
    fn from_vars_strips_prefix_and_folds_case() {
        let vars = [
            ("CHARGEWATCH_OBSERVATION_WINDOW_MS", "5000"),
            ("CHARGEWATCH_Fake_Level_Pct", "80"),
            ("OBSERVATION_WINDOW_MS", "1"),
            ("chargewatch_audio_max_ms", "1"),
            ("PATH", "/usr/bin"),
        ]
        .map(|(k, v)| (k.to_string(), v.to_string()));
        let cfg = MonitorCfg::from_vars(vars);
        assert_eq!(cfg.observation_window_ms, 5_000);
        assert_eq!(cfg.fake_level_pct, 80);
        // lower-case prefix is not ours
        assert_eq!(cfg.audio_max_ms, 10_000);
    }

    #[test]
    fn from_map_clamps_nonsense() {
        let mut m = HashMap::new();
        m.insert("fake_level_pct".to_string(), "250".to_string());
        m.insert("sample_buffer".to_string(), "0".to_string());
        let cfg = MonitorCfg::from_map(&m);
        assert_eq!(cfg.fake_level_pct, 100);
        assert_eq!(cfg.sample_buffer, 1);
    }

    #[test]
    fn entries_cover_every_key() {
        let cfg = MonitorCfg::default();
        let entries = cfg.to_entries();
        let map: HashMap<String, String> = entries
            .iter()
            .map(|(k, v, _)| (k.to_string(), v.clone()))
            .collect();
        let reparsed = MonitorCfg::from_map(&map);
        assert_eq!(reparsed.observation_window_ms, cfg.observation_window_ms);
        assert_eq!(reparsed.power_supply_dir, cfg.power_supply_dir);
        assert_eq!(entries.len(), 14);
    }
}
