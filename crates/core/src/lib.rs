//! Fake-charging detector.
//!
//! A [`monitor::ChargingMonitor`] watches a battery feed. When the feed says
//! "charging" but the level does not move for the observation window, the
//! monitor shows a fabricated reading, posts a notification and, when the
//! notification is opened, plays a short audio cue.

pub mod battery;
pub mod config;
pub mod diagnostics;
pub mod effects;
pub mod io;
pub mod monitor;
pub mod runtime;
pub mod types;
