use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{BatterySample, MonitorState};

/// Snapshot handed to a confirmation timer when a session is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmTicket {
    pub session_id: Uuid,
    pub armed_level: u8,
}

/// What a sample did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// First charging sample of a session; the caller must schedule the ticket.
    Armed(ArmTicket),
    /// Charging sample inside an existing session; nothing to schedule.
    Tracked,
    /// Non-charging (or malformed) sample; the session, if any, is gone.
    Reset { was_active: bool },
}

#[derive(Debug, Clone, Copy)]
struct ActiveSession {
    id: Uuid,
    baseline: u8,
    latest: u8,
    confirmed: bool,
    started_at: DateTime<Utc>,
}

/// Charging-session state machine.
///
/// Idle → pending on the first charging sample, pending → confirmed when the
/// armed ticket comes back with the level unchanged, anything → idle on a
/// non-charging sample. A level change alone keeps the session pending: the
/// armed check will fail and no new check is armed until the next reset.
#[derive(Debug, Default)]
pub struct ChargingSession {
    active: Option<ActiveSession>,
}

impl ChargingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample from the battery feed.
    pub fn on_sample(&mut self, sample: &BatterySample) -> SampleOutcome {
        let Some(level) = sample.charging_level() else {
            let was_active = self.reset();
            return SampleOutcome::Reset { was_active };
        };

        match &mut self.active {
            Some(session) => {
                session.latest = level;
                SampleOutcome::Tracked
            }
            None => {
                let session = ActiveSession {
                    id: Uuid::new_v4(),
                    baseline: level,
                    latest: level,
                    confirmed: false,
                    started_at: sample.observed_at,
                };
                self.active = Some(session);
                tracing::info!(session = %session.id, level, "charging session started");
                SampleOutcome::Armed(ArmTicket {
                    session_id: session.id,
                    armed_level: level,
                })
            }
        }
    }

    /// Evaluate a fired ticket against live state. Returns true exactly when
    /// this call confirms the session as fake.
    pub fn on_timer(&mut self, ticket: &ArmTicket) -> bool {
        let Some(session) = &mut self.active else {
            tracing::debug!(session = %ticket.session_id, "stale confirmation, no active session");
            return false;
        };
        if session.id != ticket.session_id {
            tracing::debug!(
                session = %ticket.session_id,
                current = %session.id,
                "stale confirmation from an earlier session"
            );
            return false;
        }
        if session.latest != ticket.armed_level {
            tracing::info!(
                session = %session.id,
                armed_level = ticket.armed_level,
                level = session.latest,
                "level moved during observation, charger looks genuine"
            );
            return false;
        }
        if session.confirmed {
            return false;
        }
        session.confirmed = true;
        let observed = Utc::now() - session.started_at;
        tracing::info!(
            session = %session.id,
            level = session.baseline,
            observed_secs = observed.num_seconds(),
            "fake charging confirmed"
        );
        true
    }

    /// Drop the session. Returns whether one was active.
    pub fn reset(&mut self) -> bool {
        match self.active.take() {
            Some(session) => {
                tracing::info!(session = %session.id, confirmed = session.confirmed, "charging session reset");
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> MonitorState {
        match &self.active {
            None => MonitorState::Idle,
            Some(s) if s.confirmed => MonitorState::ConfirmedFake,
            Some(_) => MonitorState::ChargingPending,
        }
    }

    pub fn baseline(&self) -> Option<u8> {
        self.active.map(|s| s.baseline)
    }

    pub fn latest_level(&self) -> Option<u8> {
        self.active.map(|s| s.latest)
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.active.map(|s| s.id)
    }

    pub fn is_confirmed(&self) -> bool {
        self.active.is_some_and(|s| s.confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChargeStatus;

    fn armed(outcome: SampleOutcome) -> ArmTicket {
        match outcome {
            SampleOutcome::Armed(t) => t,
            other => panic!("expected Armed, got {other:?}"),
        }
    }

    #[test]
    fn first_charging_sample_arms() {
        let mut s = ChargingSession::new();
        let ticket = armed(s.on_sample(&BatterySample::charging(50)));
        assert_eq!(ticket.armed_level, 50);
        assert_eq!(s.baseline(), Some(50));
        assert_eq!(s.state(), MonitorState::ChargingPending);
    }

    #[test]
    fn unchanged_level_confirms_once() {
        let mut s = ChargingSession::new();
        let ticket = armed(s.on_sample(&BatterySample::charging(50)));
        assert!(s.on_timer(&ticket));
        assert!(!s.on_timer(&ticket));
        assert_eq!(s.state(), MonitorState::ConfirmedFake);
        assert!(s.is_confirmed());
    }

    #[test]
    fn reset_before_fire_neutralizes_timer() {
        let mut s = ChargingSession::new();
        let ticket = armed(s.on_sample(&BatterySample::charging(50)));
        assert_eq!(
            s.on_sample(&BatterySample::not_charging()),
            SampleOutcome::Reset { was_active: true }
        );
        assert!(!s.on_timer(&ticket));
        assert_eq!(s.state(), MonitorState::Idle);
    }

    #[test]
    fn level_change_fails_guard_but_stays_pending() {
        let mut s = ChargingSession::new();
        let ticket = armed(s.on_sample(&BatterySample::charging(50)));
        assert_eq!(s.on_sample(&BatterySample::charging(55)), SampleOutcome::Tracked);
        assert_eq!(s.baseline(), Some(50));
        assert_eq!(s.latest_level(), Some(55));
        assert!(!s.on_timer(&ticket));
        assert_eq!(s.state(), MonitorState::ChargingPending);
    }

    #[test]
    fn duplicate_sample_does_not_rearm() {
        let mut s = ChargingSession::new();
        let ticket = armed(s.on_sample(&BatterySample::charging(50)));
        assert_eq!(s.on_sample(&BatterySample::charging(50)), SampleOutcome::Tracked);
        assert!(s.on_timer(&ticket));
    }

    #[test]
    fn ticket_from_previous_session_is_stale_even_at_same_level() {
        let mut s = ChargingSession::new();
        let old = armed(s.on_sample(&BatterySample::charging(50)));
        s.on_sample(&BatterySample::not_charging());
        let new = armed(s.on_sample(&BatterySample::charging(50)));
        assert_ne!(old.session_id, new.session_id);
        assert!(!s.on_timer(&old));
        assert!(s.on_timer(&new));
    }

    #[test]
    fn new_session_uses_new_baseline() {
        let mut s = ChargingSession::new();
        armed(s.on_sample(&BatterySample::charging(50)));
        s.on_sample(&BatterySample::discharging(50));
        let ticket = armed(s.on_sample(&BatterySample::charging(60)));
        assert_eq!(ticket.armed_level, 60);
        assert_eq!(s.baseline(), Some(60));
    }

    #[test]
    fn malformed_samples_never_start_a_session() {
        let mut s = ChargingSession::new();
        let outcome = s.on_sample(&BatterySample::from_raw(2, -1));
        assert_eq!(outcome, SampleOutcome::Reset { was_active: false });
        let outcome = s.on_sample(&BatterySample::from_raw(-1, 40));
        assert_eq!(outcome, SampleOutcome::Reset { was_active: false });
        assert_eq!(s.state(), MonitorState::Idle);
    }

    #[test]
    fn confirmed_resets_on_full() {
        let mut s = ChargingSession::new();
        let ticket = armed(s.on_sample(&BatterySample::charging(99)));
        assert!(s.on_timer(&ticket));
        s.on_sample(&BatterySample::new(ChargeStatus::Full, Some(100)));
        assert_eq!(s.state(), MonitorState::Idle);
        assert!(!s.is_confirmed());
        assert_eq!(s.baseline(), None);
    }
}
