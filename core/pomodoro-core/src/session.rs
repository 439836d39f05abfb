//! The session entity and its time-derived state machine.
//!
//! A session has no stored status field. Whether it is inactive, active, or
//! done is recomputed from `(start_time, duration)` against a caller-supplied
//! instant on every query, so the answer is never stale and tests can ask
//! about any point in time.
//!
//! `start_time == None` is the single inactive representation; no other field
//! combination means "no session".

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::Error;
use crate::settings::Settings;

/// Two sessions are the same logical session when their start times differ
/// by no more than this. Absorbs sub-second skew between write and re-read,
/// not a statement about simultaneity.
pub const MATCH_TOLERANCE_MS: i64 = 1_000;

/// One tracked focus interval.
///
/// While active, `duration` is the planned length; after [`crate::Store::finish`]
/// it is overwritten with the actual elapsed time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub start_time: Option<DateTime<Utc>>,
    pub description: String,
    #[serde(with = "serde_minutes")]
    pub duration: TimeDelta,
    pub tags: Vec<String>,
}

/// Derived session status. See the module docs: never stored, always
/// recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Inactive,
    Active,
    Done,
}

impl Default for Session {
    fn default() -> Self {
        Session::inactive()
    }
}

impl Session {
    /// The unique "no session" value.
    pub fn inactive() -> Session {
        Session {
            start_time: None,
            description: String::new(),
            duration: TimeDelta::zero(),
            tags: Vec::new(),
        }
    }

    pub fn is_inactive(&self) -> bool {
        self.start_time.is_none()
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == Status::Active
    }

    pub fn is_done(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == Status::Done
    }

    /// Computes the status at `now`. Done begins exactly at the end instant.
    pub fn status(&self, now: DateTime<Utc>) -> Status {
        let Some(start) = self.start_time else {
            return Status::Inactive;
        };
        if now < start + self.duration {
            Status::Active
        } else {
            Status::Done
        }
    }

    /// The instant the session ends (or ended), if it ever started.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.start_time.map(|start| start + self.duration)
    }

    /// Time left until the end instant. Zero when inactive; goes negative
    /// once the session is done. Callers wanting a floor of zero clamp
    /// themselves.
    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        match self.end_time() {
            Some(end) => end - now,
            None => TimeDelta::zero(),
        }
    }

    /// Remaining time in whole minutes, rounded half-up.
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        minutes_half_up(self.remaining(now))
    }

    /// The session's duration in whole minutes, rounded half-up.
    pub fn duration_minutes(&self) -> i64 {
        minutes_half_up(self.duration)
    }

    /// Whether `other` is the same logical session, by start-time tolerance.
    pub fn matches(&self, other: &Session) -> bool {
        match (self.start_time, other.start_time) {
            (Some(a), Some(b)) => (a - b).num_milliseconds().abs() <= MATCH_TOLERANCE_MS,
            (None, None) => true,
            _ => false,
        }
    }

    /// Fills `duration` and `tags` from settings when still at their zero
    /// values. Fields already set are left alone.
    pub fn apply_settings(&mut self, settings: &Settings) {
        if self.duration == TimeDelta::zero() {
            self.duration = settings.default_pomodoro_duration;
        }
        if self.tags.is_empty() {
            self.tags = settings.default_tags.clone();
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::encode_session(self))
    }
}

impl FromStr for Session {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        codec::decode_session(s)
    }
}

/// Rounds a delta to whole minutes with `floor(x + 0.5)`.
///
/// Half-up with the floor formulation is not symmetric around negative half
/// minutes: +0.5 rounds to 1, -0.5 rounds to 0.
pub(crate) fn minutes_half_up(delta: TimeDelta) -> i64 {
    let minutes = delta.num_milliseconds() as f64 / 60_000.0;
    (minutes + 0.5).floor() as i64
}

/// Serializes a `TimeDelta` as whole minutes, matching the text codec's unit.
pub(crate) mod serde_minutes {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(delta: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        super::minutes_half_up(*delta).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let minutes = i64::deserialize(deserializer)?;
        Ok(TimeDelta::minutes(minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn pomodoro() -> Session {
        Session {
            start_time: Some(start()),
            description: String::new(),
            duration: TimeDelta::minutes(25),
            tags: Vec::new(),
        }
    }

    #[test]
    fn inactive_is_the_default() {
        let session = Session::default();
        assert!(session.is_inactive());
        assert_eq!(session.status(start()), Status::Inactive);
    }

    #[test]
    fn active_until_end_instant_then_done() {
        let session = pomodoro();

        assert_eq!(session.status(start()), Status::Active);
        assert_eq!(
            session.status(start() + TimeDelta::minutes(24)),
            Status::Active
        );
        // Done begins exactly at the end instant.
        assert_eq!(
            session.status(start() + TimeDelta::minutes(25)),
            Status::Done
        );
        assert_eq!(
            session.status(start() + TimeDelta::hours(2)),
            Status::Done
        );
    }

    #[test]
    fn remaining_goes_negative_after_done() {
        let session = pomodoro();
        assert_eq!(
            session.remaining(start() + TimeDelta::minutes(26)),
            TimeDelta::minutes(-1)
        );
    }

    #[test]
    fn remaining_is_zero_when_inactive() {
        let session = Session::inactive();
        assert_eq!(session.remaining(start()), TimeDelta::zero());
        assert_eq!(session.remaining_minutes(start()), 0);
    }

    #[test]
    fn remaining_minutes_rounds_half_up() {
        let session = pomodoro();

        // 24.5 minutes left rounds up to 25.
        assert_eq!(
            session.remaining_minutes(start() + TimeDelta::seconds(30)),
            25
        );
        // 0.5 minutes left rounds up to 1.
        assert_eq!(
            session.remaining_minutes(start() + TimeDelta::minutes(24) + TimeDelta::seconds(30)),
            1
        );
    }

    // floor(x + 0.5) is asymmetric at negative half minutes: -0.5 rounds to
    // 0 while +0.5 rounds to 1.
    #[test]
    fn remaining_minutes_asymmetric_at_negative_half() {
        let session = pomodoro();
        let end = start() + TimeDelta::minutes(25);

        assert_eq!(session.remaining_minutes(end + TimeDelta::seconds(30)), 0);
        assert_eq!(session.remaining_minutes(end + TimeDelta::seconds(90)), -1);
    }

    #[test]
    fn matches_within_one_second() {
        let a = pomodoro();
        let mut b = pomodoro();

        b.start_time = Some(start() + TimeDelta::milliseconds(900));
        assert!(a.matches(&b));
        assert!(b.matches(&a));

        b.start_time = Some(start() + TimeDelta::seconds(1));
        assert!(a.matches(&b));

        b.start_time = Some(start() + TimeDelta::seconds(2));
        assert!(!a.matches(&b));
    }

    #[test]
    fn inactive_only_matches_inactive() {
        assert!(Session::inactive().matches(&Session::inactive()));
        assert!(!Session::inactive().matches(&pomodoro()));
        assert!(!pomodoro().matches(&Session::inactive()));
    }

    #[test]
    fn apply_settings_fills_only_unset_fields() {
        let settings = Settings {
            daily_goal: 0,
            default_break_duration: TimeDelta::minutes(5),
            default_pomodoro_duration: TimeDelta::minutes(25),
            default_tags: vec!["work".to_string()],
        };

        let mut fresh = Session::inactive();
        fresh.apply_settings(&settings);
        assert_eq!(fresh.duration, TimeDelta::minutes(25));
        assert_eq!(fresh.tags, vec!["work".to_string()]);

        let mut explicit = Session {
            start_time: None,
            description: String::new(),
            duration: TimeDelta::minutes(50),
            tags: vec!["own".to_string()],
        };
        explicit.apply_settings(&settings);
        assert_eq!(explicit.duration, TimeDelta::minutes(50));
        assert_eq!(explicit.tags, vec!["own".to_string()]);
    }

    #[test]
    fn display_and_parse_round_trip() {
        let session = pomodoro();
        let parsed: Session = session.to_string().parse().unwrap();
        assert_eq!(parsed, session);
    }
}
