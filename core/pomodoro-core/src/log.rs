//! The ordered history of sessions.
//!
//! Records are kept ascending by start time. Identity is the start-time
//! tolerance match ([`Session::matches`]), applied by an explicit comparison
//! during search and removal. Never key a map on the exact timestamp; that
//! would silently lose the tolerance.

use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::Session;

/// An ordered collection of sessions, ascending by start time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLog {
    sessions: Vec<Session>,
}

impl SessionLog {
    pub fn new() -> SessionLog {
        SessionLog::default()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    /// The most recently started session, if any.
    pub fn latest(&self) -> Option<&Session> {
        self.sessions.iter().max_by_key(|s| s.start_time)
    }

    /// Sessions starting within the given calendar day, in that day's time
    /// zone: `[midnight, midnight + 24h)`, half-open.
    pub fn for_date<Tz: TimeZone>(&self, date: &DateTime<Tz>) -> SessionLog {
        let Some(midnight) = date.with_time(NaiveTime::MIN).earliest() else {
            return SessionLog::new();
        };
        let start = midnight.with_timezone(&Utc);
        let end = start + TimeDelta::days(1);

        SessionLog {
            sessions: self
                .sessions
                .iter()
                .filter(|s| matches!(s.start_time, Some(t) if t >= start && t < end))
                .cloned()
                .collect(),
        }
    }

    /// Sessions starting within `[start, end]`, inclusive on BOTH ends. The
    /// inclusive end is a deliberate format behavior; see the boundary tests.
    pub fn for_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> SessionLog {
        SessionLog {
            sessions: self
                .sessions
                .iter()
                .filter(|s| matches!(s.start_time, Some(t) if t >= start && t <= end))
                .cloned()
                .collect(),
        }
    }

    /// Upserts by tolerance match: an existing record is replaced in place,
    /// otherwise the session is appended and the log re-sorted.
    pub fn update(&mut self, session: Session) {
        for existing in self.sessions.iter_mut() {
            if existing.matches(&session) {
                *existing = session;
                return;
            }
        }

        self.sessions.push(session);
        self.sort();
    }

    /// Removes every record matching the session by tolerance. No-op when
    /// nothing matches.
    pub fn delete(&mut self, session: &Session) {
        self.sessions.retain(|existing| !existing.matches(session));
    }

    /// Decodes one session per non-blank line. Blank lines are skipped
    /// silently; anything else malformed is surfaced.
    pub fn from_text(text: &str) -> Result<SessionLog> {
        let mut log = SessionLog::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            log.sessions.push(crate::codec::decode_session(line)?);
        }

        log.sort();
        Ok(log)
    }

    /// One line per session in current order, with a trailing newline after
    /// the last line. The empty log encodes to a single empty line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for session in &self.sessions {
            out.push_str(&crate::codec::encode_session(session));
            out.push('\n');
        }
        if out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn sort(&mut self) {
        self.sessions.sort_by_key(|s| s.start_time);
    }
}
