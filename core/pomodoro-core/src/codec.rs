//! Plain-text encoding for sessions and settings.
//!
//! A session is one line: an RFC 3339 timestamp, then space-separated
//! `key=value` attributes for the non-default fields. Settings use the same
//! `key=value` grammar, one pair per line. Both directions round-trip.
//!
//! ```text
//! 2024-03-01T09:00:00Z description="draft report" duration=25 tags=work,deep
//! ```
//!
//! Unknown keys are ignored on decode so older files with extra attributes
//! still load. Malformed pairs and bad values are hard errors.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

use crate::error::{Error, Result};
use crate::session::{minutes_half_up, Session};
use crate::settings::Settings;

/// Encodes a session as a single line, without a trailing newline.
///
/// An inactive session encodes to the empty string; that is the on-disk
/// representation of "no current session".
pub fn encode_session(session: &Session) -> String {
    let start = match session.start_time {
        Some(t) => t,
        None => return String::new(),
    };

    let mut out = start.to_rfc3339_opts(SecondsFormat::Secs, true);

    if !session.description.is_empty() {
        out.push_str(" description=");
        out.push_str(&quote_if_needed(&session.description));
    }

    if session.duration != TimeDelta::zero() {
        out.push_str(" duration=");
        out.push_str(&minutes_half_up(session.duration).to_string());
    }

    if !session.tags.is_empty() {
        out.push_str(" tags=");
        out.push_str(&session.tags.join(","));
    }

    out
}

/// Decodes exactly one session record.
///
/// An empty or all-whitespace input yields the inactive session. Input that
/// still contains a newline after trimming holds more than one record and is
/// rejected rather than silently truncated.
pub fn decode_session(input: &str) -> Result<Session> {
    let text = input.trim();

    if text.contains('\n') {
        return Err(Error::MultipleRecords {
            lines: text.lines().count(),
        });
    }

    if text.is_empty() {
        return Ok(Session::inactive());
    }

    let (timestamp, attributes) = match text.find(char::is_whitespace) {
        Some(at) => (&text[..at], text[at..].trim_start()),
        None => (text, ""),
    };

    let start_time = parse_timestamp(timestamp)?;
    let mut session = Session::inactive();
    session.start_time = Some(start_time);

    for (key, value) in parse_pairs(attributes)? {
        match key.as_str() {
            "description" => session.description = value,
            "duration" => session.duration = parse_minutes(&key, &value)?,
            "tags" => session.tags = split_tags(&value),
            // Legacy/unknown attributes are tolerated.
            _ => {}
        }
    }

    Ok(session)
}

/// Encodes settings as a `key=value` block, non-zero fields only, one pair
/// per line with a trailing newline. All-zero settings encode to nothing.
pub fn encode_settings(settings: &Settings) -> String {
    let mut out = String::new();

    if settings.daily_goal != 0 {
        out.push_str(&format!("daily_goal={}\n", settings.daily_goal));
    }
    if settings.default_break_duration != TimeDelta::zero() {
        out.push_str(&format!(
            "default_break_duration={}\n",
            minutes_half_up(settings.default_break_duration)
        ));
    }
    if settings.default_pomodoro_duration != TimeDelta::zero() {
        out.push_str(&format!(
            "default_pomodoro_duration={}\n",
            minutes_half_up(settings.default_pomodoro_duration)
        ));
    }
    if !settings.default_tags.is_empty() {
        out.push_str(&format!("default_tags={}\n", settings.default_tags.join(",")));
    }

    out
}

/// Decodes a settings block. Empty input yields all-zero settings; defaults
/// are the caller's concern (see [`Settings::merge_defaults`]).
pub fn decode_settings(input: &str) -> Result<Settings> {
    // Newlines and spaces are interchangeable separators in the block form.
    let flattened = input.replace('\n', " ");
    let mut settings = Settings::zero();

    for (key, value) in parse_pairs(flattened.trim())? {
        match key.as_str() {
            "daily_goal" => {
                settings.daily_goal =
                    value.parse::<u32>().map_err(|_| Error::InvalidNumber {
                        key: key.clone(),
                        value: value.clone(),
                    })?
            }
            "default_break_duration" => {
                settings.default_break_duration = parse_minutes(&key, &value)?
            }
            "default_pomodoro_duration" => {
                settings.default_pomodoro_duration = parse_minutes(&key, &value)?
            }
            "default_tags" => settings.default_tags = split_tags(&value),
            _ => {}
        }
    }

    Ok(settings)
}

fn parse_timestamp(token: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(token)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| Error::InvalidTimestamp {
            value: token.to_string(),
            source,
        })
}

/// Splits a comma list without trimming entries: an empty value is the empty
/// list, but a trailing comma keeps its trailing empty tag.
fn split_tags(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(str::to_string).collect()
}

/// Parses a duration value as whole minutes. A bare integer and an `m`
/// suffix are accepted; any other unit suffix is an error.
fn parse_minutes(key: &str, value: &str) -> Result<TimeDelta> {
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(digits_end);

    if !unit.is_empty() && unit != "m" {
        return Err(Error::UnknownDurationUnit {
            value: value.to_string(),
        });
    }

    let minutes = digits.parse::<i64>().map_err(|_| Error::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })?;

    Ok(TimeDelta::minutes(minutes))
}

/// Scans space-separated `key=value` pairs. Values may be double-quoted to
/// embed whitespace; `\"` and `\\` escapes are honored inside quotes.
fn parse_pairs(input: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        let mut saw_equals = false;
        while let Some(&c) = chars.peek() {
            if c == '=' {
                chars.next();
                saw_equals = true;
                break;
            }
            if c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }

        if !saw_equals || key.is_empty() {
            return Err(Error::MalformedAttribute { token: key });
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => value.push(escaped),
                        None => break,
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(Error::MalformedAttribute { token: key });
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                value.push(c);
                chars.next();
            }
        }

        pairs.push((key, value));
    }

    Ok(pairs)
}

fn quote_if_needed(value: &str) -> String {
    let needs_quotes = value.contains(char::is_whitespace)
        || value.contains('"')
        || value.contains('\\');
    if !needs_quotes {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
