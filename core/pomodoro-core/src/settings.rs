//! User settings with default-filling semantics.
//!
//! A field holding its zero value (0, zero duration, empty list) is "unset"
//! and gets filled from a fallback record by [`Settings::merge_defaults`].
//! The flip side is that the zero value cannot be configured explicitly: a
//! `daily_goal` of 0 is indistinguishable from "no goal". Accepted
//! limitation, kept for format compatibility.

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::Error;
use crate::session::serde_minutes;

/// User-configurable defaults and goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Target number of completed sessions per day. 0 means no goal.
    pub daily_goal: u32,
    #[serde(with = "serde_minutes")]
    pub default_break_duration: TimeDelta,
    #[serde(with = "serde_minutes")]
    pub default_pomodoro_duration: TimeDelta,
    pub default_tags: Vec<String>,
}

impl Default for Settings {
    /// The built-in defaults: 5-minute breaks, 25-minute pomodoros.
    fn default() -> Self {
        Settings {
            daily_goal: 0,
            default_break_duration: TimeDelta::minutes(5),
            default_pomodoro_duration: TimeDelta::minutes(25),
            default_tags: Vec::new(),
        }
    }
}

impl Settings {
    /// All fields at their zero value, i.e. fully unset. What an absent or
    /// empty settings file decodes to, before merging.
    pub fn zero() -> Settings {
        Settings {
            daily_goal: 0,
            default_break_duration: TimeDelta::zero(),
            default_pomodoro_duration: TimeDelta::zero(),
            default_tags: Vec::new(),
        }
    }

    /// Fills each zero-valued field from `fallback`. Non-zero fields are
    /// left untouched. Call with the loaded record first, built-in defaults
    /// as the fallback.
    pub fn merge_defaults(mut self, fallback: &Settings) -> Settings {
        if self.daily_goal == 0 {
            self.daily_goal = fallback.daily_goal;
        }
        if self.default_break_duration == TimeDelta::zero() {
            self.default_break_duration = fallback.default_break_duration;
        }
        if self.default_pomodoro_duration == TimeDelta::zero() {
            self.default_pomodoro_duration = fallback.default_pomodoro_duration;
        }
        if self.default_tags.is_empty() {
            self.default_tags = fallback.default_tags.clone();
        }
        self
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::encode_settings(self))
    }
}

impl FromStr for Settings {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        codec::decode_settings(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_fills_only_zero_fields() {
        let loaded = Settings {
            daily_goal: 0,
            default_break_duration: TimeDelta::zero(),
            default_pomodoro_duration: TimeDelta::minutes(50),
            default_tags: Vec::new(),
        };

        let merged = loaded.merge_defaults(&Settings::default());
        assert_eq!(merged.daily_goal, 0);
        assert_eq!(merged.default_break_duration, TimeDelta::minutes(5));
        assert_eq!(merged.default_pomodoro_duration, TimeDelta::minutes(50));
        assert!(merged.default_tags.is_empty());
    }

    #[test]
    fn merge_preserves_explicit_values() {
        let loaded = Settings {
            daily_goal: 8,
            default_break_duration: TimeDelta::minutes(10),
            default_pomodoro_duration: TimeDelta::minutes(50),
            default_tags: vec!["work".to_string()],
        };

        let merged = loaded.clone().merge_defaults(&Settings::default());
        assert_eq!(merged, loaded);
    }

    #[test]
    fn merge_is_idempotent() {
        let loaded = Settings {
            daily_goal: 3,
            default_break_duration: TimeDelta::zero(),
            default_pomodoro_duration: TimeDelta::zero(),
            default_tags: Vec::new(),
        };
        let fallback = Settings::default();

        let once = loaded.merge_defaults(&fallback);
        let twice = once.clone().merge_defaults(&fallback);
        assert_eq!(once, twice);
    }

    #[test]
    fn zero_settings_merge_to_builtin_defaults() {
        let merged = Settings::zero().merge_defaults(&Settings::default());
        assert_eq!(merged, Settings::default());
    }
}
