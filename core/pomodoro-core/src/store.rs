//! File-backed session state persistence.
//!
//! The store owns three text files under one root directory (default
//! `~/.pomodoro`) and is the only component that touches the file system:
//!
//! - `current` — the in-progress or just-finished session, one line, empty
//!   when inactive
//! - `log` — session history, one line per record
//! - `settings` — `key=value` block of user settings
//!
//! Absence of any file is a normal state equivalent to empty. Every mutation
//! is a whole-file read-modify-write; there is no incremental patching and no
//! cross-file transaction. Lifecycle operations touching two files perform an
//! ordered sequence of single-file writes: a crash between writing `current`
//! and appending `log` during [`Store::start`] can leave an active-looking
//! current session absent from the log. Accepted limitation.
//!
//! # Atomic Writes
//!
//! Whole-file rewrites go through a temp file + rename in the storage
//! directory, so a crash mid-write never leaves a torn file. `start`'s
//! history line is a plain append.

use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::codec;
use crate::error::{Error, Result};
use crate::log::SessionLog;
use crate::session::Session;
use crate::settings::Settings;

/// File names under the storage directory.
const CURRENT_FILE: &str = "current";
const LOG_FILE: &str = "log";
const SETTINGS_FILE: &str = "settings";

/// Directory under the home directory used when no path is given.
const DEFAULT_DIR: &str = ".pomodoro";

/// A snapshot of everything the store persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub current: Session,
    pub log: SessionLog,
    pub settings: Settings,
}

/// Coordinates the `current`, `log`, and `settings` files and exposes the
/// session lifecycle.
///
/// Single process, single writer. The clock is injectable so tests can
/// advance simulated time; see [`crate::clock::ManualClock`].
pub struct Store {
    directory: PathBuf,
    current_file: PathBuf,
    log_file: PathBuf,
    settings_file: PathBuf,
    clock: Box<dyn Clock>,
}

impl Store {
    /// Opens a store rooted at `directory`, or at `~/.pomodoro` when `None`.
    pub fn open(directory: Option<&Path>) -> Result<Store> {
        let directory = match directory {
            Some(d) => d.to_path_buf(),
            None => dirs::home_dir()
                .ok_or(Error::HomeDirNotFound)?
                .join(DEFAULT_DIR),
        };
        Ok(Store::with_clock(directory, SystemClock))
    }

    /// Opens a store with an explicit clock.
    pub fn with_clock(directory: impl Into<PathBuf>, clock: impl Clock + 'static) -> Store {
        let directory = directory.into();
        Store {
            current_file: directory.join(CURRENT_FILE),
            log_file: directory.join(LOG_FILE),
            settings_file: directory.join(SETTINGS_FILE),
            directory,
            clock: Box::new(clock),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Reads the current session. An absent or empty file is the inactive
    /// session; a malformed record is surfaced, not swallowed.
    pub fn current_session(&self) -> Result<Session> {
        match fs::read_to_string(&self.current_file) {
            Ok(text) => codec::decode_session(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Session::inactive()),
            Err(e) => Err(Error::io("reading current session", e)),
        }
    }

    /// Reads the session log. An absent file is the empty log; blank lines
    /// are skipped, malformed lines are surfaced.
    pub fn session_log(&self) -> Result<SessionLog> {
        match fs::read_to_string(&self.log_file) {
            Ok(text) => SessionLog::from_text(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionLog::new()),
            Err(e) => Err(Error::io("reading session log", e)),
        }
    }

    /// Reads user settings merged with the built-in defaults. An absent file
    /// means "nothing configured", not an error.
    pub fn effective_settings(&self) -> Result<Settings> {
        let loaded = match fs::read_to_string(&self.settings_file) {
            Ok(text) => codec::decode_settings(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::zero(),
            Err(e) => return Err(Error::io("reading settings", e)),
        };
        Ok(loaded.merge_defaults(&Settings::default()))
    }

    /// Reads all three resources as one snapshot.
    pub fn state(&self) -> Result<State> {
        Ok(State {
            current: self.current_session()?,
            log: self.session_log()?,
            settings: self.effective_settings()?,
        })
    }

    /// Starts a session: stamps it with the current instant, fills unset
    /// duration/tags from settings, writes it as current, and appends it to
    /// the log.
    ///
    /// An Active current session is implicitly cancelled first (its log entry
    /// removed); a Done one is left in the log as a completed record and only
    /// overwritten as current. Returns the session as persisted.
    pub fn start(&self, session: Session) -> Result<Session> {
        self.ensure_directory()?;

        let now = self.clock.now();
        let current = self.current_session()?;
        if current.is_active(now) {
            debug!(start = ?current.start_time, "superseding active session");
            self.cancel()?;
        }

        let mut session = session;
        // Seconds precision: the codec drops sub-second components, so stamp
        // what will actually be persisted.
        session.start_time = Some(chrono::Timelike::with_nanosecond(&now, 0).unwrap_or(now));
        session.apply_settings(&self.effective_settings()?);

        self.write_current(&session)?;
        self.append_log(&session)?;

        debug!(start = ?session.start_time, duration_min = session.duration_minutes(), "started session");
        Ok(session)
    }

    /// Finishes the current session: overwrites its duration with the actual
    /// elapsed time, clears current, and upserts the record into the log.
    ///
    /// With no current session this still clears `current` (idempotent) and
    /// short-circuits before any duration math or log mutation.
    pub fn finish(&self) -> Result<()> {
        let now = self.clock.now();
        let mut session = self.current_session()?;

        let Some(start) = session.start_time else {
            return self.clear();
        };

        self.clear()?;
        session.duration = now - start;

        let mut log = self.session_log()?;
        log.update(session);
        self.write_log(&log)?;

        debug!(start = ?start, "finished session");
        Ok(())
    }

    /// Cancels the current session, whether Active or Done: clears current
    /// and removes the matching record from the log, leaving no trace. No-op
    /// when inactive.
    pub fn cancel(&self) -> Result<()> {
        self.ensure_directory()?;

        let session = self.current_session()?;
        if session.is_inactive() {
            return Ok(());
        }

        self.write_current(&Session::inactive())?;

        let mut log = self.session_log()?;
        log.delete(&session);
        self.write_log(&log)?;

        debug!(start = ?session.start_time, "cancelled session");
        Ok(())
    }

    /// Clears the current session without touching the log. This is the
    /// difference from [`Store::cancel`]: the history record stays.
    pub fn clear(&self) -> Result<()> {
        self.ensure_directory()?;
        self.write_current(&Session::inactive())
    }

    fn ensure_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.directory)
            .map_err(|e| Error::io("creating storage directory", e))
    }

    fn write_current(&self, session: &Session) -> Result<()> {
        self.write_atomic(
            &self.current_file,
            codec::encode_session(session).as_bytes(),
            "writing current session",
        )
    }

    fn write_log(&self, log: &SessionLog) -> Result<()> {
        self.write_atomic(&self.log_file, log.to_text().as_bytes(), "writing session log")
    }

    fn append_log(&self, session: &Session) -> Result<()> {
        if session.is_inactive() {
            return Ok(());
        }

        let mut line = codec::encode_session(session);
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .map_err(|e| Error::io("appending session log", e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| Error::io("appending session log", e))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8], context: &str) -> Result<()> {
        let mut temp = NamedTempFile::new_in(&self.directory)
            .map_err(|e| Error::io(context, e))?;
        temp.write_all(bytes).map_err(|e| Error::io(context, e))?;
        temp.flush().map_err(|e| Error::io(context, e))?;
        temp.persist(path).map_err(|e| Error::io(context, e.error))?;
        Ok(())
    }
}
