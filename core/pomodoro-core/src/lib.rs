//! # pomodoro-core
//!
//! Core library for the Open Pomodoro plain-text format: focus-session
//! tracking for a single user, persisted as three small text files
//! (`current`, `log`, `settings`) under a root directory.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Clients can wrap with async if needed.
//! - **Not thread-safe**: Clients provide their own synchronization (`Mutex`, `RwLock`).
//! - **Graceful degradation**: Missing files read as empty/default values, not errors.
//!   Malformed records are errors; they are never silently defaulted.
//! - **Derived state**: A session's inactive/active/done status is recomputed from its
//!   start time and duration on every query, against an injectable [`Clock`].
//! - **Single writer**: One process owns the storage directory. Whole-file rewrites are
//!   atomic (temp file + rename); there is no cross-file transaction.
//!
//! Debug-level [`tracing`] events are emitted by store operations; hosts
//! enable them with their subscriber of choice.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pomodoro_core::{Session, Store};
//!
//! let store = Store::open(None)?; // ~/.pomodoro
//! store.start(Session::inactive())?;
//! let current = store.current_session()?;
//! ```

pub mod clock;
pub mod codec;
pub mod error;
pub mod log;
pub mod session;
pub mod settings;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use log::SessionLog;
pub use session::{Session, Status};
pub use settings::Settings;
pub use store::{State, Store};
