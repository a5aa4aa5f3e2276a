//! # Deep Work Core Library
//!
//! Client-side core for the Deep Work study timer. The backend owns all
//! persistence (study blocks, streak counters, auth sessions); this crate
//! owns the one piece of real state on the client -- the timer state
//! machine -- plus the HTTP clients it talks through.
//!
//! ## Architecture
//!
//! - **Timer Controller**: tick-quantum state machine over
//!   countdown/stopwatch modes with work/break cycling; the single source
//!   of truth every UI surface subscribes to
//! - **Timer Runner**: async owner that serializes commands and drives a
//!   cancellable one-second ticker tied to the active flag
//! - **API clients**: reqwest clients for study blocks, session counters
//!   and the cookie-session auth boundary
//! - **Storage**: TOML configuration and a SQLite kv store for carrying a
//!   timer snapshot across CLI invocations
//!
//! ## Key Components
//!
//! - [`TimerController`]: core timer state machine
//! - [`TimerRunner`] / [`RunnerHandle`]: serialized async driver
//! - [`ApiClient`]: authenticated backend access
//! - [`Config`]: application configuration management

pub mod api;
pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod timer;

pub use api::{ApiClient, AuthApi, SessionCountersApi, StudyBlocksApi};
pub use error::{ApiError, ConfigError, CoreError, DatabaseError, TimerError};
pub use events::Event;
pub use notify::{Notifier, NullNotifier, StderrNotifier, Toast, ToastKind};
pub use storage::{Config, Database};
pub use timer::{RunnerHandle, TimerController, TimerMode, TimerRunner, TimerSnapshot, TimerState};
