//! HTTP clients for the backend collaborators.
//!
//! The backend owns all persistence: study blocks (one record per study
//! session), session counters (streak target/completed pairs) and the
//! cookie-session auth boundary. Each resource gets a thin reqwest client
//! over a shared [`ApiClient`]; the timer controller consumes them through
//! the service traits in [`traits`] so tests can substitute fakes.

pub mod auth;
pub mod client;
pub mod session_counters;
pub mod study_blocks;
pub mod traits;
pub mod types;

pub use auth::AuthApi;
pub use client::ApiClient;
pub use session_counters::SessionCountersApi;
pub use study_blocks::StudyBlocksApi;
pub use traits::{SessionCounterService, StudyBlockService};
pub use types::{NewSessionCounter, NewStudyBlock, SessionCounter, SessionCounterUpdate, StudyBlock, StudyBlockUpdate};

/// Thin wrapper around the OS keyring for the session token.
pub mod keyring_store {
    const SERVICE: &str = "deepwork";

    pub fn get(key: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
