pub mod auth;
pub mod config;
pub mod counter;
pub mod timer;
