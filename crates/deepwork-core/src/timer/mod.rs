mod controller;
mod runner;

pub use controller::{TimerController, TimerMode, TimerSnapshot, TimerState};
pub use runner::{RunnerHandle, TimerRunner};
