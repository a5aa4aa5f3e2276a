//! Async owner of the timer controller.
//!
//! The runner serializes every mutation -- UI commands and the periodic
//! tick -- onto one task, so a `start` can never race an in-flight `stop`.
//! The one-second ticker exists only while the timer is active: it is
//! created on activation and dropped on deactivation or teardown, which is
//! what keeps a navigated-away session from ticking forever.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::controller::{TimerController, TimerMode, TimerState};
use crate::api::traits::{SessionCounterService, StudyBlockService};
use crate::error::{CoreError, TimerError};
use crate::events::Event;
use crate::notify::{Notifier, Toast};

enum Command {
    Start {
        mode: TimerMode,
        duration_secs: Option<u64>,
        category_id: Option<i64>,
        goal_id: Option<i64>,
        reply: oneshot::Sender<Result<Event, TimerError>>,
    },
    Pause {
        reply: oneshot::Sender<Option<Event>>,
    },
    Resume {
        reply: oneshot::Sender<Result<Option<Event>, TimerError>>,
    },
    Stop {
        rating: Option<f64>,
        reply: oneshot::Sender<Result<Option<Event>, TimerError>>,
    },
    Reset {
        reply: oneshot::Sender<Result<Event, TimerError>>,
    },
    Shutdown,
}

/// Cloneable handle for issuing commands and observing state.
#[derive(Clone)]
pub struct RunnerHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<TimerState>,
}

/// Drives a [`TimerController`]: owns it, ticks it, and applies commands
/// arriving through the [`RunnerHandle`].
pub struct TimerRunner<S, C, N> {
    controller: TimerController<S, C>,
    notifier: N,
    commands: mpsc::Receiver<Command>,
}

impl<S, C, N> TimerRunner<S, C, N>
where
    S: StudyBlockService,
    C: SessionCounterService,
    N: Notifier,
{
    pub fn new(controller: TimerController<S, C>, notifier: N) -> (Self, RunnerHandle) {
        let (tx, rx) = mpsc::channel(16);
        let handle = RunnerHandle {
            commands: tx,
            state: controller.subscribe(),
        };
        (
            Self {
                controller,
                notifier,
                commands: rx,
            },
            handle,
        )
    }

    /// Run until shutdown is requested or every handle is dropped.
    /// Returns the controller so the embedder can persist a final snapshot.
    pub async fn run(mut self) -> TimerController<S, C> {
        enum Wake {
            Tick,
            Command(Option<Command>),
        }

        let mut ticker: Option<Interval> = None;

        loop {
            let wake = tokio::select! {
                _ = tick_when_armed(&mut ticker) => Wake::Tick,
                cmd = self.commands.recv() => Wake::Command(cmd),
            };

            match wake {
                Wake::Tick => {
                    if let Err(e) = self.controller.tick().await {
                        // Tick failures have no caller to return to; toast
                        // them and let the next tick retry the transition.
                        self.notifier.push(Toast::error(e.to_string()));
                    }
                }
                Wake::Command(Some(Command::Shutdown)) | Wake::Command(None) => break,
                Wake::Command(Some(cmd)) => self.handle(cmd).await,
            }

            // Reconcile the ticker with `is_active` after every mutation.
            let active = self.controller.state().is_active;
            match (&ticker, active) {
                (None, true) => {
                    let mut t =
                        interval_at(Instant::now() + Duration::from_secs(1), Duration::from_secs(1));
                    t.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    ticker = Some(t);
                }
                (Some(_), false) => ticker = None,
                _ => {}
            }
        }

        self.controller
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Start {
                mode,
                duration_secs,
                category_id,
                goal_id,
                reply,
            } => {
                let result = self
                    .controller
                    .start(mode, duration_secs, category_id, goal_id)
                    .await;
                let _ = reply.send(result);
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.controller.pause());
            }
            Command::Resume { reply } => {
                let _ = reply.send(self.controller.resume());
            }
            Command::Stop { rating, reply } => {
                let _ = reply.send(self.controller.stop(rating).await);
            }
            Command::Reset { reply } => {
                let _ = reply.send(self.controller.reset());
            }
            Command::Shutdown => unreachable!("handled in run loop"),
        }
    }
}

/// Awaits the next tick, or forever when no ticker is armed.
async fn tick_when_armed(ticker: &mut Option<Interval>) {
    match ticker.as_mut() {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}

impl RunnerHandle {
    pub async fn start(
        &self,
        mode: TimerMode,
        duration_secs: Option<u64>,
        category_id: Option<i64>,
        goal_id: Option<i64>,
    ) -> Result<Event, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Start {
            mode,
            duration_secs,
            category_id,
            goal_id,
            reply: tx,
        })
        .await?;
        Ok(recv(rx).await??)
    }

    pub async fn pause(&self) -> Result<Option<Event>, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Pause { reply: tx }).await?;
        recv(rx).await
    }

    pub async fn resume(&self) -> Result<Option<Event>, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Resume { reply: tx }).await?;
        Ok(recv(rx).await??)
    }

    pub async fn stop(&self, rating: Option<f64>) -> Result<Option<Event>, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stop { rating, reply: tx }).await?;
        Ok(recv(rx).await??)
    }

    pub async fn reset(&self) -> Result<Event, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Reset { reply: tx }).await?;
        Ok(recv(rx).await??)
    }

    pub async fn shutdown(&self) -> Result<(), CoreError> {
        self.send(Command::Shutdown).await
    }

    /// Current state, cloned out of the watch channel.
    pub fn state(&self) -> TimerState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state.clone()
    }

    async fn send(&self, cmd: Command) -> Result<(), CoreError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| CoreError::Custom("timer runner has shut down".into()))
    }
}

async fn recv<T>(rx: oneshot::Receiver<T>) -> Result<T, CoreError> {
    rx.await
        .map_err(|_| CoreError::Custom("timer runner has shut down".into()))
}
