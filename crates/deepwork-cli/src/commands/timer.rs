use std::io::Write;

use clap::Subcommand;
use deepwork_core::storage::{Config, Database};
use deepwork_core::{
    ApiClient, SessionCountersApi, StderrNotifier, StudyBlocksApi, TimerController, TimerMode,
    TimerRunner, TimerSnapshot, TimerState,
};

const SNAPSHOT_KEY: &str = "timer_snapshot";

type Controller = TimerController<StudyBlocksApi, SessionCountersApi>;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session and tick until it ends (Ctrl-C pauses)
    Start {
        /// Countdown length in minutes (defaults to timer.work_minutes)
        #[arg(long)]
        minutes: Option<u64>,
        /// Run an open-ended stopwatch session instead of a countdown
        #[arg(long)]
        stopwatch: bool,
        /// Study category to attach to the session
        #[arg(long)]
        category: Option<i64>,
        /// Daily goal to attach to the session
        #[arg(long)]
        goal: Option<i64>,
    },
    /// Resume a paused session and keep ticking
    Resume,
    /// Finalize the current session with an optional rating (1-5)
    Stop {
        #[arg(long)]
        rating: Option<f64>,
    },
    /// Discard a paused session without saving it
    Reset,
    /// Print current timer state as JSON
    Status,
}

fn build_controller(config: &Config, db: &Database) -> Result<Controller, Box<dyn std::error::Error>> {
    let client = ApiClient::new(config.base_url()?);
    let blocks = StudyBlocksApi::new(client.clone());
    let counters = SessionCountersApi::new(client);
    let mut controller = TimerController::new(blocks, counters, config.break_secs());

    if let Some(json) = db.kv_get(SNAPSHOT_KEY)? {
        match serde_json::from_str::<TimerSnapshot>(&json) {
            Ok(snapshot) => controller.restore(snapshot),
            // A corrupt snapshot is not worth dying over; start fresh.
            Err(_) => db.kv_delete(SNAPSHOT_KEY)?,
        }
    }
    Ok(controller)
}

fn save_snapshot(db: &Database, snapshot: &TimerSnapshot) -> Result<(), Box<dyn std::error::Error>> {
    if snapshot.state.is_idle() {
        db.kv_delete(SNAPSHOT_KEY)?;
    } else {
        db.kv_set(SNAPSHOT_KEY, &serde_json::to_string(snapshot)?)?;
    }
    Ok(())
}

pub async fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut controller = build_controller(&config, &db)?;

    match action {
        TimerAction::Start {
            minutes,
            stopwatch,
            category,
            goal,
        } => {
            let (mode, duration_secs) = if stopwatch {
                (TimerMode::OpenSession, None)
            } else {
                let minutes = minutes.unwrap_or(config.timer.work_minutes);
                (TimerMode::Countdown, Some(minutes * 60))
            };
            run_live(controller, &db, Some((mode, duration_secs, category, goal))).await?;
        }
        TimerAction::Resume => {
            run_live(controller, &db, None).await?;
        }
        TimerAction::Stop { rating } => {
            match controller.stop(rating).await? {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => println!("no session to stop"),
            }
            save_snapshot(&db, &controller.to_snapshot())?;
        }
        TimerAction::Reset => {
            let event = controller.reset()?;
            println!("{}", serde_json::to_string_pretty(&event)?);
            save_snapshot(&db, &controller.to_snapshot())?;
        }
        TimerAction::Status => {
            println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
        }
    }
    Ok(())
}

/// Drive the runner until the session ends or Ctrl-C pauses it, then
/// persist the snapshot for the next invocation.
async fn run_live(
    controller: Controller,
    db: &Database,
    start: Option<(TimerMode, Option<u64>, Option<i64>, Option<i64>)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (runner, handle) = TimerRunner::new(controller, StderrNotifier);
    let mut state_rx = handle.subscribe();
    let join = tokio::spawn(runner.run());

    let started = match start {
        Some((mode, duration_secs, category, goal)) => {
            handle.start(mode, duration_secs, category, goal).await
        }
        None => handle.resume().await.map(|event| {
            event.unwrap_or_else(|| {
                // Already active (snapshot from an interrupted live run).
                deepwork_core::Event::TimerResumed {
                    time_secs: handle.state().time,
                    at: chrono::Utc::now(),
                }
            })
        }),
    };

    match started {
        Ok(event) => println!("{}", serde_json::to_string_pretty(&event)?),
        Err(e) => {
            // Nothing started; tear the runner down before reporting.
            handle.shutdown().await.ok();
            join.await.ok();
            return Err(e.into());
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.pause().await.ok();
                eprintln!("\npaused");
                break;
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                print_progress(&state);
                if state.is_idle() {
                    eprintln!("\nsession complete");
                    break;
                }
            }
        }
    }

    handle.shutdown().await.ok();
    if let Ok(controller) = join.await {
        save_snapshot(db, &controller.to_snapshot())?;
    }
    Ok(())
}

fn print_progress(state: &TimerState) {
    let label = match (state.mode, state.is_break) {
        (_, true) => "break",
        (TimerMode::Countdown, false) => "work",
        (TimerMode::OpenSession, false) => "studying",
    };
    eprint!("\r{} {}   ", label, format_hms(state.time));
    let _ = std::io::stderr().flush();
}

fn format_hms(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
