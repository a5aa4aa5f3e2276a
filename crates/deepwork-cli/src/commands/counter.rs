use clap::Subcommand;
use deepwork_core::api::types::NewSessionCounter;
use deepwork_core::api::SessionCounterService;
use deepwork_core::storage::Config;
use deepwork_core::{ApiClient, SessionCountersApi};

#[derive(Subcommand)]
pub enum CounterAction {
    /// Show the selected streak counter
    Show,
    /// Create a new selected counter with the given target
    Set {
        /// How many work intervals make a full streak
        target: u32,
    },
    /// Zero out the completed count on the selected counter
    Reset,
}

pub async fn run(action: CounterAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let api = SessionCountersApi::new(ApiClient::new(config.base_url()?));

    match action {
        CounterAction::Show => match api.selected().await? {
            Some(counter) => println!("{}", serde_json::to_string_pretty(&counter)?),
            None => println!("no counter selected"),
        },
        CounterAction::Set { target } => {
            let counter = api
                .create(&NewSessionCounter {
                    target,
                    is_selected: true,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&counter)?);
        }
        CounterAction::Reset => match api.reset().await? {
            Some(counter) => println!("{}", serde_json::to_string_pretty(&counter)?),
            None => println!("no counter selected"),
        },
    }
    Ok(())
}
