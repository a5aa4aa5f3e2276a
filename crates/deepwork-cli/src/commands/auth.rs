use std::io::{BufRead, Write};

use clap::Subcommand;
use deepwork_core::storage::Config;
use deepwork_core::{ApiClient, AuthApi};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Log in and store the session token
    Login {
        username: String,
        /// Password; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Log out and clear the stored session token
    Logout,
    /// Show whether a session token is stored
    Status,
}

pub async fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let api = AuthApi::new(ApiClient::new(config.base_url()?));

    match action {
        AuthAction::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt("password: ")?,
            };
            api.login(&username, &password).await?;
            println!("logged in as {username}");
        }
        AuthAction::Logout => {
            api.logout().await?;
            println!("logged out");
        }
        AuthAction::Status => {
            if api.is_logged_in() {
                println!("logged in (session token stored)");
            } else {
                println!("not logged in");
            }
        }
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String, std::io::Error> {
    eprint!("{label}");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end().to_string())
}
