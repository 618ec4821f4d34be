use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::auth::UserId;
use crate::config::AppConfig;
use crate::db::PgStore;
use crate::error::ServiceError;
use crate::history::IndicatorQuery;
use crate::service::IndicatorService;
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(version, about = "Chilean economic indicators with a per-user query history")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database tables if they do not exist
    InitDb,
    /// Create a user account
    Register {
        #[arg(long)]
        id: UserId,
        #[arg(long)]
        username: String,
        #[arg(long, env = "ECOTECH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Look up an indicator and record it in your history
    Query {
        #[arg(long)]
        username: String,
        #[arg(long, env = "ECOTECH_PASSWORD", hide_env_values = true)]
        password: String,
        /// dolar, euro, uf, ipc or utm
        indicator: String,
        /// DD-MM-YYYY, defaults to today
        #[arg(long, default_value = "")]
        date: String,
    },
    /// Show your past lookups, newest first
    History {
        #[arg(long)]
        username: String,
        #[arg(long, env = "ECOTECH_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

/// Turns a service error into the message shown to the user.
fn user_facing(err: ServiceError) -> anyhow::Error {
    debug!(error = %err, "command failed");
    anyhow!(err.user_message())
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    debug!(?config, "loaded configuration");

    let command = match cli.command {
        Command::InitDb => {
            let store = PgStore::connect(&config.db).await?;
            store.create_all_tables().await?;
            println!("Tables ready.");
            return Ok(());
        }
        command => command,
    };

    let mut session = Session::new(IndicatorService::connect(&config).await?);
    match command {
        Command::InitDb => {}
        Command::Register {
            id,
            username,
            password,
        } => {
            session
                .register(id, &username, &password)
                .await
                .map_err(user_facing)?;
            println!("User registered.");
        }
        Command::Query {
            username,
            password,
            indicator,
            date,
        } => {
            login(&mut session, &username, &password).await?;
            match session
                .query_indicator(&indicator, &date)
                .await
                .map_err(user_facing)?
            {
                Some(value) if cli.json => println!(
                    "{}",
                    serde_json::json!({ "indicator": indicator.trim().to_lowercase(), "value": value })
                ),
                Some(value) => println!("Value: {value}"),
                None => return Err(anyhow!("No value available for that indicator and date.")),
            }
        }
        Command::History { username, password } => {
            login(&mut session, &username, &password).await?;
            let rows = session.view_history().await.map_err(user_facing)?;
            print_history(&rows, cli.json)?;
        }
    }
    session.logout();
    Ok(())
}

async fn login(session: &mut Session, username: &str, password: &str) -> anyhow::Result<()> {
    match session.login(username, password).await.map_err(user_facing)? {
        Some(_) => Ok(()),
        None => Err(anyhow!("Invalid credentials.")),
    }
}

fn print_history(rows: &[IndicatorQuery], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No records.");
        return Ok(());
    }
    for row in rows {
        println!(
            "{:<6} {} | {}  ({})",
            row.indicator_name.to_uppercase(),
            row.value_date,
            row.value,
            row.source
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_query_command() {
        let cli = Cli::try_parse_from([
            "ecotech", "query", "--username", "ana", "--password", "x", "dolar", "--date",
            "01-03-2024",
        ])
        .unwrap();

        match cli.command {
            Command::Query {
                username,
                indicator,
                date,
                ..
            } => {
                assert_eq!(username, "ana");
                assert_eq!(indicator, "dolar");
                assert_eq!(date, "01-03-2024");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn date_defaults_to_blank() {
        let cli = Cli::try_parse_from([
            "ecotech", "query", "--username", "ana", "--password", "x", "ipc",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Query { ref date, .. } if date.is_empty()));
    }

    #[test]
    fn user_facing_errors_hide_details() {
        let err = user_facing(ServiceError::Store("password authentication failed".into()));
        assert_eq!(err.to_string(), "An unexpected error occurred.");
    }
}
