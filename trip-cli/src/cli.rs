use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Select, Text};
use std::path::PathBuf;
use trip_core::{
    Config, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, ProviderId, SystemClock,
    TripController, TripDraft, TripStore, TripView,
    provider::{default_provider_from_config, provider_from_config},
};

use crate::interactive;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "trip", version, about = "Trip planner with synthesized forecasts")]
pub struct Cli {
    #[command(flatten)]
    pub session: Session,

    /// More log output; repeat for trace level.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Where trips are kept and where forecast seeds come from.
#[derive(Debug, Args)]
pub struct Session {
    /// Store file to use instead of the configured one.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Keep trips in memory only; nothing is read from or written to disk.
    #[arg(long, global = true, conflicts_with = "store")]
    pub ephemeral: bool,

    /// Id provider to use instead of the configured one (http, counter).
    #[arg(long, global = true)]
    pub provider: Option<ProviderId>,

    /// Seed forecasts from a local counter; same as `--provider counter`.
    #[arg(long, global = true, conflicts_with = "provider")]
    pub offline: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a trip and print the updated list.
    Add {
        /// Destination name.
        destination: String,

        /// First day (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD); defaults to tomorrow.
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// List planned trips, newest first.
    List {
        /// Expand every trip's weather details.
        #[arg(long)]
        details: bool,
    },

    /// Show one trip with its weather details expanded.
    Show { id: u64 },

    /// Delete a trip by id.
    Delete { id: u64 },

    /// Prompt-driven planner session.
    Interactive,

    /// Choose the id provider and store location.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Cli { session, command, .. } = self;
        let config = Config::load()?;

        match command {
            Command::Configure => configure(config)?,
            Command::Add { destination, start, end } => {
                let mut controller = session.controller(&config)?;
                let defaults = controller.form().clone();
                let draft = TripDraft::new(
                    destination,
                    start.or(defaults.start_date),
                    end.or(defaults.end_date),
                );

                // On failure main reports the error; the banner is not printed.
                controller.submit(draft).await?;
                print!("{}", controller.view().render());
            }
            Command::List { details } => {
                let mut controller = session.controller(&config)?;
                if details {
                    for id in controller.view().card_ids() {
                        controller.toggle_details(id);
                    }
                }
                print!("{}", controller.view().render_list());
            }
            Command::Show { id } => {
                let mut controller = session.controller(&config)?;
                if controller.toggle_details(id).is_none() {
                    bail!("No trip with id {id}");
                }
                print!("{}", controller.view().render_list());
            }
            Command::Delete { id } => {
                let mut controller = session.controller(&config)?;
                if controller.delete(id)? {
                    println!("Deleted trip {id}.\n");
                } else {
                    println!("No trip with id {id}.\n");
                }
                print!("{}", controller.view().render_list());
            }
            Command::Interactive => {
                let mut controller = session.controller(&config)?;
                interactive::run(&mut controller).await?;
            }
        }

        Ok(())
    }
}

impl Session {
    /// Provider picked on the command line, if any.
    pub fn provider_override(&self) -> Option<ProviderId> {
        if self.offline { Some(ProviderId::Counter) } else { self.provider }
    }

    fn controller(&self, config: &Config) -> anyhow::Result<TripController> {
        let kv: Box<dyn KeyValueStore> = if self.ephemeral {
            Box::new(MemoryKeyValueStore::new())
        } else {
            let path = match &self.store {
                Some(path) => path.clone(),
                None => config.store_path()?,
            };
            tracing::debug!(path = %path.display(), "Using store");
            Box::new(FileKeyValueStore::new(path))
        };

        let provider = match self.provider_override() {
            Some(id) => provider_from_config(id, config)?,
            None => default_provider_from_config(config)?,
        };

        let mut controller = TripController::new(
            TripStore::new(kv),
            provider,
            Box::new(SystemClock),
            TripView::new(),
        );
        controller.load();

        Ok(controller)
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let current = config.provider_id().unwrap_or(ProviderId::Http);
    let start = ProviderId::all().iter().position(|id| *id == current).unwrap_or(0);

    let provider = Select::new("Id provider:", ProviderId::all().to_vec())
        .with_starting_cursor(start)
        .prompt()
        .context("Provider selection aborted")?;
    config.set_provider(provider);

    if provider == ProviderId::Http {
        let endpoint = Text::new("Endpoint:")
            .with_default(config.endpoint())
            .prompt()
            .context("Endpoint prompt aborted")?;
        config.endpoint = Some(endpoint);

        let timeout = CustomType::<u64>::new("Request timeout (seconds):")
            .with_default(config.request_timeout().as_secs())
            .with_error_message("Please enter a whole number of seconds")
            .prompt()
            .context("Timeout prompt aborted")?;
        config.request_timeout_secs = Some(timeout);
    }

    let store_default = config.store_path()?.display().to_string();
    let store = Text::new("Store file:")
        .with_default(&store_default)
        .prompt()
        .context("Store prompt aborted")?;
    config.store_path = Some(PathBuf::from(store));

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_flag_uses_provider_names() {
        let cli = Cli::try_parse_from(["trip", "--provider", "Counter", "list"]).unwrap();
        assert_eq!(cli.session.provider, Some(ProviderId::Counter));
        assert_eq!(cli.session.provider_override(), Some(ProviderId::Counter));

        let err = Cli::try_parse_from(["trip", "--provider", "fax", "list"]).unwrap_err();
        assert!(err.to_string().contains("Unknown provider 'fax'"));
    }

    #[test]
    fn offline_means_counter_provider() {
        let cli = Cli::try_parse_from(["trip", "list", "--offline"]).unwrap();
        assert_eq!(cli.session.provider_override(), Some(ProviderId::Counter));

        let cli = Cli::try_parse_from(["trip", "list"]).unwrap();
        assert_eq!(cli.session.provider_override(), None);
    }

    #[test]
    fn offline_and_provider_conflict() {
        let err = Cli::try_parse_from(["trip", "--offline", "--provider", "http", "list"]);
        assert!(err.is_err());
    }

    #[test]
    fn ephemeral_and_store_conflict() {
        let err = Cli::try_parse_from(["trip", "--ephemeral", "--store", "x.json", "list"]);
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn failed_add_returns_the_error_without_output() {
        let cli = Cli::try_parse_from([
            "trip",
            "--ephemeral",
            "--offline",
            "add",
            "Paris",
            "--start",
            "2024-06-05",
            "--end",
            "2024-06-01",
        ])
        .unwrap();

        let err = cli.run().await.unwrap_err();
        assert_eq!(err.to_string(), "End date must be after start date");
    }
}
