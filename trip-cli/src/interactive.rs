//! Prompt-driven session: the form, the list and the per-card actions.
//!
//! Prompts block, so they run on the blocking pool while banner dismissals
//! keep ticking on the runtime.

use anyhow::Context;
use chrono::NaiveDate;
use inquire::{InquireError, Select, Text, error::InquireResult};
use std::fmt;
use trip_core::{TripController, TripDraft, view::format_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Add,
    ToggleDetails,
    Delete,
    Refresh,
    Quit,
}

impl Action {
    const ALL: [Action; 5] =
        [Action::Add, Action::ToggleDetails, Action::Delete, Action::Refresh, Action::Quit];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Add => "Add trip",
            Action::ToggleDetails => "Show / hide weather details",
            Action::Delete => "Delete trip",
            Action::Refresh => "Refresh",
            Action::Quit => "Quit",
        })
    }
}

/// One entry of the trip picker.
#[derive(Debug, Clone)]
struct TripChoice {
    id: u64,
    label: String,
}

impl fmt::Display for TripChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

pub async fn run(controller: &mut TripController) -> anyhow::Result<()> {
    loop {
        println!("\n{}", controller.view().render());
        println!("[{}]", controller.view().submit_button().state().label);

        let Some(action) = prompt(|| Select::new("What next?", Action::ALL.to_vec()).prompt())
            .await?
        else {
            return Ok(());
        };

        match action {
            Action::Add => {
                let Some(draft) = prompt_form(controller.form().clone()).await? else {
                    continue;
                };
                // the failure is already on the error banner
                let _ = controller.submit(draft).await;
            }
            Action::ToggleDetails => {
                if let Some(id) = pick_trip(controller, "Which trip?").await? {
                    controller.toggle_details(id);
                }
            }
            Action::Delete => {
                if let Some(id) = pick_trip(controller, "Delete which trip?").await? {
                    if let Err(err) = controller.delete(id) {
                        tracing::warn!("Delete failed: {err:#}");
                        controller.view_mut().show_error("Failed to delete trip. Please try again.");
                    }
                }
            }
            Action::Refresh => {}
            Action::Quit => return Ok(()),
        }
    }
}

/// Ask for destination and dates, prefilled from `form`.
async fn prompt_form(form: TripDraft) -> anyhow::Result<Option<TripDraft>> {
    let destination = form.destination.clone();
    let Some(destination) =
        prompt(move || Text::new("Destination:").with_initial_value(&destination).prompt()).await?
    else {
        return Ok(None);
    };

    let Some(start) = prompt_date("Start date (YYYY-MM-DD):", form.start_date).await? else {
        return Ok(None);
    };
    let Some(end) = prompt_date("End date (YYYY-MM-DD):", form.end_date).await? else {
        return Ok(None);
    };

    Ok(Some(TripDraft::new(destination, start, end)))
}

/// `Some(None)` means the field was left blank.
async fn prompt_date(
    message: &'static str,
    default: Option<NaiveDate>,
) -> anyhow::Result<Option<Option<NaiveDate>>> {
    let initial = default.map(|d| d.to_string()).unwrap_or_default();
    let answer = prompt(move || {
        Text::new(message)
            .with_initial_value(&initial)
            .with_validator(|input: &str| {
                if input.trim().is_empty() || parse_date(input).is_some() {
                    Ok(inquire::validator::Validation::Valid)
                } else {
                    Ok(inquire::validator::Validation::Invalid(
                        "Use the YYYY-MM-DD format".into(),
                    ))
                }
            })
            .prompt()
    })
    .await?;

    Ok(answer.map(|input| parse_date(&input)))
}

async fn pick_trip(controller: &TripController, message: &'static str) -> anyhow::Result<Option<u64>> {
    let choices: Vec<TripChoice> = controller
        .view()
        .card_ids()
        .into_iter()
        .filter_map(|id| controller.trips().iter().find(|trip| trip.id == id))
        .map(|trip| TripChoice {
            id: trip.id,
            label: format!(
                "{} ({} to {})",
                trip.destination,
                format_date(trip.start_date),
                format_date(trip.end_date)
            ),
        })
        .collect();

    if choices.is_empty() {
        println!("No trips yet.");
        return Ok(None);
    }

    let picked = prompt(move || Select::new(message, choices).prompt()).await?;
    Ok(picked.map(|choice| choice.id))
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

/// Run a blocking prompt off the runtime. Esc / Ctrl-C give `None`.
async fn prompt<T, F>(ask: F) -> anyhow::Result<Option<T>>
where
    T: Send + 'static,
    F: FnOnce() -> InquireResult<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(ask).await.context("Prompt task failed")?;

    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Prompt failed"),
    }
}
