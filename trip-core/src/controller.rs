//! Add-trip orchestration.
//!
//! A submission walks `Idle -> Validating -> FetchingId -> Synthesizing ->
//! Persisting -> Rendering -> Idle`. Validation, id and persistence failures
//! go through `Error` back to `Idle` and leave the collection untouched.

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, Utc};
use std::fmt::Debug;

use crate::{
    error::{SubmitError, ValidationError},
    model::{Trip, TripDraft},
    provider::IdProvider,
    store::TripStore,
    view::TripView,
    weather,
};

/// Time source for trip ids, timestamps and form defaults.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date the user considers "today".
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    FetchingId,
    Synthesizing,
    Persisting,
    Rendering,
    Error,
}

/// Form input that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTrip {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Check a draft; the first failing rule wins.
pub fn validate(draft: &TripDraft) -> Result<ValidTrip, ValidationError> {
    let destination = draft.destination.trim();
    if destination.is_empty() {
        return Err(ValidationError::EmptyDestination);
    }

    let (Some(start_date), Some(end_date)) = (draft.start_date, draft.end_date) else {
        return Err(ValidationError::MissingDate);
    };

    if start_date > end_date {
        return Err(ValidationError::InvertedRange);
    }

    Ok(ValidTrip { destination: destination.to_string(), start_date, end_date })
}

#[derive(Debug)]
pub struct TripController {
    store: TripStore,
    provider: Box<dyn IdProvider>,
    clock: Box<dyn Clock>,
    view: TripView,
    trips: Vec<Trip>,
    form: TripDraft,
    state: SubmissionState,
    last_path: Vec<SubmissionState>,
}

impl TripController {
    pub fn new(
        store: TripStore,
        provider: Box<dyn IdProvider>,
        clock: Box<dyn Clock>,
        view: TripView,
    ) -> Self {
        let form = default_draft(clock.today());

        Self {
            store,
            provider,
            clock,
            view,
            trips: Vec::new(),
            form,
            state: SubmissionState::Idle,
            last_path: Vec::new(),
        }
    }

    /// Read the stored collection and render it. Called once at startup.
    pub fn load(&mut self) {
        self.trips = self.store.load_all();
        self.view.render_all(&self.trips);
        tracing::info!(count = self.trips.len(), "Loaded trips");
    }

    /// Trips in insertion order.
    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn view(&self) -> &TripView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut TripView {
        &mut self.view
    }

    /// Current form contents: the defaults, or the last rejected input.
    pub fn form(&self) -> &TripDraft {
        &self.form
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// States visited by the most recent submission.
    pub fn last_path(&self) -> &[SubmissionState] {
        &self.last_path
    }

    /// Run the add-trip flow for `draft`.
    ///
    /// On failure the error banner shows the message and nothing is stored.
    pub async fn submit(&mut self, draft: TripDraft) -> Result<Trip, SubmitError> {
        self.last_path.clear();
        self.view.clear_error();
        self.form = draft;

        self.transition(SubmissionState::Validating);
        let valid = match validate(&self.form) {
            Ok(valid) => valid,
            Err(err) => return Err(self.fail(err.into())),
        };

        let _busy = self.view.submit_button().busy();

        self.transition(SubmissionState::FetchingId);
        let nonce = self.clock.now().timestamp_millis().max(0) as u64;
        let seed = match self.provider.request_id(&valid.destination, nonce).await {
            Ok(seed) => seed,
            Err(err) => return Err(self.fail(SubmitError::Fetch(err))),
        };

        self.transition(SubmissionState::Synthesizing);
        let forecast =
            weather::generate_for_month(&valid.destination, seed, self.clock.today().month());

        let now = self.clock.now();
        let trip = Trip {
            id: self.next_trip_id(now),
            destination: valid.destination,
            start_date: valid.start_date,
            end_date: valid.end_date,
            weather: forecast,
            created_at: now.to_rfc3339(),
        };

        self.transition(SubmissionState::Persisting);
        if let Err(err) = self.store.append(trip.clone()) {
            return Err(self.fail(SubmitError::Persist(err)));
        }
        self.trips.push(trip.clone());

        self.transition(SubmissionState::Rendering);
        self.view.add_trip(&trip);
        self.view.show_weather(&trip.weather);
        self.form = default_draft(self.clock.today());

        tracing::info!(id = trip.id, seed, destination = %trip.destination, "Added trip");
        self.transition(SubmissionState::Idle);
        Ok(trip)
    }

    /// Delete a trip from the store and the list. Unknown ids are a no-op.
    pub fn delete(&mut self, id: u64) -> anyhow::Result<bool> {
        let removed = self.store.remove(id)?;
        self.trips.retain(|trip| trip.id != id);
        self.view.remove_trip(id);

        if removed {
            tracing::info!(id, "Deleted trip");
        } else {
            tracing::debug!(id, "Delete ignored, no such trip");
        }
        Ok(removed)
    }

    /// Show or hide a trip's detail panel. `None` if the trip is unknown.
    pub fn toggle_details(&mut self, id: u64) -> Option<bool> {
        self.view.toggle_details(id)
    }

    fn fail(&mut self, err: SubmitError) -> SubmitError {
        self.transition(SubmissionState::Error);
        match &err {
            SubmitError::Validation(reason) => tracing::debug!("Rejected trip: {reason}"),
            SubmitError::Fetch(cause) | SubmitError::Persist(cause) => {
                tracing::warn!("Error adding trip: {cause:#}")
            }
        }

        self.view.show_error(err.to_string());
        self.transition(SubmissionState::Idle);
        err
    }

    fn transition(&mut self, next: SubmissionState) {
        tracing::trace!(from = ?self.state, to = ?next, "Submission state");
        self.state = next;
        self.last_path.push(next);
    }

    /// Millisecond timestamp, bumped past the largest existing id on collision.
    fn next_trip_id(&self, now: DateTime<Utc>) -> u64 {
        let candidate = now.timestamp_millis().max(0) as u64;
        match self.trips.iter().map(|trip| trip.id).max() {
            Some(max) if candidate <= max => max + 1,
            _ => candidate,
        }
    }
}

/// Empty destination, today to tomorrow.
pub fn default_draft(today: NaiveDate) -> TripDraft {
    TripDraft {
        destination: String::new(),
        start_date: Some(today),
        end_date: today.checked_add_days(Days::new(1)).or(Some(today)),
    }
}
