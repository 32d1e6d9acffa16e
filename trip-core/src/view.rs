//! Text rendering of the trip list and its transient banners.
//!
//! The view keeps its own newest-first copy of the rendered cards so single
//! cards can be added or removed without rebuilding the whole list.

use chrono::NaiveDate;
use std::{
    collections::HashSet,
    fmt::Write as _,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::task::JoinHandle;

use crate::model::{Forecast, Trip};

pub const ERROR_BANNER_TIMEOUT: Duration = Duration::from_secs(5);
pub const WEATHER_BANNER_TIMEOUT: Duration = Duration::from_secs(10);

pub const SUBMIT_LABEL: &str = "Add Trip";
pub const BUSY_LABEL: &str = "Fetching weather...";

const GENERIC_ICON: &str = "☁";

/// Icon for a condition name, case-insensitive. Unknown names get a plain cloud.
pub fn icon_for(condition: &str) -> &'static str {
    match condition.to_lowercase().as_str() {
        "sunny" => "☀",
        "partly cloudy" => "⛅",
        "cloudy" => "☁",
        "rainy" => "🌧",
        "stormy" => "⚡",
        "snowy" => "❄",
        _ => GENERIC_ICON,
    }
}

/// `Sat, Jun 1, 2024`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%a, %b %-d, %Y").to_string()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct BannerSlot {
    generation: u64,
    message: Option<String>,
}

/// A message region that clears itself after a fixed timeout.
///
/// Showing a new message aborts the pending dismissal of the previous one.
/// Must be used from within a Tokio runtime.
#[derive(Debug)]
pub struct Banner {
    timeout: Duration,
    slot: Arc<Mutex<BannerSlot>>,
    dismiss: Option<JoinHandle<()>>,
}

impl Banner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, slot: Arc::default(), dismiss: None }
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.cancel_dismiss();

        let generation = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.message = Some(message.into());
            slot.generation
        };

        let slot = Arc::clone(&self.slot);
        let timeout = self.timeout;
        self.dismiss = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut slot = lock(&slot);
            if slot.generation == generation {
                slot.message = None;
            }
        }));
    }

    pub fn clear(&mut self) {
        self.cancel_dismiss();
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        slot.message = None;
    }

    pub fn message(&self) -> Option<String> {
        lock(&self.slot).message.clone()
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.slot).message.is_some()
    }

    fn cancel_dismiss(&mut self) {
        if let Some(handle) = self.dismiss.take() {
            handle.abort();
        }
    }
}

impl Drop for Banner {
    fn drop(&mut self) {
        self.cancel_dismiss();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub label: String,
    pub disabled: bool,
}

impl Default for ButtonState {
    fn default() -> Self {
        Self { label: SUBMIT_LABEL.to_string(), disabled: false }
    }
}

/// Shared handle on the submit button.
#[derive(Debug, Clone, Default)]
pub struct SubmitButton {
    state: Arc<Mutex<ButtonState>>,
}

impl SubmitButton {
    pub fn state(&self) -> ButtonState {
        lock(&self.state).clone()
    }

    /// Disable the button until the returned guard is dropped.
    pub fn busy(&self) -> BusyGuard {
        let previous = {
            let mut state = lock(&self.state);
            std::mem::replace(
                &mut *state,
                ButtonState { label: BUSY_LABEL.to_string(), disabled: true },
            )
        };

        BusyGuard { button: self.clone(), previous: Some(previous) }
    }
}

/// Restores the submit button on drop, whatever path the submission took.
#[derive(Debug)]
pub struct BusyGuard {
    button: SubmitButton,
    previous: Option<ButtonState>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *lock(&self.button.state) = previous;
        }
    }
}

/// Rendered state of the planner screen.
#[derive(Debug)]
pub struct TripView {
    cards: Vec<Trip>,
    expanded: HashSet<u64>,
    error: Banner,
    weather: Banner,
    current_weather: Option<Forecast>,
    submit: SubmitButton,
}

impl Default for TripView {
    fn default() -> Self {
        Self::new()
    }
}

impl TripView {
    pub fn new() -> Self {
        Self::with_timeouts(ERROR_BANNER_TIMEOUT, WEATHER_BANNER_TIMEOUT)
    }

    pub fn with_timeouts(error_timeout: Duration, weather_timeout: Duration) -> Self {
        Self {
            cards: Vec::new(),
            expanded: HashSet::new(),
            error: Banner::new(error_timeout),
            weather: Banner::new(weather_timeout),
            current_weather: None,
            submit: SubmitButton::default(),
        }
    }

    /// Replace every card. `trips` is in insertion order; the newest is shown first.
    pub fn render_all(&mut self, trips: &[Trip]) {
        self.cards = trips.iter().rev().cloned().collect();
        self.expanded.retain(|id| trips.iter().any(|t| t.id == *id));
    }

    /// Put a new card at the top of the list.
    pub fn add_trip(&mut self, trip: &Trip) {
        self.cards.insert(0, trip.clone());
    }

    /// Drop a single card. Returns whether a card was removed.
    pub fn remove_trip(&mut self, id: u64) -> bool {
        let before = self.cards.len();
        self.cards.retain(|card| card.id != id);
        self.expanded.remove(&id);
        self.cards.len() != before
    }

    /// Flip the detail panel of one card. `None` if no such card.
    pub fn toggle_details(&mut self, id: u64) -> Option<bool> {
        if !self.cards.iter().any(|card| card.id == id) {
            return None;
        }

        if self.expanded.remove(&id) {
            Some(false)
        } else {
            self.expanded.insert(id);
            Some(true)
        }
    }

    pub fn is_expanded(&self, id: u64) -> bool {
        self.expanded.contains(&id)
    }

    /// Card ids in display order.
    pub fn card_ids(&self) -> Vec<u64> {
        self.cards.iter().map(|card| card.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error.show(message);
    }

    pub fn clear_error(&mut self) {
        self.error.clear();
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.message()
    }

    pub fn show_weather(&mut self, forecast: &Forecast) {
        self.current_weather = Some(forecast.clone());
        self.weather.show(render_weather_banner(forecast));
    }

    pub fn weather_banner(&self) -> Option<String> {
        self.weather.message()
    }

    /// Forecast behind the most recent weather banner, if it is still showing.
    pub fn current_weather(&self) -> Option<&Forecast> {
        self.current_weather.as_ref().filter(|_| self.weather.is_visible())
    }

    pub fn submit_button(&self) -> SubmitButton {
        self.submit.clone()
    }

    /// Full screen: banners first, then the list.
    pub fn render(&self) -> String {
        let mut out = String::new();

        if let Some(message) = self.error.message() {
            let _ = writeln!(out, "! {message}\n");
        }
        if let Some(banner) = self.weather.message() {
            let _ = writeln!(out, "{banner}");
        }

        out.push_str(&self.render_list());
        out
    }

    pub fn render_list(&self) -> String {
        if self.cards.is_empty() {
            return render_empty();
        }

        let mut out = String::new();
        for card in &self.cards {
            out.push_str(&render_card(card, self.is_expanded(card.id)));
            out.push('\n');
        }
        out
    }
}

fn render_empty() -> String {
    "🧳 No trips planned yet\n   Add your first trip using the form above!\n".to_string()
}

fn render_card(trip: &Trip, expanded: bool) -> String {
    let weather = &trip.weather;
    let condition = weather.condition.as_str();

    let mut out = String::new();
    let _ = writeln!(out, "{}  [delete: {}]", trip.destination, trip.id);
    let _ = writeln!(
        out,
        "  📅 {} to {}",
        format_date(trip.start_date),
        format_date(trip.end_date)
    );
    let _ = writeln!(out, "  {} {}, {}°C", icon_for(condition), condition, weather.temperature);

    if expanded {
        for line in render_details(weather).lines() {
            let _ = writeln!(out, "    {line}");
        }
    }

    out
}

/// Detail panel: readings plus the 3-day outlook.
pub fn render_details(weather: &Forecast) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<16}{}°C", "Temperature", weather.temperature);
    let _ = writeln!(out, "{:<16}{}%", "Humidity", weather.humidity);
    let _ = writeln!(out, "{:<16}{} km/h", "Wind Speed", weather.wind_speed);
    let _ = writeln!(out, "{:<16}{}%", "Precipitation", weather.precipitation);
    let _ = writeln!(out, "3-Day Forecast:");

    for day in &weather.forecast {
        let _ = writeln!(out, "{:<16}{}° / {}° - {}", day.day, day.high, day.low, day.condition);
    }

    out
}

fn render_weather_banner(weather: &Forecast) -> String {
    let condition = weather.condition.as_str();
    format!(
        "{} {}, {}°C\n{}",
        icon_for(condition),
        condition,
        weather.temperature,
        render_details(weather)
    )
}
