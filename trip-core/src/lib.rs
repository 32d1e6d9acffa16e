//! Core library for the `trip` planner.
//!
//! This crate defines:
//! - Trip and forecast models
//! - Deterministic forecast synthesis from a numeric seed
//! - Local persistence of the trip collection
//! - Id providers that hand out forecast seeds
//! - The add-trip controller and the text view it drives
//!
//! It is used by `trip-cli`, but can also be reused by other front ends.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;
pub mod view;
pub mod weather;

pub use config::Config;
pub use controller::{Clock, SubmissionState, SystemClock, TripController};
pub use error::{SubmitError, ValidationError};
pub use model::{Condition, DayForecast, Forecast, Trip, TripDraft};
pub use provider::{IdProvider, ProviderId};
pub use store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, TripStore};
pub use view::TripView;
