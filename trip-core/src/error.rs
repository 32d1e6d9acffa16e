use thiserror::Error;

/// Form validation failures, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a destination")]
    EmptyDestination,
    #[error("Please select both start and end dates")]
    MissingDate,
    #[error("End date must be after start date")]
    InvertedRange,
}

/// Why a trip submission did not produce a trip. None of these are fatal.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to fetch weather data. Please try again.")]
    Fetch(#[source] anyhow::Error),
    #[error("Failed to save trip. Please try again.")]
    Persist(#[source] anyhow::Error),
}
