use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sky condition of a synthesized forecast.
///
/// Serialized as the display string ("Partly Cloudy", ...) so stored
/// collections stay readable and compatible with the legacy layout. Parsing
/// ignores case, and names outside the six known ones are kept as `Other`
/// so a single odd record never makes the stored collection unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
    Other(String),
}

impl Condition {
    /// Fixed order used by the synthesizer: `seed % 6` indexes into it.
    pub const ALL: [Condition; 6] = [
        Condition::Sunny,
        Condition::PartlyCloudy,
        Condition::Cloudy,
        Condition::Rainy,
        Condition::Stormy,
        Condition::Snowy,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Condition::Sunny => "Sunny",
            Condition::PartlyCloudy => "Partly Cloudy",
            Condition::Cloudy => "Cloudy",
            Condition::Rainy => "Rainy",
            Condition::Stormy => "Stormy",
            Condition::Snowy => "Snowy",
            Condition::Other(name) => name,
        }
    }

    /// Index wraps, so any `usize` is accepted.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()].clone()
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Self::ALL
            .iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(value.trim()))
            .cloned()
            .unwrap_or(Condition::Other(value))
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        match value {
            Condition::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the 3-day outlook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayForecast {
    pub day: String,
    pub high: i32,
    pub low: i32,
    pub condition: Condition,
}

/// Synthesized weather summary embedded in every trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub condition: Condition,
    pub temperature: i32,
    pub humidity: u32,
    pub wind_speed: u32,
    pub precipitation: u32,
    pub forecast: Vec<DayForecast>,
}

/// Persisted trip record. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: u64,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weather: Forecast,
    pub created_at: String,
}

/// Raw form input, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripDraft {
    pub destination: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TripDraft {
    pub fn new(
        destination: impl Into<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self { destination: destination.into(), start_date, end_date }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_serializes_as_display_string() {
        let json = serde_json::to_string(&Condition::PartlyCloudy).unwrap();
        assert_eq!(json, "\"Partly Cloudy\"");

        let parsed: Condition = serde_json::from_str("\"Stormy\"").unwrap();
        assert_eq!(parsed, Condition::Stormy);
    }

    #[test]
    fn condition_parsing_ignores_case() {
        let parsed: Condition = serde_json::from_str("\"partly cloudy\"").unwrap();
        assert_eq!(parsed, Condition::PartlyCloudy);

        let parsed: Condition = serde_json::from_str("\"SNOWY\"").unwrap();
        assert_eq!(parsed, Condition::Snowy);
    }

    #[test]
    fn unknown_condition_is_kept_verbatim() {
        let parsed: Condition = serde_json::from_str("\"Foggy\"").unwrap();
        assert_eq!(parsed, Condition::Other("Foggy".into()));
        assert_eq!(parsed.to_string(), "Foggy");
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"Foggy\"");
    }

    #[test]
    fn condition_index_wraps() {
        assert_eq!(Condition::from_index(0), Condition::Sunny);
        assert_eq!(Condition::from_index(5), Condition::Snowy);
        assert_eq!(Condition::from_index(7), Condition::PartlyCloudy);
    }

    #[test]
    fn trip_uses_camel_case_fields() {
        let trip = Trip {
            id: 1,
            destination: "Oslo".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            weather: Forecast {
                condition: Condition::Cloudy,
                temperature: 20,
                humidity: 40,
                wind_speed: 5,
                precipitation: 3,
                forecast: vec![],
            },
            created_at: "2024-05-01T10:00:00.000Z".into(),
        };

        let value = serde_json::to_value(&trip).unwrap();
        assert_eq!(value["startDate"], "2024-06-01");
        assert_eq!(value["endDate"], "2024-06-02");
        assert_eq!(value["weather"]["windSpeed"], 5);
        assert_eq!(value["createdAt"], "2024-05-01T10:00:00.000Z");
    }
}
