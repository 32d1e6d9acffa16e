//! Deterministic forecast synthesis.
//!
//! There is no real weather source behind the planner: a numeric seed (the
//! id handed out by the id provider) is turned into a plausible forecast with
//! plain modular arithmetic. Same seed and reference month, same forecast.

use chrono::{Datelike, Local};

use crate::model::{Condition, DayForecast, Forecast};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Generate a forecast using the current local month for the third day label.
///
/// `destination` is accepted for symmetry with a real weather lookup; only the
/// seed affects the values.
pub fn generate(destination: &str, seed: u64) -> Forecast {
    generate_for_month(destination, seed, Local::now().month())
}

/// Generate a forecast against an explicit reference month (`1..=12`).
pub fn generate_for_month(_destination: &str, seed: u64, month: u32) -> Forecast {
    let index = (seed % Condition::ALL.len() as u64) as usize;
    let temp_base = 15 + (seed % 20) as i32;

    let precipitation = if index > 2 { seed % 90 } else { seed % 30 };

    Forecast {
        condition: Condition::from_index(index),
        temperature: temp_base + index as i32 * 2,
        humidity: 30 + (seed % 50) as u32,
        wind_speed: 1 + (seed % 20) as u32,
        precipitation: precipitation as u32,
        forecast: vec![
            DayForecast {
                day: "Today".to_string(),
                high: temp_base + 5,
                low: temp_base - 5,
                condition: Condition::from_index(index),
            },
            DayForecast {
                day: "Tomorrow".to_string(),
                high: temp_base + 3,
                low: temp_base - 3,
                condition: Condition::from_index(index + 1),
            },
            DayForecast {
                day: month_label_ahead(month, 2).to_string(),
                high: temp_base + 1,
                low: temp_base - 7,
                condition: Condition::from_index(index + 2),
            },
        ],
    }
}

/// Short name of the month `ahead` months after `month` (`1..=12`).
fn month_label_ahead(month: u32, ahead: u32) -> &'static str {
    let zero_based = month.clamp(1, 12) - 1;
    MONTHS[((zero_based + ahead) % 12) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_identical_forecast() {
        for seed in [0, 1, 42, 101, 9_999, u32::MAX as u64] {
            assert_eq!(
                generate_for_month("Lisbon", seed, 3),
                generate_for_month("Lisbon", seed, 3)
            );
        }
    }

    #[test]
    fn generate_uses_current_month() {
        let forecast = generate("Paris", 42);
        let expected = month_label_ahead(Local::now().month(), 2);

        assert_eq!(forecast.forecast[2].day, expected);
        assert_eq!(forecast.temperature, 17);
    }

    #[test]
    fn destination_does_not_change_output() {
        assert_eq!(generate_for_month("Paris", 77, 6), generate_for_month("Tokyo", 77, 6));
    }

    #[test]
    fn seed_42_matches_known_values() {
        let forecast = generate_for_month("Paris", 42, 6);

        assert_eq!(forecast.condition, Condition::Sunny);
        assert_eq!(forecast.temperature, 17);
        assert_eq!(forecast.humidity, 72);
        assert_eq!(forecast.wind_speed, 3);
        assert_eq!(forecast.precipitation, 12);
    }

    #[test]
    fn temperature_follows_condition_index() {
        for seed in 0..500u64 {
            let forecast = generate_for_month("x", seed, 1);
            let index = (seed % 6) as i32;
            assert_eq!(forecast.temperature, 15 + (seed % 20) as i32 + 2 * index);
            assert_eq!(forecast.condition, Condition::ALL[index as usize]);
        }
    }

    #[test]
    fn severe_conditions_use_wider_precipitation_range() {
        // 63 % 6 == 3
        let rainy = generate_for_month("London", 63, 1);
        assert_eq!(rainy.condition, Condition::Rainy);
        assert_eq!(rainy.precipitation, 63);

        let sunny = generate_for_month("London", 60, 1);
        assert_eq!(sunny.condition, Condition::Sunny);
        assert_eq!(sunny.precipitation, 0);
    }

    #[test]
    fn outlook_has_three_days_in_order() {
        let forecast = generate_for_month("Rome", 8, 5);
        let labels: Vec<_> = forecast.forecast.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(labels, ["Today", "Tomorrow", "Jul"]);

        for day in &forecast.forecast {
            assert!(day.high > day.low);
        }
        assert_eq!(forecast.forecast[0].condition, Condition::Cloudy);
        assert_eq!(forecast.forecast[1].condition, Condition::Rainy);
        assert_eq!(forecast.forecast[2].condition, Condition::Stormy);
    }

    #[test]
    fn third_day_label_wraps_around_year_end() {
        assert_eq!(generate_for_month("x", 1, 11).forecast[2].day, "Jan");
        assert_eq!(generate_for_month("x", 1, 12).forecast[2].day, "Feb");
    }
}
