// tools/weather_probe/main.rs
//
// Ad hoc smoke test for a WeatherAPI.com key. Not part of the service:
// run it once after provisioning a key to confirm the account works.

use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::Parser;
use serde_json::Value;

const FORECAST_URL: &str = "https://api.weatherapi.com/v1/forecast.json";
const TEST_LOCATION: &str = "London";
const KEY_ENV_VARS: &[&str] = &["WEATHER_API_KEY", "weather_api_key", "WEATHERAPI_KEY"];

#[derive(Parser)]
#[command(about = "Smoke-tests a WeatherAPI.com key against the forecast endpoint")]
struct Args {
    /// API key to test; falls back to the WEATHER_API_KEY family of
    /// environment variables.
    #[arg(long)]
    key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    println!("==== WEATHER API KEY TEST ====\n");

    let Some(api_key) = resolve_key(args.key) else {
        println!("Weather API key not found in environment variables.");
        println!();
        println!("How to get a free key:");
        println!("  1. Sign up at https://www.weatherapi.com/signup.aspx");
        println!("  2. Copy the key from your dashboard");
        println!("  3. Export it as WEATHER_API_KEY, or pass --key");
        bail!("no API key provided");
    };

    println!("Key found: {} ({} characters)\n", mask_key(&api_key), api_key.len());

    // Tomorrow's forecast, same as the booking flow requests.
    let test_date = (Utc::now() + chrono::Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();

    println!("Testing API connection...");
    println!("  Location: {TEST_LOCATION}");
    println!("  Date:     {test_date}\n");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let response = client
        .get(FORECAST_URL)
        .query(&[
            ("key", api_key.as_str()),
            ("q", TEST_LOCATION),
            ("dt", test_date.as_str()),
        ])
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(err) if err.is_timeout() => {
            println!("TIMEOUT: the request took too long. Check your internet connection.");
            return Ok(());
        }
        Err(err) if err.is_connect() => {
            println!("CONNECTION ERROR: could not reach WeatherAPI.com.");
            return Ok(());
        }
        Err(err) => {
            println!("UNEXPECTED ERROR: {err}");
            return Ok(());
        }
    };

    let status = response.status();
    println!("Response status: {status}\n");

    match status.as_u16() {
        200 => {
            let data: Value = response.json().await?;
            print_preview(&data);
            println!("\nSUCCESS: your Weather API key is working.");
        }
        401 => {
            println!("AUTHENTICATION ERROR: the API key is invalid or inactive.");
            println!("Check the key, or create a new one at https://www.weatherapi.com/signup.aspx");
        }
        403 => {
            println!("ACCESS DENIED: the key has no permission for this endpoint.");
            println!("Check your WeatherAPI.com plan limits.");
        }
        400 => {
            let data: Value = response.json().await.unwrap_or_default();
            let message = data
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            println!("BAD REQUEST: {message}");
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            println!("UNEXPECTED ERROR: {preview}");
        }
    }

    Ok(())
}

fn resolve_key(arg: Option<String>) -> Option<String> {
    arg.filter(|key| !key.trim().is_empty()).or_else(|| {
        KEY_ENV_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok())
            .filter(|key| !key.trim().is_empty())
    })
}

fn mask_key(key: &str) -> String {
    if key.len() > 12 {
        format!("{}...{}", &key[..8], &key[key.len() - 4..])
    } else {
        "***".to_string()
    }
}

fn print_preview(data: &Value) {
    if let Some(location) = data.get("location") {
        let field = |key: &str| location.get(key).and_then(Value::as_str).unwrap_or("N/A");
        println!("Location:");
        println!("  Name:     {}", field("name"));
        println!("  Region:   {}", field("region"));
        println!("  Country:  {}", field("country"));
        println!("  Timezone: {}", field("tz_id"));
    }

    let Some(day_entry) = data.pointer("/forecast/forecastday/0") else {
        return;
    };
    let day = day_entry.get("day").cloned().unwrap_or_default();

    println!(
        "\nForecast for {}:",
        day_entry.get("date").and_then(Value::as_str).unwrap_or("N/A")
    );
    let condition_text = day
        .pointer("/condition/text")
        .and_then(Value::as_str)
        .unwrap_or("");
    println!("  Condition:      {}", condition_text);
    println!(
        "  Max Temp:       {}°C",
        day.get("maxtemp_c").and_then(Value::as_f64).unwrap_or(0.0)
    );
    println!(
        "  Min Temp:       {}°C",
        day.get("mintemp_c").and_then(Value::as_f64).unwrap_or(0.0)
    );
    println!(
        "  Chance of Rain: {}%",
        day.get("daily_chance_of_rain")
            .and_then(Value::as_i64)
            .unwrap_or(0)
    );

    let (condition, suggestion) = classify_condition(condition_text);
    println!("\n  Condition Type: {condition}");
    println!("  Suggestion:     {suggestion}");
}

/// Same seating-suggestion mapping the booking backend applies.
fn classify_condition(condition_text: &str) -> (&'static str, &'static str) {
    let text = condition_text.to_lowercase();

    if text.contains("sun") || text.contains("clear") {
        (
            "sunny",
            "The weather looks great! Outdoor seating would be a lovely choice.",
        )
    } else if text.contains("rain") || text.contains("drizzle") || text.contains("storm") {
        (
            "rainy",
            "It might rain. I recommend our cozy indoor seating for a comfortable experience.",
        )
    } else if text.contains("cloud") {
        (
            "cloudy",
            "It looks a bit cloudy. Both indoor and outdoor seating are possible depending on your preference.",
        )
    } else {
        (
            "mixed",
            "The forecast is a bit uncertain. Indoor seating is the safer option, but we can do outdoor if you prefer.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_long_keys_and_hides_short_ones() {
        assert_eq!(mask_key("abcdefgh12345678wxyz"), "abcdefgh...wxyz");
        assert_eq!(mask_key("short"), "***");
    }

    #[test]
    fn classifies_conditions() {
        assert_eq!(classify_condition("Sunny").0, "sunny");
        assert_eq!(classify_condition("Patchy rain possible").0, "rainy");
        assert_eq!(classify_condition("Partly Cloudy").0, "cloudy");
        assert_eq!(classify_condition("Fog").0, "mixed");
        // "clear" wins over "cloud" when both appear, matching the
        // first-match order of the backend.
        assert_eq!(classify_condition("Clear with clouds").0, "sunny");
    }

    #[test]
    fn explicit_cli_key_wins() {
        assert_eq!(resolve_key(Some("abc123".to_string())), Some("abc123".to_string()));
    }
}
