//! `OpenMeteo` API response structures and conversion to a forecast series

use crate::models::{ForecastSample, ForecastSeries, HourlyVariable, TimeAxis};
use crate::{BriefError, Result};
use chrono::{DateTime, TimeDelta};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Spacing assumed when the payload holds a single sample
const DEFAULT_INTERVAL_SECS: i64 = 3600;

/// Forecast response for one location
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    /// Offset applied to `time` to obtain local wall-clock time
    #[serde(default)]
    pub utc_offset_seconds: i64,
    #[serde(default)]
    pub timezone: Option<String>,
    pub hourly: Option<HourlyData>,
}

/// Hourly block with unix timestamps and one column per requested variable
#[derive(Debug, Clone, Deserialize)]
pub struct HourlyData {
    pub time: Vec<i64>,
    #[serde(flatten)]
    pub columns: HashMap<String, Vec<Option<f32>>>,
}

/// Parse a provider body that must describe exactly one location.
///
/// The provider answers batched requests with a JSON array; a single
/// location comes back as a bare object.
pub fn parse_single(body: &str) -> Result<ForecastResponse> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BriefError::provider(format!("Weather response is not valid JSON: {e}")))?;

    let mut responses: Vec<ForecastResponse> = match value {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<_, _>>(),
        other => serde_json::from_value(other).map(|response| vec![response]),
    }
    .map_err(|e| BriefError::provider(format!("Failed to parse OpenMeteo forecast response: {e}")))?;

    match responses.len() {
        1 => Ok(responses.remove(0)),
        n => Err(BriefError::provider(format!(
            "Expected a forecast for exactly one location, got {n}"
        ))),
    }
}

impl HourlyData {
    /// Derive the regular time axis, in local time, described by `time`
    pub fn time_axis(&self, utc_offset_seconds: i64) -> Result<TimeAxis> {
        let Some(&first) = self.time.first() else {
            return Err(BriefError::empty_forecast(
                "Weather provider returned no hourly samples",
            ));
        };

        let interval_secs = match self.time.get(1) {
            Some(&second) => second.checked_sub(first).ok_or_else(|| {
                BriefError::provider(format!(
                    "Invalid forecast interval between {first} and {second}"
                ))
            })?,
            None => DEFAULT_INTERVAL_SECS,
        };

        if let Some(pair) = self
            .time
            .windows(2)
            .find(|pair| pair[1].checked_sub(pair[0]) != Some(interval_secs))
        {
            return Err(BriefError::provider(format!(
                "Irregular hourly time axis between {} and {}",
                pair[0], pair[1]
            )));
        }

        let out_of_range =
            || BriefError::provider(format!("Forecast time axis out of range from {first}"));

        let start = first
            .checked_add(utc_offset_seconds)
            .and_then(|local| DateTime::from_timestamp(local, 0))
            .ok_or_else(out_of_range)?
            .naive_utc();
        let count = i64::try_from(self.time.len())
            .map_err(|_| BriefError::provider("Forecast has too many samples"))?;
        let interval = TimeDelta::try_seconds(interval_secs).ok_or_else(out_of_range)?;
        let end = interval_secs
            .checked_mul(count)
            .and_then(TimeDelta::try_seconds)
            .and_then(|span| start.checked_add_signed(span))
            .ok_or_else(out_of_range)?;

        TimeAxis::new(start, end, interval)
    }

    /// Take the column for `variable`, which must have one value per timestamp
    fn take_column(&mut self, variable: HourlyVariable) -> Result<Vec<Option<f32>>> {
        let name = variable.api_name();
        let column = self.columns.remove(name).ok_or_else(|| {
            BriefError::provider(format!("Hourly variable '{name}' missing from response"))
        })?;

        if column.len() != self.time.len() {
            return Err(BriefError::provider(format!(
                "Hourly variable '{name}' has {} values for {} timestamps",
                column.len(),
                self.time.len()
            )));
        }
        Ok(column)
    }
}

impl ForecastResponse {
    /// Convert the hourly block into a forecast series in local time
    pub fn into_series(self) -> Result<ForecastSeries> {
        let mut hourly = self
            .hourly
            .ok_or_else(|| BriefError::provider("Response contains no hourly block"))?;

        let axis = hourly.time_axis(self.utc_offset_seconds)?;
        let temperature = hourly.take_column(HourlyVariable::Temperature2m)?;
        let precipitation_probability =
            hourly.take_column(HourlyVariable::PrecipitationProbability)?;
        let precipitation = hourly.take_column(HourlyVariable::Precipitation)?;

        let samples = axis
            .timestamps()
            .into_iter()
            .zip(temperature)
            .zip(precipitation_probability)
            .zip(precipitation)
            .map(
                |(((timestamp, temperature), precipitation_probability), precipitation)| {
                    ForecastSample {
                        timestamp,
                        temperature,
                        precipitation_probability,
                        precipitation,
                    }
                },
            )
            .collect();

        ForecastSeries::new(axis.interval, samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use serde_json::json;

    // 2024-05-01T00:00:00Z
    const MAY_FIRST: i64 = 1_714_521_600;

    fn body(hours: i64, offset: i64) -> String {
        let time: Vec<i64> = (0..hours).map(|h| MAY_FIRST + h * 3600).collect();
        let temps: Vec<f32> = (0..hours).map(|h| h as f32).collect();
        let probabilities: Vec<Option<f32>> = [Some(40.0), None]
            .into_iter()
            .cycle()
            .take(hours as usize)
            .collect();
        json!({
            "latitude": 45.0,
            "longitude": 7.0,
            "utc_offset_seconds": offset,
            "timezone": "GMT",
            "hourly_units": {"time": "unixtime", "temperature_2m": "°C"},
            "hourly": {
                "time": time,
                "precipitation": vec![0.1; hours as usize],
                "temperature_2m": temps,
                "precipitation_probability": probabilities,
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_single_object() {
        let response = parse_single(&body(3, 0)).unwrap();
        assert_eq!(response.latitude, 45.0);
        assert_eq!(response.hourly.unwrap().time.len(), 3);
    }

    #[test]
    fn test_parse_single_element_array() {
        let wrapped = format!("[{}]", body(3, 0));
        assert!(parse_single(&wrapped).is_ok());
    }

    #[test]
    fn test_parse_rejects_multiple_locations() {
        let wrapped = format!("[{},{}]", body(3, 0), body(3, 0));
        let err = parse_single(&wrapped).unwrap_err();
        assert!(matches!(err, BriefError::Provider { .. }));
        assert!(err.to_string().contains("got 2"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_single("<html>").unwrap_err(),
            BriefError::Provider { .. }
        ));
        assert!(matches!(
            parse_single("{\"latitude\": \"north\"}").unwrap_err(),
            BriefError::Provider { .. }
        ));
    }

    #[test]
    fn test_columns_bound_by_name_not_position() {
        // precipitation is listed before temperature_2m in the payload
        let series = parse_single(&body(24, 0)).unwrap().into_series().unwrap();

        assert_eq!(series.len(), 24);
        let sample = &series.samples()[5];
        assert_eq!(sample.temperature, Some(5.0));
        assert_eq!(sample.precipitation, Some(0.1));
        assert_eq!(sample.precipitation_probability, None);
        assert_eq!(series.samples()[4].precipitation_probability, Some(40.0));
    }

    #[test]
    fn test_timestamps_are_local_time() {
        let series = parse_single(&body(2, 7200)).unwrap().into_series().unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap();
        assert_eq!(series.samples()[0].timestamp, expected);
        assert_eq!(series.interval(), TimeDelta::hours(1));
    }

    #[test]
    fn test_empty_time_axis_is_empty_forecast() {
        let err = parse_single(&body(0, 0)).unwrap().into_series().unwrap_err();
        assert!(matches!(err, BriefError::EmptyForecast { .. }));
    }

    #[test]
    fn test_single_sample_uses_hourly_interval() {
        let series = parse_single(&body(1, 0)).unwrap().into_series().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.interval(), TimeDelta::hours(1));
    }

    #[test]
    fn test_missing_variable_is_provider_error() {
        let payload = json!({
            "latitude": 45.0,
            "longitude": 7.0,
            "hourly": {"time": [MAY_FIRST], "temperature_2m": [12.0]}
        })
        .to_string();
        let err = parse_single(&payload).unwrap().into_series().unwrap_err();
        assert!(err.to_string().contains("precipitation_probability"));
    }

    #[test]
    fn test_length_mismatch_is_provider_error() {
        let payload = json!({
            "latitude": 45.0,
            "longitude": 7.0,
            "hourly": {
                "time": [MAY_FIRST, MAY_FIRST + 3600],
                "temperature_2m": [12.0],
                "precipitation_probability": [0.0, 0.0],
                "precipitation": [0.0, 0.0]
            }
        })
        .to_string();
        let err = parse_single(&payload).unwrap().into_series().unwrap_err();
        assert!(matches!(err, BriefError::Provider { .. }));
    }

    #[test]
    fn test_irregular_axis_is_provider_error() {
        let payload = json!({
            "latitude": 45.0,
            "longitude": 7.0,
            "hourly": {
                "time": [MAY_FIRST, MAY_FIRST + 3600, MAY_FIRST + 10800],
                "temperature_2m": [1.0, 2.0, 3.0],
                "precipitation_probability": [0.0, 0.0, 0.0],
                "precipitation": [0.0, 0.0, 0.0]
            }
        })
        .to_string();
        let err = parse_single(&payload).unwrap().into_series().unwrap_err();
        assert!(err.to_string().contains("Irregular"));
    }

    #[rstest]
    #[case(vec![0, 9_000_000_000_000], 0)]
    #[case(vec![i64::MAX - 10], 3600)]
    #[case(vec![i64::MIN, i64::MAX], 0)]
    #[case(vec![MAY_FIRST, MAY_FIRST + 3600], i64::MAX)]
    fn test_out_of_range_axis_is_provider_error(#[case] time: Vec<i64>, #[case] offset: i64) {
        let values = vec![0.0; time.len()];
        let payload = json!({
            "latitude": 45.0,
            "longitude": 7.0,
            "utc_offset_seconds": offset,
            "hourly": {
                "time": time,
                "temperature_2m": values,
                "precipitation_probability": values,
                "precipitation": values
            }
        })
        .to_string();
        let err = parse_single(&payload).unwrap().into_series().unwrap_err();
        assert!(matches!(err, BriefError::Provider { .. }));
    }

    #[test]
    fn test_missing_hourly_block_is_provider_error() {
        let payload = json!({"latitude": 45.0, "longitude": 7.0}).to_string();
        let err = parse_single(&payload).unwrap().into_series().unwrap_err();
        assert!(matches!(err, BriefError::Provider { .. }));
    }
}
