//! Hourly forecast series, the daytime window and its prompt table

use crate::{BriefError, Result};
use chrono::{NaiveDateTime, TimeDelta, Timelike};

/// Hourly variables requested from the weather provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HourlyVariable {
    /// Air temperature at 2 meters in °C
    Temperature2m,
    /// Probability of precipitation in %
    PrecipitationProbability,
    /// Total precipitation in mm
    Precipitation,
}

impl HourlyVariable {
    /// Every variable the pipeline requests, in request order
    pub const ALL: [HourlyVariable; 3] = [
        HourlyVariable::Temperature2m,
        HourlyVariable::PrecipitationProbability,
        HourlyVariable::Precipitation,
    ];

    /// Name used by the provider in requests and responses
    #[must_use]
    pub fn api_name(self) -> &'static str {
        match self {
            HourlyVariable::Temperature2m => "temperature_2m",
            HourlyVariable::PrecipitationProbability => "precipitation_probability",
            HourlyVariable::Precipitation => "precipitation",
        }
    }
}

/// Regular time axis `[start, end)` stepped by `interval`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub interval: TimeDelta,
}

impl TimeAxis {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, interval: TimeDelta) -> Result<Self> {
        if interval <= TimeDelta::zero() {
            return Err(BriefError::provider(format!(
                "Forecast interval must be positive, got {}s",
                interval.num_seconds()
            )));
        }
        if end < start {
            return Err(BriefError::provider("Forecast ends before it starts"));
        }
        Ok(Self {
            start,
            end,
            interval,
        })
    }

    /// Number of timestamps on the axis
    #[must_use]
    pub fn len(&self) -> usize {
        let span = (self.end - self.start).num_seconds();
        let step = self.interval.num_seconds();
        usize::try_from((span + step - 1) / step).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timestamps from `start` (inclusive) to `end` (exclusive)
    #[must_use]
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        let mut timestamps = Vec::with_capacity(self.len());
        let mut current = self.start;
        while current < self.end {
            timestamps.push(current);
            current += self.interval;
        }
        timestamps
    }
}

/// One hourly forecast sample. `None` marks a value the provider left empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    /// Local wall-clock time of the sample
    pub timestamp: NaiveDateTime,
    /// Temperature in °C
    pub temperature: Option<f32>,
    /// Precipitation probability in %
    pub precipitation_probability: Option<f32>,
    /// Precipitation amount in mm
    pub precipitation: Option<f32>,
}

/// Contiguous, ascending series of forecast samples
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    interval: TimeDelta,
    samples: Vec<ForecastSample>,
}

impl ForecastSeries {
    /// Build a series, checking it is non-empty and spaced exactly by `interval`
    pub fn new(interval: TimeDelta, samples: Vec<ForecastSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(BriefError::empty_forecast(
                "Weather provider returned no hourly samples",
            ));
        }

        if let Some(gap) = samples
            .windows(2)
            .find(|pair| pair[1].timestamp - pair[0].timestamp != interval)
        {
            return Err(BriefError::provider(format!(
                "Forecast samples are not contiguous between {} and {}",
                gap[0].timestamp, gap[1].timestamp
            )));
        }

        Ok(Self { interval, samples })
    }

    #[must_use]
    pub fn interval(&self) -> TimeDelta {
        self.interval
    }

    #[must_use]
    pub fn samples(&self) -> &[ForecastSample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Daytime slice of a forecast series used as the model's context
#[derive(Debug, Clone, PartialEq)]
pub struct DaytimeWindow {
    samples: Vec<ForecastSample>,
}

impl DaytimeWindow {
    /// First clock time included, in seconds from midnight (08:00)
    pub const START_SECS: u32 = 8 * 3600;
    /// Last clock time included, in seconds from midnight (20:00)
    pub const END_SECS: u32 = 20 * 3600;
    /// Maximum number of samples kept
    pub const MAX_SAMPLES: usize = 13;

    const DATE_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    /// Keep samples between 08:00 and 20:00 inclusive, in order, capped at 13
    pub fn select(series: &ForecastSeries) -> Result<Self> {
        let samples: Vec<ForecastSample> = series
            .samples()
            .iter()
            .filter(|sample| Self::contains(sample.timestamp))
            .take(Self::MAX_SAMPLES)
            .cloned()
            .collect();

        if samples.is_empty() {
            return Err(BriefError::empty_forecast(format!(
                "None of the {} forecast samples fall between 08:00 and 20:00",
                series.len()
            )));
        }

        Ok(Self { samples })
    }

    /// Whether the clock time of `timestamp` lies within the window
    #[must_use]
    pub fn contains(timestamp: NaiveDateTime) -> bool {
        let secs = timestamp.time().num_seconds_from_midnight();
        (Self::START_SECS..=Self::END_SECS).contains(&secs)
    }

    #[must_use]
    pub fn samples(&self) -> &[ForecastSample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Render the window as a fixed-width text table, one row per sample
    #[must_use]
    pub fn to_table(&self) -> String {
        let header: Vec<String> = std::iter::once("date")
            .chain(HourlyVariable::ALL.iter().map(|v| v.api_name()))
            .map(str::to_string)
            .collect();

        let rows: Vec<Vec<String>> = self
            .samples
            .iter()
            .map(|sample| {
                vec![
                    sample.timestamp.format(Self::DATE_FORMAT).to_string(),
                    format_value(sample.temperature),
                    format_value(sample.precipitation_probability),
                    format_value(sample.precipitation),
                ]
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|col| {
                rows.iter()
                    .map(|row| row[col].len())
                    .chain(std::iter::once(header[col].len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        std::iter::once(&header)
            .chain(rows.iter())
            .map(|row| {
                row.iter()
                    .zip(&widths)
                    .enumerate()
                    .map(|(col, (cell, &width))| {
                        if col == 0 {
                            format!("{cell:<width$}")
                        } else {
                            format!("{cell:>width$}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for DaytimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_table())
    }
}

fn format_value(value: Option<f32>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.1}"),
        _ => "NaN".to_string(),
    }
}
