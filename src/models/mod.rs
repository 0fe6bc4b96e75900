//! Data models for `WeatherBrief`
//!
//! - Location: the forecast point
//! - Forecast: hourly series, daytime window and its table rendering

pub mod forecast;
pub mod location;

pub use forecast::{DaytimeWindow, ForecastSample, ForecastSeries, HourlyVariable, TimeAxis};
pub use location::Location;
