//! External data sources: the forecast model service and the FX rate feed.

pub mod forecast;
pub mod fx;

pub use forecast::ForecastClient;
pub use fx::FxClient;
