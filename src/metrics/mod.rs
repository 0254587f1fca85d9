//! Derived market metrics: numeric indicators and categorical alerts.

pub mod alerts;
pub mod indicators;

pub use alerts::classify_alerts;
pub use indicators::compute_indicators;
