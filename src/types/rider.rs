use chrono::{DateTime, Utc};
use serde::Serialize;

/// Last known progress of a rider along the route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiderProgress {
    pub last_report_distance: f64,
    pub last_report_at: DateTime<Utc>,
    /// Miles per hour as reported by the provider.
    pub instantaneous_speed: f64,
    pub next_checkpoint_distance: Option<f64>,
    pub next_checkpoint_waypoint: Option<String>,
    /// Highest average pace consistent with not yet having reached the next checkpoint.
    pub segment_speed: Option<f64>,
    pub percent_complete: Option<f64>,
}
