//! Dead-reckoning of a rider's current position between reports.

use chrono::{DateTime, Utc};

use crate::pipeline::path::PathIndex;
use crate::types::geo::EstimatedPosition;
use crate::types::rider::RiderProgress;

/// Hard ceiling on the pace used for extrapolation, in miles per hour.
pub const MAX_AVERAGE_SPEED_MPH: f64 = 20.0;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Speed used for extrapolation: the reported speed, capped by the segment
/// pace when known and by [`MAX_AVERAGE_SPEED_MPH`].
pub fn effective_speed(progress: &RiderProgress) -> f64 {
    progress
        .instantaneous_speed
        .min(progress.segment_speed.unwrap_or(f64::INFINITY))
        .min(MAX_AVERAGE_SPEED_MPH)
        .max(0.0)
}

/// Distance along the route the rider is estimated to have reached at `now`.
///
/// Never behind the last report (clock skew) and never past the next
/// checkpoint the rider has not yet reported reaching.
pub fn estimate_distance(progress: &RiderProgress, now: DateTime<Utc>) -> f64 {
    project_progress(progress, now).0
}

/// Projected distance, and whether it was stopped at the next checkpoint.
fn project_progress(progress: &RiderProgress, now: DateTime<Utc>) -> (f64, bool) {
    let elapsed_hours =
        (now - progress.last_report_at).num_milliseconds() as f64 / MILLIS_PER_HOUR;
    let travelled = progress.last_report_distance + effective_speed(progress) * elapsed_hours;

    let (capped, at_checkpoint) = match progress.next_checkpoint_distance {
        Some(next) if travelled >= next => (next, true),
        _ => (travelled, false),
    };

    if capped < progress.last_report_distance {
        (progress.last_report_distance, false)
    } else {
        (capped, at_checkpoint)
    }
}

pub fn estimate(progress: &RiderProgress, now: DateTime<Utc>, path: &PathIndex) -> EstimatedPosition {
    let (projected, at_checkpoint) = project_progress(progress, now);
    let distance = projected.clamp(0.0, path.route_length());

    let snapped = match progress.next_checkpoint_waypoint.as_deref() {
        Some(waypoint) if at_checkpoint => path.waypoint_coordinate(waypoint),
        _ => None,
    };

    match snapped {
        Some(coordinate) => EstimatedPosition {
            distance_miles: distance,
            coordinate,
            at_checkpoint: true,
        },
        None => EstimatedPosition {
            distance_miles: distance,
            coordinate: path.project_distance(distance),
            at_checkpoint: false,
        },
    }
}
