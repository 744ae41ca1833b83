use chrono::{DateTime, Duration, Utc};

use crate::error::ParseError;
use crate::types::feed::{parse_optional, parse_required, GeoRecord};
use crate::types::rider::RiderProgress;

/// Report ages beyond this many seconds (about 100 years) are rejected.
const MAX_REPORT_AGE_SECONDS: f64 = 3.2e9;

impl RiderProgress {
    /// Decodes a location record fetched at `fetched_at`.
    ///
    /// Fails when no distance or report age is known, or when any present
    /// numeric field does not parse; such riders get no estimate.
    pub fn from_record(record: &GeoRecord, fetched_at: DateTime<Utc>) -> Result<Self, ParseError> {
        let last_report_distance = parse_required(record.emiles.as_ref(), "emiles")?.max(0.0);
        let since_last_ping = parse_required(record.sslp.as_ref(), "sslp")?.max(0.0);
        let instantaneous_speed = parse_optional(record.mph.as_ref(), "mph")?
            .unwrap_or(0.0)
            .max(0.0);
        let percent_complete = parse_optional(record.epc.as_ref(), "epc")?;
        let since_segment_start = parse_optional(record.sss.as_ref(), "sss")?;

        let (next_checkpoint_distance, last_checkpoint_distance, next_checkpoint_waypoint) =
            match &record.last {
                Some(last) => (
                    parse_optional(last.npm.as_ref(), "last.npm")?,
                    parse_optional(last.lpm.as_ref(), "last.lpm")?,
                    last.npn.clone().filter(|name| !name.is_empty()),
                ),
                None => (None, None, None),
            };

        let segment_speed = match (
            next_checkpoint_distance,
            last_checkpoint_distance,
            since_segment_start,
        ) {
            (Some(next), Some(last), Some(seconds)) if seconds > 0.0 && next > last => {
                Some((next - last) / (seconds / 3600.0))
            }
            _ => None,
        };

        let last_report_at = Some(since_last_ping)
            .filter(|seconds| *seconds < MAX_REPORT_AGE_SECONDS)
            .and_then(|seconds| Duration::try_milliseconds((seconds * 1000.0).round() as i64))
            .and_then(|age| fetched_at.checked_sub_signed(age))
            .ok_or_else(|| ParseError::InvalidNumber {
                field: "sslp",
                value: since_last_ping.to_string(),
            })?;

        Ok(Self {
            last_report_distance,
            last_report_at,
            instantaneous_speed,
            next_checkpoint_distance,
            next_checkpoint_waypoint,
            segment_speed,
            percent_complete,
        })
    }
}
