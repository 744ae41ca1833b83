use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::pipeline::estimate;
use crate::pipeline::path::PathIndex;
use crate::types::feed::{GeoRecord, Profile, ProfileList};
use crate::types::geo::EstimatedPosition;
use crate::types::rider::RiderProgress;

#[derive(Debug, Clone, Serialize)]
pub struct RiderView {
    pub pid: String,
    pub name: String,
    pub country: String,
    pub percent_complete: Option<f64>,
    pub last_seen: Option<String>,
    pub last_checkpoint: Option<String>,
    pub position: Option<EstimatedPosition>,
}

/// Builds one view per profile, ordered by progress (furthest first), riders
/// without progress last, ties broken by name.
pub fn rider_views(
    profiles: &ProfileList,
    fetched_at: DateTime<Utc>,
    now: DateTime<Utc>,
    path: &PathIndex,
) -> Vec<RiderView> {
    let mut views: Vec<RiderView> = profiles
        .list
        .iter()
        .map(|profile| rider_view(profile, profiles.info.loc.get(&profile.pid), fetched_at, now, path))
        .collect();

    views.sort_by(compare_standings);
    views
}

fn rider_view(
    profile: &Profile,
    record: Option<&GeoRecord>,
    fetched_at: DateTime<Utc>,
    now: DateTime<Utc>,
    path: &PathIndex,
) -> RiderView {
    let progress = record.and_then(|record| {
        RiderProgress::from_record(record, fetched_at)
            .map_err(|err| {
                tracing::debug!("No estimate for {}: {}", profile.pid, err);
            })
            .ok()
    });

    // The percent complete drives list state even when the rest of the record is unusable.
    let percent_complete = progress
        .as_ref()
        .and_then(|progress| progress.percent_complete)
        .or_else(|| {
            record
                .and_then(|record| record.epc.as_ref())
                .and_then(|epc| epc.parse("epc").ok())
        });

    RiderView {
        pid: profile.pid.clone(),
        name: profile.display_name(),
        country: profile.country.clone(),
        percent_complete,
        last_seen: progress.as_ref().map(|progress| {
            let seconds = (now - progress.last_report_at).num_seconds();
            format_last_seen(seconds, now)
        }),
        last_checkpoint: record
            .and_then(|record| record.lpn.clone())
            .filter(|name| !name.is_empty()),
        position: progress
            .as_ref()
            .map(|progress| estimate::estimate(progress, now, path)),
    }
}

fn compare_standings(a: &RiderView, b: &RiderView) -> Ordering {
    let progress = |view: &RiderView| view.percent_complete.filter(|pc| *pc > 0.0);

    match (progress(a), progress(b)) {
        (Some(pa), Some(pb)) => pb.total_cmp(&pa).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    }
}

/// Human-readable age of a report that is `seconds` old at `now`.
pub fn format_last_seen(seconds: i64, now: DateTime<Utc>) -> String {
    let seconds = seconds.max(0);
    if seconds < 100 {
        return format!("{}s ago", seconds);
    }
    if seconds < 20 * 60 {
        let minutes = (seconds as f64 / 60.0).round() as i64;
        return format!("{} minutes ago", minutes);
    }

    let seen_at = now - Duration::seconds(seconds);
    if seconds < 24 * 60 * 60 {
        seen_at.format("%H:%M:%S UTC").to_string()
    } else {
        seen_at.format("%a %b %d %Y %H:%M:%S UTC").to_string()
    }
}
