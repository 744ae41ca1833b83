use chrono::{DateTime, Duration, TimeZone, Utc};
use ridetrack_rs::error::ParseError;
use ridetrack_rs::pipeline::estimate::{effective_speed, estimate, estimate_distance};
use ridetrack_rs::pipeline::path::{PathIndex, RouteGeometry, WaypointIndex};
use ridetrack_rs::pipeline::standings::format_last_seen;
use ridetrack_rs::types::feed::GeoRecord;
use ridetrack_rs::types::geo::Coordinate;
use ridetrack_rs::types::rider::RiderProgress;

const EVENT_LENGTH: f64 = 757.45;

fn carhaix() -> Coordinate {
    // Slightly off the simplified route line.
    Coordinate::new(-3.5731, 48.2756)
}

fn path_index() -> PathIndex {
    let route = RouteGeometry::new(vec![
        Coordinate::new(2.03, 48.77),
        Coordinate::new(-1.0, 48.40),
        Coordinate::new(-4.49, 48.39),
    ])
    .expect("route")
    .scaled_to(EVENT_LENGTH);

    let mut waypoints = WaypointIndex::new();
    waypoints.insert("Carhaix", carhaix());
    PathIndex::new(route, waypoints)
}

fn reported_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 8, 21, 6, 0, 0).unwrap()
}

fn progress(speed: f64) -> RiderProgress {
    RiderProgress {
        last_report_distance: 100.0,
        last_report_at: reported_at(),
        instantaneous_speed: speed,
        next_checkpoint_distance: None,
        next_checkpoint_waypoint: None,
        segment_speed: None,
        percent_complete: Some(13.2),
    }
}

#[test]
fn extrapolates_at_reported_speed() {
    let path = path_index();
    let position = estimate(&progress(12.0), reported_at() + Duration::hours(1), &path);

    assert!((position.distance_miles - 112.0).abs() < 1e-9);
    assert!(!position.at_checkpoint);
    assert_eq!(position.coordinate, path.project_distance(position.distance_miles));
}

#[test]
fn snaps_to_next_checkpoint_when_capped() {
    let path = path_index();
    let mut rider = progress(12.0);
    rider.next_checkpoint_distance = Some(105.0);
    rider.next_checkpoint_waypoint = Some("Carhaix".to_string());

    let position = estimate(&rider, reported_at() + Duration::hours(1), &path);

    assert_eq!(position.distance_miles, 105.0);
    assert!(position.at_checkpoint);
    assert_eq!(position.coordinate, carhaix());
    assert_ne!(position.coordinate, path.project_distance(105.0));
}

#[test]
fn unknown_checkpoint_falls_back_to_projection() {
    let path = path_index();
    let mut rider = progress(12.0);
    rider.next_checkpoint_distance = Some(105.0);
    rider.next_checkpoint_waypoint = Some("Nowhere".to_string());

    let position = estimate(&rider, reported_at() + Duration::hours(1), &path);

    assert_eq!(position.distance_miles, 105.0);
    assert!(!position.at_checkpoint);
    assert_eq!(position.coordinate, path.project_distance(105.0));
}

#[test]
fn checkpoint_behind_last_report_does_not_snap() {
    let path = path_index();
    let mut rider = progress(12.0);
    rider.next_checkpoint_distance = Some(95.0);
    rider.next_checkpoint_waypoint = Some("Carhaix".to_string());

    let position = estimate(&rider, reported_at() + Duration::hours(1), &path);

    assert_eq!(position.distance_miles, 100.0);
    assert!(!position.at_checkpoint);
    assert_eq!(position.coordinate, path.project_distance(100.0));
}

#[test]
fn speed_never_exceeds_ceiling() {
    for speed in [20.5, 35.0, 120.0] {
        let rider = progress(speed);
        assert_eq!(effective_speed(&rider), 20.0);
        let distance = estimate_distance(&rider, reported_at() + Duration::hours(1));
        assert!((distance - 120.0).abs() < 1e-9);
    }
}

#[test]
fn segment_speed_only_lowers_pace() {
    let mut rider = progress(18.0);
    rider.segment_speed = Some(10.0);
    assert_eq!(effective_speed(&rider), 10.0);

    rider.segment_speed = Some(25.0);
    assert_eq!(effective_speed(&rider), 18.0);
}

#[test]
fn clock_skew_never_moves_rider_backwards() {
    let rider = progress(15.0);
    let distance = estimate_distance(&rider, reported_at() - Duration::minutes(10));
    assert_eq!(distance, 100.0);
}

#[test]
fn estimates_are_monotonic_in_time() {
    let rider = progress(14.5);
    let mut previous = f64::MIN;
    for minutes in (0..600).step_by(15) {
        let distance = estimate_distance(&rider, reported_at() + Duration::minutes(minutes));
        assert!(distance >= previous);
        previous = distance;
    }
}

#[test]
fn estimate_stays_on_route() {
    let path = path_index();
    let mut rider = progress(20.0);
    rider.last_report_distance = 750.0;

    let position = estimate(&rider, reported_at() + Duration::hours(5), &path);
    assert_eq!(position.distance_miles, EVENT_LENGTH);
    assert_eq!(position.coordinate, Coordinate::new(-4.49, 48.39));
}

#[test]
fn decodes_string_encoded_record() {
    let record: GeoRecord = serde_json::from_str(
        r#"{"epc":"13.2","emiles":"100.0","sslp":"90","mph":"14.5","sss":"7200",
            "lpn":"Villaines","last":{"npm":"130","lpm":"110","npn":"Fougeres"}}"#,
    )
    .expect("record");
    let fetched_at = reported_at() + Duration::seconds(90);

    let rider = RiderProgress::from_record(&record, fetched_at).expect("progress");

    assert_eq!(rider.last_report_distance, 100.0);
    assert_eq!(rider.last_report_at, reported_at());
    assert_eq!(rider.instantaneous_speed, 14.5);
    assert_eq!(rider.next_checkpoint_distance, Some(130.0));
    assert_eq!(rider.next_checkpoint_waypoint.as_deref(), Some("Fougeres"));
    assert_eq!(rider.segment_speed, Some(10.0));
    assert_eq!(rider.percent_complete, Some(13.2));
}

#[test]
fn accepts_plain_numbers() {
    let record: GeoRecord =
        serde_json::from_str(r#"{"emiles":42.5,"sslp":0,"mph":11}"#).expect("record");
    let rider = RiderProgress::from_record(&record, reported_at()).expect("progress");

    assert_eq!(rider.last_report_distance, 42.5);
    assert_eq!(rider.instantaneous_speed, 11.0);
    assert_eq!(rider.segment_speed, None);
}

#[test]
fn malformed_number_excludes_rider() {
    let record: GeoRecord =
        serde_json::from_str(r#"{"emiles":"100","sslp":"60","mph":"fast"}"#).expect("record");

    match RiderProgress::from_record(&record, reported_at()) {
        Err(ParseError::InvalidNumber { field, value }) => {
            assert_eq!(field, "mph");
            assert_eq!(value, "fast");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn out_of_range_report_age_excludes_rider() {
    for sslp in ["1e13", "9e18", "1e300"] {
        let record: GeoRecord = serde_json::from_str(&format!(
            r#"{{"emiles":"100","sslp":"{}","mph":"12"}}"#,
            sslp
        ))
        .expect("record");

        assert!(matches!(
            RiderProgress::from_record(&record, reported_at()),
            Err(ParseError::InvalidNumber { field: "sslp", .. })
        ));
    }
}

#[test]
fn missing_distance_excludes_rider() {
    let record: GeoRecord = serde_json::from_str(r#"{"sslp":"60","mph":"12"}"#).expect("record");

    assert!(matches!(
        RiderProgress::from_record(&record, reported_at()),
        Err(ParseError::MissingField("emiles"))
    ));
}

#[test]
fn last_seen_reads_naturally() {
    let now = Utc.with_ymd_and_hms(2023, 8, 22, 14, 30, 0).unwrap();

    assert_eq!(format_last_seen(-3, now), "0s ago");
    assert_eq!(format_last_seen(45, now), "45s ago");
    assert_eq!(format_last_seen(150, now), "3 minutes ago");
    assert_eq!(format_last_seen(2 * 3600, now), "12:30:00 UTC");
    assert_eq!(
        format_last_seen(2 * 24 * 3600, now),
        "Sun Aug 20 2023 14:30:00 UTC"
    );
}
