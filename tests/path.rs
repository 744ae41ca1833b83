use std::path::PathBuf;

use ridetrack_rs::error::LoadError;
use ridetrack_rs::pipeline::path::{PathIndex, RouteGeometry, WaypointIndex};
use ridetrack_rs::types::feed::CheckpointList;
use ridetrack_rs::types::geo::Coordinate;

const EVENT_LENGTH: f64 = 757.45;

fn route() -> RouteGeometry {
    RouteGeometry::new(vec![
        Coordinate::new(2.03, 48.77),
        Coordinate::new(0.56, 48.52),
        Coordinate::new(-2.76, 48.17),
        Coordinate::new(-4.49, 48.39),
    ])
    .expect("route")
    .scaled_to(EVENT_LENGTH)
}

fn assert_close(a: Coordinate, b: Coordinate) {
    assert!(
        (a.lon - b.lon).abs() < 1e-9 && (a.lat - b.lat).abs() < 1e-9,
        "{:?} != {:?}",
        a,
        b
    );
}

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("ridetrack-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents).expect("write temp file");
    path
}

#[test]
fn projection_hits_and_clamps_to_endpoints() {
    let route = route();
    let first = route.points()[0];
    let last = *route.points().last().expect("last point");

    assert!((route.length() - EVENT_LENGTH).abs() < 1e-9);
    assert_eq!(route.project(0.0), first);
    assert_eq!(route.project(EVENT_LENGTH), last);
    assert_eq!(route.project(-5.0), first);
    assert_eq!(route.project(800.0), last);
}

#[test]
fn projection_interpolates_within_segment() {
    // Three equal steps along the equator.
    let route = RouteGeometry::new(vec![
        Coordinate::new(0.0, 0.0),
        Coordinate::new(1.0, 0.0),
        Coordinate::new(2.0, 0.0),
        Coordinate::new(3.0, 0.0),
    ])
    .expect("route")
    .scaled_to(300.0);

    assert_close(route.project(50.0), Coordinate::new(0.5, 0.0));
    assert_close(route.project(100.0), Coordinate::new(1.0, 0.0));
    assert_close(route.project(250.0), Coordinate::new(2.5, 0.0));
}

#[test]
fn route_needs_two_points() {
    assert!(RouteGeometry::new(vec![Coordinate::new(0.0, 0.0)]).is_err());
}

#[test]
fn waypoints_register_names_labels_and_aliases() {
    let checkpoints: CheckpointList = serde_json::from_str(
        r#"{"list":[
            {"name":"Loudeac","label":"LOU","alias":["Loudéac"],"coords":{"lat":"48.1778","lng":"-2.7539"}},
            {"name":"Secret","coords":null},
            {"name":"Brest","coords":{"lat":48.3904,"lng":-4.4861}}
        ]}"#,
    )
    .expect("checkpoints");

    let waypoints = WaypointIndex::from_checkpoints(&checkpoints).expect("waypoints");
    let loudeac = Coordinate::new(-2.7539, 48.1778);
    assert_eq!(waypoints.get("Loudeac"), Some(loudeac));
    assert_eq!(waypoints.get("LOU"), Some(loudeac));
    assert_eq!(waypoints.get("Loudéac"), Some(loudeac));
    assert_eq!(waypoints.get("Brest"), Some(Coordinate::new(-4.4861, 48.3904)));
    assert_eq!(waypoints.get("Secret"), None);
    assert_eq!(waypoints.get("Carhaix"), None);
}

#[test]
fn malformed_waypoint_coordinates_are_rejected() {
    let checkpoints: CheckpointList = serde_json::from_str(
        r#"{"list":[{"name":"Fougeres","coords":{"lat":"n/a","lng":"-1.2"}}]}"#,
    )
    .expect("checkpoints");

    assert!(WaypointIndex::from_checkpoints(&checkpoints).is_err());
}

#[test]
fn loads_geojson_route_and_waypoints() {
    let route_file = temp_file(
        "route.geojson",
        r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"LineString","coordinates":[[2.03,48.77],[0.56,48.52]]}},
            {"type":"Feature","properties":{},"geometry":{"type":"MultiLineString","coordinates":[[[0.56,48.52],[-2.76,48.17]],[[-2.76,48.17],[-4.49,48.39]]]}},
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[0.0,0.0]}}
        ]}"#,
    );
    let waypoints_file = temp_file(
        "checkpoints.json",
        r#"{"list":[{"name":"Brest","coords":{"lat":"48.39","lng":"-4.49"}}]}"#,
    );

    let index = PathIndex::load(&route_file, &waypoints_file, EVENT_LENGTH).expect("index");

    assert!((index.route_length() - EVENT_LENGTH).abs() < 1e-9);
    assert_eq!(index.project_distance(0.0), Coordinate::new(2.03, 48.77));
    assert_eq!(index.project_distance(EVENT_LENGTH), Coordinate::new(-4.49, 48.39));
    assert_eq!(index.waypoint_coordinate("Brest"), Some(Coordinate::new(-4.49, 48.39)));
    assert_eq!(index.waypoint_coordinate("Tinteniac"), None);

    let _ = std::fs::remove_file(route_file);
    let _ = std::fs::remove_file(waypoints_file);
}

#[test]
fn loads_gpx_track() {
    let route_file = temp_file(
        "route.gpx",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk><name>PBP</name><trkseg>
    <trkpt lat="48.77" lon="2.03"><ele>160.0</ele></trkpt>
    <trkpt lat="48.52" lon="0.56"><ele>210.0</ele></trkpt>
    <trkpt lat="48.39" lon="-4.49"><ele>40.0</ele></trkpt>
  </trkseg></trk>
</gpx>"#,
    );
    let waypoints_file = temp_file("gpx-checkpoints.json", r#"{"list":[]}"#);

    let index = PathIndex::load(&route_file, &waypoints_file, EVENT_LENGTH).expect("index");
    assert_eq!(index.project_distance(-1.0), Coordinate::new(2.03, 48.77));
    assert_eq!(index.project_distance(1000.0), Coordinate::new(-4.49, 48.39));

    let _ = std::fs::remove_file(route_file);
    let _ = std::fs::remove_file(waypoints_file);
}

#[test]
fn unsupported_route_extension_is_rejected() {
    let result = PathIndex::load(
        &PathBuf::from("route.kml"),
        &PathBuf::from("checkpoints.json"),
        EVENT_LENGTH,
    );
    assert!(matches!(result, Err(LoadError::UnsupportedFormat(_))));
}
