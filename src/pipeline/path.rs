//! Route geometry and waypoint lookup.
//!
//! Distances are miles along the route. The polyline's measured length is
//! rescaled to the event's declared length so that distances reported by
//! the tracking provider and positions on the drawn route agree.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{LoadError, ParseError};
use crate::pipeline::parse::{self, RouteFormat};
use crate::types::feed::CheckpointList;
use crate::types::geo::Coordinate;

const EARTH_RADIUS_MILES: f64 = 3958.8;

#[derive(Debug, Clone)]
pub struct RouteGeometry {
    points: Vec<Coordinate>,
    /// Distance from the start to each point; same length as `points`.
    cumulative: Vec<f64>,
}

impl RouteGeometry {
    pub fn new(points: Vec<Coordinate>) -> Result<Self, ParseError> {
        if points.len() < 2 {
            return Err(ParseError::EmptyRoute(points.len()));
        }

        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative.push(total);
        for pair in points.windows(2) {
            total += haversine_miles(&pair[0], &pair[1]);
            cumulative.push(total);
        }

        Ok(Self { points, cumulative })
    }

    /// Rescales cumulative distances so the route measures `length_miles`.
    pub fn scaled_to(mut self, length_miles: f64) -> Self {
        let measured = self.length();
        if measured > f64::EPSILON && length_miles.is_finite() && length_miles > 0.0 {
            let factor = length_miles / measured;
            for distance in &mut self.cumulative {
                *distance *= factor;
            }
            if let Some(end) = self.cumulative.last_mut() {
                *end = length_miles;
            }
        }
        self
    }

    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Coordinate `distance` miles along the route, clamped to its endpoints.
    pub fn project(&self, distance: f64) -> Coordinate {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];

        if distance.is_nan() || distance <= 0.0 {
            return first;
        }
        if distance >= self.length() {
            return last;
        }

        // First point strictly beyond the target; the target lies in the segment ending there.
        let end = self.cumulative.partition_point(|&d| d <= distance);
        let start = end - 1;
        let span = self.cumulative[end] - self.cumulative[start];
        if span <= f64::EPSILON {
            return self.points[start];
        }

        let t = (distance - self.cumulative[start]) / span;
        self.points[start].lerp(&self.points[end], t)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WaypointIndex {
    waypoints: HashMap<String, Coordinate>,
}

impl WaypointIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, coordinate: Coordinate) {
        self.waypoints.insert(id.into(), coordinate);
    }

    pub fn get(&self, id: &str) -> Option<Coordinate> {
        self.waypoints.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Registers each checkpoint under its name, label and aliases.
    /// Checkpoints without coordinates are skipped.
    pub fn from_checkpoints(checkpoints: &CheckpointList) -> Result<Self, ParseError> {
        let mut index = Self::new();
        for checkpoint in &checkpoints.list {
            let Some(coords) = &checkpoint.coords else {
                tracing::debug!("Checkpoint {} has no coordinates", checkpoint.name);
                continue;
            };

            let coordinate = Coordinate::new(coords.lng.parse("lng")?, coords.lat.parse("lat")?);
            if !coordinate.is_valid() {
                return Err(ParseError::InvalidWaypoints(format!(
                    "{} is out of range",
                    checkpoint.name
                )));
            }

            index.insert(checkpoint.name.clone(), coordinate);
            if let Some(label) = checkpoint.label.as_ref().filter(|l| !l.is_empty()) {
                index.insert(label.clone(), coordinate);
            }
            for alias in checkpoint.alias.iter().filter(|a| !a.is_empty()) {
                index.insert(alias.clone(), coordinate);
            }
        }
        Ok(index)
    }
}

/// Static reference data: the route polyline and the named waypoints on it.
#[derive(Debug, Clone)]
pub struct PathIndex {
    route: RouteGeometry,
    waypoints: WaypointIndex,
}

impl PathIndex {
    pub fn new(route: RouteGeometry, waypoints: WaypointIndex) -> Self {
        Self { route, waypoints }
    }

    pub fn load(
        route_file: &Path,
        waypoints_file: &Path,
        event_length_miles: f64,
    ) -> Result<Self, LoadError> {
        let format = RouteFormat::from_path(route_file)
            .ok_or_else(|| LoadError::UnsupportedFormat(route_file.to_path_buf()))?;
        let bytes = read_file(route_file)?;
        let points = parse::parse_route(&bytes, format)?;
        let route = RouteGeometry::new(points)?;
        let measured = route.length();
        let route = route.scaled_to(event_length_miles);

        let bytes = read_file(waypoints_file)?;
        let checkpoints: CheckpointList = serde_json::from_slice(&bytes)
            .map_err(|e| ParseError::InvalidWaypoints(e.to_string()))?;
        let waypoints = WaypointIndex::from_checkpoints(&checkpoints)?;

        tracing::info!(
            "Loaded route with {} points ({:.2} mi measured, {:.2} mi declared) and {} waypoint names",
            route.points().len(),
            measured,
            route.length(),
            waypoints.len()
        );

        Ok(Self::new(route, waypoints))
    }

    /// Exact lookup; unknown ids yield `None`.
    pub fn waypoint_coordinate(&self, id: &str) -> Option<Coordinate> {
        self.waypoints.get(id)
    }

    pub fn project_distance(&self, distance_miles: f64) -> Coordinate {
        self.route.project(distance_miles)
    }

    pub fn route_length(&self) -> f64 {
        self.route.length()
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn haversine_miles(a: &Coordinate, b: &Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_MILES * c
}
