use serde_json::Value;

use crate::error::ParseError;
use crate::pipeline::parse::RouteParser;
use crate::types::geo::Coordinate;

pub struct GeoJsonParser;

impl RouteParser for GeoJsonParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Coordinate>, ParseError> {
        let root: Value =
            serde_json::from_slice(bytes).map_err(|e| ParseError::InvalidGeoJson(e.to_string()))?;

        let mut points = Vec::new();
        collect_lines(&root, &mut points)?;
        Ok(points)
    }
}

/// Appends every line geometry found under `value` in document order.
fn collect_lines(value: &Value, points: &mut Vec<Coordinate>) -> Result<(), ParseError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::InvalidGeoJson("object without a type".to_string()))?;

    match kind {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| ParseError::InvalidGeoJson("missing features".to_string()))?;
            for feature in features {
                collect_lines(feature, points)?;
            }
        }
        "Feature" => {
            if let Some(geometry) = value.get("geometry").filter(|g| !g.is_null()) {
                collect_lines(geometry, points)?;
            }
        }
        "GeometryCollection" => {
            let geometries = value
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or_else(|| ParseError::InvalidGeoJson("missing geometries".to_string()))?;
            for geometry in geometries {
                collect_lines(geometry, points)?;
            }
        }
        "LineString" => {
            let line = coordinates(value)?;
            append_line(line, points)?;
        }
        "MultiLineString" => {
            let lines = coordinates(value)?;
            for line in lines {
                let line = line
                    .as_array()
                    .ok_or_else(|| ParseError::InvalidGeoJson("line is not an array".to_string()))?;
                append_line(line, points)?;
            }
        }
        // Points and polygons carry no route geometry.
        _ => {}
    }

    Ok(())
}

fn coordinates(value: &Value) -> Result<&Vec<Value>, ParseError> {
    value
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::InvalidGeoJson("missing coordinates".to_string()))
}

fn append_line(line: &[Value], points: &mut Vec<Coordinate>) -> Result<(), ParseError> {
    for position in line {
        let pair = position.as_array().filter(|pair| pair.len() >= 2);
        let lon = pair.and_then(|pair| pair[0].as_f64());
        let lat = pair.and_then(|pair| pair[1].as_f64());
        let (Some(lon), Some(lat)) = (lon, lat) else {
            return Err(ParseError::InvalidGeoJson(format!(
                "invalid position: {}",
                position
            )));
        };

        let point = Coordinate::new(lon, lat);
        if !point.is_valid() {
            return Err(ParseError::InvalidGeoJson(format!(
                "coordinate out of range: {}",
                position
            )));
        }
        // Consecutive lines usually share their joining vertex.
        if points.last() != Some(&point) {
            points.push(point);
        }
    }
    Ok(())
}
