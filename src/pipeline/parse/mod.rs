mod geojson;
mod gpx;

use std::path::Path;

use crate::error::ParseError;
use crate::types::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFormat {
    Gpx,
    GeoJson,
}

impl RouteFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "gpx" => Some(RouteFormat::Gpx),
            "geojson" | "json" => Some(RouteFormat::GeoJson),
            _ => None,
        }
    }
}

pub trait RouteParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Coordinate>, ParseError>;
}

pub fn parse_route(bytes: &[u8], format: RouteFormat) -> Result<Vec<Coordinate>, ParseError> {
    let points = match format {
        RouteFormat::Gpx => gpx::GpxParser.parse(bytes)?,
        RouteFormat::GeoJson => geojson::GeoJsonParser.parse(bytes)?,
    };

    if points.len() < 2 {
        return Err(ParseError::EmptyRoute(points.len()));
    }
    Ok(points)
}
