use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ParseError;
use crate::pipeline::parse::RouteParser;
use crate::types::geo::Coordinate;

pub struct GpxParser;

impl RouteParser for GpxParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Coordinate>, ParseError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut track = Vec::new();
        let mut planned = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    let name = e.name();
                    let name_str = std::str::from_utf8(name.as_ref())
                        .map_err(|e| ParseError::InvalidGpx(e.to_string()))?;

                    match name_str {
                        "trkpt" => track.extend(point_from_attributes(&e)?),
                        "rtept" => planned.extend(point_from_attributes(&e)?),
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(ParseError::InvalidGpx(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        // Recorded tracks win over planned routes when a file carries both.
        Ok(if track.is_empty() { planned } else { track })
    }
}

fn point_from_attributes(e: &BytesStart<'_>) -> Result<Option<Coordinate>, ParseError> {
    let mut lat = None;
    let mut lon = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| ParseError::InvalidGpx(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| ParseError::InvalidGpx(e.to_string()))?;
        let value = std::str::from_utf8(&attr.value)
            .map_err(|e| ParseError::InvalidGpx(e.to_string()))?;

        match key {
            "lat" => lat = value.trim().parse::<f64>().ok(),
            "lon" => lon = value.trim().parse::<f64>().ok(),
            _ => {}
        }
    }

    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            let point = Coordinate::new(lon, lat);
            if point.is_valid() {
                Ok(Some(point))
            } else {
                Err(ParseError::InvalidGpx(format!(
                    "coordinate out of range: {}, {}",
                    lat, lon
                )))
            }
        }
        _ => Ok(None),
    }
}
