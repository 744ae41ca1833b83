//! Payloads of the live tracking API. Numeric fields arrive string-encoded
//! and are kept raw here; decoding them is an explicit, fallible step.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    pub fn parse(&self, field: &'static str) -> Result<f64, ParseError> {
        let value = match self {
            RawNumber::Number(value) => *value,
            RawNumber::Text(text) => {
                text.trim()
                    .parse::<f64>()
                    .map_err(|_| ParseError::InvalidNumber {
                        field,
                        value: text.clone(),
                    })?
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ParseError::InvalidNumber {
                field,
                value: value.to_string(),
            })
        }
    }
}

pub fn parse_optional(
    raw: Option<&RawNumber>,
    field: &'static str,
) -> Result<Option<f64>, ParseError> {
    raw.map(|raw| raw.parse(field)).transpose()
}

pub fn parse_required(raw: Option<&RawNumber>, field: &'static str) -> Result<f64, ParseError> {
    raw.ok_or(ParseError::MissingField(field))?.parse(field)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    pub pid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fname: String,
    #[serde(default)]
    pub lname: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub tag: String,
}

impl Profile {
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        let joined = format!("{} {}", self.fname, self.lname);
        let joined = joined.trim();
        if joined.is_empty() {
            self.pid.clone()
        } else {
            joined.to_string()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawCoords {
    pub lat: RawNumber,
    pub lng: RawNumber,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LastCheckpoint {
    /// Miles at the next checkpoint.
    pub npm: Option<RawNumber>,
    /// Miles at the last checkpoint.
    pub lpm: Option<RawNumber>,
    /// Name of the next checkpoint.
    pub npn: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeoRecord {
    /// Percent complete.
    pub epc: Option<RawNumber>,
    /// Estimated miles along the route at the last report.
    pub emiles: Option<RawNumber>,
    /// Seconds since the last ping.
    pub sslp: Option<RawNumber>,
    pub mph: Option<RawNumber>,
    /// Seconds since the current segment started.
    pub sss: Option<RawNumber>,
    /// Name of the last checkpoint passed.
    pub lpn: Option<String>,
    pub last: Option<LastCheckpoint>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileInfo {
    #[serde(default)]
    pub loc: HashMap<String, GeoRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileList {
    #[serde(default)]
    pub list: Vec<Profile>,
    #[serde(default)]
    pub info: ProfileInfo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Checkpoint {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub alias: Vec<String>,
    pub km: Option<RawNumber>,
    pub miles: Option<RawNumber>,
    pub coords: Option<RawCoords>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckpointList {
    #[serde(default)]
    pub list: Vec<Checkpoint>,
}
