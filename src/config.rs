use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_base: String,
    pub event_id: String,
    pub app_id: String,
    pub token: String,
    pub participants: Vec<String>,
    pub page_size: u32,
    pub route_file: PathBuf,
    pub waypoints_file: PathBuf,
    pub event_length_miles: f64,
    pub refresh_interval: Duration,
    pub profiles_max_age: Duration,
    pub checkpoints_max_age: Duration,
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            api_base: "https://api.rtrt.me/events".to_string(),
            event_id: "PBP-2023".to_string(),
            app_id: String::new(),
            token: String::new(),
            participants: Vec::new(),
            page_size: 30,
            route_file: PathBuf::from("assets/route.geojson"),
            waypoints_file: PathBuf::from("assets/checkpoints.json"),
            event_length_miles: 757.45,
            refresh_interval: Duration::from_secs(15),
            profiles_max_age: Duration::from_secs(300),
            checkpoints_max_age: Duration::from_secs(3600),
            fetch_timeout: Duration::from_secs(20),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let participants = std::env::var("TRACKER_PARTICIPANTS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|pid| !pid.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.participants);

        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            api_base: env_string("TRACKER_API_BASE").unwrap_or(defaults.api_base),
            event_id: env_string("TRACKER_EVENT_ID").unwrap_or(defaults.event_id),
            app_id: env_string("TRACKER_APP_ID").unwrap_or(defaults.app_id),
            token: env_string("TRACKER_TOKEN").unwrap_or(defaults.token),
            participants,
            page_size: env_parse("TRACKER_PAGE_SIZE").unwrap_or(defaults.page_size),
            route_file: env_string("ROUTE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.route_file),
            waypoints_file: env_string("WAYPOINTS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.waypoints_file),
            event_length_miles: env_parse::<f64>("EVENT_LENGTH_MILES")
                .filter(|miles| miles.is_finite() && *miles > 0.0)
                .unwrap_or(defaults.event_length_miles),
            refresh_interval: env_seconds("REFRESH_INTERVAL_SECONDS")
                .unwrap_or(defaults.refresh_interval),
            profiles_max_age: env_seconds("PROFILES_MAX_AGE_SECONDS")
                .unwrap_or(defaults.profiles_max_age),
            checkpoints_max_age: env_seconds("CHECKPOINTS_MAX_AGE_SECONDS")
                .unwrap_or(defaults.checkpoints_max_age),
            fetch_timeout: env_seconds("FETCH_TIMEOUT_SECONDS").unwrap_or(defaults.fetch_timeout),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|value| value.parse().ok())
}

fn env_seconds(name: &str) -> Option<Duration> {
    env_parse::<u64>(name)
        .filter(|seconds| *seconds > 0)
        .map(Duration::from_secs)
}
