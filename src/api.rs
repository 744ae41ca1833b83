use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::config::Config;
use crate::error::FetchError;

pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Value, FetchError>> + Send>>;

/// Source of decoded JSON resources for a single event.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, path: &str, params: &[(String, String)]) -> FetchFuture;
}

/// Client for the live tracking API. Credentials travel as static query
/// parameters on every request.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    events_url: String,
    app_id: String,
    token: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;

        Ok(Self {
            client,
            events_url: format!(
                "{}/{}",
                config.api_base.trim_end_matches('/'),
                config.event_id.trim_matches('/')
            ),
            app_id: config.app_id.clone(),
            token: config.token.clone(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.events_url, path.trim_start_matches('/'))
    }

    /// `GET {base}/{event}/{path}?appid=..&token=..&{params}`
    pub fn request(&self, path: &str, params: &[(String, String)]) -> reqwest::RequestBuilder {
        self.client
            .get(self.url_for(path))
            .query(&[("appid", self.app_id.as_str()), ("token", self.token.as_str())])
            .query(params)
    }
}

impl Fetcher for ApiClient {
    fn fetch(&self, path: &str, params: &[(String, String)]) -> FetchFuture {
        let request = self.request(path, params);

        Box::pin(async move {
            let response = request.send().await?.error_for_status()?;
            let payload = response.json::<Value>().await?;
            Ok(payload)
        })
    }
}
