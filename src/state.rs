use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::Fetcher;
use crate::config::Config;
use crate::focus::FocusQueue;
use crate::pipeline::path::PathIndex;
use crate::pipeline::standings::{self, RiderView};
use crate::resource::{Fetched, ResourceRequest, Resources};
use crate::types::feed::{CheckpointList, ProfileList};

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    resources: Resources,
    path: Arc<PathIndex>,
    focus: FocusQueue,
    tick: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: Config, path: PathIndex, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config: Arc::new(config),
            resources: Resources::new(fetcher),
            path: Arc::new(path),
            focus: FocusQueue::new(),
            tick: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn path(&self) -> &PathIndex {
        &self.path
    }

    pub fn focus(&self) -> &FocusQueue {
        &self.focus
    }

    pub fn profiles_request(&self) -> ResourceRequest {
        ResourceRequest::new(
            format!("profiles/{}", self.config.participants.join(",")),
            self.config.profiles_max_age,
        )
        .param("max", self.config.page_size.to_string())
        .param("loc", "1")
    }

    pub fn checkpoints_request(&self) -> ResourceRequest {
        ResourceRequest::new("points", self.config.checkpoints_max_age)
    }

    pub fn profiles(&self) -> Option<Fetched<ProfileList>> {
        self.resources.read(&self.profiles_request())
    }

    pub fn checkpoints(&self) -> Option<Fetched<CheckpointList>> {
        self.resources.read(&self.checkpoints_request())
    }

    /// Current rider standings with positions estimated for `now`.
    pub fn riders(&self, now: DateTime<Utc>) -> Option<Vec<RiderView>> {
        let profiles = self.profiles()?;
        Some(standings::rider_views(
            &profiles.data,
            profiles.fetched_at,
            now,
            &self.path,
        ))
    }

    /// Handles one refresh clock tick: re-reads every polled resource, which
    /// starts a fetch for whichever of them has gone stale.
    pub fn refresh(&self, tick: u64) {
        self.tick.store(tick, Ordering::Relaxed);
        let positioned = self
            .riders(Utc::now())
            .map(|riders| riders.iter().filter(|r| r.position.is_some()).count());
        let checkpoints = self.checkpoints().map(|c| c.data.list.len());
        tracing::debug!(
            "Tick {}: {:?} riders positioned, {:?} checkpoints",
            tick,
            positioned,
            checkpoints
        );
    }

    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }
}
