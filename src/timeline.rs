// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Pages through user timelines.
//!
//! Twitter only returns a limited number of tweets per request, so a
//! user's timeline has to be retrieved a page at a time, walking backwards
//! from the newest tweet until tweets fall outside the configured range.

use crate::clock::{DateTime, HasAge, TimeDelta, Utc};
use crate::conf::Config;
use crate::twitter::Tweet;
use crate::twitter::service::{self, Service};
use itertools::Itertools;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// Number of tweets requested per page.
pub const PAGE_SIZE: usize = 200;

/// Extra time to wait after a rate limit window should have reset.
pub const RATE_LIMIT_MARGIN: Duration = Duration::from_secs(1);

/// Retrieves the timelines of one or more users.
///
/// Range and reference time are read from the shared [`Config`] at the
/// moment they are needed, so changes made through the handle apply to
/// fetches that have not yet happened.
#[derive(Debug)]
pub struct TimelineFetcher<S: Service> {
    service: S,
    config: Config,
    page_size: usize,
    requests: AtomicUsize,
}

impl<S: Service + Sync> TimelineFetcher<S> {
    /// Creates a fetcher that pulls pages from `service`.
    pub fn new(service: S, config: Config) -> Self {
        Self {
            service,
            config,
            page_size: PAGE_SIZE,
            requests: AtomicUsize::new(0),
        }
    }

    /// Sets the number of tweets requested per page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// The underlying service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Number of page requests made so far, including retried ones.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Retrieves every user's timeline and keeps only the tweets posted
    /// within the configured range of the configured reference time.
    ///
    /// Tweets posted after the reference time are dropped.
    pub async fn fetch_timeline(&self, screen_names: &[String]) -> Result<Vec<Tweet>, Error> {
        let timeline = self.full_timeline(screen_names).await?;
        let (up_to, range) = (self.config.up_to_time(), self.config.range());
        let tweets = within_range(timeline, up_to, range);
        info!(
            "Kept {} tweets from the {range} days up to {up_to}",
            tweets.len()
        );
        Ok(tweets)
    }

    /// Retrieves every user's timeline, one user at a time, and combines
    /// them without duplicates.
    ///
    /// Tweets appear in the order they were retrieved. If the same tweet
    /// is retrieved more than once, only the first copy is kept.
    pub async fn full_timeline(&self, screen_names: &[String]) -> Result<Vec<Tweet>, Error> {
        let mut timeline = Vec::new();
        for screen_name in screen_names {
            timeline.extend(self.fetch_user_timeline(screen_name).await?);
        }
        Ok(timeline.into_iter().unique_by(Tweet::id).collect())
    }

    /// Retrieves `screen_name`'s timeline, newest first.
    ///
    /// Pages are requested until the oldest tweet retrieved is older than
    /// the configured range, or until a page contains nothing new. A blank
    /// screen name has an empty timeline and makes no requests.
    pub async fn fetch_user_timeline(&self, screen_name: &str) -> Result<Vec<Tweet>, Error> {
        let screen_name = screen_name.trim();
        if screen_name.is_empty() {
            debug!("Skipping blank screen name");
            return Ok(Vec::new());
        }

        let mut timeline = self.fetch_page(screen_name, None).await?;
        let mut seen: HashSet<u64> = timeline.iter().map(Tweet::id).collect();

        while let Some(oldest) = timeline.last() {
            let (up_to, range) = (self.config.up_to_time(), self.config.range());
            if oldest.age_in_days(&up_to) > f64::from(range) {
                debug!("Reached the end of {screen_name}'s {range}-day range");
                break;
            }

            let Some(max_id) = oldest.id().checked_sub(1) else {
                break;
            };
            let page = self.fetch_page(screen_name, Some(max_id)).await?;

            let count = timeline.len();
            timeline.extend(page.into_iter().filter(|tweet| seen.insert(tweet.id())));
            if timeline.len() == count {
                debug!("No new tweets older than {max_id} for {screen_name}");
                break;
            }
        }

        info!(
            "Retrieved {} tweets from {screen_name}'s timeline ({} requests so far)",
            timeline.len(),
            self.requests()
        );
        Ok(timeline)
    }

    async fn fetch_page(
        &self,
        screen_name: &str,
        max_id: Option<u64>,
    ) -> Result<Vec<Tweet>, Error> {
        loop {
            self.requests.fetch_add(1, Ordering::Relaxed);
            let page = match max_id {
                None => {
                    debug!("Requesting newest tweets for {screen_name}");
                    self.service.newest_page(screen_name, self.page_size).await
                }
                Some(max_id) => {
                    debug!("Requesting tweets for {screen_name} up to {max_id}");
                    self.service
                        .older_page(screen_name, max_id, self.page_size)
                        .await
                }
            };

            match page {
                Err(service::Error::RateLimited { reset_in }) => {
                    let wait = reset_in.saturating_add(RATE_LIMIT_MARGIN);
                    match retry_time(self.service.now(), wait) {
                        Some(retry_at) => warn!(
                            "Rate limited while fetching {screen_name}'s timeline, \
                             retrying at {retry_at}"
                        ),
                        None => warn!(
                            "Rate limited while fetching {screen_name}'s timeline, \
                             retrying in {}s",
                            wait.as_secs()
                        ),
                    }
                    sleep(wait).await;
                }
                page => return Ok(page?),
            }
        }
    }
}

/// The time `wait` from `now`, or `None` if that cannot be represented.
fn retry_time(now: DateTime<Utc>, wait: Duration) -> Option<DateTime<Utc>> {
    let wait = TimeDelta::from_std(wait).ok()?;
    now.checked_add_signed(wait)
}

/// Keeps the tweets posted no later than `up_to` and no more than `range`
/// days before it.
///
/// A tweet exactly `range` days old is kept.
pub fn within_range(
    tweets: impl IntoIterator<Item = Tweet>,
    up_to: DateTime<Utc>,
    range: u32,
) -> Vec<Tweet> {
    tweets
        .into_iter()
        .filter(|tweet| tweet.created_at() <= up_to)
        .filter(|tweet| tweet.age_in_days(&up_to) <= f64::from(range))
        .collect()
}

/// An error retrieving a timeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The service failed in a way that waiting cannot fix.
    #[error(transparent)]
    Service(#[from] service::Error),
}
