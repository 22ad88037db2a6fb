// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! HTTPS connector for the Twitter API.
//!
//! Service structures in this module provide a low-level way to retrieve
//! pages of a user's timeline. The [`Service`] trait is the seam between
//! the timeline paginator and the network: [`TwitterService`] talks to the
//! real API, and tests substitute deterministic services.

use crate::clock::{Clock, DateTime, SystemClock, Utc};
use crate::conf::Credentials;
use crate::http::{HTTPError, HTTPService};
use crate::twitter::tweet::{self, Tweet};
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Endpoint for retrieving a user's tweets, newest first.
const USER_TIMELINE_URI: &str = "https://api.twitter.com/1.1/statuses/user_timeline.json";

/// Header holding the Unix time at which the rate limit window resets.
const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// How long to wait out a rate limit when Twitter does not say.
pub const DEFAULT_RATE_LIMIT_RESET: Duration = Duration::from_secs(300);

/// A source of pages of a user's timeline.
///
/// Pages are returned newest first. Implementations also tell time via
/// [`Clock`], which should be the clock the service uses to decide when
/// rate limits reset.
pub trait Service: Clock {
    /// Retrieves the `count` most recent tweets posted by `screen_name`.
    fn newest_page(
        &self,
        screen_name: &str,
        count: usize,
    ) -> impl Future<Output = Result<Vec<Tweet>, Error>> + Send;

    /// Retrieves up to `count` tweets posted by `screen_name` whose IDs
    /// are less than or equal to `max_id`.
    fn older_page(
        &self,
        screen_name: &str,
        max_id: u64,
        count: usize,
    ) -> impl Future<Output = Result<Vec<Tweet>, Error>> + Send;
}

/// A service that contacts the Twitter API directly to retrieve tweets.
#[derive(Debug)]
pub struct TwitterService<C: Clock = SystemClock> {
    client: Client,
    bearer_token: String,
    clock: C,
}

impl TwitterService {
    /// Creates a new Twitter service.
    ///
    /// Returns an error if `credentials` has no bearer token or an HTTP
    /// client cannot be created.
    pub fn new(credentials: &Credentials) -> Result<Self, Error> {
        Self::with_clock(credentials, SystemClock)
    }
}

impl<C: Clock> TwitterService<C> {
    /// Creates a new Twitter service that uses `clock` to work out how
    /// long rate limits last.
    pub fn with_clock(credentials: &Credentials, clock: C) -> Result<Self, Error> {
        let bearer_token = credentials
            .bearer_token()
            .ok_or(Error::MissingCredentials)?
            .to_string();
        let client = Self::client()?;
        Ok(Self {
            client,
            bearer_token,
            clock,
        })
    }

    fn query(
        &self,
        screen_name: &str,
        max_id: Option<u64>,
        count: usize,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("screen_name", screen_name.to_string()),
            ("tweet_mode", "extended".to_string()),
            ("count", count.to_string()),
        ];
        if let Some(max_id) = max_id {
            query.push(("max_id", max_id.to_string()));
        }
        query
    }

    async fn get_page(&self, query: &[(&str, String)]) -> Result<Vec<Tweet>, Error> {
        let resp = self
            .client
            .get(USER_TIMELINE_URI)
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await
            .map_err(HTTPError::from)?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let reset_in = rate_limit_reset_in(resp.headers(), self.clock.now());
            return Err(Error::RateLimited { reset_in });
        }
        if !status.is_success() {
            return Err(HTTPError::Http(status).into());
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .ok_or(HTTPError::MissingContentType)?
            .to_str()
            .map_err(HTTPError::from)?;
        if !content_type.starts_with("application/json") {
            return Err(HTTPError::UnexpectedContentType(content_type.to_string()).into());
        }

        let body = resp.text().await.map_err(HTTPError::from)?;
        Ok(Tweet::parse(&body)?)
    }
}

impl<C: Clock> HTTPService for TwitterService<C> {}

impl<C: Clock> Clock for TwitterService<C> {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl<C: Clock + Sync> Service for TwitterService<C> {
    async fn newest_page(&self, screen_name: &str, count: usize) -> Result<Vec<Tweet>, Error> {
        let query = self.query(screen_name, None, count);
        self.get_page(&query).await
    }

    async fn older_page(
        &self,
        screen_name: &str,
        max_id: u64,
        count: usize,
    ) -> Result<Vec<Tweet>, Error> {
        let query = self.query(screen_name, Some(max_id), count);
        self.get_page(&query).await
    }
}

/// Works out how long to wait before a rate-limited request can be retried.
///
/// Twitter reports the end of the rate limit window as a Unix timestamp in
/// the `x-rate-limit-reset` header. If the header is missing or cannot be
/// understood, [`DEFAULT_RATE_LIMIT_RESET`] is used. A reset time that has
/// already passed means there is no need to wait.
pub fn rate_limit_reset_in(headers: &HeaderMap, now: DateTime<Utc>) -> Duration {
    headers
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|reset_at| (reset_at - now).to_std().unwrap_or(Duration::ZERO))
        .unwrap_or(DEFAULT_RATE_LIMIT_RESET)
}

/// An error retrieving tweets.
#[derive(Debug, Error)]
pub enum Error {
    /// Too many requests have been made; try again after `reset_in`.
    #[error("Rate limit exceeded, resets in {}s", .reset_in.as_secs())]
    RateLimited {
        /// How long until the rate limit window resets.
        reset_in: Duration,
    },

    /// An error from the underlying HTTP service.
    #[error("Service error: {0}")]
    Http(#[from] HTTPError),

    /// An error parsing data.
    #[error("Parse error: {0}")]
    Parse(#[from] tweet::Error),

    /// No credentials are available to authenticate with Twitter.
    #[error("No Twitter bearer token has been configured")]
    MissingCredentials,
}
