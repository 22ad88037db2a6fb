use crate::clock::{Clock, DateTime, TimeDelta, Utc};
use crate::twitter::Tweet;
use crate::twitter::service::{Error, Service};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn do_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn load_data(file: &str) -> String {
    fs::read_to_string(format!("tests/data/{file}.json")).expect("could not find test data")
}

#[derive(Clone, Copy, Debug)]
pub struct FrozenClock {
    datetime: DateTime<Utc>,
}

impl FrozenClock {
    pub fn new(datetime: DateTime<Utc>) -> Self {
        FrozenClock { datetime }
    }
}

impl Default for FrozenClock {
    fn default() -> Self {
        let datetime = DateTime::parse_from_rfc3339("2025-05-23T10:13:00-07:00")
            .expect("invalid date supplied")
            .with_timezone(&Utc);
        Self::new(datetime)
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        self.datetime
    }
}

/// A tweet posted at the frozen time.
pub fn tweet(id: u64, text: &str) -> Tweet {
    Tweet::new(id, text, FrozenClock::default().now())
}

/// A tweet posted `days` days before the frozen time.
pub fn tweet_aged(id: u64, text: &str, days: i64) -> Tweet {
    let created_at = FrozenClock::default().now() - TimeDelta::days(days);
    Tweet::new(id, text, created_at)
}

/// A page request received by a [`TestService`].
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub screen_name: String,
    pub max_id: Option<u64>,
    pub count: usize,
}

/// Serves pages from canned timelines, honoring `max_id` and `count` the
/// way Twitter does.
///
/// Errors queued with [`TestService::fail_with()`] are returned, one per
/// request, before any more pages are served. An error scheduled with
/// [`TestService::fail_on_request()`] is returned only for that request.
#[derive(Debug, Default)]
pub struct TestService {
    timelines: HashMap<String, Vec<Tweet>>,
    failures: Mutex<VecDeque<Error>>,
    scheduled: Mutex<HashMap<usize, Error>>,
    requests: Mutex<Vec<Request>>,
    clock: FrozenClock,
}

impl TestService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeline(mut self, screen_name: &str, tweets: Vec<Tweet>) -> Self {
        let mut tweets = tweets;
        tweets.sort_by_key(|tweet| std::cmp::Reverse(tweet.id()));
        self.timelines.insert(screen_name.to_string(), tweets);
        self
    }

    pub fn with_data(self, screen_name: &str, file: &str) -> Self {
        let tweets = Tweet::parse(&load_data(file)).expect("could not parse test data");
        self.with_timeline(screen_name, tweets)
    }

    pub fn fail_with(self, error: Error) -> Self {
        self.failures
            .lock()
            .expect("failure queue poisoned")
            .push_back(error);
        self
    }

    /// Fails the `n`th request (counting from 0) with `error`.
    pub fn fail_on_request(self, n: usize, error: Error) -> Self {
        self.scheduled
            .lock()
            .expect("schedule poisoned")
            .insert(n, error);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().expect("request log poisoned").clone()
    }

    fn serve(
        &self,
        screen_name: &str,
        max_id: Option<u64>,
        count: usize,
    ) -> Result<Vec<Tweet>, Error> {
        let n = {
            let mut requests = self.requests.lock().expect("request log poisoned");
            requests.push(Request {
                screen_name: screen_name.to_string(),
                max_id,
                count,
            });
            requests.len() - 1
        };

        if let Some(error) = self.scheduled.lock().expect("schedule poisoned").remove(&n) {
            return Err(error);
        }
        let failure = self
            .failures
            .lock()
            .expect("failure queue poisoned")
            .pop_front();
        if let Some(error) = failure {
            return Err(error);
        }

        let page = self
            .timelines
            .get(screen_name)
            .map(|tweets| {
                tweets
                    .iter()
                    .filter(|tweet| max_id.is_none_or(|max_id| tweet.id() <= max_id))
                    .take(count)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(page)
    }
}

impl Clock for TestService {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl Service for TestService {
    async fn newest_page(&self, screen_name: &str, count: usize) -> Result<Vec<Tweet>, Error> {
        self.serve(screen_name, None, count)
    }

    async fn older_page(
        &self,
        screen_name: &str,
        max_id: u64,
        count: usize,
    ) -> Result<Vec<Tweet>, Error> {
        self.serve(screen_name, Some(max_id), count)
    }
}

/// Returns the same page no matter what is asked for, like an API that
/// ignores its cursor.
#[derive(Debug)]
pub struct StuckService {
    page: Vec<Tweet>,
    calls: AtomicUsize,
}

impl StuckService {
    pub fn new(page: Vec<Tweet>) -> Self {
        let calls = AtomicUsize::new(0);
        Self { page, calls }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn serve(&self) -> Result<Vec<Tweet>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.page.clone())
    }
}

impl Clock for StuckService {
    fn now(&self) -> DateTime<Utc> {
        FrozenClock::default().now()
    }
}

impl Service for StuckService {
    async fn newest_page(&self, _screen_name: &str, _count: usize) -> Result<Vec<Tweet>, Error> {
        self.serve()
    }

    async fn older_page(
        &self,
        _screen_name: &str,
        _max_id: u64,
        _count: usize,
    ) -> Result<Vec<Tweet>, Error> {
        self.serve()
    }
}
