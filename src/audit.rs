// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Word frequency audits of one or more users' timelines.

use crate::conf::Config;
use crate::count::{self, WordCount, WordCounter, WordPercentage};
use crate::matcher::WordMatcher;
use crate::report;
use crate::timeline::{self, TimelineFetcher};
use crate::twitter::service::{self, Service, TwitterService};
use crate::twitter::Tweet;
use log::info;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Audits the words used in a set of users' timelines.
///
/// Tweets are retrieved the first time they are needed and kept until the
/// next [`reaudit()`](Self::reaudit). Word views are empty until
/// [`audit()`](Self::audit) has run.
///
/// # Examples
///
/// ```no_run
/// use twords::Twords;
/// use twords::conf::Config;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// config.configure(|c| {
///     c.set_rejects(["the", "a"]).set_range(7);
/// });
///
/// let mut twords = Twords::new(["jack"], config)?;
/// twords.audit().await?;
/// for (word, count) in twords.sort_words().iter().take(10) {
///     println!("{word}: {count}");
/// }
/// twords.write_to_csv(None)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Twords<S: Service = TwitterService> {
    screen_names: Vec<String>,
    config: Config,
    fetcher: TimelineFetcher<S>,
    tweets: Option<Vec<Tweet>>,
    counter: WordCounter,
    audited: bool,
}

impl Twords {
    /// Creates an audit of `screen_names` that retrieves tweets from
    /// Twitter, using the credentials in `config`.
    pub fn new<I, N>(screen_names: I, config: Config) -> Result<Self, Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let service = TwitterService::new(config.snapshot().credentials())?;
        Ok(Self::with_service(screen_names, config, service))
    }
}

impl<S: Service + Sync> Twords<S> {
    /// Creates an audit of `screen_names` that retrieves tweets from
    /// `service`.
    pub fn with_service<I, N>(screen_names: I, config: Config, service: S) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let screen_names = screen_names.into_iter().map(Into::into).collect();
        let fetcher = TimelineFetcher::new(service, config.clone());
        Self {
            screen_names,
            config,
            fetcher,
            tweets: None,
            counter: WordCounter::default(),
            audited: false,
        }
    }

    /// The users being audited.
    pub fn screen_names(&self) -> &[String] {
        &self.screen_names
    }

    /// The configuration used by this audit.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// True if the words have been counted.
    pub fn audited(&self) -> bool {
        self.audited
    }

    /// Number of requests made to the service so far.
    pub fn requests(&self) -> usize {
        self.fetcher.requests()
    }

    /// Counts the words in the audited tweets, unless that has already
    /// been done.
    ///
    /// Returns true once the words have been counted.
    pub async fn audit(&mut self) -> Result<bool, Error> {
        if !self.audited {
            self.count_words().await?;
        }
        Ok(self.audited)
    }

    /// Discards any tweets and counts, then retrieves and counts again.
    ///
    /// The configuration is read afresh, so changes to rejects, range, or
    /// the reference time take effect.
    pub async fn reaudit(&mut self) -> Result<bool, Error> {
        self.tweets = None;
        self.counter.clear();
        self.audited = false;
        self.audit().await
    }

    async fn count_words(&mut self) -> Result<(), Error> {
        let matcher = WordMatcher::new(&self.config.snapshot());
        self.tweets().await?;
        let tweets = self.tweets.as_deref().unwrap_or_default();
        self.counter.count(tweets, &matcher);
        self.audited = true;
        info!(
            "Counted {} words in {} tweets",
            self.counter.total_word_count(),
            tweets.len()
        );
        Ok(())
    }

    /// The audited tweets, retrieving them if necessary.
    pub async fn tweets(&mut self) -> Result<&[Tweet], Error> {
        if self.tweets.is_none() {
            let tweets = self.fetcher.fetch_timeline(&self.screen_names).await?;
            self.tweets = Some(tweets);
        }
        Ok(self.tweets.as_deref().unwrap_or_default())
    }

    /// The audited tweets, newest first.
    pub async fn sort_tweets(&mut self) -> Result<Vec<Tweet>, Error> {
        let mut tweets = self.tweets().await?.to_vec();
        sort_newest_first(&mut tweets);
        Ok(tweets)
    }

    /// Sorts the audited tweets newest first, in place.
    pub async fn sort_tweets_in_place(&mut self) -> Result<&[Tweet], Error> {
        self.tweets().await?;
        if let Some(tweets) = self.tweets.as_mut() {
            sort_newest_first(tweets);
        }
        Ok(self.tweets.as_deref().unwrap_or_default())
    }

    /// Number of audited tweets.
    pub async fn tweets_count(&mut self) -> Result<usize, Error> {
        Ok(self.tweets().await?.len())
    }

    /// Each counted word and the number of times it occurs.
    pub fn words(&self) -> &HashMap<String, usize> {
        self.counter.words()
    }

    /// Words and their counts, sorted from most to least frequent.
    pub fn sort_words(&self) -> &[WordCount] {
        self.counter.sort_words()
    }

    /// Total number of words counted.
    pub fn total_word_count(&self) -> usize {
        self.counter.total_word_count()
    }

    /// Each word's share of all counted words, as a percentage.
    pub fn percentages(&self) -> Result<&HashMap<String, f64>, count::Error> {
        self.counter.percentages()
    }

    /// Words and their percentages, sorted from most to least frequent.
    pub fn sort_percentages(&self) -> Result<&[WordPercentage], count::Error> {
        self.counter.sort_percentages()
    }

    /// The sorted word counts as CSV.
    pub fn to_csv(&self) -> String {
        report::to_csv(self.sort_words())
    }

    /// The sorted word counts as a JSON object.
    pub fn to_json(&self) -> Result<String, report::Error> {
        report::to_json(self.sort_words())
    }

    /// Writes the sorted word counts as CSV to `path`, or to
    /// `twords_report.csv`.
    pub fn write_to_csv(&self, path: Option<&Path>) -> Result<PathBuf, report::Error> {
        report::write_to_csv(self.sort_words(), path)
    }

    /// Writes the sorted word counts as JSON to `path`, or to
    /// `twords_report.json`.
    pub fn write_to_json(&self, path: Option<&Path>) -> Result<PathBuf, report::Error> {
        report::write_to_json(self.sort_words(), path)
    }
}

fn sort_newest_first(tweets: &mut [Tweet]) {
    tweets.sort_by_key(|tweet| (Reverse(tweet.created_at()), Reverse(tweet.id())));
}

/// An error running an audit.
#[derive(Debug, Error)]
pub enum Error {
    /// The Twitter service could not be set up.
    #[error("Could not connect to Twitter: {0}")]
    Service(#[from] service::Error),

    /// Tweets could not be retrieved.
    #[error("Could not retrieve tweets: {0}")]
    Timeline(#[from] timeline::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::{Configuration, Credentials};
    use crate::test_utils::{FrozenClock, TestService, do_logging, tweet, tweet_aged};
    use std::ptr;

    fn config() -> Config {
        let mut configuration = Configuration::default();
        configuration
            .set_rejects(["the", "a"])
            .set_range(7)
            .set_up_to_clock(FrozenClock::default());
        Config::new(configuration)
    }

    fn cat_and_dog() -> Twords<TestService> {
        let service = TestService::new()
            .with_timeline("jack", vec![tweet(2, "the cat sat"), tweet(1, "a dog runs")]);
        Twords::with_service(["jack"], config(), service)
    }

    mod construction {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn it_needs_credentials_to_talk_to_twitter() {
            let mut configuration = Configuration::default();
            configuration.twitter_client(|credentials| *credentials = Credentials::empty());
            let err = Twords::new(["jack"], Config::new(configuration)).unwrap_err();
            assert!(matches!(
                err,
                Error::Service(service::Error::MissingCredentials)
            ));
        }

        #[test]
        fn it_builds_a_twitter_service_from_the_configuration() {
            let mut configuration = Configuration::default();
            configuration.twitter_client(|credentials| {
                credentials.set_bearer_token("ThisIsMyBearerToken");
            });
            let twords = Twords::new(["jack", "biz"], Config::new(configuration)).unwrap();
            assert_eq!(twords.screen_names(), ["jack", "biz"]);
        }

        #[test]
        fn it_starts_unaudited() {
            let twords = cat_and_dog();
            assert!(!twords.audited());
            assert!(twords.words().is_empty());
            assert_eq!(twords.requests(), 0);
        }
    }

    mod audit {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn it_counts_words() {
            do_logging();

            let mut twords = cat_and_dog();
            assert!(twords.audit().await.unwrap());
            assert!(twords.audited());

            let expected: HashMap<String, usize> = ["cat", "sat", "dog", "runs"]
                .into_iter()
                .map(|word| (word.to_string(), 1))
                .collect();
            assert_eq!(twords.words(), &expected);
            assert_eq!(twords.total_word_count(), 4);
            assert_eq!(twords.sort_words().len(), 4);
            assert_eq!(twords.percentages().unwrap()["cat"], 25.0);
        }

        #[tokio::test]
        async fn it_sorts_ties_alphabetically() {
            let mut twords = cat_and_dog();
            twords.audit().await.unwrap();

            let words: Vec<&str> = twords
                .sort_words()
                .iter()
                .map(|(w, _)| w.as_str())
                .collect();
            assert_eq!(words, vec!["cat", "dog", "runs", "sat"]);
        }

        #[tokio::test]
        async fn it_only_audits_once() {
            let mut twords = cat_and_dog();
            twords.audit().await.unwrap();
            let requests = twords.requests();
            let sorted = twords.sort_words() as *const [WordCount];
            let percentages = twords.sort_percentages().unwrap() as *const [WordPercentage];

            assert!(twords.audit().await.unwrap());

            assert_eq!(twords.requests(), requests);
            assert!(ptr::eq(twords.sort_words(), sorted));
            assert!(ptr::eq(twords.sort_percentages().unwrap(), percentages));
        }

        #[tokio::test]
        async fn it_reaudits_with_the_latest_configuration() {
            let mut twords = cat_and_dog();
            twords.audit().await.unwrap();
            let requests = twords.requests();

            twords.config().configure(|c| {
                c.set_rejects(["the", "a", "cat"]);
            });
            assert!(twords.reaudit().await.unwrap());

            assert!(twords.requests() > requests);
            assert_eq!(twords.words().get("cat"), None);
            assert_eq!(twords.total_word_count(), 3);
        }

        #[tokio::test]
        async fn it_ignores_tweets_outside_the_range() {
            let service = TestService::new().with_timeline(
                "jack",
                vec![tweet(2, "the cat sat"), tweet_aged(1, "a dog runs", 8)],
            );
            let mut twords = Twords::with_service(["jack"], config(), service);
            twords.audit().await.unwrap();

            assert_eq!(twords.tweets_count().await.unwrap(), 1);
            assert_eq!(twords.total_word_count(), 2);
        }

        #[tokio::test]
        async fn it_has_no_percentages_without_words() {
            let mut twords = Twords::with_service(["nobody"], config(), TestService::new());
            twords.audit().await.unwrap();

            assert_eq!(twords.total_word_count(), 0);
            assert_eq!(twords.percentages().unwrap_err(), count::Error::EmptyCorpus);
            assert_eq!(
                twords.sort_percentages().unwrap_err(),
                count::Error::EmptyCorpus
            );
        }

        #[tokio::test]
        async fn it_propagates_service_errors() {
            let service = TestService::new().fail_with(service::Error::MissingCredentials);
            let mut twords = Twords::with_service(["jack"], config(), service);

            let err = twords.audit().await.unwrap_err();
            assert!(matches!(err, Error::Timeline(_)));
            assert!(!twords.audited());
        }
    }

    mod tweets {
        use super::*;
        use pretty_assertions::assert_eq;

        fn twords() -> Twords<TestService> {
            let service = TestService::new()
                .with_timeline("jack", vec![tweet_aged(1, "older", 2), tweet(3, "newest")])
                .with_timeline("biz", vec![tweet_aged(2, "middle", 1)]);
            Twords::with_service(["jack", "biz"], config(), service)
        }

        #[tokio::test]
        async fn it_retrieves_tweets_once() {
            let mut twords = twords();
            let ids: Vec<u64> = twords
                .tweets()
                .await
                .unwrap()
                .iter()
                .map(Tweet::id)
                .collect();
            assert_eq!(ids, vec![3, 1, 2]);

            let requests = twords.requests();
            twords.tweets().await.unwrap();
            twords.audit().await.unwrap();
            assert_eq!(twords.requests(), requests);
        }

        #[tokio::test]
        async fn it_counts_tweets() {
            assert_eq!(twords().tweets_count().await.unwrap(), 3);
        }

        #[tokio::test]
        async fn it_sorts_tweets_newest_first() {
            let mut twords = twords();
            let sorted: Vec<u64> = twords
                .sort_tweets()
                .await
                .unwrap()
                .iter()
                .map(Tweet::id)
                .collect();
            assert_eq!(sorted, vec![3, 2, 1]);

            let unsorted: Vec<u64> = twords
                .tweets()
                .await
                .unwrap()
                .iter()
                .map(Tweet::id)
                .collect();
            assert_eq!(unsorted, vec![3, 1, 2]);
        }

        #[tokio::test]
        async fn it_sorts_tweets_in_place() {
            let mut twords = twords();
            twords.sort_tweets_in_place().await.unwrap();
            let ids: Vec<u64> = twords
                .tweets()
                .await
                .unwrap()
                .iter()
                .map(Tweet::id)
                .collect();
            assert_eq!(ids, vec![3, 2, 1]);
        }
    }

    mod reports {
        use super::*;
        use pretty_assertions::assert_eq;
        use std::fs;

        #[tokio::test]
        async fn it_exports_sorted_words_as_csv() {
            let mut twords = cat_and_dog();
            twords.audit().await.unwrap();

            let parsed: Vec<WordCount> = twords
                .to_csv()
                .lines()
                .skip(1)
                .map(|line| {
                    let (word, count) = line.split_once(',').unwrap();
                    (word.to_string(), count.parse().unwrap())
                })
                .collect();
            assert_eq!(parsed, twords.sort_words());
        }

        #[tokio::test]
        async fn it_exports_sorted_words_as_json() {
            let mut twords = cat_and_dog();
            twords.audit().await.unwrap();
            assert_eq!(
                twords.to_json().unwrap(),
                r#"{"cat":1,"dog":1,"runs":1,"sat":1}"#
            );
        }

        #[tokio::test]
        async fn it_writes_reports() {
            let mut twords = cat_and_dog();
            twords.audit().await.unwrap();

            let dir = tempfile::tempdir().unwrap();
            let csv = twords.write_to_csv(Some(dir.path().join("words.csv").as_path())).unwrap();
            let json = twords.write_to_json(Some(dir.path().join("words.json").as_path())).unwrap();

            assert_eq!(fs::read_to_string(csv).unwrap(), twords.to_csv());
            assert_eq!(fs::read_to_string(json).unwrap(), twords.to_json().unwrap());
        }
    }
}
